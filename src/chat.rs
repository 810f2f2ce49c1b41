//! Interactive chat loop
//!
//! One prompt/response round per iteration. `/save` commits the session and
//! refreshes the task list, `/reset` discards the session, `/tasks` shows
//! the current list, `/quit` leaves without saving.

use std::sync::Arc;

use anyhow::Result;
use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use taskmate_core::memory::MemoryPipeline;
use taskmate_core::prompt::GREETING;
use taskmate_core::Error;

pub async fn run(pipeline: Arc<MemoryPipeline>) -> Result<()> {
    let assistant = Style::new().cyan().bold();
    let dim = Style::new().dim();

    println!("{} {}", assistant.apply_to("taskmate:"), GREETING);
    println!(
        "{}",
        dim.apply_to("(/save commits this chat to memory, /reset discards it, /tasks lists your to-do's, /quit exits)")
    );

    loop {
        let line: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/save" => match pipeline.save().await {
                Ok(summary) => {
                    println!("{}", dim.apply_to("Conversation saved. Current tasks:"));
                    println!("{}", summary.text.trim());
                    println!("{} {}", assistant.apply_to("taskmate:"), GREETING);
                }
                Err(e) => report(&e),
            },
            "/reset" => match pipeline.reset() {
                Ok(()) => {
                    println!("{}", dim.apply_to("Conversation discarded."));
                    println!("{} {}", assistant.apply_to("taskmate:"), GREETING);
                }
                Err(e) => report(&e),
            },
            "/tasks" => match pipeline.summary_store().get() {
                Ok(Some(summary)) => println!("{}", summary.rendered().trim()),
                Ok(None) => println!("{}", dim.apply_to("No tasks saved yet.")),
                Err(e) => report(&e),
            },
            text => match pipeline.send(text).await {
                Ok(reply) => {
                    println!("{} {}", assistant.apply_to("taskmate:"), reply.trim());
                }
                Err(e) => report(&e),
            },
        }
    }

    Ok(())
}

fn report(error: &Error) {
    let red = Style::new().red();
    eprintln!("{} {}", red.apply_to("error:"), error.user_message());
}
