//! Prompt templates for the assistant and the task condenser
//!
//! The assistant persona is fixed: a productivity helper with long-term
//! memory. Both prompts are rendered with tera so the slot names stay
//! visible in one place instead of being scattered through format! calls.

use tera::{Context, Tera};

use crate::error::Result;

/// Opening assistant message for a fresh session
pub const GREETING: &str = "Hi there!";

/// Placeholder injected when no task summary has been saved yet
pub const NO_TASKS_PLACEHOLDER: &str = "NONE SO FAR";

/// System instruction for the chat assistant
///
/// Slots: `important_items` (current task digest), `history` (the running
/// session transcript plus any retrieved context).
const ASSISTANT_SYSTEM_TEMPLATE: &str = "You are a helpful AI assistant that helps the user's \
productivity and task management. Do not offer to do tasks you cannot accomplish as of yet, \
since you are still improving. Try your best to ask follow up questions and keep the \
conversation going at all times. You have long term memory. These are their tasks/to-do's: \
{{ important_items }}. This is the history of your conversation so far with this user: \
{{ history }}";

/// Condensation prompt used when no prior summary exists
const CONDENSE_TEMPLATE: &str = "This is the message history between you and the user: \
\"{{ transcript }}\" \n What are the tasks or to-do's the user has discussed about? \
Answer very concisely, and use specific dates if referencing dates";

/// Condensation prompt that reconciles the prior summary with the transcript
const CONDENSE_WITH_SUMMARY_TEMPLATE: &str = "This is the message history between you and the \
user: \"{{ transcript }}\" \n These are the tasks you have for the user so far; \
\"{{ current_summary }}\".\n What are the tasks or to-do's the user has discussed about? \
Answer very concisely, and use specific dates if referencing dates.";

/// Render the assistant system prompt
pub fn assistant_system_prompt(important_items: &str, history: &str) -> Result<String> {
    let mut context = Context::new();
    context.insert("important_items", important_items);
    context.insert("history", history);
    Ok(Tera::one_off(ASSISTANT_SYSTEM_TEMPLATE, &context, false)?)
}

/// Render the summarization prompt
///
/// Picks the reconciling variant when a prior summary is present.
pub fn condense_prompt(transcript: &str, current_summary: Option<&str>) -> Result<String> {
    let mut context = Context::new();
    context.insert("transcript", transcript);
    match current_summary {
        Some(summary) => {
            context.insert("current_summary", summary);
            Ok(Tera::one_off(CONDENSE_WITH_SUMMARY_TEMPLATE, &context, false)?)
        }
        None => Ok(Tera::one_off(CONDENSE_TEMPLATE, &context, false)?),
    }
}
