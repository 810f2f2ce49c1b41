//! Ephemeral semantic retrieval over the transcript
//!
//! The index is rebuilt from scratch on every query: the transcript text is
//! split into fixed-size overlapping character windows, the windows and the
//! question are embedded in one batch, and the windows are ranked by cosine
//! similarity. Nothing is cached or persisted, so a query always reflects
//! the latest transcript.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use once_cell::sync::OnceCell;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Text-embedding capability
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, preserving order
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// fastembed-backed embedder
///
/// The model is lazily initialized on first use (the initial call downloads
/// model weights into the cache directory) and shared across queries.
pub struct FastEmbedder {
    model_name: EmbeddingModel,
    cache_dir: PathBuf,
    model: OnceCell<Arc<Mutex<TextEmbedding>>>,
}

impl FastEmbedder {
    /// Create an embedder for a model name from config
    pub fn new(model_name: &str) -> Result<Self> {
        let model = match model_name {
            "bge-small-en-v1.5" | "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
            "all-MiniLM-L6-v2" | "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
            "all-MiniLM-L12-v2" | "AllMiniLML12V2" => EmbeddingModel::AllMiniLML12V2,
            "bge-base-en-v1.5" | "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
            other => {
                return Err(Error::InvalidConfig {
                    message: format!(
                        "unknown embedding model '{}'; supported: bge-small-en-v1.5, \
                         all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-base-en-v1.5",
                        other
                    ),
                })
            }
        };

        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("taskmate")
            .join("models");

        Ok(Self {
            model_name: model,
            cache_dir,
            model: OnceCell::new(),
        })
    }

    fn get_or_init_model(&self) -> Result<Arc<Mutex<TextEmbedding>>> {
        self.model
            .get_or_try_init(|| {
                info!(model = ?self.model_name, "Initializing embedding model");
                std::fs::create_dir_all(&self.cache_dir)?;
                let model = TextEmbedding::try_new(
                    InitOptions::new(self.model_name.clone())
                        .with_cache_dir(self.cache_dir.clone()),
                )
                .map_err(|e| Error::Embedding(e.to_string()))?;
                Ok(Arc::new(Mutex::new(model)))
            })
            .cloned()
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.get_or_init_model()?;

        // fastembed is synchronous, run inference off the async threads
        let embeddings = task::spawn_blocking(move || {
            let mut model = model.blocking_lock();
            model
                .embed(texts, None)
                .map_err(|e| Error::Embedding(e.to_string()))
        })
        .await??;

        Ok(embeddings)
    }
}

/// Per-query semantic index over the transcript text
pub struct RetrievalIndex {
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RetrievalIndex {
    /// Create an index with the given chunking policy
    pub fn new(embedder: Arc<dyn Embedder>, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig {
                message: format!(
                    "chunk_overlap ({}) must be smaller than chunk_size ({})",
                    chunk_overlap, chunk_size
                ),
            });
        }
        Ok(Self {
            embedder,
            chunk_size,
            chunk_overlap,
        })
    }

    /// Find the `top_k` transcript chunks most similar to `question`
    ///
    /// Returns the chunk texts joined with `";"` separators, or `None` when
    /// the transcript yields no chunks to search.
    pub async fn query(
        &self,
        transcript_text: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Option<String>> {
        let chunks = split_chunks(transcript_text, self.chunk_size, self.chunk_overlap);
        if chunks.is_empty() {
            return Ok(None);
        }

        // One batch: all chunks plus the question at the end
        let mut batch = chunks.clone();
        batch.push(question.to_string());
        let mut embeddings = self.embedder.embed_batch(batch).await?;

        let question_embedding = embeddings.pop().ok_or_else(|| {
            Error::Embedding("embedder returned no vectors".to_string())
        })?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut ranked: Vec<(usize, f32)> = embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(e, &question_embedding)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut result = String::new();
        for (index, score) in ranked.into_iter().take(top_k) {
            debug!(chunk = index, score, "Selected transcript chunk");
            result.push_str(&chunks[index]);
            result.push(';');
        }

        Ok(Some(result))
    }
}

/// Fixed-size sliding window chunking, not sentence-aware
///
/// Windows are `chunk_size` characters with `chunk_overlap` characters of
/// overlap, cut on char boundaries.
fn split_chunks(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = chunk_size - chunk_overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: a letter-frequency histogram, so texts that
    /// share words rank close without any model download.
    pub(crate) struct HistogramEmbedder {
        pub calls: AtomicUsize,
    }

    impl HistogramEmbedder {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for HistogramEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| histogram(t)).collect())
        }
    }

    fn histogram(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 26];
        for c in text.to_lowercase().chars() {
            if c.is_ascii_lowercase() {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        v
    }

    #[test]
    fn test_split_chunks_window_and_overlap() {
        let text = "a".repeat(12);
        let chunks = split_chunks(&text, 5, 2);
        // Windows start at 0, 3, 6, 9
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].chars().count(), 5);
        assert_eq!(chunks[3].chars().count(), 3);
    }

    #[test]
    fn test_split_chunks_short_text_single_chunk() {
        let chunks = split_chunks("short", 500, 100);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn test_split_chunks_empty() {
        assert!(split_chunks("", 500, 100).is_empty());
    }

    #[test]
    fn test_split_chunks_multibyte_safe() {
        let text = "héllo wörld ünïcode".repeat(10);
        let chunks = split_chunks(&text, 50, 10);
        let total: String = chunks.first().cloned().unwrap_or_default();
        assert!(!total.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0];
        let c = vec![0.0, 1.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let embedder = Arc::new(HistogramEmbedder::new());
        assert!(RetrievalIndex::new(embedder.clone(), 100, 100).is_err());
        assert!(RetrievalIndex::new(embedder, 0, 0).is_err());
    }

    #[tokio::test]
    async fn test_query_empty_transcript_skips_embedding() {
        let embedder = Arc::new(HistogramEmbedder::new());
        let index = RetrievalIndex::new(embedder.clone(), 500, 100).unwrap();

        let result = index.query("", "anything", 1).await.unwrap();
        assert_eq!(result, None);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_ranks_relevant_chunk_first() {
        let embedder = Arc::new(HistogramEmbedder::new());
        let index = RetrievalIndex::new(embedder, 20, 0).unwrap();

        let transcript = format!("{}{}", "zzzz qqqq xxxx jjjj", " buy milk and bread ");
        let result = index
            .query(&transcript, "milk and bread", 1)
            .await
            .unwrap()
            .unwrap();

        assert!(result.contains("milk"));
        assert!(result.ends_with(';'));
    }

    #[tokio::test]
    async fn test_query_joins_top_k_with_separator() {
        let embedder = Arc::new(HistogramEmbedder::new());
        let index = RetrievalIndex::new(embedder, 10, 0).unwrap();

        let result = index
            .query("aaaaaaaaaabbbbbbbbbb", "aaa", 2)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.matches(';').count(), 2);
    }

    // Downloads model weights from the network, run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore = "Downloads embedding model, slow"]
    async fn test_fastembed_end_to_end() {
        let embedder = Arc::new(FastEmbedder::new("bge-small-en-v1.5").unwrap());
        let index = RetrievalIndex::new(embedder, 500, 100).unwrap();

        let result = index
            .query(
                "ON 2024-03-01: user: remember to buy milk;\n ",
                "What did I need to buy?",
                1,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(result.contains("milk"));
    }
}
