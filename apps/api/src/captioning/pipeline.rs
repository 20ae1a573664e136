//! Caption generation: orchestrates the full pipeline for one request.
//!
//! Flow: chunk context → per-chunk prompt → LLM → schema parse (bounded
//!       retry, concurrent across chunks) → consolidate → final caption.
//!
//! All-or-nothing: the first chunk that exhausts its retries fails the whole
//! request, the remaining in-flight calls are dropped and consolidation never
//! runs. Nothing here is persisted.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::captioning::chunker::{ChunkPlan, ChunkingError};
use crate::captioning::customizer::{customizer_for, PromptCustomizer};
use crate::captioning::prompt::{build_caption_prompt, build_consolidation_prompt, BuiltPrompt};
use crate::captioning::retry::{run_with_retry, RetryFailure, RetryPolicy, Transient};
use crate::captioning::schema::{CaptionCandidate, CaptionSchema, ParseError};
use crate::llm_client::{GenerationParams, GenerationRequest, LlmError, TextGenerator};
use crate::models::meme::MemeTemplate;

// ────────────────────────────────────────────────────────────────────────────
// Configuration and results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub params: GenerationParams,
    pub chunk_max_lines: usize,
    /// Keep only the most recent N chunks. `None` keeps all of them.
    pub chunk_max: Option<usize>,
    pub chunk_concurrency: usize,
    /// Deadline for a single LLM call. Hitting it counts as a transient failure.
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
    /// Spend a consolidation call even when there is only one candidate.
    pub consolidate_single_chunk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            params: GenerationParams {
                temperature: 0.7,
                max_tokens: 256,
            },
            chunk_max_lines: 500,
            chunk_max: None,
            chunk_concurrency: 4,
            call_timeout: Duration::from_secs(60),
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_millis(500),
            },
            consolidate_single_chunk: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalCaption {
    pub caption: CaptionCandidate,
    /// Number of chunks the context was split into.
    pub chunks: usize,
    /// Every LLM round trip made for this request, retries included.
    pub llm_calls: u32,
    pub consolidated: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Why a single LLM attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("LLM transport failed: {0}")]
    Transport(#[from] LlmError),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM response rejected: {0}")]
    Parse(#[from] ParseError),
}

impl Transient for AttemptError {
    fn is_transient(&self) -> bool {
        match self {
            AttemptError::Transport(e) => e.is_transient(),
            AttemptError::Timeout(_) | AttemptError::Parse(_) => true,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error("Chunk {chunk_index} failed after {attempts} attempts: {source}")]
    RetryExhausted {
        chunk_index: usize,
        attempts: u32,
        source: AttemptError,
    },

    #[error("Chunk {chunk_index} failed: {source}")]
    Unretryable {
        chunk_index: usize,
        source: AttemptError,
    },

    #[error("Consolidation failed after {attempts} attempts: {source}")]
    ConsolidationFailed { attempts: u32, source: AttemptError },
}

impl GenerationError {
    fn from_chunk(chunk_index: usize, failure: RetryFailure<AttemptError>) -> Self {
        match failure {
            RetryFailure::Exhausted { attempts, last } => GenerationError::RetryExhausted {
                chunk_index,
                attempts,
                source: last,
            },
            RetryFailure::Unretryable { error, .. } => GenerationError::Unretryable {
                chunk_index,
                source: error,
            },
        }
    }

    fn from_consolidation(failure: RetryFailure<AttemptError>) -> Self {
        let (attempts, source) = match failure {
            RetryFailure::Exhausted { attempts, last } => (attempts, last),
            RetryFailure::Unretryable { attempt, error } => (attempt, error),
        };
        GenerationError::ConsolidationFailed { attempts, source }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Generates one caption for `meme` from the uploaded `context`.
///
/// Steps:
/// 1. reject empty context, plan chunks
/// 2. one prompt + LLM call + schema parse per chunk, retried per chunk
/// 3. consolidate all candidates with one more call (skipped for a single
///    chunk unless configured otherwise)
pub async fn generate_caption(
    llm: &dyn TextGenerator,
    meme: &MemeTemplate,
    context: &str,
    config: &PipelineConfig,
) -> Result<FinalCaption, GenerationError> {
    if context.trim().is_empty() {
        return Err(ChunkingError::EmptyContext.into());
    }

    let plan = ChunkPlan::new(context, config.chunk_max_lines, config.chunk_max)?;
    info!(
        "Chunked context for meme '{}': {} lines into {} chunks",
        meme.name,
        plan.line_count(),
        plan.len()
    );

    let customizer = customizer_for(meme);
    let schema = customizer.caption_schema(meme);
    let calls = AtomicU32::new(0);
    let caller = SchemaCaller {
        llm,
        schema: &schema,
        config,
        calls: &calls,
    };

    let candidates = generate_per_chunk(&caller, meme, customizer.as_ref(), &plan).await?;
    info!(
        "Generated {} candidate captions for meme '{}'",
        candidates.len(),
        meme.name
    );

    let (caption, consolidated) = match candidates.as_slice() {
        [only] if !config.consolidate_single_chunk => (only.clone(), false),
        _ => {
            let caption = consolidate(&caller, meme, customizer.as_ref(), &candidates).await?;
            (caption, true)
        }
    };

    let llm_calls = calls.load(Ordering::SeqCst);
    info!(
        "Caption ready for meme '{}' after {} LLM calls",
        meme.name, llm_calls
    );

    Ok(FinalCaption {
        caption,
        chunks: plan.len(),
        llm_calls,
        consolidated,
    })
}

/// Batch-with-retry runner: every chunk concurrently (bounded), each with its
/// own retry budget. Returns candidates in chunk order.
async fn generate_per_chunk(
    caller: &SchemaCaller<'_>,
    meme: &MemeTemplate,
    customizer: &dyn PromptCustomizer,
    plan: &ChunkPlan<'_>,
) -> Result<Vec<CaptionCandidate>, GenerationError> {
    let retry = &caller.config.retry;
    let total = plan.len();
    let prompts: Vec<(usize, BuiltPrompt)> = plan
        .chunks()
        .map(|chunk| {
            let prompt = build_caption_prompt(meme, caller.schema, customizer, &chunk);
            (chunk.index, prompt)
        })
        .collect();

    let mut results: Vec<(usize, CaptionCandidate)> = stream::iter(prompts)
        .map(|(index, prompt)| async move {
            let prompt = &prompt;
            let label = format!("chunk {}/{}", index + 1, total);

            run_with_retry(retry, &label, move |_| caller.call(prompt))
                .await
                .map(|candidate| (index, candidate))
                .map_err(|failure| GenerationError::from_chunk(index, failure))
        })
        .buffer_unordered(caller.config.chunk_concurrency.max(1))
        .try_collect()
        .await?;

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, candidate)| candidate).collect())
}

/// Consolidator: one more call that picks or merges the best candidate.
async fn consolidate(
    caller: &SchemaCaller<'_>,
    meme: &MemeTemplate,
    customizer: &dyn PromptCustomizer,
    candidates: &[CaptionCandidate],
) -> Result<CaptionCandidate, GenerationError> {
    debug!("Consolidating {} candidates", candidates.len());
    let prompt = build_consolidation_prompt(meme, caller.schema, customizer, candidates);
    let prompt = &prompt;

    run_with_retry(&caller.config.retry, "consolidation", move |_| {
        caller.call(prompt)
    })
    .await
    .map_err(GenerationError::from_consolidation)
}

/// One LLM round trip under the call deadline, parsed against the schema.
struct SchemaCaller<'a> {
    llm: &'a dyn TextGenerator,
    schema: &'a CaptionSchema,
    config: &'a PipelineConfig,
    calls: &'a AtomicU32,
}

impl SchemaCaller<'_> {
    async fn call(&self, prompt: &BuiltPrompt) -> Result<CaptionCandidate, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let request = GenerationRequest {
            system: &prompt.system,
            user: &prompt.user,
            params: self.config.params,
        };

        let raw = tokio::time::timeout(self.config.call_timeout, self.llm.generate(&request))
            .await
            .map_err(|_| AttemptError::Timeout(self.config.call_timeout))??;

        Ok(self.schema.parse(&raw)?)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
