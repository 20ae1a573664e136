use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::captioning::pipeline::PipelineConfig;
use crate::captioning::retry::RetryPolicy;
use crate::llm_client::GenerationParams;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub generation_max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub chunk_max_lines: usize,
    /// `None` keeps every chunk.
    pub chunk_max: Option<usize>,
    pub chunk_concurrency: usize,
    pub consolidate_single_chunk: bool,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_temperature: env_or("LLM_TEMPERATURE", 0.7)?,
            llm_max_tokens: env_or("LLM_MAX_TOKENS", 256)?,
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", 60)?,
            generation_max_attempts: env_or("GENERATION_MAX_ATTEMPTS", 3)?,
            retry_backoff_ms: env_or("RETRY_BACKOFF_MS", 500)?,
            chunk_max_lines: env_or("CHUNK_MAX_LINES", 500)?,
            chunk_max: optional_env("CHUNK_MAX")?,
            chunk_concurrency: env_or("CHUNK_CONCURRENCY", 4)?,
            consolidate_single_chunk: env_or("CONSOLIDATE_SINGLE_CHUNK", false)?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 2 * 1024 * 1024)?,
        })
    }

    /// Settings for one caption generation request, derived from the env config.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            params: GenerationParams {
                temperature: self.llm_temperature,
                max_tokens: self.llm_max_tokens,
            },
            chunk_max_lines: self.chunk_max_lines,
            chunk_max: self.chunk_max,
            chunk_concurrency: self.chunk_concurrency.max(1),
            call_timeout: Duration::from_secs(self.llm_timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.generation_max_attempts.max(1),
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
            consolidate_single_chunk: self.consolidate_single_chunk,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(optional_env(key)?.unwrap_or(default))
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        _ => Ok(None),
    }
}
