// Caption generation pipeline.
// Implements: context chunking, prompt building, schema-validated LLM calls,
// bounded retry, consolidation. All LLM calls go through llm_client.

pub mod chunker;
pub mod customizer;
pub mod handlers;
pub mod pipeline;
pub mod prompt;
pub mod prompts;
pub mod retry;
pub mod schema;
