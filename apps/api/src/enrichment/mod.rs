//! Catalog enrichment: one-off batch job that fills in a meme's description,
//! caption schema or rules with an LLM and writes the result back.
//!
//! Memes are processed one at a time with a pause in between to stay under
//! rate limits. A failure on one meme is logged and the job moves on.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::catalog::{CatalogError, EnrichedColumn, MemeCatalog};
use crate::enrichment::prompts::{
    DESCRIPTION_PROMPT_TEMPLATE, DESCRIPTION_SYSTEM, RULES_PROMPT_TEMPLATE, RULES_SYSTEM,
    SCHEMA_PROMPT_TEMPLATE, SCHEMA_SYSTEM,
};
use crate::llm_client::{GenerationParams, GenerationRequest, LlmError, TextGenerator};
use crate::models::meme::MemeTemplate;

pub mod prompts;

const DESCRIPTION_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 150,
};

const SCHEMA_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 100,
};

const RULES_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 600,
};

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("LLM returned an empty answer")]
    EmptyAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EnrichTarget {
    Descriptions,
    Schemas,
    Rules,
}

impl EnrichTarget {
    fn column(self) -> EnrichedColumn {
        match self {
            EnrichTarget::Descriptions => EnrichedColumn::Description,
            EnrichTarget::Schemas => EnrichedColumn::Schema,
            EnrichTarget::Rules => EnrichedColumn::Rules,
        }
    }

    fn current<'m>(self, meme: &'m MemeTemplate) -> &'m str {
        match self {
            EnrichTarget::Descriptions => &meme.description,
            EnrichTarget::Schemas => &meme.schema,
            EnrichTarget::Rules => &meme.rules,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Leave memes that already have a value untouched.
    pub only_missing: bool,
    pub delay: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Writes a short description of the meme.
pub async fn describe_meme(llm: &dyn TextGenerator, name: &str) -> Result<String, EnrichmentError> {
    let prompt = DESCRIPTION_PROMPT_TEMPLATE.replace("{meme_name}", &readable(name));
    ask(llm, DESCRIPTION_SYSTEM, &prompt, DESCRIPTION_PARAMS).await
}

/// Describes the caption layout, e.g. "Top Caption / Bottom Caption".
pub async fn generate_schema(
    llm: &dyn TextGenerator,
    name: &str,
    description: &str,
) -> Result<String, EnrichmentError> {
    let prompt = SCHEMA_PROMPT_TEMPLATE
        .replace("{meme_name}", &readable(name))
        .replace("{description}", description);
    ask(llm, SCHEMA_SYSTEM, &prompt, SCHEMA_PARAMS).await
}

/// Writes bullet-point rules for good captions of this meme.
pub async fn generate_rules(llm: &dyn TextGenerator, name: &str) -> Result<String, EnrichmentError> {
    let prompt = RULES_PROMPT_TEMPLATE.replace("{meme_name}", &readable(name));
    ask(llm, RULES_SYSTEM, &prompt, RULES_PARAMS).await
}

/// Runs one enrichment target over the whole catalog.
pub async fn enrich_catalog(
    catalog: &dyn MemeCatalog,
    llm: &dyn TextGenerator,
    target: EnrichTarget,
    options: &EnrichOptions,
) -> Result<EnrichReport, EnrichmentError> {
    let memes = catalog.list().await?;
    let mut report = EnrichReport {
        total: memes.len(),
        ..EnrichReport::default()
    };
    info!("Found {} memes. Generating {:?}...", memes.len(), target);

    for (position, meme) in memes.iter().enumerate() {
        if options.only_missing && !target.current(meme).trim().is_empty() {
            report.skipped += 1;
            continue;
        }

        if position > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }

        match enrich_one(catalog, llm, target, meme).await {
            Ok(()) => {
                info!("Updated {:?} for: {}", target, meme.name);
                report.updated += 1;
            }
            Err(e) => {
                error!("Error updating {:?} for {}: {e}", target, meme.name);
                report.failed += 1;
            }
        }
    }

    info!(
        "Finished {:?}: {} updated, {} skipped, {} failed",
        target, report.updated, report.skipped, report.failed
    );
    Ok(report)
}

async fn enrich_one(
    catalog: &dyn MemeCatalog,
    llm: &dyn TextGenerator,
    target: EnrichTarget,
    meme: &MemeTemplate,
) -> Result<(), EnrichmentError> {
    let value = match target {
        EnrichTarget::Descriptions => describe_meme(llm, &meme.name).await?,
        EnrichTarget::Schemas => generate_schema(llm, &meme.name, &meme.description).await?,
        EnrichTarget::Rules => generate_rules(llm, &meme.name).await?,
    };
    catalog.update(meme.id, target.column(), &value).await?;
    Ok(())
}

async fn ask(
    llm: &dyn TextGenerator,
    system: &str,
    user: &str,
    params: GenerationParams,
) -> Result<String, EnrichmentError> {
    let answer = llm
        .generate(&GenerationRequest {
            system,
            user,
            params,
        })
        .await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(EnrichmentError::EmptyAnswer);
    }
    Ok(answer.to_string())
}

fn readable(name: &str) -> String {
    name.replace('-', " ").trim().to_string()
}
