//! Caption Prompt Builder: pure functions from meme data + one chunk to a
//! system/user prompt pair.

use crate::captioning::chunker::ContextChunk;
use crate::captioning::customizer::PromptCustomizer;
use crate::captioning::prompts::{CAPTION_PROMPT_TEMPLATE, NO_PREVIOUS_CAPTIONS, NO_RULES};
use crate::captioning::schema::{CaptionCandidate, CaptionSchema};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_META_INSTRUCTION};
use crate::models::meme::MemeTemplate;

/// A ready-to-send prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
    pub format_instructions: String,
}

/// Builds the per-chunk caption prompt. Every input is embedded verbatim.
pub fn build_caption_prompt(
    meme: &MemeTemplate,
    schema: &CaptionSchema,
    customizer: &dyn PromptCustomizer,
    chunk: &ContextChunk<'_>,
) -> BuiltPrompt {
    build(meme, schema, customizer, chunk.text)
}

/// Builds the consolidation prompt: same template, but the context is the
/// list of per-chunk candidates and an instruction to pick or merge one.
pub fn build_consolidation_prompt(
    meme: &MemeTemplate,
    schema: &CaptionSchema,
    customizer: &dyn PromptCustomizer,
    candidates: &[CaptionCandidate],
) -> BuiltPrompt {
    let options = serde_json::to_string_pretty(
        &candidates
            .iter()
            .map(CaptionCandidate::to_json)
            .collect::<Vec<_>>(),
    )
    .unwrap_or_default();

    let context = format!("{}\n{options}", customizer.consolidation_instruction());
    build(meme, schema, customizer, &context)
}

fn build(
    meme: &MemeTemplate,
    schema: &CaptionSchema,
    customizer: &dyn PromptCustomizer,
    context: &str,
) -> BuiltPrompt {
    let format_instructions = schema.format_instructions();

    let previous_captions = if meme.captions.is_empty() {
        NO_PREVIOUS_CAPTIONS.to_string()
    } else {
        meme.captions
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let rules = if meme.rules.trim().is_empty() {
        NO_RULES
    } else {
        meme.rules.as_str()
    };

    let user = fill_template(
        CAPTION_PROMPT_TEMPLATE,
        &[
            ("description", meme.description.as_str()),
            ("schema", meme.schema.as_str()),
            ("rules", rules),
            ("previous_captions", previous_captions.as_str()),
            ("context", context),
            ("format_instructions", format_instructions.as_str()),
        ],
    );

    let system = format!(
        "{}\n\n{NO_META_INSTRUCTION}\n\n{JSON_ONLY_INSTRUCTION}",
        customizer.system_prompt()
    );

    BuiltPrompt {
        system,
        user,
        format_instructions,
    }
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so braces inside user text survive untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
