//! Per-meme behavior as data.
//!
//! Most memes are fully described by their catalog row: the caption fields
//! come from the schema string and the generic prompts apply. A meme that
//! needs more (fixed field descriptions, length limits, its own system
//! prompt, overlay positions) gets a `MemeProfile`. Both are exposed through
//! the `PromptCustomizer` trait and picked by template name.

use serde::Serialize;

use crate::captioning::prompts::{
    CAPTION_SYSTEM, DEFAULT_CONSOLIDATION_INSTRUCTION, DISASTER_GIRL_CONSOLIDATION,
    DISASTER_GIRL_SYSTEM,
};
use crate::captioning::schema::{CaptionSchema, FieldSpec};
use crate::models::meme::MemeTemplate;

/// Where a caption field is drawn on the template image, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPlacement {
    pub field: &'static str,
    pub x: u32,
    pub y: u32,
    pub font_size: u32,
    pub max_width: u32,
    pub max_chars_per_line: u32,
}

pub trait PromptCustomizer: Send + Sync {
    fn caption_schema(&self, meme: &MemeTemplate) -> CaptionSchema;

    fn system_prompt(&self) -> &str {
        CAPTION_SYSTEM
    }

    fn consolidation_instruction(&self) -> &str {
        DEFAULT_CONSOLIDATION_INSTRUCTION
    }

    fn text_placements(&self) -> &[TextPlacement] {
        &[]
    }
}

/// Everything derived from the catalog row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogCustomizer;

impl PromptCustomizer for CatalogCustomizer {
    fn caption_schema(&self, meme: &MemeTemplate) -> CaptionSchema {
        CaptionSchema::from_layout(&meme.schema)
    }
}

/// Hand-tuned configuration for one template.
#[derive(Debug, Clone)]
pub struct MemeProfile {
    pub template_name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub placements: Vec<TextPlacement>,
    pub system_prompt: &'static str,
    pub consolidation_instruction: &'static str,
}

impl PromptCustomizer for MemeProfile {
    fn caption_schema(&self, _meme: &MemeTemplate) -> CaptionSchema {
        CaptionSchema::new(self.fields.clone())
    }

    fn system_prompt(&self) -> &str {
        self.system_prompt
    }

    fn consolidation_instruction(&self) -> &str {
        self.consolidation_instruction
    }

    fn text_placements(&self) -> &[TextPlacement] {
        &self.placements
    }
}

fn disaster_girl() -> MemeProfile {
    MemeProfile {
        template_name: "disaster-girl",
        fields: vec![
            FieldSpec::new(
                "disaster",
                "The problematic situation or chaos happening in the group or conversation \
                 (at most 120 characters)",
            )
            .with_max_chars(120),
            FieldSpec::new(
                "subject",
                "The group member or the group as a whole who is having a mischievous or \
                 amused reaction to the situation (at most 40 characters)",
            )
            .with_max_chars(40),
        ],
        placements: vec![
            TextPlacement {
                field: "disaster",
                x: 400,
                y: 250,
                font_size: 50,
                max_width: 500,
                max_chars_per_line: 25,
            },
            TextPlacement {
                field: "subject",
                x: 1330,
                y: 820,
                font_size: 50,
                max_width: 500,
                max_chars_per_line: 20,
            },
        ],
        system_prompt: DISASTER_GIRL_SYSTEM,
        consolidation_instruction: DISASTER_GIRL_CONSOLIDATION,
    }
}

/// Every hand-tuned template.
fn profiles() -> Vec<MemeProfile> {
    vec![disaster_girl()]
}

/// Looks up the customizer for a template by name, falling back to the
/// catalog-derived one.
pub fn customizer_for(meme: &MemeTemplate) -> Box<dyn PromptCustomizer> {
    match profiles()
        .into_iter()
        .find(|profile| profile.template_name == meme.name)
    {
        Some(profile) => Box::new(profile),
        None => Box::new(CatalogCustomizer),
    }
}
