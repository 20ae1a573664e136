// All LLM prompt constants for the captioning module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Default system prompt for caption generation.
pub const CAPTION_SYSTEM: &str = "You are an expert at creating meme captions that match \
    the meme's format and style.
You will be given:
1. A meme's description
2. Its text schema format
3. Specific rules for this meme
4. Examples of previous captions
5. Context to relate to

Generate a caption that:
1. Strictly follows the meme's schema format
2. Adheres to all provided rules
3. Relates to the provided context
4. Is different from every previous caption
5. Maintains the humor and style of the meme
6. Is concise and punchy

The schema describes the structure of text fields needed for the meme \
(e.g. \"Top Caption / Bottom Caption\" or \"Not Sure If [caption]\").";

/// Caption generation prompt template.
/// Placeholders: {description}, {schema}, {rules}, {previous_captions},
///               {context}, {format_instructions}
pub const CAPTION_PROMPT_TEMPLATE: &str = r#"Meme description: {description}

Meme schema: {schema}

Specific rules:
{rules}

Previous captions (your caption MUST differ from every one of these):
{previous_captions}

Context to relate to:
{context}

Generate a caption that fits this meme's schema format while relating to the provided context and following every rule.

Format instructions:
{format_instructions}"#;

/// Placeholder shown when a meme has no prior captions.
pub const NO_PREVIOUS_CAPTIONS: &str = "(none yet)";

/// Placeholder shown when a meme has no rules.
pub const NO_RULES: &str = "(no extra rules)";

/// Lead-in for the consolidation call; the candidate JSON follows it.
pub const DEFAULT_CONSOLIDATION_INSTRUCTION: &str = "Each option below was written for a \
    different part of the same conversation. Choose the funniest, most relatable option, \
    or merge the best ideas into one caption, and return it in the required format. \
    Options:";

/// Disaster Girl: chaos in the conversation and who is enjoying it.
pub const DISASTER_GIRL_SYSTEM: &str = "You create Disaster Girl meme captions that show a \
    chaotic or problematic situation and identify who is having a mischievous or amused \
    reaction to it. The meme should capture both the 'disaster' and who's gleefully \
    reacting to it, similar to how the original meme shows a smiling girl in front of a \
    burning house. The captions should be highly personalized to the conversation provided. \
    Both elements should be discussed or hinted at in the conversation.";

pub const DISASTER_GIRL_CONSOLIDATION: &str = "Choose the most humorous and relatable \
    disaster/subject pair from these options:";
