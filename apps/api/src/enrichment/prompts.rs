// Prompts for catalog enrichment. Plain-text answers, no JSON.

pub const DESCRIPTION_SYSTEM: &str = "You are a knowledgeable assistant that provides \
    concise, accurate descriptions of internet memes.";

/// Replace `{meme_name}` before sending.
pub const DESCRIPTION_PROMPT_TEMPLATE: &str = "Write a brief, engaging 1-2 sentence \
    description of the '{meme_name}' meme. Explain its typical usage and cultural \
    significance. Keep it concise but informative.";

pub const SCHEMA_SYSTEM: &str = "You are a helpful assistant that describes meme text \
    structures. Use simple patterns like 'Top Caption / Bottom Caption' or \
    'Not Sure If [caption]'. Keep it minimal and clear. Reply with the pattern only.";

/// Replace `{meme_name}` and `{description}` before sending.
pub const SCHEMA_PROMPT_TEMPLATE: &str = r#"For the "{meme_name}" meme, describe the structure of the text fields needed (like "Top Caption / Bottom Caption" or "Not Sure If [caption]"). Keep it simple and use common patterns. Separate text fields with " / ".

Meme description: {description}"#;

pub const RULES_SYSTEM: &str = "You are an expert at creating clear, helpful rules for \
    meme formats. Your rules help users create engaging and appropriate memes.";

/// Replace `{meme_name}` before sending.
pub const RULES_PROMPT_TEMPLATE: &str = r#"Create clear rules for creating good "{meme_name}" memes. The rules should help users create engaging and appropriate memes that fit the format well.

Focus on:
1. How to use the meme format effectively
2. What makes this meme type funny/engaging
3. Common pitfalls to avoid
4. How to maintain the meme's style
5. Guidelines for appropriate content

Format the rules as a bullet point list.

Example format (for Futurama Fry meme):
- Both interpretations should relate to something discussed in the conversation
- The suspicious alternative should be unexpected yet plausible
- The contrast between the two interpretations should create humor
- The meme should reference group members, dynamics, or shared experiences
- The suspicion should be playful and not mean-spirited
- Both parts must be grammatically consistent with their prefixes
- The meme should never talk about JSON. Focus on the group and the conversation."#;
