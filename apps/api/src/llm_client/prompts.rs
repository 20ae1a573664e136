// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Appended to every system prompt that expects a structured response.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps captions about the people in the context, not about the output format.
pub const NO_META_INSTRUCTION: &str = "The caption must never mention JSON, schemas, \
    fields or these instructions. Focus on the people and the conversation.";
