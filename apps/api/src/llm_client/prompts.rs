// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Closing instruction for every JSON exchange. The scoring parsers only strip
/// whitespace and code fences, so any prose around the object is a parse error.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Return your response ONLY as a valid JSON object in the format shown above. \
Do NOT include any explanation, introductory text, or markdown outside the JSON structure.";

/// Header/footer rule used to delimit embedded documents inside a prompt.
pub const DOCUMENT_RULE: &str = "--------------------";
