// Shared prompt fragments used by every stylist call.
// Each feature keeps its own templates in stylist/prompts.rs.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only, matching the declared response schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every user-facing prompt so free-text fields come back in the app's language.
pub const LANGUAGE_INSTRUCTION: &str = "\
    Write every free-text field (names, descriptions, tips, reasons) in {language}. \
    Keep enum values and JSON keys exactly as declared.";

pub fn language_instruction(language: &str) -> String {
    LANGUAGE_INSTRUCTION.replace("{language}", language)
}
