// Shared prompt constants.
// Each analysis function defines its own prompt template in analysis/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction appended to every rewrite prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Use only facts present in the resume. Do NOT invent employers, \
    titles, dates, degrees, certifications or metrics. You may rephrase, reorder \
    and emphasize, but every claim must be traceable to the original resume.";

/// Builds a system prompt from a role description plus the JSON-only rule.
pub fn system_prompt(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_appends_json_rule() {
        let system = system_prompt("You are a recruiter.");
        assert!(system.starts_with("You are a recruiter."));
        assert!(system.contains("valid JSON only"));
    }
}
