use anyhow::Result;
use serde::de::DeserializeOwned;

/// Strip a Markdown code fence (with or without a language tag) from
/// around a completion, leaving other text untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, e.g. ```json
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a structured completion as JSON, tolerating a fenced-code-block
/// wrapper around the document.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let candidate = strip_code_fence(text);
    serde_json::from_str(candidate)
        .map_err(|e| anyhow::anyhow!("failed to parse structured response: {}", e))
}
