//! Judge responses arrive as model text; the JSON object may be wrapped in
//! markdown code fences or surrounding prose. Extraction here is purely
//! syntactic — anything that is not a single well-formed object is rejected
//! and the caller substitutes the conservative fallback score.

/// Pull the JSON object out of a judge response.
///
/// Accepts a bare object, an object inside ```/```json fences, or an object
/// embedded in surrounding prose (first `{` to last `}`). Returns `None`
/// when no braces are present at all.
pub(crate) fn extract_json_object(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    let inner = if let Some(stripped) = trimmed.strip_prefix("```") {
        let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
        stripped.strip_suffix("```").unwrap_or(stripped).trim()
    } else {
        trimmed
    };

    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&inner[start..=end])
}
