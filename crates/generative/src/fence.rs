/// Strip a surrounding markdown code fence from a model reply.
///
/// ```
/// assert_eq!(generative::strip_code_fence("```json\n[1]\n```"), "[1]");
/// assert_eq!(generative::strip_code_fence("  [1] "), "[1]");
/// ```
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Drop the opening fence line (with its optional language tag).
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed.trim_start_matches('`').trim(),
    };
    let body = body.trim_end();
    let body = match body.rfind('\n') {
        Some(idx) if body[idx + 1..].trim_start().starts_with("```") => &body[..idx],
        None if body.starts_with("```") => "",
        _ => body.strip_suffix("```").unwrap_or(body),
    };
    body.trim()
}
