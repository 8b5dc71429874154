//! Recorded editor event scripts.
//!
//! A script is either one JSON array of events or JSON lines, one event per
//! line. In the line form, blank lines and lines starting with `#` are
//! skipped so recordings can be annotated.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use canvas::input::EditorEvent;

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct ScriptError {
    /// 1-based line in the script text.
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Parse a whole script.
///
/// # Errors
///
/// Returns the first event that fails to parse with its line number.
pub fn parse(text: &str) -> Result<Vec<EditorEvent>, ScriptError> {
    let body = text.trim_start();
    if body.starts_with('[') {
        let leading = text.len() - body.len();
        let line = text[..leading].matches('\n').count() + 1;
        return serde_json::from_str(body).map_err(|source| ScriptError {
            line: line + source.line().saturating_sub(1),
            source,
        });
    }

    let mut events = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|source| ScriptError { line: idx + 1, source })?;
        events.push(event);
    }
    Ok(events)
}
