//! Picks a short description line from receipt text.

/// Returned when no line qualifies.
pub const FALLBACK_DESCRIPTION: &str = "Detectado via arquivo";

const MIN_LINE_CHARS: usize = 4;
const MAX_DESCRIPTION_CHARS: usize = 60;

/// Boilerplate headers that never describe the purchase.
const STOP_PREFIXES: [&str; 4] = ["comprovante", "documento", "via", "@"];

/// First plausible line of `text`, truncated to 60 characters.
pub fn summarize(text: &str) -> String {
    text.split(is_line_break)
        .map(str::trim)
        .find(|line| is_candidate(line))
        .map(|line| line.chars().take(MAX_DESCRIPTION_CHARS).collect())
        .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string())
}

fn is_candidate(line: &str) -> bool {
    if line.chars().count() < MIN_LINE_CHARS {
        return false;
    }
    let lowered = line.to_lowercase();
    !STOP_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix))
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}
