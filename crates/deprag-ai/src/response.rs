// ABOUTME: Parses the model's two-section markdown response into the
// ABOUTME: rewritten code and its deprecation explanation.
use crate::prompt::{CODE_MARKER, CONTEXT_MARKER, INPUT_MARKER};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NO_DEPRECATION_FOUND: &str = "No deprecated functionality found";
pub const NO_DEPRECATED_FUNCTIONS: &str =
    "This code chunk does not contain deprecated functions.";
const FALLBACK_EXPLANATION: &str =
    "Code was modernized to replace deprecated NumPy functionality";

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub modernized_code: String,
    pub explanation: String,
}

impl ParsedResponse {
    pub fn is_no_op(&self) -> bool {
        self.explanation == NO_DEPRECATION_FOUND || self.explanation == NO_DEPRECATED_FUNCTIONS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    InCode,
    InExplanation,
}

/// Line scanner over the two expected section markers. Absent markers fall
/// back to treating the whole output as code; this parser degrades, it
/// never fails.
pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(raw: &str, original_code: &str) -> ParsedResponse {
        let mut state = State::Scanning;
        let mut code_lines: Vec<&str> = Vec::new();
        let mut explanation_lines: Vec<&str> = Vec::new();

        for line in raw.lines() {
            match state {
                State::Scanning => {
                    if line.contains(CODE_MARKER) {
                        state = State::InCode;
                    }
                }
                State::InCode => {
                    if line.contains(CONTEXT_MARKER) {
                        state = State::InExplanation;
                    } else {
                        code_lines.push(line);
                    }
                }
                State::InExplanation => explanation_lines.push(line),
            }
        }

        let (mut code, explanation) = if state == State::Scanning {
            // No recognized markers at all: the whole output is the code.
            (raw.to_string(), FALLBACK_EXPLANATION.to_string())
        } else {
            (
                extract_code(&code_lines),
                clean_explanation(&explanation_lines.join("\n")),
            )
        };

        if code.trim().is_empty() || code.trim() == original_code.trim() {
            return ParsedResponse {
                modernized_code: original_code.to_string(),
                explanation: NO_DEPRECATION_FOUND.to_string(),
            };
        }

        code = code.trim_start_matches('\n').trim_end().to_string();
        ParsedResponse {
            modernized_code: code,
            explanation,
        }
    }
}

/// Interior of the first fenced block when one is present, otherwise the
/// whole segment.
fn extract_code(lines: &[&str]) -> String {
    let mut inside = false;
    let mut fenced: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim_start().starts_with("```") {
            if inside {
                return fenced.join("\n");
            }
            inside = true;
            continue;
        }
        if inside {
            fenced.push(line);
        }
    }
    if inside {
        // Unterminated fence: keep its interior rather than dropping it.
        return fenced.join("\n");
    }
    lines.join("\n")
}

fn clean_explanation(raw: &str) -> String {
    let mut text = FENCED_BLOCK.replace_all(raw, "").to_string();
    text = MARKDOWN_LINK.replace_all(&text, "").to_string();
    if let Some(index) = text.find(INPUT_MARKER) {
        text.truncate(index);
    }
    if let Some(index) = text.find("###") {
        text.truncate(index);
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_response_round_trips() {
        let raw = "### Refactored Code\n```python\nnp.full_like(a, 0)\n```\n### Deprecation Context\nnp.zeros_like replaced.";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.modernized_code, "np.full_like(a, 0)");
        assert_eq!(parsed.explanation, "np.zeros_like replaced.");
    }

    #[test]
    fn missing_markers_fall_back_to_whole_output() {
        let raw = "np.full_like(a, 0)";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.modernized_code, "np.full_like(a, 0)");
        assert!(!parsed.explanation.is_empty());
    }

    #[test]
    fn unfenced_code_section_is_taken_verbatim() {
        let raw = "### Refactored Code\nnp.full_like(a, 0)\n### Deprecation Context\nreplaced.";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.modernized_code, "np.full_like(a, 0)");
        assert_eq!(parsed.explanation, "replaced.");
    }

    #[test]
    fn missing_explanation_marker_takes_everything_after_code_marker() {
        let raw = "### Refactored Code\n```python\nnp.full_like(a, 0)\n```";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.modernized_code, "np.full_like(a, 0)");
        assert!(parsed.explanation.is_empty());
    }

    #[test]
    fn input_identical_code_is_canonical_no_op_regardless_of_explanation() {
        let raw = "### Refactored Code\n```python\nnp.zeros_like(a)\n```\n### Deprecation Context\nLots of prose claiming changes were made.";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.modernized_code, "np.zeros_like(a)");
        assert_eq!(parsed.explanation, NO_DEPRECATION_FOUND);
        assert!(parsed.is_no_op());
    }

    #[test]
    fn empty_code_section_is_canonical_no_op() {
        let raw = "### Refactored Code\n\n### Deprecation Context\nsomething";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.modernized_code, "np.zeros_like(a)");
        assert_eq!(parsed.explanation, NO_DEPRECATION_FOUND);
    }

    #[test]
    fn explanation_strips_fences_links_and_trailing_headings() {
        let raw = "### Refactored Code\n```python\nnp.full_like(a, 0)\n```\n\
                   ### Deprecation Context\nUse full_like instead. ```python\nnp.full_like(a, 0)\n``` \
                   See [docs](https://numpy.org/doc).\n### Another heading\nignored tail";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert!(parsed.explanation.starts_with("Use full_like instead."));
        assert!(!parsed.explanation.contains("```"));
        assert!(!parsed.explanation.contains("docs"));
        assert!(!parsed.explanation.contains("Another heading"));
        assert!(!parsed.explanation.contains("ignored tail"));
    }

    #[test]
    fn explanation_truncates_input_code_restatement() {
        let raw = "### Refactored Code\n```python\nnp.full_like(a, 0)\n```\n\
                   ### Deprecation Context\nzeros_like was replaced.\n### INPUT CODE:\nnp.zeros_like(a)";
        let parsed = ResponseParser::parse(raw, "np.zeros_like(a)");
        assert_eq!(parsed.explanation, "zeros_like was replaced.");
    }

    #[test]
    fn canonical_phrases_are_detected_as_no_op() {
        let parsed = ParsedResponse {
            modernized_code: "x".to_string(),
            explanation: NO_DEPRECATED_FUNCTIONS.to_string(),
        };
        assert!(parsed.is_no_op());
    }
}
