use serde_json::{Map, Value};

/// Fallback quality score when the review text carries no parseable `N/10`.
pub const DEFAULT_QUALITY_SCORE: u8 = 8;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntakeFields {
    pub intent: String,
    pub sentiment: String,
    pub priority: String,
}

/// Pulls structured values out of free-text stage output.
///
/// A single-line JSON object anywhere in the output is consulted first. Fields it does not
/// supply fall back to scanning for `LABEL:` markers and keywords. Nothing here fails: a miss
/// yields the documented default.
#[derive(Clone, Debug, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Text after the first occurrence of `label`, up to the next line break, trimmed.
    pub fn label(&self, output: &str, label: &str) -> Option<String> {
        let start = output.find(label)? + label.len();
        let rest = &output[start..];
        let line = rest.split('\n').next().unwrap_or_default();
        Some(line.trim().to_string())
    }

    pub fn score(&self, output: &str) -> u8 {
        let Some(index) = output.find("/10") else {
            return DEFAULT_QUALITY_SCORE;
        };

        output[..index]
            .split_whitespace()
            .last()
            .and_then(|token| token.parse::<i64>().ok())
            .and_then(|score| u8::try_from(score).ok())
            .filter(|score| *score <= 10)
            .unwrap_or(DEFAULT_QUALITY_SCORE)
    }

    /// Case-sensitive: `positive` present and `negative` absent.
    pub fn flag(&self, output: &str, positive: &str, negative: &str) -> bool {
        output.contains(positive) && !output.contains(negative)
    }

    pub fn intake(&self, output: &str) -> IntakeFields {
        let structured = structured_line(output);
        let field = |key: &str, label: &str| {
            structured
                .as_ref()
                .and_then(|object| object.get(key))
                .and_then(Value::as_str)
                .map(|value| value.trim().to_string())
                .or_else(|| self.label(output, label))
                .unwrap_or_default()
        };

        IntakeFields {
            intent: field("intent", "INTENT:"),
            sentiment: field("sentiment", "SENTIMENT:"),
            priority: field("priority", "PRIORITY:"),
        }
    }

    pub fn quality_score(&self, output: &str) -> u8 {
        structured_line(output)
            .and_then(|object| object.get("score").and_then(Value::as_u64))
            .and_then(|score| u8::try_from(score).ok())
            .filter(|score| *score <= 10)
            .unwrap_or_else(|| self.score(output))
    }

    pub fn follow_up_needed(&self, output: &str) -> bool {
        structured_line(output)
            .and_then(|object| object.get("follow_up").and_then(Value::as_bool))
            .unwrap_or_else(|| self.flag(output, "FOLLOW_UP", "NO_FOLLOW_UP"))
    }

    pub fn escalation_advised(&self, output: &str) -> bool {
        structured_line(output)
            .and_then(|object| object.get("escalate").and_then(Value::as_bool))
            .unwrap_or_else(|| self.flag(output, "ESCALATE", "NO_ESCALATION"))
    }
}

/// The last line that parses as a JSON object.
fn structured_line(output: &str) -> Option<Map<String, Value>> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{') && line.ends_with('}'))
        .find_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(object)) => Some(object),
            _ => None,
        })
}
