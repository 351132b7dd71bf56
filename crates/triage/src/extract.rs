use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Marker emitted by reasoning models between their hidden thoughts and the answer.
pub const REASONING_MARKER: &str = "</think>";
/// Category reported when the model gives none.
pub const FALLBACK_CATEGORY: &str = "Uncategorized";
/// Characters of the description kept for a fallback summary.
pub const FALLBACK_SUMMARY_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    /// Case-insensitive match against the four levels; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage of a single issue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAnalysis {
    pub summary: String,
    pub category: String,
    pub urgency: Urgency,
}

impl IssueAnalysis {
    /// Result used when nothing usable can be read from the model output.
    pub fn fallback(description: &str) -> Self {
        Self {
            summary: fallback_summary(description),
            category: FALLBACK_CATEGORY.to_string(),
            urgency: Urgency::default(),
        }
    }
}

/// First [`FALLBACK_SUMMARY_CHARS`] characters of `description`, with `...` appended when cut.
pub fn fallback_summary(description: &str) -> String {
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(FALLBACK_SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Reads an [`IssueAnalysis`] out of a raw completion. Never fails.
///
/// Text up to the last [`REASONING_MARKER`] is dropped. The first `{ ... }` span is parsed, then
/// the balanced object starting at the same brace, then the whole remainder. Fields that are
/// missing or unusable take their fallback values.
pub fn extract_issue_analysis(raw: &str, description: &str) -> IssueAnalysis {
    let answer = strip_reasoning(raw);
    match find_json_object(answer) {
        Some(object) => from_object(&object, description),
        None => {
            tracing::debug!("model output carried no JSON object, using fallback analysis");
            IssueAnalysis::fallback(description)
        }
    }
}

fn strip_reasoning(raw: &str) -> &str {
    match raw.rfind(REASONING_MARKER) {
        Some(idx) => &raw[idx + REASONING_MARKER.len()..],
        None => raw,
    }
}

fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    if let Some(start) = text.find('{') {
        if let Some(len) = text[start..].find('}') {
            if let Some(object) = parse_object(&text[start..=start + len]) {
                return Some(object);
            }
        }
        if let Some(end) = balanced_object_end(text, start) {
            if let Some(object) = parse_object(&text[start..end]) {
                return Some(object);
            }
        }
    }
    parse_object(text.trim())
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Byte offset just past the `}` closing the object opened at `start`, skipping braces inside
/// string literals.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn from_object(object: &Map<String, Value>, description: &str) -> IssueAnalysis {
    let text_field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    };

    IssueAnalysis {
        summary: text_field("summary").unwrap_or_else(|| fallback_summary(description)),
        category: text_field("category").unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
        urgency: object
            .get("urgency")
            .and_then(Value::as_str)
            .and_then(Urgency::parse)
            .unwrap_or_default(),
    }
}
