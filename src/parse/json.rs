//! JSON list extraction for the brainstorm and divide actions.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn json_block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("valid json block regex"))
}

/// Parse the first ```` ```json ```` fenced block of a response.
pub fn parse_json_block(text: &str) -> Option<Value> {
    let caps = json_block_pattern().captures(text)?;
    let body = caps.get(1)?.as_str();
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("JSON block did not parse: {}", e);
            None
        }
    }
}

/// Idea strings from a brainstorm response.
///
/// String items are kept verbatim; any other item is kept as its JSON text.
pub fn parse_ideas(text: &str) -> Option<Vec<String>> {
    match parse_json_block(text)? {
        Value::Array(items) => Some(items.into_iter().map(value_text).collect()),
        _ => None,
    }
}

/// One subtask proposed by a divide response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtaskDef {
    /// The expected shape: a one-sentence summary and a longer description.
    Described { summary: String, description: String },
    /// Any other object; its values in key order.
    Fallback { values: Vec<String> },
}

impl SubtaskDef {
    fn from_object(object: serde_json::Map<String, Value>) -> Self {
        match (object.get("summary"), object.get("description")) {
            (Some(Value::String(summary)), Some(Value::String(description))) => {
                SubtaskDef::Described {
                    summary: summary.clone(),
                    description: description.clone(),
                }
            }
            _ => {
                tracing::info!("summary and description not in subtask object: {:?}", object);
                SubtaskDef::Fallback {
                    values: object.into_iter().map(|(_, v)| value_text(v)).collect(),
                }
            }
        }
    }

    /// Goal text handed to the child node built from this definition.
    pub fn goal(&self) -> String {
        match self {
            SubtaskDef::Described {
                summary,
                description,
            } => format!("{}. {}", summary, description),
            SubtaskDef::Fallback { values } => values
                .iter()
                .map(|v| format!("\n{}\n", v))
                .collect::<String>(),
        }
    }
}

/// Subtask definitions from a divide response.
///
/// Every element must be a JSON object, otherwise the response is rejected.
pub fn parse_subtasks(text: &str) -> Option<Vec<SubtaskDef>> {
    let Value::Array(items) = parse_json_block(text)? else {
        return None;
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(object) => Some(SubtaskDef::from_object(object)),
            _ => None,
        })
        .collect()
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ideas_come_from_the_json_fence() {
        let response = "Here are my ideas:\n```json\n[\"Rates depend on depth. Test it.\", \"Motion energy predicts rates. Fit it.\"]\n```";
        assert_eq!(
            parse_ideas(response),
            Some(vec![
                "Rates depend on depth. Test it.".to_string(),
                "Motion energy predicts rates. Fit it.".to_string(),
            ])
        );
    }

    #[test]
    fn bare_json_without_fence_is_rejected() {
        assert_eq!(parse_ideas("[\"a\", \"b\"]"), None);
        assert_eq!(parse_ideas("```\n[\"a\"]\n```"), None);
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_eq!(parse_ideas("```json\n[\"a\",]\n```"), None);
    }

    #[test]
    fn non_list_is_rejected() {
        assert_eq!(parse_ideas("```json\n{\"idea\": \"a\"}\n```"), None);
    }

    #[test]
    fn non_string_ideas_are_rendered() {
        assert_eq!(
            parse_ideas("```json\n[\"a\", 3]\n```"),
            Some(vec!["a".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn described_subtasks_join_summary_and_description() {
        let response = "```json\n[{\"summary\": \"Filter neurons\", \"description\": \"Keep reliable units.\"}]\n```";
        let subtasks = parse_subtasks(response).unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].goal(), "Filter neurons. Keep reliable units.");
    }

    #[test]
    fn other_objects_fall_back_to_joined_values() {
        let response = "```json\n[{\"title\": \"Plot\", \"details\": \"Plot tuning curves.\"}]\n```";
        let subtasks = parse_subtasks(response).unwrap();
        assert_eq!(
            subtasks[0],
            SubtaskDef::Fallback {
                values: vec!["Plot".to_string(), "Plot tuning curves.".to_string()]
            }
        );
        assert_eq!(subtasks[0].goal(), "\nPlot\n\nPlot tuning curves.\n");
    }

    #[test]
    fn non_object_subtask_rejects_the_response() {
        let response = "```json\n[{\"summary\": \"a\", \"description\": \"b\"}, \"c\"]\n```";
        assert_eq!(parse_subtasks(response), None);
    }
}
