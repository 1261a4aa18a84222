// src/engine/task.rs
use std::fmt;
use serde::{Serialize, Deserialize};
use serde_json::{json, Value};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Kind of work a subtask asks for. Closed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SubTaskKind {
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "code_or_solve", alias = "code/solve")]
    CodeOrSolve,
    #[serde(rename = "test")]
    Test,
}

impl SubTaskKind {
    pub const ALL: [SubTaskKind; 3] = [SubTaskKind::Plan, SubTaskKind::CodeOrSolve, SubTaskKind::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubTaskKind::Plan => "plan",
            SubTaskKind::CodeOrSolve => "code_or_solve",
            SubTaskKind::Test => "test",
        }
    }
}

impl fmt::Display for SubTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work destined for a single worker call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubTask {
    #[serde(alias = "type")]
    pub kind: SubTaskKind,
    pub description: String,
}

impl SubTask {
    pub fn new(kind: SubTaskKind, description: impl Into<String>) -> Self {
        Self { kind, description: description.into() }
    }
}

/// Analysis plus the ordered subtasks produced by the decomposition call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decomposition {
    pub analysis: String,
    #[serde(default, alias = "tasks")]
    pub subtasks: Vec<SubTask>,
}

impl Decomposition {
    /// Validate a raw structured response field by field
    pub fn from_value(value: Value) -> OrchestratorResult<Self> {
        if !value.is_object() {
            return Err(OrchestratorError::validation(
                format!("Decomposition must be a JSON object, got: {}", value)
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| OrchestratorError::invalid_json("Invalid decomposition", e))
    }

    /// JSON-Schema sent with the structured decomposition request
    pub fn json_schema() -> Value {
        let kinds: Vec<&str> = SubTaskKind::ALL.iter().map(|k| k.as_str()).collect();

        json!({
            "title": "Decomposition",
            "type": "object",
            "properties": {
                "analysis": { "type": "string" },
                "subtasks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "kind": { "type": "string", "enum": kinds },
                            "description": { "type": "string" }
                        },
                        "required": ["kind", "description"]
                    }
                }
            },
            "required": ["analysis", "subtasks"]
        })
    }
}

/// A subtask paired with the text its worker produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerResult {
    pub subtask: SubTask,
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_decomposition() {
        let value = json!({
            "analysis": "two approaches",
            "subtasks": [
                {"kind": "plan", "description": "outline approach"},
                {"kind": "code_or_solve", "description": "write code"},
                {"kind": "test", "description": "check it"}
            ]
        });

        let decomposition = Decomposition::from_value(value).unwrap();
        assert_eq!(decomposition.analysis, "two approaches");
        let kinds: Vec<SubTaskKind> = decomposition.subtasks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, SubTaskKind::ALL.to_vec());
    }

    #[test]
    fn test_legacy_field_names_are_accepted() {
        let value = json!({
            "analysis": "a",
            "tasks": [{"type": "code/solve", "description": "solve it"}]
        });

        let decomposition = Decomposition::from_value(value).unwrap();
        assert_eq!(decomposition.subtasks, vec![SubTask::new(SubTaskKind::CodeOrSolve, "solve it")]);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let value = json!({
            "analysis": "Teste",
            "subtasks": [{"kind": "invalid", "description": "xxx"}]
        });

        let err = Decomposition::from_value(value).unwrap_err();
        match err {
            OrchestratorError::Validation { source: Some(cause), .. } => {
                assert!(cause.to_string().contains("unknown variant `invalid`"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        assert!(Decomposition::from_value(json!({"subtasks": []})).is_err());
        assert!(Decomposition::from_value(json!({"analysis": "a", "subtasks": [{"kind": "plan"}]})).is_err());
        assert!(Decomposition::from_value(json!({"analysis": "a", "subtasks": [{"description": "d"}]})).is_err());
        assert!(Decomposition::from_value(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_missing_subtasks_means_empty() {
        let decomposition = Decomposition::from_value(json!({"analysis": "nothing to do"})).unwrap();
        assert!(decomposition.subtasks.is_empty());
    }

    #[test]
    fn test_schema_lists_every_kind() {
        let schema = Decomposition::json_schema();
        let kinds = &schema["properties"]["subtasks"]["items"]["properties"]["kind"]["enum"];
        assert_eq!(kinds, &json!(["plan", "code_or_solve", "test"]));
    }
}
