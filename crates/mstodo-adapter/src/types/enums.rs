/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

/// Three-level task priority attribute used by Microsoft To Do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

/// Task lifecycle status reported by Microsoft To Do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    WaitingOnOthers,
    Deferred,
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_wire_values() {
        assert_eq!(
            serde_json::from_str::<Importance>("\"high\"").unwrap(),
            Importance::High
        );
        assert_eq!(
            serde_json::from_str::<Importance>("\"low\"").unwrap(),
            Importance::Low
        );
        assert_eq!(serde_json::to_string(&Importance::Normal).unwrap(), "\"normal\"");
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"waitingOnOthers\"").unwrap(),
            TaskStatus::WaitingOnOthers
        );
        assert!(
            serde_json::from_str::<TaskStatus>("\"completed\"")
                .unwrap()
                .is_completed()
        );
        assert!(!TaskStatus::NotStarted.is_completed());
    }
}
