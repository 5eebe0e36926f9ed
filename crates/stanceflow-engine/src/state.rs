use serde::{Deserialize, Serialize};

use stanceflow_core::types::Stance;

/// Target sentinel: the model could not produce a candidate.
pub const NO_TARGET: &str = "N/A";
/// Target sentinel: target extraction output was unparsable.
pub const TARGET_ERROR: &str = "ERROR";
/// Background sentinel used when there is no target to look up.
pub const NO_TARGET_INFO: &str = "No background information available.";

/// The mutable record threaded through every step of one run.
///
/// Owned exclusively by the executor for the duration of the run; never
/// shared across concurrent runs. `input` and `max_turns` are immutable by
/// construction: no `StateUpdate` field can touch them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub input: String,
    #[serde(default)]
    pub linguistic_analysis: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub target_info: String,
    #[serde(default)]
    pub stance: Option<Stance>,
    #[serde(default)]
    pub final_response: String,
    /// Raw debate turn outputs, in strict execution order.
    #[serde(default)]
    pub debate_history: Vec<String>,
    pub max_turns: usize,
}

impl WorkflowState {
    pub fn new(input: impl Into<String>, target: impl Into<String>, max_turns: usize) -> Self {
        Self {
            input: input.into(),
            linguistic_analysis: String::new(),
            target: target.into(),
            target_info: String::new(),
            stance: None,
            final_response: String::new(),
            debate_history: Vec::new(),
            max_turns,
        }
    }

    /// Whether the current target can be used for lookup and stance calls.
    pub fn has_usable_target(&self) -> bool {
        let t = self.target.trim();
        !t.is_empty() && t != NO_TARGET && t != TARGET_ERROR
    }

    /// Merge a partial update into the state.
    ///
    /// Singleton fields are last-writer-wins; `debate_history` is strictly
    /// append-only so later routing decisions can rely on the last element.
    pub fn apply(&mut self, update: StateUpdate) {
        if update.reset_debate_history {
            self.debate_history.clear();
        }
        if let Some(v) = update.linguistic_analysis {
            self.linguistic_analysis = v;
        }
        if let Some(v) = update.target {
            self.target = v;
        }
        if let Some(v) = update.target_info {
            self.target_info = v;
        }
        if let Some(v) = update.stance {
            self.stance = Some(v);
        }
        if let Some(v) = update.final_response {
            self.final_response = v;
        }
        if let Some(turn) = update.debate_turn {
            self.debate_history.push(turn);
        }
    }
}

/// A partial state update produced by one node.
///
/// Each node returns only the fields it owns; the merge rule is per-field
/// and explicit rather than an implicit accumulate.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub linguistic_analysis: Option<String>,
    pub target: Option<String>,
    pub target_info: Option<String>,
    pub stance: Option<Stance>,
    pub final_response: Option<String>,
    /// Appended to `debate_history`, never overwriting.
    pub debate_turn: Option<String>,
    /// Set only by the entry node, before any debate turn can exist.
    pub reset_debate_history: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_last_writer_wins() {
        let mut state = WorkflowState::new("text", "", 3);
        state.apply(StateUpdate {
            target: Some("new update".into()),
            ..StateUpdate::default()
        });
        state.apply(StateUpdate {
            target: Some("software quality".into()),
            ..StateUpdate::default()
        });
        assert_eq!(state.target, "software quality");
    }

    #[test]
    fn test_debate_history_append_only() {
        let mut state = WorkflowState::new("text", "", 3);
        state.apply(StateUpdate {
            debate_turn: Some("turn one".into()),
            ..StateUpdate::default()
        });
        state.apply(StateUpdate {
            debate_turn: Some("turn two".into()),
            ..StateUpdate::default()
        });
        assert_eq!(state.debate_history, vec!["turn one", "turn two"]);
    }

    #[test]
    fn test_reset_clears_before_append() {
        let mut state = WorkflowState::new("text", "", 3);
        state.apply(StateUpdate {
            debate_turn: Some("stale".into()),
            ..StateUpdate::default()
        });
        state.apply(StateUpdate {
            reset_debate_history: true,
            ..StateUpdate::default()
        });
        assert!(state.debate_history.is_empty());
    }

    #[test]
    fn test_usable_target() {
        let mut state = WorkflowState::new("text", "", 3);
        assert!(!state.has_usable_target());
        state.target = NO_TARGET.into();
        assert!(!state.has_usable_target());
        state.target = TARGET_ERROR.into();
        assert!(!state.has_usable_target());
        state.target = "  ".into();
        assert!(!state.has_usable_target());
        state.target = "carbon tax".into();
        assert!(state.has_usable_target());
    }

    #[test]
    fn test_serializes_as_plain_structure() {
        let mut state = WorkflowState::new("some text", "", 2);
        state.stance = Some(Stance::Against);
        state.debate_history.push("<agree>true</agree>".into());

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["input"], "some text");
        assert_eq!(json["stance"], "AGAINST");
        assert_eq!(json["max_turns"], 2);
        assert_eq!(json["debate_history"][0], "<agree>true</agree>");

        let back: WorkflowState = serde_json::from_value(json).unwrap();
        assert_eq!(back.debate_history.len(), 1);
    }
}
