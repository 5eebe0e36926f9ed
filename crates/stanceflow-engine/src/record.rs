use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stanceflow_core::types::{RunId, RunStatus, Stance};

use crate::executor::RunOutcome;
use crate::state::WorkflowState;

/// The settled verdict of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub target: String,
    pub stance: Stance,
    pub final_response: String,
}

/// A persistable record of one run, completed or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
    pub input_text: String,
    /// Full final state, partial on failed runs.
    pub state: WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let result = match outcome.status {
            RunStatus::Completed => Some(RunResult {
                target: outcome.state.target.clone(),
                stance: outcome.state.stance.unwrap_or(Stance::Error),
                final_response: outcome.state.final_response.clone(),
            }),
            RunStatus::Failed => None,
        };

        Self {
            run_id: outcome.run_id.clone(),
            timestamp: Utc::now(),
            status: outcome.status,
            input_text: outcome.state.input.clone(),
            state: outcome.state.clone(),
            result,
            error: outcome.error.clone(),
        }
    }
}
