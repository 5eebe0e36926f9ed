//! Workflow execution engine.
//!
//! A run walks a validated graph of analysis nodes: linguistic analysis,
//! target extraction, background lookup, an optional bounded debate loop,
//! stance detection, and a final markup answer. Collaborator failures fail
//! the run; every parse failure degrades to a sentinel and the run settles.

pub mod executor;
pub mod graph;
pub mod nodes;
pub mod parser;
pub mod record;
pub mod state;

pub use executor::{Executor, RunOutcome, RunRequest};
pub use graph::{Graph, NodeId};
pub use record::{RunRecord, RunResult};
pub use state::{StateUpdate, WorkflowState, NO_TARGET, NO_TARGET_INFO, TARGET_ERROR};
