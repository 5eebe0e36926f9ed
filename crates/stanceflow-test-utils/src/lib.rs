//! Scripted mock collaborators for exercising the workflow engine without
//! a live model or network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::BoxFuture;

use stanceflow_core::error::{Result, StanceflowError};
use stanceflow_core::traits::{AgentInvoker, Bindings, LookupTool};
use stanceflow_core::types::RoleId;

/// One recorded invoker call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub role: RoleId,
    pub bindings: Bindings,
}

struct RoleScript {
    queue: VecDeque<String>,
    /// Re-served once the queue runs dry, so loops can run past the script.
    last: Option<String>,
}

/// An invoker that replays per-role scripted responses and records every call.
///
/// Responses for a role are served in FIFO order; when a role's script runs
/// dry the last response is repeated, which lets termination tests feed an
/// endlessly disagreeing model.
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<RoleId, RoleScript>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a role. Builder-style, chainable.
    pub fn with_response(self, role: RoleId, response: impl Into<String>) -> Self {
        self.push_response(role, response);
        self
    }

    /// Queue a response for a role on an existing mock.
    pub fn push_response(&self, role: RoleId, response: impl Into<String>) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts
            .entry(role)
            .or_insert_with(|| RoleScript {
                queue: VecDeque::new(),
                last: None,
            })
            .queue
            .push_back(response.into());
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made for one role.
    pub fn calls_for(&self, role: RoleId) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.role == role)
            .count()
    }
}

impl AgentInvoker for ScriptedInvoker {
    fn invoke(&self, role: RoleId, bindings: Bindings) -> BoxFuture<'_, Result<String>> {
        self.calls.lock().unwrap().push(RecordedCall {
            role,
            bindings: bindings.clone(),
        });

        let response = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&role) {
                Some(script) => match script.queue.pop_front() {
                    Some(next) => {
                        script.last = Some(next.clone());
                        Some(next)
                    }
                    None => script.last.clone(),
                },
                None => None,
            }
        };

        Box::pin(async move {
            response.ok_or_else(|| {
                StanceflowError::ModelRequest(format!("no scripted response for role '{}'", role))
            })
        })
    }
}

/// An invoker whose every call fails, for collaborator-failure paths.
pub struct FailingInvoker;

impl AgentInvoker for FailingInvoker {
    fn invoke(&self, role: RoleId, _bindings: Bindings) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            Err(StanceflowError::ModelRequest(format!(
                "connection refused (mock, role '{}')",
                role
            )))
        })
    }
}

/// A lookup that returns a fixed snippet and counts calls.
pub struct StaticLookup {
    snippet: String,
    calls: AtomicUsize,
}

impl StaticLookup {
    pub fn new(snippet: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LookupTool for StaticLookup {
    fn search(&self, _query: String) -> BoxFuture<'_, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let snippet = self.snippet.clone();
        Box::pin(async move { snippet })
    }
}

/// A lookup whose snippet names the query, so a target change is observable
/// in the refreshed background text.
#[derive(Default)]
pub struct EchoLookup {
    calls: AtomicUsize,
}

impl EchoLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LookupTool for EchoLookup {
    fn search(&self, query: String) -> BoxFuture<'_, String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move { format!("[snippet {}] background on {}", n, query) })
    }
}
