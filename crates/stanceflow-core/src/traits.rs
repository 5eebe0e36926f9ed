use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::RoleId;

/// Variable bindings substituted into a role's prompt template.
pub type Bindings = HashMap<String, String>;

/// The model-invocation collaborator.
///
/// One call produces the complete, concatenated text of one model response
/// for one role. The implementation may stream internally, but the contract
/// observed by the engine is a single completed string. Failures must
/// surface as errors, never as a silently empty string.
pub trait AgentInvoker: Send + Sync + 'static {
    fn invoke(&self, role: RoleId, bindings: Bindings) -> BoxFuture<'_, Result<String>>;
}

/// The background-information collaborator.
///
/// Infallible by contract: internal failures (no results, fetch errors)
/// degrade to a descriptive string so the engine never has to distinguish
/// "no information" from "lookup broke". Snippets are bounded in length.
pub trait LookupTool: Send + Sync + 'static {
    fn search(&self, query: String) -> BoxFuture<'_, String>;
}
