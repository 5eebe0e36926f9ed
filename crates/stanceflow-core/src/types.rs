use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique run identifier.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a single model invocation. Each role maps to one prompt template
/// on the invoker side; the engine only ever names the role.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    LinguisticAnalysis,
    TargetTypeDecider,
    ImplicitTarget,
    ExplicitTarget,
    Debate,
    StanceDetection,
    FinalResponse,
}

impl RoleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinguisticAnalysis => "linguistic_analysis",
            Self::TargetTypeDecider => "target_type_decider",
            Self::ImplicitTarget => "implicit_target",
            Self::ExplicitTarget => "explicit_target",
            Self::Debate => "debate",
            Self::StanceDetection => "stance_detection",
            Self::FinalResponse => "final_response",
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorial stance toward the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stance {
    Favor,
    Against,
    Neutral,
    /// No usable target was available, so no stance call was made.
    UnableToDetermine,
    /// The stance call produced unparsable output.
    Error,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favor => "FAVOR",
            Self::Against => "AGAINST",
            Self::Neutral => "NEUTRAL",
            Self::UnableToDetermine => "UNABLE_TO_DETERMINE",
            Self::Error => "ERROR",
        }
    }

    /// Parse a stance label as emitted by the model. Case-insensitive,
    /// tolerant of surrounding whitespace, quotes, and trailing punctuation.
    pub fn parse_label(raw: &str) -> Option<Self> {
        let label = raw.trim().trim_matches(['"', '\'', '.', ',']).trim();
        match label.to_ascii_uppercase().as_str() {
            "FAVOR" => Some(Self::Favor),
            "AGAINST" => Some(Self::Against),
            "NEUTRAL" => Some(Self::Neutral),
            "UNABLE_TO_DETERMINE" => Some(Self::UnableToDetermine),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}
