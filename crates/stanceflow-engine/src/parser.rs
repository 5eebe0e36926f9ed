//! Structured output extraction from free-text model responses.
//!
//! Model output is unreliable prose with a structured block somewhere
//! inside. The parsers here are maximally permissive about surrounding
//! text and strict about the extracted payload: routing correctness
//! depends on exact field values. Every failure is a recoverable value;
//! nothing in this module can abort a run.

use thiserror::Error;

use stanceflow_core::types::Stance;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON object found in output")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("no <agree> marker in output")]
    MissingAgree,

    #[error("unrecognized stance label: {0}")]
    UnknownStance(String),

    #[error("missing markup tag: {0}")]
    MissingTag(&'static str),
}

/// A parsed debate turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateTurn {
    pub agree: bool,
    pub new_target: Option<String>,
}

/// A parsed final-response block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalVerdict {
    pub target: String,
    pub stance: String,
}

/// Extract a JSON object from output that may contain other text.
///
/// First attempts to parse the trimmed (and fence-stripped) output as-is;
/// on failure falls back to the substring from the first `{` to the last
/// `}`.
pub fn extract_json_object(raw: &str) -> Result<serde_json::Value, ParseError> {
    let cleaned = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned.trim()) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let start = cleaned.find('{').ok_or(ParseError::NoJsonObject)?;
    let end = cleaned.rfind('}').ok_or(ParseError::NoJsonObject)?;
    if end < start {
        return Err(ParseError::NoJsonObject);
    }

    serde_json::from_str(&cleaned[start..=end]).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

/// Extract the candidate target from target-identification output.
/// Accepts `target1` (the original wire key) with `target` as a fallback.
pub fn parse_target(raw: &str) -> Result<String, ParseError> {
    let value = extract_json_object(raw)?;
    let target = value["target1"]
        .as_str()
        .or_else(|| value["target"].as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingField("target1"))?;
    Ok(target.to_string())
}

/// Extract the stance label from stance-detection output.
pub fn parse_stance(raw: &str) -> Result<Stance, ParseError> {
    let value = extract_json_object(raw)?;
    let label = value["stance"]
        .as_str()
        .ok_or(ParseError::MissingField("stance"))?;
    Stance::parse_label(label).ok_or_else(|| ParseError::UnknownStance(label.to_string()))
}

/// Whether a debate turn proposes a replacement target.
/// Marker presence alone drives the lookup-refresh route.
pub fn contains_new_target(raw: &str) -> bool {
    raw.contains("<new_target>")
}

/// Parse a debate turn's `<agree>`/`<new_target>` markup.
///
/// The `agree` field is required; `new_target` is optional. Anything else
/// in the output is ignored.
pub fn parse_debate_turn(raw: &str) -> Result<DebateTurn, ParseError> {
    let agree_re = regex::Regex::new(r"(?is)<agree>\s*(true|false)\s*</agree>").unwrap();
    let agree = match agree_re.captures(raw) {
        Some(cap) => cap[1].eq_ignore_ascii_case("true"),
        None => return Err(ParseError::MissingAgree),
    };

    let target_re = regex::Regex::new(r"(?is)<new_target>(.*?)</new_target>").unwrap();
    let new_target = target_re
        .captures(raw)
        .map(|cap| cap[1].trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(DebateTurn { agree, new_target })
}

/// Parse the final `<target>`/`<stance>` markup, tolerating ```xml fences.
pub fn parse_final_response(raw: &str) -> Result<FinalVerdict, ParseError> {
    let cleaned = strip_code_fences(raw);

    let target = capture_tag(&cleaned, "target").ok_or(ParseError::MissingTag("target"))?;
    let stance = capture_tag(&cleaned, "stance").ok_or(ParseError::MissingTag("stance"))?;

    Ok(FinalVerdict { target, stance })
}

fn capture_tag(text: &str, tag: &str) -> Option<String> {
    let re = regex::Regex::new(&format!(r"(?is)<{tag}>(.*?)</{tag}>")).unwrap();
    re.captures(text)
        .map(|cap| cap[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strip a markdown code fence (```json, ```xml, or bare ```) if present.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        // Skip optional language tag on same line
        let content_start = after.find('\n').map_or(0, |p| p + 1);
        let after = &after[content_start..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let value = extract_json_object(r#"{"target1":"x"}"#).unwrap();
        assert_eq!(value["target1"], "x");
    }

    #[test]
    fn test_fenced_object() {
        let value = extract_json_object("```json\n{\"target1\":\"x\"}\n```").unwrap();
        assert_eq!(value["target1"], "x");
    }

    #[test]
    fn test_noise_wrapped_object() {
        let value =
            extract_json_object(r#"Sure! Here is the JSON: {"target1":"x"} Hope that helps."#)
                .unwrap();
        assert_eq!(value["target1"], "x");
    }

    #[test]
    fn test_no_braces_is_parse_error() {
        assert_eq!(
            extract_json_object("no json here at all"),
            Err(ParseError::NoJsonObject)
        );
    }

    #[test]
    fn test_broken_braces_is_parse_error() {
        assert!(matches!(
            extract_json_object("{ this is not json }"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_target_variants() {
        assert_eq!(
            parse_target(r#"{"target1": " new update "}"#).unwrap(),
            "new update"
        );
        assert_eq!(parse_target(r#"{"target": "carbon tax"}"#).unwrap(), "carbon tax");
        assert_eq!(
            parse_target(r#"{"other": "x"}"#),
            Err(ParseError::MissingField("target1"))
        );
        assert_eq!(
            parse_target(r#"{"target1": ""}"#),
            Err(ParseError::MissingField("target1"))
        );
    }

    #[test]
    fn test_parse_stance() {
        assert_eq!(parse_stance(r#"{"stance": "AGAINST"}"#).unwrap(), Stance::Against);
        assert_eq!(
            parse_stance(r#"noise {"stance": "favor"} noise"#).unwrap(),
            Stance::Favor
        );
        assert_eq!(
            parse_stance(r#"{"stance": "strongly positive"}"#),
            Err(ParseError::UnknownStance("strongly positive".into()))
        );
    }

    #[test]
    fn test_debate_turn_agree() {
        let turn = parse_debate_turn("I concur. <agree>true</agree>").unwrap();
        assert!(turn.agree);
        assert_eq!(turn.new_target, None);
    }

    #[test]
    fn test_debate_turn_disagree_with_replacement() {
        let turn =
            parse_debate_turn("<agree>false</agree><new_target> software quality </new_target>")
                .unwrap();
        assert!(!turn.agree);
        assert_eq!(turn.new_target.as_deref(), Some("software quality"));
    }

    #[test]
    fn test_debate_turn_empty_replacement_dropped() {
        let turn = parse_debate_turn("<agree>false</agree><new_target>  </new_target>").unwrap();
        assert_eq!(turn.new_target, None);
    }

    #[test]
    fn test_debate_turn_case_insensitive() {
        let turn = parse_debate_turn("<AGREE>True</AGREE>").unwrap();
        assert!(turn.agree);
    }

    #[test]
    fn test_debate_turn_malformed_is_error_not_panic() {
        assert_eq!(
            parse_debate_turn("the target seems fine to me"),
            Err(ParseError::MissingAgree)
        );
        assert_eq!(
            parse_debate_turn("<agree>maybe</agree>"),
            Err(ParseError::MissingAgree)
        );
    }

    #[test]
    fn test_contains_new_target_marker() {
        assert!(contains_new_target("x <new_target>y</new_target>"));
        assert!(!contains_new_target("<agree>true</agree>"));
    }

    #[test]
    fn test_final_response() {
        let verdict =
            parse_final_response("<target>new update</target>\n<stance>AGAINST</stance>").unwrap();
        assert_eq!(verdict.target, "new update");
        assert_eq!(verdict.stance, "AGAINST");
    }

    #[test]
    fn test_final_response_xml_fenced() {
        let raw = "```xml\n<target>carbon tax</target><stance>FAVOR</stance>\n```";
        let verdict = parse_final_response(raw).unwrap();
        assert_eq!(verdict.target, "carbon tax");
    }

    #[test]
    fn test_final_response_missing_tag() {
        assert_eq!(
            parse_final_response("<target>x</target>"),
            Err(ParseError::MissingTag("stance"))
        );
    }
}
