//! Prompt templates, one per invocation role.
//!
//! Templates use `{name}` placeholders filled from the engine's bindings.
//! The JSON-only and markup-only instructions are deliberate: downstream
//! routing parses these outputs, so the prompts push the model toward a
//! machine-readable block even though the parser tolerates surrounding prose.

use stanceflow_core::traits::Bindings;
use stanceflow_core::types::RoleId;

const LINGUISTIC_ANALYSIS: &str = r#"Analyze the following text for its linguistic features, including sentiment, tone and style. Keep the analysis to 2-3 lines.
Text: "{input}"
Provide a brief analysis:"#;

const TARGET_TYPE_DECIDER: &str = r#"You are an expert in discourse analysis. Decide whether the subject the author expresses a stance toward is stated explicitly in the text, or is only implied and must be inferred.
Text: "{input}"
Answer with a single word, "explicit" or "implicit", followed by a one-line justification:"#;

const IMPLICIT_TARGET: &str = r#"You are a JSON-only API. Your sole purpose is to identify a concise, 2-3 word target from a text. The target is never named directly in the text; infer it from context.

**Instructions:**
- Analyze the user's text.
- Identify the implied target the author is taking a stance toward.
- The target must be concise (2-3 words).
- Your response MUST be a single JSON object.
- DO NOT provide any text, explanation, or code before or after the JSON object.

**Example:**
[INPUT]
Text: "Twelve years of 'abstinence only' classes and my cousin still got pregnant at 16."
[OUTPUT]
{
  "target1": "sex education"
}

**Task:**
[INPUT]
Text: "{input}"
[OUTPUT]
"#;

const EXPLICIT_TARGET: &str = r#"You are a JSON-only API. Your sole purpose is to identify a concise, 2-3 word target from a text. The target is named directly in the text.

**Instructions:**
- Analyze the user's text.
- Identify the main target the author is taking a stance toward.
- The target must be concise (2-3 words).
- Your response MUST be a single JSON object.
- DO NOT provide any text, explanation, or code before or after the JSON object.

**Example:**
[INPUT]
Text: "I can't believe they are still pushing that awful new update. It's slow and buggy."
[OUTPUT]
{
  "target1": "new update"
}

**Task:**
[INPUT]
Text: "{input}"
[OUTPUT]
"#;

const DEBATE: &str = r#"You are reviewing a proposed target for stance analysis.

Text: "{input}"
Current target: "{target}"
Background information on the target:
{target_info}

Previous review turns:
{debate_history}

Is the current target the best subject to measure the author's stance toward?
- If you agree with the current target, reply with exactly: <agree>true</agree>
- If you disagree, reply with: <agree>false</agree><new_target>your better 2-3 word target</new_target>
Reply with the markup only."#;

const STANCE_DETECTION: &str = r#"You are a JSON-only API. Your sole purpose is to determine the stance towards a target from a text.

**Instructions:**
- Analyze the user's text and the given target, using the background information if helpful.
- The stance MUST be one of 'FAVOR', 'AGAINST', or 'NEUTRAL'.
- Your response MUST be a single JSON object.
- DO NOT provide any text, explanation, or code before or after the JSON object.

**Example:**
[INPUT]
Text: "I can't believe they are still pushing that awful new update. It's slow and buggy."
Target: "new update"
[OUTPUT]
{
  "stance": "AGAINST"
}

**Task:**
[INPUT]
Text: "{input}"
Target: "{target}"
Background: {target_info}
[OUTPUT]
"#;

const FINAL_RESPONSE: &str = r#"Summarize a completed stance analysis as markup.

Linguistic analysis: {linguistic_analysis}
Target: {target}
Stance: {stance}

Reply with exactly this markup and nothing else:
<target>the target</target>
<stance>the stance</stance>"#;

/// The prompt template for a role.
pub fn template(role: RoleId) -> &'static str {
    match role {
        RoleId::LinguisticAnalysis => LINGUISTIC_ANALYSIS,
        RoleId::TargetTypeDecider => TARGET_TYPE_DECIDER,
        RoleId::ImplicitTarget => IMPLICIT_TARGET,
        RoleId::ExplicitTarget => EXPLICIT_TARGET,
        RoleId::Debate => DEBATE,
        RoleId::StanceDetection => STANCE_DETECTION,
        RoleId::FinalResponse => FINAL_RESPONSE,
    }
}

/// Render a role's prompt by substituting `{key}` placeholders.
///
/// Unbound placeholders are left in place rather than erroring: the engine
/// owns which bindings each node supplies, and a literal `{foo}` in a prompt
/// is easier to diagnose than a dropped field.
pub fn render(role: RoleId, bindings: &Bindings) -> String {
    let mut prompt = template(role).to_string();
    for (key, value) in bindings {
        prompt = prompt.replace(&format!("{{{}}}", key), value);
    }
    prompt
}
