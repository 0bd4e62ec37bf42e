use crate::pipeline::classify::EnrichmentResult;

pub const TASK_SYSTEM_PROMPT: &str = r#"
You are a software delivery assistant. You turn ONE requirement sentence into
ONE development task that an engineering team can pick up.

RULES:
1. Describe only what the requirement states. Do not invent features.
2. The title is an imperative phrase of at most 100 characters.
3. Provide 3 to 7 acceptance criteria, each independently testable.
4. Keep the predicted labels unless the requirement clearly contradicts them.
5. Output ONLY a JSON object wrapped in ```json``` fences. No prose.
"#;

/// Build the user prompt for one requirement sentence.
pub fn build_task_prompt(sentence: &str, labels: &EnrichmentResult, epic: Option<&str>) -> String {
    let epic_line = epic
        .map(|e| format!("Epic: {e}\n"))
        .unwrap_or_default();

    format!(
        r#"<requirement>
{sentence}
</requirement>

{epic_line}Predicted labels:
- type: {req_type}
- priority: {priority}
- domain: {domain}
- role: {role}

Return the task in exactly this JSON structure:

```json
{{
  "title": "Imperative task title",
  "description": "Two or three sentences on what to build and why",
  "acceptance_criteria": ["criterion 1", "criterion 2", "criterion 3"],
  "type": "functional | security | interface | data | performance | integration",
  "priority": "Low | Medium | High | Critical",
  "domain": "domain name",
  "role": "Backend | Frontend | QA | DevOps | BA | Security",
  "labels": ["label"],
  "story_points": 3,
  "confidence": 0.8
}}
```"#,
        sentence = sentence.trim(),
        req_type = labels.req_type,
        priority = labels.priority,
        domain = labels.domain,
        role = labels.role,
    )
}
