//! User story, Given/When/Then scenarios and the implicit parts of a
//! requirement: assumptions, constraints and non-functional expectations.

use std::sync::LazyLock;

use regex::Regex;

use super::gaps::{has_human_actor, ACTOR_WORDS};
use crate::models::enums::Severity;
use crate::models::refinement::Scenario;
use crate::pipeline::generation::Extraction;

const DEFAULT_ACTOR: &str = "user";
const DEFAULT_VALUE: &str = "I can get my work done efficiently";
/// Modifiers that describe how the action is done and read well in a story.
const INSTRUMENT_PREPOSITIONS: &[&str] = &["with ", "via ", "by "];

/// Purpose clause: "so that ...", "in order to ...".
static VALUE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(so that|in order to|so as to|để|nhằm|giúp)\s+(.+?)[.!]?\s*$").unwrap()
});

static PERMISSION_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(permissions?|roles?|authori[sz]\w*|privileg\w*|quyền|phân quyền)\b").unwrap()
});

static PERSISTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(sav(e|es|ed)|updat(e|es|ed)|creat(e|es|ed)|stor(e|es|ed)|upload(s|ed)?|record(s|ed)?|lưu|cập nhật|tạo)\b",
    )
    .unwrap()
});

static USES_DATABASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(sav(e|es|ed)|updat(e|es|ed)|delet(e|es|ed)|creat(e|es|ed)|stor(e|es|ed)|lưu|cập nhật|xóa|tạo)\b")
        .unwrap()
});

static SIGNED_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(users?|log ?in|login|sign(ed)? in|account|đăng nhập|người dùng)\b").unwrap()
});

static EXTERNAL_SERVICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(apis?|integrat\w*|third[- ]party|external|webhooks?|tích hợp)\b").unwrap()
});

static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(mobile|phones?|ios|android|điện thoại)\b").unwrap());

static REAL_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(real[- ]time|instantly|live updates?|thời gian thực|ngay lập tức)\b").unwrap());

static COMPLIANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(gdpr|hipaa|pci|complian\w*|regulat\w*|quy định|luật)\b").unwrap()
});

/// Non-functional categories in reporting order.
static NON_FUNCTIONAL: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"(?i)\b(fast|quickly|performance|response times?|latency|within \d+\s*(ms|milliseconds?|seconds?|s)|hiệu suất|nhanh|tốc độ)\b",
            "Performance: responds in under 2 seconds",
        ),
        (
            r"(?i)\b(secur\w*|encrypt\w*|authori[sz]\w*|authenticat\w*|permissions?|bảo mật|mã hóa|phân quyền|xác thực)\b",
            "Security: sensitive data is encrypted and every request is authenticated",
        ),
        (
            r"(?i)\b(easy|intuitive|user[- ]friendly|accessib\w*|usab\w*|dễ dùng|thân thiện|trực quan|giao diện)\b",
            "Usability: the interface is easy to learn without training",
        ),
        (
            r"(?i)\b(available|availability|uptime|reliab\w*|stable|ổn định|sẵn sàng)\b",
            "Reliability: 99.9% uptime with graceful error handling",
        ),
        (
            r"(?i)\b(scal\w*|concurrent\w*|thousands of users|many users|mở rộng|nhiều người dùng)\b",
            "Scalability: supports 1000+ concurrent users",
        ),
    ]
    .into_iter()
    .map(|(pattern, statement)| (Regex::new(pattern).unwrap(), statement))
    .collect()
});

/// Human role acting in the story, singular and lowercase.
pub fn story_actor(text: &str, extraction: &Extraction) -> String {
    let actor = if has_human_actor(extraction) {
        extraction.actor.clone()
    } else {
        ACTOR_WORDS.find(text).map(|m| m.as_str().to_string())
    };
    actor
        .map(|a| singular(&a.to_lowercase()))
        .unwrap_or_else(|| DEFAULT_ACTOR.to_string())
}

fn singular(word: &str) -> String {
    match word.strip_suffix('s') {
        Some(stem) if stem.chars().count() > 2 && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some(c) if "aeiou".contains(c) => "an",
        _ => "a",
    }
}

/// "export audit logs as CSV with filters", what the actor wants to do.
pub fn goal(extraction: &Extraction) -> String {
    let mut goal = extraction.verb_phrase();
    if let Some(format) = &extraction.format {
        goal.push_str(" as ");
        goal.push_str(format);
    }
    if let Some(modifier) = extraction
        .primary_modifier()
        .filter(|m| INSTRUMENT_PREPOSITIONS.iter().any(|p| m.starts_with(p)))
    {
        goal.push(' ');
        goal.push_str(modifier);
    }
    goal
}

fn value(text: &str) -> String {
    let Some(caps) = VALUE_CLAUSE.captures(text) else {
        return DEFAULT_VALUE.to_string();
    };
    let clause = caps[2].trim().to_string();
    if caps[1].eq_ignore_ascii_case("so that") {
        clause
    } else {
        format!("I can {clause}")
    }
}

/// "As a manager, I want to approve expense reports, so that ...".
pub fn user_story(text: &str, extraction: &Extraction) -> String {
    let actor = story_actor(text, extraction);
    format!(
        "As {} {actor}, I want to {}, so that {}.",
        article(&actor),
        goal(extraction),
        value(text)
    )
}

/// Happy path and invalid input always; denied access when the sentence
/// talks about permissions; persistence when it changes stored data.
pub fn scenarios(text: &str, extraction: &Extraction) -> Vec<Scenario> {
    let actor = story_actor(text, extraction);
    let goal = goal(extraction);
    let mut out = vec![
        (
            format!("the {actor} is signed in"),
            format!("they {goal}"),
            "the system completes the request and shows the result".to_string(),
            Severity::High,
        ),
        (
            "the input data is invalid".to_string(),
            format!("the {actor} tries to {goal}"),
            "the system rejects the request with a clear error message".to_string(),
            Severity::Medium,
        ),
    ];
    if PERMISSION_MENTION.is_match(text) {
        out.push((
            format!("a {actor} without the required permission"),
            format!("they try to {goal}"),
            "access is denied and the reason is shown".to_string(),
            Severity::High,
        ));
    }
    if PERSISTS.is_match(text) {
        out.push((
            "the change was saved successfully".to_string(),
            "the page is reloaded".to_string(),
            "the saved data is shown unchanged".to_string(),
            Severity::Medium,
        ));
    }
    out.into_iter()
        .enumerate()
        .map(|(i, (given, when, then, priority))| Scenario {
            id: format!("AC{}", i + 1),
            given,
            when,
            then,
            priority,
        })
        .collect()
}

pub fn assumptions(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    if USES_DATABASE.is_match(text) {
        out.push("A stable database connection is available".to_string());
    }
    if SIGNED_IN.is_match(text) {
        out.push("The user is authenticated".to_string());
    }
    if EXTERNAL_SERVICE.is_match(text) {
        out.push("Third-party services are reachable".to_string());
    }
    out
}

pub fn constraints(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    if MOBILE.is_match(text) {
        out.push("Must run on both iOS and Android".to_string());
    }
    if REAL_TIME.is_match(text) {
        out.push("Updates are delivered in real time (latency under 500 ms)".to_string());
    }
    if COMPLIANCE.is_match(text) {
        out.push("Complies with the applicable data protection regulations".to_string());
    }
    out
}

pub fn non_functional(text: &str) -> Vec<String> {
    NON_FUNCTIONAL
        .iter()
        .filter(|(pattern, _)| pattern.is_match(text))
        .map(|(_, statement)| statement.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generation::{EntityExtractor, RuleBasedExtractor};
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> Extraction {
        RuleBasedExtractor::refined().extract(text)
    }

    #[test]
    fn story_uses_actor_goal_and_purpose() {
        let text = "Managers must approve expense reports so that refunds are paid on time.";
        assert_eq!(
            user_story(text, &extract(text)),
            "As a manager, I want to approve expense reports, so that refunds are paid on time."
        );
    }

    #[test]
    fn system_subject_falls_back_to_named_role_or_user() {
        let text = "The system must allow admins to export audit logs to CSV.";
        let e = extract(text);
        assert_eq!(story_actor(text, &e), "admin");
        assert_eq!(
            user_story(text, &e),
            "As an admin, I want to export audit logs as CSV, so that I can get my work done efficiently."
        );

        let text = "The system must archive closed tickets in order to keep the queue short.";
        let e = extract(text);
        assert_eq!(story_actor(text, &e), "user");
        assert!(user_story(text, &e).ends_with("so that I can keep the queue short."));
    }

    #[test]
    fn instrument_modifier_is_kept() {
        let text = "Users must login with email and password.";
        assert_eq!(goal(&extract(text)), "log in with email and password");
    }

    #[test]
    fn singular_leaves_short_and_double_s_words() {
        assert_eq!(singular("users"), "user");
        assert_eq!(singular("staff"), "staff");
        assert_eq!(singular("bus"), "bus");
        assert_eq!(singular("address"), "address");
    }

    #[test]
    fn base_scenarios_cover_success_and_invalid_input() {
        let text = "Managers must review monthly totals.";
        let s = scenarios(text, &extract(text));
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].id, "AC1");
        assert_eq!(s[0].given, "the manager is signed in");
        assert_eq!(s[0].when, "they review monthly totals");
        assert_eq!(s[0].priority, Severity::High);
        assert_eq!(s[1].when, "the manager tries to review monthly totals");
    }

    #[test]
    fn permission_and_persistence_add_scenarios() {
        let text = "Users with the editor role must update article drafts.";
        let s = scenarios(text, &extract(text));
        let ids: Vec<&str> = s.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["AC1", "AC2", "AC3", "AC4"]);
        assert_eq!(s[2].then, "access is denied and the reason is shown");
        assert_eq!(s[3].when, "the page is reloaded");
    }

    #[test]
    fn implicit_context_is_extracted() {
        let text = "Users must update their profile from the mobile app in real time via the CRM API.";
        assert_eq!(
            assumptions(text),
            vec![
                "A stable database connection is available".to_string(),
                "The user is authenticated".to_string(),
                "Third-party services are reachable".to_string(),
            ]
        );
        assert_eq!(
            constraints(text),
            vec![
                "Must run on both iOS and Android".to_string(),
                "Updates are delivered in real time (latency under 500 ms)".to_string(),
            ]
        );
    }

    #[test]
    fn non_functional_categories_in_order() {
        let text = "Search must be fast and secure for thousands of users.";
        assert_eq!(
            non_functional(text),
            vec![
                "Performance: responds in under 2 seconds".to_string(),
                "Security: sensitive data is encrypted and every request is authenticated".to_string(),
                "Scalability: supports 1000+ concurrent users".to_string(),
            ]
        );
        assert!(non_functional("Managers must review monthly totals.").is_empty());
    }
}
