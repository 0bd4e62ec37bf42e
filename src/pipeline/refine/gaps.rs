//! Rule-based gap and ambiguity detection over a single requirement sentence.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::enums::{GapType, Severity};
use crate::models::refinement::{Gap, GapReport};
use crate::pipeline::generation::Extraction;

/// Below this many scenarios a refinement counts as thin.
pub const MIN_SCENARIOS: usize = 3;

/// Actors that name the software rather than a person or role.
const SYSTEM_ACTORS: &[&str] = &[
    "system", "application", "app", "platform", "service", "portal", "software", "tool", "it",
];

/// Objects too vague to implement against.
const GENERIC_OBJECTS: &[&str] = &[
    "data", "information", "info", "content", "stuff", "things", "items", "records", "details", "it",
    "them", "everything", "dữ liệu", "thông tin",
];

pub(crate) static ACTOR_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(users?|admins?|administrators?|customers?|managers?|staff|employees?|clients?|operators?|clinicians?|doctors?|patients?|teachers?|students?|guests?|members?|agents?|quản lý|nhân viên|khách hàng|người dùng|lễ tân|bác sĩ|bệnh nhân|giáo viên|học sinh)\b",
    )
    .unwrap()
});

pub(crate) static PERMISSION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(permissions?|roles?|authori[sz]\w*|privileg\w*|only|admins?|administrators?|quyền|phân quyền)\b")
        .unwrap()
});

static RISKY_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(creat(e|es|ed)|delet(e|es|ed)|updat(e|es|ed)|sav(e|es|ed)|sends?|process(es|ed)?|submit(s|ted)?|upload(s|ed)?|import(s|ed)?|transfer(s|red)?|pay(s|ment|ments)?|tạo|xóa|cập nhật|lưu|gửi|xử lý)\b",
    )
    .unwrap()
});

static ERROR_HANDLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(errors?|fail(s|ed|ure|ures)?|invalid|reject(s|ed)?|retr(y|ies)|rollback|roll back|lỗi|thất bại|không thành công)\b",
    )
    .unwrap()
});

static SENSITIVE_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(delet(e|es|ed)|remov(e|es|ed)|approv(e|es|ed)|reject(s|ed)?|refund(s|ed)?|xóa|phê duyệt|từ chối)\b")
        .unwrap()
});

static SENSITIVE_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(passwords?|credit cards?|card numbers?|ssn|social security|personal|id cards?|bank accounts?|mật khẩu|thẻ tín dụng|cccd|cmnd|cá nhân)\b",
    )
    .unwrap()
});

static PROTECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(encrypt\w*|hash\w*|bcrypt|argon2|secur\w*|auth\w*|tls|https|mask\w*|mã hóa|bảo mật|xác thực)\b",
    )
    .unwrap()
});

static INPUT_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(enters?|inputs?|fill(s)?( in| out)?|creat(e|es|ed)|submit(s|ted)?|registers?|sign up|nhập|điền|tạo)\b",
    )
    .unwrap()
});

static VALIDATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(validat\w*|valid|invalid|check\w*|verif\w*|format|required|mandatory|kiểm tra|hợp lệ)\b")
        .unwrap()
});

static INTEGRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(apis?|integrat\w*|third[- ]party|external|webhooks?|tích hợp)\b").unwrap()
});

static INTEGRATION_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(endpoints?|format|json|xml|authenticat\w*|oauth\w*|timeouts?|retr(y|ies)|fallback)\b")
        .unwrap()
});

static VAGUE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(etc|and so on|should|appropriate(ly)?|reasonable|adequate(ly)?|user[- ]friendly|as needed|if possible|fast|quickly|easy|tùy thuộc|có thể|nên|hợp lý|thích hợp|vv)\b|\.\.\.",
    )
    .unwrap()
});

/// (asserting, contradicting). The contradicting side is removed before the
/// asserting side is searched, so "không bắt buộc" does not also read as
/// "bắt buộc".
static CONTRADICTIONS: LazyLock<Vec<(Regex, Regex)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(always|mandatory|required|luôn|bắt buộc)\b", r"(?i)\b(optional(ly)?|tùy chọn|không bắt buộc)\b"),
        (r"(?i)\b(all|every|tất cả|mọi)\b", r"(?i)\b(some|several|một số|vài)\b"),
        (r"(?i)\b(public|publicly|công khai)\b", r"(?i)\b(private|privately|riêng tư)\b"),
    ]
    .into_iter()
    .map(|(a, b)| (Regex::new(a).unwrap(), Regex::new(b).unwrap()))
    .collect()
});

/// A condition paired with the wording that would have settled it.
struct Rule {
    gap_type: GapType,
    severity: Severity,
    trigger: &'static LazyLock<Regex>,
    settled_by: &'static LazyLock<Regex>,
    description: &'static str,
    question: &'static str,
    suggestion: &'static str,
    confidence: f32,
}

static RULES: &[Rule] = &[
    Rule {
        gap_type: GapType::MissingErrorHandling,
        severity: Severity::High,
        trigger: &RISKY_ACTION,
        settled_by: &ERROR_HANDLING,
        description: "The requirement does not say what happens when the operation fails",
        question: "What should happen when this operation fails? How is the error shown, and is anything rolled back?",
        suggestion: "Add: 'If the operation fails, the system shows a clear message and rolls back the change'",
        confidence: 0.8,
    },
    Rule {
        gap_type: GapType::MissingPermission,
        severity: Severity::High,
        trigger: &SENSITIVE_ACTION,
        settled_by: &PERMISSION_WORDS,
        description: "A sensitive action without a stated permission",
        question: "Who is allowed to perform this action? Which role is required?",
        suggestion: "Add: 'Only managers can delete ...' or 'Requires the Admin role'",
        confidence: 0.9,
    },
    Rule {
        gap_type: GapType::MissingSecurity,
        severity: Severity::Critical,
        trigger: &SENSITIVE_DATA,
        settled_by: &PROTECTION,
        description: "Sensitive data is mentioned without any protection requirement",
        question: "How is this data protected? Encryption, hashing, transport security?",
        suggestion: "Add: 'Passwords are hashed with bcrypt' and 'Data is transmitted over HTTPS'",
        confidence: 1.0,
    },
    Rule {
        gap_type: GapType::MissingDataValidation,
        severity: Severity::Medium,
        trigger: &INPUT_ACTION,
        settled_by: &VALIDATION,
        description: "Input is accepted without any validation rule",
        question: "What must be validated? Format, length limits, required fields?",
        suggestion: "Add: 'Email must be a valid address' and 'Name must not be empty'",
        confidence: 0.75,
    },
    Rule {
        gap_type: GapType::MissingIntegration,
        severity: Severity::High,
        trigger: &INTEGRATION,
        settled_by: &INTEGRATION_DETAIL,
        description: "An external integration is named without technical details",
        question: "Which endpoint and payload format? How does it authenticate? Timeouts and retries?",
        suggestion: "Add: 'POST /endpoint with a JSON body, 5 s timeout, 3 retries'",
        confidence: 0.8,
    },
];

/// Everything the detector needs to know about one sentence.
pub struct GapInput<'a> {
    pub text: &'a str,
    pub extraction: &'a Extraction,
    pub scenario_count: usize,
    pub non_functional_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GapDetector;

impl GapDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, input: &GapInput<'_>) -> GapReport {
        let mut gaps = Vec::new();
        gaps.extend(missing_actor(input));
        gaps.extend(missing_object(input));
        for rule in RULES {
            if rule.trigger.is_match(input.text) && !rule.settled_by.is_match(input.text) {
                gaps.push(gap(
                    rule.gap_type,
                    rule.severity,
                    rule.description.to_string(),
                    rule.question.to_string(),
                    rule.suggestion,
                    rule.confidence,
                ));
            }
        }
        gaps.extend(ambiguity(input.text));
        gaps.extend(contradiction(input.text));
        gaps.extend(thin_refinement(input));

        for (i, g) in gaps.iter_mut().enumerate() {
            g.gap_id = format!("GAP{:03}", i + 1);
        }
        GapReport::new(gaps)
    }
}

fn gap(
    gap_type: GapType,
    severity: Severity,
    description: String,
    question: String,
    suggestion: &str,
    confidence: f32,
) -> Gap {
    Gap {
        gap_id: String::new(),
        gap_type,
        severity,
        description,
        question,
        suggestion: suggestion.to_string(),
        confidence,
    }
}

/// True when the extracted subject is a person or role rather than the
/// software itself or the object of a passive sentence.
pub(crate) fn has_human_actor(extraction: &Extraction) -> bool {
    extraction.actor.as_deref().is_some_and(|actor| {
        let actor = actor.to_lowercase();
        actor != extraction.object.to_lowercase() && !actor.split_whitespace().any(|w| SYSTEM_ACTORS.contains(&w))
    })
}

fn missing_actor(input: &GapInput<'_>) -> Option<Gap> {
    if has_human_actor(input.extraction) || ACTOR_WORDS.is_match(input.text) {
        return None;
    }
    Some(gap(
        GapType::MissingActor,
        Severity::High,
        "The requirement does not say which user or role performs the action".into(),
        "Who uses this feature? (manager, staff, customer, ...)".into(),
        "Name the role: 'Hotel managers need to ...' or 'Front desk staff want to ...'",
        0.9,
    ))
}

fn missing_object(input: &GapInput<'_>) -> Option<Gap> {
    let object = input.extraction.object.trim().to_lowercase();
    if !GENERIC_OBJECTS.contains(&object.as_str()) {
        return None;
    }
    Some(gap(
        GapType::MissingObject,
        Severity::Medium,
        format!("The requirement refers to '{object}' without saying which data"),
        "Which data exactly? (bookings, customers, invoices, ...)".into(),
        "Replace the generic word with the entity: 'booking data', 'customer details'",
        0.85,
    ))
}

fn ambiguity(text: &str) -> Option<Gap> {
    let mut found: Vec<String> = Vec::new();
    for m in VAGUE_WORDS.find_iter(text) {
        let word = m.as_str().to_lowercase();
        if !found.contains(&word) {
            found.push(word);
        }
    }
    if found.is_empty() {
        return None;
    }
    Some(gap(
        GapType::Ambiguity,
        Severity::Medium,
        format!("Vague wording: {}", found.join(", ")),
        "Can this be stated precisely? List the items instead of 'etc', give numbers instead of 'fast'".into(),
        "Replace vague terms with measurable criteria",
        0.7,
    ))
}

fn contradiction(text: &str) -> Option<Gap> {
    CONTRADICTIONS.iter().find_map(|(asserting, contradicting)| {
        let negative = contradicting.find(text)?;
        let rest = contradicting.replace_all(text, " ");
        let positive = asserting.find(&rest)?;
        Some(gap(
            GapType::Contradiction,
            Severity::High,
            "The requirement contradicts itself".into(),
            format!(
                "The requirement says both '{}' and '{}'. Which one applies?",
                positive.as_str().to_lowercase(),
                negative.as_str().to_lowercase()
            ),
            "Decide one way: mandatory or optional, all or some, public or private",
            0.85,
        ))
    })
}

fn thin_refinement(input: &GapInput<'_>) -> Vec<Gap> {
    let mut gaps = Vec::new();
    if input.scenario_count < MIN_SCENARIOS {
        gaps.push(gap(
            GapType::Ambiguity,
            Severity::Low,
            format!("Only {} acceptance scenarios (3 to 8 recommended)", input.scenario_count),
            "Are there edge cases to cover: invalid data, permission denied, network errors?".into(),
            "Add scenarios for invalid input, denied access and failed calls",
            0.6,
        ));
    }
    if input.non_functional_count == 0 {
        gaps.push(gap(
            GapType::MissingNfr,
            Severity::Low,
            "No non-functional requirement is stated".into(),
            "Are there performance, security or usability expectations?".into(),
            "Add: 'Response time under 2 s' or 'Supports 100 concurrent users'",
            0.5,
        ));
    }
    gaps
}
