//! Keyword rules that take precedence over classifier labels.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::enums::Priority;
use crate::pipeline::classify::EnrichmentResult;

pub const KEYWORD_OVERRIDE_LABEL: &str = "keyword-override";

static SECURITY_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(encrypt\w*|decrypt\w*|passwords?|authenticat\w*|authori[sz]\w*|audit\w*|hipaa|pci|gdpr|credentials?|vulnerab\w*|data breach|access control|two-factor|2fa|mfa)\b",
    )
    .unwrap()
});

static LOW_SIGNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(could|may|optional|nice to have)\b").unwrap());

/// Labels after the security keyword rule, or `None` when no keyword fires.
///
/// A match forces type `security`, domain `general` and at least High
/// priority. Confidence is carried over unchanged.
pub fn security_override(text: &str, labels: &EnrichmentResult) -> Option<EnrichmentResult> {
    let keyword = SECURITY_KEYWORDS.find(text)?;
    let priority = if labels.priority.rank() >= Priority::High.rank() {
        labels.priority
    } else {
        Priority::High
    };

    if labels.req_type != "security" || labels.priority != priority || labels.domain != "general" {
        tracing::debug!(
            keyword = keyword.as_str(),
            from_type = %labels.req_type,
            from_priority = %labels.priority,
            from_domain = %labels.domain,
            "Security keyword override applied"
        );
    }

    Some(EnrichmentResult {
        req_type: "security".into(),
        priority,
        domain: "general".into(),
        ..labels.clone()
    })
}

/// Whether the sentence uses optional phrasing ("could", "nice to have").
pub fn is_low_signal(text: &str) -> bool {
    LOW_SIGNAL.is_match(text)
}
