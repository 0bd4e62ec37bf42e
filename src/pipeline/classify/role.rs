use std::sync::LazyLock;

use regex::Regex;

use crate::models::enums::Role;

/// Bonus added to a role when the classified type points at it.
const TYPE_HINT_BONUS: usize = 2;

/// Role categories in tie-break order, each with its keyword patterns.
/// Each pattern counts at most once per sentence.
static ROLE_PATTERNS: LazyLock<Vec<(Role, Vec<Regex>)>> = LazyLock::new(|| {
    let table: [(Role, &[&str]); 6] = [
        (
            Role::Frontend,
            &[
                r"\b(ui|user interface|frontend|front-end)\b",
                r"\b(screen|page|view|layout)s?\b",
                r"\b(button|form|menu|modal|dialog|tab)s?\b",
                r"\b(display|show|render)s?\b",
                r"\b(dashboard|widget|chart)s?\b",
                r"\b(responsive|mobile|browser|css)\b",
                r"\bclick\w*\b",
            ],
        ),
        (
            Role::Backend,
            &[
                r"\b(api|endpoint|rest|graphql)s?\b",
                r"\b(server|service|backend|back-end)s?\b",
                r"\b(database|db|table|schema|record)s?\b",
                r"\b(store|stored|storage|persist\w*)\b",
                r"\b(query|queries|index|cache)\b",
                r"\b(import|export|sync|batch|etl)\w*\b",
                r"\b(process\w*|calculat\w*|compute\w*)\b",
                r"\b(queue|job|scheduler|notification)s?\b",
            ],
        ),
        (
            Role::Security,
            &[
                r"\bauthenticat\w*\b",
                r"\bauthori[sz]\w*\b",
                r"\b(encrypt\w*|decrypt\w*|hash\w*|bcrypt)\b",
                r"\b(password|credential|token|secret)s?\b",
                r"\b(permission|access control|role-based|rbac)\b",
                r"\b(oauth\w*|sso|mfa|2fa|otp)\b",
                r"\b(secure|security|vulnerab\w*|attack\w*)\b",
                r"\b(audit\w*|gdpr|hipaa|pci)\b",
                r"\b(login|log in|sign in|logout|log out)\b",
            ],
        ),
        (
            Role::QA,
            &[
                r"\btest\w*\b",
                r"\b(verify|verification|validat\w*)\b",
                r"\b(quality|qa|regression|coverage)\b",
                r"\b(acceptance|defect|bug)s?\b",
            ],
        ),
        (
            Role::DevOps,
            &[
                r"\bdeploy\w*\b",
                r"\b(infrastructure|environment|cloud)s?\b",
                r"\b(ci/cd|pipeline|docker|kubernetes|container)s?\b",
                r"\b(monitor\w*|alert\w*|logging)\b",
                r"\b(uptime|availability|failover|backup)s?\b",
                r"\b(scal(e|able|ability|ing)|load balanc\w*)\b",
                r"\b(latency|response time|throughput|performance)\b",
            ],
        ),
        (
            Role::BA,
            &[
                r"\bbusiness (rule|process|logic)s?\b",
                r"\b(workflow|approval|stakeholder)s?\b",
                r"\b(report|reporting|kpi|metric)s?\b",
                r"\b(policy|policies|regulation|compliance)\b",
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(role, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
                .collect();
            (role, compiled)
        })
        .collect()
});

/// Which role a classified requirement type hints at.
fn type_hint(req_type: &str) -> Option<Role> {
    match req_type.trim().to_lowercase().as_str() {
        "interface" | "ui" | "usability" => Some(Role::Frontend),
        "data" | "database" | "integration" => Some(Role::Backend),
        "security" => Some(Role::Security),
        "performance" | "deployment" | "reliability" => Some(Role::DevOps),
        "testing" | "quality" => Some(Role::QA),
        "business" | "business_rule" => Some(Role::BA),
        _ => None,
    }
}

/// Keyword-scored role assignment. Always available: no model involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAssigner;

impl RoleAssigner {
    pub fn new() -> Self {
        Self
    }

    /// Pattern hit count per role, type hint bonus included, in tie-break order.
    pub fn scores(&self, text: &str, req_type: &str) -> Vec<(Role, usize)> {
        let hint = type_hint(req_type);
        ROLE_PATTERNS
            .iter()
            .map(|(role, patterns)| {
                let mut score = patterns.iter().filter(|p| p.is_match(text)).count();
                if hint == Some(*role) {
                    score += TYPE_HINT_BONUS;
                }
                (*role, score)
            })
            .collect()
    }

    /// Highest-scoring role; Backend when nothing matches.
    pub fn assign(&self, text: &str, req_type: &str) -> Role {
        let mut best = (Role::Backend, 0);
        for (role, score) in self.scores(text, req_type) {
            if score > best.1 {
                best = (role, score);
            }
        }
        best.0
    }
}
