use std::fmt;

use serde::{Deserialize, Serialize};

use super::enums::{GapType, Severity};

/// One acceptance scenario in Given/When/Then form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// "AC1", "AC2", ...
    pub id: String,
    pub given: String,
    pub when: String,
    pub then: String,
    pub priority: Severity,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Given {}, when {}, then {}", self.given, self.when, self.then)
    }
}

/// Something the source sentence leaves open, phrased as a question for
/// whoever owns the requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// "GAP001", numbered per task.
    pub gap_id: String,
    #[serde(rename = "type")]
    pub gap_type: GapType,
    pub severity: Severity,
    pub description: String,
    pub question: String,
    pub suggestion: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub gaps: Vec<Gap>,
    pub total_gaps: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    /// Any critical gap, or more than one high-severity gap.
    pub requires_clarification: bool,
}

impl GapReport {
    pub fn new(gaps: Vec<Gap>) -> Self {
        let count = |severity: Severity| gaps.iter().filter(|g| g.severity == severity).count();
        let critical_count = count(Severity::Critical);
        let high_count = count(Severity::High);
        Self {
            total_gaps: gaps.len(),
            critical_count,
            high_count,
            medium_count: count(Severity::Medium),
            low_count: count(Severity::Low),
            requires_clarification: critical_count > 0 || high_count > 1,
            gaps,
        }
    }

    pub fn has(&self, gap_type: GapType) -> bool {
        self.gaps.iter().any(|g| g.gap_type == gap_type)
    }
}

/// User story view of a task plus everything its sentence leaves unsaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    /// "As a user, I want to ..., so that ...".
    pub user_story: String,
    pub scenarios: Vec<Scenario>,
    pub assumptions: Vec<String>,
    pub constraints: Vec<String>,
    pub non_functional: Vec<String>,
    pub gap_report: GapReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap(gap_type: GapType, severity: Severity) -> Gap {
        Gap {
            gap_id: "GAP001".into(),
            gap_type,
            severity,
            description: "d".into(),
            question: "q".into(),
            suggestion: "s".into(),
            confidence: 0.8,
        }
    }

    #[test]
    fn report_counts_by_severity() {
        let report = GapReport::new(vec![
            gap(GapType::MissingActor, Severity::High),
            gap(GapType::Ambiguity, Severity::Medium),
            gap(GapType::MissingNfr, Severity::Low),
        ]);
        assert_eq!(report.total_gaps, 3);
        assert_eq!(report.high_count, 1);
        assert_eq!(report.medium_count, 1);
        assert_eq!(report.low_count, 1);
        assert!(!report.requires_clarification);
        assert!(report.has(GapType::Ambiguity));
        assert!(!report.has(GapType::Contradiction));
    }

    #[test]
    fn clarification_needed_for_critical_or_repeated_high() {
        assert!(GapReport::new(vec![gap(GapType::MissingSecurity, Severity::Critical)]).requires_clarification);
        assert!(GapReport::new(vec![
            gap(GapType::MissingActor, Severity::High),
            gap(GapType::MissingPermission, Severity::High),
        ])
        .requires_clarification);
        assert!(!GapReport::default().requires_clarification);
    }

    #[test]
    fn scenario_reads_as_sentence() {
        let scenario = Scenario {
            id: "AC1".into(),
            given: "the user is logged in".into(),
            when: "they export audit logs".into(),
            then: "a CSV file is downloaded".into(),
            priority: Severity::High,
        };
        assert_eq!(
            scenario.to_string(),
            "Given the user is logged in, when they export audit logs, then a CSV file is downloaded"
        );
    }

    #[test]
    fn gap_type_serializes_under_type_key() {
        let json = serde_json::to_value(gap(GapType::MissingErrorHandling, Severity::High)).unwrap();
        assert_eq!(json["type"], "missing_error_handling");
        assert_eq!(json["severity"], "High");
    }
}
