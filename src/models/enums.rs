use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Priority {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

str_enum!(Role {
    Backend => "Backend",
    Frontend => "Frontend",
    QA => "QA",
    DevOps => "DevOps",
    BA => "BA",
    Security => "Security",
});

str_enum!(Complexity {
    Simple => "Simple",
    Medium => "Medium",
    Complex => "Complex",
});

str_enum!(GenerationMode {
    Template => "template",
    ModelBased => "model",
    ExternalService => "llm",
});

str_enum!(LlmProvider {
    OpenAi => "openai",
    Anthropic => "anthropic",
    Ollama => "ollama",
});

str_enum!(Severity {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

str_enum!(GapType {
    MissingActor => "missing_actor",
    MissingObject => "missing_object",
    MissingErrorHandling => "missing_error_handling",
    MissingPermission => "missing_permission",
    MissingSecurity => "missing_security",
    MissingDataValidation => "missing_data_validation",
    MissingIntegration => "missing_integration",
    MissingNfr => "missing_nfr",
    Ambiguity => "ambiguity",
    Contradiction => "contradiction",
});

impl Priority {
    /// Ordering used when several tasks fold into one.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Case-insensitive parse; anything unrecognized becomes Medium.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }
}

impl Role {
    /// Case-insensitive parse accepting common aliases; defaults to Backend.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "frontend" | "front-end" | "ui" => Self::Frontend,
            "qa" | "test" | "testing" => Self::QA,
            "devops" | "ops" | "infrastructure" => Self::DevOps,
            "ba" | "business analyst" | "business" => Self::BA,
            "security" => Self::Security,
            _ => Self::Backend,
        }
    }
}

impl GenerationMode {
    /// Accepts the canonical names plus the aliases used in deployment configs.
    pub fn parse(value: &str) -> Result<Self, InvalidEnum> {
        match value.trim().to_lowercase().as_str() {
            "template" => Ok(Self::Template),
            "model" | "model_based" | "model-based" => Ok(Self::ModelBased),
            "llm" | "external" | "external_service" => Ok(Self::ExternalService),
            other => Err(InvalidEnum {
                field: "GenerationMode".into(),
                value: other.into(),
            }),
        }
    }
}

impl Complexity {
    pub fn from_story_points(points: u32) -> Self {
        match points {
            0..=2 => Self::Simple,
            3..=5 => Self::Medium,
            _ => Self::Complex,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn priority_round_trips_through_str() {
        for p in [Priority::Low, Priority::Medium, Priority::High, Priority::Critical] {
            assert_eq!(Priority::from_str(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn priority_lenient_defaults_to_medium() {
        assert_eq!(Priority::parse_lenient("HIGH"), Priority::High);
        assert_eq!(Priority::parse_lenient("urgent"), Priority::Medium);
        assert_eq!(Priority::parse_lenient(""), Priority::Medium);
    }

    #[test]
    fn priority_rank_orders_levels() {
        assert!(Priority::Critical.rank() > Priority::High.rank());
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn role_serializes_as_display_name() {
        let json = serde_json::to_string(&Role::DevOps).unwrap();
        assert_eq!(json, "\"DevOps\"");
        assert_eq!(Role::parse_lenient("testing"), Role::QA);
        assert_eq!(Role::parse_lenient("whatever"), Role::Backend);
    }

    #[test]
    fn generation_mode_accepts_aliases() {
        assert_eq!(GenerationMode::parse("Model").unwrap(), GenerationMode::ModelBased);
        assert_eq!(
            GenerationMode::parse("external").unwrap(),
            GenerationMode::ExternalService
        );
        let err = GenerationMode::parse("magic").unwrap_err();
        assert_eq!(err.value, "magic");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(LlmProvider::from_str("azure").is_err());
        assert_eq!(LlmProvider::from_str("ollama").unwrap(), LlmProvider::Ollama);
    }

    #[test]
    fn complexity_tracks_story_points() {
        assert_eq!(Complexity::from_story_points(1), Complexity::Simple);
        assert_eq!(Complexity::from_story_points(5), Complexity::Medium);
        assert_eq!(Complexity::from_story_points(8), Complexity::Complex);
    }
}
