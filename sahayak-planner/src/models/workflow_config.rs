//! Generation parameters chosen by the user

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Output language for generated materials
///
/// Serialized lowercase; deserialized through [`FromStr`], so clients may send
/// any casing with surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Language {
    #[default]
    Hindi,
    Tamil,
    Assamese,
}

impl Language {
    /// All supported languages in display order
    pub const ALL: [Language; 3] = [Language::Hindi, Language::Tamil, Language::Assamese];

    /// Wire value sent to the content service
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Hindi => "hindi",
            Language::Tamil => "tamil",
            Language::Assamese => "assamese",
        }
    }

    /// Human-readable label for selection lists
    pub fn label(&self) -> &'static str {
        match self {
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Assamese => "Assamese",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = sahayak_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                sahayak_common::Error::InvalidInput(format!("Unsupported language: {}", s))
            })
    }
}

impl TryFrom<String> for Language {
    type Error = sahayak_common::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One entry of the language selection list
#[derive(Debug, Clone, Serialize)]
pub struct LanguageOption {
    pub value: Language,
    pub label: &'static str,
}

impl From<Language> for LanguageOption {
    fn from(value: Language) -> Self {
        Self {
            value,
            label: value.label(),
        }
    }
}

/// User-chosen generation parameters
///
/// Free to change at any time; only checked for non-emptiness when a
/// generation is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfiguration {
    #[serde(default)]
    pub language: Language,
    pub grade_level: String,
    pub subject: String,
}

impl Default for WorkflowConfiguration {
    fn default() -> Self {
        Self {
            language: Language::default(),
            grade_level: "Class 7".to_string(),
            subject: "Science".to_string(),
        }
    }
}

impl WorkflowConfiguration {
    /// Submission-time check before a generation request
    pub fn validate_for_generation(&self) -> Result<(), ValidationError> {
        if self.grade_level.trim().is_empty() {
            return Err(ValidationError::EmptyGradeLevel);
        }
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("hindi".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!(" Tamil ".parse::<Language>().unwrap(), Language::Tamil);
        assert_eq!("ASSAMESE".parse::<Language>().unwrap(), Language::Assamese);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_configuration_json_accepts_any_casing() {
        let config: WorkflowConfiguration = serde_json::from_str(
            r#"{"language": " Tamil ", "grade_level": "Class 8", "subject": "Biology"}"#,
        )
        .unwrap();
        assert_eq!(config.language, Language::Tamil);

        let config: WorkflowConfiguration =
            serde_json::from_str(r#"{"grade_level": "Class 8", "subject": "Biology"}"#).unwrap();
        assert_eq!(config.language, Language::Hindi);

        let err = serde_json::from_str::<WorkflowConfiguration>(
            r#"{"language": "klingon", "grade_level": "Class 8", "subject": "Biology"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unsupported language"));
    }

    #[test]
    fn test_language_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Tamil).unwrap(), "\"tamil\"");
        let option = LanguageOption::from(Language::Assamese);
        let json = serde_json::to_value(option).unwrap();
        assert_eq!(json["value"], "assamese");
        assert_eq!(json["label"], "Assamese");
    }

    #[test]
    fn test_default_configuration() {
        let config = WorkflowConfiguration::default();
        assert_eq!(config.language, Language::Hindi);
        assert_eq!(config.grade_level, "Class 7");
        assert_eq!(config.subject, "Science");
        assert!(config.validate_for_generation().is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut config = WorkflowConfiguration {
            grade_level: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate_for_generation(),
            Err(ValidationError::EmptyGradeLevel)
        );

        config.grade_level = "Class 5".to_string();
        config.subject = String::new();
        assert_eq!(
            config.validate_for_generation(),
            Err(ValidationError::EmptySubject)
        );
    }
}
