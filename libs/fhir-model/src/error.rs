//! Error types for the FHIR object model

use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid model configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The validation failure, if this error is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

/// Aggregate failure of a single `build()` call.
///
/// Holds every violation found for the node being built, in the order the
/// checks ran (declaration order of the fields).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{type_name} failed validation: {}", join_violations(.violations))]
pub struct ValidationError {
    pub type_name: &'static str,
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new(type_name: &'static str, violations: Vec<Violation>) -> Self {
        Self {
            type_name,
            violations,
        }
    }

    /// True if any violation concerns `field`
    pub fn cites(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// First violation recorded for `field`
    pub fn violation_for(&self, field: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.field == field)
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Render as a FHIR OperationOutcome resource
    pub fn to_operation_outcome(&self) -> Value {
        serde_json::json!({
            "resourceType": "OperationOutcome",
            "issue": self
                .violations
                .iter()
                .map(|v| v.to_issue(self.type_name))
                .collect::<Vec<_>>()
        })
    }
}

/// One failed check, naming the offending field and the rule it broke
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub field: String,
    pub rule: Rule,
}

impl Violation {
    pub fn new(field: impl Into<String>, rule: Rule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }

    fn to_issue(&self, type_name: &str) -> Value {
        let expression = if self.field.is_empty() {
            type_name.to_string()
        } else {
            format!("{}.{}", type_name, self.field)
        };

        serde_json::json!({
            "severity": "error",
            "code": self.rule.issue_code(),
            "diagnostics": self.to_string(),
            "expression": [expression],
        })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.rule)
        } else {
            write!(f, "'{}': {}", self.field, self.rule)
        }
    }
}

/// The structural invariant a violation broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// A required scalar or choice field is absent
    RequiredMissing,
    /// A required repeating field has no elements
    NonEmptyRequired,
    /// A repeating field holds an absent element
    NullElement { index: usize },
    /// A choice payload is not one of the field's declared types
    ChoiceTypeNotAllowed {
        actual: String,
        allowed: Vec<String>,
    },
    /// A reference declares a target kind outside the field's allowed set
    ReferenceTypeNotAllowed {
        actual: String,
        allowed: Vec<String>,
    },
    /// A code is outside a fixed code list binding
    CodeNotInBinding { code: String, value_set: String },
    /// A node carries neither a populated field nor an extension
    EmptyLeaf,
    /// A primitive value does not match its data type's format
    InvalidPrimitive { reason: String },
}

impl Rule {
    /// OperationOutcome issue code for this rule
    pub fn issue_code(&self) -> &'static str {
        match self {
            Rule::RequiredMissing | Rule::NonEmptyRequired => "required",
            Rule::NullElement { .. } | Rule::EmptyLeaf => "structure",
            Rule::ChoiceTypeNotAllowed { .. }
            | Rule::ReferenceTypeNotAllowed { .. }
            | Rule::InvalidPrimitive { .. } => "value",
            Rule::CodeNotInBinding { .. } => "code-invalid",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::RequiredMissing => write!(f, "required element is missing"),
            Rule::NonEmptyRequired => write!(f, "required list must contain at least one element"),
            Rule::NullElement { index } => write!(f, "list element at index {} is absent", index),
            Rule::ChoiceTypeNotAllowed { actual, allowed } => write!(
                f,
                "type '{}' is not one of the allowed choice types [{}]",
                actual,
                allowed.join(", ")
            ),
            Rule::ReferenceTypeNotAllowed { actual, allowed } => write!(
                f,
                "reference target type '{}' is not one of [{}]",
                actual,
                allowed.join(", ")
            ),
            Rule::CodeNotInBinding { code, value_set } => {
                write!(f, "code '{}' is not in value set '{}'", code, value_set)
            }
            Rule::EmptyLeaf => write!(f, "element must have a value or children"),
            Rule::InvalidPrimitive { reason } => write!(f, "invalid primitive value: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_violation() {
        let err = ValidationError::new(
            "ResearchSubject",
            vec![
                Violation::new("status", Rule::RequiredMissing),
                Violation::new("consent", Rule::NullElement { index: 1 }),
            ],
        );

        let message = err.to_string();
        assert!(message.starts_with("ResearchSubject failed validation"));
        assert!(message.contains("'status': required element is missing"));
        assert!(message.contains("'consent': list element at index 1 is absent"));
    }

    #[test]
    fn test_operation_outcome_conversion() {
        let err = ValidationError::new(
            "ConditionDefinition",
            vec![
                Violation::new("status", Rule::RequiredMissing),
                Violation::new(
                    "team[0]",
                    Rule::ReferenceTypeNotAllowed {
                        actual: "Patient".to_string(),
                        allowed: vec!["CareTeam".to_string()],
                    },
                ),
            ],
        );

        let outcome = err.to_operation_outcome();
        assert_eq!(outcome["resourceType"], "OperationOutcome");
        assert_eq!(outcome["issue"][0]["severity"], "error");
        assert_eq!(outcome["issue"][0]["code"], "required");
        assert_eq!(outcome["issue"][0]["expression"][0], "ConditionDefinition.status");
        assert_eq!(outcome["issue"][1]["code"], "value");
    }
}
