//! Build-time checks
//!
//! The free functions are pure: each inspects one value and returns the
//! violation it finds, if any. [`Checks`] is the collector a `build()` call
//! drives them through; it applies the active [`ModelConfig`] (which checks
//! run, collect-all or fail-fast) and produces the aggregate error.

use crate::builder::Repeated;
use crate::choice::ChoiceValue;
use crate::config::{ModelConfig, ViolationPolicy};
use crate::element::Element;
use crate::error::{Error, Result, Rule, ValidationError, Violation};
use crate::primitive::{Code, Primitive, PrimitiveKind};
use crate::schema::{DataType, FieldDef, FixedCodes};
use crate::types::{CodeableConcept, Coding, Reference};
use std::sync::Arc;

type Check = std::result::Result<(), Violation>;

/// Fails if a required value is absent
pub fn require_non_null<T>(value: Option<&T>, field: &str) -> Check {
    match value {
        Some(_) => Ok(()),
        None => Err(Violation::new(field, Rule::RequiredMissing)),
    }
}

/// Fails if a required repeating field has no elements
pub fn require_non_empty_list<T>(values: &[T], field: &str) -> Check {
    if values.is_empty() {
        Err(Violation::new(field, Rule::NonEmptyRequired))
    } else {
        Ok(())
    }
}

/// Fails on the first absent element of a staged list
pub fn check_list<T>(values: &[Option<T>], field: &str) -> Check {
    match values.iter().position(Option::is_none) {
        Some(index) => Err(Violation::new(field, Rule::NullElement { index })),
        None => Ok(()),
    }
}

/// Fails if a present choice payload is not one of `allowed`
pub fn choice_type_of(value: Option<&ChoiceValue>, field: &str, allowed: &[DataType]) -> Check {
    let Some(value) = value else {
        return Ok(());
    };
    let actual = value.data_type();
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(Violation::new(
            field,
            Rule::ChoiceTypeNotAllowed {
                actual: actual.name().to_string(),
                allowed: allowed.iter().map(|t| t.name().to_string()).collect(),
            },
        ))
    }
}

/// Fails if a required choice is absent or holds a type outside `allowed`
pub fn require_choice(value: Option<&ChoiceValue>, field: &str, allowed: &[DataType]) -> Check {
    require_non_null(value, field)?;
    choice_type_of(value, field, allowed)
}

/// Fails if the reference names a target kind outside `allowed`.
///
/// References whose target kind cannot be determined (fragments, URNs,
/// identifier-only) are never rejected, nor is anything when `allowed` is
/// empty.
pub fn check_reference_target_type(
    reference: Option<&Reference>,
    field: &str,
    allowed: &[&str],
) -> Check {
    let Some(actual) = reference.and_then(Reference::target_type) else {
        return Ok(());
    };
    if allowed.is_empty() || allowed.contains(&actual) {
        Ok(())
    } else {
        Err(Violation::new(
            field,
            Rule::ReferenceTypeNotAllowed {
                actual: actual.to_string(),
                allowed: allowed.iter().map(|t| t.to_string()).collect(),
            },
        ))
    }
}

/// A coded value a fixed code list can be checked against
#[derive(Debug, Clone, Copy)]
pub enum Coded<'a> {
    Code(&'a Code),
    Coding(&'a Coding),
    CodeableConcept(&'a CodeableConcept),
}

impl<'a> From<&'a Code> for Coded<'a> {
    fn from(code: &'a Code) -> Self {
        Coded::Code(code)
    }
}

impl<'a> From<&'a Coding> for Coded<'a> {
    fn from(coding: &'a Coding) -> Self {
        Coded::Coding(coding)
    }
}

impl<'a> From<&'a CodeableConcept> for Coded<'a> {
    fn from(concept: &'a CodeableConcept) -> Self {
        Coded::CodeableConcept(concept)
    }
}

fn code_listed(fixed: &FixedCodes, code: &str) -> bool {
    fixed.codes.is_empty() || fixed.codes.contains(&code)
}

fn coding_matches(fixed: &FixedCodes, coding: &Coding) -> bool {
    let Some(code) = coding.code_str() else {
        return true;
    };
    let system_ok = match fixed.system {
        Some(system) => coding.system_str() == Some(system),
        None => true,
    };
    system_ok && code_listed(fixed, code)
}

fn coding_label(coding: &Coding) -> String {
    match (coding.system_str(), coding.code_str()) {
        (Some(system), Some(code)) => format!("{}|{}", system, code),
        (None, Some(code)) => code.to_string(),
        _ => String::new(),
    }
}

/// Fails if a coded value falls outside an in-process code list.
///
/// Membership is checked against the listed codes (and the system, for
/// codings, when one is given) only; no value set is expanded. A concept
/// passes if any of its coded codings does, and is unchecked when none of its
/// codings carries a code.
pub fn check_fixed_code_binding(
    value: Option<Coded<'_>>,
    field: &str,
    value_set: &str,
    fixed: &FixedCodes,
) -> Check {
    let offending = match value {
        None => None,
        Some(Coded::Code(code)) => code
            .as_str()
            .filter(|c| !code_listed(fixed, c))
            .map(str::to_string),
        Some(Coded::Coding(coding)) => {
            (!coding_matches(fixed, coding)).then(|| coding_label(coding))
        }
        Some(Coded::CodeableConcept(concept)) => {
            let mut coded = concept
                .coding()
                .iter()
                .filter(|c| c.code_str().is_some())
                .peekable();
            match coded.peek() {
                None => None,
                Some(first) => {
                    let label = coding_label(first);
                    (!coded.any(|c| coding_matches(fixed, c))).then_some(label)
                }
            }
        }
    };

    match offending {
        Some(code) => Err(Violation::new(
            field,
            Rule::CodeNotInBinding {
                code,
                value_set: value_set.to_string(),
            },
        )),
        None => Ok(()),
    }
}

/// Fails if an element has neither a value nor any populated child.
/// The `id` does not count as a child.
pub fn require_value_or_children(node: &dyn Element) -> Check {
    if node.has_value() || node.has_children() {
        Ok(())
    } else {
        Err(Violation::new("", Rule::EmptyLeaf))
    }
}

/// Fails if a primitive's value does not match its data type's format
pub fn check_primitive<K: PrimitiveKind>(value: Option<&Primitive<K>>, field: &str) -> Check {
    match value {
        Some(v) => v
            .check_format()
            .map_err(|reason| Violation::new(field, Rule::InvalidPrimitive { reason })),
        None => Ok(()),
    }
}

/// Fails if a primitive choice payload does not match its data type's format
pub fn check_choice_format(value: Option<&ChoiceValue>, field: &str) -> Check {
    match value {
        Some(v) => v
            .check_format()
            .map_err(|reason| Violation::new(field, Rule::InvalidPrimitive { reason })),
        None => Ok(()),
    }
}

/// Collects the violations of one `build()` call
#[derive(Debug)]
pub struct Checks {
    type_name: &'static str,
    config: Arc<ModelConfig>,
    violations: Vec<Violation>,
}

impl Checks {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            config: ModelConfig::current(),
            violations: Vec::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn stopped(&self) -> bool {
        self.config.violation_policy == ViolationPolicy::FailFast && !self.violations.is_empty()
    }

    /// Record the outcome of a check
    pub fn record(&mut self, check: Check) {
        if self.stopped() {
            return;
        }
        if let Err(violation) = check {
            self.violations.push(violation);
        }
    }

    pub fn required<T>(&mut self, value: Option<T>, field: &str) -> Option<T> {
        self.record(require_non_null(value.as_ref(), field));
        value
    }

    /// Check a staged list and keep its present elements
    pub fn list<T>(&mut self, staged: Repeated<T>, field: &str) -> Vec<T> {
        self.record(check_list(staged.as_slice(), field));
        staged.into_present()
    }

    pub fn required_list<T>(&mut self, staged: Repeated<T>, field: &str) -> Vec<T> {
        let values = self.list(staged, field);
        self.record(require_non_empty_list(&values, field));
        values
    }

    pub fn choice(&mut self, value: Option<&ChoiceValue>, def: &FieldDef) {
        if self.config.validating {
            self.record(choice_type_of(value, def.name, def.choice_types()));
            self.record(check_choice_format(value, def.name));
        }
    }

    /// Presence is always enforced; payload type and format only when
    /// validating
    pub fn required_choice(
        &mut self,
        value: Option<ChoiceValue>,
        def: &FieldDef,
    ) -> Option<ChoiceValue> {
        if self.config.validating {
            self.record(require_choice(value.as_ref(), def.name, def.choice_types()));
            self.record(check_choice_format(value.as_ref(), def.name));
        } else {
            self.record(require_non_null(value.as_ref(), def.name));
        }
        value
    }

    pub fn reference(&mut self, reference: Option<&Reference>, def: &FieldDef) {
        self.reference_in(reference, def.name, def.reference_targets());
    }

    /// Check a reference nested in a choice against the targets allowed there
    pub fn reference_in(&mut self, reference: Option<&Reference>, field: &str, allowed: &[&str]) {
        if self.config.checks_references() {
            self.record(check_reference_target_type(reference, field, allowed));
        }
    }

    pub fn references(&mut self, references: &[Reference], def: &FieldDef) {
        if !self.config.checks_references() {
            return;
        }
        for (index, reference) in references.iter().enumerate() {
            let field = format!("{}[{}]", def.name, index);
            self.record(check_reference_target_type(
                Some(reference),
                &field,
                def.reference_targets(),
            ));
        }
    }

    pub fn binding<'a>(&mut self, value: Option<impl Into<Coded<'a>>>, def: &FieldDef) {
        if !self.config.checks_bindings() {
            return;
        }
        if let Some((value_set, fixed)) = def.fixed_codes() {
            self.record(check_fixed_code_binding(
                value.map(Into::into),
                def.name,
                value_set,
                &fixed,
            ));
        }
    }

    pub fn primitive<K: PrimitiveKind>(&mut self, value: Option<&Primitive<K>>, field: &str) {
        if self.config.validating {
            self.record(check_primitive(value, field));
        }
    }

    pub fn primitives<K: PrimitiveKind>(&mut self, values: &[Primitive<K>], field: &str) {
        if !self.config.validating {
            return;
        }
        for (index, value) in values.iter().enumerate() {
            self.record(check_primitive(Some(value), &format!("{}[{}]", field, index)));
        }
    }

    pub fn value_or_children(&mut self, node: &dyn Element) {
        if self.config.validating {
            self.record(require_value_or_children(node));
        }
    }

    /// Turn the collected violations into the aggregate failure
    pub fn into_error(self) -> Error {
        tracing::debug!(
            type_name = self.type_name,
            violations = self.violations.len(),
            "rejected build"
        );
        Error::Validation(ValidationError::new(self.type_name, self.violations))
    }

    /// Release `node` if no check failed
    pub fn finish<T>(self, node: T) -> Result<T> {
        if self.violations.is_empty() {
            tracing::trace!(type_name = self.type_name, "built node");
            Ok(node)
        } else {
            Err(self.into_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CodeableConcept;

    const STATUS_CODES: FixedCodes = FixedCodes {
        system: Some("http://hl7.org/fhir/publication-status"),
        codes: &["draft", "active", "retired", "unknown"],
    };

    const STATUS_VS: &str = "http://hl7.org/fhir/ValueSet/publication-status|5.0.0";

    fn check_status<'a>(value: impl Into<Coded<'a>>) -> Check {
        check_fixed_code_binding(Some(value.into()), "status", STATUS_VS, &STATUS_CODES)
    }

    fn coding(system: &str, code: &str) -> Coding {
        Coding::builder().system(system).code(code).build().unwrap()
    }

    #[test]
    fn test_require_non_null_names_field() {
        let err = require_non_null::<u8>(None, "status").unwrap_err();
        assert_eq!(err.field, "status");
        assert_eq!(err.rule, Rule::RequiredMissing);
        assert!(require_non_null(Some(&1), "status").is_ok());
    }

    #[test]
    fn test_check_list_reports_first_absent_index() {
        let staged = [Some(1), None, Some(3), None];
        let err = check_list(&staged, "consent").unwrap_err();
        assert_eq!(err.rule, Rule::NullElement { index: 1 });
        assert!(check_list::<u8>(&[], "consent").is_ok());
    }

    #[test]
    fn test_require_non_empty_list() {
        assert_eq!(
            require_non_empty_list::<u8>(&[], "coding").unwrap_err().rule,
            Rule::NonEmptyRequired
        );
        assert!(require_non_empty_list(&[1], "coding").is_ok());
    }

    #[test]
    fn test_choice_type_of() {
        let allowed = [DataType::String, DataType::Coding];
        let text = ChoiceValue::from(crate::primitive::FhirString::from("1.2.0"));
        let flag = ChoiceValue::from(crate::primitive::Boolean::from(true));

        assert!(choice_type_of(None, "versionAlgorithm", &allowed).is_ok());
        assert!(choice_type_of(Some(&text), "versionAlgorithm", &allowed).is_ok());

        let err = choice_type_of(Some(&flag), "versionAlgorithm", &allowed).unwrap_err();
        assert_eq!(
            err.rule,
            Rule::ChoiceTypeNotAllowed {
                actual: "boolean".to_string(),
                allowed: vec!["string".to_string(), "Coding".to_string()],
            }
        );
        assert_eq!(
            require_choice(None, "value", &allowed).unwrap_err().rule,
            Rule::RequiredMissing
        );
    }

    #[test]
    fn test_reference_target_type() {
        let allowed = ["Patient", "Group"];
        let patient = Reference::to("Patient/123");
        let organization = Reference::to("Organization/9");
        let contained = Reference::to("#p1");

        assert!(check_reference_target_type(Some(&patient), "subject", &allowed).is_ok());
        assert!(check_reference_target_type(Some(&contained), "subject", &allowed).is_ok());
        assert!(check_reference_target_type(Some(&organization), "subject", &[]).is_ok());

        let err =
            check_reference_target_type(Some(&organization), "subject", &allowed).unwrap_err();
        assert!(matches!(
            err.rule,
            Rule::ReferenceTypeNotAllowed { ref actual, .. } if actual == "Organization"
        ));
    }

    #[test]
    fn test_fixed_binding_on_code() {
        let active = Code::from("active");
        let bogus = Code::from("bogus");

        assert!(check_status(&active).is_ok());
        let err = check_status(&bogus).unwrap_err();
        assert_eq!(
            err.rule,
            Rule::CodeNotInBinding {
                code: "bogus".to_string(),
                value_set: STATUS_VS.to_string(),
            }
        );
    }

    #[test]
    fn test_fixed_binding_on_coding_checks_system() {
        let right = coding("http://hl7.org/fhir/publication-status", "draft");
        let wrong_system = coding("http://example.org/status", "draft");

        assert!(check_status(&right).is_ok());
        let err = check_status(&wrong_system).unwrap_err();
        assert!(matches!(
            err.rule,
            Rule::CodeNotInBinding { ref code, .. } if code == "http://example.org/status|draft"
        ));
    }

    #[test]
    fn test_fixed_binding_on_concept_accepts_any_match() {
        let concept = CodeableConcept::builder()
            .coding(coding("http://example.org/local", "x"))
            .coding(coding("http://hl7.org/fhir/publication-status", "retired"))
            .build()
            .unwrap();
        let text_only = CodeableConcept::builder().text("free text").build().unwrap();
        let unmatched = CodeableConcept::builder()
            .coding(coding("http://example.org/local", "x"))
            .build()
            .unwrap();

        assert!(check_status(&concept).is_ok());
        assert!(check_status(&text_only).is_ok());
        assert!(check_status(&unmatched).is_err());
    }

    #[test]
    fn test_collector_fail_fast_keeps_first() {
        ModelConfig::fail_fast().scope(|| {
            let mut checks = Checks::new("Test");
            checks.required::<u8>(None, "a");
            checks.required::<u8>(None, "b");
            let err = checks.finish(()).unwrap_err();
            let err = err.as_validation().unwrap();
            assert_eq!(err.len(), 1);
            assert!(err.cites("a"));
        });
    }

    #[test]
    fn test_collector_collect_all() {
        let mut checks = Checks::new("Test");
        checks.required::<u8>(None, "a");
        checks.list(Repeated::<u8>::from(&[][..]), "empty");
        checks.required_list(Repeated::<u8>::new(), "b");
        let err = checks.finish(()).unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.len(), 2);
        assert!(err.cites("a") && err.cites("b"));
    }
}
