use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::choice::ChoiceValue;
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, DataType, FieldDef, FieldKind, TypeDef, TypeKind,
};
use crate::types::Coding;
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const CODE: FieldDef = FieldDef::new(
    "code",
    Cardinality::REQUIRED,
    FieldKind::Element(DataType::Coding),
)
.summary()
.bound(BindingDef {
    name: Some("UsageContextType"),
    strength: BindingStrength::Extensible,
    description: Some(
        "A code that specifies a type of context being specified by a usage context.",
    ),
    value_set: "http://terminology.hl7.org/ValueSet/usage-context-type",
    fixed: None,
});
const VALUE: FieldDef = FieldDef::new(
    "value",
    Cardinality::REQUIRED,
    FieldKind::Choice(&[DataType::CodeableConcept, DataType::Quantity, DataType::Reference]),
)
.summary();

/// Targets allowed when `value` is a Reference
const VALUE_TARGETS: &[&str] = &[
    "PlanDefinition",
    "ResearchStudy",
    "InsurancePlan",
    "HealthcareService",
    "Group",
    "Location",
    "Organization",
];

static FIELDS: [FieldDef; 2] = [CODE, VALUE];

pub static USAGE_CONTEXT: TypeDef = TypeDef {
    name: "UsageContext",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &[],
};

/// The context in which content is intended to be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageContext {
    element: ElementCore,
    code: Coding,
    value: ChoiceValue,
    hash_memo: HashMemo,
}

memoized_hash!(UsageContext { element, code, value });

// code and value are required, so there is always a child
impl_element!(UsageContext, element, |_this| true);

impl UsageContext {
    pub fn builder() -> UsageContextBuilder {
        UsageContextBuilder::default()
    }

    pub fn to_builder(&self) -> UsageContextBuilder {
        UsageContextBuilder::from(self)
    }

    pub fn code(&self) -> &Coding {
        &self.code
    }

    /// One of CodeableConcept, Quantity or Reference
    pub fn value(&self) -> &ChoiceValue {
        &self.value
    }
}

impl Visitable for UsageContext {
    fn type_def(&self) -> &'static TypeDef {
        &USAGE_CONTEXT
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("code", Some(&self.code));
        children.dyn_node("value", Some(self.value.as_visitable()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsageContextBuilder {
    element: ElementCoreBuilder,
    code: Option<Coding>,
    value: Option<ChoiceValue>,
}

impl_element_builder!(UsageContextBuilder, element);

impl UsageContextBuilder {
    pub fn code(mut self, code: Coding) -> Self {
        self.code = Some(code);
        self
    }

    pub fn value(mut self, value: impl Into<ChoiceValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<UsageContext> {
        let mut checks = Checks::new(USAGE_CONTEXT.name);
        let element = self.element.build(&mut checks);
        let code = checks.required(self.code, CODE.name);
        let value = checks.required_choice(self.value, &VALUE);
        checks.reference_in(
            value.as_ref().and_then(ChoiceValue::as_reference),
            VALUE.name,
            VALUE_TARGETS,
        );

        let (Some(code), Some(value)) = (code, value) else {
            return Err(checks.into_error());
        };
        checks.finish(UsageContext {
            element,
            code,
            value,
            hash_memo: HashMemo::new(),
        })
    }
}

impl From<&UsageContext> for UsageContextBuilder {
    fn from(context: &UsageContext) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&context.element),
            code: Some(context.code.clone()),
            value: Some(context.value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rule;
    use crate::primitive::FhirString;
    use crate::types::Reference;

    fn focus() -> Coding {
        Coding::builder()
            .system("http://terminology.hl7.org/CodeSystem/usage-context-type")
            .code("focus")
            .build()
            .unwrap()
    }

    #[test]
    fn test_value_is_required() {
        let err = UsageContext::builder().code(focus()).build().unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().violation_for("value").unwrap().rule,
            Rule::RequiredMissing
        );
    }

    #[test]
    fn test_value_type_outside_choice() {
        let err = UsageContext::builder()
            .code(focus())
            .value(FhirString::from("adults"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err.as_validation().unwrap().violation_for("value").unwrap().rule,
            Rule::ChoiceTypeNotAllowed { .. }
        ));
    }

    #[test]
    fn test_reference_value_targets() {
        let ok = UsageContext::builder()
            .code(focus())
            .value(Reference::to("Group/adults"))
            .build();
        assert!(ok.is_ok());

        let err = UsageContext::builder()
            .code(focus())
            .value(Reference::to("Patient/1"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err.as_validation().unwrap().violation_for("value").unwrap().rule,
            Rule::ReferenceTypeNotAllowed { .. }
        ));
    }
}
