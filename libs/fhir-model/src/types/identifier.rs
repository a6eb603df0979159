use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{Code, FhirString, Uri};
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, DataType, FieldDef, FieldKind, FixedCodes, TypeDef,
    TypeKind,
};
use crate::types::{CodeableConcept, Period, Reference};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const USE: FieldDef = FieldDef::new(
    "use",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Code),
)
.summary()
.bound(BindingDef {
    name: Some("IdentifierUse"),
    strength: BindingStrength::Required,
    description: Some("Identifies the purpose for this identifier, if known."),
    value_set: "http://hl7.org/fhir/ValueSet/identifier-use|5.0.0",
    fixed: Some(FixedCodes {
        system: Some("http://hl7.org/fhir/identifier-use"),
        codes: &["usual", "official", "temp", "secondary", "old"],
    }),
});
const TYPE: FieldDef = FieldDef::new(
    "type",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.summary()
.bound(BindingDef {
    name: Some("IdentifierType"),
    strength: BindingStrength::Extensible,
    description: Some(
        "A coded type for an identifier that can be used to determine which identifier to use for a specific purpose.",
    ),
    value_set: "http://hl7.org/fhir/ValueSet/identifier-type",
    fixed: None,
});
const SYSTEM: FieldDef =
    FieldDef::new("system", Cardinality::OPTIONAL, FieldKind::Element(DataType::Uri)).summary();
const VALUE: FieldDef =
    FieldDef::new("value", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const PERIOD: FieldDef =
    FieldDef::new("period", Cardinality::OPTIONAL, FieldKind::Element(DataType::Period)).summary();
const ASSIGNER: FieldDef = FieldDef::new(
    "assigner",
    Cardinality::OPTIONAL,
    FieldKind::Reference(&["Organization"]),
)
.summary();

static FIELDS: [FieldDef; 6] = [USE, TYPE, SYSTEM, VALUE, PERIOD, ASSIGNER];

pub static IDENTIFIER: TypeDef = TypeDef {
    name: "Identifier",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &[],
};

/// A business identifier, unique within its `system`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    element: ElementCore,
    use_: Option<Code>,
    type_: Option<CodeableConcept>,
    system: Option<Uri>,
    value: Option<FhirString>,
    period: Option<Period>,
    assigner: Option<Box<Reference>>,
    hash_memo: HashMemo,
}

memoized_hash!(Identifier {
    element,
    use_,
    type_,
    system,
    value,
    period,
    assigner
});

impl_element!(Identifier, element, |this| this.use_.is_some()
    || this.type_.is_some()
    || this.system.is_some()
    || this.value.is_some()
    || this.period.is_some()
    || this.assigner.is_some());

impl Identifier {
    pub fn builder() -> IdentifierBuilder {
        IdentifierBuilder::default()
    }

    pub fn to_builder(&self) -> IdentifierBuilder {
        IdentifierBuilder::from(self)
    }

    pub fn use_(&self) -> Option<&Code> {
        self.use_.as_ref()
    }

    pub fn type_(&self) -> Option<&CodeableConcept> {
        self.type_.as_ref()
    }

    pub fn system(&self) -> Option<&Uri> {
        self.system.as_ref()
    }

    pub fn value(&self) -> Option<&FhirString> {
        self.value.as_ref()
    }

    pub fn period(&self) -> Option<&Period> {
        self.period.as_ref()
    }

    /// Organization that issued the identifier
    pub fn assigner(&self) -> Option<&Reference> {
        self.assigner.as_deref()
    }
}

impl Visitable for Identifier {
    fn type_def(&self) -> &'static TypeDef {
        &IDENTIFIER
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("use", self.use_.as_ref());
        children.node("type", self.type_.as_ref());
        children.node("system", self.system.as_ref());
        children.node("value", self.value.as_ref());
        children.node("period", self.period.as_ref());
        children.node("assigner", self.assigner.as_deref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierBuilder {
    element: ElementCoreBuilder,
    use_: Option<Code>,
    type_: Option<CodeableConcept>,
    system: Option<Uri>,
    value: Option<FhirString>,
    period: Option<Period>,
    assigner: Option<Reference>,
}

impl_element_builder!(IdentifierBuilder, element);

impl IdentifierBuilder {
    pub fn use_(mut self, use_: impl Into<Code>) -> Self {
        self.use_ = Some(use_.into());
        self
    }

    pub fn type_(mut self, type_: CodeableConcept) -> Self {
        self.type_ = Some(type_);
        self
    }

    pub fn system(mut self, system: impl Into<Uri>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn value(mut self, value: impl Into<FhirString>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn assigner(mut self, assigner: Reference) -> Self {
        self.assigner = Some(assigner);
        self
    }

    pub fn build(self) -> Result<Identifier> {
        let mut checks = Checks::new(IDENTIFIER.name);
        let element = self.element.build(&mut checks);
        checks.primitive(self.use_.as_ref(), USE.name);
        checks.binding(self.use_.as_ref(), &USE);
        checks.binding(self.type_.as_ref(), &TYPE);
        checks.primitive(self.system.as_ref(), SYSTEM.name);
        checks.reference(self.assigner.as_ref(), &ASSIGNER);

        let identifier = Identifier {
            element,
            use_: self.use_,
            type_: self.type_,
            system: self.system,
            value: self.value,
            period: self.period,
            assigner: self.assigner.map(Box::new),
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&identifier);
        checks.finish(identifier)
    }
}

impl From<&Identifier> for IdentifierBuilder {
    fn from(identifier: &Identifier) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&identifier.element),
            use_: identifier.use_.clone(),
            type_: identifier.type_.clone(),
            system: identifier.system.clone(),
            value: identifier.value.clone(),
            period: identifier.period.clone(),
            assigner: identifier.assigner.as_deref().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::error::Rule;

    #[test]
    fn test_use_binding() {
        assert!(Identifier::builder().use_("official").value("1").build().is_ok());

        let err = Identifier::builder().use_("primary").value("1").build().unwrap_err();
        assert!(matches!(
            err.as_validation().unwrap().violation_for("use").unwrap().rule,
            Rule::CodeNotInBinding { .. }
        ));
    }

    #[test]
    fn test_assigner_must_be_organization() {
        let err = Identifier::builder()
            .value("1")
            .assigner(Reference::to("Practitioner/7"))
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("assigner"));

        let ok = Identifier::builder()
            .value("1")
            .assigner(Reference::to("Organization/7"))
            .build()
            .unwrap();
        assert_eq!(
            ok.assigner().and_then(Reference::target_type),
            Some("Organization")
        );
    }

    #[test]
    fn test_lenient_config_skips_semantic_checks() {
        let identifier = ModelConfig::lenient().scope(|| {
            Identifier::builder()
                .use_("primary")
                .assigner(Reference::to("Practitioner/7"))
                .build()
        });
        assert!(identifier.is_ok());
    }
}
