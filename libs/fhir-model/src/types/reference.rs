use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{FhirString, Uri};
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef,
    FieldKind, TypeDef, TypeKind,
};
use crate::types::Identifier;
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::Any;

const REFERENCE_FIELD: FieldDef =
    FieldDef::new("reference", Cardinality::OPTIONAL, FieldKind::Element(DataType::String))
        .summary();
const TYPE: FieldDef = FieldDef::new(
    "type",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Uri),
)
.summary()
.bound(BindingDef {
    name: Some("FHIRResourceTypeExt"),
    strength: BindingStrength::Extensible,
    description: Some("A resource (or, for logical models, the URI of the logical model)."),
    value_set: "http://hl7.org/fhir/ValueSet/resource-types",
    fixed: None,
});
const IDENTIFIER: FieldDef = FieldDef::new(
    "identifier",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Identifier),
)
.summary();
const DISPLAY: FieldDef =
    FieldDef::new("display", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();

static FIELDS: [FieldDef; 4] = [REFERENCE_FIELD, TYPE, IDENTIFIER, DISPLAY];

static CONSTRAINTS: [ConstraintDef; 1] = [ConstraintDef {
    id: "ref-1",
    level: ConstraintLevel::Rule,
    location: "(base)",
    description: "SHALL have a contained resource if a local reference is provided",
    expression: "reference.exists() implies (reference.startsWith('#').not() or (reference.substring(1).trace('url') in %rootResource.contained.id.trace('ids')) or (reference='#' and %rootResource!=%resource))",
    source: "http://hl7.org/fhir/StructureDefinition/Reference",
    generated: false,
}];

pub static REFERENCE: TypeDef = TypeDef {
    name: "Reference",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &CONSTRAINTS,
};

/// `[base/]Type/id[/_history/version]`
static LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://(?:[A-Za-z0-9\-\\.:%$]*/)+)?([A-Z][A-Za-z]+)/[A-Za-z0-9\-.]{1,64}(?:/_history/[A-Za-z0-9\-.]{1,64})?$",
    )
    .expect("reference regex must compile")
});

/// Resource type named by a literal reference, if it names one.
///
/// Fragments (`#id`), URNs (`urn:uuid:`, `urn:oid:`) and anything that is not
/// a relative or absolute RESTful reference yield `None`.
pub fn literal_target_type(literal: &str) -> Option<&str> {
    LITERAL
        .captures(literal)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A reference from one resource to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    element: ElementCore,
    reference: Option<FhirString>,
    type_: Option<Uri>,
    identifier: Option<Identifier>,
    display: Option<FhirString>,
    hash_memo: HashMemo,
}

memoized_hash!(Reference {
    element,
    reference,
    type_,
    identifier,
    display
});

impl_element!(Reference, element, |this| this.reference.is_some()
    || this.type_.is_some()
    || this.identifier.is_some()
    || this.display.is_some());

impl Reference {
    pub fn builder() -> ReferenceBuilder {
        ReferenceBuilder::default()
    }

    pub fn to_builder(&self) -> ReferenceBuilder {
        ReferenceBuilder::from(self)
    }

    /// A reference holding only a literal, e.g. `Patient/123`.
    ///
    /// Equal to `Reference::builder().reference(literal).build()`, which
    /// cannot fail for a literal alone, so this skips the builder. Target
    /// types are checked by the `build()` of the node holding the reference.
    pub fn to(literal: impl Into<String>) -> Self {
        let literal: String = literal.into();
        Self {
            element: ElementCore::default(),
            reference: Some(FhirString::from(literal)),
            type_: None,
            identifier: None,
            display: None,
            hash_memo: HashMemo::new(),
        }
    }

    pub fn reference(&self) -> Option<&FhirString> {
        self.reference.as_ref()
    }

    /// Expected type of the target, e.g. `Patient`
    pub fn type_(&self) -> Option<&Uri> {
        self.type_.as_ref()
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn display(&self) -> Option<&FhirString> {
        self.display.as_ref()
    }

    pub fn literal(&self) -> Option<&str> {
        self.reference.as_ref().and_then(FhirString::as_str)
    }

    /// Resource type this reference points at, when it can be told.
    ///
    /// An explicit `type` wins (the last path segment, for absolute type
    /// URIs); otherwise the type is read from the literal reference.
    pub fn target_type(&self) -> Option<&str> {
        if let Some(explicit) = self.type_.as_ref().and_then(Uri::as_str) {
            return explicit.rsplit('/').next().filter(|s| !s.is_empty());
        }
        self.literal().and_then(literal_target_type)
    }
}

impl Visitable for Reference {
    fn type_def(&self) -> &'static TypeDef {
        &REFERENCE
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("reference", self.reference.as_ref());
        children.node("type", self.type_.as_ref());
        children.node("identifier", self.identifier.as_ref());
        children.node("display", self.display.as_ref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    element: ElementCoreBuilder,
    reference: Option<FhirString>,
    type_: Option<Uri>,
    identifier: Option<Identifier>,
    display: Option<FhirString>,
}

impl_element_builder!(ReferenceBuilder, element);

impl ReferenceBuilder {
    pub fn reference(mut self, reference: impl Into<FhirString>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn type_(mut self, type_: impl Into<Uri>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn display(mut self, display: impl Into<FhirString>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn build(self) -> Result<Reference> {
        let mut checks = Checks::new(REFERENCE.name);
        let element = self.element.build(&mut checks);
        checks.primitive(self.type_.as_ref(), TYPE.name);

        let reference = Reference {
            element,
            reference: self.reference,
            type_: self.type_,
            identifier: self.identifier,
            display: self.display,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&reference);
        checks.finish(reference)
    }
}

impl From<&Reference> for ReferenceBuilder {
    fn from(reference: &Reference) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&reference.element),
            reference: reference.reference.clone(),
            type_: reference.type_.clone(),
            identifier: reference.identifier.clone(),
            display: reference.display.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_target_type() {
        assert_eq!(literal_target_type("Patient/123"), Some("Patient"));
        assert_eq!(literal_target_type("Observation/a.1/_history/2"), Some("Observation"));
        assert_eq!(
            literal_target_type("http://example.org/fhir/Group/g1"),
            Some("Group")
        );
        assert_eq!(literal_target_type("#p1"), None);
        assert_eq!(literal_target_type("urn:uuid:9b3c3ef2-8f7e-4b39-a3a4-1f3b0c1e2d44"), None);
        assert_eq!(literal_target_type("patient/123"), None);
    }

    #[test]
    fn test_explicit_type_wins() {
        let reference = Reference::builder()
            .reference("#contained")
            .type_("http://hl7.org/fhir/StructureDefinition/Device")
            .build()
            .unwrap();
        assert_eq!(reference.target_type(), Some("Device"));

        let plain = Reference::builder().type_("Patient").display("Someone").build().unwrap();
        assert_eq!(plain.target_type(), Some("Patient"));
    }

    #[test]
    fn test_identifier_only_has_no_type() {
        let identifier = Identifier::builder()
            .system("http://example.org/mrn")
            .value("12345")
            .build()
            .unwrap();
        let reference = Reference::builder().identifier(identifier).build().unwrap();
        assert_eq!(reference.target_type(), None);
    }

    #[test]
    fn test_to_matches_built_reference() {
        let built = Reference::builder()
            .reference("Patient/123")
            .build()
            .unwrap();
        let short = Reference::to("Patient/123");
        assert_eq!(short, built);
        assert_eq!(short.hash_code(), built.hash_code());
    }

    #[test]
    fn test_explicit_type_overrides_literal() {
        let reference = Reference::builder()
            .reference("Organization/1")
            .type_("Patient")
            .build()
            .unwrap();
        assert_eq!(reference.target_type(), Some("Patient"));
    }
}
