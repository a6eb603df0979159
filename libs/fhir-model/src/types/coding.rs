use crate::builder::{impl_element_builder, repeated_setters, ElementCoreBuilder, Repeated};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{Boolean, Code, FhirString, Uri};
use crate::schema::{
    Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef, FieldKind, TypeDef, TypeKind,
};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const SYSTEM: FieldDef =
    FieldDef::new("system", Cardinality::OPTIONAL, FieldKind::Element(DataType::Uri)).summary();
const VERSION: FieldDef =
    FieldDef::new("version", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const CODE: FieldDef =
    FieldDef::new("code", Cardinality::OPTIONAL, FieldKind::Element(DataType::Code)).summary();
const DISPLAY: FieldDef =
    FieldDef::new("display", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const USER_SELECTED: FieldDef = FieldDef::new(
    "userSelected",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Boolean),
)
.summary();

static CODING_FIELDS: [FieldDef; 5] = [SYSTEM, VERSION, CODE, DISPLAY, USER_SELECTED];

static CODING_CONSTRAINTS: [ConstraintDef; 1] = [ConstraintDef {
    id: "cod-1",
    level: ConstraintLevel::Warning,
    location: "(base)",
    description: "A Coding SHOULD NOT have a display unless a code is also present",
    expression: "code.exists().not() implies display.exists().not()",
    source: "http://hl7.org/fhir/StructureDefinition/Coding",
    generated: false,
}];

pub static CODING: TypeDef = TypeDef {
    name: "Coding",
    kind: TypeKind::Complex,
    fields: &CODING_FIELDS,
    constraints: &CODING_CONSTRAINTS,
};

/// A reference to a code defined by a terminology system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coding {
    element: ElementCore,
    system: Option<Uri>,
    version: Option<FhirString>,
    code: Option<Code>,
    display: Option<FhirString>,
    user_selected: Option<Boolean>,
    hash_memo: HashMemo,
}

memoized_hash!(Coding {
    element,
    system,
    version,
    code,
    display,
    user_selected
});

impl_element!(Coding, element, |this| this.system.is_some()
    || this.version.is_some()
    || this.code.is_some()
    || this.display.is_some()
    || this.user_selected.is_some());

impl Coding {
    pub fn builder() -> CodingBuilder {
        CodingBuilder::default()
    }

    pub fn to_builder(&self) -> CodingBuilder {
        CodingBuilder::from(self)
    }

    pub fn system(&self) -> Option<&Uri> {
        self.system.as_ref()
    }

    pub fn version(&self) -> Option<&FhirString> {
        self.version.as_ref()
    }

    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    pub fn display(&self) -> Option<&FhirString> {
        self.display.as_ref()
    }

    pub fn user_selected(&self) -> Option<&Boolean> {
        self.user_selected.as_ref()
    }

    pub fn system_str(&self) -> Option<&str> {
        self.system.as_ref().and_then(Uri::as_str)
    }

    pub fn code_str(&self) -> Option<&str> {
        self.code.as_ref().and_then(Code::as_str)
    }
}

impl Visitable for Coding {
    fn type_def(&self) -> &'static TypeDef {
        &CODING
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("system", self.system.as_ref());
        children.node("version", self.version.as_ref());
        children.node("code", self.code.as_ref());
        children.node("display", self.display.as_ref());
        children.node("userSelected", self.user_selected.as_ref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodingBuilder {
    element: ElementCoreBuilder,
    system: Option<Uri>,
    version: Option<FhirString>,
    code: Option<Code>,
    display: Option<FhirString>,
    user_selected: Option<Boolean>,
}

impl_element_builder!(CodingBuilder, element);

impl CodingBuilder {
    pub fn system(mut self, system: impl Into<Uri>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn version(mut self, version: impl Into<FhirString>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn code(mut self, code: impl Into<Code>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn display(mut self, display: impl Into<FhirString>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn user_selected(mut self, user_selected: impl Into<Boolean>) -> Self {
        self.user_selected = Some(user_selected.into());
        self
    }

    pub fn build(self) -> Result<Coding> {
        let mut checks = Checks::new(CODING.name);
        let element = self.element.build(&mut checks);
        checks.primitive(self.system.as_ref(), SYSTEM.name);
        checks.primitive(self.code.as_ref(), CODE.name);

        let coding = Coding {
            element,
            system: self.system,
            version: self.version,
            code: self.code,
            display: self.display,
            user_selected: self.user_selected,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&coding);
        checks.finish(coding)
    }
}

impl From<&Coding> for CodingBuilder {
    fn from(coding: &Coding) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&coding.element),
            system: coding.system.clone(),
            version: coding.version.clone(),
            code: coding.code.clone(),
            display: coding.display.clone(),
            user_selected: coding.user_selected.clone(),
        }
    }
}

const CONCEPT_CODING: FieldDef =
    FieldDef::new("coding", Cardinality::LIST, FieldKind::Element(DataType::Coding)).summary();
const CONCEPT_TEXT: FieldDef =
    FieldDef::new("text", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();

static CONCEPT_FIELDS: [FieldDef; 2] = [CONCEPT_CODING, CONCEPT_TEXT];

pub static CODEABLE_CONCEPT: TypeDef = TypeDef {
    name: "CodeableConcept",
    kind: TypeKind::Complex,
    fields: &CONCEPT_FIELDS,
    constraints: &[],
};

/// A concept given by zero or more codings and/or free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeableConcept {
    element: ElementCore,
    coding: Vec<Coding>,
    text: Option<FhirString>,
    hash_memo: HashMemo,
}

memoized_hash!(CodeableConcept { element, coding, text });

impl_element!(CodeableConcept, element, |this| !this.coding.is_empty()
    || this.text.is_some());

impl CodeableConcept {
    pub fn builder() -> CodeableConceptBuilder {
        CodeableConceptBuilder::default()
    }

    pub fn to_builder(&self) -> CodeableConceptBuilder {
        CodeableConceptBuilder::from(self)
    }

    pub fn coding(&self) -> &[Coding] {
        &self.coding
    }

    pub fn text(&self) -> Option<&FhirString> {
        self.text.as_ref()
    }
}

impl Visitable for CodeableConcept {
    fn type_def(&self) -> &'static TypeDef {
        &CODEABLE_CONCEPT
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.list("coding", &self.coding);
        children.node("text", self.text.as_ref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeableConceptBuilder {
    element: ElementCoreBuilder,
    coding: Repeated<Coding>,
    text: Option<FhirString>,
}

impl_element_builder!(CodeableConceptBuilder, element);

impl CodeableConceptBuilder {
    repeated_setters!(coding: Coding => coding, codings, set_codings);

    pub fn text(mut self, text: impl Into<FhirString>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn build(self) -> Result<CodeableConcept> {
        let mut checks = Checks::new(CODEABLE_CONCEPT.name);
        let element = self.element.build(&mut checks);
        let coding = checks.list(self.coding, CONCEPT_CODING.name);

        let concept = CodeableConcept {
            element,
            coding,
            text: self.text,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&concept);
        checks.finish(concept)
    }
}

impl From<&CodeableConcept> for CodeableConceptBuilder {
    fn from(concept: &CodeableConcept) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&concept.element),
            coding: Repeated::from(concept.coding.as_slice()),
            text: concept.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rule;

    #[test]
    fn test_coding_accessors() {
        let coding = Coding::builder()
            .system("http://loinc.org")
            .code("1234-5")
            .display("Example")
            .user_selected(true)
            .build()
            .unwrap();

        assert_eq!(coding.system_str(), Some("http://loinc.org"));
        assert_eq!(coding.code_str(), Some("1234-5"));
        assert_eq!(coding.user_selected().and_then(|b| b.value()), Some(&true));
    }

    #[test]
    fn test_coding_rejects_malformed_code() {
        let err = Coding::builder().code(" leading").build().unwrap_err();
        let err = err.as_validation().unwrap();
        assert!(matches!(
            err.violation_for("code").unwrap().rule,
            Rule::InvalidPrimitive { .. }
        ));
    }

    #[test]
    fn test_empty_concept_is_rejected() {
        let err = CodeableConcept::builder().build().unwrap_err();
        assert_eq!(err.as_validation().unwrap().violations[0].rule, Rule::EmptyLeaf);
    }

    #[test]
    fn test_concept_null_coding_reports_index() {
        let coding = Coding::builder().code("a").build().unwrap();
        let err = CodeableConcept::builder()
            .codings([Some(coding), None])
            .build()
            .unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().violation_for("coding").unwrap().rule,
            Rule::NullElement { index: 1 }
        );
    }
}
