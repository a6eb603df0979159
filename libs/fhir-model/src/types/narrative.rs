use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::Code;
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef,
    FieldKind, FixedCodes, TypeDef, TypeKind,
};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const STATUS: FieldDef = FieldDef::new(
    "status",
    Cardinality::REQUIRED,
    FieldKind::Element(DataType::Code),
)
.bound(BindingDef {
    name: Some("NarrativeStatus"),
    strength: BindingStrength::Required,
    description: Some("The status of a resource narrative."),
    value_set: "http://hl7.org/fhir/ValueSet/narrative-status|5.0.0",
    fixed: Some(FixedCodes {
        system: Some("http://hl7.org/fhir/narrative-status"),
        codes: &["generated", "extensions", "additional", "empty"],
    }),
});
const DIV: FieldDef =
    FieldDef::new("div", Cardinality::REQUIRED, FieldKind::Element(DataType::String));

static FIELDS: [FieldDef; 2] = [STATUS, DIV];

static CONSTRAINTS: [ConstraintDef; 2] = [
    ConstraintDef {
        id: "txt-1",
        level: ConstraintLevel::Rule,
        location: "Narrative.div",
        description: "The narrative SHALL contain only the basic html formatting elements and attributes described in chapters 7-11 (except section 4 of chapter 9) and 15 of the HTML 4.0 standard, <a> elements (either name or href), images and internally contained style attributes",
        expression: "htmlChecks()",
        source: "http://hl7.org/fhir/StructureDefinition/Narrative",
        generated: false,
    },
    ConstraintDef {
        id: "txt-2",
        level: ConstraintLevel::Rule,
        location: "Narrative.div",
        description: "The narrative SHALL have some non-whitespace content",
        expression: "htmlChecks()",
        source: "http://hl7.org/fhir/StructureDefinition/Narrative",
        generated: false,
    },
];

pub static NARRATIVE: TypeDef = TypeDef {
    name: "Narrative",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &CONSTRAINTS,
};

/// Human-readable summary of a resource as limited xhtml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    element: ElementCore,
    status: Code,
    div: String,
    hash_memo: HashMemo,
}

memoized_hash!(Narrative { element, status, div });

impl_element!(Narrative, element, |this| !this.div.is_empty() || this.status.as_str().is_some());

impl Narrative {
    pub fn builder() -> NarrativeBuilder {
        NarrativeBuilder::default()
    }

    pub fn to_builder(&self) -> NarrativeBuilder {
        NarrativeBuilder::from(self)
    }

    /// One of `generated`, `extensions`, `additional`, `empty`
    pub fn status(&self) -> &Code {
        &self.status
    }

    /// The xhtml `<div>` content
    pub fn div(&self) -> &str {
        &self.div
    }
}

impl Visitable for Narrative {
    fn type_def(&self) -> &'static TypeDef {
        &NARRATIVE
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("status", Some(&self.status));
        children.str("div", Some(&self.div));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct NarrativeBuilder {
    element: ElementCoreBuilder,
    status: Option<Code>,
    div: Option<String>,
}

impl_element_builder!(NarrativeBuilder, element);

impl NarrativeBuilder {
    pub fn status(mut self, status: impl Into<Code>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn div(mut self, div: impl Into<String>) -> Self {
        self.div = Some(div.into());
        self
    }

    pub fn build(self) -> Result<Narrative> {
        let mut checks = Checks::new(NARRATIVE.name);
        let element = self.element.build(&mut checks);
        let status = checks.required(self.status, STATUS.name);
        checks.primitive(status.as_ref(), STATUS.name);
        checks.binding(status.as_ref(), &STATUS);
        let div = checks.required(self.div, DIV.name);

        let (Some(status), Some(div)) = (status, div) else {
            return Err(checks.into_error());
        };
        let narrative = Narrative {
            element,
            status,
            div,
            hash_memo: HashMemo::new(),
        };
        checks.finish(narrative)
    }
}

impl From<&Narrative> for NarrativeBuilder {
    fn from(narrative: &Narrative) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&narrative.element),
            status: Some(narrative.status.clone()),
            div: Some(narrative.div.clone()),
        }
    }
}
