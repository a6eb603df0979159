use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::DateTime;
use crate::schema::{
    Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef, FieldKind, TypeDef, TypeKind,
};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const START: FieldDef =
    FieldDef::new("start", Cardinality::OPTIONAL, FieldKind::Element(DataType::DateTime)).summary();
const END: FieldDef =
    FieldDef::new("end", Cardinality::OPTIONAL, FieldKind::Element(DataType::DateTime)).summary();

static FIELDS: [FieldDef; 2] = [START, END];

static CONSTRAINTS: [ConstraintDef; 1] = [ConstraintDef {
    id: "per-1",
    level: ConstraintLevel::Rule,
    location: "(base)",
    description: "If present, start SHALL have a lower or equal value than end",
    expression: "start.hasValue().not() or end.hasValue().not() or (start.lowBoundary() <= end.highBoundary())",
    source: "http://hl7.org/fhir/StructureDefinition/Period",
    generated: false,
}];

pub static PERIOD: TypeDef = TypeDef {
    name: "Period",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &CONSTRAINTS,
};

/// A time range defined by start and end date/times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    element: ElementCore,
    start: Option<DateTime>,
    end: Option<DateTime>,
    hash_memo: HashMemo,
}

memoized_hash!(Period { element, start, end });

impl_element!(Period, element, |this| this.start.is_some() || this.end.is_some());

impl Period {
    pub fn builder() -> PeriodBuilder {
        PeriodBuilder::default()
    }

    pub fn to_builder(&self) -> PeriodBuilder {
        PeriodBuilder::from(self)
    }

    pub fn start(&self) -> Option<&DateTime> {
        self.start.as_ref()
    }

    /// Absent means ongoing
    pub fn end(&self) -> Option<&DateTime> {
        self.end.as_ref()
    }
}

impl Visitable for Period {
    fn type_def(&self) -> &'static TypeDef {
        &PERIOD
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("start", self.start.as_ref());
        children.node("end", self.end.as_ref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeriodBuilder {
    element: ElementCoreBuilder,
    start: Option<DateTime>,
    end: Option<DateTime>,
}

impl_element_builder!(PeriodBuilder, element);

impl PeriodBuilder {
    pub fn start(mut self, start: impl Into<DateTime>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<DateTime>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn build(self) -> Result<Period> {
        let mut checks = Checks::new(PERIOD.name);
        let element = self.element.build(&mut checks);
        checks.primitive(self.start.as_ref(), START.name);
        checks.primitive(self.end.as_ref(), END.name);

        let period = Period {
            element,
            start: self.start,
            end: self.end,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&period);
        checks.finish(period)
    }
}

impl From<&Period> for PeriodBuilder {
    fn from(period: &Period) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&period.element),
            start: period.start.clone(),
            end: period.end.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_ended_period() {
        let period = Period::builder().start("2024-03-01").build().unwrap();
        assert_eq!(period.start().and_then(DateTime::as_str), Some("2024-03-01"));
        assert!(period.end().is_none());
    }

    #[test]
    fn test_malformed_dates_are_each_reported() {
        let err = Period::builder()
            .start("yesterday")
            .end("2024-02-30T25:00:00Z")
            .build()
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert!(err.cites("start"));
        assert!(err.cites("end"));
    }
}
