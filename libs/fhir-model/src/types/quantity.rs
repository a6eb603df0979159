use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{Code, Decimal, FhirString, Uri};
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef,
    FieldKind, FixedCodes, TypeDef, TypeKind,
};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const VALUE: FieldDef =
    FieldDef::new("value", Cardinality::OPTIONAL, FieldKind::Element(DataType::Decimal)).summary();
const COMPARATOR: FieldDef = FieldDef::new(
    "comparator",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Code),
)
.summary()
.bound(BindingDef {
    name: Some("QuantityComparator"),
    strength: BindingStrength::Required,
    description: Some("How the Quantity should be understood and represented."),
    value_set: "http://hl7.org/fhir/ValueSet/quantity-comparator|5.0.0",
    fixed: Some(FixedCodes {
        system: Some("http://hl7.org/fhir/quantity-comparator"),
        codes: &["<", "<=", ">=", ">", "ad"],
    }),
});
const UNIT: FieldDef =
    FieldDef::new("unit", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const SYSTEM: FieldDef =
    FieldDef::new("system", Cardinality::OPTIONAL, FieldKind::Element(DataType::Uri)).summary();
const CODE: FieldDef =
    FieldDef::new("code", Cardinality::OPTIONAL, FieldKind::Element(DataType::Code)).summary();

static FIELDS: [FieldDef; 5] = [VALUE, COMPARATOR, UNIT, SYSTEM, CODE];

static CONSTRAINTS: [ConstraintDef; 1] = [ConstraintDef {
    id: "qty-3",
    level: ConstraintLevel::Rule,
    location: "(base)",
    description: "If a code for the unit is present, the system SHALL also be present",
    expression: "code.empty() or system.exists()",
    source: "http://hl7.org/fhir/StructureDefinition/Quantity",
    generated: false,
}];

pub static QUANTITY: TypeDef = TypeDef {
    name: "Quantity",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &CONSTRAINTS,
};

/// A measured amount, optionally with a coded unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    element: ElementCore,
    value: Option<Decimal>,
    comparator: Option<Code>,
    unit: Option<FhirString>,
    system: Option<Uri>,
    code: Option<Code>,
    hash_memo: HashMemo,
}

memoized_hash!(Quantity {
    element,
    value,
    comparator,
    unit,
    system,
    code
});

impl_element!(Quantity, element, |this| this.value.is_some()
    || this.comparator.is_some()
    || this.unit.is_some()
    || this.system.is_some()
    || this.code.is_some());

impl Quantity {
    pub fn builder() -> QuantityBuilder {
        QuantityBuilder::default()
    }

    pub fn to_builder(&self) -> QuantityBuilder {
        QuantityBuilder::from(self)
    }

    pub fn value(&self) -> Option<&Decimal> {
        self.value.as_ref()
    }

    pub fn comparator(&self) -> Option<&Code> {
        self.comparator.as_ref()
    }

    pub fn unit(&self) -> Option<&FhirString> {
        self.unit.as_ref()
    }

    pub fn system(&self) -> Option<&Uri> {
        self.system.as_ref()
    }

    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }
}

impl Visitable for Quantity {
    fn type_def(&self) -> &'static TypeDef {
        &QUANTITY
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("value", self.value.as_ref());
        children.node("comparator", self.comparator.as_ref());
        children.node("unit", self.unit.as_ref());
        children.node("system", self.system.as_ref());
        children.node("code", self.code.as_ref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuantityBuilder {
    element: ElementCoreBuilder,
    value: Option<Decimal>,
    comparator: Option<Code>,
    unit: Option<FhirString>,
    system: Option<Uri>,
    code: Option<Code>,
}

impl_element_builder!(QuantityBuilder, element);

impl QuantityBuilder {
    pub fn value(mut self, value: impl Into<Decimal>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn comparator(mut self, comparator: impl Into<Code>) -> Self {
        self.comparator = Some(comparator.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<FhirString>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn system(mut self, system: impl Into<Uri>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn code(mut self, code: impl Into<Code>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn build(self) -> Result<Quantity> {
        let mut checks = Checks::new(QUANTITY.name);
        let element = self.element.build(&mut checks);
        checks.primitive(self.comparator.as_ref(), COMPARATOR.name);
        checks.binding(self.comparator.as_ref(), &COMPARATOR);
        checks.primitive(self.system.as_ref(), SYSTEM.name);
        checks.primitive(self.code.as_ref(), CODE.name);

        let quantity = Quantity {
            element,
            value: self.value,
            comparator: self.comparator,
            unit: self.unit,
            system: self.system,
            code: self.code,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&quantity);
        checks.finish(quantity)
    }
}

impl From<&Quantity> for QuantityBuilder {
    fn from(quantity: &Quantity) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&quantity.element),
            value: quantity.value.clone(),
            comparator: quantity.comparator.clone(),
            unit: quantity.unit.clone(),
            system: quantity.system.clone(),
            code: quantity.code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal as RustDecimal;
    use std::str::FromStr;

    #[test]
    fn test_ucum_quantity() {
        let quantity = Quantity::builder()
            .value(RustDecimal::from_str("37.5").unwrap())
            .unit("Cel")
            .system("http://unitsofmeasure.org")
            .code("Cel")
            .build()
            .unwrap();
        assert_eq!(
            quantity.value().and_then(|v| v.value()).map(|d| d.to_string()),
            Some("37.5".to_string())
        );
    }

    #[test]
    fn test_comparator_binding() {
        assert!(Quantity::builder().value(RustDecimal::ONE).comparator("<=").build().is_ok());
        let err = Quantity::builder()
            .value(RustDecimal::ONE)
            .comparator("~")
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("comparator"));
    }

    #[test]
    fn test_equal_values_hash_equally() {
        let a = Quantity::builder().value(RustDecimal::new(15, 1)).build().unwrap();
        let b = Quantity::builder().value(RustDecimal::new(15, 1)).build().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
    }
}
