//! Declarative schema metadata
//!
//! Every node type publishes a static [`TypeDef`]: its fields in declaration
//! order with cardinality, allowed choice types, allowed reference targets and
//! terminology bindings, plus the invariant constraints attached to the type.
//! Builders read their checks from these definitions; external consumers
//! (serializers, constraint evaluators) read them to drive their own work.

use std::fmt;

/// The data types a field (or a choice payload) can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Integer,
    Decimal,
    String,
    Code,
    Id,
    Uri,
    Markdown,
    DateTime,
    Extension,
    Coding,
    CodeableConcept,
    Identifier,
    Reference,
    Period,
    Quantity,
    Meta,
    Narrative,
    UsageContext,
}

impl DataType {
    /// FHIR type name, as used in type codes and choice suffixes
    pub fn name(self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::String => "string",
            DataType::Code => "code",
            DataType::Id => "id",
            DataType::Uri => "uri",
            DataType::Markdown => "markdown",
            DataType::DateTime => "dateTime",
            DataType::Extension => "Extension",
            DataType::Coding => "Coding",
            DataType::CodeableConcept => "CodeableConcept",
            DataType::Identifier => "Identifier",
            DataType::Reference => "Reference",
            DataType::Period => "Period",
            DataType::Quantity => "Quantity",
            DataType::Meta => "Meta",
            DataType::Narrative => "Narrative",
            DataType::UsageContext => "UsageContext",
        }
    }

    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            DataType::Boolean
                | DataType::Integer
                | DataType::Decimal
                | DataType::String
                | DataType::Code
                | DataType::Id
                | DataType::Uri
                | DataType::Markdown
                | DataType::DateTime
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minimum/maximum occurrences of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>, // None = unbounded
}

impl Cardinality {
    pub const OPTIONAL: Cardinality = Cardinality {
        min: 0,
        max: Some(1),
    };

    pub const REQUIRED: Cardinality = Cardinality {
        min: 1,
        max: Some(1),
    };

    pub const LIST: Cardinality = Cardinality { min: 0, max: None };

    pub const REQUIRED_LIST: Cardinality = Cardinality { min: 1, max: None };

    pub fn is_required(self) -> bool {
        self.min > 0
    }

    pub fn is_repeating(self) -> bool {
        self.max.map(|m| m > 1).unwrap_or(true)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// What a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single data type
    Element(DataType),
    /// Exactly one of a closed set of data types
    Choice(&'static [DataType]),
    /// A reference constrained to the listed target kinds (empty = any)
    Reference(&'static [&'static str]),
    /// A nested backbone element of the named type
    Backbone(&'static str),
    /// Any resource (contained resources)
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStrength {
    Required,
    Extensible,
    Preferred,
    Example,
}

/// Codes enumerated in-process for a binding.
///
/// This is deliberately narrower than value set membership: only the listed
/// codes (and, when given, the system) are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCodes {
    pub system: Option<&'static str>,
    pub codes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingDef {
    pub name: Option<&'static str>,
    pub strength: BindingStrength,
    pub description: Option<&'static str>,
    pub value_set: &'static str,
    /// `None` when membership can only be resolved by a terminology service
    pub fixed: Option<FixedCodes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub kind: FieldKind,
    pub summary: bool,
    pub binding: Option<BindingDef>,
}

impl FieldDef {
    pub const fn new(name: &'static str, cardinality: Cardinality, kind: FieldKind) -> Self {
        Self {
            name,
            cardinality,
            kind,
            summary: false,
            binding: None,
        }
    }

    pub const fn summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub const fn bound(mut self, binding: BindingDef) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Allowed payload types when this is a choice field
    pub fn choice_types(&self) -> &'static [DataType] {
        match self.kind {
            FieldKind::Choice(types) => types,
            _ => &[],
        }
    }

    /// Allowed target kinds when this is a reference field
    pub fn reference_targets(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::Reference(targets) => targets,
            _ => &[],
        }
    }

    /// The fixed code list of this field's binding, if it has one
    pub fn fixed_codes(&self) -> Option<(&'static str, FixedCodes)> {
        self.binding
            .and_then(|b| b.fixed.map(|fixed| (b.value_set, fixed)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintLevel {
    Rule,
    Warning,
}

/// An invariant attached to a type, evaluated by an external engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintDef {
    pub id: &'static str,
    pub level: ConstraintLevel,
    /// `(base)` or the path of the element the constraint applies to
    pub location: &'static str,
    pub description: &'static str,
    pub expression: &'static str,
    pub source: &'static str,
    pub generated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    Complex,
    Backbone,
    DomainResource,
}

impl TypeKind {
    /// Names of the fields every type of this kind inherits, in visit order
    pub fn inherited_fields(self) -> &'static [&'static str] {
        match self {
            TypeKind::Primitive | TypeKind::Complex => &["id", "extension"],
            TypeKind::Backbone => &["id", "extension", "modifierExtension"],
            TypeKind::DomainResource => &[
                "id",
                "meta",
                "implicitRules",
                "language",
                "text",
                "contained",
                "extension",
                "modifierExtension",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDef {
    pub name: &'static str,
    pub kind: TypeKind,
    pub fields: &'static [FieldDef],
    pub constraints: &'static [ConstraintDef],
}

impl TypeDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All field names in declaration order, inherited fields first
    pub fn field_names(&self) -> Vec<&'static str> {
        self.kind
            .inherited_fields()
            .iter()
            .copied()
            .chain(self.fields.iter().map(|f| f.name))
            .collect()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.cardinality.is_required())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: FieldDef = FieldDef::new(
        "status",
        Cardinality::REQUIRED,
        FieldKind::Element(DataType::Code),
    )
    .summary()
    .bound(BindingDef {
        name: Some("PublicationStatus"),
        strength: BindingStrength::Required,
        description: None,
        value_set: "http://hl7.org/fhir/ValueSet/publication-status|5.0.0",
        fixed: Some(FixedCodes {
            system: Some("http://hl7.org/fhir/publication-status"),
            codes: &["draft", "active", "retired", "unknown"],
        }),
    });

    #[test]
    fn test_cardinality_string() {
        assert_eq!(Cardinality::OPTIONAL.to_string(), "0..1");
        assert_eq!(Cardinality::REQUIRED_LIST.to_string(), "1..*");
        assert!(Cardinality::LIST.is_repeating());
        assert!(!Cardinality::REQUIRED.is_repeating());
    }

    #[test]
    fn test_field_def_builders() {
        assert!(STATUS.summary);
        assert!(STATUS.cardinality.is_required());
        let (value_set, fixed) = STATUS.fixed_codes().unwrap();
        assert!(value_set.starts_with("http://hl7.org/fhir/ValueSet/publication-status"));
        assert_eq!(fixed.codes.len(), 4);
        assert!(STATUS.choice_types().is_empty());
    }

    #[test]
    fn test_field_names_include_inherited() {
        static FIELDS: [FieldDef; 1] = [STATUS];
        let def = TypeDef {
            name: "Example",
            kind: TypeKind::Backbone,
            fields: &FIELDS,
            constraints: &[],
        };

        assert_eq!(
            def.field_names(),
            vec!["id", "extension", "modifierExtension", "status"]
        );
        assert_eq!(def.required_fields().count(), 1);
        assert!(def.field("status").is_some());
        assert!(def.field("missing").is_none());
    }
}
