use crate::builder::{impl_element_builder, ElementCoreBuilder};
use crate::choice::ChoiceValue;
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::schema::{
    Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef, FieldKind, TypeDef, TypeKind,
};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const VALUE_TYPES: &[DataType] = &[
    DataType::Boolean,
    DataType::Integer,
    DataType::Decimal,
    DataType::String,
    DataType::Code,
    DataType::Id,
    DataType::Uri,
    DataType::Markdown,
    DataType::DateTime,
    DataType::Coding,
    DataType::CodeableConcept,
    DataType::Identifier,
    DataType::Reference,
    DataType::Period,
    DataType::Quantity,
];

const URL: FieldDef =
    FieldDef::new("url", Cardinality::REQUIRED, FieldKind::Element(DataType::Uri));
const VALUE: FieldDef =
    FieldDef::new("value", Cardinality::OPTIONAL, FieldKind::Choice(VALUE_TYPES));

static FIELDS: [FieldDef; 2] = [URL, VALUE];

static CONSTRAINTS: [ConstraintDef; 1] = [ConstraintDef {
    id: "ext-1",
    level: ConstraintLevel::Rule,
    location: "(base)",
    description: "Must have either extensions or value[x], not both",
    expression: "extension.exists() != value.exists()",
    source: "http://hl7.org/fhir/StructureDefinition/Extension",
    generated: false,
}];

pub static EXTENSION: TypeDef = TypeDef {
    name: "Extension",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &CONSTRAINTS,
};

/// Additional content defined by implementations, identified by `url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    element: ElementCore,
    url: String,
    value: Option<ChoiceValue>,
    hash_memo: HashMemo,
}

memoized_hash!(Extension { element, url, value });

// `url` identifies the extension and does not count as content.
impl_element!(Extension, element, |this| this.value.is_some());

impl Extension {
    pub fn builder() -> ExtensionBuilder {
        ExtensionBuilder::default()
    }

    pub fn to_builder(&self) -> ExtensionBuilder {
        ExtensionBuilder::from(self)
    }

    /// Source of the definition of this extension
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn value(&self) -> Option<&ChoiceValue> {
        self.value.as_ref()
    }
}

impl Visitable for Extension {
    fn type_def(&self) -> &'static TypeDef {
        &EXTENSION
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.str("url", Some(&self.url));
        children.dyn_node("value", self.value.as_ref().map(ChoiceValue::as_visitable));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtensionBuilder {
    element: ElementCoreBuilder,
    url: Option<String>,
    value: Option<ChoiceValue>,
}

impl_element_builder!(ExtensionBuilder, element);

impl ExtensionBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn value(mut self, value: impl Into<ChoiceValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Extension> {
        let mut checks = Checks::new(EXTENSION.name);
        let element = self.element.build(&mut checks);
        let url = checks.required(self.url, URL.name);
        checks.choice(self.value.as_ref(), &VALUE);

        let Some(url) = url else {
            return Err(checks.into_error());
        };
        let extension = Extension {
            element,
            url,
            value: self.value,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&extension);
        checks.finish(extension)
    }
}

impl From<&Extension> for ExtensionBuilder {
    fn from(extension: &Extension) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&extension.element),
            url: Some(extension.url.clone()),
            value: extension.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ElementBuilder;
    use crate::element::Element;
    use crate::error::Rule;
    use crate::config::ModelConfig;
    use crate::primitive::{Boolean, Code, DateTime};

    #[test]
    fn test_build_requires_url() {
        let err = Extension::builder()
            .value(Boolean::from(true))
            .build()
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.type_name, "Extension");
        assert_eq!(err.violation_for("url").unwrap().rule, Rule::RequiredMissing);
    }

    #[test]
    fn test_nested_extensions() {
        let inner = Extension::builder()
            .url("http://example.org/inner")
            .value(Boolean::from(false))
            .build()
            .unwrap();
        let outer = Extension::builder()
            .url("http://example.org/outer")
            .extension(inner.clone())
            .build()
            .unwrap();

        assert_eq!(outer.extension(), &[inner]);
        assert!(outer.value().is_none());
        assert!(outer.has_children());
    }

    #[test]
    fn test_url_only_is_empty_leaf() {
        let err = Extension::builder()
            .url("http://example.org/empty")
            .build()
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.len(), 1);
        assert_eq!(err.violations[0].rule, Rule::EmptyLeaf);

        let lenient = ModelConfig::lenient()
            .scope(|| Extension::builder().url("http://example.org/empty").build());
        assert!(lenient.is_ok());
    }

    #[test]
    fn test_value_format_is_checked() {
        let err = Extension::builder()
            .url("http://example.org/onset")
            .value(DateTime::from("not-a-date"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err.as_validation().unwrap().violation_for("value").unwrap().rule,
            Rule::InvalidPrimitive { .. }
        ));

        let err = Extension::builder()
            .url("http://example.org/kind")
            .value(Code::from("  bad  code "))
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("value"));

        let ok = Extension::builder()
            .url("http://example.org/onset")
            .value(DateTime::from("2024-03-01T10:00:00Z"))
            .build();
        assert!(ok.is_ok());
    }
}
