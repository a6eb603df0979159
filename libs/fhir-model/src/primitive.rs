//! Primitive data types
//!
//! A primitive is an element: besides its value it may carry an `id` and
//! extensions (and may even omit the value when an extension explains why).
//! All primitive types share [`Primitive`], parameterized by a
//! [`PrimitiveKind`] that fixes the value type and its format rule.

use crate::builder::{ElementBuilder, ElementCoreBuilder};
use crate::element::{Element, ElementCore};
use crate::error::Result;
use crate::hash::HashMemo;
use crate::schema::{DataType, TypeDef, TypeKind};
use crate::validation::Checks;
use crate::visitor::{Children, Value, Visitable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub trait PrimitiveKind: fmt::Debug + Send + Sync + 'static {
    type Value: fmt::Debug + Clone + PartialEq + Eq + Hash + Send + Sync + 'static;

    const DATA_TYPE: DataType;

    fn type_def() -> &'static TypeDef;

    /// Format rule for values of this kind
    fn check(_value: &Self::Value) -> std::result::Result<(), String> {
        Ok(())
    }

    fn as_value(value: &Self::Value) -> Value<'_>;
}

static ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("id regex must compile"));

static CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s]+( [^\s]+)*$").expect("code regex must compile"));

static URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S*$").expect("uri regex must compile"));

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1])(T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]{1,9})?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00)))?)?)?$",
    )
    .expect("dateTime regex must compile")
});

fn matches(pattern: &Regex, value: &str, what: &str) -> std::result::Result<(), String> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid {}", value, what))
    }
}

macro_rules! primitive_kind {
    ($(#[$doc:meta])* $kind:ident, $value:ty, $data_type:ident, $name:literal, |$v:ident| $as_value:expr $(, check = $check:expr)?) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $kind;

        impl PrimitiveKind for $kind {
            type Value = $value;

            const DATA_TYPE: DataType = DataType::$data_type;

            fn type_def() -> &'static TypeDef {
                static DEF: TypeDef = TypeDef {
                    name: $name,
                    kind: TypeKind::Primitive,
                    fields: &[],
                    constraints: &[],
                };
                &DEF
            }

            $(
                fn check(value: &Self::Value) -> std::result::Result<(), String> {
                    ($check)(value)
                }
            )?

            fn as_value($v: &Self::Value) -> Value<'_> {
                $as_value
            }
        }
    };
}

primitive_kind!(StringKind, String, String, "string", |v| Value::String(v));
primitive_kind!(MarkdownKind, String, Markdown, "markdown", |v| Value::String(v));
primitive_kind!(BooleanKind, bool, Boolean, "boolean", |v| Value::Boolean(*v));
primitive_kind!(IntegerKind, i32, Integer, "integer", |v| Value::Integer(*v));
primitive_kind!(
    DecimalKind,
    rust_decimal::Decimal,
    Decimal,
    "decimal",
    |v| Value::Decimal(v)
);
primitive_kind!(
    /// A token: no leading or trailing whitespace, no runs of inner whitespace
    CodeKind,
    String,
    Code,
    "code",
    |v| Value::String(v),
    check = |v: &String| matches(&CODE, v, "code")
);
primitive_kind!(
    IdKind,
    String,
    Id,
    "id",
    |v| Value::String(v),
    check = |v: &String| matches(&ID, v, "id")
);
primitive_kind!(
    UriKind,
    String,
    Uri,
    "uri",
    |v| Value::String(v),
    check = |v: &String| matches(&URI, v, "uri")
);
primitive_kind!(
    /// Partial dates are allowed; a time requires a timezone
    DateTimeKind,
    String,
    DateTime,
    "dateTime",
    |v| Value::String(v),
    check = |v: &String| matches(&DATE_TIME, v, "dateTime")
);

pub type FhirString = Primitive<StringKind>;
pub type Markdown = Primitive<MarkdownKind>;
pub type Boolean = Primitive<BooleanKind>;
pub type Integer = Primitive<IntegerKind>;
pub type Decimal = Primitive<DecimalKind>;
pub type Code = Primitive<CodeKind>;
pub type Id = Primitive<IdKind>;
pub type Uri = Primitive<UriKind>;
pub type DateTime = Primitive<DateTimeKind>;

pub struct Primitive<K: PrimitiveKind> {
    element: ElementCore,
    value: Option<K::Value>,
    hash_memo: HashMemo,
    kind: PhantomData<fn() -> K>,
}

impl<K: PrimitiveKind> Primitive<K> {
    /// Wrap a bare value. Format rules are applied by the `build()` of the
    /// node this value is placed in.
    pub fn of(value: impl Into<K::Value>) -> Self {
        Self {
            element: ElementCore::default(),
            value: Some(value.into()),
            hash_memo: HashMemo::new(),
            kind: PhantomData,
        }
    }

    pub fn builder() -> PrimitiveBuilder<K> {
        PrimitiveBuilder::default()
    }

    pub fn to_builder(&self) -> PrimitiveBuilder<K> {
        PrimitiveBuilder::from(self)
    }

    pub fn value(&self) -> Option<&K::Value> {
        self.value.as_ref()
    }

    /// Format rule of this kind applied to the held value, if any
    pub fn check_format(&self) -> std::result::Result<(), String> {
        self.value.as_ref().map_or(Ok(()), K::check)
    }

    pub fn hash_code(&self) -> u64 {
        self.hash_memo.get_or_compute(|hasher| {
            self.element.hash(hasher);
            self.value.hash(hasher);
        })
    }
}

impl<K: PrimitiveKind<Value = String>> Primitive<K> {
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl<K: PrimitiveKind> Clone for Primitive<K> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            value: self.value.clone(),
            hash_memo: self.hash_memo.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: PrimitiveKind> PartialEq for Primitive<K> {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element && self.value == other.value
    }
}

impl<K: PrimitiveKind> Eq for Primitive<K> {}

impl<K: PrimitiveKind> Hash for Primitive<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K: PrimitiveKind> fmt::Debug for Primitive<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(K::type_def().name);
        if let Some(id) = &self.element.id {
            s.field("id", id);
        }
        if !self.element.extension.is_empty() {
            s.field("extension", &self.element.extension);
        }
        s.field("value", &self.value).finish()
    }
}

impl<K: PrimitiveKind> Visitable for Primitive<K> {
    fn type_def(&self) -> &'static TypeDef {
        K::type_def()
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.value("value", self.value.as_ref().map(K::as_value));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<K: PrimitiveKind> Element for Primitive<K> {
    fn element_core(&self) -> &ElementCore {
        &self.element
    }

    fn has_value(&self) -> bool {
        self.value.is_some()
    }

    fn has_children(&self) -> bool {
        self.element.has_children()
    }
}

impl<K: PrimitiveKind<Value = String>> From<&str> for Primitive<K> {
    fn from(value: &str) -> Self {
        Self::of(value)
    }
}

impl<K: PrimitiveKind<Value = String>> From<String> for Primitive<K> {
    fn from(value: String) -> Self {
        Self::of(value)
    }
}

impl From<bool> for Boolean {
    fn from(value: bool) -> Self {
        Self::of(value)
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Self::of(value)
    }
}

impl From<rust_decimal::Decimal> for Decimal {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self::of(value)
    }
}

impl<K: PrimitiveKind<Value = String>> fmt::Display for Primitive<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or_default())
    }
}

pub struct PrimitiveBuilder<K: PrimitiveKind> {
    element: ElementCoreBuilder,
    value: Option<K::Value>,
}

impl<K: PrimitiveKind> Default for PrimitiveBuilder<K> {
    fn default() -> Self {
        Self {
            element: ElementCoreBuilder::default(),
            value: None,
        }
    }
}

impl<K: PrimitiveKind> Clone for PrimitiveBuilder<K> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            value: self.value.clone(),
        }
    }
}

impl<K: PrimitiveKind> fmt::Debug for PrimitiveBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveBuilder")
            .field("element", &self.element)
            .field("value", &self.value)
            .finish()
    }
}

impl<K: PrimitiveKind> PrimitiveBuilder<K> {
    pub fn value(mut self, value: impl Into<K::Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Primitive<K>> {
        let mut checks = Checks::new(K::type_def().name);
        let element = self.element.build(&mut checks);
        let primitive = Primitive {
            element,
            value: self.value,
            hash_memo: HashMemo::new(),
            kind: PhantomData,
        };
        checks.primitive(Some(&primitive), "value");
        checks.value_or_children(&primitive);
        checks.finish(primitive)
    }
}

impl<K: PrimitiveKind> From<&Primitive<K>> for PrimitiveBuilder<K> {
    fn from(primitive: &Primitive<K>) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&primitive.element),
            value: primitive.value.clone(),
        }
    }
}

impl<K: PrimitiveKind> ElementBuilder for PrimitiveBuilder<K> {
    fn element_core_mut(&mut self) -> &mut ElementCoreBuilder {
        &mut self.element
    }
}
