//! Payload of a choice field (`value[x]`)
//!
//! A choice field holds exactly one value of one of a closed set of types.
//! [`ChoiceValue`] spans every type a choice may carry; each field's allowed
//! subset is declared in its [`FieldDef`](crate::schema::FieldDef) and
//! enforced by `build()`.

use crate::primitive::{Boolean, Code, DateTime, Decimal, FhirString, Id, Integer, Markdown, Uri};
use crate::schema::DataType;
use crate::types::{CodeableConcept, Coding, Identifier, Period, Quantity, Reference};
use crate::visitor::Visitable;

macro_rules! choice_value {
    ($($variant:ident($ty:ty) => $as:ident),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum ChoiceValue {
            $($variant($ty),)*
        }

        impl ChoiceValue {
            /// Data type of the payload
            pub fn data_type(&self) -> DataType {
                match self {
                    $(ChoiceValue::$variant(_) => DataType::$variant,)*
                }
            }

            pub fn as_visitable(&self) -> &dyn Visitable {
                match self {
                    $(ChoiceValue::$variant(value) => value,)*
                }
            }

            $(
                pub fn $as(&self) -> Option<&$ty> {
                    match self {
                        ChoiceValue::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<$ty> for ChoiceValue {
                fn from(value: $ty) -> Self {
                    ChoiceValue::$variant(value)
                }
            }
        )*
    };
}

choice_value! {
    Boolean(Boolean) => as_boolean,
    Integer(Integer) => as_integer,
    Decimal(Decimal) => as_decimal,
    String(FhirString) => as_string,
    Code(Code) => as_code,
    Id(Id) => as_id,
    Uri(Uri) => as_uri,
    Markdown(Markdown) => as_markdown,
    DateTime(DateTime) => as_date_time,
    Coding(Coding) => as_coding,
    CodeableConcept(CodeableConcept) => as_codeable_concept,
    Identifier(Identifier) => as_identifier,
    Reference(Reference) => as_reference,
    Period(Period) => as_period,
    Quantity(Quantity) => as_quantity,
}

impl ChoiceValue {
    /// Text of a string-valued primitive payload (string, code, id, uri,
    /// markdown, dateTime)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ChoiceValue::String(v) => v.as_str(),
            ChoiceValue::Code(v) => v.as_str(),
            ChoiceValue::Id(v) => v.as_str(),
            ChoiceValue::Uri(v) => v.as_str(),
            ChoiceValue::Markdown(v) => v.as_str(),
            ChoiceValue::DateTime(v) => v.as_str(),
            _ => None,
        }
    }

    /// Format rule of a primitive payload. Complex payloads were checked by
    /// their own `build()`.
    pub fn check_format(&self) -> std::result::Result<(), String> {
        match self {
            ChoiceValue::Boolean(v) => v.check_format(),
            ChoiceValue::Integer(v) => v.check_format(),
            ChoiceValue::Decimal(v) => v.check_format(),
            ChoiceValue::String(v) => v.check_format(),
            ChoiceValue::Code(v) => v.check_format(),
            ChoiceValue::Id(v) => v.check_format(),
            ChoiceValue::Uri(v) => v.check_format(),
            ChoiceValue::Markdown(v) => v.check_format(),
            ChoiceValue::DateTime(v) => v.check_format(),
            _ => Ok(()),
        }
    }

    /// FHIR element name for this payload under `base`, e.g. `valueQuantity`
    pub fn element_name(&self, base: &str) -> String {
        let type_name = self.data_type().name();
        let mut name = String::with_capacity(base.len() + type_name.len());
        name.push_str(base);
        let mut chars = type_name.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload_reads_back() {
        let value = ChoiceValue::from(FhirString::from("1.2.0"));
        assert_eq!(value.data_type(), DataType::String);
        assert_eq!(value.as_string().and_then(|s| s.as_str()), Some("1.2.0"));
        assert_eq!(value.as_str(), Some("1.2.0"));
        assert!(value.as_coding().is_none());
    }

    #[test]
    fn test_element_name() {
        let value = ChoiceValue::from(Boolean::from(true));
        assert_eq!(value.element_name("value"), "valueBoolean");

        let value = ChoiceValue::from(DateTime::from("2024-01-01"));
        assert_eq!(value.element_name("onset"), "onsetDateTime");
    }

    #[test]
    fn test_check_format_on_primitive_payloads() {
        assert!(ChoiceValue::from(DateTime::from("2024-02")).check_format().is_ok());
        assert!(ChoiceValue::from(DateTime::from("not-a-date")).check_format().is_err());
        assert!(ChoiceValue::from(Code::from("  bad  code ")).check_format().is_err());
        assert!(ChoiceValue::from(Id::from("a b")).check_format().is_err());
        assert!(ChoiceValue::from(FhirString::from("  any text  ")).check_format().is_ok());
    }

    #[test]
    fn test_visitable_view_keeps_type() {
        let value = ChoiceValue::from(Integer::from(3));
        assert_eq!(value.as_visitable().type_name(), "integer");
        assert!(value.as_visitable().downcast_ref::<Integer>().is_some());
    }
}
