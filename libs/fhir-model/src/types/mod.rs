//! Complex data types

mod coding;
mod extension;
mod identifier;
mod meta;
mod narrative;
mod period;
mod quantity;
mod reference;
mod usage_context;

pub use coding::{
    CodeableConcept, CodeableConceptBuilder, Coding, CodingBuilder, CODEABLE_CONCEPT, CODING,
};
pub use extension::{Extension, ExtensionBuilder, EXTENSION};
pub use identifier::{Identifier, IdentifierBuilder, IDENTIFIER};
pub use meta::{Meta, MetaBuilder, META};
pub use narrative::{Narrative, NarrativeBuilder, NARRATIVE};
pub use period::{Period, PeriodBuilder, PERIOD};
pub use quantity::{Quantity, QuantityBuilder, QUANTITY};
pub use reference::{literal_target_type, Reference, ReferenceBuilder, REFERENCE};
pub use usage_context::{UsageContext, UsageContextBuilder, USAGE_CONTEXT};
