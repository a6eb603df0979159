//! Immutable FHIR object model
//!
//! Every node is built through a builder and never changes afterwards:
//!
//! ```text
//! Builder (setters, append/replace)
//!      |
//!   build() -> Checks (structural always, semantic per ModelConfig)
//!      |
//! Node (immutable, structural Eq, memoized hash)
//!      |
//!   to_builder() -> Builder (copy of the node's state)
//! ```
//!
//! The node hierarchy mirrors FHIR's: [`Element`] and [`BackboneElement`]
//! for data types and backbones, [`Resource`] and [`DomainResource`] for
//! resources. Nodes can be traversed depth-first in declaration order with
//! a [`Visitor`].
//!
//! ```ignore
//! use ferrum_model::prelude::*;
//! use ferrum_model::{Reference, ResearchSubject};
//!
//! let subject = ResearchSubject::builder()
//!     .status("active")
//!     .study(Reference::to("ResearchStudy/rs-1"))
//!     .subject(Reference::to("Patient/p-1"))
//!     .build()?;
//! ```

pub mod builder;
pub mod choice;
pub mod config;
pub mod element;
pub mod error;
mod hash;
pub mod primitive;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod types;
pub mod validation;
pub mod visitor;

pub use builder::{BackboneElementBuilder, ElementBuilder, Repeated};
pub use choice::ChoiceValue;
pub use config::{ModelConfig, ViolationPolicy};
pub use element::{BackboneElement, Element};
pub use error::{Error, Result, Rule, ValidationError, Violation};
pub use hash::HashMemo;
pub use primitive::{
    Boolean, Code, DateTime, Decimal, FhirString, Id, Integer, Markdown, Primitive, Uri,
};
pub use resource::{AnyResource, DomainResource, DomainResourceBuilder, Resource, ResourceBuilder};
pub use resources::{ConditionDefinition, ResearchSubject};
pub use schema::{DataType, FieldDef, TypeDef};
pub use types::{
    CodeableConcept, Coding, Extension, Identifier, Meta, Narrative, Period, Quantity, Reference,
    UsageContext,
};
pub use visitor::{walk, PathCollector, Value, Visitable, Visitor};

/// The traits needed to call inherited accessors and setters
pub mod prelude {
    pub use crate::builder::{BackboneElementBuilder, ElementBuilder};
    pub use crate::element::{BackboneElement, Element};
    pub use crate::resource::{DomainResource, DomainResourceBuilder, Resource, ResourceBuilder};
    pub use crate::visitor::{Visitable, Visitor};
}
