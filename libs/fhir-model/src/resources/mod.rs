//! Concrete domain resources

pub mod condition_definition;
pub mod research_subject;

pub use condition_definition::{
    ConditionDefinition, ConditionDefinitionBuilder, CONDITION_DEFINITION,
};
pub use research_subject::{ResearchSubject, ResearchSubjectBuilder, RESEARCH_SUBJECT};
