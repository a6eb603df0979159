#![allow(dead_code)]

use ferrum_model::{
    CodeableConcept, Coding, ConditionDefinition, Reference, ResearchSubject,
};
use ferrum_model::resources::condition_definition::{ConditionDefinitionBuilder, Precondition};
use ferrum_model::resources::research_subject::ResearchSubjectBuilder;
use std::sync::OnceLock;

/// Install a test subscriber once; `RUST_LOG=ferrum_model=trace` shows build logs
pub fn init_tracing() {
    use tracing_subscriber::prelude::*;
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "ferrum_model=warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub fn snomed(code: &str) -> CodeableConcept {
    CodeableConcept::builder()
        .coding(
            Coding::builder()
                .system("http://snomed.info/sct")
                .code(code)
                .build()
                .expect("coding must build"),
        )
        .build()
        .expect("concept must build")
}

pub fn research_subject() -> ResearchSubjectBuilder {
    ResearchSubject::builder()
        .status("active")
        .study(Reference::to("ResearchStudy/rs-1"))
        .subject(Reference::to("Patient/p-1"))
}

pub fn condition_definition() -> ConditionDefinitionBuilder {
    ConditionDefinition::builder()
        .status("active")
        .code(snomed("73211009"))
}

pub fn precondition(code: &str) -> Precondition {
    Precondition::builder()
        .type_("sensitive")
        .code(snomed(code))
        .build()
        .expect("precondition must build")
}
