//! ResearchSubject: a participant in a research study

use crate::builder::{impl_element_builder, repeated_setters, BackboneCoreBuilder, Repeated};
use crate::element::{impl_element, BackboneCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{Code, DateTime, Id};
use crate::resource::{
    impl_domain_resource, impl_domain_resource_builder, DomainResourceCore,
    DomainResourceCoreBuilder,
};
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, DataType, FieldDef, FieldKind, FixedCodes, TypeDef,
    TypeKind,
};
use crate::types::{CodeableConcept, Identifier, Period, Reference};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const IDENTIFIER: FieldDef =
    FieldDef::new("identifier", Cardinality::LIST, FieldKind::Element(DataType::Identifier))
        .summary();
const STATUS: FieldDef =
    FieldDef::new("status", Cardinality::REQUIRED, FieldKind::Element(DataType::Code))
        .summary()
        .bound(BindingDef {
            name: Some("PublicationStatus"),
            strength: BindingStrength::Required,
            description: Some(
                "Codes that convey the current publication status of the research study resource.",
            ),
            value_set: "http://hl7.org/fhir/ValueSet/publication-status|5.0.0",
            fixed: Some(FixedCodes {
                system: Some("http://hl7.org/fhir/publication-status"),
                codes: &["draft", "active", "retired", "unknown"],
            }),
        });
const PROGRESS: FieldDef = FieldDef::new(
    "progress",
    Cardinality::LIST,
    FieldKind::Backbone("ResearchSubject.Progress"),
);
const PERIOD: FieldDef =
    FieldDef::new("period", Cardinality::OPTIONAL, FieldKind::Element(DataType::Period)).summary();
const STUDY: FieldDef =
    FieldDef::new("study", Cardinality::REQUIRED, FieldKind::Reference(&["ResearchStudy"]))
        .summary();
const SUBJECT: FieldDef = FieldDef::new(
    "subject",
    Cardinality::REQUIRED,
    FieldKind::Reference(&[
        "Patient",
        "Group",
        "Specimen",
        "Device",
        "Medication",
        "Substance",
        "BiologicallyDerivedProduct",
    ]),
)
.summary();
const ASSIGNED_COMPARISON_GROUP: FieldDef = FieldDef::new(
    "assignedComparisonGroup",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Id),
);
const ACTUAL_COMPARISON_GROUP: FieldDef = FieldDef::new(
    "actualComparisonGroup",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::Id),
);
const CONSENT: FieldDef =
    FieldDef::new("consent", Cardinality::LIST, FieldKind::Reference(&["Consent"]));

static FIELDS: [FieldDef; 9] = [
    IDENTIFIER,
    STATUS,
    PROGRESS,
    PERIOD,
    STUDY,
    SUBJECT,
    ASSIGNED_COMPARISON_GROUP,
    ACTUAL_COMPARISON_GROUP,
    CONSENT,
];

pub static RESEARCH_SUBJECT: TypeDef = TypeDef {
    name: "ResearchSubject",
    kind: TypeKind::DomainResource,
    fields: &FIELDS,
    constraints: &[],
};

/// A person or other subject participating in a research study
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchSubject {
    domain: DomainResourceCore,
    identifier: Vec<Identifier>,
    status: Code,
    progress: Vec<Progress>,
    period: Option<Period>,
    study: Reference,
    subject: Reference,
    assigned_comparison_group: Option<Id>,
    actual_comparison_group: Option<Id>,
    consent: Vec<Reference>,
    hash_memo: HashMemo,
}

memoized_hash!(ResearchSubject {
    domain,
    identifier,
    status,
    progress,
    period,
    study,
    subject,
    assigned_comparison_group,
    actual_comparison_group,
    consent
});

impl_domain_resource!(ResearchSubject);

impl ResearchSubject {
    pub fn builder() -> ResearchSubjectBuilder {
        ResearchSubjectBuilder::default()
    }

    pub fn to_builder(&self) -> ResearchSubjectBuilder {
        ResearchSubjectBuilder::from(self)
    }

    pub fn identifier(&self) -> &[Identifier] {
        &self.identifier
    }

    pub fn status(&self) -> &Code {
        &self.status
    }

    pub fn progress(&self) -> &[Progress] {
        &self.progress
    }

    /// Start and end of participation
    pub fn period(&self) -> Option<&Period> {
        self.period.as_ref()
    }

    pub fn study(&self) -> &Reference {
        &self.study
    }

    pub fn subject(&self) -> &Reference {
        &self.subject
    }

    pub fn assigned_comparison_group(&self) -> Option<&Id> {
        self.assigned_comparison_group.as_ref()
    }

    pub fn actual_comparison_group(&self) -> Option<&Id> {
        self.actual_comparison_group.as_ref()
    }

    /// Agreements to participate
    pub fn consent(&self) -> &[Reference] {
        &self.consent
    }
}

impl Visitable for ResearchSubject {
    fn type_def(&self) -> &'static TypeDef {
        &RESEARCH_SUBJECT
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.domain.visit(children);
        children.list("identifier", &self.identifier);
        children.node("status", Some(&self.status));
        children.list("progress", &self.progress);
        children.node("period", self.period.as_ref());
        children.node("study", Some(&self.study));
        children.node("subject", Some(&self.subject));
        children.node("assignedComparisonGroup", self.assigned_comparison_group.as_ref());
        children.node("actualComparisonGroup", self.actual_comparison_group.as_ref());
        children.list("consent", &self.consent);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResearchSubjectBuilder {
    domain: DomainResourceCoreBuilder,
    identifier: Repeated<Identifier>,
    status: Option<Code>,
    progress: Repeated<Progress>,
    period: Option<Period>,
    study: Option<Reference>,
    subject: Option<Reference>,
    assigned_comparison_group: Option<Id>,
    actual_comparison_group: Option<Id>,
    consent: Repeated<Reference>,
}

impl_domain_resource_builder!(ResearchSubjectBuilder);

impl ResearchSubjectBuilder {
    repeated_setters!(identifier: Identifier => identifier, identifiers, set_identifiers);

    pub fn status(mut self, status: impl Into<Code>) -> Self {
        self.status = Some(status.into());
        self
    }

    repeated_setters!(progress: Progress => progress, progresses, set_progress);

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn study(mut self, study: Reference) -> Self {
        self.study = Some(study);
        self
    }

    pub fn subject(mut self, subject: Reference) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn assigned_comparison_group(mut self, group: impl Into<Id>) -> Self {
        self.assigned_comparison_group = Some(group.into());
        self
    }

    pub fn actual_comparison_group(mut self, group: impl Into<Id>) -> Self {
        self.actual_comparison_group = Some(group.into());
        self
    }

    repeated_setters!(consent: Reference => consent, consents, set_consents);

    pub fn build(self) -> Result<ResearchSubject> {
        let mut checks = Checks::new(RESEARCH_SUBJECT.name);
        let domain = self.domain.build(&mut checks);
        let identifier = checks.list(self.identifier, IDENTIFIER.name);
        let status = checks.required(self.status, STATUS.name);
        checks.primitive(status.as_ref(), STATUS.name);
        checks.binding(status.as_ref(), &STATUS);
        let progress = checks.list(self.progress, PROGRESS.name);
        let study = checks.required(self.study, STUDY.name);
        let subject = checks.required(self.subject, SUBJECT.name);
        checks.primitive(self.assigned_comparison_group.as_ref(), ASSIGNED_COMPARISON_GROUP.name);
        checks.primitive(self.actual_comparison_group.as_ref(), ACTUAL_COMPARISON_GROUP.name);
        let consent = checks.list(self.consent, CONSENT.name);
        checks.reference(study.as_ref(), &STUDY);
        checks.reference(subject.as_ref(), &SUBJECT);
        checks.references(&consent, &CONSENT);

        let (Some(status), Some(study), Some(subject)) = (status, study, subject) else {
            return Err(checks.into_error());
        };
        checks.finish(ResearchSubject {
            domain,
            identifier,
            status,
            progress,
            period: self.period,
            study,
            subject,
            assigned_comparison_group: self.assigned_comparison_group,
            actual_comparison_group: self.actual_comparison_group,
            consent,
            hash_memo: HashMemo::new(),
        })
    }
}

impl From<&ResearchSubject> for ResearchSubjectBuilder {
    fn from(subject: &ResearchSubject) -> Self {
        Self {
            domain: DomainResourceCoreBuilder::from_core(&subject.domain),
            identifier: Repeated::from(subject.identifier.as_slice()),
            status: Some(subject.status.clone()),
            progress: Repeated::from(subject.progress.as_slice()),
            period: subject.period.clone(),
            study: Some(subject.study.clone()),
            subject: Some(subject.subject.clone()),
            assigned_comparison_group: subject.assigned_comparison_group.clone(),
            actual_comparison_group: subject.actual_comparison_group.clone(),
            consent: Repeated::from(subject.consent.as_slice()),
        }
    }
}

const fn example(
    name: &'static str,
    description: &'static str,
    value_set: &'static str,
) -> BindingDef {
    BindingDef {
        name: Some(name),
        strength: BindingStrength::Example,
        description: Some(description),
        value_set,
        fixed: None,
    }
}

const PROGRESS_TYPE: FieldDef = FieldDef::new(
    "type",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.bound(example(
    "ResearchSubjectStateType",
    "Identifies the kind of state being refered to.",
    "http://hl7.org/fhir/ValueSet/research-subject-state-type",
));
const SUBJECT_STATE: FieldDef = FieldDef::new(
    "subjectState",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.bound(BindingDef {
    name: Some("ResearchSubjectProgresss"),
    strength: BindingStrength::Required,
    description: Some("Indicates the progression of a study subject through a study."),
    value_set: "http://hl7.org/fhir/ValueSet/research-subject-state|5.0.0",
    fixed: None,
});
const MILESTONE: FieldDef = FieldDef::new(
    "milestone",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.bound(example(
    "ResearchSubjectMilestone",
    "Indicates the progression of a study subject through the study milestones.",
    "http://hl7.org/fhir/ValueSet/research-subject-milestone",
));
const REASON: FieldDef = FieldDef::new(
    "reason",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.bound(example(
    "StateChangeReason",
    "Indicates why the state of the subject changed.",
    "http://terminology.hl7.org/ValueSet/state-change-reason",
));
const START_DATE: FieldDef =
    FieldDef::new("startDate", Cardinality::OPTIONAL, FieldKind::Element(DataType::DateTime));
const END_DATE: FieldDef =
    FieldDef::new("endDate", Cardinality::OPTIONAL, FieldKind::Element(DataType::DateTime));

static PROGRESS_FIELDS: [FieldDef; 6] =
    [PROGRESS_TYPE, SUBJECT_STATE, MILESTONE, REASON, START_DATE, END_DATE];

pub static PROGRESS_DEF: TypeDef = TypeDef {
    name: "ResearchSubject.Progress",
    kind: TypeKind::Backbone,
    fields: &PROGRESS_FIELDS,
    constraints: &[],
};

/// A state or milestone the subject passed through during the study
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    backbone: BackboneCore,
    type_: Option<CodeableConcept>,
    subject_state: Option<CodeableConcept>,
    milestone: Option<CodeableConcept>,
    reason: Option<CodeableConcept>,
    start_date: Option<DateTime>,
    end_date: Option<DateTime>,
    hash_memo: HashMemo,
}

memoized_hash!(Progress {
    backbone,
    type_,
    subject_state,
    milestone,
    reason,
    start_date,
    end_date
});

impl_element!(Progress, backbone, |this| this.type_.is_some()
    || this.subject_state.is_some()
    || this.milestone.is_some()
    || this.reason.is_some()
    || this.start_date.is_some()
    || this.end_date.is_some());

impl Progress {
    pub fn builder() -> ProgressBuilder {
        ProgressBuilder::default()
    }

    pub fn to_builder(&self) -> ProgressBuilder {
        ProgressBuilder::from(self)
    }

    pub fn type_(&self) -> Option<&CodeableConcept> {
        self.type_.as_ref()
    }

    pub fn subject_state(&self) -> Option<&CodeableConcept> {
        self.subject_state.as_ref()
    }

    pub fn milestone(&self) -> Option<&CodeableConcept> {
        self.milestone.as_ref()
    }

    pub fn reason(&self) -> Option<&CodeableConcept> {
        self.reason.as_ref()
    }

    pub fn start_date(&self) -> Option<&DateTime> {
        self.start_date.as_ref()
    }

    pub fn end_date(&self) -> Option<&DateTime> {
        self.end_date.as_ref()
    }
}

impl Visitable for Progress {
    fn type_def(&self) -> &'static TypeDef {
        &PROGRESS_DEF
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.backbone.visit(children);
        children.node("type", self.type_.as_ref());
        children.node("subjectState", self.subject_state.as_ref());
        children.node("milestone", self.milestone.as_ref());
        children.node("reason", self.reason.as_ref());
        children.node("startDate", self.start_date.as_ref());
        children.node("endDate", self.end_date.as_ref());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressBuilder {
    backbone: BackboneCoreBuilder,
    type_: Option<CodeableConcept>,
    subject_state: Option<CodeableConcept>,
    milestone: Option<CodeableConcept>,
    reason: Option<CodeableConcept>,
    start_date: Option<DateTime>,
    end_date: Option<DateTime>,
}

impl_element_builder!(ProgressBuilder, backbone);

impl ProgressBuilder {
    pub fn type_(mut self, type_: CodeableConcept) -> Self {
        self.type_ = Some(type_);
        self
    }

    pub fn subject_state(mut self, subject_state: CodeableConcept) -> Self {
        self.subject_state = Some(subject_state);
        self
    }

    pub fn milestone(mut self, milestone: CodeableConcept) -> Self {
        self.milestone = Some(milestone);
        self
    }

    pub fn reason(mut self, reason: CodeableConcept) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn start_date(mut self, start_date: impl Into<DateTime>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    pub fn end_date(mut self, end_date: impl Into<DateTime>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    pub fn build(self) -> Result<Progress> {
        let mut checks = Checks::new(PROGRESS_DEF.name);
        let backbone = self.backbone.build(&mut checks);
        checks.primitive(self.start_date.as_ref(), START_DATE.name);
        checks.primitive(self.end_date.as_ref(), END_DATE.name);

        let progress = Progress {
            backbone,
            type_: self.type_,
            subject_state: self.subject_state,
            milestone: self.milestone,
            reason: self.reason,
            start_date: self.start_date,
            end_date: self.end_date,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&progress);
        checks.finish(progress)
    }
}

impl From<&Progress> for ProgressBuilder {
    fn from(progress: &Progress) -> Self {
        Self {
            backbone: BackboneCoreBuilder::from_core(&progress.backbone),
            type_: progress.type_.clone(),
            subject_state: progress.subject_state.clone(),
            milestone: progress.milestone.clone(),
            reason: progress.reason.clone(),
            start_date: progress.start_date.clone(),
            end_date: progress.end_date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::error::Rule;
    use crate::resource::{
        AnyResource, DomainResource, DomainResourceBuilder, Resource, ResourceBuilder,
    };

    fn enrolled() -> ResearchSubjectBuilder {
        ResearchSubject::builder()
            .status("active")
            .study(Reference::to("ResearchStudy/rs-1"))
            .subject(Reference::to("Patient/p-1"))
    }

    #[test]
    fn test_subject_accepts_listed_targets() {
        assert!(enrolled().build().is_ok());
        assert!(enrolled().subject(Reference::to("Group/g-1")).build().is_ok());
        assert!(enrolled()
            .subject(Reference::to("BiologicallyDerivedProduct/b-1"))
            .build()
            .is_ok());
    }

    #[test]
    fn test_subject_rejects_organization() {
        let err = enrolled()
            .subject(Reference::to("Organization/o-1"))
            .build()
            .unwrap_err();
        let violation = err.as_validation().unwrap().violation_for("subject").unwrap();
        assert!(matches!(
            &violation.rule,
            Rule::ReferenceTypeNotAllowed { actual, .. } if actual == "Organization"
        ));
    }

    #[test]
    fn test_reference_checks_can_be_disabled() {
        let config = ModelConfig {
            check_reference_types: false,
            ..ModelConfig::default()
        };
        let subject = config.scope(|| {
            enrolled()
                .subject(Reference::to("Organization/o-1"))
                .build()
        });
        assert!(subject.is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = ResearchSubject::builder().build().unwrap_err();
        let validation = err.as_validation().unwrap();
        assert!(validation.cites("status"));
        assert!(validation.cites("study"));
        assert!(validation.cites("subject"));
    }

    #[test]
    fn test_consent_index_in_violation() {
        let err = enrolled()
            .consent(Reference::to("Consent/c-1"))
            .consent(Reference::to("Patient/p-1"))
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("consent[1]"));
    }

    #[test]
    fn test_comparison_group_is_an_id() {
        let err = enrolled()
            .assigned_comparison_group("arm a")
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("assignedComparisonGroup"));
    }

    #[test]
    fn test_empty_progress_is_rejected() {
        let err = Progress::builder().build().unwrap_err();
        assert_eq!(err.as_validation().unwrap().violations[0].rule, Rule::EmptyLeaf);

        let progress = Progress::builder().start_date("2024-03-01").build().unwrap();
        assert_eq!(progress.start_date().and_then(|d| d.as_str()), Some("2024-03-01"));
    }

    #[test]
    fn test_contained_resource() {
        let inner = enrolled().id("inner").build().unwrap();
        let outer = enrolled()
            .contained(AnyResource::from(inner.clone()))
            .build()
            .unwrap();

        assert_eq!(outer.contained().len(), 1);
        let contained = outer.contained()[0].as_research_subject().unwrap();
        assert_eq!(contained, &inner);
        assert_eq!(Resource::id(contained), Some("inner"));
    }
}
