//! ConditionDefinition: a definition of a condition and information relevant
//! to managing it

use crate::builder::{impl_element_builder, repeated_setters, BackboneCoreBuilder, Repeated};
use crate::choice::ChoiceValue;
use crate::element::{impl_element, BackboneCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{Boolean, Code, DateTime, FhirString, Markdown, Uri};
use crate::resource::{
    impl_domain_resource, impl_domain_resource_builder, DomainResourceCore,
    DomainResourceCoreBuilder,
};
use crate::schema::{
    BindingDef, BindingStrength, Cardinality, ConstraintDef, ConstraintLevel, DataType, FieldDef,
    FieldKind, FixedCodes, TypeDef, TypeKind,
};
use crate::types::{CodeableConcept, Identifier, Reference, UsageContext};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const SOURCE: &str = "http://hl7.org/fhir/StructureDefinition/ConditionDefinition";

const PUBLICATION_STATUS: BindingDef = BindingDef {
    name: Some("PublicationStatus"),
    strength: BindingStrength::Required,
    description: Some("The lifecycle status of an artifact."),
    value_set: "http://hl7.org/fhir/ValueSet/publication-status|5.0.0",
    fixed: Some(FixedCodes {
        system: Some("http://hl7.org/fhir/publication-status"),
        codes: &["draft", "active", "retired", "unknown"],
    }),
};

const fn example(name: &'static str, value_set: &'static str) -> BindingDef {
    BindingDef {
        name: Some(name),
        strength: BindingStrength::Example,
        description: None,
        value_set,
        fixed: None,
    }
}

const URL: FieldDef =
    FieldDef::new("url", Cardinality::OPTIONAL, FieldKind::Element(DataType::Uri)).summary();
const IDENTIFIER: FieldDef =
    FieldDef::new("identifier", Cardinality::LIST, FieldKind::Element(DataType::Identifier))
        .summary();
const VERSION: FieldDef =
    FieldDef::new("version", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const VERSION_ALGORITHM: FieldDef = FieldDef::new(
    "versionAlgorithm",
    Cardinality::OPTIONAL,
    FieldKind::Choice(&[DataType::String, DataType::Coding]),
)
.summary()
.bound(BindingDef {
    name: None,
    strength: BindingStrength::Extensible,
    description: None,
    value_set: "http://hl7.org/fhir/ValueSet/version-algorithm",
    fixed: None,
});
const NAME: FieldDef =
    FieldDef::new("name", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const TITLE: FieldDef =
    FieldDef::new("title", Cardinality::OPTIONAL, FieldKind::Element(DataType::String)).summary();
const SUBTITLE: FieldDef =
    FieldDef::new("subtitle", Cardinality::OPTIONAL, FieldKind::Element(DataType::String));
const STATUS: FieldDef =
    FieldDef::new("status", Cardinality::REQUIRED, FieldKind::Element(DataType::Code))
        .summary()
        .bound(PUBLICATION_STATUS);
const EXPERIMENTAL: FieldDef =
    FieldDef::new("experimental", Cardinality::OPTIONAL, FieldKind::Element(DataType::Boolean))
        .summary();
const DATE: FieldDef =
    FieldDef::new("date", Cardinality::OPTIONAL, FieldKind::Element(DataType::DateTime)).summary();
const PUBLISHER: FieldDef =
    FieldDef::new("publisher", Cardinality::OPTIONAL, FieldKind::Element(DataType::String))
        .summary();
const DESCRIPTION: FieldDef =
    FieldDef::new("description", Cardinality::OPTIONAL, FieldKind::Element(DataType::Markdown));
const USE_CONTEXT: FieldDef =
    FieldDef::new("useContext", Cardinality::LIST, FieldKind::Element(DataType::UsageContext))
        .summary();
const JURISDICTION: FieldDef = FieldDef::new(
    "jurisdiction",
    Cardinality::LIST,
    FieldKind::Element(DataType::CodeableConcept),
)
.summary()
.bound(BindingDef {
    name: Some("Jurisdiction"),
    strength: BindingStrength::Extensible,
    description: Some("Countries and regions within which this artifact is targeted for use."),
    value_set: "http://hl7.org/fhir/ValueSet/jurisdiction",
    fixed: None,
});
const CODE: FieldDef = FieldDef::new(
    "code",
    Cardinality::REQUIRED,
    FieldKind::Element(DataType::CodeableConcept),
)
.summary()
.bound(example("ConditionKind", "http://hl7.org/fhir/ValueSet/condition-code"));
const SEVERITY: FieldDef = FieldDef::new(
    "severity",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.summary()
.bound(BindingDef {
    name: Some("ConditionSeverity"),
    strength: BindingStrength::Preferred,
    description: None,
    value_set: "http://hl7.org/fhir/ValueSet/condition-severity",
    fixed: None,
});
const BODY_SITE: FieldDef = FieldDef::new(
    "bodySite",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.summary()
.bound(example("BodySite", "http://hl7.org/fhir/ValueSet/body-site"));
const STAGE: FieldDef = FieldDef::new(
    "stage",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
)
.summary()
.bound(example("ConditionStage", "http://hl7.org/fhir/ValueSet/condition-stage"));
const HAS_SEVERITY: FieldDef =
    FieldDef::new("hasSeverity", Cardinality::OPTIONAL, FieldKind::Element(DataType::Boolean));
const HAS_BODY_SITE: FieldDef =
    FieldDef::new("hasBodySite", Cardinality::OPTIONAL, FieldKind::Element(DataType::Boolean));
const HAS_STAGE: FieldDef =
    FieldDef::new("hasStage", Cardinality::OPTIONAL, FieldKind::Element(DataType::Boolean));
const DEFINITION: FieldDef =
    FieldDef::new("definition", Cardinality::LIST, FieldKind::Element(DataType::Uri));
const OBSERVATION: FieldDef = FieldDef::new(
    "observation",
    Cardinality::LIST,
    FieldKind::Backbone("ConditionDefinition.Observation"),
);
const MEDICATION: FieldDef = FieldDef::new(
    "medication",
    Cardinality::LIST,
    FieldKind::Backbone("ConditionDefinition.Medication"),
);
const PRECONDITION: FieldDef = FieldDef::new(
    "precondition",
    Cardinality::LIST,
    FieldKind::Backbone("ConditionDefinition.Precondition"),
);
const TEAM: FieldDef =
    FieldDef::new("team", Cardinality::LIST, FieldKind::Reference(&["CareTeam"]));
const QUESTIONNAIRE: FieldDef = FieldDef::new(
    "questionnaire",
    Cardinality::LIST,
    FieldKind::Backbone("ConditionDefinition.Questionnaire"),
);
const PLAN: FieldDef = FieldDef::new(
    "plan",
    Cardinality::LIST,
    FieldKind::Backbone("ConditionDefinition.Plan"),
);

static FIELDS: [FieldDef; 28] = [
    URL,
    IDENTIFIER,
    VERSION,
    VERSION_ALGORITHM,
    NAME,
    TITLE,
    SUBTITLE,
    STATUS,
    EXPERIMENTAL,
    DATE,
    PUBLISHER,
    DESCRIPTION,
    USE_CONTEXT,
    JURISDICTION,
    CODE,
    SEVERITY,
    BODY_SITE,
    STAGE,
    HAS_SEVERITY,
    HAS_BODY_SITE,
    HAS_STAGE,
    DEFINITION,
    OBSERVATION,
    MEDICATION,
    PRECONDITION,
    TEAM,
    QUESTIONNAIRE,
    PLAN,
];

static CONSTRAINTS: [ConstraintDef; 6] = [
    ConstraintDef {
        id: "cnl-0",
        level: ConstraintLevel::Warning,
        location: "(base)",
        description: "Name should be usable as an identifier for the module by machine processing applications such as code generation",
        expression: "name.exists() implies name.matches('^[A-Z]([A-Za-z0-9_]){1,254}$')",
        source: SOURCE,
        generated: false,
    },
    ConstraintDef {
        id: "cnl-1",
        level: ConstraintLevel::Warning,
        location: "ConditionDefinition.url",
        description: "URL should not contain | or # - these characters make processing canonical references problematic",
        expression: "exists() implies matches('^[^|# ]+$')",
        source: SOURCE,
        generated: false,
    },
    ConstraintDef {
        id: "conditionDefinition-2",
        level: ConstraintLevel::Warning,
        location: "(base)",
        description: "SHALL, if possible, contain a code from value set http://hl7.org/fhir/ValueSet/version-algorithm",
        expression: "versionAlgorithm.as(String).exists() implies (versionAlgorithm.as(String).memberOf('http://hl7.org/fhir/ValueSet/version-algorithm', 'extensible'))",
        source: SOURCE,
        generated: true,
    },
    ConstraintDef {
        id: "conditionDefinition-3",
        level: ConstraintLevel::Warning,
        location: "(base)",
        description: "SHALL, if possible, contain a code from value set http://hl7.org/fhir/ValueSet/jurisdiction",
        expression: "jurisdiction.exists() implies (jurisdiction.all(memberOf('http://hl7.org/fhir/ValueSet/jurisdiction', 'extensible')))",
        source: SOURCE,
        generated: true,
    },
    ConstraintDef {
        id: "conditionDefinition-4",
        level: ConstraintLevel::Warning,
        location: "(base)",
        description: "SHOULD contain a code from value set http://hl7.org/fhir/ValueSet/condition-severity",
        expression: "severity.exists() implies (severity.memberOf('http://hl7.org/fhir/ValueSet/condition-severity', 'preferred'))",
        source: SOURCE,
        generated: true,
    },
    ConstraintDef {
        id: "conditionDefinition-5",
        level: ConstraintLevel::Warning,
        location: "observation.category",
        description: "SHOULD contain a code from value set http://hl7.org/fhir/ValueSet/observation-category",
        expression: "$this.memberOf('http://hl7.org/fhir/ValueSet/observation-category', 'preferred')",
        source: SOURCE,
        generated: true,
    },
];

pub static CONDITION_DEFINITION: TypeDef = TypeDef {
    name: "ConditionDefinition",
    kind: TypeKind::DomainResource,
    fields: &FIELDS,
    constraints: &CONSTRAINTS,
};

/// A definition of a condition and information relevant to managing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDefinition {
    domain: DomainResourceCore,
    url: Option<Uri>,
    identifier: Vec<Identifier>,
    version: Option<FhirString>,
    version_algorithm: Option<ChoiceValue>,
    name: Option<FhirString>,
    title: Option<FhirString>,
    subtitle: Option<FhirString>,
    status: Code,
    experimental: Option<Boolean>,
    date: Option<DateTime>,
    publisher: Option<FhirString>,
    description: Option<Markdown>,
    use_context: Vec<UsageContext>,
    jurisdiction: Vec<CodeableConcept>,
    code: CodeableConcept,
    severity: Option<CodeableConcept>,
    body_site: Option<CodeableConcept>,
    stage: Option<CodeableConcept>,
    has_severity: Option<Boolean>,
    has_body_site: Option<Boolean>,
    has_stage: Option<Boolean>,
    definition: Vec<Uri>,
    observation: Vec<Observation>,
    medication: Vec<Medication>,
    precondition: Vec<Precondition>,
    team: Vec<Reference>,
    questionnaire: Vec<Questionnaire>,
    plan: Vec<Plan>,
    hash_memo: HashMemo,
}

memoized_hash!(ConditionDefinition {
    domain,
    url,
    identifier,
    version,
    version_algorithm,
    name,
    title,
    subtitle,
    status,
    experimental,
    date,
    publisher,
    description,
    use_context,
    jurisdiction,
    code,
    severity,
    body_site,
    stage,
    has_severity,
    has_body_site,
    has_stage,
    definition,
    observation,
    medication,
    precondition,
    team,
    questionnaire,
    plan
});

impl_domain_resource!(ConditionDefinition);

impl ConditionDefinition {
    pub fn builder() -> ConditionDefinitionBuilder {
        ConditionDefinitionBuilder::default()
    }

    pub fn to_builder(&self) -> ConditionDefinitionBuilder {
        ConditionDefinitionBuilder::from(self)
    }

    /// Canonical identifier for this definition
    pub fn url(&self) -> Option<&Uri> {
        self.url.as_ref()
    }

    pub fn identifier(&self) -> &[Identifier] {
        &self.identifier
    }

    pub fn version(&self) -> Option<&FhirString> {
        self.version.as_ref()
    }

    /// How to compare versions: a String or a Coding
    pub fn version_algorithm(&self) -> Option<&ChoiceValue> {
        self.version_algorithm.as_ref()
    }

    pub fn name(&self) -> Option<&FhirString> {
        self.name.as_ref()
    }

    pub fn title(&self) -> Option<&FhirString> {
        self.title.as_ref()
    }

    pub fn subtitle(&self) -> Option<&FhirString> {
        self.subtitle.as_ref()
    }

    pub fn status(&self) -> &Code {
        &self.status
    }

    pub fn experimental(&self) -> Option<&Boolean> {
        self.experimental.as_ref()
    }

    pub fn date(&self) -> Option<&DateTime> {
        self.date.as_ref()
    }

    pub fn publisher(&self) -> Option<&FhirString> {
        self.publisher.as_ref()
    }

    pub fn description(&self) -> Option<&Markdown> {
        self.description.as_ref()
    }

    pub fn use_context(&self) -> &[UsageContext] {
        &self.use_context
    }

    pub fn jurisdiction(&self) -> &[CodeableConcept] {
        &self.jurisdiction
    }

    /// Identification of the condition or diagnosis
    pub fn code(&self) -> &CodeableConcept {
        &self.code
    }

    pub fn severity(&self) -> Option<&CodeableConcept> {
        self.severity.as_ref()
    }

    pub fn body_site(&self) -> Option<&CodeableConcept> {
        self.body_site.as_ref()
    }

    pub fn stage(&self) -> Option<&CodeableConcept> {
        self.stage.as_ref()
    }

    pub fn has_severity(&self) -> Option<&Boolean> {
        self.has_severity.as_ref()
    }

    pub fn has_body_site(&self) -> Option<&Boolean> {
        self.has_body_site.as_ref()
    }

    pub fn has_stage(&self) -> Option<&Boolean> {
        self.has_stage.as_ref()
    }

    pub fn definition(&self) -> &[Uri] {
        &self.definition
    }

    pub fn observation(&self) -> &[Observation] {
        &self.observation
    }

    pub fn medication(&self) -> &[Medication] {
        &self.medication
    }

    pub fn precondition(&self) -> &[Precondition] {
        &self.precondition
    }

    /// Appropriate CareTeams for the condition
    pub fn team(&self) -> &[Reference] {
        &self.team
    }

    pub fn questionnaire(&self) -> &[Questionnaire] {
        &self.questionnaire
    }

    pub fn plan(&self) -> &[Plan] {
        &self.plan
    }
}

impl Visitable for ConditionDefinition {
    fn type_def(&self) -> &'static TypeDef {
        &CONDITION_DEFINITION
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.domain.visit(children);
        children.node("url", self.url.as_ref());
        children.list("identifier", &self.identifier);
        children.node("version", self.version.as_ref());
        children.dyn_node(
            "versionAlgorithm",
            self.version_algorithm.as_ref().map(ChoiceValue::as_visitable),
        );
        children.node("name", self.name.as_ref());
        children.node("title", self.title.as_ref());
        children.node("subtitle", self.subtitle.as_ref());
        children.node("status", Some(&self.status));
        children.node("experimental", self.experimental.as_ref());
        children.node("date", self.date.as_ref());
        children.node("publisher", self.publisher.as_ref());
        children.node("description", self.description.as_ref());
        children.list("useContext", &self.use_context);
        children.list("jurisdiction", &self.jurisdiction);
        children.node("code", Some(&self.code));
        children.node("severity", self.severity.as_ref());
        children.node("bodySite", self.body_site.as_ref());
        children.node("stage", self.stage.as_ref());
        children.node("hasSeverity", self.has_severity.as_ref());
        children.node("hasBodySite", self.has_body_site.as_ref());
        children.node("hasStage", self.has_stage.as_ref());
        children.list("definition", &self.definition);
        children.list("observation", &self.observation);
        children.list("medication", &self.medication);
        children.list("precondition", &self.precondition);
        children.list("team", &self.team);
        children.list("questionnaire", &self.questionnaire);
        children.list("plan", &self.plan);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConditionDefinitionBuilder {
    domain: DomainResourceCoreBuilder,
    url: Option<Uri>,
    identifier: Repeated<Identifier>,
    version: Option<FhirString>,
    version_algorithm: Option<ChoiceValue>,
    name: Option<FhirString>,
    title: Option<FhirString>,
    subtitle: Option<FhirString>,
    status: Option<Code>,
    experimental: Option<Boolean>,
    date: Option<DateTime>,
    publisher: Option<FhirString>,
    description: Option<Markdown>,
    use_context: Repeated<UsageContext>,
    jurisdiction: Repeated<CodeableConcept>,
    code: Option<CodeableConcept>,
    severity: Option<CodeableConcept>,
    body_site: Option<CodeableConcept>,
    stage: Option<CodeableConcept>,
    has_severity: Option<Boolean>,
    has_body_site: Option<Boolean>,
    has_stage: Option<Boolean>,
    definition: Repeated<Uri>,
    observation: Repeated<Observation>,
    medication: Repeated<Medication>,
    precondition: Repeated<Precondition>,
    team: Repeated<Reference>,
    questionnaire: Repeated<Questionnaire>,
    plan: Repeated<Plan>,
}

impl_domain_resource_builder!(ConditionDefinitionBuilder);

impl ConditionDefinitionBuilder {
    pub fn url(mut self, url: impl Into<Uri>) -> Self {
        self.url = Some(url.into());
        self
    }

    repeated_setters!(identifier: Identifier => identifier, identifiers, set_identifiers);

    pub fn version(mut self, version: impl Into<FhirString>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Accepts a String or a Coding
    pub fn version_algorithm(mut self, version_algorithm: impl Into<ChoiceValue>) -> Self {
        self.version_algorithm = Some(version_algorithm.into());
        self
    }

    pub fn name(mut self, name: impl Into<FhirString>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn title(mut self, title: impl Into<FhirString>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<FhirString>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn status(mut self, status: impl Into<Code>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn experimental(mut self, experimental: impl Into<Boolean>) -> Self {
        self.experimental = Some(experimental.into());
        self
    }

    pub fn date(mut self, date: impl Into<DateTime>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn publisher(mut self, publisher: impl Into<FhirString>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn description(mut self, description: impl Into<Markdown>) -> Self {
        self.description = Some(description.into());
        self
    }

    repeated_setters!(use_context: UsageContext => use_context, use_contexts, set_use_contexts);
    repeated_setters!(jurisdiction: CodeableConcept => jurisdiction, jurisdictions, set_jurisdictions);

    pub fn code(mut self, code: CodeableConcept) -> Self {
        self.code = Some(code);
        self
    }

    pub fn severity(mut self, severity: CodeableConcept) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn body_site(mut self, body_site: CodeableConcept) -> Self {
        self.body_site = Some(body_site);
        self
    }

    pub fn stage(mut self, stage: CodeableConcept) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn has_severity(mut self, has_severity: impl Into<Boolean>) -> Self {
        self.has_severity = Some(has_severity.into());
        self
    }

    pub fn has_body_site(mut self, has_body_site: impl Into<Boolean>) -> Self {
        self.has_body_site = Some(has_body_site.into());
        self
    }

    pub fn has_stage(mut self, has_stage: impl Into<Boolean>) -> Self {
        self.has_stage = Some(has_stage.into());
        self
    }

    repeated_setters!(definition: Uri => definition, definitions, set_definitions);
    repeated_setters!(observation: Observation => observation, observations, set_observations);
    repeated_setters!(medication: Medication => medication, medications, set_medications);
    repeated_setters!(precondition: Precondition => precondition, preconditions, set_preconditions);
    repeated_setters!(team: Reference => team, teams, set_teams);
    repeated_setters!(questionnaire: Questionnaire => questionnaire, questionnaires, set_questionnaires);
    repeated_setters!(plan: Plan => plan, plans, set_plans);

    pub fn build(self) -> Result<ConditionDefinition> {
        let mut checks = Checks::new(CONDITION_DEFINITION.name);
        let domain = self.domain.build(&mut checks);
        checks.primitive(self.url.as_ref(), URL.name);
        let identifier = checks.list(self.identifier, IDENTIFIER.name);
        checks.choice(self.version_algorithm.as_ref(), &VERSION_ALGORITHM);
        let status = checks.required(self.status, STATUS.name);
        checks.primitive(status.as_ref(), STATUS.name);
        checks.binding(status.as_ref(), &STATUS);
        checks.primitive(self.date.as_ref(), DATE.name);
        let use_context = checks.list(self.use_context, USE_CONTEXT.name);
        let jurisdiction = checks.list(self.jurisdiction, JURISDICTION.name);
        let code = checks.required(self.code, CODE.name);
        let definition = checks.list(self.definition, DEFINITION.name);
        checks.primitives(&definition, DEFINITION.name);
        let observation = checks.list(self.observation, OBSERVATION.name);
        let medication = checks.list(self.medication, MEDICATION.name);
        let precondition = checks.list(self.precondition, PRECONDITION.name);
        let team = checks.list(self.team, TEAM.name);
        checks.references(&team, &TEAM);
        let questionnaire = checks.list(self.questionnaire, QUESTIONNAIRE.name);
        let plan = checks.list(self.plan, PLAN.name);

        let (Some(status), Some(code)) = (status, code) else {
            return Err(checks.into_error());
        };
        checks.finish(ConditionDefinition {
            domain,
            url: self.url,
            identifier,
            version: self.version,
            version_algorithm: self.version_algorithm,
            name: self.name,
            title: self.title,
            subtitle: self.subtitle,
            status,
            experimental: self.experimental,
            date: self.date,
            publisher: self.publisher,
            description: self.description,
            use_context,
            jurisdiction,
            code,
            severity: self.severity,
            body_site: self.body_site,
            stage: self.stage,
            has_severity: self.has_severity,
            has_body_site: self.has_body_site,
            has_stage: self.has_stage,
            definition,
            observation,
            medication,
            precondition,
            team,
            questionnaire,
            plan,
            hash_memo: HashMemo::new(),
        })
    }
}

impl From<&ConditionDefinition> for ConditionDefinitionBuilder {
    fn from(definition: &ConditionDefinition) -> Self {
        Self {
            domain: DomainResourceCoreBuilder::from_core(&definition.domain),
            url: definition.url.clone(),
            identifier: Repeated::from(definition.identifier.as_slice()),
            version: definition.version.clone(),
            version_algorithm: definition.version_algorithm.clone(),
            name: definition.name.clone(),
            title: definition.title.clone(),
            subtitle: definition.subtitle.clone(),
            status: Some(definition.status.clone()),
            experimental: definition.experimental.clone(),
            date: definition.date.clone(),
            publisher: definition.publisher.clone(),
            description: definition.description.clone(),
            use_context: Repeated::from(definition.use_context.as_slice()),
            jurisdiction: Repeated::from(definition.jurisdiction.as_slice()),
            code: Some(definition.code.clone()),
            severity: definition.severity.clone(),
            body_site: definition.body_site.clone(),
            stage: definition.stage.clone(),
            has_severity: definition.has_severity.clone(),
            has_body_site: definition.has_body_site.clone(),
            has_stage: definition.has_stage.clone(),
            definition: Repeated::from(definition.definition.as_slice()),
            observation: Repeated::from(definition.observation.as_slice()),
            medication: Repeated::from(definition.medication.as_slice()),
            precondition: Repeated::from(definition.precondition.as_slice()),
            team: Repeated::from(definition.team.as_slice()),
            questionnaire: Repeated::from(definition.questionnaire.as_slice()),
            plan: Repeated::from(definition.plan.as_slice()),
        }
    }
}

/// Backbones made of an optional category and code, such as the observations
/// and medications relevant to a condition
macro_rules! category_code_backbone {
    (
        $(#[$doc:meta])*
        $ty:ident, $builder:ident, $def:ident, $fields:ident, $name:literal,
        category: $category:expr,
        code: $code:expr
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $ty {
            backbone: BackboneCore,
            category: Option<CodeableConcept>,
            code: Option<CodeableConcept>,
            hash_memo: HashMemo,
        }

        memoized_hash!($ty { backbone, category, code });

        impl_element!($ty, backbone, |this| this.category.is_some() || this.code.is_some());

        static $fields: [FieldDef; 2] = [
            FieldDef::new(
                "category",
                Cardinality::OPTIONAL,
                FieldKind::Element(DataType::CodeableConcept),
            )
            .bound($category),
            FieldDef::new(
                "code",
                Cardinality::OPTIONAL,
                FieldKind::Element(DataType::CodeableConcept),
            )
            .bound($code),
        ];

        pub static $def: TypeDef = TypeDef {
            name: $name,
            kind: TypeKind::Backbone,
            fields: &$fields,
            constraints: &[],
        };

        impl $ty {
            pub fn builder() -> $builder {
                $builder::default()
            }

            pub fn to_builder(&self) -> $builder {
                $builder::from(self)
            }

            pub fn category(&self) -> Option<&CodeableConcept> {
                self.category.as_ref()
            }

            pub fn code(&self) -> Option<&CodeableConcept> {
                self.code.as_ref()
            }
        }

        impl Visitable for $ty {
            fn type_def(&self) -> &'static TypeDef {
                &$def
            }

            fn visit_children(&self, children: &mut Children<'_>) {
                self.backbone.visit(children);
                children.node("category", self.category.as_ref());
                children.node("code", self.code.as_ref());
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        #[derive(Debug, Clone, Default)]
        pub struct $builder {
            backbone: BackboneCoreBuilder,
            category: Option<CodeableConcept>,
            code: Option<CodeableConcept>,
        }

        impl_element_builder!($builder, backbone);

        impl $builder {
            pub fn category(mut self, category: CodeableConcept) -> Self {
                self.category = Some(category);
                self
            }

            pub fn code(mut self, code: CodeableConcept) -> Self {
                self.code = Some(code);
                self
            }

            pub fn build(self) -> Result<$ty> {
                let mut checks = Checks::new($def.name);
                let backbone = self.backbone.build(&mut checks);
                let node = $ty {
                    backbone,
                    category: self.category,
                    code: self.code,
                    hash_memo: HashMemo::new(),
                };
                checks.value_or_children(&node);
                checks.finish(node)
            }
        }

        impl From<&$ty> for $builder {
            fn from(node: &$ty) -> Self {
                Self {
                    backbone: BackboneCoreBuilder::from_core(&node.backbone),
                    category: node.category.clone(),
                    code: node.code.clone(),
                }
            }
        }
    };
}

category_code_backbone! {
    /// An observation that is relevant to the condition
    Observation, ObservationBuilder, OBSERVATION_DEF, OBSERVATION_FIELDS, "ConditionDefinition.Observation",
    category: BindingDef {
        name: Some("ObservationCategory"),
        strength: BindingStrength::Preferred,
        description: Some("Codes for high level observation categories."),
        value_set: "http://hl7.org/fhir/ValueSet/observation-category",
        fixed: None,
    },
    code: example("ObservationCode", "http://hl7.org/fhir/ValueSet/observation-codes")
}

category_code_backbone! {
    /// A medication that is relevant to managing the condition
    Medication, MedicationBuilder, MEDICATION_DEF, MEDICATION_FIELDS, "ConditionDefinition.Medication",
    category: example(
        "MedicationRequestCategory",
        "http://hl7.org/fhir/ValueSet/medicationrequest-category"
    ),
    code: example("MedicationCode", "http://hl7.org/fhir/ValueSet/medication-codes")
}

const PRECONDITION_TYPE: FieldDef =
    FieldDef::new("type", Cardinality::REQUIRED, FieldKind::Element(DataType::Code)).bound(
        BindingDef {
            name: Some("ConditionPreconditionType"),
            strength: BindingStrength::Required,
            description: Some("Kind of precondition for the condition."),
            value_set: "http://hl7.org/fhir/ValueSet/condition-precondition-type|5.0.0",
            fixed: Some(FixedCodes {
                system: Some("http://hl7.org/fhir/condition-precondition-type"),
                codes: &["sensitive", "specific"],
            }),
        },
    );
const PRECONDITION_CODE: FieldDef = FieldDef::new(
    "code",
    Cardinality::REQUIRED,
    FieldKind::Element(DataType::CodeableConcept),
)
.bound(example("ConditionPreconditionCode", "http://hl7.org/fhir/ValueSet/observation-codes"));
const PRECONDITION_VALUE: FieldDef = FieldDef::new(
    "value",
    Cardinality::OPTIONAL,
    FieldKind::Choice(&[DataType::CodeableConcept, DataType::Quantity]),
);

static PRECONDITION_FIELDS: [FieldDef; 3] =
    [PRECONDITION_TYPE, PRECONDITION_CODE, PRECONDITION_VALUE];

pub static PRECONDITION_DEF: TypeDef = TypeDef {
    name: "ConditionDefinition.Precondition",
    kind: TypeKind::Backbone,
    fields: &PRECONDITION_FIELDS,
    constraints: &[],
};

/// An observation that must hold before the condition applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    backbone: BackboneCore,
    type_: Code,
    code: CodeableConcept,
    value: Option<ChoiceValue>,
    hash_memo: HashMemo,
}

memoized_hash!(Precondition {
    backbone,
    type_,
    code,
    value
});

impl_element!(Precondition, backbone, |_this| true);

impl Precondition {
    pub fn builder() -> PreconditionBuilder {
        PreconditionBuilder::default()
    }

    pub fn to_builder(&self) -> PreconditionBuilder {
        PreconditionBuilder::from(self)
    }

    /// `sensitive` or `specific`
    pub fn type_(&self) -> &Code {
        &self.type_
    }

    pub fn code(&self) -> &CodeableConcept {
        &self.code
    }

    /// A CodeableConcept or a Quantity
    pub fn value(&self) -> Option<&ChoiceValue> {
        self.value.as_ref()
    }
}

impl Visitable for Precondition {
    fn type_def(&self) -> &'static TypeDef {
        &PRECONDITION_DEF
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.backbone.visit(children);
        children.node("type", Some(&self.type_));
        children.node("code", Some(&self.code));
        children.dyn_node("value", self.value.as_ref().map(ChoiceValue::as_visitable));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreconditionBuilder {
    backbone: BackboneCoreBuilder,
    type_: Option<Code>,
    code: Option<CodeableConcept>,
    value: Option<ChoiceValue>,
}

impl_element_builder!(PreconditionBuilder, backbone);

impl PreconditionBuilder {
    pub fn type_(mut self, type_: impl Into<Code>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn code(mut self, code: CodeableConcept) -> Self {
        self.code = Some(code);
        self
    }

    pub fn value(mut self, value: impl Into<ChoiceValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Precondition> {
        let mut checks = Checks::new(PRECONDITION_DEF.name);
        let backbone = self.backbone.build(&mut checks);
        let type_ = checks.required(self.type_, PRECONDITION_TYPE.name);
        checks.primitive(type_.as_ref(), PRECONDITION_TYPE.name);
        checks.binding(type_.as_ref(), &PRECONDITION_TYPE);
        let code = checks.required(self.code, PRECONDITION_CODE.name);
        checks.choice(self.value.as_ref(), &PRECONDITION_VALUE);

        let (Some(type_), Some(code)) = (type_, code) else {
            return Err(checks.into_error());
        };
        let precondition = Precondition {
            backbone,
            type_,
            code,
            value: self.value,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&precondition);
        checks.finish(precondition)
    }
}

impl From<&Precondition> for PreconditionBuilder {
    fn from(precondition: &Precondition) -> Self {
        Self {
            backbone: BackboneCoreBuilder::from_core(&precondition.backbone),
            type_: Some(precondition.type_.clone()),
            code: Some(precondition.code.clone()),
            value: precondition.value.clone(),
        }
    }
}

const QUESTIONNAIRE_PURPOSE: FieldDef =
    FieldDef::new("purpose", Cardinality::REQUIRED, FieldKind::Element(DataType::Code)).bound(
        BindingDef {
            name: Some("ConditionQuestionnairePurpose"),
            strength: BindingStrength::Required,
            description: Some("The use of a questionnaire."),
            value_set: "http://hl7.org/fhir/ValueSet/condition-questionnaire-purpose|5.0.0",
            fixed: Some(FixedCodes {
                system: Some("http://hl7.org/fhir/condition-questionnaire-purpose"),
                codes: &["preadmit", "diff-diagnosis", "outcome"],
            }),
        },
    );
const QUESTIONNAIRE_REFERENCE: FieldDef = FieldDef::new(
    "reference",
    Cardinality::REQUIRED,
    FieldKind::Reference(&["Questionnaire"]),
);

static QUESTIONNAIRE_FIELDS: [FieldDef; 2] = [QUESTIONNAIRE_PURPOSE, QUESTIONNAIRE_REFERENCE];

pub static QUESTIONNAIRE_DEF: TypeDef = TypeDef {
    name: "ConditionDefinition.Questionnaire",
    kind: TypeKind::Backbone,
    fields: &QUESTIONNAIRE_FIELDS,
    constraints: &[],
};

/// A questionnaire that may be used in assessing the condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questionnaire {
    backbone: BackboneCore,
    purpose: Code,
    reference: Reference,
    hash_memo: HashMemo,
}

memoized_hash!(Questionnaire {
    backbone,
    purpose,
    reference
});

impl_element!(Questionnaire, backbone, |_this| true);

impl Questionnaire {
    pub fn builder() -> QuestionnaireBuilder {
        QuestionnaireBuilder::default()
    }

    pub fn to_builder(&self) -> QuestionnaireBuilder {
        QuestionnaireBuilder::from(self)
    }

    pub fn purpose(&self) -> &Code {
        &self.purpose
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }
}

impl Visitable for Questionnaire {
    fn type_def(&self) -> &'static TypeDef {
        &QUESTIONNAIRE_DEF
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.backbone.visit(children);
        children.node("purpose", Some(&self.purpose));
        children.node("reference", Some(&self.reference));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionnaireBuilder {
    backbone: BackboneCoreBuilder,
    purpose: Option<Code>,
    reference: Option<Reference>,
}

impl_element_builder!(QuestionnaireBuilder, backbone);

impl QuestionnaireBuilder {
    pub fn purpose(mut self, purpose: impl Into<Code>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn build(self) -> Result<Questionnaire> {
        let mut checks = Checks::new(QUESTIONNAIRE_DEF.name);
        let backbone = self.backbone.build(&mut checks);
        let purpose = checks.required(self.purpose, QUESTIONNAIRE_PURPOSE.name);
        checks.primitive(purpose.as_ref(), QUESTIONNAIRE_PURPOSE.name);
        checks.binding(purpose.as_ref(), &QUESTIONNAIRE_PURPOSE);
        let reference = checks.required(self.reference, QUESTIONNAIRE_REFERENCE.name);
        checks.reference(reference.as_ref(), &QUESTIONNAIRE_REFERENCE);

        let (Some(purpose), Some(reference)) = (purpose, reference) else {
            return Err(checks.into_error());
        };
        let questionnaire = Questionnaire {
            backbone,
            purpose,
            reference,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&questionnaire);
        checks.finish(questionnaire)
    }
}

impl From<&Questionnaire> for QuestionnaireBuilder {
    fn from(questionnaire: &Questionnaire) -> Self {
        Self {
            backbone: BackboneCoreBuilder::from_core(&questionnaire.backbone),
            purpose: Some(questionnaire.purpose.clone()),
            reference: Some(questionnaire.reference.clone()),
        }
    }
}

const PLAN_ROLE: FieldDef = FieldDef::new(
    "role",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::CodeableConcept),
);
const PLAN_REFERENCE: FieldDef = FieldDef::new(
    "reference",
    Cardinality::REQUIRED,
    FieldKind::Reference(&["PlanDefinition"]),
);

static PLAN_FIELDS: [FieldDef; 2] = [PLAN_ROLE, PLAN_REFERENCE];

pub static PLAN_DEF: TypeDef = TypeDef {
    name: "ConditionDefinition.Plan",
    kind: TypeKind::Backbone,
    fields: &PLAN_FIELDS,
    constraints: &[],
};

/// A plan that is appropriate for the condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    backbone: BackboneCore,
    role: Option<CodeableConcept>,
    reference: Reference,
    hash_memo: HashMemo,
}

memoized_hash!(Plan {
    backbone,
    role,
    reference
});

impl_element!(Plan, backbone, |_this| true);

impl Plan {
    pub fn builder() -> PlanBuilder {
        PlanBuilder::default()
    }

    pub fn to_builder(&self) -> PlanBuilder {
        PlanBuilder::from(self)
    }

    pub fn role(&self) -> Option<&CodeableConcept> {
        self.role.as_ref()
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }
}

impl Visitable for Plan {
    fn type_def(&self) -> &'static TypeDef {
        &PLAN_DEF
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.backbone.visit(children);
        children.node("role", self.role.as_ref());
        children.node("reference", Some(&self.reference));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    backbone: BackboneCoreBuilder,
    role: Option<CodeableConcept>,
    reference: Option<Reference>,
}

impl_element_builder!(PlanBuilder, backbone);

impl PlanBuilder {
    pub fn role(mut self, role: CodeableConcept) -> Self {
        self.role = Some(role);
        self
    }

    pub fn reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn build(self) -> Result<Plan> {
        let mut checks = Checks::new(PLAN_DEF.name);
        let backbone = self.backbone.build(&mut checks);
        let reference = checks.required(self.reference, PLAN_REFERENCE.name);
        checks.reference(reference.as_ref(), &PLAN_REFERENCE);

        let Some(reference) = reference else {
            return Err(checks.into_error());
        };
        let plan = Plan {
            backbone,
            role: self.role,
            reference,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&plan);
        checks.finish(plan)
    }
}

impl From<&Plan> for PlanBuilder {
    fn from(plan: &Plan) -> Self {
        Self {
            backbone: BackboneCoreBuilder::from_core(&plan.backbone),
            role: plan.role.clone(),
            reference: Some(plan.reference.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rule;
    use crate::resource::{DomainResource, Resource, ResourceBuilder};
    use crate::types::{Coding, Quantity};
    use crate::visitor::{walk, PathCollector};

    fn concept(code: &str) -> CodeableConcept {
        CodeableConcept::builder()
            .coding(
                Coding::builder()
                    .system("http://snomed.info/sct")
                    .code(code)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn minimal() -> ConditionDefinitionBuilder {
        ConditionDefinition::builder()
            .status("active")
            .code(concept("73211009"))
    }

    #[test]
    fn test_minimal_definition() {
        let definition = minimal().id("diabetes").build().unwrap();
        assert_eq!(definition.resource_type(), "ConditionDefinition");
        assert_eq!(Resource::id(&definition), Some("diabetes"));
        assert_eq!(definition.status().as_str(), Some("active"));
        assert!(definition.contained().is_empty());
    }

    #[test]
    fn test_version_algorithm_accepts_string() {
        let definition = minimal().version_algorithm(FhirString::from("1.2.0")).build().unwrap();
        let algorithm = definition.version_algorithm().unwrap();
        assert_eq!(algorithm.data_type(), DataType::String);
        assert_eq!(algorithm.as_str(), Some("1.2.0"));
    }

    #[test]
    fn test_version_algorithm_rejects_quantity() {
        let err = minimal()
            .version_algorithm(
                Quantity::builder()
                    .value(rust_decimal::Decimal::ONE)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap_err();
        let rule = &err
            .as_validation()
            .unwrap()
            .violation_for("versionAlgorithm")
            .unwrap()
            .rule;
        assert!(matches!(rule, Rule::ChoiceTypeNotAllowed { .. }));
    }

    #[test]
    fn test_missing_status_and_code_are_both_reported() {
        let err = ConditionDefinition::builder().build().unwrap_err();
        let validation = err.as_validation().unwrap();
        assert!(validation.cites("status"));
        assert!(validation.cites("code"));
        assert_eq!(validation.type_name, "ConditionDefinition");
    }

    #[test]
    fn test_status_outside_publication_status() {
        let err = minimal().status("final").build().unwrap_err();
        assert!(matches!(
            err.as_validation().unwrap().violation_for("status").unwrap().rule,
            Rule::CodeNotInBinding { .. }
        ));
    }

    #[test]
    fn test_team_must_reference_care_team() {
        let err = minimal()
            .team(Reference::to("CareTeam/endo"))
            .team(Reference::to("Practitioner/7"))
            .build()
            .unwrap_err();
        let validation = err.as_validation().unwrap();
        assert!(!validation.cites("team[0]"));
        assert!(validation.cites("team[1]"));
    }

    #[test]
    fn test_precondition_type_binding() {
        let ok = Precondition::builder()
            .type_("sensitive")
            .code(concept("271649006"))
            .value(concept("high"))
            .build();
        assert!(ok.is_ok());

        let err = Precondition::builder()
            .type_("likely")
            .code(concept("271649006"))
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("type"));
    }

    #[test]
    fn test_precondition_value_choice() {
        let err = Precondition::builder()
            .type_("specific")
            .code(concept("271649006"))
            .value(Boolean::from(true))
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("value"));
    }

    #[test]
    fn test_questionnaire_purpose_and_target() {
        let questionnaire = Questionnaire::builder()
            .purpose("preadmit")
            .reference(Reference::to("Questionnaire/intake"))
            .build()
            .unwrap();
        assert_eq!(questionnaire.purpose().as_str(), Some("preadmit"));

        let err = Questionnaire::builder()
            .purpose("outcome")
            .reference(Reference::to("PlanDefinition/intake"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err.as_validation().unwrap().violation_for("reference").unwrap().rule,
            Rule::ReferenceTypeNotAllowed { .. }
        ));
    }

    #[test]
    fn test_empty_observation_is_rejected() {
        let err = Observation::builder().build().unwrap_err();
        let validation = err.as_validation().unwrap();
        assert_eq!(validation.violations[0].rule, Rule::EmptyLeaf);
        assert_eq!(validation.type_name, "ConditionDefinition.Observation");
    }

    #[test]
    fn test_to_builder_append_keeps_original() {
        let plan = Plan::builder()
            .reference(Reference::to("PlanDefinition/insulin"))
            .build()
            .unwrap();
        let original = minimal().plan(plan.clone()).build().unwrap();
        let extended = original.to_builder().plan(plan).build().unwrap();

        assert_eq!(original.plan().len(), 1);
        assert_eq!(extended.plan().len(), 2);
        assert_ne!(original, extended);
    }

    #[test]
    fn test_null_list_entry_reports_index() {
        let err = minimal()
            .medications([
                Some(
                    Medication::builder()
                        .code(concept("metformin"))
                        .build()
                        .unwrap(),
                ),
                None,
            ])
            .build()
            .unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().violation_for("medication").unwrap().rule,
            Rule::NullElement { index: 1 }
        );
    }

    #[test]
    fn test_visit_order_follows_field_table() {
        let definition = minimal()
            .url("http://example.org/ConditionDefinition/diabetes")
            .precondition(
                Precondition::builder()
                    .type_("sensitive")
                    .code(concept("271649006"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let mut paths = PathCollector::new();
        walk(&definition, &mut paths);
        let paths = paths.into_paths();
        let position = |path: &str| paths.iter().position(|p| p == path).unwrap();

        assert!(position("ConditionDefinition.url") < position("ConditionDefinition.status"));
        assert!(position("ConditionDefinition.status") < position("ConditionDefinition.code"));
        assert!(
            position("ConditionDefinition.code")
                < position("ConditionDefinition.precondition[0]")
        );
        assert!(paths.contains(&"ConditionDefinition.precondition[0].type".to_string()));
    }

    #[test]
    fn test_field_table_matches_declared_order() {
        let names: Vec<&str> = CONDITION_DEFINITION.fields.iter().map(|f| f.name).collect();
        assert_eq!(names.first(), Some(&"url"));
        assert_eq!(names.last(), Some(&"plan"));
        assert_eq!(CONDITION_DEFINITION.required_fields().count(), 2);
    }
}
