//! Resource and DomainResource: the shared base of every resource

use crate::builder::Repeated;
use crate::error::{Rule, Violation};
use crate::primitive::{Code, IdKind, PrimitiveKind, Uri};
use crate::resources::{ConditionDefinition, ResearchSubject};
use crate::schema::TypeDef;
use crate::types::{Extension, Meta, Narrative};
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

/// Fields every resource carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceCore {
    pub(crate) id: Option<String>,
    pub(crate) meta: Option<Meta>,
    pub(crate) implicit_rules: Option<Uri>,
    pub(crate) language: Option<Code>,
}

impl ResourceCore {
    pub(crate) fn visit(&self, children: &mut Children<'_>) {
        children.str("id", self.id.as_deref());
        children.node("meta", self.meta.as_ref());
        children.node("implicitRules", self.implicit_rules.as_ref());
        children.node("language", self.language.as_ref());
    }
}

/// Fields every domain resource carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DomainResourceCore {
    pub(crate) resource: ResourceCore,
    pub(crate) text: Option<Narrative>,
    pub(crate) contained: Vec<AnyResource>,
    pub(crate) extension: Vec<Extension>,
    pub(crate) modifier_extension: Vec<Extension>,
}

impl DomainResourceCore {
    pub(crate) fn visit(&self, children: &mut Children<'_>) {
        self.resource.visit(children);
        children.node("text", self.text.as_ref());
        children.list("contained", &self.contained);
        children.list("extension", &self.extension);
        children.list("modifierExtension", &self.modifier_extension);
    }
}

pub trait Resource: Visitable {
    fn resource_core(&self) -> &ResourceCore;

    /// Resource type name, e.g. `ResearchSubject`
    fn resource_type(&self) -> &'static str {
        self.type_def().name
    }

    /// Logical id of this resource
    fn id(&self) -> Option<&str> {
        self.resource_core().id.as_deref()
    }

    fn meta(&self) -> Option<&Meta> {
        self.resource_core().meta.as_ref()
    }

    fn implicit_rules(&self) -> Option<&Uri> {
        self.resource_core().implicit_rules.as_ref()
    }

    fn language(&self) -> Option<&Code> {
        self.resource_core().language.as_ref()
    }
}

pub trait DomainResource: Resource {
    fn domain_core(&self) -> &DomainResourceCore;

    fn text(&self) -> Option<&Narrative> {
        self.domain_core().text.as_ref()
    }

    /// Inline resources with no independent existence
    fn contained(&self) -> &[AnyResource] {
        &self.domain_core().contained
    }

    fn extension(&self) -> &[Extension] {
        &self.domain_core().extension
    }

    fn modifier_extension(&self) -> &[Extension] {
        &self.domain_core().modifier_extension
    }
}

macro_rules! impl_domain_resource {
    ($ty:ty) => {
        impl $crate::resource::Resource for $ty {
            fn resource_core(&self) -> &$crate::resource::ResourceCore {
                &self.domain.resource
            }
        }

        impl $crate::resource::DomainResource for $ty {
            fn domain_core(&self) -> &$crate::resource::DomainResourceCore {
                &self.domain
            }
        }
    };
}

pub(crate) use impl_domain_resource;

/// Any concrete resource, as held in `contained`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnyResource {
    ConditionDefinition(ConditionDefinition),
    ResearchSubject(ResearchSubject),
}

impl AnyResource {
    fn inner(&self) -> &dyn DomainResource {
        match self {
            AnyResource::ConditionDefinition(r) => r,
            AnyResource::ResearchSubject(r) => r,
        }
    }

    pub fn as_condition_definition(&self) -> Option<&ConditionDefinition> {
        match self {
            AnyResource::ConditionDefinition(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_research_subject(&self) -> Option<&ResearchSubject> {
        match self {
            AnyResource::ResearchSubject(r) => Some(r),
            _ => None,
        }
    }
}

impl From<ConditionDefinition> for AnyResource {
    fn from(resource: ConditionDefinition) -> Self {
        AnyResource::ConditionDefinition(resource)
    }
}

impl From<ResearchSubject> for AnyResource {
    fn from(resource: ResearchSubject) -> Self {
        AnyResource::ResearchSubject(resource)
    }
}

// Visitors see the concrete resource, never the wrapper.
impl Visitable for AnyResource {
    fn type_def(&self) -> &'static TypeDef {
        self.inner().type_def()
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.inner().visit_children(children)
    }

    fn as_any(&self) -> &dyn Any {
        self.inner().as_any()
    }
}

impl Resource for AnyResource {
    fn resource_core(&self) -> &ResourceCore {
        self.inner().resource_core()
    }
}

impl DomainResource for AnyResource {
    fn domain_core(&self) -> &DomainResourceCore {
        self.inner().domain_core()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceCoreBuilder {
    id: Option<String>,
    meta: Option<Meta>,
    implicit_rules: Option<Uri>,
    language: Option<Code>,
}

impl ResourceCoreBuilder {
    pub(crate) fn from_core(core: &ResourceCore) -> Self {
        Self {
            id: core.id.clone(),
            meta: core.meta.clone(),
            implicit_rules: core.implicit_rules.clone(),
            language: core.language.clone(),
        }
    }

    pub(crate) fn build(self, checks: &mut Checks) -> ResourceCore {
        if checks.config().validating {
            if let Some(id) = &self.id {
                checks.record(
                    IdKind::check(id)
                        .map_err(|reason| Violation::new("id", Rule::InvalidPrimitive { reason })),
                );
            }
        }
        checks.primitive(self.implicit_rules.as_ref(), "implicitRules");
        checks.primitive(self.language.as_ref(), "language");
        ResourceCore {
            id: self.id,
            meta: self.meta,
            implicit_rules: self.implicit_rules,
            language: self.language,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DomainResourceCoreBuilder {
    pub(crate) resource: ResourceCoreBuilder,
    text: Option<Narrative>,
    contained: Repeated<AnyResource>,
    extension: Repeated<Extension>,
    modifier_extension: Repeated<Extension>,
}

impl DomainResourceCoreBuilder {
    pub(crate) fn from_core(core: &DomainResourceCore) -> Self {
        Self {
            resource: ResourceCoreBuilder::from_core(&core.resource),
            text: core.text.clone(),
            contained: Repeated::from(core.contained.as_slice()),
            extension: Repeated::from(core.extension.as_slice()),
            modifier_extension: Repeated::from(core.modifier_extension.as_slice()),
        }
    }

    pub(crate) fn build(self, checks: &mut Checks) -> DomainResourceCore {
        DomainResourceCore {
            resource: self.resource.build(checks),
            text: self.text,
            contained: checks.list(self.contained, "contained"),
            extension: checks.list(self.extension, "extension"),
            modifier_extension: checks.list(self.modifier_extension, "modifierExtension"),
        }
    }
}

/// Setters for the fields every resource inherits
pub trait ResourceBuilder: Sized {
    #[doc(hidden)]
    fn resource_core_mut(&mut self) -> &mut ResourceCoreBuilder;

    fn id(mut self, id: impl Into<String>) -> Self {
        self.resource_core_mut().id = Some(id.into());
        self
    }

    fn meta(mut self, meta: Meta) -> Self {
        self.resource_core_mut().meta = Some(meta);
        self
    }

    fn implicit_rules(mut self, implicit_rules: impl Into<Uri>) -> Self {
        self.resource_core_mut().implicit_rules = Some(implicit_rules.into());
        self
    }

    fn language(mut self, language: impl Into<Code>) -> Self {
        self.resource_core_mut().language = Some(language.into());
        self
    }
}

pub trait DomainResourceBuilder: ResourceBuilder {
    #[doc(hidden)]
    fn domain_core_mut(&mut self) -> &mut DomainResourceCoreBuilder;

    fn text(mut self, text: Narrative) -> Self {
        self.domain_core_mut().text = Some(text);
        self
    }

    fn contained(mut self, resource: impl Into<Option<AnyResource>>) -> Self {
        self.domain_core_mut().contained.push(resource);
        self
    }

    fn contained_resources<I>(mut self, resources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<AnyResource>>,
    {
        self.domain_core_mut().contained.extend(resources);
        self
    }

    fn set_contained<I>(mut self, resources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<AnyResource>>,
    {
        self.domain_core_mut().contained.replace(resources);
        self
    }

    fn extension(mut self, extension: impl Into<Option<Extension>>) -> Self {
        self.domain_core_mut().extension.push(extension);
        self
    }

    fn extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.domain_core_mut().extension.extend(extensions);
        self
    }

    fn set_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.domain_core_mut().extension.replace(extensions);
        self
    }

    fn modifier_extension(mut self, extension: impl Into<Option<Extension>>) -> Self {
        self.domain_core_mut().modifier_extension.push(extension);
        self
    }

    fn modifier_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.domain_core_mut().modifier_extension.extend(extensions);
        self
    }

    fn set_modifier_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.domain_core_mut().modifier_extension.replace(extensions);
        self
    }
}

macro_rules! impl_domain_resource_builder {
    ($ty:ty) => {
        impl $crate::resource::ResourceBuilder for $ty {
            fn resource_core_mut(&mut self) -> &mut $crate::resource::ResourceCoreBuilder {
                &mut self.domain.resource
            }
        }

        impl $crate::resource::DomainResourceBuilder for $ty {
            fn domain_core_mut(&mut self) -> &mut $crate::resource::DomainResourceCoreBuilder {
                &mut self.domain
            }
        }
    };
}

pub(crate) use impl_domain_resource_builder;
