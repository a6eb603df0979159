use crate::builder::{impl_element_builder, repeated_setters, ElementCoreBuilder, Repeated};
use crate::element::{impl_element, ElementCore};
use crate::error::Result;
use crate::hash::{memoized_hash, HashMemo};
use crate::primitive::{DateTime, Id, Uri};
use crate::schema::{Cardinality, DataType, FieldDef, FieldKind, TypeDef, TypeKind};
use crate::types::Coding;
use crate::validation::Checks;
use crate::visitor::{Children, Visitable};
use std::any::Any;

const VERSION_ID: FieldDef =
    FieldDef::new("versionId", Cardinality::OPTIONAL, FieldKind::Element(DataType::Id)).summary();
const LAST_UPDATED: FieldDef = FieldDef::new(
    "lastUpdated",
    Cardinality::OPTIONAL,
    FieldKind::Element(DataType::DateTime),
)
.summary();
const SOURCE: FieldDef =
    FieldDef::new("source", Cardinality::OPTIONAL, FieldKind::Element(DataType::Uri)).summary();
const PROFILE: FieldDef =
    FieldDef::new("profile", Cardinality::LIST, FieldKind::Element(DataType::Uri)).summary();
const SECURITY: FieldDef =
    FieldDef::new("security", Cardinality::LIST, FieldKind::Element(DataType::Coding)).summary();
const TAG: FieldDef =
    FieldDef::new("tag", Cardinality::LIST, FieldKind::Element(DataType::Coding)).summary();

static FIELDS: [FieldDef; 6] = [VERSION_ID, LAST_UPDATED, SOURCE, PROFILE, SECURITY, TAG];

pub static META: TypeDef = TypeDef {
    name: "Meta",
    kind: TypeKind::Complex,
    fields: &FIELDS,
    constraints: &[],
};

/// Metadata about a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    element: ElementCore,
    version_id: Option<Id>,
    last_updated: Option<DateTime>,
    source: Option<Uri>,
    profile: Vec<Uri>,
    security: Vec<Coding>,
    tag: Vec<Coding>,
    hash_memo: HashMemo,
}

memoized_hash!(Meta {
    element,
    version_id,
    last_updated,
    source,
    profile,
    security,
    tag
});

impl_element!(Meta, element, |this| this.version_id.is_some()
    || this.last_updated.is_some()
    || this.source.is_some()
    || !this.profile.is_empty()
    || !this.security.is_empty()
    || !this.tag.is_empty());

impl Meta {
    pub fn builder() -> MetaBuilder {
        MetaBuilder::default()
    }

    pub fn to_builder(&self) -> MetaBuilder {
        MetaBuilder::from(self)
    }

    pub fn version_id(&self) -> Option<&Id> {
        self.version_id.as_ref()
    }

    pub fn last_updated(&self) -> Option<&DateTime> {
        self.last_updated.as_ref()
    }

    pub fn source(&self) -> Option<&Uri> {
        self.source.as_ref()
    }

    /// Profiles the resource claims to conform to
    pub fn profile(&self) -> &[Uri] {
        &self.profile
    }

    pub fn security(&self) -> &[Coding] {
        &self.security
    }

    pub fn tag(&self) -> &[Coding] {
        &self.tag
    }
}

impl Visitable for Meta {
    fn type_def(&self) -> &'static TypeDef {
        &META
    }

    fn visit_children(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.node("versionId", self.version_id.as_ref());
        children.node("lastUpdated", self.last_updated.as_ref());
        children.node("source", self.source.as_ref());
        children.list("profile", &self.profile);
        children.list("security", &self.security);
        children.list("tag", &self.tag);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetaBuilder {
    element: ElementCoreBuilder,
    version_id: Option<Id>,
    last_updated: Option<DateTime>,
    source: Option<Uri>,
    profile: Repeated<Uri>,
    security: Repeated<Coding>,
    tag: Repeated<Coding>,
}

impl_element_builder!(MetaBuilder, element);

impl MetaBuilder {
    pub fn version_id(mut self, version_id: impl Into<Id>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    pub fn last_updated(mut self, last_updated: impl Into<DateTime>) -> Self {
        self.last_updated = Some(last_updated.into());
        self
    }

    pub fn source(mut self, source: impl Into<Uri>) -> Self {
        self.source = Some(source.into());
        self
    }

    repeated_setters!(profile: Uri => profile, profiles, set_profiles);
    repeated_setters!(security: Coding => security, securities, set_security);
    repeated_setters!(tag: Coding => tag, tags, set_tags);

    pub fn build(self) -> Result<Meta> {
        let mut checks = Checks::new(META.name);
        let element = self.element.build(&mut checks);
        checks.primitive(self.version_id.as_ref(), VERSION_ID.name);
        checks.primitive(self.last_updated.as_ref(), LAST_UPDATED.name);
        checks.primitive(self.source.as_ref(), SOURCE.name);
        let profile = checks.list(self.profile, PROFILE.name);
        checks.primitives(&profile, PROFILE.name);
        let security = checks.list(self.security, SECURITY.name);
        let tag = checks.list(self.tag, TAG.name);

        let meta = Meta {
            element,
            version_id: self.version_id,
            last_updated: self.last_updated,
            source: self.source,
            profile,
            security,
            tag,
            hash_memo: HashMemo::new(),
        };
        checks.value_or_children(&meta);
        checks.finish(meta)
    }
}

impl From<&Meta> for MetaBuilder {
    fn from(meta: &Meta) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&meta.element),
            version_id: meta.version_id.clone(),
            last_updated: meta.last_updated.clone(),
            source: meta.source.clone(),
            profile: Repeated::from(meta.profile.as_slice()),
            security: Repeated::from(meta.security.as_slice()),
            tag: Repeated::from(meta.tag.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_lists() {
        let tag = Coding::builder()
            .system("http://example.org/tags")
            .code("reviewed")
            .build()
            .unwrap();
        let meta = Meta::builder()
            .version_id("3")
            .profiles([
                Uri::from("http://example.org/StructureDefinition/a"),
                Uri::from("http://example.org/StructureDefinition/b"),
            ])
            .tag(tag)
            .build()
            .unwrap();

        assert_eq!(meta.profile().len(), 2);
        assert_eq!(meta.tag()[0].code_str(), Some("reviewed"));
        assert!(meta.security().is_empty());
    }

    #[test]
    fn test_profile_with_whitespace_reports_index() {
        let err = Meta::builder()
            .profiles([Uri::from("http://ok.org/p"), Uri::from("not a uri")])
            .build()
            .unwrap_err();
        assert!(err.as_validation().unwrap().cites("profile[1]"));
    }
}
