//! Element and BackboneElement: the shared base of data types and backbones

use crate::types::Extension;
use crate::visitor::{Children, Visitable};

/// Fields every element carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementCore {
    pub(crate) id: Option<String>,
    pub(crate) extension: Vec<Extension>,
}

impl ElementCore {
    pub(crate) fn has_children(&self) -> bool {
        !self.extension.is_empty()
    }

    pub(crate) fn visit(&self, children: &mut Children<'_>) {
        children.str("id", self.id.as_deref());
        children.list("extension", &self.extension);
    }
}

/// Fields every backbone element carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackboneCore {
    pub(crate) element: ElementCore,
    pub(crate) modifier_extension: Vec<Extension>,
}

impl BackboneCore {
    pub(crate) fn has_children(&self) -> bool {
        self.element.has_children() || !self.modifier_extension.is_empty()
    }

    pub(crate) fn visit(&self, children: &mut Children<'_>) {
        self.element.visit(children);
        children.list("modifierExtension", &self.modifier_extension);
    }
}

pub trait Element: Visitable {
    fn element_core(&self) -> &ElementCore;

    /// Unique id for inter-element referencing
    fn id(&self) -> Option<&str> {
        self.element_core().id.as_deref()
    }

    fn extension(&self) -> &[Extension] {
        &self.element_core().extension
    }

    /// True for primitives holding a value
    fn has_value(&self) -> bool {
        false
    }

    /// True if any field other than `id` is populated
    fn has_children(&self) -> bool;
}

pub trait BackboneElement: Element {
    fn backbone_core(&self) -> &BackboneCore;

    /// Extensions that change the meaning of the element containing them
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone_core().modifier_extension
    }
}

/// Implements `Element` (and `BackboneElement`) for a node whose core lives in
/// `self.element` / `self.backbone`, given a has-children expression over its
/// own fields.
macro_rules! impl_element {
    ($ty:ty, element, |$this:ident| $own:expr) => {
        impl $crate::element::Element for $ty {
            fn element_core(&self) -> &$crate::element::ElementCore {
                &self.element
            }

            fn has_children(&self) -> bool {
                let $this = self;
                self.element.has_children() || $own
            }
        }
    };
    ($ty:ty, backbone, |$this:ident| $own:expr) => {
        impl $crate::element::Element for $ty {
            fn element_core(&self) -> &$crate::element::ElementCore {
                &self.backbone.element
            }

            fn has_children(&self) -> bool {
                let $this = self;
                self.backbone.has_children() || $own
            }
        }

        impl $crate::element::BackboneElement for $ty {
            fn backbone_core(&self) -> &$crate::element::BackboneCore {
                &self.backbone
            }
        }
    };
}

pub(crate) use impl_element;
