//! Builder plumbing shared by every node type
//!
//! Builders are plain owned values: setters consume and return the builder,
//! `build()` consumes it and runs the checks. Repeating fields are staged as
//! [`Repeated`], which may hold absent elements until `build()` rejects them.

use crate::element::{BackboneCore, ElementCore};
use crate::types::Extension;
use crate::validation::Checks;

/// Staged contents of a repeating field
#[derive(Debug, Clone, PartialEq)]
pub struct Repeated<T>(Vec<Option<T>>);

impl<T> Default for Repeated<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Repeated<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<T>] {
        &self.0
    }

    pub(crate) fn push(&mut self, value: impl Into<Option<T>>) {
        self.0.push(value.into());
    }

    pub(crate) fn extend<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Option<T>>,
    {
        self.0.extend(values.into_iter().map(Into::into));
    }

    pub(crate) fn replace<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Option<T>>,
    {
        self.0.clear();
        self.extend(values);
    }

    /// The present elements, in order
    pub(crate) fn into_present(self) -> Vec<T> {
        self.0.into_iter().flatten().collect()
    }
}

impl<T: Clone> From<&[T]> for Repeated<T> {
    fn from(values: &[T]) -> Self {
        Self(values.iter().cloned().map(Some).collect())
    }
}

/// Append-one, append-many and replace setters for a repeating field
macro_rules! repeated_setters {
    ($field:ident: $ty:ty => $one:ident, $many:ident, $set:ident) => {
        /// Append a value; `None` is staged and rejected by `build()`
        pub fn $one(mut self, value: impl Into<Option<$ty>>) -> Self {
            self.$field.push(value);
            self
        }

        pub fn $many<I>(mut self, values: I) -> Self
        where
            I: IntoIterator,
            I::Item: Into<Option<$ty>>,
        {
            self.$field.extend(values);
            self
        }

        /// Replace the staged contents
        pub fn $set<I>(mut self, values: I) -> Self
        where
            I: IntoIterator,
            I::Item: Into<Option<$ty>>,
        {
            self.$field.replace(values);
            self
        }
    };
}

pub(crate) use repeated_setters;

#[derive(Debug, Clone, Default)]
pub struct ElementCoreBuilder {
    id: Option<String>,
    extension: Repeated<Extension>,
}

impl ElementCoreBuilder {
    pub(crate) fn from_core(core: &ElementCore) -> Self {
        Self {
            id: core.id.clone(),
            extension: Repeated::from(core.extension.as_slice()),
        }
    }

    pub(crate) fn build(self, checks: &mut Checks) -> ElementCore {
        ElementCore {
            id: self.id,
            extension: checks.list(self.extension, "extension"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackboneCoreBuilder {
    pub(crate) element: ElementCoreBuilder,
    modifier_extension: Repeated<Extension>,
}

impl BackboneCoreBuilder {
    pub(crate) fn from_core(core: &BackboneCore) -> Self {
        Self {
            element: ElementCoreBuilder::from_core(&core.element),
            modifier_extension: Repeated::from(core.modifier_extension.as_slice()),
        }
    }

    pub(crate) fn build(self, checks: &mut Checks) -> BackboneCore {
        BackboneCore {
            element: self.element.build(checks),
            modifier_extension: checks.list(self.modifier_extension, "modifierExtension"),
        }
    }
}

/// Setters for the fields every element inherits
pub trait ElementBuilder: Sized {
    #[doc(hidden)]
    fn element_core_mut(&mut self) -> &mut ElementCoreBuilder;

    fn id(mut self, id: impl Into<String>) -> Self {
        self.element_core_mut().id = Some(id.into());
        self
    }

    fn extension(mut self, extension: impl Into<Option<Extension>>) -> Self {
        self.element_core_mut().extension.push(extension);
        self
    }

    fn extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.element_core_mut().extension.extend(extensions);
        self
    }

    fn set_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.element_core_mut().extension.replace(extensions);
        self
    }
}

pub trait BackboneElementBuilder: ElementBuilder {
    #[doc(hidden)]
    fn backbone_core_mut(&mut self) -> &mut BackboneCoreBuilder;

    fn modifier_extension(mut self, extension: impl Into<Option<Extension>>) -> Self {
        self.backbone_core_mut().modifier_extension.push(extension);
        self
    }

    fn modifier_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.backbone_core_mut().modifier_extension.extend(extensions);
        self
    }

    fn set_modifier_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Extension>>,
    {
        self.backbone_core_mut().modifier_extension.replace(extensions);
        self
    }
}

macro_rules! impl_element_builder {
    ($ty:ty, element) => {
        impl $crate::builder::ElementBuilder for $ty {
            fn element_core_mut(&mut self) -> &mut $crate::builder::ElementCoreBuilder {
                &mut self.element
            }
        }
    };
    ($ty:ty, backbone) => {
        impl $crate::builder::ElementBuilder for $ty {
            fn element_core_mut(&mut self) -> &mut $crate::builder::ElementCoreBuilder {
                &mut self.backbone.element
            }
        }

        impl $crate::builder::BackboneElementBuilder for $ty {
            fn backbone_core_mut(&mut self) -> &mut $crate::builder::BackboneCoreBuilder {
                &mut self.backbone
            }
        }
    };
}

pub(crate) use impl_element_builder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_append_and_replace() {
        let mut staged: Repeated<u32> = Repeated::new();
        staged.push(1);
        staged.extend([Some(2), None]);
        assert_eq!(staged.as_slice(), &[Some(1), Some(2), None]);

        staged.replace([7, 8]);
        assert_eq!(staged.len(), 2);
        assert_eq!(staged.into_present(), vec![7, 8]);
    }

    #[test]
    fn test_repeated_from_slice_copies() {
        let source = vec!["a".to_string(), "b".to_string()];
        let mut staged = Repeated::from(source.as_slice());
        staged.push("c".to_string());

        assert_eq!(source.len(), 2);
        assert_eq!(staged.len(), 3);
    }
}
