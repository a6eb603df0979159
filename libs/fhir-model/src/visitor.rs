//! Depth-first traversal over node trees
//!
//! Every node implements [`Visitable`] by listing its populated children in
//! declaration order (inherited fields first) through a [`Children`] sink.
//! The walk itself lives here, so the hook protocol is the same for every
//! type:
//!
//! ```text
//! pre_visit(node)                 -- false skips the node entirely
//!   visit_start(name, index, node)
//!   visit(name, index, node)      -- false skips the children only
//!     ...children...
//!   visit_end(name, index, node)
//! post_visit(node)
//! ```
//!
//! `visit_end`/`post_visit` run for every node whose `visit_start` ran.
//! Absent scalars and empty lists produce no calls; list elements carry their
//! zero-based index. Nodes are immutable and the walk only borrows them, so
//! one tree can be walked by any number of visitors at once.

use crate::schema::TypeDef;
use rust_decimal::Decimal;
use std::any::Any;
use std::fmt;

/// A node that can be walked by a [`Visitor`]
pub trait Visitable: Any + fmt::Debug + Send + Sync {
    /// Static schema of this node's type
    fn type_def(&self) -> &'static TypeDef;

    /// Feed the populated children of this node, in declaration order
    fn visit_children(&self, children: &mut Children<'_>);

    fn as_any(&self) -> &dyn Any;

    /// Walk this node as a root, named after its type
    fn accept(&self, visitor: &mut dyn Visitor)
    where
        Self: Sized,
    {
        walk(self, visitor)
    }
}

impl dyn Visitable {
    pub fn type_name(&self) -> &'static str {
        self.type_def().name
    }

    pub fn is<T: Visitable>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Visitable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A raw value reached during a walk: primitive payloads and attribute-like
/// fields such as `id` and `Extension.url`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    String(&'a str),
    Boolean(bool),
    Integer(i32),
    Decimal(&'a Decimal),
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// Hooks invoked during a walk. All hooks default to no-ops that descend.
#[allow(unused_variables)]
pub trait Visitor {
    /// Return `false` to skip this node: no further hooks fire for it
    fn pre_visit(&mut self, node: &dyn Visitable) -> bool {
        true
    }

    fn visit_start(&mut self, name: &str, index: Option<usize>, node: &dyn Visitable) {}

    /// Return `false` to skip this node's children
    fn visit(&mut self, name: &str, index: Option<usize>, node: &dyn Visitable) -> bool {
        true
    }

    fn visit_end(&mut self, name: &str, index: Option<usize>, node: &dyn Visitable) {}

    fn post_visit(&mut self, node: &dyn Visitable) {}

    /// Called before the elements of a non-empty repeating field
    fn visit_list_start(&mut self, name: &str, len: usize) {}

    fn visit_list_end(&mut self, name: &str, len: usize) {}

    /// Called for raw values inside the node currently being visited
    fn visit_value(&mut self, name: &str, value: Value<'_>) {}
}

/// Walk `root`, naming it after its type
pub fn walk(root: &dyn Visitable, visitor: &mut dyn Visitor) {
    accept(root, root.type_name(), None, visitor);
}

fn accept(node: &dyn Visitable, name: &str, index: Option<usize>, visitor: &mut dyn Visitor) {
    if !visitor.pre_visit(node) {
        return;
    }
    visitor.visit_start(name, index, node);
    if visitor.visit(name, index, node) {
        node.visit_children(&mut Children { visitor });
    }
    visitor.visit_end(name, index, node);
    visitor.post_visit(node);
}

/// Sink that nodes feed their children into
pub struct Children<'v> {
    visitor: &'v mut dyn Visitor,
}

impl Children<'_> {
    /// A scalar child; absent values produce no calls
    pub fn node<T: Visitable>(&mut self, name: &str, child: Option<&T>) {
        if let Some(child) = child {
            accept(child, name, None, self.visitor);
        }
    }

    /// A child already erased to `dyn Visitable` (choice payloads)
    pub fn dyn_node(&mut self, name: &str, child: Option<&dyn Visitable>) {
        if let Some(child) = child {
            accept(child, name, None, self.visitor);
        }
    }

    /// A repeating child; empty lists produce no calls
    pub fn list<T: Visitable>(&mut self, name: &str, children: &[T]) {
        if children.is_empty() {
            return;
        }
        self.visitor.visit_list_start(name, children.len());
        for (index, child) in children.iter().enumerate() {
            accept(child, name, Some(index), self.visitor);
        }
        self.visitor.visit_list_end(name, children.len());
    }

    pub fn value(&mut self, name: &str, value: Option<Value<'_>>) {
        if let Some(value) = value {
            self.visitor.visit_value(name, value);
        }
    }

    pub fn str(&mut self, name: &str, value: Option<&str>) {
        self.value(name, value.map(Value::String));
    }
}

/// Records the path of every node reached, e.g. `ResearchSubject.consent[1]`
#[derive(Debug, Default)]
pub struct PathCollector {
    stack: Vec<String>,
    paths: Vec<String>,
}

impl PathCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected paths in visit order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }
}

impl Visitor for PathCollector {
    fn visit_start(&mut self, name: &str, index: Option<usize>, _node: &dyn Visitable) {
        let segment = match index {
            Some(i) => format!("{}[{}]", name, i),
            None => name.to_string(),
        };
        let path = match self.stack.last() {
            Some(parent) => format!("{}.{}", parent, segment),
            None => segment,
        };
        self.paths.push(path.clone());
        self.stack.push(path);
    }

    fn visit_end(&mut self, _name: &str, _index: Option<usize>, _node: &dyn Visitable) {
        self.stack.pop();
    }
}
