//! Composition units: reusable groups of resource declarations.
//!
//! A unit is constructed with its owning construct and any upstream deferred
//! values, then performs all of its declarations in `create_resources`,
//! returning the handle(s) downstream code may reference.

pub mod connectable_instance;
pub mod hello_stack;

use crate::core::construct::ConstructTree;
use crate::core::error::Result;

/// Contract shared by every composition unit.
pub trait CompositionUnit {
    /// Handle(s) exposed to downstream composition.
    type Output;

    fn create_resources(&self, tree: &mut ConstructTree) -> Result<Self::Output>;
}
