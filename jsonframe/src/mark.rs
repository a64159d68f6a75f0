// SPDX-License-Identifier: Apache-2.0

//! Cooperation with the host's collector.
//!
//! Frames live in heap storage the host cannot scan, so the stack reports its
//! references explicitly: a collector walks them through [`Roots::visit_roots`],
//! and a [`GrowHook`] is told whenever the stack is about to move its storage.

use crate::value::{ClassRef, Value};
use crate::Error;

/// One reference held by a live frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reach<'a> {
    /// A frame value, a construction slot, or anything nested inside one.
    Value(&'a Value),
    /// The key of a mapping frame.
    Key(&'a str),
    /// The class name recorded on a frame.
    ClassName(&'a str),
    /// A resolved class handle.
    Class(&'a ClassRef),
}

/// Receives every reference during a mark pass.
pub trait Marker {
    fn mark(&mut self, reach: Reach<'_>);
}

impl<F> Marker for F
where
    F: FnMut(Reach<'_>),
{
    fn mark(&mut self, reach: Reach<'_>) {
        self(reach)
    }
}

/// Something that can enumerate the references it keeps alive.
pub trait Roots {
    /// Visit every reference. Fails only if the underlying lock is unusable.
    fn visit_roots(&self, marker: &mut dyn Marker) -> Result<(), Error>;
}

/// Host callback run while the stack grows.
///
/// `before_publish` runs after the new storage has been allocated and before
/// the publication lock is taken, which is the point at which a real allocator
/// may start a collection. `roots` still describes the old storage and can be
/// marked in full.
pub trait GrowHook {
    fn before_publish(&mut self, roots: &dyn Roots, new_capacity: usize);
}

/// Hook that does nothing, used by [`ParseStack::push`](crate::ParseStack::push).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHook;

impl GrowHook for NoHook {
    fn before_publish(&mut self, _roots: &dyn Roots, _new_capacity: usize) {}
}
