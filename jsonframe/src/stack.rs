// SPDX-License-Identifier: Apache-2.0

//! Parse stack: one frame per open array or object.
//!
//! Frames sit in one contiguous buffer addressed by depth. When the buffer is
//! full it grows by a fixed step in two phases: fresh storage is allocated
//! first, with no lock held, and only the swap to the new storage happens
//! under the publication lock. A collector may run during the allocation
//! (see [`GrowHook`]) and mark the stack through the same lock, so the order
//! of the two phases must never be reversed.

use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::args::ConstructionArgs;
use crate::config::{ConfigCheck, DefaultConfig, StackConfig};
use crate::mark::{GrowHook, Marker, NoHook, Reach, Roots};
use crate::registry::TypeEntry;
use crate::value::{ClassRef, Value};
use crate::Error;

/// What the driver expects next in a frame, stored as its one-byte tag.
///
/// The stack records these but never validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Next {
    #[default]
    None = 0,
    ArrayNew = b'a',
    ArrayElement = b'e',
    ArrayComma = b',',
    HashNew = b'h',
    HashKey = b'k',
    HashColon = b':',
    HashValue = b'v',
    HashComma = b'n',
}

impl Next {
    /// Human-readable description of the expected token, for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Next::ArrayNew => "array element or close",
            Next::ArrayElement => "array element",
            Next::ArrayComma | Next::HashComma => "comma",
            Next::HashNew => "hash pair or close",
            Next::HashKey => "hash key",
            Next::HashColon => "colon",
            Next::HashValue => "hash value",
            Next::None => "nothing",
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// State of one open array or object.
#[derive(Debug)]
pub struct Frame {
    depth: usize,
    value: Option<Value>,
    key: Option<String>,
    class_name: Option<String>,
    class: Option<ClassRef>,
    args: Option<ConstructionArgs>,
    next: Next,
}

impl Frame {
    fn new(depth: usize, value: Value, next: Next) -> Self {
        Self {
            depth,
            value: Some(value),
            key: None,
            class_name: None,
            class: None,
            args: None,
            next,
        }
    }

    /// Zero-based nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn next(&self) -> Next {
        self.next
    }

    pub fn set_next(&mut self, next: Next) {
        self.next = next;
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut Value> {
        self.value.as_mut()
    }

    pub fn set_value(&mut self, value: Value) -> Option<Value> {
        self.value.replace(value)
    }

    pub fn take_value(&mut self) -> Option<Value> {
        self.value.take()
    }

    /// Key of the pair currently being read, inside a mapping.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: &str) {
        self.key = Some(key.to_owned());
    }

    pub fn take_key(&mut self) -> Option<String> {
        self.key.take()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, name: &str) {
        self.class_name = Some(name.to_owned());
    }

    pub fn class(&self) -> Option<&ClassRef> {
        self.class.as_ref()
    }

    pub fn set_class(&mut self, class: ClassRef) {
        self.class = Some(class);
    }

    pub fn args(&self) -> Option<&ConstructionArgs> {
        self.args.as_ref()
    }

    pub fn args_mut(&mut self) -> Option<&mut ConstructionArgs> {
        self.args.as_mut()
    }

    /// Start collecting attributes for `entry`, replacing any arguments already held.
    pub fn alloc_args(&mut self, entry: &Arc<TypeEntry>) -> &mut ConstructionArgs {
        self.args.insert(ConstructionArgs::allocate(entry))
    }

    /// Detach the arguments, typically right before finalizing them.
    pub fn take_args(&mut self) -> Option<ConstructionArgs> {
        self.args.take()
    }

    fn mark(&self, marker: &mut dyn Marker) {
        if let Some(value) = &self.value {
            value.walk(&mut |v| marker.mark(Reach::Value(v)));
        }
        if let Some(key) = &self.key {
            marker.mark(Reach::Key(key));
        }
        if let Some(name) = &self.class_name {
            marker.mark(Reach::ClassName(name));
        }
        if let Some(class) = &self.class {
            marker.mark(Reach::Class(class));
        }
        if let Some(args) = &self.args {
            marker.mark(Reach::Class(args.entry().class()));
            for value in args.values() {
                value.walk(&mut |v| marker.mark(Reach::Value(v)));
            }
        }
    }
}

/// Growable stack of [`Frame`]s, addressed by depth.
///
/// Frames must be re-addressed by depth after any push: growth moves every frame
/// to new storage.
#[derive(Debug)]
pub struct ParseStack<C: StackConfig = DefaultConfig> {
    frames: Vec<Frame>,
    publish: Mutex<()>,
    _config: core::marker::PhantomData<C>,
}

impl ParseStack<DefaultConfig> {
    /// Stack with room for 64 frames, growing 64 at a time.
    pub fn new() -> Self {
        Self::with_config()
    }
}

impl Default for ParseStack<DefaultConfig> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: StackConfig> ParseStack<C> {
    pub fn with_config() -> Self {
        let () = ConfigCheck::<C>::VALID;
        Self {
            frames: Vec::with_capacity(C::BASE_CAPACITY),
            publish: Mutex::new(()),
            _config: core::marker::PhantomData,
        }
    }

    /// Push a frame holding `value`, growing storage if needed.
    pub fn push(&mut self, value: Value, next: Next) -> Result<(), Error> {
        self.push_with_hook(value, next, &mut NoHook)
    }

    /// Push a frame, letting `hook` observe the stack if storage has to grow.
    ///
    /// On [`Error::OutOfMemory`] the stack is left exactly as it was.
    pub fn push_with_hook(
        &mut self,
        value: Value,
        next: Next,
        hook: &mut dyn GrowHook,
    ) -> Result<(), Error> {
        if self.frames.len() == self.frames.capacity() {
            self.grow(hook)?;
        }
        let depth = self.frames.len();
        trace!("push depth={depth} next={}", next.describe());
        self.frames.push(Frame::new(depth, value, next));
        Ok(())
    }

    fn grow(&mut self, hook: &mut dyn GrowHook) -> Result<(), Error> {
        let old_capacity = self.frames.capacity();
        let new_capacity = old_capacity
            .checked_add(C::GROW_BY)
            .ok_or(Error::OutOfMemory)?;

        // Phase one: allocate with no lock held. The hook stands in for a
        // collection triggered by this allocation and may mark through the lock.
        let mut fresh: Vec<Frame> = Vec::new();
        fresh.try_reserve_exact(new_capacity)?;
        hook.before_publish(&*self, new_capacity);

        // Phase two: swap storage under the lock.
        let guard = self.publish.lock()?;
        fresh.append(&mut self.frames);
        let old = core::mem::replace(&mut self.frames, fresh);
        drop(guard);
        drop(old);
        debug!(
            "Parse stack grew from {old_capacity} to {} frames",
            self.frames.capacity()
        );
        Ok(())
    }

    /// Remove the top frame, dropping any arguments it still owns.
    ///
    /// Popping an empty stack is a no-op and returns `None`.
    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop();
        if let Some(frame) = &frame {
            trace!("pop depth={}", frame.depth);
        }
        frame
    }

    pub fn peek(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Second frame from the top.
    pub fn peek_parent(&self) -> Option<&Frame> {
        let depth = self.frames.len().checked_sub(2)?;
        self.frames.get(depth)
    }

    pub fn peek_parent_mut(&mut self) -> Option<&mut Frame> {
        let depth = self.frames.len().checked_sub(2)?;
        self.frames.get_mut(depth)
    }

    pub fn get(&self, depth: usize) -> Option<&Frame> {
        self.frames.get(depth)
    }

    pub fn get_mut(&mut self, depth: usize) -> Option<&mut Frame> {
        self.frames.get_mut(depth)
    }

    /// Number of live frames, which is the current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames the current storage holds before it has to grow.
    pub fn capacity(&self) -> usize {
        self.frames.capacity()
    }

    /// Live frames, bottom first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Value of the root frame.
    pub fn head_value(&self) -> Option<&Value> {
        self.frames.first().and_then(Frame::value)
    }

    /// Discard every frame and pending argument buffer, returning to base capacity.
    pub fn clear(&mut self) {
        debug!("Clearing parse stack at depth {}", self.frames.len());
        self.frames.clear();
        self.frames.shrink_to(C::BASE_CAPACITY);
    }

    /// Visit every value, key, class and construction slot reachable from live frames.
    pub fn mark(&self, marker: &mut impl Marker) -> Result<(), Error> {
        self.visit_roots(marker)
    }
}

impl<C: StackConfig> Roots for ParseStack<C> {
    fn visit_roots(&self, marker: &mut dyn Marker) -> Result<(), Error> {
        let _guard = self.publish.lock()?;
        for frame in &self.frames {
            frame.mark(marker);
        }
        Ok(())
    }
}
