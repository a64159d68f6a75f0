// SPDX-License-Identifier: Apache-2.0

//! Type-level configuration for [`ParseStack`](crate::ParseStack) storage.

/// Number of frames reserved up front and added on each growth step by [`DefaultConfig`].
pub const STACK_INC: usize = 64;

/// Configuration trait for parse stack storage - defines base capacity and growth step.
pub trait StackConfig {
    /// Frames reserved when the stack is created, and kept after [`clear`](crate::ParseStack::clear).
    const BASE_CAPACITY: usize;
    /// Frames added each time the stack runs out of room. Must be non-zero.
    const GROW_BY: usize;
}

/// Default configuration: 64 frames up front, growing 64 frames at a time.
#[derive(Debug)]
pub struct DefaultConfig;

impl StackConfig for DefaultConfig {
    const BASE_CAPACITY: usize = STACK_INC;
    const GROW_BY: usize = STACK_INC;
}

/// Stack configuration with custom capacities.
///
/// Example: `StackStruct<4, 2>` starts with room for 4 frames and grows by 2.
/// ```rust
/// # use jsonframe::{ParseStack, StackStruct};
/// let stack = ParseStack::<StackStruct<4, 2>>::with_config();
/// assert_eq!(stack.capacity(), 4);
/// ```
#[derive(Debug)]
pub struct StackStruct<const BASE: usize, const GROW: usize>;

impl<const BASE: usize, const GROW: usize> StackConfig for StackStruct<BASE, GROW> {
    const BASE_CAPACITY: usize = BASE;
    const GROW_BY: usize = GROW;
}

/// Compile-time validation, evaluated once per configuration that is actually used.
pub(crate) struct ConfigCheck<C>(core::marker::PhantomData<C>);

impl<C: StackConfig> ConfigCheck<C> {
    pub(crate) const VALID: () = assert!(
        C::GROW_BY > 0,
        "StackConfig::GROW_BY must be non-zero: a full stack could never grow"
    );
}
