// SPDX-License-Identifier: Apache-2.0

use std::collections::TryReserveError;
use std::sync::PoisonError;

/// Errors produced by the parse stack, the type registry and object construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Storage for frames or registry entries could not be allocated.
    OutOfMemory,
    /// A key did not match any attribute of the active type entry.
    UnknownAttribute,
    /// A registration was malformed: bad attribute count or attribute name.
    InvalidRegistration(&'static str),
    /// A class name was registered twice while duplicates are rejected.
    DuplicateRegistration,
    /// The stack's publication lock is unusable.
    MutexFailure,
    /// Construction arguments were finalized against an entry they are not bound to.
    EntryMismatch,
    /// A factory or attribute derivation rejected one of its inputs.
    InvalidArgument(&'static str),
    /// An object closed with a class name that has no registered entry.
    UnknownClass,
    /// The driver received an event that does not fit the open frame.
    /// Carries a description of what was expected instead.
    UnexpectedEvent(&'static str),
    /// Nesting went past the configured maximum depth.
    DepthExceeded,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::MutexFailure
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidRegistration(reason) => write!(f, "Invalid registration: {reason}"),
            Error::InvalidArgument(reason) => write!(f, "Invalid argument: {reason}"),
            Error::UnexpectedEvent(expected) => write!(f, "Unexpected event, expected {expected}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}
