// SPDX-License-Identifier: Apache-2.0

//! Registry of classes that are rebuilt from flat attribute/value pairs.
//!
//! Each [`TypeEntry`] is a construction plan: which attributes to collect, in
//! what order, and how to turn the collected values into an object. Entries are
//! appended during setup and never change afterwards, so a finished registry can
//! be shared behind an `Arc` and read from any thread.

use std::sync::Arc;

use log::{debug, trace};

use crate::builtins;
use crate::value::{ClassRef, Value};
use crate::Error;

/// Maximum number of attributes a single entry can declare.
pub const MAX_ATTRS: usize = 10;

/// Separator that follows a namespace name in a qualified class name.
const NAMESPACE_SEPARATOR: u8 = b':';

/// Factory invoked by [`Construct::Factory`] with one positional value per attribute.
pub type FactoryFn = fn(&TypeEntry, &[Value]) -> Result<Value, Error>;

/// Derives the value passed to construction from the raw value collected for an attribute.
pub type DeriveFn = fn(&Value) -> Result<Value, Error>;

/// How a finalized entry turns its collected values into an object.
#[derive(Debug, Clone)]
pub enum Construct {
    /// Allocate an instance of the entry's class and assign each collected attribute as a field.
    Allocate,
    /// Call a named factory on the allocation target with the values in attribute order.
    Factory { name: Box<str>, call: FactoryFn },
}

impl Construct {
    pub fn factory(name: &str, call: FactoryFn) -> Self {
        Construct::Factory {
            name: name.into(),
            call,
        }
    }

    /// Factory method name, or `None` for direct allocation.
    pub fn factory_name(&self) -> Option<&str> {
        match self {
            Construct::Allocate => None,
            Construct::Factory { name, .. } => Some(name),
        }
    }
}

/// One declared attribute of an entry.
#[derive(Debug, Clone)]
pub struct Attr {
    name: Box<str>,
    derive: Option<DeriveFn>,
}

impl Attr {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn derive(&self) -> Option<DeriveFn> {
        self.derive
    }
}

/// Construction plan for one class or namespace.
#[derive(Debug)]
pub struct TypeEntry {
    class: ClassRef,
    target: ClassRef,
    construct: Construct,
    attrs: Vec<Attr>,
    raw: bool,
}

impl TypeEntry {
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// The class or module that receives the construction call.
    pub fn target(&self) -> &ClassRef {
        &self.target
    }

    pub fn construct(&self) -> &Construct {
        &self.construct
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().map(Attr::name)
    }

    /// Namespace entries also match every class nested under them.
    pub fn is_module(&self) -> bool {
        self.class.is_module()
    }

    /// Raw entries receive the unparsed JSON text of their single attribute.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name() == name
    }

    /// `Foo` covers `Foo::Bar`, never `Foobar`.
    fn covers_name(&self, name: &str) -> bool {
        let prefix = self.name().as_bytes();
        let name = name.as_bytes();
        self.is_module()
            && name.len() > prefix.len()
            && name.starts_with(prefix)
            && name.get(prefix.len()) == Some(&NAMESPACE_SEPARATOR)
    }
}

impl core::fmt::Display for TypeEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {{", self.name())?;
        for (i, name) in self.attr_names().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{name}")?;
        }
        write!(f, " }}")
    }
}

/// What [`TypeRegistry::register`] does with a class name that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Accept the registration; the newest entry wins every lookup.
    #[default]
    Shadow,
    /// Refuse the registration with [`Error::DuplicateRegistration`].
    Reject,
}

/// Ordered, append-only collection of construction plans.
///
/// Lookups search newest registrations first.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: Vec<Arc<TypeEntry>>,
    policy: DuplicatePolicy,
}

impl TypeRegistry {
    /// Empty registry that shadows duplicate names.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    /// Registry pre-loaded with `Rational`, `Date`, `DateTime` and `Range`.
    pub fn with_builtins() -> Result<Self, Error> {
        let mut registry = Self::new();
        builtins::register(&mut registry)?;
        Ok(registry)
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a construction plan for `class`.
    ///
    /// `target` receives the construction and defaults to `class` itself.
    /// Fails with [`Error::InvalidRegistration`] when there are no attributes or more
    /// than [`MAX_ATTRS`], when a name is not an identifier, or when a raw entry does not
    /// declare exactly one attribute.
    pub fn register(
        &mut self,
        class: ClassRef,
        target: Option<ClassRef>,
        construct: Construct,
        attribute_names: &[&str],
        raw: bool,
    ) -> Result<Arc<TypeEntry>, Error> {
        let attrs: Vec<(&str, Option<DeriveFn>)> =
            attribute_names.iter().map(|name| (*name, None)).collect();
        self.register_with_derivations(class, target, construct, &attrs, raw)
    }

    /// Like [`register`](Self::register), with an optional derivation per attribute.
    pub fn register_with_derivations(
        &mut self,
        class: ClassRef,
        target: Option<ClassRef>,
        construct: Construct,
        attributes: &[(&str, Option<DeriveFn>)],
        raw: bool,
    ) -> Result<Arc<TypeEntry>, Error> {
        if attributes.is_empty() {
            return Err(Error::InvalidRegistration("no attributes declared"));
        }
        if attributes.len() > MAX_ATTRS {
            return Err(Error::InvalidRegistration("more than 10 attributes"));
        }
        if raw && attributes.len() != 1 {
            return Err(Error::InvalidRegistration(
                "raw entries take exactly one attribute",
            ));
        }
        if !attributes.iter().all(|(name, _)| is_name_token(name)) {
            return Err(Error::InvalidRegistration(
                "attribute names must be identifiers",
            ));
        }
        if self.policy == DuplicatePolicy::Reject && self.find_exact_name(class.name()).is_some()
        {
            return Err(Error::DuplicateRegistration);
        }

        let mut attrs = Vec::new();
        attrs.try_reserve_exact(attributes.len())?;
        attrs.extend(attributes.iter().map(|(name, derive)| Attr {
            name: (*name).into(),
            derive: *derive,
        }));
        self.entries.try_reserve(1)?;

        let entry = Arc::new(TypeEntry {
            target: target.unwrap_or_else(|| class.clone()),
            class,
            construct,
            attrs,
            raw,
        });
        debug!("Registered {entry}");
        self.entries.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Find the entry for a class handle.
    ///
    /// An entry for the same handle wins; failing that, the newest namespace entry
    /// whose name qualifies the class name.
    pub fn lookup_by_type(&self, class: &ClassRef) -> Option<&Arc<TypeEntry>> {
        let found = self
            .iter()
            .find(|entry| entry.class() == class)
            .or_else(|| self.iter().find(|entry| entry.covers_name(class.name())));
        trace!("lookup_by_type({}) -> {}", class.name(), found.is_some());
        found
    }

    /// Find the entry for a class name, exact names first, then namespace entries.
    pub fn lookup_by_name(&self, name: &str) -> Option<&Arc<TypeEntry>> {
        let found = self
            .find_exact_name(name)
            .or_else(|| self.iter().find(|entry| entry.covers_name(name)));
        trace!("lookup_by_name({name}) -> {}", found.is_some());
        found
    }

    /// Entries in search order, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeEntry>> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find_exact_name(&self, name: &str) -> Option<&Arc<TypeEntry>> {
        self.iter().find(|entry| entry.matches_name(name))
    }
}

/// Identifier with an optional trailing `?` or `!`, e.g. `exclude_end?`.
fn is_name_token(name: &str) -> bool {
    let body = name
        .strip_suffix('?')
        .or_else(|| name.strip_suffix('!'))
        .unwrap_or(name);
    let mut bytes = body.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {
            bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        _ => false,
    }
}
