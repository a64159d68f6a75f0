// SPDX-License-Identifier: Apache-2.0

//! Attribute values collected for one object under construction.

use std::sync::Arc;

use log::debug;

use crate::registry::{Construct, TypeEntry};
use crate::value::{Object, Value};
use crate::Error;

/// Positional attribute slots bound to one [`TypeEntry`].
///
/// Each slot is either unset (`None`) or holds a value, which may itself be
/// [`Value::Nil`]. Attribute matching is a linear scan in declaration order,
/// O(attributes x key length) with at most [`MAX_ATTRS`](crate::MAX_ATTRS) attributes.
#[derive(Debug, Clone)]
pub struct ConstructionArgs {
    entry: Arc<TypeEntry>,
    slots: Box<[Option<Value>]>,
}

impl ConstructionArgs {
    /// One unset slot per attribute of `entry`.
    pub fn allocate(entry: &Arc<TypeEntry>) -> Self {
        Self {
            entry: Arc::clone(entry),
            slots: vec![None; entry.attr_count()].into_boxed_slice(),
        }
    }

    pub fn entry(&self) -> &Arc<TypeEntry> {
        &self.entry
    }

    /// Store `value` in the slot of the first attribute named exactly `key`.
    ///
    /// Returns [`Error::UnknownAttribute`] without touching any slot when no attribute matches.
    pub fn set_attribute(&mut self, key: &str, value: Value) -> Result<(), Error> {
        let index = self
            .entry
            .attr_names()
            .position(|name| name == key)
            .ok_or(Error::UnknownAttribute)?;
        let slot = self.slots.get_mut(index).ok_or(Error::UnknownAttribute)?;
        *slot = Some(value);
        Ok(())
    }

    /// Value collected for the attribute `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.entry.attr_names().position(|attr| attr == name)?;
        self.slot(index)
    }

    pub fn slot(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// All slots in declaration order.
    pub fn slots(&self) -> &[Option<Value>] {
        &self.slots
    }

    /// True once every attribute has been given a value.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Drop the collected values without constructing anything.
    pub fn release(self) {}

    /// Construct the object described by the bound entry.
    pub fn finalize(self) -> Result<Value, Error> {
        let entry = Arc::clone(&self.entry);
        finalize(&entry, self)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        self.slots.iter().flatten()
    }
}

/// Turn collected arguments into the object `entry` describes.
///
/// Unset slots are passed as [`Value::Nil`]. Attributes with a derivation
/// function have it applied to their collected value first.
pub fn finalize(entry: &Arc<TypeEntry>, args: ConstructionArgs) -> Result<Value, Error> {
    if !Arc::ptr_eq(entry, &args.entry) {
        return Err(Error::EntryMismatch);
    }
    match entry.construct().factory_name() {
        Some(factory) => debug!("Finalizing {} through {factory}", entry.name()),
        None => debug!("Finalizing {} by allocation", entry.name()),
    }

    match *entry.construct() {
        Construct::Allocate => {
            let mut object = Object::new(entry.class().clone());
            for (attr, slot) in entry.attrs().iter().zip(args.slots.into_vec()) {
                if let Some(value) = slot {
                    let value = match attr.derive() {
                        Some(derive) => derive(&value)?,
                        None => value,
                    };
                    object.set(attr.name(), value);
                }
            }
            Ok(Value::Object(object))
        }
        Construct::Factory { call, .. } => {
            let mut values = Vec::new();
            values.try_reserve_exact(entry.attr_count())?;
            for (attr, slot) in entry.attrs().iter().zip(args.slots.into_vec()) {
                let value = match (slot, attr.derive()) {
                    (Some(value), Some(derive)) => derive(&value)?,
                    (Some(value), None) => value,
                    (None, _) => Value::Nil,
                };
                values.push(value);
            }
            call(entry, &values)
        }
    }
}
