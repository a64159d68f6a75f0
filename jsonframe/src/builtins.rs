// SPDX-License-Identifier: Apache-2.0

//! Entries registered before any parsing begins.

use crate::registry::{Construct, DeriveFn, TypeEntry, TypeRegistry};
use crate::value::{ClassRef, Object, Rational, Value};
use crate::Error;

const DATETIME_SEC: DeriveFn = datetime_seconds;

pub(crate) fn register(registry: &mut TypeRegistry) -> Result<(), Error> {
    registry.register(
        ClassRef::class("Rational"),
        Some(ClassRef::class("Object")),
        Construct::factory("Rational", rational),
        &["numerator", "denominator"],
        false,
    )?;
    registry.register(
        ClassRef::class("Date"),
        None,
        Construct::factory("new", date),
        &["year", "month", "day", "start"],
        false,
    )?;
    registry.register_with_derivations(
        ClassRef::class("DateTime"),
        None,
        Construct::factory("new", datetime),
        &[
            ("year", None),
            ("month", None),
            ("day", None),
            ("hour", None),
            ("min", None),
            ("sec", Some(DATETIME_SEC)),
            ("offset", None),
            ("start", None),
        ],
        false,
    )?;
    registry.register(
        ClassRef::class("Range"),
        None,
        Construct::factory("new", range),
        &["begin", "end", "exclude_end?"],
        false,
    )?;
    Ok(())
}

/// Combine whole seconds with an optional fraction into one exact second count.
///
/// Accepts `sec`, an already combined rational, `[sec, fraction]` or
/// `[sec, numerator, denominator]`.
pub(crate) fn datetime_seconds(value: &Value) -> Result<Value, Error> {
    let combined = match value {
        Value::Integer(sec) => Rational::from_integer(*sec),
        Value::Rational(r) => *r,
        Value::Array(parts) => match parts.as_slice() {
            [Value::Integer(sec)] => Rational::from_integer(*sec),
            [Value::Integer(sec), Value::Rational(fraction)] => {
                Rational::from_integer(*sec).checked_add(*fraction)?
            }
            [Value::Integer(sec), Value::Integer(num), Value::Integer(den)] => {
                Rational::from_integer(*sec).checked_add(Rational::new(*num, *den)?)?
            }
            _ => return Err(Error::InvalidArgument("unsupported seconds layout")),
        },
        _ => return Err(Error::InvalidArgument("seconds must be an integer or rational")),
    };
    Ok(Value::Rational(combined))
}

/// Instance of the entry's target with each attribute assigned in declaration order.
fn instantiate(entry: &TypeEntry, values: &[Value]) -> Object {
    let mut object = Object::new(entry.target().clone());
    for (name, value) in entry.attr_names().zip(values) {
        object.set(name, value.clone());
    }
    object
}

fn require_integer(value: &Value, what: &'static str) -> Result<(), Error> {
    match value {
        Value::Integer(_) => Ok(()),
        _ => Err(Error::InvalidArgument(what)),
    }
}

fn rational(_entry: &TypeEntry, values: &[Value]) -> Result<Value, Error> {
    let numerator = match values.first() {
        Some(Value::Integer(n)) => *n,
        _ => return Err(Error::InvalidArgument("numerator must be an integer")),
    };
    let denominator = match values.get(1) {
        Some(Value::Integer(d)) => *d,
        None | Some(Value::Nil) => 1,
        _ => return Err(Error::InvalidArgument("denominator must be an integer")),
    };
    Ok(Value::Rational(Rational::new(numerator, denominator)?))
}

fn date(entry: &TypeEntry, values: &[Value]) -> Result<Value, Error> {
    for value in values.iter().take(3) {
        require_integer(value, "year, month and day must be integers")?;
    }
    Ok(Value::Object(instantiate(entry, values)))
}

fn datetime(entry: &TypeEntry, values: &[Value]) -> Result<Value, Error> {
    for value in values.iter().take(3) {
        require_integer(value, "year, month and day must be integers")?;
    }
    let mut values = values.to_vec();
    for value in values.iter_mut().skip(3).take(2) {
        match value {
            Value::Nil => *value = Value::Integer(0),
            Value::Integer(_) => {}
            _ => return Err(Error::InvalidArgument("hour and min must be integers")),
        }
    }
    if let Some(sec) = values.get_mut(5) {
        if sec.is_nil() {
            *sec = Value::Rational(Rational::from_integer(0));
        }
    }
    Ok(Value::Object(instantiate(entry, &values)))
}

fn range(entry: &TypeEntry, values: &[Value]) -> Result<Value, Error> {
    let mut values = values.to_vec();
    match values.get_mut(2) {
        Some(exclude @ Value::Nil) => *exclude = Value::Bool(false),
        Some(Value::Bool(_)) | None => {}
        Some(_) => return Err(Error::InvalidArgument("exclude_end? must be a boolean")),
    }
    Ok(Value::Object(instantiate(entry, &values)))
}
