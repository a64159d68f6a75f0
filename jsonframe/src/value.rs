// SPDX-License-Identifier: Apache-2.0

//! Host runtime values that frames hold and that type entries construct.
//!
//! This is the surface the rest of the crate consumes from the embedding runtime:
//! class handles compared by identity, and objects whose fields are read and
//! written by name.

use std::sync::Arc;

use crate::Error;

/// Whether a class handle names an instantiable class or a namespace module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Module,
}

#[derive(Debug)]
struct ClassInfo {
    name: Box<str>,
    kind: ClassKind,
}

/// Handle to a host class or module.
///
/// Handles compare by identity: two handles created separately with the same
/// name are different types, clones of one handle are the same type.
#[derive(Debug, Clone)]
pub struct ClassRef(Arc<ClassInfo>);

impl ClassRef {
    /// Create a handle for a class.
    pub fn class(name: &str) -> Self {
        Self::new(name, ClassKind::Class)
    }

    /// Create a handle for a module (namespace).
    pub fn module(name: &str) -> Self {
        Self::new(name, ClassKind::Module)
    }

    pub fn new(name: &str, kind: ClassKind) -> Self {
        ClassRef(Arc::new(ClassInfo {
            name: name.into(),
            kind,
        }))
    }

    /// Fully qualified name, e.g. `Foo::Bar`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> ClassKind {
        self.0.kind
    }

    pub fn is_module(&self) -> bool {
        self.0.kind == ClassKind::Module
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassRef {}

/// An exact fraction, always stored reduced with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Build a reduced rational. Fails on a zero denominator or on overflow while normalizing.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, Error> {
        if denominator == 0 {
            return Err(Error::InvalidArgument("zero denominator"));
        }
        if numerator == 0 {
            return Ok(Self::from_integer(0));
        }
        if numerator == denominator {
            return Ok(Self::from_integer(1));
        }
        // divisor is 2^63 only for |numerator| == |denominator| == 2^63, handled above
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs());
        let divisor =
            i64::try_from(divisor).map_err(|_| Error::InvalidArgument("rational overflow"))?;
        let (mut numerator, mut denominator) = (numerator / divisor, denominator / divisor);
        if denominator < 0 {
            numerator = numerator
                .checked_neg()
                .ok_or(Error::InvalidArgument("rational overflow"))?;
            denominator = denominator
                .checked_neg()
                .ok_or(Error::InvalidArgument("rational overflow"))?;
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// True when the denominator is 1.
    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    /// Exact sum of two rationals.
    pub fn checked_add(self, other: Rational) -> Result<Rational, Error> {
        const OVERFLOW: Error = Error::InvalidArgument("rational overflow");
        let numerator = self
            .numerator
            .checked_mul(other.denominator)
            .and_then(|a| {
                other
                    .numerator
                    .checked_mul(self.denominator)
                    .and_then(|b| a.checked_add(b))
            })
            .ok_or(OVERFLOW)?;
        let denominator = self
            .denominator
            .checked_mul(other.denominator)
            .ok_or(OVERFLOW)?;
        Rational::new(numerator, denominator)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    if a == 0 {
        1
    } else {
        a
    }
}

/// Instance of a host class with named fields, kept in assignment order.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class: ClassRef,
    fields: Vec<(Box<str>, Value)>,
}

impl Object {
    /// Allocate an instance with no fields set.
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            fields: Vec::new(),
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Read a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| &**field == name)
            .map(|(_, value)| value)
    }

    /// Write a field by name, replacing any previous value.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(field, _)| &**field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.into(), value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (&**name, value))
    }
}

/// A value owned by a frame or produced by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Mapping with keys in insertion order.
    Hash(Vec<(Value, Value)>),
    Rational(Rational),
    Object(Object),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Visit this value and everything nested inside it.
    pub(crate) fn walk(&self, visit: &mut dyn FnMut(&Value)) {
        visit(self);
        match self {
            Value::Array(items) => items.iter().for_each(|item| item.walk(visit)),
            Value::Hash(pairs) => pairs.iter().for_each(|(k, v)| {
                k.walk(visit);
                v.walk(visit);
            }),
            Value::Object(object) => object.fields.iter().for_each(|(_, v)| v.walk(visit)),
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Rational> for Value {
    fn from(r: Rational) -> Self {
        Value::Rational(r)
    }
}
