// SPDX-License-Identifier: Apache-2.0

//! Parse-state core for JSON deserializers embedded in an object runtime.
//!
//! A tokenizer-driven parser keeps one [`Frame`] per open array or object on a
//! [`ParseStack`]. Objects tagged with a registered class are rebuilt from their
//! flat attributes: the [`TypeRegistry`] supplies the construction plan, a
//! [`ConstructionArgs`] buffer collects the values, and [`finalize`] builds the
//! object.
//!
//! ```rust
//! # use jsonframe::{ConstructionArgs, Rational, TypeRegistry, Value};
//! let registry = TypeRegistry::with_builtins().unwrap();
//! let entry = registry.lookup_by_name("Rational").unwrap();
//! let mut args = ConstructionArgs::allocate(entry);
//! args.set_attribute("numerator", Value::Integer(1)).unwrap();
//! args.set_attribute("denominator", Value::Integer(2)).unwrap();
//! assert_eq!(
//!     args.finalize().unwrap(),
//!     Value::Rational(Rational::new(1, 2).unwrap())
//! );
//! ```

mod args;
pub use args::{finalize, ConstructionArgs};

mod builtins;

mod config;
pub use config::{DefaultConfig, StackConfig, StackStruct, STACK_INC};

mod driver;
pub use driver::{Driver, DriverOptions, Event, UnknownAttributes};

mod error;
pub use error::Error;

mod mark;
pub use mark::{GrowHook, Marker, NoHook, Reach, Roots};

mod registry;
pub use registry::{
    Attr, Construct, DeriveFn, DuplicatePolicy, FactoryFn, TypeEntry, TypeRegistry, MAX_ATTRS,
};

mod stack;
pub use stack::{Frame, Next, ParseStack};

mod value;
pub use value::{ClassKind, ClassRef, Object, Rational, Value};
