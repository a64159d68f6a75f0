// SPDX-License-Identifier: Apache-2.0

use jsonframe::{
    ClassRef, Construct, ConstructionArgs, DuplicatePolicy, Error, TypeRegistry, Value, MAX_ATTRS,
};
use test_log::test;

macro_rules! builtin_tests {
    ($($name:ident => $count:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_builtin_ $name:lower>]() {
                    let registry = TypeRegistry::with_builtins().unwrap();
                    let entry = registry
                        .lookup_by_name(stringify!($name))
                        .unwrap_or_else(|| panic!("{} is not registered", stringify!($name)));
                    assert_eq!(entry.name(), stringify!($name));
                    assert_eq!(entry.attr_count(), $count);
                    assert!(!entry.is_raw());
                    assert!(matches!(entry.construct(), Construct::Factory { .. }));
                    assert!(registry.lookup_by_type(entry.class()).is_some());
                }
            }
        )*
    };
}

builtin_tests! {
    Rational => 2,
    Date => 4,
    DateTime => 8,
    Range => 3,
}

#[test]
fn test_namespace_entries() {
    let mut registry = TypeRegistry::new();
    let foo = registry
        .register(
            ClassRef::module("Foo"),
            None,
            Construct::Allocate,
            &["payload"],
            false,
        )
        .unwrap();

    let nested = registry.lookup_by_name("Foo::Bar").unwrap();
    assert!(std::sync::Arc::ptr_eq(nested, &foo));
    assert!(registry.lookup_by_name("Foobar").is_none());
    assert!(registry.lookup_by_name("Fo").is_none());
    assert!(registry
        .lookup_by_type(&ClassRef::class("Foo::Deep::Leaf"))
        .is_some());
}

#[test]
fn test_exact_entry_beats_namespace() {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            ClassRef::module("Foo"),
            None,
            Construct::Allocate,
            &["a"],
            false,
        )
        .unwrap();
    let bar = registry
        .register(
            ClassRef::class("Foo::Bar"),
            None,
            Construct::Allocate,
            &["b"],
            false,
        )
        .unwrap();
    registry
        .register(
            ClassRef::module("Foo"),
            None,
            Construct::Allocate,
            &["c"],
            false,
        )
        .unwrap();

    let found = registry.lookup_by_name("Foo::Bar").unwrap();
    assert!(std::sync::Arc::ptr_eq(found, &bar));
    assert_eq!(
        registry.lookup_by_name("Foo::Baz").unwrap().attr_names().next(),
        Some("c")
    );
}

#[test]
fn test_type_identity_beats_newer_namespace() {
    let mut registry = TypeRegistry::new();
    let bar_class = ClassRef::class("Foo::Bar");
    let bar = registry
        .register(bar_class.clone(), None, Construct::Allocate, &["b"], false)
        .unwrap();
    let foo = registry
        .register(
            ClassRef::module("Foo"),
            None,
            Construct::Allocate,
            &["f"],
            false,
        )
        .unwrap();

    let found = registry.lookup_by_type(&bar_class).unwrap();
    assert!(std::sync::Arc::ptr_eq(found, &bar));

    // Same name, different handle: only the namespace entry qualifies it.
    let other_bar = ClassRef::class("Foo::Bar");
    let found = registry.lookup_by_type(&other_bar).unwrap();
    assert!(std::sync::Arc::ptr_eq(found, &foo));
}

#[test]
fn test_attribute_limit() {
    let names = [
        "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9", "a10",
    ];
    let mut registry = TypeRegistry::new();
    assert!(matches!(
        registry.register(
            ClassRef::class("Wide"),
            None,
            Construct::Allocate,
            &names,
            false
        ),
        Err(Error::InvalidRegistration(_))
    ));
    assert!(registry.is_empty());

    let entry = registry
        .register(
            ClassRef::class("Wide"),
            None,
            Construct::Allocate,
            &names[..MAX_ATTRS],
            false,
        )
        .unwrap();
    assert_eq!(entry.attr_count(), MAX_ATTRS);
}

#[test]
fn test_duplicate_policies() {
    let mut shadowing = TypeRegistry::new();
    assert_eq!(shadowing.policy(), DuplicatePolicy::Shadow);
    shadowing
        .register(ClassRef::class("P"), None, Construct::Allocate, &["x"], false)
        .unwrap();
    shadowing
        .register(ClassRef::class("P"), None, Construct::Allocate, &["y"], false)
        .unwrap();
    assert_eq!(shadowing.len(), 2);
    assert_eq!(
        shadowing.lookup_by_name("P").unwrap().attr_names().next(),
        Some("y")
    );

    let mut strict = TypeRegistry::with_policy(DuplicatePolicy::Reject);
    strict
        .register(ClassRef::class("P"), None, Construct::Allocate, &["x"], false)
        .unwrap();
    assert_eq!(
        strict
            .register(ClassRef::class("P"), None, Construct::Allocate, &["y"], false)
            .unwrap_err(),
        Error::DuplicateRegistration
    );
    assert_eq!(strict.len(), 1);
}

#[test]
fn test_date_attributes_in_declared_order() {
    let registry = TypeRegistry::with_builtins().unwrap();
    let date = registry.lookup_by_name("Date").unwrap();
    let mut args = ConstructionArgs::allocate(date);
    for (key, value) in [("day", 15), ("year", 2024), ("start", 2299161), ("month", 1)] {
        args.set_attribute(key, Value::Integer(value)).unwrap();
    }
    assert_eq!(
        args.set_attribute("foo", Value::Integer(0)),
        Err(Error::UnknownAttribute)
    );

    let value = args.finalize().unwrap();
    let object = value.as_object().unwrap();
    let fields: Vec<(&str, i64)> = object
        .fields()
        .map(|(name, value)| (name, value.as_integer().unwrap()))
        .collect();
    assert_eq!(
        fields,
        [("year", 2024), ("month", 1), ("day", 15), ("start", 2299161)]
    );
}
