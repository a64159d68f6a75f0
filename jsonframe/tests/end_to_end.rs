// SPDX-License-Identifier: Apache-2.0

use jsonframe::{
    ClassRef, Construct, DefaultConfig, Driver, DriverOptions, Error, Event, Rational,
    TypeRegistry, Value,
};
use test_log::test;

fn attribute<'a>(events: &mut Vec<Event<'a>>, key: &'a str, value: Value) {
    events.push(Event::Key(key));
    events.push(Event::Value(value));
}

#[test]
fn test_datetime_document() {
    let registry = TypeRegistry::with_builtins().unwrap();
    let mut events = vec![Event::StartObject];
    attribute(&mut events, "^O", Value::from("DateTime"));
    for (key, value) in [
        ("year", 2024),
        ("month", 3),
        ("day", 1),
        ("hour", 12),
        ("min", 0),
        ("sec", 30),
        ("offset", 0),
    ] {
        attribute(&mut events, key, Value::Integer(value));
    }
    events.push(Event::EndObject);
    events.push(Event::EndDocument);

    let value = Driver::parse(&registry, events).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.class().name(), "DateTime");
    assert_eq!(object.get("year"), Some(&Value::Integer(2024)));
    assert_eq!(object.get("hour"), Some(&Value::Integer(12)));
    assert_eq!(
        object.get("sec"),
        Some(&Value::Rational(Rational::from_integer(30)))
    );
    assert_eq!(object.get("start"), Some(&Value::Nil));
}

#[test]
fn test_objects_inside_arrays() {
    let registry = TypeRegistry::with_builtins().unwrap();
    let mut events = vec![Event::StartArray];
    for (begin, end) in [(1, 5), (10, 20)] {
        events.push(Event::StartObject);
        attribute(&mut events, "^O", Value::from("Range"));
        attribute(&mut events, "begin", Value::Integer(begin));
        attribute(&mut events, "end", Value::Integer(end));
        events.push(Event::EndObject);
    }
    events.push(Event::Value(Value::Nil));
    events.push(Event::EndArray);

    let value = Driver::parse(&registry, events).unwrap();
    let items = match value {
        Value::Array(items) => items,
        other => panic!("expected an array, got {other:?}"),
    };
    assert_eq!(items.len(), 3);
    let second = items[1].as_object().unwrap();
    assert_eq!(second.get("begin"), Some(&Value::Integer(10)));
    assert_eq!(second.get("exclude_end?"), Some(&Value::Bool(false)));
    assert!(items[2].is_nil());
}

#[test]
fn test_user_entry_and_custom_class_key() {
    let mut registry = TypeRegistry::with_builtins().unwrap();
    let point = ClassRef::class("Point");
    registry
        .register(point.clone(), None, Construct::Allocate, &["x", "y"], false)
        .unwrap();

    let options = DriverOptions {
        class_key: "json_class".to_owned(),
        ..DriverOptions::default()
    };
    let mut driver = Driver::<DefaultConfig>::with_options(&registry, options);
    let mut events = vec![Event::StartObject];
    attribute(&mut events, "x", Value::Integer(3));
    attribute(&mut events, "json_class", Value::from("Point"));
    attribute(&mut events, "^O", Value::from("ignored"));
    events.push(Event::EndObject);
    for event in events {
        driver.handle(event).unwrap();
    }

    let value = driver.finish().unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.class(), &point);
    assert_eq!(object.get("x"), Some(&Value::Integer(3)));
    assert_eq!(object.get("y"), None);
    assert_eq!(object.fields().count(), 1);
}

#[test]
fn test_invalid_attribute_value_aborts_parse() {
    let registry = TypeRegistry::with_builtins().unwrap();
    let mut driver = Driver::new(&registry);
    let mut events = vec![Event::StartArray, Event::StartObject];
    attribute(&mut events, "^O", Value::from("Date"));
    attribute(&mut events, "year", Value::from("2024"));
    attribute(&mut events, "month", Value::Integer(1));
    attribute(&mut events, "day", Value::Integer(1));

    for event in events {
        driver.handle(event).unwrap();
    }
    assert_eq!(driver.stack().depth(), 2);
    assert!(matches!(
        driver.handle(Event::EndObject),
        Err(Error::InvalidArgument(_))
    ));
    assert!(driver.stack().is_empty());
}
