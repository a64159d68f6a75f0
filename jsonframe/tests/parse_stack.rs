// SPDX-License-Identifier: Apache-2.0

use jsonframe::{
    GrowHook, Next, ParseStack, Reach, Roots, StackStruct, TypeRegistry, Value, STACK_INC,
};
use test_log::test;

/// Collects every value the stack reports while it is about to grow.
#[derive(Default)]
struct Collector {
    calls: usize,
    capacities: Vec<usize>,
    values: Vec<Value>,
    keys: Vec<String>,
}

impl GrowHook for Collector {
    fn before_publish(&mut self, roots: &dyn Roots, new_capacity: usize) {
        self.calls += 1;
        self.capacities.push(new_capacity);
        let values = &mut self.values;
        let keys = &mut self.keys;
        let mut marker = |reach: Reach<'_>| match reach {
            Reach::Value(v) => values.push(v.clone()),
            Reach::Key(k) => keys.push(k.to_owned()),
            Reach::ClassName(_) | Reach::Class(_) => {}
        };
        roots.visit_roots(&mut marker).unwrap();
    }
}

#[test]
fn test_depth_tracks_pushes_and_pops() {
    let mut stack = ParseStack::new();
    let ops = [true, true, false, true, false, false, false, false, true];
    let mut expected: usize = 0;
    for push in ops {
        if push {
            stack.push(Value::Nil, Next::None).unwrap();
            expected += 1;
        } else {
            let popped = stack.pop();
            assert_eq!(popped.is_some(), expected > 0);
            expected = expected.saturating_sub(1);
        }
        assert_eq!(stack.depth(), expected);
    }
}

#[test]
fn test_growth_preserves_frames() {
    let registry = TypeRegistry::with_builtins().unwrap();
    let date = registry.lookup_by_name("Date").unwrap();
    let mut stack = ParseStack::new();
    assert_eq!(stack.capacity(), STACK_INC);

    for i in 0..(STACK_INC as i64 + 10) {
        stack.push(Value::Hash(vec![]), Next::HashValue).unwrap();
        let frame = stack.peek_mut().unwrap();
        frame.set_value(Value::Integer(i));
        frame.set_key(&format!("key{i}"));
        if i % 2 == 0 {
            frame.set_class_name("Date");
            frame
                .alloc_args(date)
                .set_attribute("year", Value::Integer(2000 + i))
                .unwrap();
        }
    }
    assert_eq!(stack.capacity(), 2 * STACK_INC);

    for (i, frame) in stack.frames().iter().enumerate() {
        let n = i as i64;
        assert_eq!(frame.depth(), i);
        assert_eq!(frame.value(), Some(&Value::Integer(n)));
        assert_eq!(frame.key(), Some(format!("key{i}").as_str()));
        assert_eq!(frame.next(), Next::HashValue);
        if i % 2 == 0 {
            assert_eq!(frame.class_name(), Some("Date"));
            let args = frame.args().unwrap();
            assert_eq!(args.get("year"), Some(&Value::Integer(2000 + n)));
        } else {
            assert!(frame.class_name().is_none());
            assert!(frame.args().is_none());
        }
    }
}

#[test]
fn test_hook_marks_during_growth() {
    let mut stack = ParseStack::<StackStruct<4, 4>>::with_config();
    let mut hook = Collector::default();
    for i in 0..4 {
        stack
            .push_with_hook(Value::Integer(i), Next::ArrayComma, &mut hook)
            .unwrap();
        stack.peek_mut().unwrap().set_key(&format!("k{i}"));
    }
    assert_eq!(hook.calls, 0);

    stack
        .push_with_hook(Value::Integer(4), Next::ArrayComma, &mut hook)
        .unwrap();
    assert_eq!(hook.calls, 1);
    assert_eq!(hook.capacities, [8]);
    // The pass ran on the pre-growth storage: every old frame, not the new one.
    assert_eq!(
        hook.values,
        (0..4).map(Value::Integer).collect::<Vec<_>>()
    );
    assert_eq!(hook.keys, ["k0", "k1", "k2", "k3"]);
    assert_eq!(stack.depth(), 5);
    assert_eq!(stack.capacity(), 8);
}

#[test]
fn test_hook_sees_nested_values() {
    let mut stack = ParseStack::<StackStruct<1, 1>>::with_config();
    let mut hook = Collector::default();
    let nested = Value::Array(vec![Value::Hash(vec![(
        Value::from("inner"),
        Value::Integer(9),
    )])]);
    stack
        .push_with_hook(nested.clone(), Next::ArrayComma, &mut hook)
        .unwrap();
    stack
        .push_with_hook(Value::Nil, Next::ArrayNew, &mut hook)
        .unwrap();

    assert_eq!(hook.calls, 1);
    assert!(hook.values.contains(&nested));
    assert!(hook.values.contains(&Value::from("inner")));
    assert!(hook.values.contains(&Value::Integer(9)));
}

#[test]
fn test_mark_after_clear_is_empty() {
    let mut stack = ParseStack::new();
    for _ in 0..3 {
        stack.push(Value::Integer(1), Next::None).unwrap();
    }
    stack.clear();
    let mut count = 0;
    stack.mark(&mut |_: Reach<'_>| count += 1).unwrap();
    assert_eq!(count, 0);
    assert!(stack.head_value().is_none());
}
