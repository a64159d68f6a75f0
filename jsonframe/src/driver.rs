// SPDX-License-Identifier: Apache-2.0

//! Reference driver that feeds structural events through the parse stack.
//!
//! The driver consumes already tokenized events, with commas and colons implied
//! by the event order. Objects carrying the class key (`"^O"` by default) are
//! collected into [`ConstructionArgs`](crate::ConstructionArgs) and finalized
//! through the registry when they close.

use log::{debug, trace, warn};

use crate::args::ConstructionArgs;
use crate::config::{DefaultConfig, StackConfig};
use crate::registry::TypeRegistry;
use crate::stack::{Frame, Next, ParseStack};
use crate::value::Value;
use crate::Error;

/// Tokenized JSON input consumed by [`Driver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    /// The start of an object (e.g., `{`).
    StartObject,
    /// The end of an object (e.g., `}`).
    EndObject,
    /// The start of an array (e.g., `[`).
    StartArray,
    /// The end of an array (e.g., `]`).
    EndArray,
    /// An object key (e.g., `"key":`).
    Key(&'a str),
    /// A scalar value: string, number, boolean or null.
    Value(Value),
    /// End of the document.
    EndDocument,
}

/// What to do with a key that names no attribute of the object being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownAttributes {
    /// Log the key and drop its value.
    #[default]
    Ignore,
    /// Fail the parse with [`Error::UnknownAttribute`].
    Error,
}

/// Driver settings.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Key whose string value names the class of the enclosing object.
    pub class_key: String,
    pub unknown_attributes: UnknownAttributes,
    /// Deepest nesting accepted, or `None` for no limit beyond memory.
    pub max_depth: Option<usize>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            class_key: "^O".to_owned(),
            unknown_attributes: UnknownAttributes::Ignore,
            max_depth: None,
        }
    }
}

/// Builds one document from a stream of [`Event`]s.
#[derive(Debug)]
pub struct Driver<'r, C: StackConfig = DefaultConfig> {
    registry: &'r TypeRegistry,
    stack: ParseStack<C>,
    options: DriverOptions,
    result: Option<Value>,
}

impl<'r> Driver<'r, DefaultConfig> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_options(registry, DriverOptions::default())
    }

    /// Build a document from `events` in one call.
    pub fn parse<'a, I>(registry: &'r TypeRegistry, events: I) -> Result<Value, Error>
    where
        I: IntoIterator<Item = Event<'a>>,
    {
        let mut driver = Self::new(registry);
        for event in events {
            driver.handle(event)?;
        }
        driver.finish()
    }
}

impl<'r, C: StackConfig> Driver<'r, C> {
    pub fn with_options(registry: &'r TypeRegistry, options: DriverOptions) -> Self {
        Self {
            registry,
            stack: ParseStack::with_config(),
            options,
            result: None,
        }
    }

    pub fn stack(&self) -> &ParseStack<C> {
        &self.stack
    }

    /// Process one event. On error the partial document is discarded.
    pub fn handle(&mut self, event: Event<'_>) -> Result<(), Error> {
        trace!("event {event:?} at depth {}", self.stack.depth());
        let result = self.dispatch(event);
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Drop every open frame and any arguments collected so far.
    pub fn abort(&mut self) {
        self.stack.clear();
        self.result = None;
    }

    /// The completed document.
    pub fn finish(self) -> Result<Value, Error> {
        if let Some(top) = self.stack.peek() {
            return Err(Error::UnexpectedEvent(top.next().describe()));
        }
        self.result.ok_or(Error::UnexpectedEvent("a value"))
    }

    fn dispatch(&mut self, event: Event<'_>) -> Result<(), Error> {
        match event {
            Event::StartObject => self.open(Value::Hash(Vec::new()), Next::HashNew),
            Event::StartArray => self.open(Value::Array(Vec::new()), Next::ArrayNew),
            Event::Key(key) => {
                let top = self.stack.peek_mut().ok_or(Error::UnexpectedEvent("nothing"))?;
                match top.next() {
                    Next::HashNew | Next::HashComma => {
                        top.set_key(key);
                        top.set_next(Next::HashColon);
                        Ok(())
                    }
                    other => Err(Error::UnexpectedEvent(other.describe())),
                }
            }
            Event::Value(value) => self.add_value(value),
            Event::EndObject => {
                let frame = self.close(&[Next::HashNew, Next::HashComma])?;
                let value = complete_object(frame)?;
                self.add_value(value)
            }
            Event::EndArray => {
                let mut frame = self.close(&[Next::ArrayNew, Next::ArrayComma])?;
                let value = frame.take_value().ok_or(Error::UnexpectedEvent("array"))?;
                self.add_value(value)
            }
            Event::EndDocument => match self.stack.peek() {
                Some(top) => Err(Error::UnexpectedEvent(top.next().describe())),
                None => Ok(()),
            },
        }
    }

    fn open(&mut self, value: Value, next: Next) -> Result<(), Error> {
        self.expect_value()?;
        if let Some(max) = self.options.max_depth {
            if self.stack.depth() >= max {
                return Err(Error::DepthExceeded);
            }
        }
        self.stack.push(value, next)
    }

    /// Pop the top frame if it is in one of the `closable` states.
    fn close(&mut self, closable: &[Next]) -> Result<Frame, Error> {
        let next = self
            .stack
            .peek()
            .map(Frame::next)
            .ok_or(Error::UnexpectedEvent("nothing"))?;
        if !closable.contains(&next) {
            return Err(Error::UnexpectedEvent(next.describe()));
        }
        self.stack.pop().ok_or(Error::UnexpectedEvent("nothing"))
    }

    /// Fail unless the stack can accept a value right now.
    fn expect_value(&self) -> Result<(), Error> {
        match self.stack.peek().map(Frame::next) {
            None if self.result.is_some() => Err(Error::UnexpectedEvent("nothing")),
            None
            | Some(Next::ArrayNew | Next::ArrayElement | Next::ArrayComma)
            | Some(Next::HashColon | Next::HashValue) => Ok(()),
            Some(other) => Err(Error::UnexpectedEvent(other.describe())),
        }
    }

    fn add_value(&mut self, value: Value) -> Result<(), Error> {
        self.expect_value()?;
        let class_key = self.options.class_key.as_str();
        let unknown = self.options.unknown_attributes;
        let registry = self.registry;

        let Some(top) = self.stack.peek_mut() else {
            self.result = Some(value);
            return Ok(());
        };

        match top.next() {
            Next::HashColon | Next::HashValue => {
                let key = top.take_key().ok_or(Error::UnexpectedEvent("hash key"))?;
                if key == class_key {
                    let name = value
                        .as_str()
                        .ok_or(Error::InvalidArgument("class name must be a string"))?;
                    start_object(top, registry, name, unknown)?;
                } else if let Some(args) = top.args_mut() {
                    set_or_skip(args, &key, value, unknown)?;
                } else if let Some(Value::Hash(pairs)) = top.value_mut() {
                    pairs.push((Value::String(key), value));
                }
                top.set_next(Next::HashComma);
            }
            _ => {
                if let Some(Value::Array(items)) = top.value_mut() {
                    items.push(value);
                }
                top.set_next(Next::ArrayComma);
            }
        }
        Ok(())
    }
}

/// Finalize a closed object frame, or hand back its plain hash.
fn complete_object(mut frame: Frame) -> Result<Value, Error> {
    if let Some(args) = frame.take_args() {
        return args.finalize();
    }
    if let Some(name) = frame.class_name() {
        debug!("No entry registered for {name}");
        return Err(Error::UnknownClass);
    }
    frame.take_value().ok_or(Error::UnexpectedEvent("hash"))
}

/// Record the class of an open object and move pairs already read into its arguments.
fn start_object(
    frame: &mut Frame,
    registry: &TypeRegistry,
    name: &str,
    unknown: UnknownAttributes,
) -> Result<(), Error> {
    if let Some(first) = frame.class_name() {
        warn!("Ignoring repeated class key {name} on {first} object");
        return Ok(());
    }
    frame.set_class_name(name);
    let Some(entry) = registry.lookup_by_name(name) else {
        return Ok(());
    };
    frame.set_class(entry.class().clone());
    let pairs = match frame.value_mut() {
        Some(Value::Hash(pairs)) => core::mem::take(pairs),
        _ => Vec::new(),
    };
    let args = frame.alloc_args(entry);
    for (key, value) in pairs {
        match key {
            Value::String(key) => set_or_skip(args, &key, value, unknown)?,
            _ => return Err(Error::InvalidArgument("attribute keys must be strings")),
        }
    }
    Ok(())
}

fn set_or_skip(
    args: &mut ConstructionArgs,
    key: &str,
    value: Value,
    unknown: UnknownAttributes,
) -> Result<(), Error> {
    match args.set_attribute(key, value) {
        Err(Error::UnknownAttribute) if unknown == UnknownAttributes::Ignore => {
            warn!(
                "Ignoring unknown attribute {key} for {}",
                args.entry().name()
            );
            Ok(())
        }
        other => other,
    }
}
