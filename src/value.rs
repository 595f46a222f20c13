/// Deferred property values
///
/// A `LazyValue` holds either a fixed value or a producer that is invoked on
/// every resolution. Nothing is cached: callers that need the value more than
/// once keep the resolved copy themselves.
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{InputsError, Result};

type Producer = Arc<dyn Fn() -> anyhow::Result<Value> + Send + Sync>;

#[derive(Clone)]
enum Source {
    Fixed(Value),
    Deferred(Producer),
}

/// A property value that is only materialized when asked for
#[derive(Clone)]
pub struct LazyValue {
    source: Source,
}

impl LazyValue {
    /// Wrap an already known value
    pub fn fixed(value: impl Into<Value>) -> Self {
        Self {
            source: Source::Fixed(value.into()),
        }
    }

    /// A value that is absent
    pub fn null() -> Self {
        Self::fixed(Value::Null)
    }

    /// Defer the value to a producer, invoked on each `resolve`
    pub fn deferred<F>(producer: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            source: Source::Deferred(Arc::new(producer)),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.source, Source::Deferred(_))
    }

    /// Materialize the value, running the producer if there is one
    pub fn resolve(&self, property: &str) -> Result<Value> {
        match &self.source {
            Source::Fixed(value) => Ok(value.clone()),
            Source::Deferred(producer) => producer().map_err(|source| InputsError::Resolution {
                property: property.to_string(),
                source,
            }),
        }
    }

    /// Resolve and check the value without keeping it
    ///
    /// Null is rejected for required properties. Non-null values are passed to
    /// `check`, which returns a reason when the value is unacceptable.
    pub fn validate<F>(&self, task: &str, property: &str, optional: bool, check: F) -> Result<()>
    where
        F: FnOnce(&Value) -> Option<String>,
    {
        let value = self.resolve(property)?;

        if value.is_null() {
            if optional {
                return Ok(());
            }
            return Err(InputsError::invalid_value(
                task,
                property,
                "no value has been specified",
            ));
        }

        match check(&value) {
            Some(reason) => Err(InputsError::invalid_value(task, property, reason)),
            None => Ok(()),
        }
    }
}

impl Default for LazyValue {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Fixed(value) => write!(f, "LazyValue({})", value),
            Source::Deferred(_) => write!(f, "LazyValue(<deferred>)"),
        }
    }
}

macro_rules! impl_from_fixed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LazyValue {
                fn from(value: $ty) -> Self {
                    LazyValue::fixed(value)
                }
            }
        )*
    };
}

impl_from_fixed!(Value, &str, String, bool, i32, i64, u32, u64, f64);
