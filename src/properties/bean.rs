/// Annotated members of a task object
///
/// Rust has no runtime reflection, so a type takes part in annotation
/// discovery by listing its members, with their markers, through [`Bean`].
use std::fmt;
use std::sync::Arc;

use crate::properties::{AnnotationKind, PropertyMetadata};
use crate::value::LazyValue;

/// An object whose members can be discovered as task properties
///
/// `properties` is called on every traversal and must list members in a
/// stable declaration order. Member values should be deferred when they
/// depend on state that can change after configuration.
pub trait Bean: Send + Sync {
    fn properties(&self) -> Vec<BeanProperty>;
}

/// Value of a discovered member
#[derive(Clone)]
pub enum MemberValue {
    Value(LazyValue),
    /// A nested bean; `None` when the member is unset
    Bean(Option<Arc<dyn Bean>>),
}

impl fmt::Debug for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Value(value) => write!(f, "{:?}", value),
            MemberValue::Bean(Some(_)) => write!(f, "Bean(*)"),
            MemberValue::Bean(None) => write!(f, "Bean(null)"),
        }
    }
}

/// A single member as reported by [`Bean::properties`]
#[derive(Debug, Clone)]
pub struct BeanProperty {
    pub name: String,
    pub metadata: PropertyMetadata,
    pub value: MemberValue,
}

impl BeanProperty {
    pub fn new(name: impl Into<String>, metadata: PropertyMetadata, value: LazyValue) -> Self {
        Self {
            name: name.into(),
            metadata,
            value: MemberValue::Value(value),
        }
    }

    pub fn nested(name: impl Into<String>, bean: Option<Arc<dyn Bean>>) -> Self {
        Self {
            name: name.into(),
            metadata: PropertyMetadata::new(AnnotationKind::Nested),
            value: MemberValue::Bean(bean),
        }
    }

    pub fn optional_nested(name: impl Into<String>, bean: Option<Arc<dyn Bean>>) -> Self {
        Self {
            name: name.into(),
            metadata: PropertyMetadata::new(AnnotationKind::Nested).optional(),
            value: MemberValue::Bean(bean),
        }
    }
}
