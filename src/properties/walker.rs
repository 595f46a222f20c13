/// Annotation-driven discovery of bean properties
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::error::{InputsError, Result};
use crate::properties::annotations::{
    InputFilePropertyAnnotationHandler, InputPropertyAnnotationHandler,
    NoOpPropertyAnnotationHandler, OutputFilePropertyAnnotationHandler,
};
use crate::properties::{
    AnnotationKind, Bean, FilePropertyKind, MemberValue, OutputFilePropertyKind,
    PropertyAnnotationHandler, PropertyVisitor,
};

/// Walks a bean graph and reports every annotated member to a visitor
///
/// Handlers are looked up by the member's kind marker. `Nested` members are
/// descended into, with their members named `outer.inner`.
pub struct PropertyWalker {
    handlers: HashMap<AnnotationKind, Arc<dyn PropertyAnnotationHandler>>,
}

impl Default for PropertyWalker {
    fn default() -> Self {
        Self::empty()
            .with_handler(InputPropertyAnnotationHandler)
            .with_handler(InputFilePropertyAnnotationHandler::new(
                FilePropertyKind::SingleFile,
            ))
            .with_handler(InputFilePropertyAnnotationHandler::new(FilePropertyKind::FileSet))
            .with_handler(InputFilePropertyAnnotationHandler::new(
                FilePropertyKind::SingleDirectory,
            ))
            .with_handler(OutputFilePropertyAnnotationHandler::new(
                OutputFilePropertyKind::File,
            ))
            .with_handler(OutputFilePropertyAnnotationHandler::new(
                OutputFilePropertyKind::Directory,
            ))
            .with_handler(NoOpPropertyAnnotationHandler::new(AnnotationKind::Internal))
    }
}

/// Bean currently being descended into
struct Frame {
    identity: usize,
    name: String,
}

impl PropertyWalker {
    /// A walker without any handlers
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any handler for the same marker kind
    pub fn with_handler(mut self, handler: impl PropertyAnnotationHandler + 'static) -> Self {
        self.handlers
            .insert(handler.annotation_kind(), Arc::new(handler));
        self
    }

    pub fn handler(&self, kind: AnnotationKind) -> Option<&dyn PropertyAnnotationHandler> {
        self.handlers.get(&kind).map(|handler| handler.as_ref())
    }

    /// Visit every annotated member of `bean`, recursively
    ///
    /// `task` is only used to name the task in errors and logs.
    pub fn visit_properties(
        &self,
        task: &str,
        bean: &Arc<dyn Bean>,
        visitor: &mut dyn PropertyVisitor,
    ) -> Result<()> {
        let mut stack = vec![Frame {
            identity: identity_of(bean),
            name: String::new(),
        }];
        self.visit_bean(task, bean.as_ref(), None, &mut stack, visitor)
    }

    fn visit_bean(
        &self,
        task: &str,
        bean: &dyn Bean,
        prefix: Option<&str>,
        stack: &mut Vec<Frame>,
        visitor: &mut dyn PropertyVisitor,
    ) -> Result<()> {
        for property in bean.properties() {
            let name = match prefix {
                Some(prefix) => format!("{}.{}", prefix, property.name),
                None => property.name.clone(),
            };

            let Some(kind) = property.metadata.kind() else {
                trace!(task, property = %name, "skipping member without property marker");
                continue;
            };

            match (kind, &property.value) {
                (AnnotationKind::Nested, MemberValue::Bean(Some(nested))) => {
                    let identity = identity_of(nested);
                    if stack.iter().any(|frame| frame.identity == identity) {
                        let mut path: Vec<String> = stack
                            .iter()
                            .skip(1)
                            .map(|frame| frame.name.clone())
                            .collect();
                        path.push(name);
                        return Err(InputsError::CyclicPropertyGraph {
                            task: task.to_string(),
                            path,
                        });
                    }

                    stack.push(Frame {
                        identity,
                        name: name.clone(),
                    });
                    let result = self.visit_bean(task, nested.as_ref(), Some(&name), stack, visitor);
                    stack.pop();
                    result?;
                }
                (AnnotationKind::Nested, MemberValue::Bean(None)) => {
                    if !property.metadata.is_optional() {
                        return Err(InputsError::invalid_value(
                            task,
                            name,
                            "no value has been specified for nested property",
                        ));
                    }
                    trace!(task, property = %name, "skipping unset optional nested bean");
                }
                (AnnotationKind::Nested, MemberValue::Value(_)) => {
                    return Err(InputsError::invalid_value(
                        task,
                        name,
                        "nested property must hold a bean",
                    ));
                }
                (_, MemberValue::Bean(_)) => {
                    return Err(InputsError::invalid_value(
                        task,
                        name,
                        "only nested properties may hold a bean",
                    ));
                }
                (kind, MemberValue::Value(value)) => {
                    let Some(handler) = self.handlers.get(&kind) else {
                        trace!(task, property = %name, ?kind, "no handler registered");
                        continue;
                    };
                    if handler.should_visit(&*visitor) {
                        handler.visit_property_value(&name, value, &property.metadata, visitor)?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn identity_of(bean: &Arc<dyn Bean>) -> usize {
    Arc::as_ptr(bean) as *const () as usize
}
