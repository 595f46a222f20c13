/// Visitors behind the `TaskInputs` queries
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{InputsError, Result};
use crate::properties::{
    FilePropertyKind, InputFileProperty, NormalizerKind, OutputFilePropertyKind, PropertyVisitor,
};
use crate::resolver::FileResolver;
use crate::value::LazyValue;

/// Summary of one input file property, as reported by a traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePropertySpec {
    pub name: String,
    pub kind: FilePropertyKind,
    pub normalizer: NormalizerKind,
    pub optional: bool,
    pub skip_when_empty: bool,
}

#[derive(Default)]
pub(super) struct HasInputsVisitor {
    found: bool,
}

impl HasInputsVisitor {
    pub(super) fn has_inputs(&self) -> bool {
        self.found
    }
}

impl PropertyVisitor for HasInputsVisitor {
    fn visit_input_file_property(&mut self, _property: InputFileProperty<'_>) -> Result<()> {
        self.found = true;
        Ok(())
    }

    fn visit_input_property(&mut self, _name: &str, _value: &LazyValue, _optional: bool) -> Result<()> {
        self.found = true;
        Ok(())
    }
}

pub(super) struct GetInputPropertiesVisitor<'a> {
    task: &'a str,
    values: BTreeMap<String, Value>,
}

impl<'a> GetInputPropertiesVisitor<'a> {
    pub(super) fn new(task: &'a str) -> Self {
        Self {
            task,
            values: BTreeMap::new(),
        }
    }

    pub(super) fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl PropertyVisitor for GetInputPropertiesVisitor<'_> {
    fn visit_input_property(&mut self, name: &str, value: &LazyValue, optional: bool) -> Result<()> {
        let resolved = value.resolve(name)?;
        if resolved.is_null() && !optional {
            return Err(InputsError::invalid_value(
                self.task,
                name,
                "no value has been specified",
            ));
        }
        self.values.insert(name.to_string(), resolved);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct GetInputFilesVisitor {
    specs: Vec<FilePropertySpec>,
    has_source_files: bool,
}

impl GetInputFilesVisitor {
    pub(super) fn has_source_files(&self) -> bool {
        self.has_source_files
    }

    pub(super) fn into_specs(self) -> Vec<FilePropertySpec> {
        self.specs
    }
}

impl PropertyVisitor for GetInputFilesVisitor {
    fn visit_input_file_property(&mut self, property: InputFileProperty<'_>) -> Result<()> {
        self.has_source_files |= property.skip_when_empty;
        self.specs.push(FilePropertySpec {
            name: property.name.to_string(),
            kind: property.kind,
            normalizer: property.normalizer,
            optional: property.optional,
            skip_when_empty: property.skip_when_empty,
        });
        Ok(())
    }
}

/// Collects every problem instead of stopping at the first
pub(super) struct ValidatingVisitor<'a> {
    task: &'a str,
    resolver: &'a dyn FileResolver,
    check_existence: bool,
    problems: Vec<String>,
}

impl<'a> ValidatingVisitor<'a> {
    pub(super) fn new(task: &'a str, resolver: &'a dyn FileResolver, check_existence: bool) -> Self {
        Self {
            task,
            resolver,
            check_existence,
            problems: Vec::new(),
        }
    }

    pub(super) fn into_problems(self) -> Vec<String> {
        self.problems
    }

    fn record(&mut self, name: &str, result: Result<()>) {
        match result {
            Ok(()) => {}
            Err(InputsError::InvalidPropertyValue { reason, .. }) => {
                self.problems.push(format!("property '{}': {}", name, reason));
            }
            Err(other) => self.problems.push(format!("property '{}': {}", name, other)),
        }
    }

    fn check_location(&self, kind: FilePropertyKind, value: &Value) -> Option<String> {
        if !self.check_existence {
            return None;
        }

        let expect_dir = match kind {
            FilePropertyKind::SingleFile => false,
            FilePropertyKind::SingleDirectory => true,
            FilePropertyKind::FileSet => return None,
        };

        let paths = match self.resolver.resolve_files(value) {
            Ok(paths) => paths,
            Err(e) => return Some(format!("{:#}", e)),
        };

        if paths.is_empty() {
            let pattern = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let noun = if expect_dir { "directory" } else { "file" };
            return Some(format!("no {} matches '{}'", noun, pattern));
        }

        paths.iter().find_map(|path| {
            if expect_dir && !path.is_dir() {
                Some(format!("directory '{}' does not exist", path.display()))
            } else if !expect_dir && !path.is_file() {
                Some(format!("file '{}' does not exist", path.display()))
            } else {
                None
            }
        })
    }
}

impl PropertyVisitor for ValidatingVisitor<'_> {
    fn visit_input_file_property(&mut self, property: InputFileProperty<'_>) -> Result<()> {
        let result = property
            .value
            .validate(self.task, property.name, property.optional, |value| {
                if property.optional {
                    None
                } else {
                    self.check_location(property.kind, value)
                }
            });
        self.record(property.name, result);
        Ok(())
    }

    fn visit_input_property(&mut self, name: &str, value: &LazyValue, optional: bool) -> Result<()> {
        let result = value.validate(self.task, name, optional, |_| None);
        self.record(name, result);
        Ok(())
    }

    fn visit_output_file_property(
        &mut self,
        name: &str,
        optional: bool,
        value: &LazyValue,
        _kind: OutputFilePropertyKind,
    ) -> Result<()> {
        let result = value.validate(self.task, name, optional, |_| None);
        self.record(name, result);
        Ok(())
    }
}
