/// Builders returned by declarations
///
/// A builder refines the property it was returned for. It borrows the
/// registry, so the chain ends before anything else can touch the task.
/// Every setter goes through the task's mutation guard, since the engine can
/// lock the task while a builder is still alive.
use crate::error::{InputsError, Result};
use crate::inputs::{DeclaredFileProperty, DeclaredValueProperty, TaskInputs};
use crate::properties::{determine_normalizer_for_path_sensitivity, NormalizerKind, PathSensitivity};

/// Refines a declared input file property
pub struct FilePropertyBuilder<'a> {
    inputs: &'a mut TaskInputs,
    index: usize,
}

impl<'a> FilePropertyBuilder<'a> {
    pub(crate) fn new(inputs: &'a mut TaskInputs, index: usize) -> Self {
        Self { inputs, index }
    }

    fn property(&mut self, operation: &str) -> Result<&mut DeclaredFileProperty> {
        self.inputs.mutator.assert_mutable(operation)?;
        Ok(&mut self.inputs.file_properties[self.index])
    }

    pub fn property_name(&self) -> &str {
        &self.inputs.file_properties[self.index].name
    }

    /// Allow the property to have no value
    pub fn optional(mut self, optional: bool) -> Result<Self> {
        self.property("FilePropertyBuilder.optional(optional)")?
            .optional = optional;
        Ok(self)
    }

    /// Mark the property as a source input
    pub fn skip_when_empty(mut self, skip_when_empty: bool) -> Result<Self> {
        self.property("FilePropertyBuilder.skip_when_empty(skip_when_empty)")?
            .skip_when_empty = skip_when_empty;
        Ok(self)
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerKind) -> Result<Self> {
        self.property("FilePropertyBuilder.with_normalizer(normalizer)")?
            .normalizer = normalizer;
        Ok(self)
    }

    pub fn with_path_sensitivity(self, sensitivity: PathSensitivity) -> Result<Self> {
        self.with_normalizer(determine_normalizer_for_path_sensitivity(sensitivity))
    }

    /// Replace the generated `$N` name
    ///
    /// On a name clash the declaration this builder refines is withdrawn,
    /// leaving the registry as it was before the declaring call.
    pub fn with_property_name(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        self.property("FilePropertyBuilder.with_property_name(name)")?;

        let own = self.index;
        let taken = self
            .inputs
            .file_properties
            .iter()
            .enumerate()
            .any(|(index, property)| index != own && property.name == name);

        if taken {
            self.inputs.withdraw_last_file_property(own);
            return Err(InputsError::DuplicateProperty {
                task: self.inputs.display_name.clone(),
                property: name,
            });
        }

        self.inputs.file_properties[self.index].name = name;
        Ok(self)
    }
}

/// Refines a declared input value property
pub struct ValuePropertyBuilder<'a> {
    inputs: &'a mut TaskInputs,
    index: usize,
}

impl<'a> ValuePropertyBuilder<'a> {
    pub(crate) fn new(inputs: &'a mut TaskInputs, index: usize) -> Self {
        Self { inputs, index }
    }

    fn property(&mut self, operation: &str) -> Result<&mut DeclaredValueProperty> {
        self.inputs.mutator.assert_mutable(operation)?;
        Ok(&mut self.inputs.value_properties[self.index])
    }

    pub fn property_name(&self) -> &str {
        &self.inputs.value_properties[self.index].name
    }

    /// Allow the property to resolve to null
    pub fn optional(mut self, optional: bool) -> Result<Self> {
        self.property("ValuePropertyBuilder.optional(optional)")?
            .optional = optional;
        Ok(self)
    }
}
