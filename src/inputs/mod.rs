/// Task input registry
///
/// `TaskInputs` is the task-facing declaration API. It records explicitly
/// declared file and value properties and answers queries over all of a
/// task's inputs, explicit and annotation-discovered alike.
pub mod builder;
pub mod files;
mod visitors;

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub use builder::{FilePropertyBuilder, ValuePropertyBuilder};
pub use files::{FileSet, FileSetView};
pub use visitors::FilePropertySpec;

use crate::config::InputsConfig;
use crate::error::{InputsError, Result};
use crate::lifecycle::{TaskLifecycle, TaskMutator};
use crate::properties::{
    FilePropertyKind, InputFileProperty, NormalizerKind, PropertyVisitor, PropertyWalker,
};
use crate::resolver::{BaseDirResolver, FileResolver};
use crate::task::Task;
use crate::value::LazyValue;
use visitors::{
    GetInputFilesVisitor, GetInputPropertiesVisitor, HasInputsVisitor, ValidatingVisitor,
};

/// An input file property declared through [`TaskInputs`]
#[derive(Debug, Clone)]
pub struct DeclaredFileProperty {
    name: String,
    kind: FilePropertyKind,
    optional: bool,
    skip_when_empty: bool,
    normalizer: NormalizerKind,
    value: LazyValue,
}

impl DeclaredFileProperty {
    fn new(name: String, kind: FilePropertyKind, value: LazyValue) -> Self {
        Self {
            name,
            kind,
            optional: false,
            skip_when_empty: false,
            normalizer: NormalizerKind::default(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FilePropertyKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_skip_when_empty(&self) -> bool {
        self.skip_when_empty
    }

    pub fn normalizer(&self) -> NormalizerKind {
        self.normalizer
    }

    pub fn value(&self) -> &LazyValue {
        &self.value
    }
}

/// An input value property declared through [`TaskInputs`]
#[derive(Debug, Clone)]
pub struct DeclaredValueProperty {
    name: String,
    optional: bool,
    value: LazyValue,
}

impl DeclaredValueProperty {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn value(&self) -> &LazyValue {
        &self.value
    }
}

#[derive(Debug, Clone, Copy)]
enum Registration {
    File(usize),
    Value(usize),
}

/// The inputs of a single task
pub struct TaskInputs {
    task: Task,
    display_name: String,
    mutator: TaskMutator,
    walker: Arc<PropertyWalker>,
    resolver: Arc<dyn FileResolver>,
    check_existence: bool,
    file_properties: Vec<DeclaredFileProperty>,
    value_properties: Vec<DeclaredValueProperty>,
    registrations: Vec<Registration>,
}

impl TaskInputs {
    pub fn new(
        task: Task,
        lifecycle: TaskLifecycle,
        walker: Arc<PropertyWalker>,
        resolver: Arc<dyn FileResolver>,
    ) -> Self {
        let display_name = task.display_name();
        Self {
            mutator: TaskMutator::new(display_name.clone(), lifecycle),
            task,
            display_name,
            walker,
            resolver,
            check_existence: true,
            file_properties: Vec::new(),
            value_properties: Vec::new(),
            registrations: Vec::new(),
        }
    }

    /// Build the inputs of `task` with the default walker and a resolver
    /// configured from `config`
    pub fn from_config(task: Task, lifecycle: TaskLifecycle, config: &InputsConfig) -> Self {
        let resolver = BaseDirResolver::new(&config.resolver.base_dir)
            .follow_links(config.resolver.follow_links);

        Self::new(
            task,
            lifecycle,
            Arc::new(PropertyWalker::default()),
            Arc::new(resolver),
        )
        .with_existence_checks(config.validation.check_existence)
    }

    /// Whether [`TaskInputs::validate`] checks that files and directories exist
    pub fn with_existence_checks(mut self, check_existence: bool) -> Self {
        self.check_existence = check_existence;
        self
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn lifecycle(&self) -> &TaskLifecycle {
        self.mutator.lifecycle()
    }

    pub fn registered_file_properties(&self) -> &[DeclaredFileProperty] {
        &self.file_properties
    }

    pub fn registered_value_properties(&self) -> &[DeclaredValueProperty] {
        &self.value_properties
    }

    pub(crate) fn resolver(&self) -> &dyn FileResolver {
        self.resolver.as_ref()
    }

    // ******************************
    // *        Declarations        *
    // ******************************

    /// Declare a set of input files
    ///
    /// A single path is stored as that path; zero or several paths are
    /// stored as an array.
    pub fn files<I, P>(&mut self, paths: I) -> Result<FilePropertyBuilder<'_>>
    where
        I: IntoIterator<Item = P>,
        P: Into<Value>,
    {
        self.mutator.assert_mutable("TaskInputs.files(paths)")?;
        let value = unpack_varargs(paths.into_iter().map(Into::into).collect());
        Ok(self.register_file(LazyValue::fixed(value), FilePropertyKind::FileSet))
    }

    /// Declare a single input file
    pub fn file(&mut self, path: impl Into<LazyValue>) -> Result<FilePropertyBuilder<'_>> {
        self.mutator.assert_mutable("TaskInputs.file(path)")?;
        Ok(self.register_file(path.into(), FilePropertyKind::SingleFile))
    }

    /// Declare an input directory; its whole tree is an input
    pub fn dir(&mut self, path: impl Into<LazyValue>) -> Result<FilePropertyBuilder<'_>> {
        self.mutator.assert_mutable("TaskInputs.dir(path)")?;
        Ok(self.register_file(path.into(), FilePropertyKind::SingleDirectory))
    }

    /// Declare an input value
    pub fn property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<LazyValue>,
    ) -> Result<ValuePropertyBuilder<'_>> {
        self.mutator
            .assert_mutable("TaskInputs.property(name, value)")?;

        let name = name.into();
        self.ensure_value_name_available(&name)?;

        let index = self.push_value(name, value.into());
        Ok(ValuePropertyBuilder::new(self, index))
    }

    /// Declare several input values, in the order given
    ///
    /// Either every entry is registered or, on a duplicate name, none is.
    pub fn properties<I, K, V>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<LazyValue>,
    {
        self.mutator.assert_mutable("TaskInputs.properties(entries)")?;

        let entries: Vec<(String, LazyValue)> = entries
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();

        let mut seen = HashSet::new();
        for (name, _) in &entries {
            if !seen.insert(name.as_str()) {
                return Err(self.duplicate(name));
            }
            self.ensure_value_name_available(name)?;
        }

        for (name, value) in entries {
            self.push_value(name, value);
        }

        Ok(self)
    }

    fn register_file(&mut self, value: LazyValue, kind: FilePropertyKind) -> FilePropertyBuilder<'_> {
        let name = self.next_file_property_name();
        debug!(
            task = %self.display_name,
            property = %name,
            ?kind,
            operation = "inputs.declare",
            "declared input file property"
        );

        let index = self.file_properties.len();
        self.file_properties
            .push(DeclaredFileProperty::new(name, kind, value));
        self.registrations.push(Registration::File(index));

        FilePropertyBuilder::new(self, index)
    }

    /// Drop the file property at `index` if it is the most recent declaration
    fn withdraw_last_file_property(&mut self, index: usize) {
        if let Some(Registration::File(last)) = self.registrations.last() {
            if *last == index && index + 1 == self.file_properties.len() {
                self.registrations.pop();
                self.file_properties.pop();
                debug!(
                    task = %self.display_name,
                    operation = "inputs.withdraw",
                    "withdrew input file property"
                );
            }
        }
    }

    fn push_value(&mut self, name: String, value: LazyValue) -> usize {
        debug!(
            task = %self.display_name,
            property = %name,
            operation = "inputs.declare",
            "declared input property"
        );

        let index = self.value_properties.len();
        self.value_properties.push(DeclaredValueProperty {
            name,
            optional: false,
            value,
        });
        self.registrations.push(Registration::Value(index));
        index
    }

    fn next_file_property_name(&self) -> String {
        let mut counter = self.file_properties.len() + 1;
        loop {
            let name = format!("${}", counter);
            if !self.file_properties.iter().any(|p| p.name == name) {
                return name;
            }
            counter += 1;
        }
    }

    fn ensure_value_name_available(&self, name: &str) -> Result<()> {
        if self.value_properties.iter().any(|p| p.name == name) {
            return Err(self.duplicate(name));
        }
        Ok(())
    }

    fn duplicate(&self, name: &str) -> InputsError {
        InputsError::DuplicateProperty {
            task: self.display_name.clone(),
            property: name.to_string(),
        }
    }

    // ******************************
    // *         Traversal          *
    // ******************************

    /// Report the explicitly declared properties, in declaration order
    pub fn visit_registered_properties(&self, visitor: &mut dyn PropertyVisitor) -> Result<()> {
        for registration in &self.registrations {
            match *registration {
                Registration::File(index) => {
                    let property = &self.file_properties[index];
                    visitor.visit_input_file_property(InputFileProperty {
                        name: &property.name,
                        optional: property.optional,
                        skip_when_empty: property.skip_when_empty,
                        normalizer: property.normalizer,
                        value: &property.value,
                        kind: property.kind,
                    })?;
                }
                Registration::Value(index) => {
                    let property = &self.value_properties[index];
                    visitor.visit_input_property(
                        &property.name,
                        &property.value,
                        property.optional,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Report every property of the task: declared ones first, then the
    /// annotated members of the task's bean
    ///
    /// Declared properties are all inputs, so a visitor that only wants
    /// outputs sees none of them.
    pub fn visit_properties(&self, visitor: &mut dyn PropertyVisitor) -> Result<()> {
        if !visitor.visit_output_file_properties_only() {
            self.visit_registered_properties(visitor)?;
        }
        if let Some(bean) = self.task.bean() {
            self.walker
                .visit_properties(&self.display_name, bean, visitor)?;
        }
        Ok(())
    }

    // ******************************
    // *          Queries           *
    // ******************************

    /// Whether the task has any input property at all
    pub fn has_inputs(&self) -> Result<bool> {
        let mut visitor = HasInputsVisitor::default();
        self.visit_properties(&mut visitor)?;
        Ok(visitor.has_inputs())
    }

    /// All input files of the task, recomputed on each traversal
    pub fn input_files(&self) -> FileSetView<'_> {
        FileSetView::new(self, "input", false)
    }

    /// Files of skip-when-empty properties, recomputed on each traversal
    pub fn source_files(&self) -> FileSetView<'_> {
        FileSetView::new(self, "source", true)
    }

    /// Whether any input file property is marked skip-when-empty
    pub fn has_source_files(&self) -> Result<bool> {
        let mut visitor = GetInputFilesVisitor::default();
        self.visit_properties(&mut visitor)?;
        Ok(visitor.has_source_files())
    }

    /// The input file properties of the task, as the walker reports them
    pub fn file_properties(&self) -> Result<Vec<FilePropertySpec>> {
        let mut visitor = GetInputFilesVisitor::default();
        self.visit_properties(&mut visitor)?;
        Ok(visitor.into_specs())
    }

    /// Resolve every input value property
    ///
    /// A name reported twice keeps the value visited last.
    pub fn input_properties(&self) -> Result<BTreeMap<String, Value>> {
        let mut visitor = GetInputPropertiesVisitor::new(&self.display_name);
        self.visit_properties(&mut visitor)?;

        let values = visitor.into_values();
        debug!(
            task = %self.display_name,
            operation = "inputs.properties",
            count = values.len(),
            "resolved input properties"
        );
        Ok(values)
    }

    /// Check that every required property has a usable value
    ///
    /// All problems are collected before failing.
    pub fn validate(&self) -> Result<()> {
        let mut visitor =
            ValidatingVisitor::new(&self.display_name, self.resolver(), self.check_existence);
        self.visit_properties(&mut visitor)?;

        let problems = visitor.into_problems();
        if problems.is_empty() {
            debug!(task = %self.display_name, operation = "inputs.validate", status = "success");
            return Ok(());
        }

        debug!(
            task = %self.display_name,
            operation = "inputs.validate",
            status = "error",
            count = problems.len()
        );
        Err(InputsError::Validation {
            task: self.display_name.clone(),
            problems,
        })
    }
}

impl std::fmt::Debug for TaskInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskInputs")
            .field("task", &self.task)
            .field("state", &self.lifecycle().state())
            .field("file_properties", &self.file_properties)
            .field("value_properties", &self.value_properties)
            .finish()
    }
}

fn unpack_varargs(mut args: Vec<Value>) -> Value {
    if args.len() == 1 {
        return args.remove(0);
    }
    Value::Array(args)
}
