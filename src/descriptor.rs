/// KDL task descriptors
///
/// A descriptor file describes one or more tasks. The children of a `task`
/// node are the task's annotated members; a `declare` block lists explicit
/// registrations made through `TaskInputs`.
///
/// ```kdl
/// task "compileJava" {
///     input-files "source" "src/main/*.java" skip-when-empty=#true path-sensitivity="relative"
///     input "release" 17 optional=#true env="JAVA_RELEASE"
///     output-directory "destination" "build/classes"
///     nested "options" {
///         input "encoding" "UTF-8"
///     }
///     declare {
///         file "build.gradle" name="buildScript"
///         property "level" 3
///     }
/// }
/// ```
use anyhow::{anyhow, bail, Context, Result};
use kdl::{KdlDocument, KdlNode, KdlValue};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::InputsConfig;
use crate::inputs::TaskInputs;
use crate::lifecycle::TaskLifecycle;
use crate::properties::{
    AnnotationKind, Bean, BeanProperty, FilePropertyKind, PathSensitivity, PropertyMetadata,
};
use crate::task::Task;
use crate::value::LazyValue;

/// Members of a described task or nested object
#[derive(Debug, Clone, Default)]
pub struct DescribedBean {
    members: Vec<BeanProperty>,
}

impl DescribedBean {
    pub fn members(&self) -> &[BeanProperty] {
        &self.members
    }
}

impl Bean for DescribedBean {
    fn properties(&self) -> Vec<BeanProperty> {
        self.members.clone()
    }
}

/// Markers of an explicitly declared file property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    pub name: Option<String>,
    pub optional: bool,
    pub skip_when_empty: bool,
    pub path_sensitivity: Option<PathSensitivity>,
}

/// An explicit registration from a `declare` block
#[derive(Debug, Clone)]
pub enum Declaration {
    /// `file` or `dir`
    File {
        kind: FilePropertyKind,
        value: LazyValue,
        options: FileOptions,
    },
    /// `files`
    Files {
        paths: Vec<Value>,
        options: FileOptions,
    },
    /// `property`
    Property {
        name: String,
        value: LazyValue,
        optional: bool,
    },
}

impl Declaration {
    /// Register this declaration on `inputs`
    pub fn apply(&self, inputs: &mut TaskInputs) -> crate::error::Result<()> {
        match self {
            Declaration::File {
                kind,
                value,
                options,
            } => {
                let builder = match kind {
                    FilePropertyKind::SingleDirectory => inputs.dir(value.clone())?,
                    _ => inputs.file(value.clone())?,
                };
                apply_file_options(builder, options)
            }
            Declaration::Files { paths, options } => {
                let builder = inputs.files(paths.iter().cloned())?;
                apply_file_options(builder, options)
            }
            Declaration::Property {
                name,
                value,
                optional,
            } => {
                inputs
                    .property(name.clone(), value.clone())?
                    .optional(*optional)?;
                Ok(())
            }
        }
    }
}

fn apply_file_options(
    builder: crate::inputs::FilePropertyBuilder<'_>,
    options: &FileOptions,
) -> crate::error::Result<()> {
    let mut builder = builder
        .optional(options.optional)?
        .skip_when_empty(options.skip_when_empty)?;
    if let Some(sensitivity) = options.path_sensitivity {
        builder = builder.with_path_sensitivity(sensitivity)?;
    }
    if let Some(name) = &options.name {
        builder.with_property_name(name.clone())?;
    }
    Ok(())
}

/// A task as described in a descriptor file
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub name: String,
    pub bean: Arc<DescribedBean>,
    pub declarations: Vec<Declaration>,
}

impl TaskDescriptor {
    /// Build the task's inputs and apply its declarations
    pub fn into_inputs(
        self,
        lifecycle: TaskLifecycle,
        config: &InputsConfig,
    ) -> crate::error::Result<TaskInputs> {
        let task = Task::with_bean(self.name, self.bean);
        let mut inputs = TaskInputs::from_config(task, lifecycle, config);
        for declaration in &self.declarations {
            declaration.apply(&mut inputs)?;
        }
        Ok(inputs)
    }
}

/// Parse every task of a descriptor file
pub fn load_descriptors(path: &Path) -> Result<Vec<TaskDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;

    parse_descriptors(&content)
        .with_context(|| format!("Failed to parse descriptor: {}", path.display()))
}

/// Parse every task of a descriptor document
pub fn parse_descriptors(text: &str) -> Result<Vec<TaskDescriptor>> {
    let doc: KdlDocument = text
        .parse()
        .map_err(|e| anyhow!("Invalid KDL syntax: {}", e))?;

    let mut tasks: Vec<TaskDescriptor> = Vec::new();
    for node in doc.nodes() {
        if node.name().value() != "task" {
            bail!("Unknown top-level node: {}", node.name().value());
        }

        let task = parse_task(node)
            .with_context(|| format!("Failed to parse task: {}", node_label(node)))?;
        if tasks.iter().any(|t| t.name == task.name) {
            bail!("Task '{}' is described more than once", task.name);
        }
        tasks.push(task);
    }

    Ok(tasks)
}

fn parse_task(node: &KdlNode) -> Result<TaskDescriptor> {
    let name =
        get_positional_string(node, 0).ok_or_else(|| anyhow!("task requires name argument"))?;
    ensure_properties(node, &[])?;

    let mut members = Vec::new();
    let mut declarations = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "declare" {
                declarations.extend(parse_declarations(child)?);
            } else {
                members.push(
                    parse_member(child)
                        .with_context(|| format!("Failed to parse member: {}", node_label(child)))?,
                );
            }
        }
    }

    Ok(TaskDescriptor {
        name,
        bean: Arc::new(DescribedBean { members }),
        declarations,
    })
}

/// Parse a single annotated member
fn parse_member(node: &KdlNode) -> Result<BeanProperty> {
    let kind = match node.name().value() {
        "input" => AnnotationKind::Input,
        "input-file" => AnnotationKind::InputFile,
        "input-files" => AnnotationKind::InputFiles,
        "input-directory" => AnnotationKind::InputDirectory,
        "output-file" => AnnotationKind::OutputFile,
        "output-directory" => AnnotationKind::OutputDirectory,
        "internal" => AnnotationKind::Internal,
        "nested" => AnnotationKind::Nested,
        other => bail!("Unknown member kind: {}", other),
    };

    let name = get_positional_string(node, 0)
        .ok_or_else(|| anyhow!("{} requires name argument", node.name().value()))?;

    if kind == AnnotationKind::Nested {
        ensure_properties(node, &["optional"])?;
        let bean = match node.children() {
            Some(children) => {
                let mut members = Vec::new();
                for child in children.nodes() {
                    members.push(parse_member(child).with_context(|| {
                        format!("Failed to parse member: {}", node_label(child))
                    })?);
                }
                Some(Arc::new(DescribedBean { members }) as Arc<dyn Bean>)
            }
            None => None,
        };

        return Ok(if bool_property(node, "optional")? {
            BeanProperty::optional_nested(name, bean)
        } else {
            BeanProperty::nested(name, bean)
        });
    }

    ensure_properties(
        node,
        &["optional", "skip-when-empty", "path-sensitivity", "env"],
    )?;

    let mut metadata = PropertyMetadata::new(kind);
    if bool_property(node, "optional")? {
        metadata = metadata.optional();
    }
    if bool_property(node, "skip-when-empty")? {
        metadata = metadata.skip_when_empty();
    }
    if let Some(sensitivity) = path_sensitivity_property(node)? {
        metadata = metadata.path_sensitive(sensitivity);
    }

    let value = lazy_value(node, positional_values(node, 1)?)?;
    Ok(BeanProperty::new(name, metadata, value))
}

fn parse_declarations(node: &KdlNode) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();
    let Some(children) = node.children() else {
        return Ok(declarations);
    };

    for child in children.nodes() {
        let declaration = parse_declaration(child)
            .with_context(|| format!("Failed to parse declaration: {}", node_label(child)))?;
        declarations.push(declaration);
    }

    Ok(declarations)
}

fn parse_declaration(node: &KdlNode) -> Result<Declaration> {
    match node.name().value() {
        "file" | "dir" => {
            ensure_properties(
                node,
                &["name", "optional", "skip-when-empty", "path-sensitivity", "env"],
            )?;
            let kind = if node.name().value() == "dir" {
                FilePropertyKind::SingleDirectory
            } else {
                FilePropertyKind::SingleFile
            };
            Ok(Declaration::File {
                kind,
                value: lazy_value(node, positional_values(node, 0)?)?,
                options: file_options(node)?,
            })
        }

        "files" => {
            ensure_properties(
                node,
                &["name", "optional", "skip-when-empty", "path-sensitivity"],
            )?;
            Ok(Declaration::Files {
                paths: positional_values(node, 0)?,
                options: file_options(node)?,
            })
        }

        "property" => {
            ensure_properties(node, &["optional", "env"])?;
            let name = get_positional_string(node, 0)
                .ok_or_else(|| anyhow!("property requires name argument"))?;
            Ok(Declaration::Property {
                name,
                value: lazy_value(node, positional_values(node, 1)?)?,
                optional: bool_property(node, "optional")?,
            })
        }

        other => bail!("Unknown declaration: {}", other),
    }
}

fn file_options(node: &KdlNode) -> Result<FileOptions> {
    Ok(FileOptions {
        name: string_property(node, "name")?,
        optional: bool_property(node, "optional")?,
        skip_when_empty: bool_property(node, "skip-when-empty")?,
        path_sensitivity: path_sensitivity_property(node)?,
    })
}

/// Build the value of a member or declaration
///
/// With `env`, the value is read from that environment variable on every
/// resolution, falling back to the positional value when it is unset.
fn lazy_value(node: &KdlNode, positionals: Vec<Value>) -> Result<LazyValue> {
    let fallback = collapse(positionals);

    match string_property(node, "env")? {
        Some(variable) => Ok(LazyValue::deferred(move || {
            Ok(std::env::var(&variable)
                .map(Value::String)
                .unwrap_or_else(|_| fallback.clone()))
        })),
        None => Ok(LazyValue::fixed(fallback)),
    }
}

/// One value stays scalar, none is null, several form an array
fn collapse(mut values: Vec<Value>) -> Value {
    match values.len() {
        0 => Value::Null,
        1 => values.remove(0),
        _ => Value::Array(values),
    }
}

/// Get positional string argument from KDL node
fn get_positional_string(node: &KdlNode, index: usize) -> Option<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none()) // Only positional args
        .nth(index)
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Positional arguments from `skip` onwards, as JSON values
fn positional_values(node: &KdlNode, skip: usize) -> Result<Vec<Value>> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .skip(skip)
        .map(|e| to_json(e.value()))
        .collect()
}

fn to_json(value: &KdlValue) -> Result<Value> {
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s.to_string()));
    }
    if let Some(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Some(i) = value.as_integer() {
        let i = i64::try_from(i).map_err(|_| anyhow!("Integer out of range: {}", i))?;
        return Ok(Value::from(i));
    }
    if let Some(f) = value.as_float() {
        return serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| anyhow!("Unsupported float: {}", f));
    }
    Ok(Value::Null)
}

fn ensure_properties(node: &KdlNode, allowed: &[&str]) -> Result<()> {
    for entry in node.entries() {
        if let Some(key) = entry.name() {
            if !allowed.contains(&key.value()) {
                bail!("Unknown property '{}' on {}", key.value(), node.name().value());
            }
        }
    }
    Ok(())
}

fn bool_property(node: &KdlNode, key: &str) -> Result<bool> {
    match node.get(key) {
        None => Ok(false),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| anyhow!("{} must be a boolean", key)),
    }
}

fn string_property(node: &KdlNode, key: &str) -> Result<Option<String>> {
    match node.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_string()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| anyhow!("{} must be a string", key)),
    }
}

fn path_sensitivity_property(node: &KdlNode) -> Result<Option<PathSensitivity>> {
    match string_property(node, "path-sensitivity")? {
        Some(value) => Ok(Some(value.parse::<PathSensitivity>()?)),
        None => Ok(None),
    }
}

fn node_label(node: &KdlNode) -> String {
    match get_positional_string(node, 0) {
        Some(name) => format!("{} \"{}\"", node.name().value(), name),
        None => node.name().value().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::MemberValue;
    use serde_json::json;

    #[test]
    fn test_parse_members() {
        let kdl = r#"
            task "compileJava" {
                input-files "source" "src/main/*.java" skip-when-empty=#true path-sensitivity="relative"
                input "release" 17 optional=#true
                input "flags" "-g" "-Xlint"
                output-directory "destination" "build/classes"
                internal "verbose" #true
            }
        "#;
        let tasks = parse_descriptors(kdl).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "compileJava");

        let members = tasks[0].bean.members();
        assert_eq!(members.len(), 5);

        assert_eq!(members[0].name, "source");
        assert_eq!(members[0].metadata.kind(), Some(AnnotationKind::InputFiles));
        assert!(members[0].metadata.is_skip_when_empty());
        assert_eq!(
            members[0].metadata.path_sensitivity(),
            Some(PathSensitivity::Relative)
        );

        assert!(members[1].metadata.is_optional());
        match &members[1].value {
            MemberValue::Value(value) => assert_eq!(value.resolve("release").unwrap(), json!(17)),
            other => panic!("unexpected member value: {:?}", other),
        }
        match &members[2].value {
            MemberValue::Value(value) => {
                assert_eq!(value.resolve("flags").unwrap(), json!(["-g", "-Xlint"]))
            }
            other => panic!("unexpected member value: {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested() {
        let kdl = r#"
            task "test" {
                nested "options" {
                    input "debug" #true
                }
                nested "reports" optional=#true
            }
        "#;
        let tasks = parse_descriptors(kdl).unwrap();
        let members = tasks[0].bean.members();

        assert!(matches!(members[0].value, MemberValue::Bean(Some(_))));
        assert!(!members[0].metadata.is_optional());
        assert!(matches!(members[1].value, MemberValue::Bean(None)));
        assert!(members[1].metadata.is_optional());
    }

    #[test]
    fn test_parse_declarations() {
        let kdl = r#"
            task "jar" {
                declare {
                    file "build.gradle" name="buildScript"
                    dir "src" skip-when-empty=#true path-sensitivity="name-only"
                    files "a.txt" "b.txt" optional=#true
                    property "level" 3 optional=#true
                }
            }
        "#;
        let tasks = parse_descriptors(kdl).unwrap();
        let declarations = &tasks[0].declarations;
        assert_eq!(declarations.len(), 4);

        match &declarations[0] {
            Declaration::File { kind, options, .. } => {
                assert_eq!(*kind, FilePropertyKind::SingleFile);
                assert_eq!(options.name.as_deref(), Some("buildScript"));
            }
            other => panic!("unexpected declaration: {:?}", other),
        }
        match &declarations[1] {
            Declaration::File { kind, options, .. } => {
                assert_eq!(*kind, FilePropertyKind::SingleDirectory);
                assert!(options.skip_when_empty);
                assert_eq!(options.path_sensitivity, Some(PathSensitivity::NameOnly));
            }
            other => panic!("unexpected declaration: {:?}", other),
        }
        match &declarations[2] {
            Declaration::Files { paths, options } => {
                assert_eq!(paths, &vec![json!("a.txt"), json!("b.txt")]);
                assert!(options.optional);
            }
            other => panic!("unexpected declaration: {:?}", other),
        }
        match &declarations[3] {
            Declaration::Property {
                name,
                value,
                optional,
            } => {
                assert_eq!(name, "level");
                assert_eq!(value.resolve("level").unwrap(), json!(3));
                assert!(*optional);
            }
            other => panic!("unexpected declaration: {:?}", other),
        }
    }

    #[test]
    fn test_env_value_is_read_on_resolve() {
        let kdl = r#"
            task "build" {
                input "profile" "debug" env="FABRIK_INPUTS_TEST_PROFILE_UNSET"
            }
        "#;
        let tasks = parse_descriptors(kdl).unwrap();
        match &tasks[0].bean.members()[0].value {
            MemberValue::Value(value) => {
                assert!(value.is_deferred());
                assert_eq!(value.resolve("profile").unwrap(), json!("debug"));
            }
            other => panic!("unexpected member value: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_nodes_and_properties() {
        assert!(parse_descriptors(r#"job "x""#).is_err());
        assert!(parse_descriptors(r#"task "x" { input-thing "a" }"#).is_err());
        assert!(parse_descriptors(r#"task "x" { input "a" 1 cached=#true }"#).is_err());
        assert!(parse_descriptors(r#"task "x" { input "a" 1 optional="yes" }"#).is_err());

        let err = parse_descriptors(r#"task "x" { input-file "a" "f" path-sensitivity="fuzzy" }"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("fuzzy"));
    }

    #[test]
    fn test_rejects_duplicate_tasks() {
        let err = parse_descriptors("task \"a\"\ntask \"a\"\n").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_invalid_kdl() {
        let err = parse_descriptors("task \"a\" {").unwrap_err();
        assert!(err.to_string().contains("Invalid KDL syntax"));
    }
}
