/// Acceptance tests for task input declarations
///
/// These tests drive `TaskInputs` the way an execution engine would:
/// configure a task, query its inputs, lock it, and query again.
mod common;

use common::TestWorkspace;
use fabrik_inputs::descriptor::parse_descriptors;
use fabrik_inputs::properties::{
    AnnotationKind, Bean, BeanProperty, InputFileProperty, PropertyMetadata,
};
use fabrik_inputs::{
    BaseDirResolver, InputsConfig, InputsError, LazyValue, NormalizerKind, PathSensitivity,
    PropertyVisitor, PropertyWalker, Task, TaskInputs, TaskLifecycle,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

fn inputs_in(base: &Path, task: Task) -> (TaskInputs, TaskLifecycle) {
    let lifecycle = TaskLifecycle::new();
    let inputs = TaskInputs::new(
        task,
        lifecycle.clone(),
        Arc::new(PropertyWalker::default()),
        Arc::new(BaseDirResolver::new(base)),
    );
    (inputs, lifecycle)
}

fn config_for(base: &Path) -> InputsConfig {
    let mut config = InputsConfig::default();
    config.resolver.base_dir = base.to_string_lossy().to_string();
    config
}

#[test]
fn test_source_directory_and_config_file() {
    let workspace = TestWorkspace::new();
    workspace.create_file("src/Main.kt", "fun main() {}");
    workspace.create_file("src/util/Strings.kt", "object Strings");
    workspace.create_file("config.txt", "key=value");

    let (mut inputs, _) = inputs_in(workspace.path(), Task::new("compileKotlin"));
    inputs.dir("src").unwrap().skip_when_empty(true).unwrap();
    inputs.file("config.txt").unwrap();

    let all = inputs.input_files().files().unwrap();
    assert_eq!(
        all.into_vec(),
        vec![
            workspace.path().join("src/Main.kt"),
            workspace.path().join("src/util/Strings.kt"),
            workspace.path().join("config.txt"),
        ]
    );

    let sources = inputs.source_files().files().unwrap();
    assert_eq!(
        sources.into_vec(),
        vec![
            workspace.path().join("src/Main.kt"),
            workspace.path().join("src/util/Strings.kt"),
        ]
    );
    assert!(inputs.has_source_files().unwrap());
}

#[test]
fn test_no_skip_when_empty_means_no_sources() {
    let workspace = TestWorkspace::new();
    workspace.create_file("config.txt", "key=value");

    let (mut inputs, _) = inputs_in(workspace.path(), Task::new("process"));
    inputs.file("config.txt").unwrap();

    assert!(!inputs.input_files().files().unwrap().is_empty());
    assert!(inputs.source_files().files().unwrap().is_empty());
    assert!(!inputs.has_source_files().unwrap());
}

#[test]
fn test_lock_freezes_declarations_but_not_queries() {
    let workspace = TestWorkspace::new();
    workspace.create_file("a.txt", "a");

    let (mut inputs, lifecycle) = inputs_in(workspace.path(), Task::new(":app:jar"));
    inputs.file("a.txt").unwrap();
    inputs.property("version", "1.0").unwrap();

    // The execution engine locks its own handle
    lifecycle.lock();
    assert!(inputs.lifecycle().is_locked());

    let err = inputs.property("extra", 1).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Cannot call TaskInputs.property(name, value) on task ':app:jar' after task has started execution"
    );

    assert_eq!(inputs.input_properties().unwrap().len(), 1);
    assert_eq!(inputs.input_files().files().unwrap().len(), 1);
}

struct Recorder(Vec<String>);

impl PropertyVisitor for Recorder {
    fn visit_input_file_property(
        &mut self,
        property: InputFileProperty<'_>,
    ) -> fabrik_inputs::Result<()> {
        self.0.push(format!(
            "{} {} optional={} skip={}",
            property.name, property.normalizer, property.optional, property.skip_when_empty
        ));
        Ok(())
    }

    fn visit_input_property(
        &mut self,
        name: &str,
        _value: &LazyValue,
        optional: bool,
    ) -> fabrik_inputs::Result<()> {
        self.0.push(format!("{} optional={}", name, optional));
        Ok(())
    }
}

#[test]
fn test_registered_callbacks_carry_builder_attributes() {
    let workspace = TestWorkspace::new();
    let (mut inputs, _) = inputs_in(workspace.path(), Task::new("bundle"));

    inputs
        .files(["a.js", "b.js"])
        .unwrap()
        .with_path_sensitivity(PathSensitivity::NameOnly)
        .unwrap();
    inputs.property("minify", true).unwrap().optional(true).unwrap();
    inputs
        .dir("assets")
        .unwrap()
        .optional(true)
        .unwrap()
        .skip_when_empty(true)
        .unwrap()
        .with_normalizer(NormalizerKind::RelativePath)
        .unwrap();

    let mut recorder = Recorder(Vec::new());
    inputs.visit_registered_properties(&mut recorder).unwrap();
    assert_eq!(
        recorder.0,
        vec![
            "$1 name-only optional=false skip=false",
            "minify optional=true",
            "$2 relative-path optional=true skip=true",
        ]
    );
}

/// A task type whose members change after configuration
struct Archive {
    compression: Arc<Mutex<String>>,
}

impl Bean for Archive {
    fn properties(&self) -> Vec<BeanProperty> {
        let compression = self.compression.clone();
        vec![
            BeanProperty::new(
                "compression",
                PropertyMetadata::new(AnnotationKind::Input),
                LazyValue::deferred(move || Ok(Value::String(compression.lock().unwrap().clone()))),
            ),
            BeanProperty::new(
                "contents",
                PropertyMetadata::new(AnnotationKind::InputDirectory).skip_when_empty(),
                LazyValue::fixed("dist"),
            ),
            BeanProperty::new(
                "archiveFile",
                PropertyMetadata::new(AnnotationKind::OutputFile),
                LazyValue::fixed("build/dist.zip"),
            ),
        ]
    }
}

#[test]
fn test_discovered_members_are_read_on_every_query() {
    let workspace = TestWorkspace::new();
    let compression = Arc::new(Mutex::new("deflate".to_string()));
    let task = Task::with_bean(
        "zip",
        Arc::new(Archive {
            compression: compression.clone(),
        }),
    );
    let (inputs, _) = inputs_in(workspace.path(), task);

    assert!(inputs.has_inputs().unwrap());
    assert_eq!(
        inputs.input_properties().unwrap()["compression"],
        json!("deflate")
    );

    *compression.lock().unwrap() = "store".to_string();
    assert_eq!(
        inputs.input_properties().unwrap()["compression"],
        json!("store")
    );

    // The directory does not exist yet, then it does
    assert!(inputs.source_files().is_empty().unwrap());
    workspace.create_file("dist/index.html", "<html/>");
    assert_eq!(
        inputs.source_files().files().unwrap().into_vec(),
        vec![workspace.path().join("dist/index.html")]
    );
}

struct Loop {
    me: Mutex<Option<Arc<dyn Bean>>>,
}

impl Bean for Loop {
    fn properties(&self) -> Vec<BeanProperty> {
        vec![BeanProperty::nested("self", self.me.lock().unwrap().clone())]
    }
}

#[test]
fn test_cyclic_member_graph_fails_queries() {
    let workspace = TestWorkspace::new();
    let bean = Arc::new(Loop {
        me: Mutex::new(None),
    });
    *bean.me.lock().unwrap() = Some(bean.clone() as Arc<dyn Bean>);

    let (inputs, _) = inputs_in(workspace.path(), Task::with_bean("loop", bean.clone()));
    let err = inputs.has_inputs().unwrap_err();
    assert!(matches!(err, InputsError::CyclicPropertyGraph { .. }));

    // Break the cycle so the Arc can be freed
    *bean.me.lock().unwrap() = None;
}

#[test]
fn test_descriptor_to_inputs() {
    let workspace = TestWorkspace::new();
    workspace.create_file("src/main/java/App.java", "class App {}");
    workspace.create_file("build.gradle", "plugins {}");

    let tasks = parse_descriptors(
        r#"
        task "compileJava" {
            input-files "source" "src/main/java/*.java" skip-when-empty=#true path-sensitivity="relative"
            input "release" 17
            nested "options" {
                input "debug" #true
            }
            declare {
                file "build.gradle" name="buildScript" path-sensitivity="none"
                property "toolchain" "temurin"
            }
        }
        "#,
    )
    .unwrap();

    let descriptor = tasks.into_iter().next().unwrap();
    let inputs = descriptor
        .into_inputs(TaskLifecycle::new(), &config_for(workspace.path()))
        .unwrap();

    let properties = inputs.input_properties().unwrap();
    assert_eq!(properties["release"], json!(17));
    assert_eq!(properties["options.debug"], json!(true));
    assert_eq!(properties["toolchain"], json!("temurin"));

    let specs = inputs.file_properties().unwrap();
    assert_eq!(specs[0].name, "buildScript");
    assert_eq!(specs[0].normalizer, NormalizerKind::IgnoredPath);
    assert_eq!(specs[1].name, "source");
    assert_eq!(specs[1].normalizer, NormalizerKind::RelativePath);

    assert_eq!(
        inputs.input_files().files().unwrap().into_vec(),
        vec![
            workspace.path().join("build.gradle"),
            workspace.path().join("src/main/java/App.java"),
        ]
    );
    assert!(inputs.validate().is_ok());
}

#[test]
fn test_config_controls_existence_checks() {
    let workspace = TestWorkspace::new();
    let mut config = config_for(workspace.path());

    let tasks = parse_descriptors(
        r#"
        task "jar" {
            input-file "manifest" "MANIFEST.MF"
        }
        "#,
    )
    .unwrap();

    let inputs = tasks[0]
        .clone()
        .into_inputs(TaskLifecycle::new(), &config)
        .unwrap();
    assert!(inputs.validate().is_err());

    config.validation.check_existence = false;
    let inputs = tasks[0]
        .clone()
        .into_inputs(TaskLifecycle::new(), &config)
        .unwrap();
    assert!(inputs.validate().is_ok());
}
