/// Property declaration model
///
/// Describes how a task's properties are discovered (explicit registration or
/// annotated bean members), which markers a member can carry, and how file
/// properties are normalized before fingerprinting.
pub mod annotations;
pub mod bean;
pub mod visitor;
pub mod walker;

use serde::Serialize;
use std::fmt;

pub use annotations::{determine_normalizer_for_path_sensitivity, PropertyAnnotationHandler};
pub use bean::{Bean, BeanProperty, MemberValue};
pub use visitor::{InputFileProperty, PropertyVisitor};
pub use walker::PropertyWalker;

/// Shape of an input file property's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilePropertyKind {
    /// A single file
    SingleFile,
    /// A directory, expanded to its whole tree
    SingleDirectory,
    /// Any number of files
    FileSet,
}

impl fmt::Display for FilePropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilePropertyKind::SingleFile => "single-file",
            FilePropertyKind::SingleDirectory => "single-directory",
            FilePropertyKind::FileSet => "file-set",
        };
        f.write_str(name)
    }
}

/// Shape of an output file property's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFilePropertyKind {
    File,
    Directory,
}

/// How much of a file's location takes part in its fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathSensitivity {
    /// Only contents matter
    None,
    /// File name and contents
    NameOnly,
    /// Path relative to the property root and contents
    Relative,
    /// Absolute path and contents
    Absolute,
}

/// Normalization strategy handed to the fingerprinting engine
///
/// This crate only selects a strategy; applying it is the engine's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizerKind {
    #[default]
    AbsolutePath,
    RelativePath,
    NameOnly,
    IgnoredPath,
}

impl fmt::Display for NormalizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizerKind::AbsolutePath => "absolute-path",
            NormalizerKind::RelativePath => "relative-path",
            NormalizerKind::NameOnly => "name-only",
            NormalizerKind::IgnoredPath => "ignored-path",
        };
        f.write_str(name)
    }
}

/// Marker that decides which handler processes a bean member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Input,
    InputFile,
    InputFiles,
    InputDirectory,
    OutputFile,
    OutputDirectory,
    Nested,
    Internal,
}

/// Markers attached to a bean member
///
/// The kind marker selects the handler; the remaining markers refine it.
/// A member without a kind marker is not a task property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMetadata {
    kind: Option<AnnotationKind>,
    path_sensitivity: Option<PathSensitivity>,
    optional: bool,
    skip_when_empty: bool,
}

impl PropertyMetadata {
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Metadata for a member that carries no recognised markers
    pub fn unannotated() -> Self {
        Self::default()
    }

    pub fn path_sensitive(mut self, sensitivity: PathSensitivity) -> Self {
        self.path_sensitivity = Some(sensitivity);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn skip_when_empty(mut self) -> Self {
        self.skip_when_empty = true;
        self
    }

    pub fn kind(&self) -> Option<AnnotationKind> {
        self.kind
    }

    pub fn path_sensitivity(&self) -> Option<PathSensitivity> {
        self.path_sensitivity
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_skip_when_empty(&self) -> bool {
        self.skip_when_empty
    }
}
