/// Annotation handlers
///
/// Each marker kind that denotes a task property has one handler. The handler
/// reads the member's remaining markers and reports the property to the
/// visitor through exactly one callback.
use std::str::FromStr;

use crate::error::{InputsError, Result};
use crate::properties::{
    AnnotationKind, FilePropertyKind, InputFileProperty, NormalizerKind, OutputFilePropertyKind,
    PathSensitivity, PropertyMetadata, PropertyVisitor,
};
use crate::value::LazyValue;

/// Strategy for one marker kind
pub trait PropertyAnnotationHandler: Send + Sync {
    fn annotation_kind(&self) -> AnnotationKind;

    /// Whether this handler reports anything to `visitor`
    fn should_visit(&self, _visitor: &dyn PropertyVisitor) -> bool {
        true
    }

    fn visit_property_value(
        &self,
        property_name: &str,
        value: &LazyValue,
        metadata: &PropertyMetadata,
        visitor: &mut dyn PropertyVisitor,
    ) -> Result<()>;
}

/// Select the normalizer for a path sensitivity
pub fn determine_normalizer_for_path_sensitivity(sensitivity: PathSensitivity) -> NormalizerKind {
    match sensitivity {
        PathSensitivity::None => NormalizerKind::IgnoredPath,
        PathSensitivity::NameOnly => NormalizerKind::NameOnly,
        PathSensitivity::Relative => NormalizerKind::RelativePath,
        PathSensitivity::Absolute => NormalizerKind::AbsolutePath,
    }
}

impl FromStr for PathSensitivity {
    type Err = InputsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(PathSensitivity::None),
            "name-only" => Ok(PathSensitivity::NameOnly),
            "relative" => Ok(PathSensitivity::Relative),
            "absolute" => Ok(PathSensitivity::Absolute),
            _ => Err(InputsError::UnknownNormalizer(s.to_string())),
        }
    }
}

/// Optional, skip-when-empty and normalizer as the markers define them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttributes {
    pub optional: bool,
    pub skip_when_empty: bool,
    pub normalizer: NormalizerKind,
}

impl FileAttributes {
    pub fn from_metadata(metadata: &PropertyMetadata) -> Self {
        // Absolute is the least relocatable choice. Changing this default
        // changes cache keys for every member without a PathSensitive marker.
        let sensitivity = metadata
            .path_sensitivity()
            .unwrap_or(PathSensitivity::Absolute);

        Self {
            optional: metadata.is_optional(),
            skip_when_empty: metadata.is_skip_when_empty(),
            normalizer: determine_normalizer_for_path_sensitivity(sensitivity),
        }
    }
}

/// Handles `InputFile`, `InputFiles` and `InputDirectory` members
pub struct InputFilePropertyAnnotationHandler {
    kind: FilePropertyKind,
}

impl InputFilePropertyAnnotationHandler {
    pub fn new(kind: FilePropertyKind) -> Self {
        Self { kind }
    }

    pub fn file_property_kind(&self) -> FilePropertyKind {
        self.kind
    }
}

impl PropertyAnnotationHandler for InputFilePropertyAnnotationHandler {
    fn annotation_kind(&self) -> AnnotationKind {
        match self.kind {
            FilePropertyKind::SingleFile => AnnotationKind::InputFile,
            FilePropertyKind::SingleDirectory => AnnotationKind::InputDirectory,
            FilePropertyKind::FileSet => AnnotationKind::InputFiles,
        }
    }

    fn should_visit(&self, visitor: &dyn PropertyVisitor) -> bool {
        !visitor.visit_output_file_properties_only()
    }

    fn visit_property_value(
        &self,
        property_name: &str,
        value: &LazyValue,
        metadata: &PropertyMetadata,
        visitor: &mut dyn PropertyVisitor,
    ) -> Result<()> {
        let attributes = FileAttributes::from_metadata(metadata);
        visitor.visit_input_file_property(InputFileProperty {
            name: property_name,
            optional: attributes.optional,
            skip_when_empty: attributes.skip_when_empty,
            normalizer: attributes.normalizer,
            value,
            kind: self.kind,
        })
    }
}

/// Handles `Input` members
pub struct InputPropertyAnnotationHandler;

impl PropertyAnnotationHandler for InputPropertyAnnotationHandler {
    fn annotation_kind(&self) -> AnnotationKind {
        AnnotationKind::Input
    }

    fn should_visit(&self, visitor: &dyn PropertyVisitor) -> bool {
        !visitor.visit_output_file_properties_only()
    }

    fn visit_property_value(
        &self,
        property_name: &str,
        value: &LazyValue,
        metadata: &PropertyMetadata,
        visitor: &mut dyn PropertyVisitor,
    ) -> Result<()> {
        visitor.visit_input_property(property_name, value, metadata.is_optional())
    }
}

/// Handles `OutputFile` and `OutputDirectory` members
pub struct OutputFilePropertyAnnotationHandler {
    kind: OutputFilePropertyKind,
}

impl OutputFilePropertyAnnotationHandler {
    pub fn new(kind: OutputFilePropertyKind) -> Self {
        Self { kind }
    }
}

impl PropertyAnnotationHandler for OutputFilePropertyAnnotationHandler {
    fn annotation_kind(&self) -> AnnotationKind {
        match self.kind {
            OutputFilePropertyKind::File => AnnotationKind::OutputFile,
            OutputFilePropertyKind::Directory => AnnotationKind::OutputDirectory,
        }
    }

    fn visit_property_value(
        &self,
        property_name: &str,
        value: &LazyValue,
        metadata: &PropertyMetadata,
        visitor: &mut dyn PropertyVisitor,
    ) -> Result<()> {
        visitor.visit_output_file_property(property_name, metadata.is_optional(), value, self.kind)
    }
}

/// Handles `Internal` members, which are deliberately not task properties
pub struct NoOpPropertyAnnotationHandler {
    kind: AnnotationKind,
}

impl NoOpPropertyAnnotationHandler {
    pub fn new(kind: AnnotationKind) -> Self {
        Self { kind }
    }
}

impl PropertyAnnotationHandler for NoOpPropertyAnnotationHandler {
    fn annotation_kind(&self) -> AnnotationKind {
        self.kind
    }

    fn should_visit(&self, _visitor: &dyn PropertyVisitor) -> bool {
        false
    }

    fn visit_property_value(
        &self,
        _property_name: &str,
        _value: &LazyValue,
        _metadata: &PropertyMetadata,
        _visitor: &mut dyn PropertyVisitor,
    ) -> Result<()> {
        Ok(())
    }
}
