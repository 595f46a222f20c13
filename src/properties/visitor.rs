use crate::error::Result;
use crate::properties::{FilePropertyKind, NormalizerKind, OutputFilePropertyKind};
use crate::value::LazyValue;

/// Everything the fingerprinting engine needs to know about an input file property
#[derive(Debug, Clone, Copy)]
pub struct InputFileProperty<'a> {
    pub name: &'a str,
    pub optional: bool,
    pub skip_when_empty: bool,
    pub normalizer: NormalizerKind,
    pub value: &'a LazyValue,
    pub kind: FilePropertyKind,
}

/// Receives the properties of a task, one callback per property
///
/// All callbacks default to doing nothing, so a visitor only implements what
/// it collects. An error returned from a callback aborts the traversal.
pub trait PropertyVisitor {
    /// When true, input property handlers skip this visitor entirely
    fn visit_output_file_properties_only(&self) -> bool {
        false
    }

    fn visit_input_file_property(&mut self, _property: InputFileProperty<'_>) -> Result<()> {
        Ok(())
    }

    fn visit_input_property(
        &mut self,
        _name: &str,
        _value: &LazyValue,
        _optional: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn visit_output_file_property(
        &mut self,
        _name: &str,
        _optional: bool,
        _value: &LazyValue,
        _kind: OutputFilePropertyKind,
    ) -> Result<()> {
        Ok(())
    }
}
