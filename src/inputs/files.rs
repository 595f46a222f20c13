/// Lazy views over a task's input files
///
/// A view holds no files. Every call to [`FileSetView::files`] walks the task
/// again, so declarations and deferred values are observed as they are at
/// that moment.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{InputsError, Result};
use crate::inputs::TaskInputs;
use crate::properties::{FilePropertyKind, InputFileProperty, PropertyVisitor};
use crate::resolver::FileResolver;

/// Ordered set of files, first occurrence wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; returns false if it was already present
    pub fn insert(&mut self, file: PathBuf) -> bool {
        if self.seen.contains(&file) {
            return false;
        }
        self.seen.insert(file.clone());
        self.files.push(file);
        true
    }

    pub fn contains(&self, file: impl AsRef<Path>) -> bool {
        self.seen.contains(file.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.files.iter()
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.files
    }
}

impl IntoIterator for FileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl FromIterator<PathBuf> for FileSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for file in iter {
            set.insert(file);
        }
        set
    }
}

/// A named, lazily computed set of a task's input files
pub struct FileSetView<'a> {
    inputs: &'a TaskInputs,
    display_name: String,
    source_only: bool,
}

impl<'a> FileSetView<'a> {
    pub(crate) fn new(inputs: &'a TaskInputs, role: &str, source_only: bool) -> Self {
        Self {
            display_name: format!("{} {} files", inputs.display_name(), role),
            inputs,
            source_only,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Walk the task and resolve the files of every matching property
    pub fn files(&self) -> Result<FileSet> {
        let mut visitor = CollectFilesVisitor {
            task: self.inputs.display_name(),
            resolver: self.inputs.resolver(),
            source_only: self.source_only,
            files: FileSet::new(),
        };
        self.inputs.visit_properties(&mut visitor)?;

        debug!(
            view = %self.display_name,
            operation = "inputs.files",
            count = visitor.files.len(),
            "resolved file set"
        );
        Ok(visitor.files)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.files()?.is_empty())
    }
}

impl std::fmt::Display for FileSetView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name)
    }
}

struct CollectFilesVisitor<'a> {
    task: &'a str,
    resolver: &'a dyn FileResolver,
    source_only: bool,
    files: FileSet,
}

impl PropertyVisitor for CollectFilesVisitor<'_> {
    fn visit_input_file_property(&mut self, property: InputFileProperty<'_>) -> Result<()> {
        if self.source_only && !property.skip_when_empty {
            return Ok(());
        }

        let value = property.value.resolve(property.name)?;
        if value.is_null() {
            if property.optional {
                return Ok(());
            }
            return Err(InputsError::invalid_value(
                self.task,
                property.name,
                "no value has been specified",
            ));
        }

        let resolved = match property.kind {
            FilePropertyKind::SingleDirectory => self.resolver.resolve_tree(&value),
            FilePropertyKind::SingleFile | FilePropertyKind::FileSet => {
                self.resolver.resolve_files(&value)
            }
        }
        .map_err(|source| InputsError::Resolution {
            property: property.name.to_string(),
            source,
        })?;

        for file in resolved {
            self.files.insert(file);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_keeps_first_occurrence() {
        let set: FileSet = ["b.txt", "a.txt", "b.txt", "c.txt", "a.txt"]
            .into_iter()
            .map(PathBuf::from)
            .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.into_vec(),
            vec![
                PathBuf::from("b.txt"),
                PathBuf::from("a.txt"),
                PathBuf::from("c.txt"),
            ]
        );
    }

    #[test]
    fn test_file_set_insert_reports_duplicates() {
        let mut set = FileSet::new();
        assert!(set.is_empty());
        assert!(set.insert(PathBuf::from("x")));
        assert!(!set.insert(PathBuf::from("x")));
        assert!(set.contains("x"));
        assert!(!set.contains("y"));
    }
}
