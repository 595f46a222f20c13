/// Resolution of path-like values into files
///
/// A path value is a JSON string (one path or glob pattern) or an array of
/// path values. Relative paths resolve against the resolver's base directory.
use anyhow::{anyhow, Context, Result};
use glob::glob;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Turns path-like values into concrete paths
pub trait FileResolver: Send + Sync {
    /// Resolve to the paths the value names, without expanding directories
    fn resolve_files(&self, value: &Value) -> Result<Vec<PathBuf>>;

    /// Resolve to every file below the directories the value names
    fn resolve_tree(&self, value: &Value) -> Result<Vec<PathBuf>>;
}

/// Resolves paths against a fixed base directory
#[derive(Debug, Clone)]
pub struct BaseDirResolver {
    base_dir: PathBuf,
    follow_links: bool,
}

impl BaseDirResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            follow_links: false,
        }
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn collect_roots(&self, value: &Value, roots: &mut Vec<PathBuf>) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::String(path) if is_glob(path) => {
                roots.extend(expand_glob(path, &self.base_dir)?);
                Ok(())
            }
            Value::String(path) => {
                roots.push(self.base_dir.join(path));
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.collect_roots(item, roots)?;
                }
                Ok(())
            }
            other => Err(anyhow!("Not a path-like value: {}", other)),
        }
    }
}

impl FileResolver for BaseDirResolver {
    fn resolve_files(&self, value: &Value) -> Result<Vec<PathBuf>> {
        let mut roots = Vec::new();
        self.collect_roots(value, &mut roots)?;
        Ok(roots)
    }

    fn resolve_tree(&self, value: &Value) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for root in self.resolve_files(value)? {
            if root.is_file() {
                files.push(root);
                continue;
            }
            if !root.is_dir() {
                // A missing directory is an empty tree
                continue;
            }

            let walker = WalkDir::new(&root)
                .follow_links(self.follow_links)
                .sort_by_file_name();
            for entry in walker {
                let entry = entry
                    .with_context(|| format!("Failed to walk directory: {}", root.display()))?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        }

        Ok(files)
    }
}

fn is_glob(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

/// Expand glob pattern relative to base directory
fn expand_glob(pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>> {
    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        base_dir.join(pattern).to_string_lossy().to_string()
    };

    let mut paths = Vec::new();

    for entry in
        glob(&full_pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?
    {
        let path = entry.with_context(|| format!("Failed to read glob entry for: {}", pattern))?;
        paths.push(path);
    }

    // Sort for deterministic ordering
    paths.sort();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("src/nested")).unwrap();
        fs::write(base.join("src/b.rs"), "b").unwrap();
        fs::write(base.join("src/a.rs"), "a").unwrap();
        fs::write(base.join("src/nested/c.rs"), "c").unwrap();
        fs::write(base.join("config.txt"), "config").unwrap();
        temp
    }

    #[test]
    fn test_scalar_resolves_against_base() {
        let temp = workspace();
        let resolver = BaseDirResolver::new(temp.path());

        let files = resolver.resolve_files(&json!("config.txt")).unwrap();
        assert_eq!(files, vec![temp.path().join("config.txt")]);

        // Missing files are still named
        let files = resolver.resolve_files(&json!("missing.txt")).unwrap();
        assert_eq!(files, vec![temp.path().join("missing.txt")]);
    }

    #[test]
    fn test_array_and_glob() {
        let temp = workspace();
        let resolver = BaseDirResolver::new(temp.path());

        let files = resolver
            .resolve_files(&json!(["config.txt", "src/*.rs"]))
            .unwrap();
        assert_eq!(
            files,
            vec![
                temp.path().join("config.txt"),
                temp.path().join("src/a.rs"),
                temp.path().join("src/b.rs"),
            ]
        );
    }

    #[test]
    fn test_tree_expands_directories() {
        let temp = workspace();
        let resolver = BaseDirResolver::new(temp.path());

        let files = resolver.resolve_tree(&json!("src")).unwrap();
        assert_eq!(
            files,
            vec![
                temp.path().join("src/a.rs"),
                temp.path().join("src/b.rs"),
                temp.path().join("src/nested/c.rs"),
            ]
        );

        assert!(resolver.resolve_tree(&json!("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_non_path_value_is_rejected() {
        let resolver = BaseDirResolver::new("/tmp");
        let err = resolver.resolve_files(&json!(42)).unwrap_err();
        assert!(err.to_string().contains("Not a path-like value"));
        assert!(resolver.resolve_files(&json!(null)).unwrap().is_empty());
    }
}
