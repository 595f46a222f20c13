// Common test utilities shared across acceptance tests
//
// Every test gets its own workspace in a temp directory. Descriptors are
// copied from fixtures/descriptors/ into it, so relative paths in them
// resolve against the workspace and nothing outside it is touched.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated project directory for a single test
pub struct TestWorkspace {
    temp_dir: TempDir,
    fixtures_dir: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        Self {
            temp_dir: TempDir::new().unwrap(),
            fixtures_dir: project_root.join("fixtures/descriptors"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.temp_dir.path().join(path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&file_path, content).unwrap();
        file_path
    }

    /// Copy a descriptor fixture into the workspace root
    #[allow(dead_code)]
    pub fn copy_descriptor(&self, name: &str) -> PathBuf {
        let dest = self.temp_dir.path().join(name);
        fs::copy(self.fixtures_dir.join(name), &dest).unwrap();
        dest
    }

    /// The binary, running in the workspace with a clean environment
    #[allow(dead_code)]
    pub fn fabrik_inputs(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fabrik-inputs"));
        cmd.current_dir(self.path())
            .env_remove("FABRIK_INPUTS_CONFIG")
            .env_remove("RUST_LOG")
            .env("FABRIK_INPUTS_LOG_FORMAT", "compact");
        cmd
    }
}
