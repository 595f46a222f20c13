pub mod inspect;
pub mod validate;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use fabrik_inputs::config::{load_with_discovery, InputsConfig};
use fabrik_inputs::descriptor::{load_descriptors, TaskDescriptor};

use crate::cli::DescriptorArgs;

/// Load the configuration and the selected tasks of a descriptor
///
/// Config discovery starts in the descriptor's directory, which is also the
/// base directory when no config file is found.
pub fn load_tasks(args: &DescriptorArgs) -> Result<(InputsConfig, Vec<TaskDescriptor>)> {
    let start_dir = descriptor_dir(&args.descriptor)?;
    let config = load_with_discovery(args.config.config.as_deref(), &start_dir)?;
    debug!(
        base_dir = %config.resolver.base_dir,
        operation = "config.load",
        "loaded configuration"
    );

    let mut tasks = load_descriptors(&args.descriptor)?;

    if let Some(name) = &args.task {
        let wanted = name.trim_start_matches(':');
        tasks.retain(|task| task.name.trim_start_matches(':') == wanted);
        if tasks.is_empty() {
            bail!(
                "Task '{}' not found in {}",
                name,
                args.descriptor.display()
            );
        }
    }

    Ok((config, tasks))
}

fn descriptor_dir(descriptor: &Path) -> Result<PathBuf> {
    match descriptor.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Show `path` relative to `base` when it lies below it
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
