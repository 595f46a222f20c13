use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use fabrik_inputs::inputs::FilePropertySpec;
use fabrik_inputs::{FileSetView, TaskInputs, TaskLifecycle};

use super::{display_path, load_tasks};
use crate::cli::InspectArgs;

/// Everything `inspect` reports about one task
#[derive(Debug, Serialize)]
struct TaskReport {
    task: String,
    has_inputs: bool,
    has_source_files: bool,
    properties: BTreeMap<String, Value>,
    file_properties: Vec<FilePropertySpec>,
    input_files: Vec<String>,
    source_files: Vec<String>,
}

impl TaskReport {
    fn collect(inputs: &TaskInputs, base_dir: &Path) -> Result<Self> {
        Ok(Self {
            task: inputs.task().path().to_string(),
            has_inputs: inputs.has_inputs()?,
            has_source_files: inputs.has_source_files()?,
            properties: inputs.input_properties()?,
            file_properties: inputs.file_properties()?,
            input_files: file_list(inputs.input_files(), base_dir)?,
            source_files: file_list(inputs.source_files(), base_dir)?,
        })
    }

    fn print(&self) {
        println!("Task {}", self.task);
        println!("  Has inputs: {}", yes_no(self.has_inputs));
        println!("  Has source files: {}", yes_no(self.has_source_files));

        println!("  Properties:");
        if self.properties.is_empty() {
            println!("    (none)");
        }
        for (name, value) in &self.properties {
            println!("    {} = {}", name, value);
        }

        println!("  File properties:");
        if self.file_properties.is_empty() {
            println!("    (none)");
        }
        for spec in &self.file_properties {
            let mut flags = Vec::new();
            if spec.optional {
                flags.push("optional");
            }
            if spec.skip_when_empty {
                flags.push("skip-when-empty");
            }
            println!(
                "    {} [{}] {}{}",
                spec.name,
                spec.kind,
                spec.normalizer,
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", flags.join(", "))
                }
            );
        }

        print_files("Input files", &self.input_files);
        print_files("Source files", &self.source_files);
    }
}

fn file_list(view: FileSetView<'_>, base_dir: &Path) -> Result<Vec<String>> {
    Ok(view
        .files()?
        .iter()
        .map(|file| display_path(file, base_dir))
        .collect())
}

fn print_files(title: &str, files: &[String]) {
    println!("  {} ({}):", title, files.len());
    for file in files {
        println!("    {}", file);
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn run(args: InspectArgs) -> Result<()> {
    let (config, tasks) = load_tasks(&args.descriptor)?;
    let base_dir = Path::new(&config.resolver.base_dir).to_path_buf();

    let mut reports = Vec::new();
    for descriptor in tasks {
        let inputs = descriptor.into_inputs(TaskLifecycle::new(), &config)?;
        reports.push(TaskReport::collect(&inputs, &base_dir)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            println!();
        }
        report.print();
    }

    Ok(())
}
