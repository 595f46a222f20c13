use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fabrik-inputs - Task input declarations
///
/// Reads KDL task descriptors and reports the inputs each task declares,
/// explicitly or through annotated members.
#[derive(Parser, Debug)]
#[command(name = "fabrik-inputs")]
#[command(author = "Tuist Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and validate task input declarations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Common configuration arguments shared across commands
#[derive(Parser, Debug, Clone)]
pub struct CommonConfigArgs {
    /// Config file path (default: discovered from the descriptor's directory)
    #[arg(short = 'c', long, env = "FABRIK_INPUTS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Descriptor selection shared across commands
#[derive(Parser, Debug, Clone)]
pub struct DescriptorArgs {
    /// KDL task descriptor
    pub descriptor: PathBuf,

    /// Only this task (default: every task in the descriptor)
    #[arg(short, long)]
    pub task: Option<String>,

    #[command(flatten)]
    pub config: CommonConfigArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the inputs of the described tasks
    Inspect(InspectArgs),

    /// Check that every required property has a usable value
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub descriptor: DescriptorArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub descriptor: DescriptorArgs,
}
