use anyhow::{bail, Result};
use tracing::warn;

use fabrik_inputs::{InputsError, TaskLifecycle};

use super::load_tasks;
use crate::cli::ValidateArgs;

pub fn run(args: ValidateArgs) -> Result<()> {
    let (config, tasks) = load_tasks(&args.descriptor)?;

    let mut failed = 0;
    for descriptor in tasks {
        let inputs = descriptor.into_inputs(TaskLifecycle::new(), &config)?;

        match inputs.validate() {
            Ok(()) => println!("✅ {}", inputs.display_name()),
            Err(InputsError::Validation { task, problems }) => {
                println!("❌ {}", task);
                for problem in &problems {
                    println!("   - {}", problem);
                }
                warn!(task = %task, count = problems.len(), "validation failed");
                failed += 1;
            }
            Err(other) => return Err(other.into()),
        }
    }

    if failed > 0 {
        bail!("{} task(s) failed validation", failed);
    }

    Ok(())
}
