//! External build pipeline steps
//!
//! CSS compilation, script bundling and image generation are not done here.
//! They are external programs run around each build, after the overlay
//! synchronization has put core files in place. Each program sees the
//! resolved roots through environment variables:
//!
//! - `THEME_OVERLAY_CORE_SRC`
//! - `THEME_OVERLAY_SITE_SRC`
//! - `THEME_OVERLAY_OUT_DIR`

use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use crate::config::PipelineCommand;
use crate::error::{Error, Result};
use crate::host::BuildContext;

/// Roots handed to every pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineEnv {
    pub core_src: PathBuf,
    pub site_src: PathBuf,
    pub out_dir: PathBuf,
}

impl PipelineEnv {
    fn vars(&self) -> [(&'static str, &PathBuf); 3] {
        [
            ("THEME_OVERLAY_CORE_SRC", &self.core_src),
            ("THEME_OVERLAY_SITE_SRC", &self.site_src),
            ("THEME_OVERLAY_OUT_DIR", &self.out_dir),
        ]
    }
}

/// One step of the build pipeline.
pub trait PipelineStep: Send {
    fn name(&self) -> &str;

    fn run(&self, env: &PipelineEnv) -> Result<()>;
}

/// A step that runs an external program.
#[derive(Debug, Clone)]
pub struct CommandStep {
    command: PipelineCommand,
}

impl CommandStep {
    pub fn new(command: PipelineCommand) -> Self {
        Self { command }
    }
}

impl PipelineStep for CommandStep {
    fn name(&self) -> &str {
        &self.command.name
    }

    fn run(&self, env: &PipelineEnv) -> Result<()> {
        let mut cmd = Command::new(&self.command.command);
        cmd.args(&self.command.args);
        if let Some(cwd) = &self.command.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in env.vars() {
            cmd.env(key, value);
        }

        debug!(
            "Running pipeline step '{}': {} {}",
            self.command.name,
            self.command.command,
            self.command.args.join(" ")
        );
        let output = cmd.output().map_err(|e| Error::Pipeline {
            step: self.command.name.clone(),
            message: format!("failed to start '{}': {}", self.command.command, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = output
                .status
                .code()
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "terminated by signal".to_string());
            return Err(Error::Pipeline {
                step: self.command.name.clone(),
                message: format!("{}: {}", status, stderr.trim()),
            });
        }
        Ok(())
    }
}

/// Build command steps from configuration entries.
pub fn command_steps(commands: &[PipelineCommand]) -> Vec<Box<dyn PipelineStep>> {
    commands
        .iter()
        .cloned()
        .map(|c| Box::new(CommandStep::new(c)) as Box<dyn PipelineStep>)
        .collect()
}

/// Run steps in order, stopping at the first failure.
///
/// Names of completed steps are appended to `ctx.steps`.
pub fn run_steps(
    steps: &[Box<dyn PipelineStep>],
    env: &PipelineEnv,
    ctx: &mut BuildContext,
) -> Result<()> {
    for step in steps {
        step.run(env)?;
        info!("Pipeline step '{}' finished", step.name());
        ctx.steps.push(step.name().to_string());
    }
    Ok(())
}
