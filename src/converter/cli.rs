//! Runner that spawns the converter as a child process

use super::Invocation;
use super::traits::ProcessRunner;
use crate::error::ConverterError;
use crate::types::ProcessOutput;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs invocations with `tokio::process`
///
/// Arguments are passed as a discrete list, never through a shell. Standard
/// output and error are captured in full and decoded as lossy UTF-8. When the
/// timeout elapses the pending child is dropped, which kills it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliProcessRunner;

impl CliProcessRunner {
    /// Create a new runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for CliProcessRunner {
    async fn run(&self, invocation: &Invocation) -> crate::Result<ProcessOutput> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConverterError::FailedToStart {
                program: invocation.program.clone(),
                reason: e.to_string(),
            })?;

        match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ProcessOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracing::warn!(
                    program = ?invocation.program,
                    timeout = ?invocation.timeout,
                    "converter timed out, killing process"
                );
                Err(ConverterError::TimedOut {
                    timeout: invocation.timeout,
                }
                .into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "cli"
    }
}
