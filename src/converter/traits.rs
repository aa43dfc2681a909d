//! Process runner capability

use super::Invocation;
use crate::types::ProcessOutput;
use async_trait::async_trait;

/// Runs a prepared converter invocation to completion
///
/// Implementations must distinguish three results:
///
/// - the process exited (any exit code): `Ok(ProcessOutput)`
/// - the process ran past [`Invocation::timeout`]:
///   [`ConverterError::TimedOut`](crate::error::ConverterError::TimedOut)
/// - the process could not be started:
///   [`ConverterError::FailedToStart`](crate::error::ConverterError::FailedToStart)
///
/// A non-zero exit code is a normal result, not an error.
///
/// # Examples
///
/// ```no_run
/// use rawconv::converter::{CliProcessRunner, Invocation, ProcessRunner};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let invocation = Invocation::new("mono", Duration::from_secs(60))
///     .arg("/opt/thermorawfileparser/ThermoRawFileParser.exe")
///     .arg("--version");
///
/// let output = CliProcessRunner::new().run(&invocation).await?;
/// println!("exit code: {:?}", output.exit_code);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation and wait for it to finish
    async fn run(&self, invocation: &Invocation) -> crate::Result<ProcessOutput>;

    /// Name of the runner implementation, for logging
    fn name(&self) -> &'static str;
}
