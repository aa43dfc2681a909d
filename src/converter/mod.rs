//! External converter invocation
//!
//! The converter is a command-line program (ThermoRawFileParser by default,
//! launched through `mono`). This module turns a [`ConversionRequest`] into an
//! [`Invocation`] with a discrete argument list and runs it through the
//! [`ProcessRunner`] capability.
//!
//! - [`CliProcessRunner`]: spawns the program with `tokio::process`
//!
//! ## Usage
//!
//! ```no_run
//! use rawconv::config::ConverterConfig;
//! use rawconv::converter::{CliProcessRunner, ProcessRunner, build_invocation};
//! use rawconv::types::{ConversionRequest, InputAddressing, OutputFormat};
//! use std::path::{Path, PathBuf};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConversionRequest {
//!         addressing: InputAddressing::SingleFile(PathBuf::from("/data/in/run.raw")),
//!         format: OutputFormat::Mzml,
//!         extra_args: None,
//!     };
//!     let invocation = build_invocation(
//!         &ConverterConfig::default(),
//!         &request,
//!         Path::new("/data/out"),
//!     );
//!
//!     println!("running {}", invocation.display_command());
//!     let output = CliProcessRunner::new().run(&invocation).await?;
//!     println!("exit code: {:?}", output.exit_code);
//!     Ok(())
//! }
//! ```

mod cli;
mod traits;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use cli::CliProcessRunner;
pub use traits::ProcessRunner;

use crate::config::ConverterConfig;
use crate::types::{ConversionRequest, InputAddressing};
use std::ffi::{OsStr, OsString};
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::time::Duration;

/// A fully prepared converter command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to spawn
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<OsString>,
    /// Maximum run time
    pub timeout: Duration,
}

impl Invocation {
    /// Invocation of `program` with no arguments
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Command line for logs and diagnostics
    ///
    /// Parts containing a space or `:` are wrapped in single quotes. The result
    /// is for reading only and is never passed to a shell.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| {
                let part = part.to_string_lossy();
                if part.contains(' ') || part.contains(':') {
                    format!("'{part}'")
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Converter flags for a request
///
/// `-i <file>` or `-d <dir>`, then `-o <output_dir>/`, then `-f <code>`, then
/// the extra arguments split on whitespace. Extra arguments are appended
/// verbatim and may override or conflict with the flags before them.
pub fn build_arguments(request: &ConversionRequest, output_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    match &request.addressing {
        InputAddressing::SingleFile(path) => {
            args.push("-i".into());
            args.push(path.as_os_str().to_os_string());
        }
        InputAddressing::Directory(path) => {
            args.push("-d".into());
            args.push(path.as_os_str().to_os_string());
        }
    }

    args.push("-o".into());
    args.push(with_trailing_separator(output_dir));
    args.push("-f".into());
    args.push(request.format.code().to_string().into());

    if let Some(extra) = &request.extra_args {
        args.extend(extra.split_whitespace().map(OsString::from));
    }

    args
}

/// Complete invocation for a request, using the configured launcher and timeout
pub fn build_invocation(
    config: &ConverterConfig,
    request: &ConversionRequest,
    output_dir: &Path,
) -> Invocation {
    let (program, leading) = config.resolve_program();
    Invocation::new(program, config.timeout)
        .args(leading)
        .args(build_arguments(request, output_dir))
}

fn with_trailing_separator(dir: &Path) -> OsString {
    let mut value = dir.as_os_str().to_os_string();
    if !dir.to_string_lossy().ends_with(MAIN_SEPARATOR_STR) {
        value.push(MAIN_SEPARATOR_STR);
    }
    value
}
