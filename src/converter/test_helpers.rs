//! Fake process runners shared by unit tests

use super::{Invocation, ProcessRunner};
use crate::error::ConverterError;
use crate::types::ProcessOutput;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Output directory passed with `-o`
pub(crate) fn output_dir_arg(invocation: &Invocation) -> PathBuf {
    let pos = invocation
        .args
        .iter()
        .position(|a| a == "-o")
        .expect("invocation has no -o flag");
    PathBuf::from(&invocation.args[pos + 1])
}

/// Records invocations and writes the configured files into the `-o` directory
pub(crate) struct ScriptedRunner {
    exit_code: Option<i32>,
    outputs: Vec<&'static str>,
    seen: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub(crate) fn exiting(exit_code: i32, outputs: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            exit_code: Some(exit_code),
            outputs,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn last_args(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .last()
            .expect("runner was never called")
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> crate::Result<ProcessOutput> {
        let out = output_dir_arg(invocation);
        for name in &self.outputs {
            std::fs::write(out.join(name), b"converted").unwrap();
        }
        self.seen.lock().unwrap().push(invocation.clone());
        Ok(ProcessOutput {
            exit_code: self.exit_code,
            stdout: "fake stdout".into(),
            stderr: String::new(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Leaves a partial file behind and then reports a timeout
pub(crate) struct TimeoutRunner;

#[async_trait]
impl ProcessRunner for TimeoutRunner {
    async fn run(&self, invocation: &Invocation) -> crate::Result<ProcessOutput> {
        std::fs::write(output_dir_arg(invocation).join("partial.mzML"), b"").unwrap();
        Err(ConverterError::TimedOut {
            timeout: invocation.timeout,
        }
        .into())
    }

    fn name(&self) -> &'static str {
        "timeout"
    }
}

/// Fails as if the program did not exist
pub(crate) struct UnstartableRunner;

#[async_trait]
impl ProcessRunner for UnstartableRunner {
    async fn run(&self, invocation: &Invocation) -> crate::Result<ProcessOutput> {
        Err(ConverterError::FailedToStart {
            program: invocation.program.clone(),
            reason: "No such file or directory".into(),
        }
        .into())
    }

    fn name(&self) -> &'static str {
        "unstartable"
    }
}
