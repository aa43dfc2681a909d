//! Batch lifecycle: validate, stage, convert, collect

use crate::collector::{collect_artifacts, evaluate};
use crate::config::Config;
use crate::converter::{Invocation, ProcessRunner, build_invocation};
use crate::error::{ConverterError, Error, Result, ValidationError};
use crate::types::{
    BatchOutcome, BatchReport, ConversionRequest, InputAddressing, ProcessOutput, StatusMessage,
    Submission,
};
use crate::validation::{screen_uploads, skipped_message};
use crate::workspace::{BatchWorkspace, WorkspaceManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs upload batches end to end
///
/// Shared between requests behind an `Arc`; it holds no per-batch state.
pub struct BatchProcessor {
    config: Config,
    workspace: WorkspaceManager,
    runner: Arc<dyn ProcessRunner>,
}

impl BatchProcessor {
    /// Create a processor using `runner` to execute the converter
    pub fn new(config: Config, runner: Arc<dyn ProcessRunner>) -> Self {
        let workspace = WorkspaceManager::new(&config.storage);
        Self {
            config,
            workspace,
            runner,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Workspace manager for the configured roots
    pub fn workspace(&self) -> &WorkspaceManager {
        &self.workspace
    }

    /// Prepare the storage roots; call once at start-up
    pub async fn init(&self) -> Result<()> {
        self.workspace.ensure_roots().await?;
        info!(runner = self.runner.name(), "batch processor ready");
        Ok(())
    }

    /// Process one submission
    ///
    /// Returns `Err` when nothing was staged (validation) or staging failed
    /// (workspace). Every converter result, including a timeout or a failure
    /// to start, is reported through `Ok(BatchReport)`.
    pub async fn process(&self, submission: Submission) -> Result<BatchReport> {
        let Submission {
            files,
            format,
            extra_args,
        } = submission;

        if files.iter().all(|f| f.file_name.is_empty()) {
            return Err(ValidationError::NoFilesSelected.into());
        }

        let screening = screen_uploads(files, &self.config.converter.allowed_extensions);
        if screening.accepted.is_empty() {
            warn!(skipped = screening.skipped.len(), "no valid files in upload");
            return Err(ValidationError::NoValidFiles {
                skipped: screening.skipped,
            }
            .into());
        }

        let mut messages: Vec<StatusMessage> = screening
            .skipped
            .iter()
            .map(|name| StatusMessage::warning(skipped_message(name)))
            .collect();

        let ws = self.workspace.allocate().await?;
        let mut inputs: Vec<PathBuf> = Vec::with_capacity(screening.accepted.len());
        for upload in screening.accepted {
            match self
                .workspace
                .write_input(&ws, &upload.sanitized_name, upload.content)
                .await
            {
                Ok(path) => inputs.push(path),
                Err(e) => {
                    error!(batch_id = %ws.id, error = %e, "failed to stage upload, discarding batch");
                    self.workspace.discard(&ws).await;
                    return Err(e);
                }
            }
        }

        messages.push(StatusMessage::success(format!(
            "{} file(s) uploaded successfully. Starting parsing...",
            inputs.len()
        )));

        let addressing = match inputs.as_slice() {
            [single] => InputAddressing::SingleFile(single.clone()),
            _ => InputAddressing::Directory(ws.input_dir.clone()),
        };
        let request = ConversionRequest {
            addressing,
            format,
            extra_args: Some(extra_args).filter(|a| !a.trim().is_empty()),
        };
        let invocation = build_invocation(&self.config.converter, &request, &ws.output_dir);
        info!(batch_id = %ws.id, command = %invocation.display_command(), "starting converter");

        let run = self.runner.run(&invocation).await;
        let (outcome, artifacts, diagnostics) = self
            .conclude(&ws, &request, &invocation, run, &mut messages)
            .await;

        let output_subdir = (!artifacts.is_empty()).then(|| ws.output_subdir());

        Ok(BatchReport {
            batch_id: ws.id,
            uploaded_files: inputs.len(),
            skipped_files: screening.skipped,
            outcome,
            artifacts,
            output_subdir,
            messages,
            diagnostics: self
                .config
                .server
                .expose_diagnostics
                .then_some(diagnostics),
        })
    }

    async fn conclude(
        &self,
        ws: &BatchWorkspace,
        request: &ConversionRequest,
        invocation: &Invocation,
        run: Result<ProcessOutput>,
        messages: &mut Vec<StatusMessage>,
    ) -> (BatchOutcome, Vec<String>, String) {
        let output = match run {
            Ok(output) => output,
            Err(Error::Converter(ConverterError::TimedOut { timeout })) => {
                let text = "Converter execution timed out!";
                error!(batch_id = %ws.id, timeout = ?timeout, "converter timed out");
                messages.push(StatusMessage::error(text));
                let outcome = BatchOutcome::TimedOut {
                    timeout_secs: timeout.as_secs(),
                };
                return (outcome, Vec::new(), text.to_string());
            }
            Err(e) => return execution_error(ws, e, messages),
        };

        info!(batch_id = %ws.id, exit_code = ?output.exit_code, stdout = %output.stdout, "converter finished");
        if !output.stderr.is_empty() {
            warn!(batch_id = %ws.id, stderr = %output.stderr, "converter wrote to stderr");
        }
        let diagnostics = render_diagnostics(invocation, &output);

        if !output.success() {
            let text = format!("Parsing failed. Exit code: {}.", exit_code_text(output.exit_code));
            error!(batch_id = %ws.id, exit_code = ?output.exit_code, "converter failed");
            messages.push(StatusMessage::error(text));
            let outcome = BatchOutcome::ExitFailure {
                exit_code: output.exit_code,
            };
            return (outcome, Vec::new(), diagnostics);
        }

        messages.push(StatusMessage::success(
            "Processing completed with exit code 0.",
        ));

        let output_dir = self.workspace.output_dir_for(&ws.id);
        let artifacts = match collect_artifacts(&output_dir).await {
            Ok(artifacts) => artifacts,
            Err(e) => return execution_error(ws, e, messages),
        };

        let (outcome, message) = evaluate(request.format, &artifacts);
        match &outcome {
            BatchOutcome::NoOutputFound => {
                warn!(batch_id = %ws.id, "processing complete, but no output files found")
            }
            _ => info!(batch_id = %ws.id, artifacts = artifacts.len(), "processing complete"),
        }
        messages.extend(message);

        (outcome, artifacts, diagnostics)
    }
}

fn execution_error(
    ws: &BatchWorkspace,
    e: Error,
    messages: &mut Vec<StatusMessage>,
) -> (BatchOutcome, Vec<String>, String) {
    error!(batch_id = %ws.id, error = %e, "error during batch processing");
    let text = format!("An error occurred: {e}");
    messages.push(StatusMessage::error(text.clone()));
    let outcome = BatchOutcome::ExecutionError {
        message: e.to_string(),
    };
    (outcome, Vec::new(), text)
}

fn exit_code_text(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

fn render_diagnostics(invocation: &Invocation, output: &ProcessOutput) -> String {
    format!(
        "Command Executed: {}\nExit Code: {}\n--- STDOUT ---\n{}\n--- STDERR ---\n{}",
        invocation.display_command(),
        exit_code_text(output.exit_code),
        output.stdout,
        output.stderr
    )
}
