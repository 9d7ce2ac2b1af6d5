//! Sequential execution of the selected steps over a set of files.

use crate::dataset::BidsFile;
use crate::derivatives::DerivativesLayout;
use crate::error::{CleanError, Result};
use crate::processor::{StepJob, StepProcessor};
use crate::report::{BatchReport, FileReport, StepReport, StepStatus};
use crate::steps::{Step, StepSelection};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

/// Progress notifications emitted while a batch runs
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    FileStarted {
        index: usize,
        total: usize,
        file: &'a BidsFile,
    },
    StepFinished {
        file: &'a BidsFile,
        report: &'a StepReport,
    },
    FileFinished {
        index: usize,
        total: usize,
        report: &'a FileReport,
    },
}

pub struct Pipeline<P> {
    processor: P,
    layout: DerivativesLayout,
    steps: Vec<Step>,
}

impl<P: StepProcessor> Pipeline<P> {
    /// Fails with a configuration error when `selection` is empty.
    pub fn new(processor: P, layout: DerivativesLayout, selection: StepSelection) -> Result<Self> {
        let selection = selection.validate()?;
        Ok(Self {
            processor,
            layout,
            steps: selection.steps(),
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn layout(&self) -> &DerivativesLayout {
        &self.layout
    }

    pub async fn run(&self, files: &[BidsFile]) -> BatchReport {
        self.run_with_progress(files, |_| {}).await
    }

    /// Process every file in order. A failing file never stops the batch.
    pub async fn run_with_progress<F>(&self, files: &[BidsFile], mut on_event: F) -> BatchReport
    where
        F: FnMut(ProgressEvent<'_>),
    {
        let started_at = chrono::Utc::now();
        let start_time = Instant::now();
        let total = files.len();
        let mut reports = Vec::with_capacity(total);

        for (index, file) in files.iter().enumerate() {
            on_event(ProgressEvent::FileStarted { index, total, file });
            let report = self.process_file(file, &mut on_event).await;
            on_event(ProgressEvent::FileFinished {
                index,
                total,
                report: &report,
            });
            reports.push(report);
        }

        let report = BatchReport {
            id: Uuid::new_v4().to_string(),
            steps: self.steps.clone(),
            files: reports,
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            elapsed_secs: start_time.elapsed().as_secs_f64(),
        };

        log::info!(
            "Batch {} complete: {}/{} succeeded",
            report.id,
            report.succeeded(),
            report.total()
        );
        report
    }

    async fn process_file<F>(&self, file: &BidsFile, on_event: &mut F) -> FileReport
    where
        F: FnMut(ProgressEvent<'_>),
    {
        let mut input = file.path.clone();
        let mut tags = self.layout.prior_tags(file);
        let mut latest_recording_dir: Option<PathBuf> = None;
        let mut failed = false;
        let mut step_reports = Vec::with_capacity(self.steps.len());

        for &step in &self.steps {
            if failed {
                let report = StepReport::skipped(step);
                on_event(ProgressEvent::StepFinished {
                    file,
                    report: &report,
                });
                step_reports.push(report);
                continue;
            }

            tags.push(step.tag().to_string());
            let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
            let output = if step.produces_recording() {
                self.layout.recording_path(file, &tag_refs)
            } else {
                self.layout.qc_path(file, &tag_refs)
            };

            let start_time = Instant::now();
            let result = self.apply_step(step, file, &input, &output).await;
            let elapsed_secs = start_time.elapsed().as_secs_f64();

            let report = match result {
                Ok(()) => {
                    if step.produces_recording() {
                        latest_recording_dir = output.parent().map(PathBuf::from);
                        input = output.clone();
                    }
                    StepReport {
                        step,
                        status: StepStatus::Succeeded,
                        output: Some(output),
                        elapsed_secs,
                        error: None,
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    log::error!("{}: {}", file.path.display(), message);
                    if let Err(log_err) = self.layout.append_error(file, &message) {
                        log::warn!("Failed to append to error log: {}", log_err);
                    }
                    failed = true;
                    StepReport {
                        step,
                        status: StepStatus::Failed,
                        output: None,
                        elapsed_secs,
                        error: Some(message),
                    }
                }
            };

            on_event(ProgressEvent::StepFinished {
                file,
                report: &report,
            });
            step_reports.push(report);
        }

        if !failed {
            if let Some(dir) = latest_recording_dir {
                if let Err(e) = self.layout.copy_sidecar(file, &dir) {
                    log::warn!("Failed to copy sidecar for {}: {}", file.path.display(), e);
                }
            }
        }

        FileReport {
            file: file.path.clone(),
            steps: step_reports,
        }
    }

    async fn apply_step(
        &self,
        step: Step,
        file: &BidsFile,
        input: &std::path::Path,
        output: &std::path::Path,
    ) -> Result<()> {
        if input == output {
            return Err(CleanError::step_failed(
                step.name(),
                format!("output would overwrite the input {}", input.display()),
            ));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let job = StepJob {
            step,
            file,
            input,
            output,
        };
        self.processor.apply(&job).await
    }
}
