use crate::config::{StepCommand, StepCommands};
use crate::dataset::BidsFile;
use crate::error::{CleanError, Result};
use crate::steps::Step;
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;

/// One step applied to one file.
#[derive(Debug, Clone, Copy)]
pub struct StepJob<'a> {
    pub step: Step,
    pub file: &'a BidsFile,
    /// Recording to read: the raw file or the previous step's output
    pub input: &'a Path,
    /// Path the step must write
    pub output: &'a Path,
}

/// Performs the signal processing of a step.
#[async_trait]
pub trait StepProcessor: Send + Sync {
    async fn apply(&self, job: &StepJob<'_>) -> Result<()>;
}

/// Runs each step as an external program.
pub struct CommandProcessor {
    commands: StepCommands,
}

impl CommandProcessor {
    pub fn new(commands: StepCommands) -> Self {
        Self { commands }
    }

    pub fn command_for(&self, step: Step) -> &StepCommand {
        self.commands.get(step)
    }

    /// Arguments for `job` with every placeholder substituted.
    pub fn render_args(&self, job: &StepJob<'_>) -> Vec<String> {
        let entities = &job.file.entities;
        let input = job.input.to_string_lossy();
        let output = job.output.to_string_lossy();
        let replacements: [(&str, &str); 7] = [
            ("{input}", &*input),
            ("{output}", &*output),
            ("{step}", job.step.name()),
            ("{subject}", &entities.subject),
            ("{session}", entities.session.as_deref().unwrap_or("")),
            ("{task}", entities.task.as_deref().unwrap_or("")),
            ("{run}", entities.run.as_deref().unwrap_or("")),
        ];

        self.command_for(job.step)
            .args
            .iter()
            .map(|arg| {
                replacements
                    .iter()
                    .fold(arg.clone(), |acc, (key, value)| acc.replace(key, value))
            })
            .collect()
    }
}

#[async_trait]
impl StepProcessor for CommandProcessor {
    async fn apply(&self, job: &StepJob<'_>) -> Result<()> {
        let step = job.step.name();
        let program = &self.command_for(job.step).program;
        let args = self.render_args(job);

        if job.input == job.output {
            return Err(CleanError::step_failed(
                step,
                format!("output would overwrite the input {}", job.input.display()),
            ));
        }
        // A leftover output must not pass for this run's result
        match tokio::fs::remove_file(job.output).await {
            Ok(()) => log::debug!("Removed stale output {}", job.output.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut command = Command::new(program);
        command.args(&args).kill_on_drop(true);

        log::info!("Executing {} step: {} {}", step, program, args.join(" "));

        let start_time = Instant::now();
        let output = command.output().await.map_err(|e| {
            CleanError::step_failed(step, format!("Failed to execute '{}': {}", program, e))
        })?;

        log::info!(
            "{} step completed in {:.2}s",
            step,
            start_time.elapsed().as_secs_f64()
        );

        if !output.status.success() {
            let stderr_str = String::from_utf8_lossy(&output.stderr);
            log::error!("{} step failed with status: {}", step, output.status);
            log::error!("stdout: {}", String::from_utf8_lossy(&output.stdout));
            log::error!("stderr: {}", stderr_str);

            return Err(CleanError::step_failed(
                step,
                format!(
                    "'{}' exited with status: {}. stderr: {}",
                    program,
                    output.status,
                    stderr_str.trim()
                ),
            ));
        }

        if !job.output.exists() {
            return Err(CleanError::step_failed(
                step,
                format!(
                    "'{}' succeeded but did not write {}",
                    program,
                    job.output.display()
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file() -> BidsFile {
        BidsFile::from_path("/data/sub-03/ses-1/eeg/sub-03_ses-1_task-checker_run-2_eeg.vhdr")
            .unwrap()
    }

    fn processor_with(step: Step, program: &str, args: &[&str]) -> CommandProcessor {
        let mut commands = StepCommands::default();
        let command = StepCommand {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        };
        match step {
            Step::Gradient => commands.gradient = command,
            Step::Bcg => commands.bcg = command,
            Step::Qc => commands.qc = command,
        }
        CommandProcessor::new(commands)
    }

    #[test]
    fn test_render_args() {
        let processor = processor_with(
            Step::Bcg,
            "clean",
            &["{step}", "sub={subject}", "ses={session}_run={run}", "{task}", "{input}", "{output}"],
        );
        let file = file();
        let output = PathBuf::from("/out/x.fif");
        let job = StepJob {
            step: Step::Bcg,
            file: &file,
            input: &file.path,
            output: &output,
        };
        assert_eq!(
            processor.render_args(&job),
            vec![
                "bcg",
                "sub=03",
                "ses=1_run=2",
                "checker",
                "/data/sub-03/ses-1/eeg/sub-03_ses-1_task-checker_run-2_eeg.vhdr",
                "/out/x.fif",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program() {
        let processor = processor_with(Step::Gradient, "/nonexistent/cleaner_12345", &[]);
        let file = file();
        let output = PathBuf::from("/tmp/never_written.fif");
        let job = StepJob {
            step: Step::Gradient,
            file: &file,
            input: &file.path,
            output: &output,
        };
        let err = processor.apply(&job).await.unwrap_err();
        assert!(matches!(err, CleanError::StepFailed { .. }));
        assert!(err.to_string().contains("gradient"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_command_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("sub-01_task-rest_eeg.edf");
        std::fs::write(&input, "raw").unwrap();
        let output = tmp.path().join("out.fif");
        let file = BidsFile::from_path(&input).unwrap();

        let processor = processor_with(Step::Gradient, "cp", &["{input}", "{output}"]);
        let job = StepJob {
            step: Step::Gradient,
            file: &file,
            input: &input,
            output: &output,
        };
        processor.apply(&job).await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "raw");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_and_missing_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("sub-01_task-rest_eeg.edf");
        std::fs::write(&input, "raw").unwrap();
        let output = tmp.path().join("out.fif");
        let file = BidsFile::from_path(&input).unwrap();
        let job = StepJob {
            step: Step::Qc,
            file: &file,
            input: &input,
            output: &output,
        };

        let failing = processor_with(Step::Qc, "sh", &["-c", "echo bad channel >&2; exit 3"]);
        let err = failing.apply(&job).await.unwrap_err().to_string();
        assert!(err.contains("bad channel"));

        let silent = processor_with(Step::Qc, "true", &[]);
        let err = silent.apply(&job).await.unwrap_err().to_string();
        assert!(err.contains("did not write"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_output_does_not_count_as_written() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("sub-01_task-rest_eeg.edf");
        std::fs::write(&input, "raw").unwrap();
        let output = tmp.path().join("out.fif");
        std::fs::write(&output, "previous run").unwrap();
        let file = BidsFile::from_path(&input).unwrap();
        let job = StepJob {
            step: Step::Gradient,
            file: &file,
            input: &input,
            output: &output,
        };

        let silent = processor_with(Step::Gradient, "true", &[]);
        let err = silent.apply(&job).await.unwrap_err();
        assert!(matches!(err, CleanError::StepFailed { .. }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_output_equal_to_input_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("sub-01_task-rest_eeg.fif");
        std::fs::write(&input, "raw").unwrap();
        let file = BidsFile::from_path(&input).unwrap();
        let job = StepJob {
            step: Step::Gradient,
            file: &file,
            input: &input,
            output: &input,
        };

        let processor = processor_with(Step::Gradient, "cp", &["{input}", "{output}"]);
        let err = processor.apply(&job).await.unwrap_err();
        assert!(err.to_string().contains("overwrite the input"));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), "raw");
    }
}
