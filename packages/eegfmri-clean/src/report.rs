use crate::error::Result;
use crate::steps::Step;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// Not attempted because an earlier step of the same file failed
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
    pub output: Option<PathBuf>,
    pub elapsed_secs: f64,
    pub error: Option<String>,
}

impl StepReport {
    pub fn skipped(step: Step) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
            output: None,
            elapsed_secs: 0.0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub steps: Vec<StepReport>,
}

impl FileReport {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Succeeded)
    }

    pub fn error(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| s.error.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Success,
    PartialFailure,
    Failure,
}

/// Result of running the pipeline over a set of files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub id: String,
    pub steps: Vec<Step>,
    pub files: Vec<FileReport>,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_secs: f64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn outcome(&self) -> BatchOutcome {
        match (self.succeeded(), self.failed()) {
            (_, 0) => BatchOutcome::Success,
            (0, _) => BatchOutcome::Failure,
            _ => BatchOutcome::PartialFailure,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_report(statuses: &[StepStatus]) -> FileReport {
        FileReport {
            file: PathBuf::from("sub-01_task-rest_eeg.edf"),
            steps: statuses
                .iter()
                .zip(Step::ALL)
                .map(|(status, step)| StepReport {
                    step,
                    status: *status,
                    output: None,
                    elapsed_secs: 0.1,
                    error: (*status == StepStatus::Failed).then(|| "boom".to_string()),
                })
                .collect(),
        }
    }

    fn batch(files: Vec<FileReport>) -> BatchReport {
        BatchReport {
            id: "test".to_string(),
            steps: Step::ALL.to_vec(),
            files,
            started_at: String::new(),
            finished_at: String::new(),
            elapsed_secs: 0.0,
        }
    }

    #[test]
    fn test_outcomes() {
        use StepStatus::*;
        let ok = file_report(&[Succeeded, Succeeded, Succeeded]);
        let bad = file_report(&[Succeeded, Failed, Skipped]);

        assert_eq!(batch(vec![ok.clone(), ok.clone()]).outcome(), BatchOutcome::Success);
        assert_eq!(batch(vec![ok.clone(), bad.clone()]).outcome(), BatchOutcome::PartialFailure);
        assert_eq!(batch(vec![bad.clone()]).outcome(), BatchOutcome::Failure);
        assert_eq!(bad.error(), Some("boom"));
    }

    #[test]
    fn test_write_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reports/batch.json");
        let report = batch(vec![file_report(&[StepStatus::Succeeded])]);
        report.write_json(&path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["files"][0]["steps"][0]["status"], "succeeded");
        assert_eq!(parsed["steps"][1], "bcg");
    }
}
