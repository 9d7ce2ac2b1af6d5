//! Pipeline configuration: step commands, output layout and recording formats.
//!
//! Lookup order: explicit path, `$EEGFMRI_CLEAN_CONFIG`,
//! `<config dir>/eegfmri-clean/config.json`, then built-in defaults.
//! `$EEGFMRI_CLEAN_PYTHON` replaces the interpreter of default step commands.

use crate::dataset::RECORDING_EXTENSIONS;
use crate::entities::normalize_extension;
use crate::error::{CleanError, Result};
use crate::steps::Step;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "EEGFMRI_CLEAN_CONFIG";
pub const PYTHON_ENV: &str = "EEGFMRI_CLEAN_PYTHON";
pub const DEFAULT_PYTHON: &str = "python3";
const CONFIG_DIR_NAME: &str = "eegfmri-clean";
const CONFIG_FILE_NAME: &str = "config.json";

/// External program invocation for one step.
///
/// Arguments may contain `{input}`, `{output}`, `{step}`, `{subject}`,
/// `{session}`, `{task}` and `{run}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl StepCommand {
    fn python_script(script: &str) -> Self {
        Self {
            program: DEFAULT_PYTHON.to_string(),
            args: vec![
                script.to_string(),
                "--input".to_string(),
                "{input}".to_string(),
                "--output".to_string(),
                "{output}".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepCommands {
    pub gradient: StepCommand,
    pub bcg: StepCommand,
    pub qc: StepCommand,
}

impl Default for StepCommands {
    fn default() -> Self {
        Self {
            gradient: StepCommand::python_script("gradient_cleaning.py"),
            bcg: StepCommand::python_script("bcg_cleaning.py"),
            qc: StepCommand::python_script("quality_control.py"),
        }
    }
}

impl StepCommands {
    pub fn get(&self, step: Step) -> &StepCommand {
        match step {
            Step::Gradient => &self.gradient,
            Step::Bcg => &self.bcg,
            Step::Qc => &self.qc,
        }
    }

    fn get_mut(&mut self, step: Step) -> &mut StepCommand {
        match step {
            Step::Gradient => &mut self.gradient,
            Step::Bcg => &mut self.bcg,
            Step::Qc => &mut self.qc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Derivatives root; `<dataset root>/derivatives` when unset
    pub derivatives_dir: Option<PathBuf>,
    /// Extension of recordings written by data-producing steps
    pub output_extension: String,
    /// Extensions considered recordings when no extension filter is given
    pub recording_extensions: Vec<String>,
    pub steps: StepCommands,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            derivatives_dir: None,
            output_extension: ".fif".to_string(),
            recording_extensions: RECORDING_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            steps: StepCommands::default(),
        }
    }
}

impl PipelineConfig {
    /// Resolve and load the configuration, then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(Path::new(&path))?,
                None => match Self::default_path().filter(|p| p.is_file()) {
                    Some(path) => Self::from_file(&path)?,
                    None => {
                        log::debug!("No configuration file found, using defaults");
                        Self::default()
                    }
                },
            },
        };
        config
            .with_python(std::env::var(PYTHON_ENV).ok())
            .validate()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleanError::Configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CleanError::Configuration(format!(
                "Invalid config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Replace the default interpreter in step commands that still use it.
    pub fn with_python(mut self, python: Option<String>) -> Self {
        if let Some(python) = python.filter(|p| !p.trim().is_empty()) {
            for step in Step::ALL {
                let command = self.steps.get_mut(step);
                if command.program == DEFAULT_PYTHON {
                    command.program = python.clone();
                }
            }
        }
        self
    }

    pub fn validate(mut self) -> Result<Self> {
        for step in Step::ALL {
            if self.steps.get(step).program.trim().is_empty() {
                return Err(CleanError::Configuration(format!(
                    "No program configured for step '{}'",
                    step
                )));
            }
        }
        if self.output_extension.trim().is_empty() {
            return Err(CleanError::Configuration(
                "output_extension must not be empty".to_string(),
            ));
        }
        self.output_extension = normalize_extension(self.output_extension.trim());
        self.recording_extensions = self
            .recording_extensions
            .iter()
            .map(|e| normalize_extension(e.trim()))
            .collect();
        Ok(self)
    }

    /// Derivatives root for a dataset
    pub fn derivatives_root(&self, dataset_root: &Path) -> PathBuf {
        self.derivatives_dir
            .clone()
            .unwrap_or_else(|| dataset_root.join("derivatives"))
    }
}
