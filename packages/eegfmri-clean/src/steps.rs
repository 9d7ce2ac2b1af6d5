//! Cleaning step definitions and selection.

use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};

/// A cleaning step. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Gradient,
    Bcg,
    Qc,
}

/// Static description of a step
#[derive(Debug, Clone, Serialize)]
pub struct StepMetadata {
    pub step: Step,
    pub name: &'static str,
    /// Tag appended to the derivatives folder name (`GRAD_BCG`)
    pub tag: &'static str,
    /// Whether the step writes a new recording that later steps consume
    pub produces_recording: bool,
    pub title: &'static str,
    pub documentation: &'static str,
}

pub static STEP_REGISTRY: [StepMetadata; 3] = [
    StepMetadata {
        step: Step::Gradient,
        name: "gradient",
        tag: "GRAD",
        produces_recording: true,
        title: "Gradient artifact removal",
        documentation: "Template subtraction of MR gradient artifacts locked to volume triggers.",
    },
    StepMetadata {
        step: Step::Bcg,
        name: "bcg",
        tag: "BCG",
        produces_recording: true,
        title: "BCG artifact removal",
        documentation: "Ballistocardiogram correction using projections computed on ECG/EOG channels.",
    },
    StepMetadata {
        step: Step::Qc,
        name: "qc",
        tag: "QC",
        produces_recording: false,
        title: "Quality control",
        documentation: "Signal quality report on the latest cleaned recording.",
    },
];

impl Step {
    pub const ALL: [Step; 3] = [Step::Gradient, Step::Bcg, Step::Qc];

    pub fn metadata(&self) -> &'static StepMetadata {
        // Registry is indexed by declaration order
        &STEP_REGISTRY[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.metadata().name
    }

    pub fn tag(&self) -> &'static str {
        self.metadata().tag
    }

    pub fn produces_recording(&self) -> bool {
        self.metadata().produces_recording
    }

    pub fn from_name(name: &str) -> Option<Self> {
        STEP_REGISTRY
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.step)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which steps to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSelection {
    pub gradient: bool,
    pub bcg: bool,
    pub qc: bool,
}

impl StepSelection {
    pub fn from_flags(gradient: bool, bcg: bool, qc: bool) -> Self {
        Self { gradient, bcg, qc }
    }

    pub fn from_steps<I: IntoIterator<Item = Step>>(steps: I) -> Self {
        let mut selection = Self::default();
        for step in steps {
            selection.set(step, true);
        }
        selection
    }

    pub fn contains(&self, step: Step) -> bool {
        match step {
            Step::Gradient => self.gradient,
            Step::Bcg => self.bcg,
            Step::Qc => self.qc,
        }
    }

    pub fn set(&mut self, step: Step, enabled: bool) {
        match step {
            Step::Gradient => self.gradient = enabled,
            Step::Bcg => self.bcg = enabled,
            Step::Qc => self.qc = enabled,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.gradient || self.bcg || self.qc)
    }

    /// Selected steps in execution order
    pub fn steps(&self) -> Vec<Step> {
        Step::ALL.into_iter().filter(|s| self.contains(*s)).collect()
    }

    /// Positions of the selected steps in [`Step::ALL`], used to preselect
    /// entries of the interactive checklist.
    pub fn indices(&self) -> Vec<usize> {
        Step::ALL
            .iter()
            .enumerate()
            .filter(|(_, s)| self.contains(**s))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn validate(self) -> Result<Self> {
        if self.is_empty() {
            return Err(CleanError::Configuration(
                "No cleaning step selected. Use --gradient, --bcg, --qc or --interactive"
                    .to_string(),
            ));
        }
        Ok(self)
    }
}
