pub mod config;
pub mod dataset;
pub mod derivatives;
pub mod entities;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod steps;
pub mod summary;

pub use config::{PipelineConfig, StepCommand, StepCommands};
pub use dataset::{locate, BidsFile, DataFolder, Dataset, DatasetQuery, RECORDING_EXTENSIONS};
pub use derivatives::DerivativesLayout;
pub use entities::{BidsEntities, Entity};
pub use error::{CleanError, Result};
pub use filter::EntityFilter;
pub use pipeline::{Pipeline, ProgressEvent};
pub use processor::{CommandProcessor, StepJob, StepProcessor};
pub use report::{BatchOutcome, BatchReport, FileReport, StepReport, StepStatus};
pub use steps::{Step, StepMetadata, StepSelection, STEP_REGISTRY};
pub use summary::{DatasetSummary, EntitySummary};
