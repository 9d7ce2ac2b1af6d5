use clap::{Parser, ValueEnum};
use eegfmri_clean::DataFolder;
use std::path::PathBuf;

const INDEX_HELP: &str = "- '*' for all\n\
                          - 'x' for x\n\
                          - 'a,b,c' for a list\n\
                          - 'x-y' for x to y (inclusive)\n\
                          - 'x-*' for x to the last\n\
                          - '*-y' for the first to y";

const LABEL_HELP: &str = "- '*' for all\n\
                          - 'a' for a\n\
                          - 'a,b' for a list\n\
                          - glob patterns such as 'check*'";

#[derive(Parser)]
#[command(
    name = "eegfmri-clean",
    version,
    about = "Clean EEG data recorded during fMRI in a BIDS dataset",
    long_about = "Select EEG recordings in a BIDS dataset and run gradient artifact removal,\n\
                  BCG correction and quality control on each of them, in that order.\n\
                  Steps run as external programs configured with --config or $EEGFMRI_CLEAN_CONFIG."
)]
pub struct Cli {
    /// Root folder of the BIDS dataset
    #[arg(long)]
    pub root: PathBuf,

    /// Data folder under the root to search for files
    #[arg(long, value_enum)]
    pub datafolder: Option<DataFolderArg>,

    /// Subject IDs
    #[arg(long, long_help = format!("Subject IDs:\n{}", INDEX_HELP))]
    pub subject: Option<String>,

    /// Session IDs
    #[arg(long, long_help = format!("Session IDs:\n{}", INDEX_HELP))]
    pub session: Option<String>,

    /// Run IDs
    #[arg(long, long_help = format!("Run IDs:\n{}", INDEX_HELP))]
    pub run: Option<String>,

    /// Task labels
    #[arg(long, long_help = format!("Task labels:\n{}", LABEL_HELP))]
    pub task: Option<String>,

    /// File extensions (default: recording formats only)
    #[arg(long, long_help = format!("File extensions:\n{}", LABEL_HELP))]
    pub extension: Option<String>,

    /// Datatype folder
    #[arg(long, default_value = "eeg")]
    pub datatype: String,

    /// File suffix
    #[arg(long, default_value = "eeg")]
    pub suffix: String,

    /// Description label (derivative data only)
    #[arg(long)]
    pub description: Option<String>,

    /// Run the interactive menu
    #[arg(long, default_value_t = false)]
    pub interactive: bool,

    /// Clean the gradient artifacts
    #[arg(long, default_value_t = false)]
    pub gradient: bool,

    /// Clean the BCG artifacts
    #[arg(long, default_value_t = false)]
    pub bcg: bool,

    /// Run the quality control step
    #[arg(long, default_value_t = false)]
    pub qc: bool,

    /// Pipeline configuration file (JSON)
    #[arg(long, env = "EEGFMRI_CLEAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Derivatives directory (default: <root>/derivatives)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON batch report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// List matching files without running any step
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the dry-run listing as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn has_step_flags(&self) -> bool {
        self.gradient || self.bcg || self.qc
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DataFolderArg {
    Source,
    Rawdata,
    Derivatives,
}

impl From<DataFolderArg> for DataFolder {
    fn from(arg: DataFolderArg) -> Self {
        match arg {
            DataFolderArg::Source => DataFolder::Source,
            DataFolderArg::Rawdata => DataFolder::Rawdata,
            DataFolderArg::Derivatives => DataFolder::Derivatives,
        }
    }
}
