use crate::dataset::BidsFile;
use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

const ERROR_LOG_NAME: &str = "report.txt";

/// Where cleaned outputs are written.
///
/// `<root>/<TAGS>/sub-<s>[/ses-<x>][/<datatype>]/<stem><ext>` where `<TAGS>`
/// joins the tags of the steps applied so far (`GRAD`, `GRAD_BCG`, ...).
#[derive(Debug, Clone)]
pub struct DerivativesLayout {
    root: PathBuf,
    output_extension: String,
}

impl DerivativesLayout {
    pub fn new(root: impl Into<PathBuf>, output_extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            output_extension: output_extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn process_dir(&self, tags: &[&str]) -> PathBuf {
        self.root.join(tags.join("_"))
    }

    /// Tags of a file that already lives in this layout (`GRAD_BCG/...`
    /// gives `["GRAD", "BCG"]`). Empty for files outside it.
    pub fn prior_tags(&self, file: &BidsFile) -> Vec<String> {
        let Ok(relative) = file.path.strip_prefix(&self.root) else {
            return Vec::new();
        };
        let mut components = relative.components();
        let process_dir = match (components.next(), components.next()) {
            (Some(first), Some(_)) => first.as_os_str().to_string_lossy().into_owned(),
            _ => return Vec::new(),
        };
        if process_dir.starts_with("sub-") {
            return Vec::new();
        }
        process_dir
            .split('_')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn output_dir(&self, file: &BidsFile, tags: &[&str]) -> PathBuf {
        self.process_dir(tags).join(file.entities.relative_dir())
    }

    /// Recording written after the steps in `tags`
    pub fn recording_path(&self, file: &BidsFile, tags: &[&str]) -> PathBuf {
        self.output_dir(file, tags)
            .join(format!("{}{}", file.entities.stem, self.output_extension))
    }

    /// Quality-control report written after the steps in `tags`
    pub fn qc_path(&self, file: &BidsFile, tags: &[&str]) -> PathBuf {
        self.output_dir(file, tags)
            .join(format!("{}_qc.json", file.entities.stem))
    }

    /// Copy the file's JSON sidecar into `dest_dir`. Returns `None` when the
    /// source recording has no sidecar.
    pub fn copy_sidecar(&self, file: &BidsFile, dest_dir: &Path) -> Result<Option<PathBuf>> {
        let source = file.sidecar_path();
        if !source.is_file() {
            log::warn!("The sidecar file {} does not exist", source.display());
            return Ok(None);
        }
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{}.json", file.entities.stem));
        std::fs::copy(&source, &dest)?;
        log::debug!("Copied sidecar to {}", dest.display());
        Ok(Some(dest))
    }

    /// Append a failure to the error log at the derivatives root.
    pub fn append_error(&self, file: &BidsFile, message: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let mut log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(ERROR_LOG_NAME))?;
        writeln!(
            log_file,
            "{} filename: {} error: {}",
            chrono::Utc::now().to_rfc3339(),
            file.path.display(),
            message
        )?;
        Ok(())
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.root.join(ERROR_LOG_NAME)
    }
}
