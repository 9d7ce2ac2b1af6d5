//! BIDS entities: the key-value labels encoded in BIDS file names and folders.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefixes users commonly type in front of entity labels (e.g. `sub-01`).
const ENTITY_PREFIXES: &[&str] = &["sub-", "ses-", "task-", "acq-", "run-", "desc-"];

/// A BIDS entity that can be used to filter files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Subject,
    Session,
    Task,
    Acquisition,
    Run,
    Description,
    Datatype,
    Suffix,
    Extension,
}

impl Entity {
    /// Entities in the order they are summarized and prompted.
    pub const ALL: [Entity; 9] = [
        Entity::Subject,
        Entity::Session,
        Entity::Task,
        Entity::Acquisition,
        Entity::Run,
        Entity::Description,
        Entity::Datatype,
        Entity::Suffix,
        Entity::Extension,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Entity::Subject => "subject",
            Entity::Session => "session",
            Entity::Task => "task",
            Entity::Acquisition => "acquisition",
            Entity::Run => "run",
            Entity::Description => "description",
            Entity::Datatype => "datatype",
            Entity::Suffix => "suffix",
            Entity::Extension => "extension",
        }
    }

    /// Key used in file names (`sub` in `sub-01`), if the entity has one.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Entity::Subject => Some("sub"),
            Entity::Session => Some("ses"),
            Entity::Task => Some("task"),
            Entity::Acquisition => Some("acq"),
            Entity::Run => Some("run"),
            Entity::Description => Some("desc"),
            Entity::Datatype | Entity::Suffix | Entity::Extension => None,
        }
    }

    /// Entities whose labels are conventionally integers and accept ranges.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Entity::Subject | Entity::Session | Entity::Run)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Entities parsed from a BIDS path such as
/// `sub-01/ses-02/eeg/sub-01_ses-02_task-rest_run-1_eeg.vhdr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidsEntities {
    pub subject: String,
    pub session: Option<String>,
    pub task: Option<String>,
    pub acquisition: Option<String>,
    pub run: Option<String>,
    pub description: Option<String>,
    pub datatype: Option<String>,
    pub suffix: String,
    pub extension: String,
    /// File name without extension, kept verbatim so unknown entities survive.
    pub stem: String,
}

impl BidsEntities {
    /// Parse the entities of a BIDS file. Returns `None` for files that do
    /// not follow the `sub-<label>_..._<suffix><extension>` naming.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let (stem, extension) = match file_name.find('.') {
            Some(idx) => (&file_name[..idx], &file_name[idx..]),
            None => (file_name, ""),
        };

        let mut parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 2 {
            return None;
        }
        let suffix = parts.pop()?;
        if suffix.is_empty() || suffix.contains('-') {
            return None;
        }

        let mut entities = BidsEntities {
            subject: String::new(),
            session: None,
            task: None,
            acquisition: None,
            run: None,
            description: None,
            datatype: None,
            suffix: suffix.to_string(),
            extension: extension.to_string(),
            stem: stem.to_string(),
        };

        for part in parts {
            let (key, value) = part.split_once('-')?;
            if value.is_empty() {
                return None;
            }
            let value = Some(value.to_string());
            match key {
                "sub" => entities.subject = value.unwrap_or_default(),
                "ses" => entities.session = value,
                "task" => entities.task = value,
                "acq" => entities.acquisition = value,
                "run" => entities.run = value,
                "desc" => entities.description = value,
                // Other entities (ce, rec, echo, ...) are preserved in the stem only
                _ => {}
            }
        }

        if entities.subject.is_empty() {
            return None;
        }

        entities.datatype = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .filter(|n| !n.starts_with("sub-") && !n.starts_with("ses-"))
            .map(str::to_string);

        Some(entities)
    }

    /// Value of one entity, if present.
    pub fn get(&self, entity: Entity) -> Option<&str> {
        match entity {
            Entity::Subject => Some(self.subject.as_str()),
            Entity::Session => self.session.as_deref(),
            Entity::Task => self.task.as_deref(),
            Entity::Acquisition => self.acquisition.as_deref(),
            Entity::Run => self.run.as_deref(),
            Entity::Description => self.description.as_deref(),
            Entity::Datatype => self.datatype.as_deref(),
            Entity::Suffix => Some(self.suffix.as_str()),
            Entity::Extension => Some(self.extension.as_str()),
        }
    }

    /// Folder of the file relative to a BIDS root: `sub-01[/ses-02][/eeg]`.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(format!("sub-{}", self.subject));
        if let Some(ref session) = self.session {
            dir.push(format!("ses-{}", session));
        }
        if let Some(ref datatype) = self.datatype {
            dir.push(datatype);
        }
        dir
    }
}

/// Remove a leading BIDS entity prefix (`sub-01` -> `01`).
pub fn strip_entity_prefix(value: &str) -> &str {
    let lower = value.to_ascii_lowercase();
    for prefix in ENTITY_PREFIXES {
        if lower.starts_with(prefix) {
            return &value[prefix.len()..];
        }
    }
    value
}

/// Ensure an extension carries its leading dot (`edf` -> `.edf`).
pub fn normalize_extension(value: &str) -> String {
    if value.starts_with('.') || value.starts_with('*') {
        value.to_string()
    } else {
        format!(".{}", value)
    }
}

/// Compare two labels, numerically when both are integers (`01` == `1`).
pub fn labels_equal(a: &str, b: &str) -> bool {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}
