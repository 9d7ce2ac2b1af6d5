//! Dataset locator: resolves a BIDS root and entity filters into files.

use crate::entities::{BidsEntities, Entity};
use crate::error::{CleanError, Result};
use crate::filter::EntityFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Recording formats considered when no extension filter is given.
pub const RECORDING_EXTENSIONS: &[&str] = &[".edf", ".bdf", ".set", ".vhdr", ".fif", ".cnt", ".mff"];

/// Top-level folders that hold non-raw data and are not indexed for raw queries.
const NON_RAW_DIRS: &[&str] = &["derivatives", "sourcedata", "code"];

const MAX_DEPTH: usize = 8;

/// Sub-folder of the dataset root to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFolder {
    Source,
    Rawdata,
    Derivatives,
}

impl DataFolder {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DataFolder::Source => "source",
            DataFolder::Rawdata => "rawdata",
            DataFolder::Derivatives => "derivatives",
        }
    }
}

/// A file of the dataset with its parsed entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidsFile {
    pub path: PathBuf,
    pub entities: BidsEntities,
}

impl BidsFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let entities = BidsEntities::from_path(&path)?;
        Some(Self { path, entities })
    }

    /// JSON sidecar that shares the file's stem, if it would exist.
    pub fn sidecar_path(&self) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{}.json", self.entities.stem))
    }
}

/// Root path plus entity filters.
#[derive(Debug, Clone)]
pub struct DatasetQuery {
    pub root: PathBuf,
    pub data_folder: Option<DataFolder>,
    pub filters: BTreeMap<Entity, EntityFilter>,
    /// Extensions accepted when no extension filter is set
    pub recording_extensions: Vec<String>,
    /// Directories never indexed, such as the output derivatives root
    pub excluded_dirs: Vec<PathBuf>,
}

impl DatasetQuery {
    /// Query with the default `datatype=eeg`, `suffix=eeg` constraints.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut filters = BTreeMap::new();
        filters.insert(Entity::Datatype, EntityFilter::from_values(["eeg"]));
        filters.insert(Entity::Suffix, EntityFilter::from_values(["eeg"]));
        Self {
            root: root.into(),
            data_folder: None,
            filters,
            recording_extensions: RECORDING_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: Vec::new(),
        }
    }

    pub fn with_data_folder(mut self, data_folder: Option<DataFolder>) -> Self {
        self.data_folder = data_folder;
        self
    }

    pub fn with_filter(mut self, entity: Entity, filter: EntityFilter) -> Self {
        self.filters.insert(entity, filter);
        self
    }

    pub fn without_filter(mut self, entity: Entity) -> Self {
        self.filters.remove(&entity);
        self
    }

    /// Parse and set a filter from user input. `None` leaves the query unchanged.
    pub fn with_filter_str(self, entity: Entity, raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(raw) => {
                let filter = EntityFilter::parse(entity, raw)?;
                Ok(self.with_filter(entity, filter))
            }
            None => Ok(self),
        }
    }

    pub fn with_recording_extensions(mut self, extensions: Vec<String>) -> Self {
        self.recording_extensions = extensions;
        self
    }

    /// Skip `dir` and everything below it while indexing.
    pub fn with_excluded_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    pub fn filter(&self, entity: Entity) -> Option<&EntityFilter> {
        self.filters.get(&entity)
    }

    pub fn reading_root(&self) -> PathBuf {
        match self.data_folder {
            Some(folder) => self.root.join(folder.dir_name()),
            None => self.root.clone(),
        }
    }

    pub fn is_derivative(&self) -> bool {
        self.data_folder == Some(DataFolder::Derivatives)
    }

    /// Whether a file satisfies every filter of this query.
    pub fn accepts(&self, file: &BidsFile) -> Result<bool> {
        if !self.filters.contains_key(&Entity::Extension)
            && !self
                .recording_extensions
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(&file.entities.extension))
        {
            return Ok(false);
        }
        for (entity, filter) in &self.filters {
            if !filter.matches(*entity, file.entities.get(*entity))? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Every BIDS-named file found under a reading root.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    files: Vec<BidsFile>,
}

impl Dataset {
    /// Walk the reading root of `query` and index all BIDS-named files.
    pub fn index(query: &DatasetQuery) -> Result<Self> {
        let root = query.reading_root();
        if !root.is_dir() {
            return Err(CleanError::DatasetNotFound(root));
        }

        let skip_non_raw = !query.is_derivative();
        let excluded = excluded_below(&root, &query.excluded_dirs);
        let walker = WalkDir::new(&root)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| keep_entry(entry, &root, skip_non_raw, &excluded));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(file) = BidsFile::from_path(entry.into_path()) {
                files.push(file);
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        log::debug!("Indexed {} BIDS files under {}", files.len(), root.display());
        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[BidsFile] {
        &self.files
    }

    /// Files accepted by `query`, sorted by path. May be empty.
    pub fn select(&self, query: &DatasetQuery) -> Result<Vec<BidsFile>> {
        let mut selected = Vec::new();
        for file in &self.files {
            if query.accepts(file)? {
                selected.push(file.clone());
            }
        }
        Ok(selected)
    }

    /// Distinct values of one entity across the dataset, integers in numeric order.
    pub fn entity_values(&self, entity: Entity) -> Vec<String> {
        distinct_values(self.files.iter().filter_map(|f| f.entities.get(entity)))
    }
}

/// Index the dataset and return the files matching `query`.
///
/// Fails with [`CleanError::NotFound`] when nothing matches.
pub fn locate(query: &DatasetQuery) -> Result<Vec<BidsFile>> {
    let dataset = Dataset::index(query)?;
    let files = dataset.select(query)?;
    if files.is_empty() {
        return Err(CleanError::NotFound(dataset.root().to_path_buf()));
    }
    log::info!("Found {} file(s) under {}", files.len(), dataset.root().display());
    Ok(files)
}

/// Deduplicate labels; integer labels sort numerically and before text labels.
pub(crate) fn distinct_values<'a, I: Iterator<Item = &'a str>>(values: I) -> Vec<String> {
    let mut values: Vec<String> = values.map(str::to_string).collect();
    values.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    values.dedup();
    values
}

/// Excluded directories that exist strictly below `root`, relative to it.
fn excluded_below(root: &Path, dirs: &[PathBuf]) -> Vec<PathBuf> {
    let Ok(root) = root.canonicalize() else {
        return Vec::new();
    };
    dirs.iter()
        .filter_map(|dir| dir.canonicalize().ok())
        .filter_map(|dir| dir.strip_prefix(&root).ok().map(Path::to_path_buf))
        .filter(|relative| !relative.as_os_str().is_empty())
        .collect()
}

fn keep_entry(entry: &DirEntry, root: &Path, skip_non_raw: bool, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if entry.file_type().is_dir()
        && entry
            .path()
            .strip_prefix(root)
            .map_or(false, |relative| excluded.iter().any(|e| e == relative))
    {
        log::debug!("Skipping output directory {}", entry.path().display());
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    if skip_non_raw && entry.depth() == 1 && entry.file_type().is_dir() {
        return !NON_RAW_DIRS.contains(&name.as_ref());
    }
    true
}
