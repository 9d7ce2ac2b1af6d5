use crate::dataset::{distinct_values, BidsFile};
use crate::entities::Entity;
use serde::Serialize;

/// Values shown before a preview collapses to `(first ... last)`
const PREVIEW_LIMIT: usize = 4;

/// Distinct values of one entity among a set of files
#[derive(Debug, Clone, Serialize)]
pub struct EntitySummary {
    pub entity: Entity,
    pub values: Vec<String>,
}

impl EntitySummary {
    pub fn preview(&self) -> String {
        if self.values.len() <= PREVIEW_LIMIT {
            format!("({})", self.values.join(", "))
        } else {
            format!(
                "({} ... {})",
                self.values[0],
                self.values[self.values.len() - 1]
            )
        }
    }
}

/// Per-entity overview of a file selection
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub entities: Vec<EntitySummary>,
    pub file_count: usize,
}

impl DatasetSummary {
    pub fn from_files(files: &[BidsFile]) -> Self {
        let entities = Entity::ALL
            .iter()
            .map(|&entity| EntitySummary {
                entity,
                values: distinct_values(files.iter().filter_map(|f| f.entities.get(entity))),
            })
            .filter(|s| !s.values.is_empty())
            .collect();
        Self {
            entities,
            file_count: files.len(),
        }
    }
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for summary in &self.entities {
            let mut label = summary.entity.name().to_string();
            if let Some(first) = label.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            writeln!(
                f,
                "{}s: {} {}",
                label,
                summary.values.len(),
                summary.preview()
            )?;
        }
        write!(f, "Files: {}", self.file_count)
    }
}
