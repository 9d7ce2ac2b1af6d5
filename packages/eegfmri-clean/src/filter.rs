//! Entity filter expressions: wildcards, lists, inclusive ranges and globs.

use crate::entities::{labels_equal, normalize_extension, strip_entity_prefix, Entity};
use crate::error::{CleanError, Result};

/// Widest bounded range [`EntityFilter::expand`] lists explicitly
pub const MAX_EXPANDED_RANGE: u64 = 10_000;

/// A constraint on one BIDS entity.
///
/// Accepted syntax:
/// - `*` for any existing value
/// - `x` for a single value, `a,b,c` or `[a,b,c]` for a list
/// - `x-y`, `x-*`, `*-y` for an inclusive integer range
/// - any other glob pattern (`rest*`, `check?r`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityFilter {
    Any,
    Values(Vec<String>),
    Range { start: Option<u64>, end: Option<u64> },
    Pattern(glob::Pattern),
}

impl EntityFilter {
    pub fn parse(entity: Entity, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CleanError::invalid_filter(entity.name(), "empty value"));
        }
        if raw == "*" {
            return Ok(Self::Any);
        }

        let unbracketed = raw
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(raw);
        if unbracketed.contains(',') || unbracketed.len() != raw.len() {
            let mut values = Vec::new();
            for item in unbracketed.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                // BIDS labels are alphanumeric, so a dash can only be a range
                if strip_entity_prefix(item).contains('-') {
                    return Err(CleanError::invalid_filter(
                        entity.name(),
                        format!(
                            "'{}' mixes a range into a list; use either a range (1-3) or a list (1,2,3)",
                            raw
                        ),
                    ));
                }
                values.push(normalize_value(entity, item));
            }
            if values.is_empty() {
                return Err(CleanError::invalid_filter(entity.name(), "empty list"));
            }
            return Ok(Self::Values(values));
        }

        let value = strip_entity_prefix(raw);

        if let Some((start, end)) = value.split_once('-') {
            return parse_range(entity, start.trim(), end.trim());
        }

        if value.contains(['*', '?', '[']) {
            let pattern = normalize_value(entity, value);
            return glob::Pattern::new(&pattern)
                .map(Self::Pattern)
                .map_err(|e| CleanError::invalid_filter(entity.name(), e.to_string()));
        }

        Ok(Self::Values(vec![normalize_value(entity, value)]))
    }

    /// Build a filter from values picked in a menu.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    /// Explicit integers covered by this filter, when that set is finite.
    ///
    /// `1-3` expands to `[1, 2, 3]`; open ranges, wildcards and globs return
    /// `None` because their extent depends on the dataset, and so do ranges
    /// spanning more than [`MAX_EXPANDED_RANGE`] values.
    pub fn expand(&self) -> Option<Vec<u64>> {
        match self {
            Self::Range {
                start: Some(start),
                end: Some(end),
            } if end - start < MAX_EXPANDED_RANGE => Some((*start..=*end).collect()),
            Self::Values(values) => values.iter().map(|v| v.parse::<u64>().ok()).collect(),
            _ => None,
        }
    }

    /// Whether a file whose entity has `value` passes this filter.
    ///
    /// Fails when a range is applied to a non-integer label.
    pub fn matches(&self, entity: Entity, value: Option<&str>) -> Result<bool> {
        let Some(value) = value else {
            return Ok(false);
        };
        match self {
            Self::Any => Ok(true),
            Self::Values(values) => Ok(values.iter().any(|v| labels_equal(v, value))),
            Self::Pattern(pattern) => Ok(pattern.matches(value)),
            Self::Range { start, end } => {
                let id = value.parse::<u64>().map_err(|_| {
                    CleanError::invalid_filter(
                        entity.name(),
                        format!(
                            "range not valid as '{}' is not an integer; select values explicitly",
                            value
                        ),
                    )
                })?;
                Ok(start.map_or(true, |s| id >= s) && end.map_or(true, |e| id <= e))
            }
        }
    }
}

impl std::fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |b: &Option<u64>| b.map_or_else(|| "*".to_string(), |v| v.to_string());
        match self {
            Self::Any => f.write_str("*"),
            Self::Values(values) => f.write_str(&values.join(",")),
            Self::Range { start, end } => write!(f, "{}-{}", bound(start), bound(end)),
            Self::Pattern(pattern) => f.write_str(pattern.as_str()),
        }
    }
}

fn normalize_value(entity: Entity, value: &str) -> String {
    let value = strip_entity_prefix(value);
    if entity == Entity::Extension {
        normalize_extension(value)
    } else {
        value.to_string()
    }
}

fn parse_range(entity: Entity, start: &str, end: &str) -> Result<EntityFilter> {
    let bound = |s: &str| -> Result<Option<u64>> {
        if s == "*" {
            return Ok(None);
        }
        s.parse::<u64>().map(Some).map_err(|_| {
            CleanError::invalid_filter(
                entity.name(),
                format!(
                    "'{}-{}' is not a range; use integers like 1-3, 2-* or *-4",
                    start, end
                ),
            )
        })
    };

    let start_bound = bound(start)?;
    let end_bound = bound(end)?;

    match (start_bound, end_bound) {
        (None, None) => Ok(EntityFilter::Any),
        (Some(s), Some(e)) if e < s => Err(CleanError::invalid_filter(
            entity.name(),
            format!("end value {} is lower than start value {}", e, s),
        )),
        _ => Ok(EntityFilter::Range {
            start: start_bound,
            end: end_bound,
        }),
    }
}
