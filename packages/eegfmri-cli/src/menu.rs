//! Multi-select menus for steps and entity values.

use eegfmri_clean::{CleanError, Entity, Result};
use std::ops::Range;

pub const SELECT_ALL: &str = "Select all";
pub const ENTER_RANGE: &str = "Enter range";

/// Source of user choices.
pub trait Prompt {
    /// Show `entries` as a checklist and return the checked indices.
    fn multi_select(&mut self, title: &str, entries: &[String], preselected: &[usize])
        -> Result<Vec<usize>>;

    /// Ask for a non-negative integer.
    fn read_integer(&mut self, message: &str) -> Result<u64>;
}

/// A checklist of values, optionally led by "Select all" and "Enter range".
pub struct InteractiveMenu {
    title: String,
    values: Vec<String>,
    select_all: bool,
    enter_range: bool,
}

impl InteractiveMenu {
    /// Menu with the plain values only
    pub fn new(title: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            title: title.into(),
            values,
            select_all: false,
            enter_range: false,
        }
    }

    /// Menu over the existing values of an entity. With more than one value it
    /// offers "Select all", and "Enter range" when all values are integers.
    pub fn for_entity(entity: Entity, values: Vec<String>) -> Self {
        let several = values.len() > 1;
        let numeric = values.iter().all(|v| v.parse::<u64>().is_ok());
        Self {
            title: format!("Select {} (space: toggle, enter: confirm)", entity),
            select_all: several,
            enter_range: several && entity.is_indexed() && numeric,
            values,
        }
    }

    /// Entries as displayed, special options first
    pub fn entries(&self) -> Vec<String> {
        let mut entries = Vec::with_capacity(self.values.len() + 2);
        if self.select_all {
            entries.push(SELECT_ALL.to_string());
        }
        if self.enter_range {
            entries.push(ENTER_RANGE.to_string());
        }
        entries.extend(self.values.iter().cloned());
        entries
    }

    fn offset(&self) -> usize {
        self.select_all as usize + self.enter_range as usize
    }

    /// Show the menu and translate the answer into values. `preselected`
    /// indexes into the plain values.
    pub fn run(&self, prompt: &mut dyn Prompt, preselected: &[usize]) -> Result<Vec<String>> {
        let offset = self.offset();
        let preselected: Vec<usize> = preselected.iter().map(|i| i + offset).collect();
        let indices = prompt.multi_select(&self.title, &self.entries(), &preselected)?;

        if self.select_all && indices.contains(&0) {
            return Ok(self.values.clone());
        }

        if self.enter_range && indices.contains(&1) {
            let start = prompt.read_integer("Enter the start of the range: ")?;
            let end = prompt.read_integer("Enter the end of the range: ")?;
            if end < start {
                return Err(CleanError::Menu(format!(
                    "end of range {} is lower than start {}",
                    end, start
                )));
            }
            return Ok(self
                .values
                .iter()
                .filter(|v| v.parse::<u64>().map_or(false, |id| start <= id && id <= end))
                .cloned()
                .collect());
        }

        let mut selected = Vec::with_capacity(indices.len());
        for index in indices {
            let value = index
                .checked_sub(offset)
                .and_then(|i| self.values.get(i))
                .ok_or_else(|| CleanError::Menu(format!("invalid menu index {}", index)))?;
            selected.push(value.clone());
        }
        Ok(selected)
    }
}

/// Cursor and check marks of a checklist being edited.
#[derive(Debug, Clone)]
pub struct ChecklistState {
    cursor: usize,
    checked: Vec<bool>,
}

impl ChecklistState {
    pub fn new(len: usize, preselected: &[usize]) -> Self {
        let mut checked = vec![false; len];
        for &i in preselected {
            if let Some(c) = checked.get_mut(i) {
                *c = true;
            }
        }
        Self { cursor: 0, checked }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn move_up(&mut self) {
        if self.checked.is_empty() {
            return;
        }
        self.cursor = if self.cursor == 0 {
            self.checked.len() - 1
        } else {
            self.cursor - 1
        };
    }

    pub fn move_down(&mut self) {
        if self.checked.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.checked.len();
    }

    pub fn toggle(&mut self) {
        if let Some(c) = self.checked.get_mut(self.cursor) {
            *c = !*c;
        }
    }

    /// Indices to display in `height` rows, scrolled so the cursor is visible.
    pub fn window(&self, height: usize) -> Range<usize> {
        let len = self.checked.len();
        let height = height.max(1);
        if len <= height {
            return 0..len;
        }
        let start = (self.cursor + 1).saturating_sub(height).min(len - height);
        start..start + height
    }

    pub fn selected(&self) -> Vec<usize> {
        self.checked
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(|(i, _)| i)
            .collect()
    }
}
