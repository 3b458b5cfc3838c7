//! The reviewable result of a rename run.

use crate::model::{FileEntry, SourceFile};

use super::error::PipelineError;

/// A source file and the entry the rename stage produced for it.
#[derive(Debug, Clone)]
pub struct ClassifyItem {
    pub file: SourceFile,
    pub entry: FileEntry,
}

impl ClassifyItem {
    pub fn new(file: SourceFile, entry: FileEntry) -> Self {
        Self { file, entry }
    }
}

/// Renamed files awaiting classification. The user may correct names or drop
/// files before classifying.
#[derive(Debug, Clone, Default)]
pub struct ReviewBatch {
    items: Vec<ClassifyItem>,
}

impl ReviewBatch {
    pub fn new(items: Vec<ClassifyItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ClassifyItem] {
        &self.items
    }

    pub fn entries(&self) -> Vec<FileEntry> {
        self.items.iter().map(|item| item.entry.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replaces the suggested name of one file. The name is trimmed.
    pub fn edit_name(&mut self, index: usize, name: &str) -> Result<&FileEntry, PipelineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PipelineError::EmptyName);
        }
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(PipelineError::IndexOutOfRange { index, len })?;
        item.entry.renamed = name.to_string();
        Ok(&item.entry)
    }

    pub fn remove(&mut self, index: usize) -> Result<ClassifyItem, PipelineError> {
        if index >= self.items.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn into_items(self) -> Vec<ClassifyItem> {
        self.items
    }
}

impl From<Vec<ClassifyItem>> for ReviewBatch {
    fn from(items: Vec<ClassifyItem>) -> Self {
        Self::new(items)
    }
}
