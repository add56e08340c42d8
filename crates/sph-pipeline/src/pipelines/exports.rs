//! Global export table
//!
//! Named integer constants broadcast to every program of a pipeline. The list
//! is built once and then frozen into a [`GlobalExport`] snapshot; each pass
//! keeps the snapshot it was compiled against.

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Immutable table of named integer constants
///
/// Cloning is cheap: the entries are shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalExport {
    entries: Arc<[(String, i32)]>,
}

impl GlobalExport {
    /// Looks up the value of an export
    pub fn get(&self, name: &str) -> Option<i32> {
        self.entries.iter().find(|(entry, _)| entry == name).map(|(_, value)| *value)
    }

    /// Iterates over `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates exports until [`ExportList::build`] freezes them
#[derive(Debug, Default)]
pub struct ExportList {
    entries: Vec<(String, i32)>,
    finalized: bool,
}

impl ExportList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an integer constant
    ///
    /// # Errors
    /// * `Finalized` once [`ExportList::build`] has been called
    /// * `DuplicateName` if `name` was already added
    pub fn add_int(&mut self, name: &str, value: i32) -> Result<&mut Self> {
        if self.finalized {
            return Err(PipelineError::Finalized { name: name.to_string() });
        }
        if self.entries.iter().any(|(entry, _)| entry == name) {
            return Err(PipelineError::DuplicateName {
                kind: "export",
                name: name.to_string(),
            });
        }

        self.entries.push((name.to_string(), value));
        Ok(self)
    }

    /// Freezes the list and returns its snapshot
    ///
    /// Calling this again returns an identical snapshot.
    pub fn build(&mut self) -> GlobalExport {
        self.finalized = true;
        GlobalExport {
            entries: self.entries.clone().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_preserves_insertion_order() {
        let mut list = ExportList::new();
        list.add_int("PARTICLE_COUNT", 9216).unwrap().add_int("PARTICLE_GROUP_SIZE", 96).unwrap();
        let exports = list.build();

        assert_eq!(exports.len(), 2);
        assert_eq!(exports.get("PARTICLE_COUNT"), Some(9216));
        assert_eq!(exports.get("RENDER_WIDTH"), None);
        assert_eq!(exports.iter().collect::<Vec<_>>(), vec![("PARTICLE_COUNT", 9216), ("PARTICLE_GROUP_SIZE", 96)]);
    }

    #[test]
    fn test_add_after_build_fails() {
        let mut list = ExportList::new();
        list.add_int("PARTICLE_COUNT", 4096).unwrap();
        let exports = list.build();

        let err = list.add_int("RENDER_WIDTH", 256).unwrap_err();
        assert_eq!(err, PipelineError::Finalized { name: "RENDER_WIDTH".to_string() });
        assert_eq!(exports.get("RENDER_WIDTH"), None);
        assert_eq!(list.build(), exports);
    }

    #[test]
    fn test_duplicate_export_is_rejected() {
        let mut list = ExportList::new();
        list.add_int("PARTICLE_COUNT", 1).unwrap();
        assert!(matches!(list.add_int("PARTICLE_COUNT", 2), Err(PipelineError::DuplicateName { kind: "export", .. })));
        assert_eq!(list.build().get("PARTICLE_COUNT"), Some(1));
    }
}
