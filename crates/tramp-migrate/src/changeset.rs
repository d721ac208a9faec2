//! Change-sets and their loaders.
//!
//! A [`ChangeSet`] describes one migration file: `up` queues the changes
//! on a schema [`Builder`], `down` queues their reversal. Loaders turn the
//! files found in the configured directories into change-sets.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tramp_schema::Builder;

use crate::error::{MigrateError, Result};

/// Which half of a change-set to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// A unit of schema change.
pub trait ChangeSet: Send + Sync {
    /// Queues the changes.
    fn up(&self, schema: &mut Builder);

    /// Queues the reversal. Does nothing unless overridden.
    fn down(&self, _schema: &mut Builder) {}

    /// Queues the half selected by `direction`.
    fn apply(&self, direction: Direction, schema: &mut Builder) {
        match direction {
            Direction::Up => self.up(schema),
            Direction::Down => self.down(schema),
        }
    }
}

/// Turns change-set files into [`ChangeSet`]s.
pub trait ChangeSetLoader: Send + Sync {
    /// Whether this loader handles the file.
    fn accepts(&self, path: &Path) -> bool;

    /// Loads the change-set stored at `path`.
    fn load(&self, path: &Path) -> Result<Arc<dyn ChangeSet>>;
}

/// Change-sets compiled into the binary, keyed by file name.
///
/// The file itself must still exist in a configured directory to be
/// discovered; its contents are not read.
#[derive(Default)]
pub struct ChangeSetRegistry {
    entries: BTreeMap<String, Arc<dyn ChangeSet>>,
}

impl fmt::Debug for ChangeSetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSetRegistry")
            .field("files", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ChangeSetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `change_set` under `file`, replacing any previous entry.
    #[must_use]
    pub fn register(mut self, file: impl Into<String>, change_set: impl ChangeSet + 'static) -> Self {
        self.entries.insert(file.into(), Arc::new(change_set));
        self
    }

    #[must_use]
    pub fn contains(&self, file: &str) -> bool {
        self.entries.contains_key(file)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

impl ChangeSetLoader for ChangeSetRegistry {
    fn accepts(&self, path: &Path) -> bool {
        file_name(path).is_some_and(|name| self.contains(name))
    }

    fn load(&self, path: &Path) -> Result<Arc<dyn ChangeSet>> {
        file_name(path)
            .and_then(|name| self.entries.get(name))
            .cloned()
            .ok_or_else(|| MigrateError::Load {
                path: path.to_path_buf(),
                message: String::from("no registered change-set for this file"),
            })
    }
}
