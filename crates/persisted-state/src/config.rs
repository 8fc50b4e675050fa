//! Store options, optionally read from a TOML file.
//!
//! ```toml
//! format = "json"        # or "toml"
//! atomic_writes = true   # write to `<file>.tmp`, then rename over the state file
//! create_dirs = true     # create missing parent directories on save
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};
use crate::format::FormatKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    pub format: FormatKind,
    pub atomic_writes: bool,
    pub create_dirs: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            format: FormatKind::Json,
            atomic_writes: true,
            create_dirs: true,
        }
    }
}

impl StoreOptions {
    pub fn from_file(path: &Path) -> StateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            op: "read",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> StateResult<Self> {
        toml::from_str(content).map_err(|e| StateError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> StateResult<String> {
        toml::to_string_pretty(self).map_err(|e| StateError::Config(e.to_string()))
    }

    pub fn with_format(mut self, format: FormatKind) -> Self {
        self.format = format;
        self
    }

    pub fn with_atomic_writes(mut self, atomic_writes: bool) -> Self {
        self.atomic_writes = atomic_writes;
        self
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }
}
