//! StateStore — schema-validated state persisted to a single file.
//!
//! The live state is held untyped so key paths can reach any depth. The codec
//! runs when the file is loaded and again before every write; in between, the
//! in-memory value is allowed to drift from the schema.

use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{Codec, SerdeCodec};
use crate::config::StoreOptions;
use crate::error::{DecodeError, StateError, StateResult};
use crate::format::TextFormat;
use crate::fs::{FileSystem, OsFileSystem};
use crate::path::{self, Key, KeyPath};

/// Convert a `std::io::Error` into `StateError::Io` via a closure factory.
macro_rules! io_err {
    ($op:literal, $path:expr) => {
        |source| StateError::Io {
            op: $op,
            path: $path.to_path_buf(),
            source,
        }
    };
}

fn collect_keys<K: Into<Key>>(keys: impl IntoIterator<Item = K>) -> Vec<Key> {
    keys.into_iter().map(Into::into).collect()
}

/// Join a lookup prefix with a path reported by the decoder (`.` is its root).
fn join_paths(prefix: &KeyPath, inner: &str) -> String {
    match (prefix.is_empty(), inner) {
        (true, inner) => inner.to_string(),
        (false, ".") => prefix.to_string(),
        (false, inner) if inner.starts_with('[') => format!("{prefix}{inner}"),
        (false, inner) => format!("{prefix}.{inner}"),
    }
}

/// A single state value backed by a file.
///
/// Owned by the application and passed where needed; there is no locking, so
/// one store per file per process.
pub struct StateStore<S, C = SerdeCodec<S>> {
    state: Value,
    path: PathBuf,
    codec: C,
    fs: Box<dyn FileSystem>,
    format: Box<dyn TextFormat>,
    options: StoreOptions,
    _shape: PhantomData<fn() -> S>,
}

impl<S, C: Codec<S>> StateStore<S, C> {
    /// Open the store at `path` on the local disk with default options.
    ///
    /// If the file exists it must parse and decode, otherwise this fails; the
    /// default is only used when there is no file. Nothing is written.
    pub fn open(path: impl Into<PathBuf>, codec: C, default: S) -> StateResult<Self> {
        Self::open_with_options(path, codec, default, StoreOptions::default())
    }

    /// Like [`open`](Self::open) with explicit options.
    pub fn open_with_options(
        path: impl Into<PathBuf>,
        codec: C,
        default: S,
        options: StoreOptions,
    ) -> StateResult<Self> {
        Self::open_with_fs(path, codec, default, options, OsFileSystem)
    }

    /// Open against any [`FileSystem`] implementation.
    pub fn open_with_fs(
        path: impl Into<PathBuf>,
        codec: C,
        default: S,
        options: StoreOptions,
        fs: impl FileSystem + 'static,
    ) -> StateResult<Self> {
        let path = path.into();
        let format = options.format.text_format();

        let state = if fs.exists(&path) {
            let text = fs.read_text(&path).map_err(io_err!("read", path))?;
            let value = format
                .from_text(&text)
                .map_err(|message| StateError::Parse {
                    path: path.clone(),
                    message,
                })?;
            codec.decode(&value)?;
            debug!(?path, format = format.name(), "state loaded from file");
            value
        } else {
            debug!(?path, "no state file, starting from default state");
            codec
                .encode(&default)
                .map_err(|e| StateError::Serialize(e.to_string()))?
        };

        Ok(Self {
            state,
            path,
            codec,
            fs: Box::new(fs),
            format,
            options,
            _shape: PhantomData,
        })
    }

    // ── File management ────────────────────────────────────────────

    /// Validate the current state and write it to the file.
    ///
    /// Nothing is written when validation fails. Missing parent directories
    /// are created unless `create_dirs` is off.
    pub fn save(&self) -> StateResult<()> {
        if let Err(e) = self.codec.decode(&self.state) {
            warn!(path = ?self.path, error = %e, "refusing to save state that does not match schema");
            return Err(e.into());
        }

        if self.options.create_dirs {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                self.fs
                    .create_dir_all(parent)
                    .map_err(io_err!("create directory", parent))?;
            }
        }

        let text = self.format.to_text(&self.state)?;
        if self.options.atomic_writes {
            let tmp = self.temp_path();
            if let Err(source) = self.fs.write_text(&tmp, &text) {
                self.discard_temp(&tmp);
                return Err(StateError::Io {
                    op: "write",
                    path: tmp,
                    source,
                });
            }
            if let Err(source) = self.fs.rename(&tmp, &self.path) {
                self.discard_temp(&tmp);
                return Err(StateError::Io {
                    op: "replace",
                    path: self.path.clone(),
                    source,
                });
            }
        } else {
            self.fs
                .write_text(&self.path, &text)
                .map_err(io_err!("write", self.path))?;
        }

        debug!(path = ?self.path, bytes = text.len(), "state saved");
        Ok(())
    }

    /// Delete the state file. Fails if it does not exist. The in-memory state
    /// is left as is.
    pub fn wipe(&self) -> StateResult<()> {
        self.fs
            .remove_file(&self.path)
            .map_err(io_err!("remove", self.path))?;
        debug!(path = ?self.path, "state file wiped");
        Ok(())
    }

    /// Whether the state file currently exists.
    pub fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    /// Best-effort removal of a leftover temp file after a failed save.
    fn discard_temp(&self, tmp: &Path) {
        if !self.fs.exists(tmp) {
            return;
        }
        if let Err(e) = self.fs.remove_file(tmp) {
            warn!(path = ?tmp, error = %e, "failed to remove temporary state file");
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // ── Key path access ────────────────────────────────────────────

    /// Read the value at `keys`.
    ///
    /// Returns `None` when any step along the way is missing or `null`; a
    /// partial path into unset optional structure is not an error.
    pub fn get_value<K: Into<Key>>(&self, keys: impl IntoIterator<Item = K>) -> Option<&Value> {
        path::lookup(&self.state, &collect_keys(keys))
    }

    /// Read the value at `keys` as `T`.
    pub fn get<T, K>(&self, keys: impl IntoIterator<Item = K>) -> StateResult<Option<T>>
    where
        T: DeserializeOwned,
        K: Into<Key>,
    {
        let keys = collect_keys(keys);
        path::lookup(&self.state, &keys)
            .map(|value| {
                serde_path_to_error::deserialize(value).map_err(|e| {
                    let at = join_paths(&KeyPath::from(keys.as_slice()), &e.path().to_string());
                    StateError::Decode(DecodeError::new(at, e.inner().to_string()))
                })
            })
            .transpose()
    }

    /// Assign `value` at `keys`, then [`save`](Self::save).
    ///
    /// Every key but the last must already exist; intermediate structure is
    /// never created. The assignment happens before validation and is not
    /// undone if the save fails, so memory can be ahead of the file.
    pub fn set_value<T, K>(&mut self, value: T, keys: impl IntoIterator<Item = K>) -> StateResult<()>
    where
        T: Serialize,
        K: Into<Key>,
    {
        let keys = collect_keys(keys);
        if keys.is_empty() {
            return Err(StateError::EmptyPath);
        }
        let value = serde_json::to_value(value).map_err(|e| StateError::Serialize(e.to_string()))?;
        path::assign(&mut self.state, &keys, value)?;
        self.save()
    }

    // ── Whole state ────────────────────────────────────────────────

    /// Decode the live state through the codec.
    pub fn decoded(&self) -> StateResult<S> {
        Ok(self.codec.decode(&self.state)?)
    }

    /// Replace the whole state, then save. Same ordering as `set_value`.
    pub fn set_state(&mut self, state: S) -> StateResult<()> {
        self.state = self
            .codec
            .encode(&state)
            .map_err(|e| StateError::Serialize(e.to_string()))?;
        self.save()
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Direct access to the untyped state. Changes are not validated until the
    /// next save.
    pub fn state_mut(&mut self) -> &mut Value {
        &mut self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }
}
