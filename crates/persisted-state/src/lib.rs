//! persisted-state — schema-validated state persisted to a single file.
//!
//! A [`StateStore`] holds one state value for a process, loads it from disk on
//! construction (or starts from a default), and writes it back after every
//! [`StateStore::set_value`]. The shape is enforced by a [`Codec`], which runs
//! on load and before each save.
//!
//! # Architecture
//!
//! The store composes three collaborators:
//!
//! - [`Codec`] decodes the untyped value into the typed shape `S` and reports
//!   the failing field. [`SerdeCodec`] uses the type's serde impls.
//! - [`FileSystem`] performs file I/O. [`OsFileSystem`] for disk,
//!   [`MemoryFileSystem`] for tests.
//! - [`TextFormat`] renders the value as text: pretty JSON by default, TOML via
//!   [`StoreOptions`].
//!
//! State is kept as a `serde_json::Value` so [`Key`] paths can address fields
//! at any depth. Applications usually wrap the untyped paths in typed accessor
//! methods for the fields they use.
//!
//! ```no_run
//! use persisted_state::{SerdeCodec, StateStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Deploy {
//!     step: u32,
//! }
//!
//! let mut store: StateStore<Deploy> =
//!     StateStore::open("/tmp/deploy/state.json", SerdeCodec::new(), Deploy { step: 0 })?;
//! store.set_value(1, ["step"])?;
//! assert_eq!(store.get::<u32, _>(["step"])?, Some(1));
//! # Ok::<(), persisted_state::StateError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod path;
pub mod store;

pub use codec::{Codec, CodecExt, Refined, SerdeCodec};
pub use config::StoreOptions;
pub use error::{DecodeError, StateError, StateResult};
pub use format::{FormatKind, JsonFormat, TextFormat, TomlFormat};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use path::{Key, KeyPath};
pub use store::StateStore;
