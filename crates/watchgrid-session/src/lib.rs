//! watchgrid-session — edit sessions over the watcher configuration endpoint.
//!
//! The configuration endpoint serves every watcher as one JSON object keyed
//! by name and accepts per-name `PUT`/`DELETE`. A [`WatcherConsole`] keeps
//! the last fetched set and at most one draft being edited:
//!
//! ```text
//! Unselected ──begin_new/begin_edit──▶ Editing ──save (PUT ok)──▶ Unselected
//!                                         │
//!                                         └──────cancel─────────▶ Unselected
//! ```
//!
//! Drafts are deep copies, so nothing in the saved set changes until the
//! endpoint acknowledges a save. Saves are last-writer-wins; there is no
//! optimistic concurrency check against other editors.

pub mod console;
pub mod endpoint;
pub mod error;

pub use console::{EditOrigin, SessionState, WatcherConsole};
pub use endpoint::{ConfigEndpoint, FileEndpoint};
pub use error::{SessionError, SessionResult};
