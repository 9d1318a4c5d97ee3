//! Sync engine: turns daily notes into meeting notes, hubs and a task backlog.
//!
//! This crate owns everything that touches the filesystem:
//! - Atomic artifact writes with dry-run staging
//! - The per-note processing state (content hashes)
//! - Meeting note, person hub and company hub writers
//! - Attendee linking and the shared task backlog
//! - The audit log
//!
//! # Example
//!
//! ```rust,no_run
//! use notesync_core::Scope;
//! use notesync_engine::{SyncConfig, SyncEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::for_vault("/home/me/Notes").with_scope(Scope::ThisWeek);
//!     let summary = SyncEngine::new(config).run()?;
//!     println!("{} notes processed", summary.notes.processed);
//!     Ok(())
//! }
//! ```

mod audit;
mod backlog;
mod config;
mod error;
mod hub;
mod linker;
mod meetings;
mod state;
mod sync;
mod writer;

pub use audit::{append_entry, render_entry};
pub use backlog::{AppendResult, Backlog, TaskLine, collect_tasks, normalize_task};
pub use config::{DEFAULT_NOTE_EXTENSION, DEFAULT_TRIAGE_FOLDER, SyncConfig, SyncPaths};
pub use error::{EngineError, EngineResult};
pub use hub::{HubWrite, HubWriter, PERSON_BODY_MARKER, SkipReason, company_template, merge_person, person_template};
pub use linker::{HubIndex, HubRef, LinkedAttendee, split_title};
pub use meetings::{MeetingNote, meeting_path, write_meeting};
pub use state::{ProcessingState, StateEntry, state_key};
pub use sync::SyncEngine;
pub use writer::{ArtifactWriter, atomic_write};
