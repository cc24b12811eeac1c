//! Recording-session domain
//!
//! This module owns the Meeting aggregate and everything that guards it:
//! - The session state machine (`MeetingStatus`) and its transition table
//! - Per-fragment records and their independent status lifecycle
//! - `SessionRegistry`, the single synchronization point for all mutations
//! - `DurationGuard`, the recording time-ceiling policy

mod fragment;
mod guard;
mod meeting;
mod registry;

pub use fragment::{Fragment, FragmentStatus, StorageRef};
pub use guard::DurationGuard;
pub use meeting::{Meeting, MeetingStatus};
pub use registry::SessionRegistry;
