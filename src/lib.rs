// Wedding RSVP - Guest Directory Library
// Exposes all modules for use in the admin CLI, the API server, and tests

pub mod guest;
pub mod normalize;   // Identity key for every name comparison
pub mod validation;
pub mod resolution;  // Create / UpdateSelf / MergeIntoHead
pub mod merge;       // Household merge rules
pub mod directory;   // Submission, lookup and admin entry points
pub mod stats;
pub mod store;
pub mod error;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use guest::{
    Attendance, BusChoice, Event, GuestInput, GuestPatch, GuestRecord, Person,
    children_summary,
};
pub use normalize::{normalize_name, same_person};
pub use validation::{validate_candidate, ValidationIssue, ValidationResult};
pub use resolution::{resolve, HeadMatch, Resolution, ResolutionReport};
pub use merge::{merge_attendance, plan_merge, plan_new_household, MergeKind, MergePlan};
pub use directory::{GuestDirectory, SubmitOutcome};
pub use stats::DirectoryStats;
pub use store::{GuestDocument, GuestStore, MemoryGuestStore, SqliteGuestStore};
pub use error::{DirectoryError, StoreError};
pub use config::{AppConfig, DirectoryConfig, DuplicatePolicy, load_config, resolve_config};
pub use logging::init_logging;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
