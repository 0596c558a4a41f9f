//! Live seat accounting for scheduled study groups (halaqah).

pub mod capacity;
pub mod domain;
pub mod router;
pub mod service;

pub use capacity::HalaqahCapacityAccountant;
pub use domain::{GroupStatus, Halaqah, HalaqahSeatState, RosterEntry, RosterStatus};
pub use router::halaqah_router;
pub use service::{CapacityReport, HalaqahCapacityService, HalaqahError};
