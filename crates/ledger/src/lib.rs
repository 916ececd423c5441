//! Pourguard Ledger - Daily regulated-volume ledger
//!
//! One row per `(identity, operating day)` holding the cumulative volume
//! admitted so far. Admission is two-phase:
//!
//! ```text
//! check_and_reserve ──► Reservation (holds per-key lock)
//!        │                    │
//!        │ rejected           │ allowed
//!        ▼                    ▼
//!   drop: no write      commit_reservation ──► store CAS(existing → total_after)
//! ```
//!
//! The per-key lock serializes check-then-commit inside one process; the
//! compare-and-swap against the [`VolumeStore`] catches writers outside it.
//!
//! Every store call runs under a timeout. A timed-out or failing store is an
//! error, never a "limit not exceeded" answer.

pub mod entry;
pub mod error;
pub mod store;
pub mod volume;

pub use entry::{LedgerKey, VolumeLedgerEntry};
pub use error::{LedgerError, LedgerResult};
pub use store::{InMemoryVolumeStore, VolumeStore};
pub use volume::{Reservation, VolumeCheck, VolumeLedger};
