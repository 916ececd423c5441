//! Pourguard Compliance Engine
//!
//! Decides whether a regulated-item order may be admitted.
//!
//! ## Flow
//!
//! ```text
//!  VerificationService ──► ComplianceEngine::admit_order
//!        │                    ├── age         (pourguard-core)
//!        │                    ├── KYC flag    (VerificationRecord)
//!        │                    ├── location    (pourguard-zones)
//!        │                    └── daily volume (pourguard-ledger, reserve → commit)
//!        │                              │
//!        │                              ▼
//!        │                    ComplianceVerdict + ComplianceEvents
//!        ▼
//!   AuditSink (append-only JSONL)
//! ```
//!
//! ## Key Components
//!
//! - [`config::ComplianceConfig`] - limits, operating timezone, timeouts
//! - [`engine::ComplianceEngine`] - the order eligibility orchestrator
//! - [`verification::VerificationService`] - age, location and KYC steps
//! - [`audit::AuditLedger`] - append-only JSONL audit trail
//! - [`report::ComplianceReport`] - period summaries for regulators

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod excise;
pub mod providers;
pub mod record;
pub mod report;
pub mod verdict;
pub mod verification;

pub use audit::{AuditEmitter, AuditLedger, AuditSink, MemoryAuditSink};
pub use config::ComplianceConfig;
pub use engine::{Admission, ComplianceEngine, Evaluation};
pub use error::{ComplianceError, ComplianceResult};
pub use event::{ComplianceEvent, EventType, Outcome};
pub use excise::{calculate_excise_tax, ExciseBreakdown, ProductType};
pub use providers::{KycProvider, KycStatus, ReverseGeocoder, StaticGeocoder, StaticKycProvider};
pub use record::VerificationRecord;
pub use report::ComplianceReport;
pub use verdict::{ComplianceVerdict, ReasonCode};
pub use verification::{
    mask_document_number, AgeVerification, InMemoryVerificationStore, KycVerification,
    LocationVerification, VerificationService, VerificationStore,
};
