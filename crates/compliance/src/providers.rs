//! External collaborators: identity KYC and reverse geocoding
//!
//! The engine only consumes facts from these providers. How a KYC vendor
//! decides completion, or how an address is resolved, is not its concern.

use async_trait::async_trait;
use pourguard_core::Coordinate;
use serde::{Deserialize, Serialize};

use crate::error::ComplianceResult;

/// KYC facts reported by a provider
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KycStatus {
    pub document_verified: bool,
    pub video_kyc_completed: bool,
    pub biometric_verified: bool,
    #[serde(default)]
    pub documents_uploaded: Vec<String>,
}

impl KycStatus {
    /// Every step done and at least one document on file
    pub fn is_complete(&self) -> bool {
        self.document_verified
            && self.video_kyc_completed
            && self.biometric_verified
            && !self.documents_uploaded.is_empty()
    }

    /// Status with every step done
    pub fn complete(documents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            document_verified: true,
            video_kyc_completed: true,
            biometric_verified: true,
            documents_uploaded: documents.into_iter().map(Into::into).collect(),
        }
    }
}

/// Source of KYC completion facts
#[async_trait]
pub trait KycProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Current KYC status of an identity
    async fn kyc_status(&self, identity_id: &str) -> ComplianceResult<KycStatus>;
}

/// Provider answering the same status for everyone (tests, demos)
#[derive(Debug, Clone, Default)]
pub struct StaticKycProvider {
    status: KycStatus,
}

impl StaticKycProvider {
    pub fn new(status: KycStatus) -> Self {
        Self { status }
    }

    /// Provider reporting complete KYC
    pub fn approving() -> Self {
        Self::new(KycStatus::complete(["id_front", "id_back", "selfie"]))
    }
}

#[async_trait]
impl KycProvider for StaticKycProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn kyc_status(&self, _identity_id: &str) -> ComplianceResult<KycStatus> {
        Ok(self.status.clone())
    }
}

/// Resolves a coordinate to a postal address (audit detail only)
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    fn name(&self) -> &str;

    /// Address of `point`, `None` when unknown
    async fn address_of(&self, point: &Coordinate) -> ComplianceResult<Option<String>>;
}

/// Geocoder returning a fixed label, or nothing
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    label: Option<String>,
}

impl StaticGeocoder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    /// Geocoder that never resolves an address
    pub fn none() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    fn name(&self) -> &str {
        "static"
    }

    async fn address_of(&self, _point: &Coordinate) -> ComplianceResult<Option<String>> {
        Ok(self.label.clone())
    }
}
