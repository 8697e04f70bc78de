//! Teams, their applications, and the upstream registries that feed them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod upstream;

#[cfg(test)]
mod tests;

pub use domain::{
    derive_tla, normalize_tla, Application, ApplicationId, NewApplication, NewTeam,
    OwnershipLevel, Team, TeamId,
};
pub use repository::RegistryRepository;
pub use router::registry_router;
pub use service::{RegistryService, RegistryServiceError, TeamMembers};
pub use upstream::{
    AssetRecord, AssetRegistry, Directory, HttpAssetRegistry, HttpDirectory, UpstreamError,
};
