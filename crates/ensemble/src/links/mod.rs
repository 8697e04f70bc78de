//! Team Link Manager: categorised, pinnable bookmarks.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{CategoryInput, Link, LinkCategory, LinkCategoryId, LinkId, LinkPatch, NewLink};
pub use repository::LinkRepository;
pub use router::link_router;
pub use service::{CategoryGroup, LinkDirectory, LinkService, LinkServiceError};
