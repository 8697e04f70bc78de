//! Ensemble operations portal.
//!
//! Three line-of-business tools (availability/volume scorecard, shift turnover
//! log, link manager) layered over the team and application registries, with
//! sealed-cookie sessions in front of every route.

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod links;
pub mod registry;
pub mod scorecard;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod turnover;
pub mod validation;

#[cfg(test)]
mod testing;
