//! Read-only clients for the asset registry and the directory group API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::domain::OwnershipLevel;
use crate::config::UpstreamConfig;

/// Application metadata returned by `GET /api/central?assetId=...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub asset_id: String,
    pub application_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub life_cycle_status: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub hierarchy: Vec<OwnershipLevel>,
}

/// The directory answers with a bare array; older deployments wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupMembersResponse {
    Flat(Vec<String>),
    Wrapped { members: Vec<String> },
}

impl GroupMembersResponse {
    fn into_members(self) -> Vec<String> {
        match self {
            Self::Flat(members) | Self::Wrapped { members } => members,
        }
    }
}

/// Failure talking to an upstream dependency. Always safe to retry manually.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },
    #[error("{service} unreachable: {detail}")]
    Unreachable {
        service: &'static str,
        detail: String,
    },
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} has no record for '{key}'")]
    NotFound { service: &'static str, key: String },
    #[error("{service} sent an unreadable payload: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
}

#[async_trait]
pub trait AssetRegistry: Send + Sync {
    async fn lookup(&self, asset_id: &str) -> Result<AssetRecord, UpstreamError>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Display names of every member of the directory group.
    async fn group_members(&self, group: &str) -> Result<Vec<String>, UpstreamError>;
}

const ASSET_REGISTRY: &str = "asset registry";
const DIRECTORY: &str = "directory service";

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn trimmed_base(url: &Option<String>) -> Option<String> {
    url.as_deref()
        .map(|base| base.trim_end_matches('/').to_string())
        .filter(|base| !base.is_empty())
}

/// HTTP client for the asset registry.
#[derive(Debug, Clone)]
pub struct HttpAssetRegistry {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpAssetRegistry {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: build_client(config.timeout),
            base_url: trimmed_base(&config.asset_api_url),
        }
    }
}

#[async_trait]
impl AssetRegistry for HttpAssetRegistry {
    async fn lookup(&self, asset_id: &str) -> Result<AssetRecord, UpstreamError> {
        let base = self.base_url.as_deref().ok_or(UpstreamError::NotConfigured {
            service: ASSET_REGISTRY,
        })?;
        let response = self
            .client
            .get(format!("{base}/api/central"))
            .query(&[("assetId", asset_id)])
            .send()
            .await
            .map_err(|err| {
                warn!(%asset_id, error = %err, "asset registry request failed");
                UpstreamError::Unreachable {
                    service: ASSET_REGISTRY,
                    detail: err.to_string(),
                }
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(UpstreamError::NotFound {
                service: ASSET_REGISTRY,
                key: asset_id.to_string(),
            }),
            status if !status.is_success() => Err(UpstreamError::Status {
                service: ASSET_REGISTRY,
                status: status.as_u16(),
            }),
            _ => response
                .json::<AssetRecord>()
                .await
                .map_err(|err| UpstreamError::Decode {
                    service: ASSET_REGISTRY,
                    detail: err.to_string(),
                }),
        }
    }
}

/// HTTP client for the LDAP-backed group membership API.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: build_client(config.timeout),
            base_url: trimmed_base(&config.ldap_api_url),
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn group_members(&self, group: &str) -> Result<Vec<String>, UpstreamError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(UpstreamError::NotConfigured { service: DIRECTORY })?;
        let response = self
            .client
            .get(format!("{base}/api/ldap"))
            .query(&[("group", group)])
            .send()
            .await
            .map_err(|err| {
                warn!(%group, error = %err, "directory request failed");
                UpstreamError::Unreachable {
                    service: DIRECTORY,
                    detail: err.to_string(),
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound {
                service: DIRECTORY,
                key: group.to_string(),
            });
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: DIRECTORY,
                status: status.as_u16(),
            });
        }

        let payload = response
            .json::<GroupMembersResponse>()
            .await
            .map_err(|err| UpstreamError::Decode {
                service: DIRECTORY,
                detail: err.to_string(),
            })?;
        Ok(payload.into_members())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn central(Query(params): Query<HashMap<String, String>>) -> Response {
        match params.get("assetId").map(String::as_str) {
            Some("AST-404") => StatusCode::NOT_FOUND.into_response(),
            Some("AST-503") => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            Some("AST-BAD") => (StatusCode::OK, "{\"assetId\": ").into_response(),
            Some(asset_id) => Json(json!({
                "assetId": asset_id,
                "applicationName": "Card Ledger",
                "tier": "2"
            }))
            .into_response(),
            None => StatusCode::BAD_REQUEST.into_response(),
        }
    }

    async fn ldap(Query(params): Query<HashMap<String, String>>) -> Response {
        match params.get("group").map(String::as_str) {
            Some("GONE") => StatusCode::NOT_FOUND.into_response(),
            Some("BUSY") => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            Some("GARBLED") => (StatusCode::OK, "<html>login</html>").into_response(),
            Some("LEGACY") => Json(json!({ "members": ["Lee Park"] })).into_response(),
            Some(_) => Json(json!(["Ana Diaz", "Lee Park"])).into_response(),
            None => StatusCode::BAD_REQUEST.into_response(),
        }
    }

    /// Serves canned upstream answers on an ephemeral local port.
    async fn stub_upstream() -> UpstreamConfig {
        let app = Router::new()
            .route("/api/central", get(central))
            .route("/api/ldap", get(ldap));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });
        UpstreamConfig {
            asset_api_url: Some(format!("http://{addr}")),
            ldap_api_url: Some(format!("http://{addr}/")),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn asset_registry_classifies_upstream_answers() {
        let assets = HttpAssetRegistry::new(&stub_upstream().await);

        let record = assets.lookup("AST-42").await.expect("record");
        assert_eq!(record.asset_id, "AST-42");
        assert_eq!(record.tier.as_deref(), Some("2"));

        match assets.lookup("AST-404").await {
            Err(UpstreamError::NotFound { service, key }) => {
                assert_eq!(service, ASSET_REGISTRY);
                assert_eq!(key, "AST-404");
            }
            other => panic!("expected not found, got {other:?}"),
        }
        assert!(matches!(
            assets.lookup("AST-503").await,
            Err(UpstreamError::Status {
                service: ASSET_REGISTRY,
                status: 503
            })
        ));
        assert!(matches!(
            assets.lookup("AST-BAD").await,
            Err(UpstreamError::Decode {
                service: ASSET_REGISTRY,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn directory_classifies_upstream_answers() {
        let directory = HttpDirectory::new(&stub_upstream().await);

        assert_eq!(
            directory.group_members("OPS-USERS").await.expect("members"),
            vec!["Ana Diaz".to_string(), "Lee Park".to_string()]
        );
        assert_eq!(
            directory.group_members("LEGACY").await.expect("members"),
            vec!["Lee Park".to_string()]
        );
        match directory.group_members("GONE").await {
            Err(UpstreamError::NotFound { service, key }) => {
                assert_eq!(service, DIRECTORY);
                assert_eq!(key, "GONE");
            }
            other => panic!("expected not found, got {other:?}"),
        }
        assert!(matches!(
            directory.group_members("BUSY").await,
            Err(UpstreamError::Status {
                service: DIRECTORY,
                status: 503
            })
        ));
        assert!(matches!(
            directory.group_members("GARBLED").await,
            Err(UpstreamError::Decode {
                service: DIRECTORY,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("address");
        drop(listener);
        let config = UpstreamConfig {
            asset_api_url: Some(format!("http://{addr}")),
            ldap_api_url: Some(format!("http://{addr}")),
            timeout: Duration::from_secs(2),
        };

        assert!(matches!(
            HttpAssetRegistry::new(&config).lookup("AST-1").await,
            Err(UpstreamError::Unreachable { .. })
        ));
        assert!(matches!(
            HttpDirectory::new(&config).group_members("OPS").await,
            Err(UpstreamError::Unreachable { .. })
        ));
    }

    fn unconfigured() -> UpstreamConfig {
        UpstreamConfig {
            asset_api_url: None,
            ldap_api_url: Some("  ".to_string()),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn unconfigured_clients_fail_without_network() {
        let config = unconfigured();
        let assets = HttpAssetRegistry::new(&config);
        let directory = HttpDirectory::new(&config);

        assert!(matches!(
            assets.lookup("AST-1").await,
            Err(UpstreamError::NotConfigured { .. })
        ));
        assert!(matches!(
            directory.group_members("OPS-USERS").await,
            Err(UpstreamError::NotConfigured { .. })
        ));
    }

    #[test]
    fn asset_record_reads_camel_case_payload() {
        let payload = r#"{
            "assetId": "AST-42",
            "applicationName": "Card Ledger",
            "shortName": "CLG",
            "lifeCycleStatus": "Production",
            "hierarchy": [{ "role": "Director", "name": "Dana Reyes" }]
        }"#;
        let record: AssetRecord = serde_json::from_str(payload).expect("valid payload");
        assert_eq!(record.short_name.as_deref(), Some("CLG"));
        assert_eq!(record.tier, None);
        assert_eq!(record.hierarchy.len(), 1);
    }

    #[test]
    fn group_members_accepts_flat_and_wrapped_lists() {
        let flat: GroupMembersResponse =
            serde_json::from_str(r#"["Ana Diaz", "Lee Park"]"#).expect("flat list");
        let wrapped: GroupMembersResponse =
            serde_json::from_str(r#"{"members": ["Ana Diaz"]}"#).expect("wrapped list");
        assert_eq!(flat.into_members().len(), 2);
        assert_eq!(wrapped.into_members(), vec!["Ana Diaz".to_string()]);
    }
}
