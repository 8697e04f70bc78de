use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::http::PortalContext;
use crate::registry::{
    AssetRecord, AssetRegistry, Directory, OwnershipLevel, RegistryService, Team, UpstreamError,
};
use crate::store::InMemoryStore;
use crate::testing;

#[derive(Debug, Default)]
pub(super) struct FakeAssets {
    pub(super) records: Mutex<HashMap<String, AssetRecord>>,
    pub(super) offline: bool,
}

impl FakeAssets {
    pub(super) fn with(records: Vec<AssetRecord>) -> Self {
        Self {
            records: Mutex::new(
                records
                    .into_iter()
                    .map(|record| (record.asset_id.clone(), record))
                    .collect(),
            ),
            offline: false,
        }
    }

    pub(super) fn replace(&self, record: AssetRecord) {
        self.records
            .lock()
            .expect("assets mutex poisoned")
            .insert(record.asset_id.clone(), record);
    }
}

#[async_trait]
impl AssetRegistry for FakeAssets {
    async fn lookup(&self, asset_id: &str) -> Result<AssetRecord, UpstreamError> {
        if self.offline {
            return Err(UpstreamError::Unreachable {
                service: "asset registry",
                detail: "connection refused".to_string(),
            });
        }
        self.records
            .lock()
            .expect("assets mutex poisoned")
            .get(asset_id)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound {
                service: "asset registry",
                key: asset_id.to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub(super) struct FakeDirectory {
    groups: HashMap<String, Vec<String>>,
}

impl FakeDirectory {
    pub(super) fn with(groups: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .map(|(group, members)| {
                    (
                        group.to_string(),
                        members.iter().map(|member| member.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn group_members(&self, group: &str) -> Result<Vec<String>, UpstreamError> {
        Ok(self.groups.get(group).cloned().unwrap_or_default())
    }
}

pub(super) type Service = RegistryService<InMemoryStore, FakeAssets, FakeDirectory>;

pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) assets: Arc<FakeAssets>,
    pub(super) context: PortalContext,
    pub(super) service: Arc<Service>,
    pub(super) team: Team,
}

pub(super) fn asset(asset_id: &str, name: &str, short_name: Option<&str>) -> AssetRecord {
    AssetRecord {
        asset_id: asset_id.to_string(),
        application_name: name.to_string(),
        short_name: short_name.map(str::to_string),
        life_cycle_status: Some("Production".to_string()),
        tier: Some("1".to_string()),
        hierarchy: vec![OwnershipLevel {
            role: "Director".to_string(),
            name: "Dana Reyes".to_string(),
        }],
    }
}

pub(super) fn build_with(assets: FakeAssets) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let clock = testing::manual_clock();
    let context = testing::context(clock.clone());
    let team = testing::seed_team(&store, "Payments");
    let directory = FakeDirectory::with(vec![
        ("PAYMENTS-ADMINS", vec!["Lee Park", "Ana Diaz"]),
        ("PAYMENTS-USERS", vec!["Sam Cole", "Ana Diaz", "sam cole"]),
    ]);
    let assets = Arc::new(assets);
    let service = Arc::new(RegistryService::new(
        store.clone(),
        assets.clone(),
        Arc::new(directory),
        clock,
    ));
    Fixture {
        store,
        assets,
        context,
        service,
        team,
    }
}

pub(super) fn build() -> Fixture {
    build_with(FakeAssets::with(vec![
        asset("AST-100", "Card Ledger", Some("clg")),
        asset("AST-200", "Merchant Portal", None),
    ]))
}
