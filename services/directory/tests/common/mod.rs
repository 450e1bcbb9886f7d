#![allow(dead_code)]

use commons_authz::{AgentId, JoinableRef, Membership, Resource};
use directory::seed::seed_catalog;
use directory::store::memory::InMemoryStore;
use directory::{AccessStore, Authorizer};
use std::sync::Arc;

/// Memory store with the built-in catalog and one platform manager, `admin`.
pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    seed_catalog(store.as_ref()).await.expect("seed catalog");
    store
        .grant_membership(Membership::new(
            "admin",
            JoinableRef::platform("host"),
            "platform_manager",
        ))
        .await
        .expect("admin membership");
    store
}

pub async fn seeded_authorizer() -> (Arc<InMemoryStore>, Authorizer) {
    let store = seeded_store().await;
    let authorizer = Authorizer::new(store.clone());
    (store, authorizer)
}

pub async fn put_all(store: &InMemoryStore, records: impl IntoIterator<Item = Resource>) {
    for record in records {
        store.put_resource(record).await.expect("put resource");
    }
}

pub async fn join(store: &InMemoryStore, agent: &str, joinable: JoinableRef, role: &str) {
    store
        .grant_membership(Membership::new(agent, joinable, role))
        .await
        .expect("grant membership");
}

pub fn agent(id: &str) -> AgentId {
    AgentId::new(id)
}
