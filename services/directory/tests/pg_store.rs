#![cfg(feature = "pg-tests")]

use chrono::{Duration, Utc};
use commons_authz::{
    AgentId, JoinableRef, Membership, PermissionId, Predicate, Privacy, Query, RecordId, Resource,
    ResourceType, RoleId, Scope,
};
use directory::config::PostgresConfig;
use directory::seed::seed_catalog;
use directory::store::postgres::PostgresStore;
use directory::{AccessStore, Authorizer, StoreError};
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

async fn reset_postgres(url: &str) -> Result<(), sqlx::Error> {
    let pool = match tokio::time::timeout(
        std::time::Duration::from_secs(2),
        PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect(url),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => return Err(sqlx::Error::PoolTimedOut),
    };
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|err| sqlx::Error::Migrate(Box::new(err)))?;
    sqlx::query(
        "TRUNCATE role_resource_permissions, memberships, resources, roles, resource_permissions",
    )
    .execute(&pool)
    .await
    .map(|_| ())
}

async fn pg_store() -> Option<PostgresStore> {
    let url = match std::env::var("COMMONS_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("COMMONS_POSTGRES_URL"))
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping pg-tests: set COMMONS_TEST_DATABASE_URL or DATABASE_URL");
            return None;
        }
    };
    if let Err(err) = reset_postgres(&url).await {
        eprintln!("skipping pg-tests: cannot prepare postgres: {err}");
        return None;
    }
    let pg_cfg = PostgresConfig {
        url,
        max_connections: 5,
        connect_timeout_ms: 5_000,
        acquire_timeout_ms: 5_000,
    };
    match PostgresStore::connect_without_migrations(&pg_cfg).await {
        Ok(store) => Some(store),
        Err(err) => {
            eprintln!("skipping pg-tests: connect postgres store failed: {err}");
            None
        }
    }
}

#[tokio::test]
#[serial]
async fn pg_seed_is_idempotent_and_loads_catalog() {
    let Some(store) = pg_store().await else {
        return;
    };
    let first = seed_catalog(&store).await.expect("seed");
    assert!(first.roles > 0);
    let second = seed_catalog(&store).await.expect("reseed");
    assert_eq!(second.roles, 0);
    assert_eq!(second.permissions, 0);
    assert_eq!(second.assignments, 0);

    let catalog = store.load_catalog().await.expect("catalog");
    assert!(catalog.role_grants(&RoleId::new("platform_manager"), "manage_platform"));
    assert!(!catalog.role_grants(&RoleId::new("community_member"), "update_community"));

    store
        .unassign_permission(
            &RoleId::new("community_member"),
            &PermissionId::new("read_community"),
        )
        .await
        .expect("unassign");
    let catalog = store.load_catalog().await.expect("catalog");
    assert!(!catalog.role_grants(&RoleId::new("community_member"), "read_community"));
}

#[tokio::test]
#[serial]
async fn pg_membership_pair_is_unique() {
    let Some(store) = pg_store().await else {
        return;
    };
    seed_catalog(&store).await.expect("seed");
    let c1 = JoinableRef::community("c1");
    store
        .grant_membership(Membership::new("p1", c1.clone(), "community_member"))
        .await
        .expect("grant");
    let err = store
        .grant_membership(Membership::new("p1", c1.clone(), "community_facilitator"))
        .await
        .expect_err("duplicate pair");
    assert!(matches!(err, StoreError::Conflict(_)));

    let previous = store
        .reassign_membership(Membership::new("p1", c1.clone(), "community_facilitator"))
        .await
        .expect("reassign")
        .expect("previous row");
    assert_eq!(previous.role_id, RoleId::new("community_member"));
    let rows = store.members_of(&c1).await.expect("members");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role_id, RoleId::new("community_facilitator"));

    store
        .revoke_membership(&AgentId::new("p1"), &c1)
        .await
        .expect("revoke");
    let err = store
        .revoke_membership(&AgentId::new("p1"), &c1)
        .await
        .expect_err("already revoked");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn pg_membership_role_must_fit_the_container_kind() {
    let Some(store) = pg_store().await else {
        return;
    };
    seed_catalog(&store).await.expect("seed");
    let c1 = JoinableRef::community("c1");
    let err = store
        .grant_membership(Membership::new("p1", c1.clone(), "platform_manager"))
        .await
        .expect_err("platform role in a community");
    assert!(matches!(err, StoreError::Conflict(_)));

    store
        .grant_membership(Membership::new("p1", c1.clone(), "community_member"))
        .await
        .expect("grant");
    let err = store
        .reassign_membership(Membership::new("p1", c1.clone(), "platform_manager"))
        .await
        .expect_err("reassign to a platform role");
    assert!(matches!(err, StoreError::Conflict(_)));
    let rows = store.members_of(&c1).await.expect("members");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role_id, RoleId::new("community_member"));
}

#[tokio::test]
#[serial]
async fn pg_resources_round_trip_relationships() {
    let Some(store) = pg_store().await else {
        return;
    };
    let event = Resource::new(ResourceType::Event, "e1")
        .with_privacy(Privacy::Private)
        .created_by("p1")
        .hosted_by(JoinableRef::community("c1"))
        .inviting("guest")
        .protected();
    store.put_resource(event.clone()).await.expect("put");
    let loaded = store
        .get_resource(ResourceType::Event, &RecordId::new("e1"))
        .await
        .expect("get");
    assert_eq!(loaded.hosts, event.hosts);
    assert_eq!(loaded.invitees, event.invitees);
    assert_eq!(loaded.creator_id, event.creator_id);
    assert!(loaded.protected);

    store
        .delete_resource(ResourceType::Event, &RecordId::new("e1"))
        .await
        .expect("delete");
    let err = store
        .get_resource(ResourceType::Event, &RecordId::new("e1"))
        .await
        .expect_err("deleted");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn pg_fetch_matches_in_memory_evaluation() {
    let Some(store) = pg_store().await else {
        return;
    };
    seed_catalog(&store).await.expect("seed");
    let now = Utc::now();
    let records = vec![
        Resource::new(ResourceType::Community, "public")
            .with_privacy(Privacy::Public)
            .created_at(now),
        Resource::new(ResourceType::Community, "joined")
            .with_privacy(Privacy::Private)
            .created_at(now - Duration::minutes(1)),
        Resource::new(ResourceType::Community, "own")
            .with_privacy(Privacy::Private)
            .created_by("p1")
            .created_at(now - Duration::minutes(2)),
        Resource::new(ResourceType::Community, "other")
            .with_privacy(Privacy::Private)
            .created_at(now - Duration::minutes(3)),
        Resource::new(ResourceType::Community, "unlisted")
            .with_privacy(Privacy::Unlisted)
            .created_by("p1")
            .created_at(now - Duration::minutes(4)),
    ];
    for record in &records {
        store.put_resource(record.clone()).await.expect("put");
    }
    store
        .grant_membership(Membership::new(
            "p1",
            JoinableRef::community("joined"),
            "community_member",
        ))
        .await
        .expect("grant");

    let store = Arc::new(store);
    let authorizer = Authorizer::new(store.clone());
    let p1 = AgentId::new("p1");
    let base = Query::all(ResourceType::Community);
    let rows = authorizer.visible(Some(&p1), &base).await.expect("visible");
    let fetched: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();

    let principal = authorizer
        .principal(Some(&p1))
        .await
        .expect("principal");
    let query = Scope::new(principal.as_ref(), base).resolve();
    let expected: Vec<&str> = query
        .apply(&records)
        .into_iter()
        .map(|row| row.id.as_str())
        .collect();
    assert_eq!(fetched, expected);
    assert_eq!(fetched, vec!["public", "joined", "own"]);

    let anonymous = store
        .fetch(&Query::all(ResourceType::Community).and(Predicate::PrivacyIs(Privacy::Public)))
        .await
        .expect("fetch");
    assert_eq!(anonymous.len(), 1);
}
