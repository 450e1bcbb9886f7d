//! Postgres-backed implementation of the directory store.
//!
//! # Data model
//! - `roles`, `resource_permissions`, `role_resource_permissions`: the
//!   catalog. Unique `(resource_type, identifier)` indexes back the kernel's
//!   identifier rule.
//! - `memberships`: one row per `(member_id, joinable_type, joinable_id)`,
//!   enforced by a unique index. A role change deletes and re-inserts the row
//!   inside one transaction. Grants check the role's `resource_type` against
//!   the joinable kind first; `role_id` carries no foreign key.
//! - `resources`: one row per protected record. Event hosts and invitees are
//!   `TEXT[]` columns so scope predicates render to plain array operators.
//!
//! # Query rendering
//! [`render_fetch`] turns a kernel [`Query`] into SQL with `QueryBuilder`.
//! Every value is bound; the only literal SQL comes from the fixed predicate
//! vocabulary.
//!
//! # Security notes
//! - Database URLs may contain credentials; avoid logging them.
use super::{AccessStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commons_authz::{
    AgentId, AuthzError, JoinableRef, Membership, Order, PermissionId, Predicate, Query, RecordId, Resource,
    ResourcePermission, ResourceType, Role, RoleId, RoleResourcePermission,
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::Duration;

const RESOURCE_COLUMNS: &str = "kind, id, privacy, creator_id, protected, host, published, \
     container, hosts, subject_id, invitees, created_at";

/// Durable directory store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use directory::config::PostgresConfig;
/// use directory::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbRole {
    id: String,
    identifier: String,
    name: String,
    resource_type: String,
    protected: bool,
    position: i32,
}

#[derive(Debug, Clone, FromRow)]
struct DbPermission {
    id: String,
    identifier: String,
    resource_type: String,
    protected: bool,
    position: i32,
}

#[derive(Debug, Clone, FromRow)]
struct DbAssignment {
    role_id: String,
    permission_id: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbMembership {
    member_id: String,
    joinable_type: String,
    joinable_id: String,
    role_id: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbResource {
    kind: String,
    id: String,
    privacy: Option<String>,
    creator_id: Option<String>,
    protected: bool,
    host: bool,
    published: Option<bool>,
    container: Option<String>,
    hosts: Vec<String>,
    subject_id: Option<String>,
    invitees: Vec<String>,
    created_at: DateTime<Utc>,
}

impl PostgresStore {
    /// Connect, then apply the embedded migrations before returning.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, true).await
    }

    /// Connect without running migrations, for tests that manage the schema.
    #[cfg(any(test, feature = "pg-tests"))]
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        // Fail fast instead of hanging when the database is unreachable.
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| anyhow!("postgres connect timed out"))??;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        tracing::info!(backend = "postgres", "directory store connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl AccessStore for PostgresStore {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, DbRole>(
            r#"SELECT id, identifier, name, resource_type, protected, position
               FROM roles ORDER BY resource_type, position, identifier"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(role_from_db).collect()
    }

    async fn create_role(&self, role: Role) -> StoreResult<Role> {
        let result = sqlx::query(
            r#"INSERT INTO roles (id, identifier, name, resource_type, protected, position)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(role.id.as_str())
        .bind(&role.identifier)
        .bind(&role.name)
        .bind(role.resource_type.as_str())
        .bind(role.protected)
        .bind(role.position)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(role),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "role identifier {} exists for {}",
                role.identifier, role.resource_type
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_permissions(&self) -> StoreResult<Vec<ResourcePermission>> {
        let rows = sqlx::query_as::<_, DbPermission>(
            r#"SELECT id, identifier, resource_type, protected, position
               FROM resource_permissions ORDER BY resource_type, position, identifier"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(permission_from_db).collect()
    }

    async fn create_permission(
        &self,
        permission: ResourcePermission,
    ) -> StoreResult<ResourcePermission> {
        let result = sqlx::query(
            r#"INSERT INTO resource_permissions (id, identifier, resource_type, protected, position)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(permission.id.as_str())
        .bind(&permission.identifier)
        .bind(permission.resource_type.as_str())
        .bind(permission.protected)
        .bind(permission.position)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(permission),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "permission identifier {} exists for {}",
                permission.identifier, permission.resource_type
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_assignments(&self) -> StoreResult<Vec<RoleResourcePermission>> {
        let rows = sqlx::query_as::<_, DbAssignment>(
            r#"SELECT role_id, permission_id FROM role_resource_permissions
               ORDER BY role_id, permission_id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| RoleResourcePermission {
                role_id: RoleId::new(row.role_id),
                permission_id: PermissionId::new(row.permission_id),
            })
            .collect())
    }

    async fn assign_permission(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"INSERT INTO role_resource_permissions (role_id, permission_id) VALUES ($1, $2)"#,
        )
        .bind(role_id.as_str())
        .bind(permission_id.as_str())
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "role {role_id} already grants {permission_id}"
            ))),
            Err(err) if is_foreign_key_violation(&err) => Err(StoreError::NotFound(format!(
                "role {role_id} or permission {permission_id}"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn unassign_permission(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"DELETE FROM role_resource_permissions WHERE role_id = $1 AND permission_id = $2"#,
        )
        .bind(role_id.as_str())
        .bind(permission_id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "role {role_id} does not grant {permission_id}"
            )));
        }
        Ok(())
    }

    async fn grant_membership(&self, membership: Membership) -> StoreResult<Membership> {
        ensure_role_fits(&self.pool, &membership).await?;
        let result = sqlx::query(
            r#"INSERT INTO memberships (member_id, joinable_type, joinable_id, role_id)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(membership.member.as_str())
        .bind(membership.joinable.kind.as_str())
        .bind(membership.joinable.id.as_str())
        .bind(membership.role_id.as_str())
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(membership),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "{} already holds a role in {}",
                membership.member, membership.joinable
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn revoke_membership(
        &self,
        member: &AgentId,
        joinable: &JoinableRef,
    ) -> StoreResult<Membership> {
        let row = sqlx::query_as::<_, DbMembership>(
            r#"DELETE FROM memberships
               WHERE member_id = $1 AND joinable_type = $2 AND joinable_id = $3
               RETURNING member_id, joinable_type, joinable_id, role_id"#,
        )
        .bind(member.as_str())
        .bind(joinable.kind.as_str())
        .bind(joinable.id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("membership {member} in {joinable}")))?;
        membership_from_db(row)
    }

    async fn memberships_of(&self, member: &AgentId) -> StoreResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, DbMembership>(
            r#"SELECT member_id, joinable_type, joinable_id, role_id FROM memberships
               WHERE member_id = $1 ORDER BY joinable_type, joinable_id"#,
        )
        .bind(member.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(membership_from_db).collect()
    }

    async fn members_of(&self, joinable: &JoinableRef) -> StoreResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, DbMembership>(
            r#"SELECT member_id, joinable_type, joinable_id, role_id FROM memberships
               WHERE joinable_type = $1 AND joinable_id = $2 ORDER BY member_id"#,
        )
        .bind(joinable.kind.as_str())
        .bind(joinable.id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(membership_from_db).collect()
    }

    async fn reassign_membership(&self, membership: Membership) -> StoreResult<Option<Membership>> {
        let mut tx = self.pool.begin().await?;
        ensure_role_fits(&mut *tx, &membership).await?;
        let previous = sqlx::query_as::<_, DbMembership>(
            r#"DELETE FROM memberships
               WHERE member_id = $1 AND joinable_type = $2 AND joinable_id = $3
               RETURNING member_id, joinable_type, joinable_id, role_id"#,
        )
        .bind(membership.member.as_str())
        .bind(membership.joinable.kind.as_str())
        .bind(membership.joinable.id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        sqlx::query(
            r#"INSERT INTO memberships (member_id, joinable_type, joinable_id, role_id)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(membership.member.as_str())
        .bind(membership.joinable.kind.as_str())
        .bind(membership.joinable.id.as_str())
        .bind(membership.role_id.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        previous.map(membership_from_db).transpose()
    }

    async fn put_resource(&self, resource: Resource) -> StoreResult<Resource> {
        sqlx::query(
            r#"INSERT INTO resources
                 (kind, id, privacy, creator_id, protected, host, published, container, hosts,
                  subject_id, invitees, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               ON CONFLICT (kind, id) DO UPDATE SET
                 privacy = EXCLUDED.privacy,
                 creator_id = EXCLUDED.creator_id,
                 protected = EXCLUDED.protected,
                 host = EXCLUDED.host,
                 published = EXCLUDED.published,
                 container = EXCLUDED.container,
                 hosts = EXCLUDED.hosts,
                 subject_id = EXCLUDED.subject_id,
                 invitees = EXCLUDED.invitees,
                 created_at = EXCLUDED.created_at"#,
        )
        .bind(resource.kind.as_str())
        .bind(resource.id.as_str())
        .bind(resource.privacy.map(|privacy| privacy.as_str()))
        .bind(resource.creator_id.as_ref().map(AgentId::as_str))
        .bind(resource.protected)
        .bind(resource.host)
        .bind(resource.published)
        .bind(resource.container.as_ref().map(ToString::to_string))
        .bind(
            resource
                .hosts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        )
        .bind(resource.subject_id.as_ref().map(AgentId::as_str))
        .bind(
            resource
                .invitees
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        )
        .bind(resource.created_at)
        .execute(&self.pool)
        .await?;
        Ok(resource)
    }

    async fn get_resource(&self, kind: ResourceType, id: &RecordId) -> StoreResult<Resource> {
        let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE kind = $1 AND id = $2");
        let row = sqlx::query_as::<_, DbResource>(&sql)
            .bind(kind.as_str())
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{kind} {id}")))?;
        resource_from_db(row)
    }

    async fn delete_resource(&self, kind: ResourceType, id: &RecordId) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM resources WHERE kind = $1 AND id = $2"#)
            .bind(kind.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{kind} {id}")));
        }
        Ok(())
    }

    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Resource>> {
        let mut builder = render_fetch(query);
        let rows = builder
            .build_query_as::<DbResource>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(resource_from_db).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Render a kernel query as a `SELECT` over `resources`.
pub(crate) fn render_fetch(query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources WHERE kind = "
    ));
    builder.push_bind(query.kind().as_str());
    builder.push(" AND ");
    push_predicate(&mut builder, query.filter());
    match query.order() {
        Some(Order::NewestFirst) => {
            builder.push(" ORDER BY created_at DESC, id ASC");
        }
        Some(Order::OldestFirst) => {
            builder.push(" ORDER BY created_at ASC, id ASC");
        }
        None => {}
    }
    builder
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Always => {
            builder.push("TRUE");
        }
        Predicate::Never => {
            builder.push("FALSE");
        }
        Predicate::PrivacyIs(privacy) => {
            builder.push("privacy = ").push_bind(privacy.as_str());
        }
        Predicate::Listed => {
            builder.push("(privacy IS NOT NULL AND privacy <> 'unlisted')");
        }
        Predicate::Published => {
            builder.push("COALESCE(published, TRUE)");
        }
        Predicate::CreatorIs(agent) => {
            builder.push("creator_id = ").push_bind(agent.to_string());
        }
        Predicate::SubjectIs(agent) => {
            builder.push("subject_id = ").push_bind(agent.to_string());
        }
        Predicate::InviteeIs(agent) => {
            builder
                .push_bind(agent.to_string())
                .push(" = ANY(invitees)");
        }
        Predicate::IdIn(ids) => {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            builder.push("id = ANY(").push_bind(ids).push(")");
        }
        Predicate::ContainerIn(containers) => {
            let keys: Vec<String> = containers.iter().map(ToString::to_string).collect();
            builder.push("container = ANY(").push_bind(keys).push(")");
        }
        Predicate::HostIn(hosts) => {
            let keys: Vec<String> = hosts.iter().map(ToString::to_string).collect();
            builder.push("hosts && ").push_bind(keys).push("::text[]");
        }
        Predicate::And(all) => push_joined(builder, all, " AND ", "TRUE"),
        Predicate::Or(any) => push_joined(builder, any, " OR ", "FALSE"),
    }
}

fn push_joined(
    builder: &mut QueryBuilder<'static, Postgres>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        builder.push(empty);
        return;
    }
    builder.push("(");
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_predicate(builder, part);
    }
    builder.push(")");
}

/// Reject a membership whose role is scoped to another container kind.
async fn ensure_role_fits<'e, E>(executor: E, membership: &Membership) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let role_type: Option<String> =
        sqlx::query_scalar("SELECT resource_type FROM roles WHERE id = $1")
            .bind(membership.role_id.as_str())
            .fetch_optional(executor)
            .await?;
    let Some(role_type) = role_type else {
        return Ok(());
    };
    let role_type: ResourceType = role_type.parse()?;
    if role_type != membership.joinable.kind {
        return Err(AuthzError::RoleOutOfScope {
            role: membership.role_id.to_string(),
            role_type,
            joinable: membership.joinable.to_string(),
        }
        .into());
    }
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, "23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_code(err, "23503")
}

fn has_code(err: &sqlx::Error, expected: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == expected).unwrap_or(false);
    }
    false
}

fn role_from_db(row: DbRole) -> StoreResult<Role> {
    Ok(Role {
        id: RoleId::new(row.id),
        identifier: row.identifier,
        name: row.name,
        resource_type: row.resource_type.parse()?,
        protected: row.protected,
        position: row.position,
    })
}

fn permission_from_db(row: DbPermission) -> StoreResult<ResourcePermission> {
    Ok(ResourcePermission {
        id: PermissionId::new(row.id),
        identifier: row.identifier,
        resource_type: row.resource_type.parse()?,
        protected: row.protected,
        position: row.position,
    })
}

fn membership_from_db(row: DbMembership) -> StoreResult<Membership> {
    let joinable = JoinableRef::new(row.joinable_type.parse()?, row.joinable_id)?;
    Ok(Membership::new(row.member_id, joinable, row.role_id))
}

fn resource_from_db(row: DbResource) -> StoreResult<Resource> {
    let hosts = row
        .hosts
        .iter()
        .map(|host| host.parse::<JoinableRef>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Resource {
        kind: row.kind.parse()?,
        id: RecordId::new(row.id),
        privacy: row.privacy.map(|value| value.parse()).transpose()?,
        creator_id: row.creator_id.map(AgentId::new),
        protected: row.protected,
        host: row.host,
        published: row.published,
        container: row.container.map(|value| value.parse()).transpose()?,
        hosts,
        subject_id: row.subject_id.map(AgentId::new),
        invitees: row.invitees.into_iter().map(AgentId::new).collect(),
        created_at: row.created_at,
    }
    .normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons_authz::{Privacy, Scope};

    #[test]
    fn renders_anonymous_scope() {
        let query = Scope::new(None, Query::all(ResourceType::Community)).resolve();
        let builder = render_fetch(&query);
        assert_eq!(
            builder.sql(),
            format!(
                "SELECT {RESOURCE_COLUMNS} FROM resources WHERE kind = $1 AND privacy = $2 \
                 ORDER BY created_at DESC, id ASC"
            )
        );
    }

    #[test]
    fn renders_nested_predicates_with_binds() {
        let query = Query::all(ResourceType::Event).and(
            Predicate::Listed.and(
                Predicate::PrivacyIs(Privacy::Public)
                    .or(Predicate::CreatorIs(AgentId::new("p1")))
                    .or(Predicate::host_in([JoinableRef::community("c1")])),
            ),
        );
        let builder = render_fetch(&query);
        assert_eq!(
            builder.sql(),
            format!(
                "SELECT {RESOURCE_COLUMNS} FROM resources WHERE kind = $1 AND \
                 ((privacy IS NOT NULL AND privacy <> 'unlisted') AND \
                 (privacy = $2 OR creator_id = $3 OR hosts && $4::text[]))"
            )
        );
    }

    #[test]
    fn never_renders_false() {
        let query = Query::all(ResourceType::Role).and(Predicate::Never);
        assert!(render_fetch(&query).sql().ends_with("AND FALSE"));
    }
}
