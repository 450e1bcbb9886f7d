//! `directory` command-line entry point.
//!
//! Seeds the catalog, manages memberships and records, and answers
//! `check`/`list` questions against the configured store. Decisions and
//! listings are printed to stdout as JSON; logs go to stderr.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commons_authz::{Action, AgentId, JoinableRef, Membership, Query, RecordId, Resource, ResourceType};
use directory::config::{DirectoryConfig, StorageBackend};
use directory::store::memory::InMemoryStore;
use directory::store::postgres::PostgresStore;
use directory::{AccessStore, Authorizer, observability, seed};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "directory", about = "Community access-control directory")]
struct Cli {
    /// YAML file of memberships and records loaded before the command runs.
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert the built-in roles and permissions.
    Seed,
    /// Grant (or, with --replace, reassign) a membership.
    Grant {
        #[arg(long)]
        agent: String,
        /// Container as `kind:id`, e.g. `community:c1`.
        #[arg(long)]
        joinable: JoinableRef,
        #[arg(long)]
        role: String,
        #[arg(long)]
        replace: bool,
    },
    /// Revoke a membership.
    Revoke {
        #[arg(long)]
        agent: String,
        #[arg(long)]
        joinable: JoinableRef,
    },
    /// Decide one action on one record.
    Check {
        /// Acting agent; omitted means anonymous.
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        kind: ResourceType,
        #[arg(long)]
        id: String,
        #[arg(long)]
        action: Action,
    },
    /// List the records of a type the agent may see.
    List {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        kind: ResourceType,
    },
    /// Print the agent's resolved permission identifiers.
    Permissions {
        #[arg(long)]
        agent: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Fixtures {
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    resources: Vec<Resource>,
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_observability("directory");
    let cli = Cli::parse();
    let config = DirectoryConfig::from_env_or_yaml().context("directory config")?;
    let store = open_store(&config).await?;
    store.health_check().await.context("store health check")?;
    tracing::info!(backend = store.backend_name(), durable = store.is_durable(), "store ready");

    if !store.is_durable() {
        // A fresh memory store has nothing to decide against without a catalog.
        seed::seed_catalog(store.as_ref()).await?;
    }
    if let Some(path) = &cli.fixtures {
        load_fixtures(store.as_ref(), path).await?;
    }
    run(cli.command, store).await
}

async fn open_store(config: &DirectoryConfig) -> Result<Arc<dyn AccessStore>> {
    let store: Arc<dyn AccessStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };
    Ok(store)
}

async fn load_fixtures(store: &dyn AccessStore, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read fixtures: {}", path.display()))?;
    let fixtures: Fixtures = serde_yaml::from_str(&contents).context("parse fixtures yaml")?;
    for membership in fixtures.memberships {
        store.reassign_membership(membership).await?;
    }
    for resource in fixtures.resources {
        store.put_resource(resource).await?;
    }
    Ok(())
}

async fn run(command: Command, store: Arc<dyn AccessStore>) -> Result<()> {
    let authorizer = Authorizer::new(store.clone());
    match command {
        Command::Seed => {
            let report = seed::seed_catalog(store.as_ref()).await?;
            println!(
                "{}",
                serde_json::json!({
                    "roles": report.roles,
                    "permissions": report.permissions,
                    "assignments": report.assignments,
                })
            );
        }
        Command::Grant {
            agent,
            joinable,
            role,
            replace,
        } => {
            let membership = Membership::new(agent, joinable, role);
            if replace {
                store.reassign_membership(membership.clone()).await?;
            } else {
                store.grant_membership(membership.clone()).await?;
            }
            println!("{}", serde_json::to_string(&membership)?);
        }
        Command::Revoke { agent, joinable } => {
            let removed = store
                .revoke_membership(&AgentId::new(agent), &joinable)
                .await?;
            println!("{}", serde_json::to_string(&removed)?);
        }
        Command::Check {
            agent,
            kind,
            id,
            action,
        } => {
            let agent = agent.map(AgentId::new);
            let allowed = authorizer
                .authorize(agent.as_ref(), kind, &RecordId::new(id.clone()), action)
                .await?;
            println!(
                "{}",
                serde_json::json!({
                    "kind": kind,
                    "id": id,
                    "action": action,
                    "allowed": allowed,
                })
            );
        }
        Command::List { agent, kind } => {
            let agent = agent.map(AgentId::new);
            let rows = authorizer
                .visible(agent.as_ref(), &Query::all(kind))
                .await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Permissions { agent } => {
            let agent = AgentId::new(agent);
            let principal = authorizer
                .principal(Some(&agent))
                .await?
                .context("resolve principal")?;
            println!("{}", serde_json::to_string(&principal.permissions())?);
        }
    }
    Ok(())
}
