use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

// Directory configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryConfigOverride {
    storage: Option<String>,
    postgres: Option<PostgresOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct PostgresOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

impl PostgresConfig {
    fn with_url(url: String) -> Result<Self> {
        Ok(Self {
            url,
            max_connections: env_parse("COMMONS_PG_MAX_CONNECTIONS", 10)?,
            connect_timeout_ms: env_parse("COMMONS_PG_CONNECT_TIMEOUT_MS", 5_000)?,
            acquire_timeout_ms: env_parse("COMMONS_PG_ACQUIRE_TIMEOUT_MS", 5_000)?,
        })
    }
}

impl DirectoryConfig {
    pub fn from_env() -> Result<Self> {
        let storage = std::env::var("COMMONS_STORAGE")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()
            .with_context(|| "parse COMMONS_STORAGE")?;
        let postgres = match std::env::var("COMMONS_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig::with_url(url)?),
            Err(_) => None,
        };
        Ok(Self { storage, postgres })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("COMMONS_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read COMMONS_CONFIG: {path}"))?;
            let override_cfg: DirectoryConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse directory config yaml")?;
            config.apply(override_cfg)?;
        }
        Ok(config)
    }

    fn apply(&mut self, override_cfg: DirectoryConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(pg) = override_cfg.postgres {
            let mut current = match (self.postgres.take(), pg.url.clone()) {
                (_, Some(url)) => PostgresConfig::with_url(url)?,
                (Some(existing), None) => existing,
                (None, None) => bail!("postgres override requires a url"),
            };
            if let Some(value) = pg.max_connections {
                current.max_connections = value;
            }
            if let Some(value) = pg.connect_timeout_ms {
                current.connect_timeout_ms = value;
            }
            if let Some(value) = pg.acquire_timeout_ms {
                current.acquire_timeout_ms = value;
            }
            self.postgres = Some(current);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_to_memory_storage() {
        let _g1 = EnvGuard::unset("COMMONS_STORAGE");
        let _g2 = EnvGuard::unset("COMMONS_POSTGRES_URL");
        let _g3 = EnvGuard::unset("COMMONS_CONFIG");
        let config = DirectoryConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.postgres.is_none());
    }

    #[test]
    #[serial]
    fn reads_postgres_settings() {
        let _g1 = EnvGuard::set("COMMONS_STORAGE", "postgres");
        let _g2 = EnvGuard::set("COMMONS_POSTGRES_URL", "postgres://localhost/commons");
        let _g3 = EnvGuard::set("COMMONS_PG_MAX_CONNECTIONS", "3");
        let _g4 = EnvGuard::unset("COMMONS_PG_ACQUIRE_TIMEOUT_MS");
        let config = DirectoryConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.max_connections, 3);
        assert_eq!(pg.acquire_timeout_ms, 5_000);
    }

    #[test]
    #[serial]
    fn rejects_unknown_backend() {
        let _g1 = EnvGuard::set("COMMONS_STORAGE", "redis");
        let err = DirectoryConfig::from_env().expect_err("bad backend");
        assert!(err.to_string().contains("COMMONS_STORAGE"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_environment() {
        let _g1 = EnvGuard::set("COMMONS_STORAGE", "memory");
        let _g2 = EnvGuard::unset("COMMONS_POSTGRES_URL");
        let dir = std::env::temp_dir().join(format!("commons-config-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("tmp dir");
        let path = dir.join("directory.yaml");
        fs::write(
            &path,
            "storage: postgres\npostgres:\n  url: postgres://db/commons\n  max_connections: 7\n",
        )
        .expect("write yaml");
        let _g3 = EnvGuard::set("COMMONS_CONFIG", path.to_str().expect("utf8 path"));

        let config = DirectoryConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgres://db/commons");
        assert_eq!(pg.max_connections, 7);
        let _ = fs::remove_dir_all(dir);
    }
}
