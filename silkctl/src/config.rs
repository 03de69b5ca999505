use anyhow::{Context, Result, anyhow};
use libsilk::{
    database::Database,
    markers::{MapView, TileConfig},
    session::UserIdentity,
};
use serde::{Deserialize, Serialize};
use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{File, create_dir_all, read_to_string, set_permissions},
    io::AsyncWriteExt,
};
use tracing::debug;

#[derive(Deserialize, Serialize)]
pub(crate) struct Config {
    pub username: String,
    pub password: String,
    pub database: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<TileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<MapView>,
}

impl Config {
    fn parse(contents: String) -> Result<Self> {
        serde_json::from_str(&contents).with_context(|| "Couldn't parse json string")
    }

    fn format(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Couldn't convert config to json")
    }

    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        debug!(?p, "Trying to load login config");
        let contents = read_to_string(path)
            .await
            .with_context(|| "Not logged in. Use `silkctl login` first")?;
        Self::parse(contents)
    }

    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(?path, "Saving login config");
        if let Some(dir) = path.parent() {
            create_dir_all(dir).await?;
        }
        let mut file = File::create(path).await?;
        let serialized = self.format()?;
        let mut perms = file.metadata().await?.permissions();
        perms.set_mode(0o600);
        set_permissions(path, perms).await?;
        file.write_all(serialized.as_bytes())
            .await
            .with_context(|| "Failed to write config file")?;
        Ok(())
    }

    pub fn new(username: String, password: String, database: PathBuf) -> Self {
        Config {
            username,
            password,
            database,
            tiles: None,
            view: None,
        }
    }

    /// Open the configured database and check the stored credentials against it
    pub async fn validate(&self) -> Result<(Database, UserIdentity)> {
        let db = Database::open(&self.database)
            .await
            .with_context(|| format!("Failed to open database {}", self.database.display()))?;
        let user = db.authenticate(&self.username, &self.password).await?;
        Ok((db, user))
    }
}

/// The path of the file where login information is kept
pub(crate) fn config_file() -> Result<PathBuf> {
    directories::ProjectDirs::from("org", "greensilkroad", "silkroad")
        .map(|dirs| dirs.config_dir().join("config"))
        .ok_or_else(|| anyhow!("Unable to determine configuration directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let cfg = Config::parse(
            r#"{"username": "weaver", "password": "pw", "database": "silk.sqlite"}"#.to_string(),
        )
        .unwrap();
        assert_eq!(cfg.username, "weaver");
        assert!(cfg.tiles.is_none());
        assert!(cfg.view.is_none());
        assert!(!cfg.format().unwrap().contains("tiles"));
    }

    #[test]
    fn parse_map_config() {
        let cfg = Config::parse(
            r#"{
                "username": "weaver",
                "password": "pw",
                "database": "silk.sqlite",
                "tiles": {"provider": "vector", "access_token": "pk.abc"},
                "view": {"center": {"lng": 69.24, "lat": 41.3}, "zoom": 5}
            }"#
            .to_string(),
        )
        .unwrap();
        assert_eq!(cfg.tiles.unwrap().build().unwrap().name(), "vector");
        assert_eq!(cfg.view.unwrap().zoom, 5);
    }
}
