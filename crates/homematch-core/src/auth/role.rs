use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Role file name in the state directory
const ROLE_FILE: &str = "role.json";

/// The account type chosen at login. Gates which dashboard and data a
/// session may access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tenant,
    Landlord,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Landlord => "landlord",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tenant" => Ok(Role::Tenant),
            "landlord" => Ok(Role::Landlord),
            other => Err(anyhow::anyhow!("unknown role: {other}")),
        }
    }
}

/// Durable storage for the last-chosen role.
///
/// Only the role survives a restart, so the next start can re-establish
/// role context without re-prompting role selection. The access token is
/// never written anywhere.
pub struct RoleStore {
    state_dir: PathBuf,
}

impl RoleStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    /// Read the persisted role. Missing or unreadable contents read as no
    /// role.
    pub fn load(&self) -> Option<Role> {
        let contents = std::fs::read_to_string(self.role_path()).ok()?;
        serde_json::from_str(&contents).ok()
    }

    pub fn save(&self, role: Role) -> Result<()> {
        let path = self.role_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(&role)?;
        std::fs::write(path, contents).context("Failed to write role file")?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.role_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn role_path(&self) -> PathBuf {
        self.state_dir.join(ROLE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = RoleStore::new(dir.path().to_path_buf());

        assert_eq!(store.load(), None);
        store.save(Role::Landlord).unwrap();
        assert_eq!(store.load(), Some(Role::Landlord));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_role_file_reads_as_no_role() {
        let dir = tempfile::tempdir().unwrap();
        let store = RoleStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("role.json"), "not-a-role").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn role_parses_from_cli_input() {
        assert_eq!("tenant".parse::<Role>().unwrap(), Role::Tenant);
        assert_eq!("landlord".parse::<Role>().unwrap(), Role::Landlord);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Tenant.to_string(), "tenant");
    }
}
