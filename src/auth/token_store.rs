use std::fs;
use std::path::PathBuf;

use crate::error::AppResult;

use super::TokenSet;

/// Credential cache keyed by profile. File-backed in production; the trait
/// exists so commands and the server can be exercised against an in-memory
/// store.
pub trait TokenStore {
    fn load(&self, profile: &str) -> AppResult<Option<TokenSet>>;
    fn save(&self, profile: &str, token: &TokenSet) -> AppResult<()>;
    fn clear(&self, profile: &str) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn token_file(&self, profile: &str) -> PathBuf {
        self.dir.join(format!("{profile}.json"))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, profile: &str) -> AppResult<Option<TokenSet>> {
        let path = self.token_file(profile);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)?;
        let token = serde_json::from_str(&raw)?;
        Ok(Some(token))
    }

    fn save(&self, profile: &str, token: &TokenSet) -> AppResult<()> {
        let path = self.token_file(profile);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_string_pretty(token)?;
        fs::write(&path, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    fn clear(&self, profile: &str) -> AppResult<()> {
        let path = self.token_file(profile);
        if path.exists() {
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> TokenSet {
        TokenSet {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at_unix: Some(1_900_000_000),
            token_type: Some("Bearer".to_string()),
            scope: None,
            email: Some("dev@example.com".to_string()),
        }
    }

    #[test]
    fn round_trips_token_through_disk() {
        let dir = std::env::temp_dir().join(format!("scribe-tokens-{}", std::process::id()));
        let store = FileTokenStore::new(&dir);

        store.save("test", &sample_token()).expect("save");
        let loaded = store.load("test").expect("load").expect("token present");
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.email.as_deref(), Some("dev@example.com"));

        store.clear("test").expect("clear");
        assert!(store.load("test").expect("load").is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_profile_loads_none() {
        let store = FileTokenStore::new(std::env::temp_dir().join("scribe-tokens-missing"));
        assert!(store.load("nobody").expect("load").is_none());
    }
}
