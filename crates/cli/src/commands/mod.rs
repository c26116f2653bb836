//! CLI subcommands.

pub mod credentials;
pub mod list;
pub mod sync;

use std::path::PathBuf;

/// Storage locations, read from the same variables as the server.
///
/// # Environment Variables
///
/// - `BAZAAR_DATA_DIR` - Record documents (default `data`)
/// - `BAZAAR_ASSET_DIR` - Asset root (default `public`)
/// - `BAZAAR_CREDENTIALS_FILE` - Credential list (default `<data dir>/credentials.json`)
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub credentials_file: PathBuf,
}

impl Paths {
    /// Load paths from the environment, honoring a `.env` file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let data_dir = PathBuf::from(var("BAZAAR_DATA_DIR").unwrap_or_else(|| "data".into()));
        let asset_dir = PathBuf::from(var("BAZAAR_ASSET_DIR").unwrap_or_else(|| "public".into()));
        let credentials_file = var("BAZAAR_CREDENTIALS_FILE")
            .map_or_else(|| data_dir.join("credentials.json"), PathBuf::from);
        Self {
            data_dir,
            asset_dir,
            credentials_file,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let paths = Paths::from_lookup(|_| None);
        assert_eq!(paths.data_dir, PathBuf::from("data"));
        assert_eq!(paths.asset_dir, PathBuf::from("public"));
        assert_eq!(paths.credentials_file, PathBuf::from("data/credentials.json"));
    }

    #[test]
    fn test_credentials_follow_data_dir() {
        let paths = Paths::from_lookup(|key| match key {
            "BAZAAR_DATA_DIR" => Some("/srv/bazaar".to_string()),
            "BAZAAR_ASSET_DIR" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(paths.credentials_file, PathBuf::from("/srv/bazaar/credentials.json"));
        assert_eq!(paths.asset_dir, PathBuf::from("public"));
    }
}
