use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

#[derive(Clone)]
pub struct NutritionixCredentials {
    pub app_id: String,
    pub app_key: String,
}

impl std::fmt::Debug for NutritionixCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutritionixCredentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub nutritionix: Option<NutritionixCredentials>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // A .env file is optional; real environment variables win.
        dotenvy::dotenv().ok();

        let proj_dirs =
            ProjectDirs::from("", "", "plateful").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("plateful.db");

        Ok(Config {
            db_path,
            data_dir,
            nutritionix: Self::nutritionix_credentials_from_env(),
        })
    }

    /// Both variables must be set and non-empty.
    pub fn nutritionix_credentials_from_env() -> Option<NutritionixCredentials> {
        credentials_from(
            std::env::var("NUTRITIONIX_APP_ID").ok(),
            std::env::var("NUTRITIONIX_APP_KEY").ok(),
        )
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok((key, true))
    }
}

fn credentials_from(
    app_id: Option<String>,
    app_key: Option<String>,
) -> Option<NutritionixCredentials> {
    let app_id = app_id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    let app_key = app_key.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    Some(NutritionixCredentials { app_id, app_key })
}
