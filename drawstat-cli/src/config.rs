use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "drawstat.json";
pub const DEFAULT_DEMO_DRAWS: usize = 150;

/// Réglages lus depuis `drawstat.json`. Tous les champs sont optionnels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: Option<PathBuf>,
    pub demo_draws: usize,
    pub seed: Option<u64>,
    pub default_toto_strategy: Option<String>,
    pub default_four_d_strategy: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            demo_draws: DEFAULT_DEMO_DRAWS,
            seed: None,
            default_toto_strategy: None,
            default_four_d_strategy: None,
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
    let settings: Settings = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide {:?}", path))?;
    Ok(settings)
}

/// Fichier explicite obligatoire ; sinon `drawstat.json` s'il existe, sinon les valeurs par défaut.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => load_settings(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                load_settings(path)
            } else {
                Ok(Settings::default())
            }
        }
    }
}
