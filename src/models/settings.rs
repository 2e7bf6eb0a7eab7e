use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const SETTINGS_DIR: &str = "com.carcino";
const SETTINGS_FILENAME: &str = "settings.json";

/// Runtime configuration for the lookup sources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// MedlinePlus web service endpoint
    pub medlineplus_url: String,
    /// MediaWiki Action API endpoint
    pub wikipedia_api_url: String,
    /// Per-request timeout, applied to both sources
    pub request_timeout_secs: u64,
    /// Sentences requested for a Wikipedia summary
    pub summary_sentences: u32,
    /// Candidate titles listed for an ambiguous term
    pub max_candidates: usize,
    pub user_agent: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            medlineplus_url: "https://wsearch.nlm.nih.gov/ws/query".to_string(),
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            request_timeout_secs: 10,
            summary_sentences: 4,
            max_candidates: 4,
            user_agent: "CarcinoTermFinder/0.1 (medical term lookup)".to_string(),
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Location of the optional settings override
pub fn get_settings_path() -> Result<PathBuf, String> {
    let app_support = dirs::data_dir()
        .ok_or("Could not find app support directory")?
        .join(SETTINGS_DIR);

    Ok(app_support.join(SETTINGS_FILENAME))
}

/// Load settings from the app support directory, or defaults if there is no file
pub fn load_settings() -> Result<AppSettings, String> {
    let settings_path = get_settings_path()?;
    load_settings_from(&settings_path)
}

/// Load settings from a specific file; a missing file means defaults
pub fn load_settings_from(settings_path: &Path) -> Result<AppSettings, String> {
    if !settings_path.exists() {
        debug!("No settings file at {:?}, using defaults", settings_path);
        return Ok(AppSettings::default());
    }

    let content = fs::read_to_string(settings_path)
        .map_err(|e| format!("Failed to read settings: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse settings: {}", e))
}
