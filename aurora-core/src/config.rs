use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Coordinates {
    /// Tromsø, Norway.
    fn default() -> Self {
        Self { latitude: 69.6496, longitude: 18.9560 }
    }
}

/// Remote endpoints. Each one can be overridden in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub kp_index: String,
    pub kp_forecast: String,
    pub long_term_outlook: String,
    pub ovation: String,
    pub plasma: String,
    pub mag: String,
    pub geolocation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            kp_index: "https://services.swpc.noaa.gov/json/planetary_k_index_1m.json".into(),
            kp_forecast: "https://services.swpc.noaa.gov/products/noaa-planetary-k-index-forecast.json"
                .into(),
            long_term_outlook: "https://services.swpc.noaa.gov/text/27-day-outlook.txt".into(),
            ovation: "https://services.swpc.noaa.gov/json/ovation_aurora_latest.json".into(),
            plasma: "https://services.swpc.noaa.gov/products/solar-wind/plasma-1-day.json".into(),
            mag: "https://services.swpc.noaa.gov/products/solar-wind/mag-1-day.json".into(),
            geolocation: "http://ip-api.com/json".into(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// kp_alert_threshold = 5.0
///
/// [home]
/// latitude = 69.6496
/// longitude = 18.956
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference point for distance sorting when geolocation is not used.
    pub home: Coordinates,

    /// Kp value at which the Kp tab shows its alert banner.
    pub kp_alert_threshold: f64,

    /// Where downloaded sun images go. Defaults to the platform data dir.
    pub image_dir: Option<PathBuf>,

    /// Where the rendered aurora map goes. Defaults to the platform data dir.
    pub map_path: Option<PathBuf>,

    pub http_timeout_secs: u64,

    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: Coordinates::default(),
            kp_alert_threshold: 5.0,
            image_dir: None,
            map_path: None,
            http_timeout_secs: 10,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.home.latitude) {
            return Err(anyhow!("home latitude {} is outside -90..=90", self.home.latitude));
        }
        if !(-180.0..=180.0).contains(&self.home.longitude) {
            return Err(anyhow!("home longitude {} is outside -180..=180", self.home.longitude));
        }
        if !(0.0..=9.0).contains(&self.kp_alert_threshold) {
            return Err(anyhow!(
                "kp_alert_threshold {} is outside the Kp scale 0..=9",
                self.kp_alert_threshold
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Log file written while the full-screen dashboard owns the terminal.
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("aurora.log"))
    }

    pub fn image_dir(&self) -> Result<PathBuf> {
        match &self.image_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("images")),
        }
    }

    pub fn map_path(&self) -> Result<PathBuf> {
        match &self.map_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("maps").join("aurora_map.png")),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "aurora-tracker", "aurora")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
