use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vsphere: VsphereConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VsphereConfig {
    /// vCenter base URL, e.g. `https://vcenter.example.com`
    pub url: String,
    pub username: String,
    pub password: SecretString,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    /// vim25 release segment used in VI/JSON paths
    #[serde(default = "default_api_release")]
    pub api_release: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of concurrent `/metrics` scrapes
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    /// Deadline for one collector within one scrape
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_seconds: u64,
    /// Parse VM annotations as JSON and expose crit/responsable/service labels
    #[serde(default)]
    pub annotation_labels: bool,
    #[serde(default)]
    pub collectors: CollectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorsConfig {
    #[serde(default = "default_true")]
    pub esx: bool,
    #[serde(default = "default_true")]
    pub vm: bool,
    #[serde(default = "default_true")]
    pub datastore: bool,
    #[serde(default = "default_true")]
    pub resource_pool: bool,
    #[serde(default = "default_true")]
    pub storage_pod: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            max_requests: default_max_requests(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            scrape_timeout_seconds: default_scrape_timeout(),
            annotation_labels: false,
            collectors: CollectorsConfig::default(),
        }
    }
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            esx: true,
            vm: true,
            datastore: true,
            resource_pool: true,
            storage_pod: true,
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9879
}

fn default_max_requests() -> usize {
    40
}

fn default_api_release() -> String {
    "8.0.1.0".to_string()
}

fn default_scrape_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Values supplied on the command line, applied over file and environment
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub vsphere_url: Option<String>,
    pub vsphere_username: Option<String>,
    pub vsphere_password: Option<String>,
    pub port: Option<u16>,
    pub addr: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_overrides(path, &ConfigOverrides::default())
    }

    /// Load `path`, then `VSPHERE_EXPORTER__*` environment variables, then `overrides`
    pub fn load_with_overrides(path: &str, overrides: &ConfigOverrides) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VSPHERE_EXPORTER").separator("__"))
            .set_override_option("vsphere.url", overrides.vsphere_url.clone())?
            .set_override_option("vsphere.username", overrides.vsphere_username.clone())?
            .set_override_option("vsphere.password", overrides.vsphere_password.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("server.addr", overrides.addr.clone())?
            .build()
            .context("Failed to build configuration")?;

        let config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.vsphere.url.trim().is_empty() {
            anyhow::bail!("vsphere.url must not be empty");
        }
        if self.metrics.scrape_timeout_seconds == 0 {
            anyhow::bail!("metrics.scrape_timeout_seconds must be greater than zero");
        }
        if self.server.max_requests == 0 {
            anyhow::bail!("server.max_requests must be greater than zero");
        }
        Ok(())
    }
}
