//! Configuration validation tests
//!
//! Tests that verify configuration defaults, file loading and overrides.

use std::io::Write;
use vsphere_exporter::config::{
    CollectorsConfig, Config, ConfigOverrides, MetricsConfig, ServerConfig,
};

/// Write `contents` to a fresh TOML file and return its path without extension
fn write_config(name: &str, contents: &str) -> String {
    let dir = std::env::temp_dir().join(format!("vsphere-exporter-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("exporter.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

const MINIMAL: &str = r#"
[vsphere]
url = "https://vc.example.com"
username = "reader@vsphere.local"
password = "s3cret"
"#;

#[test]
fn test_default_server_config() {
    // Given / When: Default server configuration
    let config = ServerConfig::default();

    // Then: Binds every interface on the exporter port with a scrape cap
    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 9879);
    assert_eq!(config.max_requests, 40);
}

#[test]
fn test_metrics_config_defaults() {
    let config = MetricsConfig::default();

    assert_eq!(config.scrape_timeout_seconds, 30);
    assert!(!config.annotation_labels);
}

#[test]
fn test_every_collector_enabled_by_default() {
    let collectors = CollectorsConfig::default();

    assert!(collectors.esx);
    assert!(collectors.vm);
    assert!(collectors.datastore);
    assert!(collectors.resource_pool);
    assert!(collectors.storage_pod);
}

#[test]
fn test_minimal_file_fills_defaults() {
    // Given: A file with only the vSphere section
    let path = write_config("minimal", MINIMAL);

    // When: Loading it
    let config = Config::load(&path).expect("minimal config must load");

    // Then: Every other setting takes its default
    assert_eq!(config.vsphere.url, "https://vc.example.com");
    assert!(config.vsphere.verify_ssl);
    assert_eq!(config.vsphere.api_release, "8.0.1.0");
    assert_eq!(config.server.port, 9879);
    assert_eq!(config.metrics.scrape_timeout_seconds, 30);
    assert!(config.metrics.collectors.vm);
}

#[test]
fn test_collector_flags_from_file() {
    let path = write_config(
        "flags",
        &format!(
            "{}\n[metrics]\nannotation_labels = true\n\n[metrics.collectors]\nvm = false\nstorage_pod = false\n",
            MINIMAL
        ),
    );

    let config = Config::load(&path).unwrap();

    assert!(config.metrics.annotation_labels);
    assert!(!config.metrics.collectors.vm);
    assert!(!config.metrics.collectors.storage_pod);
    assert!(config.metrics.collectors.esx);
}

#[test]
fn test_command_line_overrides_win() {
    // Given: A file and command line values for the same settings
    let path = write_config("overrides", MINIMAL);
    let overrides = ConfigOverrides {
        vsphere_url: Some("https://other-vc.example.com".to_string()),
        port: Some(9100),
        addr: Some("127.0.0.1".to_string()),
        ..ConfigOverrides::default()
    };

    // When: Loading with overrides
    let config = Config::load_with_overrides(&path, &overrides).unwrap();

    // Then: The command line values are used
    assert_eq!(config.vsphere.url, "https://other-vc.example.com");
    assert_eq!(config.vsphere.username, "reader@vsphere.local");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.addr, "127.0.0.1");
}

#[test]
fn test_credentials_supplied_only_on_command_line() {
    // Given: No vSphere section at all
    let path = write_config("cli-only", "[server]\nport = 9200\n");
    let overrides = ConfigOverrides {
        vsphere_url: Some("https://vc.example.com".to_string()),
        vsphere_username: Some("reader".to_string()),
        vsphere_password: Some("pw".to_string()),
        ..ConfigOverrides::default()
    };

    // When: Loading with credential overrides
    let config = Config::load_with_overrides(&path, &overrides).unwrap();

    // Then: The configuration is complete
    assert_eq!(config.vsphere.username, "reader");
    assert_eq!(config.server.port, 9200);
}

#[test]
fn test_zero_timeout_rejected() {
    let path = write_config(
        "zero-timeout",
        &format!("{}\n[metrics]\nscrape_timeout_seconds = 0\n", MINIMAL),
    );

    let result = Config::load(&path);

    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("scrape_timeout_seconds"));
}

#[test]
fn test_missing_credentials_rejected() {
    let path = write_config("no-credentials", "[vsphere]\nurl = \"https://vc\"\n");

    assert!(Config::load(&path).is_err());
}
