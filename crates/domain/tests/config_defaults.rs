use bc_domain::config::Config;

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn default_cache_ages() {
    let config = Config::default();
    assert_eq!(config.cache.collections_max_age().num_hours(), 24);
    assert_eq!(config.cache.postcode_max_age().num_days(), 7);
    assert_eq!(config.cache.background_refresh_after().num_hours(), 12);
}

#[test]
fn default_upstream_settings() {
    let config = Config::default();
    assert_eq!(config.upstream.number_of_collections, 12);
    assert_eq!(config.upstream.max_probes, 3);
    assert!(config.upstream.base_url.ends_with("/wastecalendar"));
}

#[test]
fn default_timezone_is_london() {
    let config = Config::default();
    assert_eq!(config.locale.timezone, chrono_tz::Europe::London);
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let toml_str = r#"
[upstream]
max_probes = 4

[cache]
collections_max_age_secs = 3600

[locale]
timezone = "UTC"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.upstream.max_probes, 4);
    assert_eq!(config.upstream.number_of_collections, 12);
    assert_eq!(config.cache.collections_max_age().num_hours(), 1);
    assert_eq!(config.locale.timezone, chrono_tz::UTC);
}

#[test]
fn mock_device_parses() {
    let toml_str = r#"
[device]
mock = true
device_id = "kitchen"

[device.address]
addressLine1 = "42 Mill Lane"
postalCode = "TE5 7PC"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.device.mock);
    assert_eq!(config.device.device_id, "kitchen");
    assert_eq!(config.device.address.postal_code.as_deref(), Some("TE5 7PC"));
    assert!(config.device.address.country_code.is_none());
}

#[test]
fn bad_toml_is_config_error() {
    let err = Config::from_toml("[upstream\nmax_probes = ").unwrap_err();
    assert!(matches!(err, bc_domain::Error::Config(_)));
}
