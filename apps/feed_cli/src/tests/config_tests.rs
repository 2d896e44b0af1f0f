use std::collections::HashMap;

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

const ALICE: &str = "0x00000000000000000000000000000000000000aa";
const BOB: &str = "0x00000000000000000000000000000000000000bb";

#[test]
fn defaults_match_controller_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.controller_config(), ControllerConfig::default());
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    settings.validate().expect("defaults are valid");
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        &format!(
            r#"
gateway_url = "https://gateway.example/rpc"
page_size = 5
accounts = ["{ALICE}"]
chain_id = 11155111
"#
        ),
    )
    .expect("apply file");

    assert_eq!(settings.gateway_url, "https://gateway.example/rpc");
    assert_eq!(settings.page_size, 5);
    assert_eq!(settings.fetch_concurrency, DEFAULT_FETCH_CONCURRENCY);
    assert_eq!(settings.chain_id(), ChainId(11155111));
    assert_eq!(settings.parsed_accounts().expect("accounts").len(), 1);
}

#[test]
fn unknown_file_keys_are_rejected() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "pagesize = 5").is_err());
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "page_size = 5\nfetch_concurrency = 2").expect("file");
    let accounts = format!("{ALICE}, {BOB},");
    apply_env(
        &mut settings,
        env_from(&[
            ("FEED_PAGE_SIZE", "20"),
            ("APP__PAGE_SIZE", "25"),
            ("FEED_ACCOUNTS", accounts.as_str()),
        ]),
    )
    .expect("env");

    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.fetch_concurrency, 2);
    assert_eq!(settings.accounts, vec![ALICE.to_string(), BOB.to_string()]);
}

#[test]
fn malformed_env_number_is_an_error() {
    let mut settings = Settings::default();
    let err = apply_env(&mut settings, env_from(&[("FEED_PAGE_SIZE", "ten")]))
        .expect_err("must fail");
    assert!(err.to_string().contains("PAGE_SIZE"));
}

#[test]
fn validate_rejects_bad_values() {
    let settings = Settings {
        page_size: 0,
        ..Settings::default()
    };
    assert!(settings.validate().is_err());

    let settings = Settings {
        accounts: vec!["0x1234".into()],
        ..Settings::default()
    };
    let err = settings.validate().expect_err("must fail");
    assert!(format!("{err:#}").contains("invalid account '0x1234'"));

    let settings = Settings {
        gateway_url: "localhost".into(),
        ..Settings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn validate_rejects_zero_request_timeout() {
    let settings = Settings {
        request_timeout_secs: 0,
        ..Settings::default()
    };
    let err = settings.validate().expect_err("must fail");
    assert!(err.to_string().contains("request_timeout_secs"));
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.toml");
    assert!(load_settings(Some(missing.as_path())).is_err());

    let path = dir.path().join("feed.toml");
    fs::write(&path, "page_size = 3\n").expect("write config");
    let settings = load_settings(Some(path.as_path())).expect("load");
    if std::env::var("FEED_PAGE_SIZE").is_err() && std::env::var("APP__PAGE_SIZE").is_err() {
        assert_eq!(settings.page_size, 3);
    }
}
