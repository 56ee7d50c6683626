use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use super::*;

fn raw_with_public(url: &str) -> RawSettings {
    let mut raw = RawSettings::default();
    raw.api.public_url = Some(url.to_string());
    raw
}

#[test]
fn public_url_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing url");
    assert!(matches!(err, LoadError::Invalid { key: "api.public_url", .. }));
}

#[test]
fn defaults_apply_when_only_public_url_is_set() {
    let settings =
        Settings::from_raw(raw_with_public("https://api.hadith.example")).expect("valid settings");

    assert_eq!(settings.api.context, ExecutionContext::Server);
    assert_eq!(settings.api.timeout, Duration::from_secs(10));
    assert_eq!(settings.api.endpoints.internal, settings.api.endpoints.public);
    assert_eq!(settings.cache.collections_ttl, Duration::from_secs(3600));
    assert_eq!(settings.cache.navigation_preload_limit, 6);
    assert!(settings.cache.single_flight);
    assert_eq!(settings.loader.fetch_timeout, Duration::from_secs(15));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
}

#[test]
fn development_mode_uses_local_internal_address() {
    let mut raw = raw_with_public("https://api.hadith.example");
    raw.api.development = Some(true);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.api.endpoints.internal.as_str(),
        "http://127.0.0.1:8080/"
    );
}

#[test]
fn explicit_internal_address_wins_over_development_default() {
    let mut raw = raw_with_public("https://api.hadith.example");
    raw.api.development = Some(true);
    raw.api.internal_url = Some("http://catalog.internal:7000".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.api.endpoints.internal.host_str(),
        Some("catalog.internal")
    );
}

#[test]
fn rejects_unknown_context() {
    let mut raw = raw_with_public("https://api.hadith.example");
    raw.api.context = Some("browser".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid context");
    assert!(matches!(err, LoadError::Invalid { key: "api.context", .. }));
}

#[test]
fn rejects_zero_ttl_and_non_http_urls() {
    let mut raw = raw_with_public("https://api.hadith.example");
    raw.cache.collections_ttl_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero ttl");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.collections_ttl_seconds",
            ..
        }
    ));

    let err = Settings::from_raw(raw_with_public("ftp://api.hadith.example"))
        .expect_err("bad scheme");
    assert!(matches!(err, LoadError::Invalid { key: "api.public_url", .. }));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_public("https://api.hadith.example");
    raw.api.context = Some("server".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = Overrides {
        api_context: Some("client".to_string()),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.api.context, ExecutionContext::Client);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_navigation_arguments() {
    let args = CliArgs::parse_from([
        "hadith-reader",
        "navigation",
        "--expand",
        "bukhari",
        "--expand",
        "muslim",
        "--language",
        "ar",
    ]);

    assert_eq!(args.language, "ar");
    match args.command {
        Command::Navigation { expand } => assert_eq!(expand, vec!["bukhari", "muslim"]),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
#[serial]
fn load_reads_file_then_environment() {
    let mut file = NamedTempFile::with_suffix(".toml").expect("tmp file");
    writeln!(
        file,
        "[api]\npublic_url = \"https://file.hadith.example\"\ntimeout_seconds = 3\n\n[cache]\nnavigation_preload_limit = 2"
    )
    .expect("write config");

    // SAFETY: serialized with every other environment-mutating test.
    unsafe { std::env::set_var("HADITH__API__TIMEOUT_SECONDS", "7") };
    let cli = CliArgs::parse_from([
        "hadith-reader",
        "--config-file",
        file.path().to_str().expect("utf-8 path"),
        "collections",
    ]);
    let loaded = load(&cli);
    unsafe { std::env::remove_var("HADITH__API__TIMEOUT_SECONDS") };

    let settings = loaded.expect("valid settings");
    assert_eq!(
        settings.api.endpoints.public.host_str(),
        Some("file.hadith.example")
    );
    assert_eq!(settings.api.timeout, Duration::from_secs(7));
    assert_eq!(settings.cache.navigation_preload_limit, 2);
}
