use super::*;

#[test]
fn defaults_match_deployment_table() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.database.max_connections.get(), 10);
    assert_eq!(settings.cache.backend, CacheBackend::Memory);
    assert_eq!(settings.cache.list_ttl_seconds.get(), 60);
    assert_eq!(settings.cache.item_ttl_seconds.get(), 300);
    assert_eq!(settings.cache.invalidation, InvalidationStrategy::Scan);
    assert_eq!(settings.uploads.public_prefix, "/storage");
    assert_eq!(settings.uploads.max_image_bytes.get(), 5 * 1024 * 1024);
    assert_eq!(settings.auth.token_ttl, time::Duration::hours(168));
    assert_eq!(settings.locale, Locale::Id);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.invalidation = Some("scan".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_invalidation: Some("generation".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.invalidation, InvalidationStrategy::Generation);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn redis_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("redis".to_string());

    let err = Settings::from_raw(raw.clone()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.redis_url",
            ..
        }
    ));

    raw.cache.redis_url = Some("redis://127.0.0.1:6379".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    match settings.cache.backend {
        CacheBackend::Redis {
            pool_size, timeout, ..
        } => {
            assert_eq!(pool_size.get(), 16);
            assert_eq!(timeout, Duration::from_millis(500));
        }
        other => panic!("unexpected backend: {other:?}"),
    }
}

#[test]
fn zero_and_unknown_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.list_ttl_seconds = Some(0);
    assert!(matches!(
        Settings::from_raw(raw).unwrap_err(),
        LoadError::Invalid {
            key: "cache.list_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.cache.invalidation = Some("eventual".to_string());
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.locale.default = Some("fr".to_string());
    assert!(matches!(
        Settings::from_raw(raw).unwrap_err(),
        LoadError::Invalid {
            key: "locale.default",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["alumni"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "alumni",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "alumni",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-backend",
        "redis",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_backend.as_deref(), Some("redis"));
        }
        _ => panic!("wrong command parsed"),
    }
}
