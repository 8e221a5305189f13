use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(10));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.content.directory, PathBuf::from("content/blog"));
    assert_eq!(settings.content.page_size.get(), 5);
    assert_eq!(settings.site.public_url, "http://localhost:3000/");
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.content.page_size = Some(10);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        page_size: Some(3),
        content: ContentOverrides {
            content_dir: Some(PathBuf::from("/srv/posts")),
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.content.page_size.get(), 3);
    assert_eq!(settings.content.directory, PathBuf::from("/srv/posts"));
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
fn zero_page_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.content.page_size = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid");

    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.page_size",
            ..
        }
    ));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid");

    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn site_url_gains_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.site.public_url = Some("https://blog.example.com/notes".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.site.public_url, "https://blog.example.com/notes/");
}

#[test]
fn non_http_site_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.public_url = Some("ftp://example.com".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_site_title_falls_back() {
    let mut raw = RawSettings::default();
    raw.site.title = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.site.title, DEFAULT_SITE_TITLE);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["folio"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "folio",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--page-size",
        "7",
        "--log-json",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.page_size, Some(7));
            assert_eq!(serve.overrides.log_json, Some(true));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_routes_arguments() {
    let args = CliArgs::parse_from(["folio", "routes", "--content-dir", "/tmp/posts"]);

    match args.command.expect("routes command") {
        Command::Routes(routes) => {
            assert_eq!(
                routes.content.content_dir.as_deref(),
                Some(std::path::Path::new("/tmp/posts"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn check_applies_content_override_only() {
    let args = CliArgs::parse_from(["folio", "check", "--content-dir", "/tmp/posts"]);
    let mut raw = RawSettings::default();

    if let Some(Command::Check(check)) = args.command.as_ref() {
        raw.apply_content_overrides(&check.content);
    }
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.content.directory, PathBuf::from("/tmp/posts"));
}
