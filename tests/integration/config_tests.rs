use clap::Parser;
use dupesweep::cli::{Cli, Commands};
use dupesweep::config::{Config, ConfigError};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_config_defaults_through_figment() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
io_threads = 8
block_size = 131072
skip_hidden = true
ignore_patterns = ["*.tmp", "target/"]
verify_content = false
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config = Config::extract(figment).unwrap();

    assert_eq!(config.io_threads, 8);
    assert_eq!(config.block_size, 131_072);
    assert!(config.skip_hidden);
    assert_eq!(config.ignore_patterns, vec!["*.tmp", "target/"]);
    assert!(!config.verify_content);
    // Unset keys keep their defaults
    assert!(!config.follow_symlinks);
    assert!(!config.use_trash);
}

#[test]
fn test_config_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\nuse_trash = false\n").unwrap();

    std::env::set_var("DUPESWEEP_IO_THREADS", "2");
    std::env::set_var("DUPESWEEP_USE_TRASH", "true");
    let config = Config::load_from_path(&config_path);
    std::env::remove_var("DUPESWEEP_IO_THREADS");
    std::env::remove_var("DUPESWEEP_USE_TRASH");

    let config = config.unwrap();
    assert_eq!(config.io_threads, 2);
    assert!(config.use_trash);
}

#[test]
fn test_config_env_only() {
    let _lock = ENV_MUTEX.lock().unwrap();
    std::env::set_var("DUPESWEEP_FOLLOW_SYMLINKS", "true");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("DUPESWEEP_"));
    let config: Config = figment.extract().unwrap();

    std::env::remove_var("DUPESWEEP_FOLLOW_SYMLINKS");
    assert!(config.follow_symlinks);
}

#[test]
fn test_load_from_path_errors() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();

    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        Config::load_from_path(&missing),
        Err(ConfigError::NotFound(_))
    ));

    let malformed = temp_dir.path().join("bad.toml");
    fs::write(&malformed, "io_threads = \"many\"\n").unwrap();
    assert!(matches!(
        Config::load_from_path(&malformed),
        Err(ConfigError::Parse(_))
    ));

    let out_of_range = temp_dir.path().join("zero.toml");
    fs::write(&out_of_range, "io_threads = 0\n").unwrap();
    assert!(matches!(
        Config::load_from_path(&out_of_range),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_load_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();
    let malformed = temp_dir.path().join("bad.toml");
    fs::write(&malformed, "this is not toml = [").unwrap();

    assert_eq!(Config::load(Some(&malformed)), Config::default());
}

#[test]
fn test_cli_overrides_config() {
    let mut config = Config {
        io_threads: 8,
        ignore_patterns: vec!["*.bak".to_string()],
        ..Config::default()
    };

    let cli = Cli::try_parse_from([
        "dupesweep",
        "scan",
        "/data",
        "--io-threads",
        "2",
        "--block-size",
        "8KiB",
        "-i",
        "*.tmp",
        "--delete",
        "--trash",
        "--no-verify",
    ])
    .unwrap();
    let Commands::Scan(args) = cli.command;
    config.apply_cli(&args);

    assert_eq!(config.io_threads, 2);
    assert_eq!(config.block_size, 8192);
    assert_eq!(config.ignore_patterns, vec!["*.bak", "*.tmp"]);
    assert!(config.use_trash);
    assert!(!config.verify_content);
}

#[test]
fn test_cli_without_flags_keeps_config() {
    let mut config = Config {
        io_threads: 8,
        skip_hidden: true,
        ..Config::default()
    };

    let cli = Cli::try_parse_from(["dupesweep", "scan", "/data"]).unwrap();
    let Commands::Scan(args) = cli.command;
    config.apply_cli(&args);

    assert_eq!(config.io_threads, 8);
    assert!(config.skip_hidden);
    assert!(config.verify_content);
}
