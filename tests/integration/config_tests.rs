use clap::Parser;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use rmdupes::cli::Cli;
use rmdupes::config::{Config, ConfigError};
use rmdupes::scanner::DigestAlgorithm;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config.workers, 10);
    assert_eq!(config.queue_capacity, 50);
    assert_eq!(config.algorithm, DigestAlgorithm::Sha256);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "workers = 3\nalgorithm = \"crc32\"\nread_buffer_size = 4096\n",
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config.workers, 3);
    assert_eq!(config.algorithm, DigestAlgorithm::Crc32);
    assert_eq!(config.read_buffer_size, 4096);
    // Not in the file: default kept
    assert_eq!(config.queue_capacity, 50);
}

#[test]
fn test_config_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "queue_capacity = 7\nalgorithm = \"crc32\"\n").unwrap();

    std::env::set_var("RMDUPES_TEST_ONLY_ALGORITHM", "blake3");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("RMDUPES_TEST_ONLY_").split("__"));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config.algorithm, DigestAlgorithm::Blake3);
    assert_eq!(config.queue_capacity, 7);

    std::env::remove_var("RMDUPES_TEST_ONLY_ALGORITHM");
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&missing));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "workers = \"many\"").unwrap();

    let result = Config::load(Some(&config_path));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_config_zero_workers_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "workers = 0").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let result = Config::from_figment(&figment);

    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            field: "workers",
            ..
        })
    ));
}

#[test]
fn test_config_toml_is_loadable() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let original = Config {
        workers: 2,
        algorithm: DigestAlgorithm::Blake3,
        ..Config::default()
    };
    fs::write(&config_path, original.to_toml().unwrap()).unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    assert_eq!(Config::from_figment(&figment).unwrap(), original);
}

#[test]
fn test_cli_overrides_config() {
    let file_config = Config {
        workers: 3,
        queue_capacity: 9,
        ..Config::default()
    };
    let cli = Cli::try_parse_from(["rmdupes", "/data", "-w", "12", "-a", "blake3"]).unwrap();

    let merged = rmdupes::apply_overrides(file_config, &cli);

    assert_eq!(merged.workers, 12);
    assert_eq!(merged.queue_capacity, 9);
    assert_eq!(merged.algorithm, DigestAlgorithm::Blake3);
}
