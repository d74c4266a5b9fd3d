use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[cfg(test)]
mod config_tests {
    use super::*;
    use pbs_cputime::config::Config;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "console");

        assert_eq!(config.paths.log_directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_env_variable_override() {
        env::set_var("LOG_LEVEL", "debug");
        env::set_var("PBS_CPUTIME_LOG_DIR", "/var/log/pbs-cputime");

        let mut config = Config::default();
        config
            .apply_env_overrides()
            .expect("Failed to apply env overrides");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.paths.log_directory, PathBuf::from("/var/log/pbs-cputime"));

        env::remove_var("LOG_LEVEL");
        env::remove_var("PBS_CPUTIME_LOG_DIR");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.logging.output = "syslog".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.format = "json".to_string();
        config.logging.output = "both".to_string();
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "basic")]
    #[test]
    fn test_config_file_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("pbs-cputime.toml");

        let mut config = Config::default();
        config.logging.format = "json".to_string();
        config.paths.log_directory = PathBuf::from("/data/logs");
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.logging.format, "json");
        assert_eq!(loaded.paths.log_directory, PathBuf::from("/data/logs"));
    }

    #[cfg(feature = "basic")]
    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[logging]\noutput = \"both\"\n").unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.logging.level, "warn");
        assert_eq!(loaded.logging.output, "both");
        assert_eq!(loaded.paths.log_directory, PathBuf::from("logs"));
    }

    #[cfg(feature = "basic")]
    #[test]
    fn test_invalid_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[logging\nlevel = ").unwrap();

        assert!(Config::load_from_file(&config_path).is_err());
    }
}
