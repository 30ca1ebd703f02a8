use super::AppConfig;
use std::error::Error;
use std::fs;

use tracing::info;

/// Loads and parses the service configuration from a YAML file
///
/// # Arguments
///
/// * `file_path` - Path to the YAML configuration file
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read
/// * The YAML content cannot be parsed into an AppConfig
pub fn load_config(file_path: &str) -> Result<AppConfig, Box<dyn Error>> {
    let yaml_str = fs::read_to_string(file_path)?;
    let config = parse_config(&yaml_str)?;
    info!("Loaded configuration from {}", file_path);
    Ok(config)
}

pub(crate) fn parse_config(yaml: &str) -> Result<AppConfig, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResultBackendConfig;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.broker.workers, 4);
        assert_eq!(
            config.broker.result_expires,
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(
            config.broker.result_backend,
            ResultBackendConfig::Sqlite {
                path: "anyforecast.db".into()
            }
        );
        assert_eq!(
            config.auth.access_token_expires,
            Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn full_document_is_parsed() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 9000
auth:
  secret_key: s3cret
  access_token_expires: 2h
  users:
    - username: johndoe
      full_name: John Doe
      hashed_password: abcd
broker:
  workers: 8
  result_expires: null
  cleanup_interval: 5min
  result_backend:
    kind: memory
training:
  datasets_dir: /srv/datasets
  trainers:
    seq2seq:
      command: [python, train_seq2seq.py]
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.access_token_expires, Duration::from_secs(7200));
        assert_eq!(config.auth.users[0].username, "johndoe");
        assert!(!config.auth.users[0].disabled);
        assert_eq!(config.broker.workers, 8);
        assert_eq!(config.broker.result_expires, None);
        assert_eq!(config.broker.cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.broker.result_backend, ResultBackendConfig::Memory);
        assert_eq!(
            config.training.trainers["seq2seq"].command,
            vec!["python", "train_seq2seq.py"]
        );
    }

    #[test]
    fn invalid_duration_is_rejected() {
        assert!(parse_config("auth:\n  access_token_expires: soon\n").is_err());
    }
}
