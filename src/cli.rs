use clap::Parser;

/// Command line interface for the application
#[derive(Parser, Debug)]
#[command(version, about = "Queues forecaster training chains behind an HTTP API")]
pub struct Cli {
    /// Path to the YAML configuration file, built-in defaults when absent
    #[arg(short, long)]
    pub config: Option<String>,

    /// Sets the logging verbosity level for the application
    /// Possible values: "error", "warn", "info", "debug", "trace"
    #[arg(long, default_value_t = String::from("info"))]
    pub logging_level: String,

    /// Also write logs to daily rotating files in ./logs
    #[arg(long)]
    pub log_to_file: bool,

    /// Overrides `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Overrides `broker.workers`
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Prints the digest to store in `auth.users[].hashed_password` and exits
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["anyforecast"]).unwrap();
        assert!(cli.config.is_none());
        assert_eq!(cli.logging_level, "info");
        assert!(!cli.log_to_file);
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "anyforecast",
            "--config",
            "anyforecast.yaml",
            "--port",
            "9000",
            "--workers",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("anyforecast.yaml"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.workers, Some(2));
    }
}
