use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hibp_range::{BreachChecker, ClientConfig, ConfigError};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Failed to read config file '{path}'")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config file '{path}' is not valid JSON")]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read passwords from stdin")]
    Stdin(#[from] io::Error),

    #[error(transparent)]
    Lookup(#[from] hibp_range::Error),
}

#[derive(Parser, Debug)]
#[command(name = "hibp-check")]
#[command(about = "Check passwords against Have I Been Pwned without sending them anywhere")]
#[command(version)]
struct Args {
    /// Passwords to check. Read from stdin, one per line, when omitted
    passwords: Vec<String>,

    /// Inputs are SHA-1 hex digests rather than plaintext passwords
    #[arg(long)]
    sha1: bool,

    /// JSON file with client configuration overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URI of the range API
    #[arg(long)]
    base_uri: Option<String>,

    /// Request timeout in seconds (0 disables the timeout)
    #[arg(long)]
    timeout: Option<u64>,

    /// User-Agent header sent with each request
    #[arg(long)]
    user_agent: Option<String>,

    /// Accept header sent with each request
    #[arg(long)]
    accept: Option<String>,
}

impl Args {
    /// Layers defaults < config file < command line flags.
    fn client_config(&self) -> Result<ClientConfig, Error> {
        let mut config = ClientConfig::default();

        if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
                path: path.clone(),
                source,
            })?;
            let overrides = serde_json::from_str(&text).map_err(|source| Error::ConfigJson {
                path: path.clone(),
                source,
            })?;
            config = config.merged(overrides)?;
        }

        Ok(config.merged(self.flag_overrides())?)
    }

    fn flag_overrides(&self) -> Value {
        let mut overrides = Map::new();
        if let Some(base_uri) = &self.base_uri {
            overrides.insert("base_uri".to_string(), json!(base_uri));
        }
        if let Some(timeout) = self.timeout {
            overrides.insert("timeout".to_string(), json!(timeout));
        }

        let mut headers = Map::new();
        if let Some(user_agent) = &self.user_agent {
            headers.insert("user-agent".to_string(), json!(user_agent));
        }
        if let Some(accept) = &self.accept {
            headers.insert("accept".to_string(), json!(accept));
        }
        if !headers.is_empty() {
            overrides.insert("headers".to_string(), Value::Object(headers));
        }

        Value::Object(overrides)
    }

    fn passwords(&self) -> Result<Vec<String>, Error> {
        if !self.passwords.is_empty() {
            return Ok(self.passwords.clone());
        }

        let mut passwords = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line?;
            if !line.is_empty() {
                passwords.push(line);
            }
        }
        Ok(passwords)
    }
}

/// Checks every password, returning whether any was found in a breach.
fn run(args: &Args) -> Result<bool, Error> {
    let config = args.client_config()?;
    let mut checker = BreachChecker::from_config(&config)?;
    let passwords = args.passwords()?;
    tracing::debug!(
        count = passwords.len(),
        base_uri = %config.base_uri,
        "checking passwords"
    );

    let mut any_pwned = false;
    for password in &passwords {
        let result = checker.lookup(password.as_bytes(), args.sha1)?;
        any_pwned |= result.found;

        let verdict = if result.found {
            format!("Pwned ({} times)", result.count)
        } else {
            "OK".to_string()
        };
        println!("Password \"{password}\": {verdict}");
    }

    Ok(any_pwned)
}

/// Messages of every error below `err` in its source chain, outermost first.
fn causes(err: &dyn std::error::Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            for cause in causes(&e) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use hibp_range::TransportError;

    use super::*;

    fn parse(args: &[&str]) -> Args {
        let argv = std::iter::once("hibp-check").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = parse(&["password"]).client_config().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "--base-uri",
            "http://localhost:9000",
            "--timeout",
            "5",
            "--user-agent",
            "audit/1.0",
            "password",
        ]);
        let config = args.client_config().unwrap();

        assert_eq!(config.base_uri, "http://localhost:9000");
        assert_eq!(config.timeout, 5);
        assert_eq!(config.headers["user-agent"], "audit/1.0");
        assert_eq!(config.headers["accept"], hibp_range::config::DEFAULT_ACCEPT);
    }

    #[test]
    fn test_config_file_headers_ignore_case() {
        let name = format!("hibp-check-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        let json = r#"{ "headers": { "USER-AGENT": "from-file/1.0" } }"#;
        std::fs::write(&path, json).unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "password"]);
        let config = args.client_config();
        std::fs::remove_file(&path).unwrap();

        let headers = config.unwrap().header_map().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["user-agent"], "from-file/1.0");
    }

    #[test]
    fn test_lookup_causes_are_not_repeated() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = Error::from(hibp_range::Error::TransportUnavailable {
            source: TransportError::new(refused),
        });

        assert_eq!(err.to_string(), "Cannot connect to breach lookup service.");
        assert_eq!(causes(&err), ["transport failure", "connection refused"]);
    }

    #[test]
    fn test_passwords_from_args() {
        let args = parse(&["--sha1", "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8", "other"]);
        assert!(args.sha1);
        assert_eq!(args.passwords().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["--config", "/nonexistent/hibp.json", "password"]);
        let err = args.client_config().unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }
}
