//! Value parsers for command line arguments
//!
//! These run inside clap, so failures surface as usage errors before any
//! configuration is loaded.

use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Longest hostname accepted (RFC 1035)
const MAX_HOST_LEN: usize = 253;

/// Largest rollback accepted in one invocation
const MAX_ROLLBACK_STEPS: u32 = 100;

/// Port in 1..=65535
pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("Port must be between 1 and 65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!(
            "Port must be a number between 1 and 65535, got '{value}'"
        )),
    }
}

/// Existing, readable regular file
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);

    if !path.is_file() {
        return Err(format!("Configuration file does not exist: '{value}'"));
    }
    std::fs::File::open(&path)
        .map_err(|e| format!("Cannot read configuration file '{value}': {e}"))?;

    Ok(path)
}

/// Rollback step count in 1..=100
pub fn validate_rollback_steps(value: &str) -> Result<u32, String> {
    let steps: u32 = value
        .parse()
        .map_err(|_| format!("Rollback steps must be a positive number, got '{value}'"))?;

    match steps {
        0 => Err("Rollback steps must be greater than 0".to_string()),
        s if s > MAX_ROLLBACK_STEPS => Err(format!(
            "Rollback steps cannot exceed {MAX_ROLLBACK_STEPS}"
        )),
        s => Ok(s),
    }
}

/// Hostname or address the server can bind to
///
/// Dotted-digit strings must be valid IPv4 addresses; anything else is taken
/// as a hostname.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.len() > MAX_HOST_LEN {
        return Err(format!(
            "Host address is too long (maximum {MAX_HOST_LEN} characters)"
        ));
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') && host.parse::<Ipv4Addr>().is_err()
    {
        return Err(format!("Invalid IPv4 address: '{value}'"));
    }

    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_port_validation() {
        for port in ["1", "80", "3000", "65535"] {
            assert!(validate_port(port).is_ok(), "{port} should be valid");
        }
        for port in ["0", "65536", "abc", "-1", ""] {
            assert!(validate_port(port).is_err(), "{port} should be invalid");
        }
    }

    #[test]
    fn test_host_validation() {
        for host in ["localhost", "127.0.0.1", "0.0.0.0", "10.0.0.1", "jobs.example.com"] {
            assert!(validate_host_address(host).is_ok(), "{host} should be valid");
        }
        let long = "x".repeat(300);
        for host in ["", "   ", "two words", "999.1.1.1", "1.2.3", long.as_str()] {
            assert!(validate_host_address(host).is_err(), "'{host}' should be invalid");
        }
    }

    #[test]
    fn test_rollback_steps_validation() {
        assert_eq!(validate_rollback_steps("1"), Ok(1));
        assert_eq!(validate_rollback_steps("100"), Ok(100));
        for steps in ["0", "101", "-1", "abc"] {
            assert!(validate_rollback_steps(steps).is_err(), "{steps} should be invalid");
        }
    }

    #[test]
    fn test_config_file_path_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]").unwrap();
        let path = file.path().to_str().unwrap();

        assert_eq!(validate_config_file_path(path).unwrap(), file.path());

        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config_file_path(dir.path().to_str().unwrap()).is_err());
        assert!(validate_config_file_path("/definitely/not/here.toml").is_err());
    }
}
