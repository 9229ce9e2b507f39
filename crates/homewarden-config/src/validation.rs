//! Configuration validation

use crate::schema::{RawConfig, RawMachine};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Machine '{machine}': {message}")]
    MachineError { machine: String, message: String },

    #[error("Duplicate machine IP address: {0}")]
    DuplicateIp(String),

    #[error("Network interface name cannot be empty")]
    EmptyInterface,

    #[error("Ping interval must be at least 1 second")]
    PingIntervalRange,

    #[error("Ping timeout must be between 1 and 255 seconds, got {0}")]
    PingTimeoutRange(u64),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.network.interface.is_empty() {
        errors.push(ValidationError::EmptyInterface);
    }

    if config.ping.interval_seconds == 0 {
        errors.push(ValidationError::PingIntervalRange);
    }

    // The sweep timeout rides in a single byte on the wire side.
    if !(1..=255).contains(&config.ping.timeout_seconds) {
        errors.push(ValidationError::PingTimeoutRange(config.ping.timeout_seconds));
    }

    errors.extend(validate_machine(&config.server, true));
    for machine in &config.machines {
        errors.extend(validate_machine(machine, false));
    }

    // Reply attribution is keyed by source IP, so duplicates would alias.
    let mut seen_ips = HashSet::new();
    for machine in config.machines.iter().chain(std::iter::once(&config.server)) {
        if machine.ip.parse::<Ipv4Addr>().is_ok() && !seen_ips.insert(&machine.ip) {
            errors.push(ValidationError::DuplicateIp(machine.ip.clone()));
        }
    }

    errors
}

fn validate_machine(machine: &RawMachine, is_server: bool) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let label = if machine.name.is_empty() {
        "<unnamed>".to_string()
    } else {
        machine.name.clone()
    };

    if machine.name.is_empty() {
        errors.push(ValidationError::MachineError {
            machine: label.clone(),
            message: "name cannot be empty".into(),
        });
    }

    if let Err(e) = machine.mac.parse::<homewarden_util::MacAddr>() {
        errors.push(ValidationError::MachineError {
            machine: label.clone(),
            message: format!("invalid MAC address '{}': {}", machine.mac, e),
        });
    }

    if machine.ip.parse::<Ipv4Addr>().is_err() {
        errors.push(ValidationError::MachineError {
            machine: label.clone(),
            message: format!("invalid IPv4 address '{}'", machine.ip),
        });
    }

    if machine.timeout_seconds == 0 {
        errors.push(ValidationError::MachineError {
            machine: label.clone(),
            message: "timeout must be at least 1 second".into(),
        });
    }

    if is_server {
        match &machine.username {
            Some(username) if !username.is_empty() => {}
            _ => errors.push(ValidationError::MachineError {
                machine: label,
                message: "server requires a non-empty username".into(),
            }),
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawFilesConfig, RawNetworkConfig, RawPingConfig};

    fn raw_machine(name: &str, ip: &str) -> RawMachine {
        RawMachine {
            name: name.into(),
            mac: "aa:bb:cc:dd:ee:ff".into(),
            ip: ip.into(),
            timeout_seconds: 60,
            username: None,
            password: String::new(),
        }
    }

    fn valid_config() -> RawConfig {
        let mut server = raw_machine("server", "192.168.1.2");
        server.username = Some("root".into());

        RawConfig {
            config_version: 1,
            network: RawNetworkConfig {
                interface: "eth0".into(),
            },
            ping: RawPingConfig::default(),
            server,
            machines: vec![raw_machine("desktop", "192.168.1.10")],
            files: RawFilesConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&valid_config()).is_empty());
    }

    #[test]
    fn missing_server_username_rejected() {
        let mut config = valid_config();
        config.server.username = None;

        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::MachineError { .. })));
    }

    #[test]
    fn watched_machines_need_no_username() {
        let config = valid_config();
        assert!(config.machines[0].username.is_none());
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn duplicate_ip_rejected() {
        let mut config = valid_config();
        config.machines.push(raw_machine("clone", "192.168.1.10"));

        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateIp(_))));
    }

    #[test]
    fn ping_timeout_bounds() {
        for bad in [0, 256, 1000] {
            let mut config = valid_config();
            config.ping.timeout_seconds = bad;
            let errors = validate_config(&config);
            assert!(
                errors
                    .iter()
                    .any(|e| matches!(e, ValidationError::PingTimeoutRange(_))),
                "timeout {bad} should be rejected"
            );
        }
    }

    #[test]
    fn zero_machine_timeout_rejected() {
        let mut config = valid_config();
        config.machines[0].timeout_seconds = 0;
        assert!(!validate_config(&config).is_empty());
    }
}
