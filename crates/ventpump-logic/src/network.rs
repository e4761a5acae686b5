//! Device-network command surface.
//!
//! Packets are JSON objects keyed by `"command"`. A vent answers
//! `sync_data` with its current config and applies `set_state` through the
//! audited diff. Anything missing, malformed or invalid is rejected and the
//! device keeps running on its previous config.

use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::audit::ConfigChange;
use crate::config::{validate_config, ConfigError, VentPumpConfig};
use crate::constants::packet_keys;
use crate::regulator::VentPumpRegulator;

/// A decoded remote command.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    SyncRequest,
    SetState(VentPumpConfig),
}

/// What the device does in response.
#[derive(Debug, Clone, PartialEq)]
pub enum PacketResponse {
    /// Send this payload back to the sender.
    Reply(Value),
    /// Config replaced; these fields changed.
    Applied(Vec<ConfigChange>),
}

/// Why a packet was ignored.
#[derive(Debug)]
pub enum PacketError {
    MissingCommand,
    UnknownCommand(String),
    MissingPayload,
    Malformed(serde_json::Error),
    Invalid(Vec<ConfigError>),
}

impl From<serde_json::Error> for PacketError {
    fn from(e: serde_json::Error) -> Self {
        PacketError::Malformed(e)
    }
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::MissingCommand => write!(f, "packet has no command"),
            PacketError::UnknownCommand(cmd) => write!(f, "unknown command '{}'", cmd),
            PacketError::MissingPayload => write!(f, "set_state packet has no payload"),
            PacketError::Malformed(e) => write!(f, "malformed payload: {}", e),
            PacketError::Invalid(errors) => {
                write!(f, "invalid config:")?;
                for e in errors {
                    write!(f, " {};", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PacketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PacketError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

/// Decode a packet into a command.
pub fn parse_command(payload: &Value) -> Result<RemoteCommand, PacketError> {
    let command = payload
        .get(packet_keys::COMMAND)
        .and_then(Value::as_str)
        .ok_or(PacketError::MissingCommand)?;

    match command {
        packet_keys::SYNC_DATA => Ok(RemoteCommand::SyncRequest),
        packet_keys::SET_STATE => {
            let data = payload
                .get(packet_keys::SET_STATE)
                .ok_or(PacketError::MissingPayload)?;
            let config = VentPumpConfig::deserialize(data)?;
            let errors = validate_config(&config);
            if !errors.is_empty() {
                return Err(PacketError::Invalid(errors));
            }
            Ok(RemoteCommand::SetState(config))
        }
        other => Err(PacketError::UnknownCommand(other.to_string())),
    }
}

/// Reply payload carrying the current config.
pub fn sync_payload(config: &VentPumpConfig) -> Value {
    json!({
        "command": "sync_data",
        "sync_data": config,
    })
}

/// Build a `set_state` packet, as an air alarm would.
pub fn set_state_payload(config: &VentPumpConfig) -> Value {
    json!({
        "command": "set_state",
        "set_state": config,
    })
}

impl VentPumpRegulator {
    /// Handle one packet. On error the config is untouched.
    pub fn handle_packet(&mut self, payload: &Value) -> Result<PacketResponse, PacketError> {
        match parse_command(payload)? {
            RemoteCommand::SyncRequest => Ok(PacketResponse::Reply(sync_payload(&self.config))),
            RemoteCommand::SetState(config) => {
                Ok(PacketResponse::Applied(self.apply_remote_config(config)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PumpDirection;

    #[test]
    fn test_sync_returns_current_config() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let response = vent
            .handle_packet(&json!({ "command": "sync_data" }))
            .unwrap();
        let PacketResponse::Reply(reply) = response else {
            panic!("sync should reply");
        };
        assert_eq!(reply["command"], "sync_data");
        let echoed: VentPumpConfig = serde_json::from_value(reply["sync_data"].clone()).unwrap();
        assert_eq!(echoed, vent.config);
    }

    #[test]
    fn test_set_state_applies_and_audits() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let target = VentPumpConfig {
            direction: PumpDirection::Siphoning,
            ..Default::default()
        };
        let response = vent.handle_packet(&set_state_payload(&target)).unwrap();
        let expected = crate::audit::diff_configs(&VentPumpConfig::default(), &target);
        assert_eq!(expected.len(), 1);
        assert_eq!(response, PacketResponse::Applied(expected));
        assert_eq!(vent.config.direction, PumpDirection::Siphoning);
    }

    #[test]
    fn test_missing_command_rejected() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let err = vent.handle_packet(&json!({ "set_state": {} })).unwrap_err();
        assert!(matches!(err, PacketError::MissingCommand));
    }

    #[test]
    fn test_unknown_command_rejected() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let err = vent.handle_packet(&json!({ "command": "reboot" })).unwrap_err();
        assert!(matches!(err, PacketError::UnknownCommand(ref c) if c == "reboot"));
    }

    #[test]
    fn test_set_state_without_payload_rejected() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let err = vent
            .handle_packet(&json!({ "command": "set_state" }))
            .unwrap_err();
        assert!(matches!(err, PacketError::MissingPayload));
    }

    #[test]
    fn test_malformed_field_leaves_config_untouched() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let mut packet = set_state_payload(&VentPumpConfig {
            enabled: false,
            ..Default::default()
        });
        packet["set_state"]["direction"] = json!("Sideways");
        let err = vent.handle_packet(&packet).unwrap_err();
        assert!(matches!(err, PacketError::Malformed(_)));
        assert!(vent.config.enabled, "rejected packet must not half-apply");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
        let mut packet = set_state_payload(&VentPumpConfig::default());
        packet["set_state"]["pump_power"] = json!(3.0);
        let err = vent.handle_packet(&packet).unwrap_err();
        assert!(matches!(err, PacketError::Invalid(ref e) if e.len() == 1));
        assert!(err.to_string().contains("pump power"));
    }
}
