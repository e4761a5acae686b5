//! Vent pump configuration - the remotely editable settings plus the
//! fixed per-device settings that are not exposed to the network.
//!
//! ```
//! use ventpump_logic::config::{validate_config, PressureChecks, PumpDirection, VentPumpConfig};
//!
//! let config = VentPumpConfig {
//!     direction: PumpDirection::Siphoning,
//!     pressure_checks: PressureChecks::INTERNAL,
//!     ..Default::default()
//! };
//! assert!(validate_config(&config).is_empty());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ports, vent_defaults};

/// Flow polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PumpDirection {
    /// Pipe to environment.
    Releasing,
    /// Environment to pipe.
    Siphoning,
}

impl fmt::Display for PumpDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpDirection::Releasing => write!(f, "Releasing"),
            PumpDirection::Siphoning => write!(f, "Siphoning"),
        }
    }
}

/// Which pressure bounds are enforced. Bit 0 = internal, bit 1 = external.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PressureChecks(u8);

impl PressureChecks {
    pub const NONE: Self = Self(0);
    pub const INTERNAL: Self = Self(0b01);
    pub const EXTERNAL: Self = Self(0b10);
    pub const BOTH: Self = Self(0b11);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn internal(self) -> bool {
        self.contains(Self::INTERNAL)
    }

    pub fn external(self) -> bool {
        self.contains(Self::EXTERNAL)
    }
}

impl std::ops::BitOr for PressureChecks {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl TryFrom<u8> for PressureChecks {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits > Self::BOTH.0 {
            return Err(format!("pressure check bits out of range: {bits}"));
        }
        Ok(Self(bits))
    }
}

impl From<PressureChecks> for u8 {
    fn from(checks: PressureChecks) -> u8 {
        checks.0
    }
}

impl fmt::Display for PressureChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            0 => "NoBound",
            1 => "InternalBound",
            2 => "ExternalBound",
            _ => "Both",
        };
        write!(f, "{}", name)
    }
}

/// Remotely editable vent pump configuration.
///
/// Every field is required when decoded, so a partial payload is rejected
/// as a whole rather than half-applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VentPumpConfig {
    /// Master on/off.
    pub enabled: bool,
    pub direction: PumpDirection,
    pub pressure_checks: PressureChecks,
    /// Pipe-side floor (releasing) or ceiling target (siphoning), kPa.
    pub internal_pressure_bound: f32,
    /// Environment-side ceiling target (releasing) or floor (siphoning), kPa.
    pub external_pressure_bound: f32,
    /// Hard ceiling that disables transfer entirely, kPa.
    pub max_pressure: f32,
    /// Nominal pressure change per second, kPa/s.
    pub target_pressure_change: f32,
    /// Fraction of pipe pressure deliverable as supply pressure, (0, 1].
    pub pump_power: f32,
    /// Environment pressure below which the vent locks out, kPa.
    pub under_pressure_lockout_threshold: f32,
    /// Fractional leak coefficient used while locked out.
    pub under_pressure_lockout_leak_rate: f32,
    /// Persistent operator override of the lockout.
    pub pressure_lockout_override: bool,
}

impl Default for VentPumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direction: PumpDirection::Releasing,
            pressure_checks: PressureChecks::EXTERNAL,
            internal_pressure_bound: vent_defaults::INTERNAL_PRESSURE_BOUND,
            external_pressure_bound: vent_defaults::EXTERNAL_PRESSURE_BOUND,
            max_pressure: vent_defaults::MAX_PRESSURE,
            target_pressure_change: vent_defaults::TARGET_PRESSURE_CHANGE,
            pump_power: vent_defaults::PUMP_POWER,
            under_pressure_lockout_threshold: vent_defaults::UNDER_PRESSURE_LOCKOUT_THRESHOLD,
            under_pressure_lockout_leak_rate: vent_defaults::UNDER_PRESSURE_LOCKOUT_LEAK_RATE,
            pressure_lockout_override: false,
        }
    }
}

/// Linked mode-select signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeSignal {
    Pressurize,
    Depressurize,
}

impl ModeSignal {
    /// Match a signal port name.
    pub fn from_port(port: &str) -> Option<Self> {
        match port {
            ports::PRESSURIZE => Some(ModeSignal::Pressurize),
            ports::DEPRESSURIZE => Some(ModeSignal::Depressurize),
            _ => None,
        }
    }

    pub fn port(self) -> &'static str {
        match self {
            ModeSignal::Pressurize => ports::PRESSURIZE,
            ModeSignal::Depressurize => ports::DEPRESSURIZE,
        }
    }
}

/// Per-device settings that the network cannot change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Node used while releasing.
    pub inlet: String,
    /// Node used while siphoning.
    pub outlet: String,
    /// Whether the mode-select ports are wired up.
    pub can_link: bool,
    pub pressurize_pressure: f32,
    pub depressurize_pressure: f32,
    /// Duration of the unlock interaction, seconds.
    pub unlock_do_after: f64,
    /// How long a completed unlock suppresses the lockout, seconds.
    pub manual_override_duration: f64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            inlet: ports::PIPE.to_string(),
            outlet: ports::PIPE.to_string(),
            can_link: false,
            pressurize_pressure: vent_defaults::PRESSURIZE_PRESSURE,
            depressurize_pressure: vent_defaults::DEPRESSURIZE_PRESSURE,
            unlock_do_after: vent_defaults::UNLOCK_DO_AFTER,
            manual_override_duration: vent_defaults::MANUAL_OVERRIDE_DURATION,
        }
    }
}

impl DeviceSettings {
    /// Node name for the given direction. Exactly one node is active at a time.
    pub fn node_for(&self, direction: PumpDirection) -> &str {
        match direction {
            PumpDirection::Releasing => &self.inlet,
            PumpDirection::Siphoning => &self.outlet,
        }
    }

    /// Canned configuration for a mode signal, built on top of `current`.
    pub fn mode_config(&self, current: &VentPumpConfig, signal: ModeSignal) -> VentPumpConfig {
        let (direction, bound) = match signal {
            ModeSignal::Pressurize => (PumpDirection::Releasing, self.pressurize_pressure),
            ModeSignal::Depressurize => (PumpDirection::Siphoning, self.depressurize_pressure),
        };
        VentPumpConfig {
            direction,
            external_pressure_bound: bound,
            pressure_checks: PressureChecks::EXTERNAL,
            ..*current
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric field is NaN or infinite.
    NonFinite(&'static str),
    /// A pressure field is negative.
    NegativePressure(&'static str),
    /// Pump power outside (0, 1].
    PumpPowerOutOfRange(f32),
    /// A rate or coefficient is negative.
    NegativeRate(&'static str),
    /// Max pressure must be positive.
    NonPositiveMaxPressure(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonFinite(field) => write!(f, "{} is not finite", field),
            ConfigError::NegativePressure(field) => write!(f, "{} is negative", field),
            ConfigError::PumpPowerOutOfRange(p) => {
                write!(f, "pump power {} outside (0, 1]", p)
            }
            ConfigError::NegativeRate(field) => write!(f, "{} is negative", field),
            ConfigError::NonPositiveMaxPressure(p) => {
                write!(f, "max pressure {} must be positive", p)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &VentPumpConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let numeric = [
        ("internal_pressure_bound", config.internal_pressure_bound),
        ("external_pressure_bound", config.external_pressure_bound),
        ("max_pressure", config.max_pressure),
        ("target_pressure_change", config.target_pressure_change),
        ("pump_power", config.pump_power),
        (
            "under_pressure_lockout_threshold",
            config.under_pressure_lockout_threshold,
        ),
        (
            "under_pressure_lockout_leak_rate",
            config.under_pressure_lockout_leak_rate,
        ),
    ];
    for (field, value) in numeric {
        if !value.is_finite() {
            errors.push(ConfigError::NonFinite(field));
        }
    }
    if !errors.is_empty() {
        return errors;
    }

    for (field, value) in [
        ("internal_pressure_bound", config.internal_pressure_bound),
        ("external_pressure_bound", config.external_pressure_bound),
        (
            "under_pressure_lockout_threshold",
            config.under_pressure_lockout_threshold,
        ),
    ] {
        if value < 0.0 {
            errors.push(ConfigError::NegativePressure(field));
        }
    }
    if config.max_pressure <= 0.0 {
        errors.push(ConfigError::NonPositiveMaxPressure(config.max_pressure));
    }
    if config.pump_power <= 0.0 || config.pump_power > 1.0 {
        errors.push(ConfigError::PumpPowerOutOfRange(config.pump_power));
    }
    if config.target_pressure_change < 0.0 {
        errors.push(ConfigError::NegativeRate("target_pressure_change"));
    }
    if config.under_pressure_lockout_leak_rate < 0.0 {
        errors.push(ConfigError::NegativeRate("under_pressure_lockout_leak_rate"));
    }

    errors
}

/// A named device preset: remote config plus fixed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentPreset {
    pub config: VentPumpConfig,
    #[serde(default)]
    pub settings: DeviceSettings,
}

/// Parse a JSON object of named presets.
pub fn presets_from_json(json: &str) -> Result<BTreeMap<String, VentPreset>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&VentPumpConfig::default()).is_empty());
    }

    #[test]
    fn test_unknown_direction_fails_decoding() {
        let mut value = serde_json::to_value(VentPumpConfig::default()).unwrap();
        value["direction"] = serde_json::json!("Sideways");
        assert!(serde_json::from_value::<VentPumpConfig>(value).is_err());

        let ok: PumpDirection = serde_json::from_str("\"Siphoning\"").unwrap();
        assert_eq!(ok, PumpDirection::Siphoning);
    }

    #[test]
    fn test_pressure_checks_bits() {
        assert!(PressureChecks::BOTH.internal());
        assert!(PressureChecks::BOTH.external());
        assert!(!PressureChecks::EXTERNAL.internal());
        assert!(!PressureChecks::NONE.external());
        assert_eq!(
            PressureChecks::INTERNAL | PressureChecks::EXTERNAL,
            PressureChecks::BOTH
        );
    }

    #[test]
    fn test_pressure_checks_reject_out_of_range_bits() {
        let parsed: Result<PressureChecks, _> = serde_json::from_str("4");
        assert!(parsed.is_err());
        let ok: PressureChecks = serde_json::from_str("2").unwrap();
        assert_eq!(ok, PressureChecks::EXTERNAL);
    }

    #[test]
    fn test_missing_field_rejects_config() {
        let mut value = serde_json::to_value(VentPumpConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("max_pressure");
        let parsed: Result<VentPumpConfig, _> = serde_json::from_value(value);
        assert!(parsed.is_err(), "partial config must not decode");
    }

    #[test]
    fn test_validate_catches_bad_pump_power() {
        let config = VentPumpConfig {
            pump_power: 1.5,
            ..Default::default()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::PumpPowerOutOfRange(1.5)]
        );
    }

    #[test]
    fn test_validate_catches_non_finite() {
        let config = VentPumpConfig {
            external_pressure_bound: f32::NAN,
            ..Default::default()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::NonFinite("external_pressure_bound")]
        );
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let config = VentPumpConfig {
            internal_pressure_bound: -1.0,
            max_pressure: 0.0,
            under_pressure_lockout_leak_rate: -0.1,
            ..Default::default()
        };
        assert_eq!(validate_config(&config).len(), 3);
    }

    #[test]
    fn test_node_for_direction() {
        let settings = DeviceSettings {
            inlet: "inlet".into(),
            outlet: "outlet".into(),
            ..Default::default()
        };
        assert_eq!(settings.node_for(PumpDirection::Releasing), "inlet");
        assert_eq!(settings.node_for(PumpDirection::Siphoning), "outlet");
    }

    #[test]
    fn test_mode_config_selects_canned_values() {
        let settings = DeviceSettings::default();
        let current = VentPumpConfig {
            pressure_checks: PressureChecks::BOTH,
            enabled: false,
            ..Default::default()
        };
        let depress = settings.mode_config(&current, ModeSignal::Depressurize);
        assert_eq!(depress.direction, PumpDirection::Siphoning);
        assert_eq!(depress.pressure_checks, PressureChecks::EXTERNAL);
        assert_eq!(depress.external_pressure_bound, 0.0);
        assert!(!depress.enabled, "mode switch leaves other fields alone");
    }

    #[test]
    fn test_mode_signal_ports() {
        assert_eq!(
            ModeSignal::from_port("pressurize"),
            Some(ModeSignal::Pressurize)
        );
        assert_eq!(ModeSignal::from_port("open"), None);
        assert_eq!(ModeSignal::Depressurize.port(), "depressurize");
    }

    #[test]
    fn test_presets_from_json() {
        let json = r#"{
            "scrubber_style": {
                "config": {
                    "enabled": true,
                    "direction": "Siphoning",
                    "pressure_checks": 1,
                    "internal_pressure_bound": 50.0,
                    "external_pressure_bound": 0.0,
                    "max_pressure": 4500.0,
                    "target_pressure_change": 101.325,
                    "pump_power": 1.0,
                    "under_pressure_lockout_threshold": 80.0,
                    "under_pressure_lockout_leak_rate": 0.0001,
                    "pressure_lockout_override": false
                }
            }
        }"#;
        let presets = presets_from_json(json).unwrap();
        let preset = &presets["scrubber_style"];
        assert_eq!(preset.config.direction, PumpDirection::Siphoning);
        assert_eq!(preset.settings, DeviceSettings::default());
    }
}
