//! Field-by-field configuration diff for the admin audit trail.
//!
//! [`diff_configs`] is pure. Records are handed to an [`AuditSink`]; a sink
//! failure is reported to the caller but never undoes the config change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{PressureChecks, PumpDirection, VentPumpConfig};

/// Audit severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogImpact {
    Low,
    Medium,
    High,
}

/// Config field that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigField {
    Enabled,
    Direction,
    PressureChecks,
    InternalPressureBound,
    ExternalPressureBound,
    MaxPressure,
    TargetPressureChange,
    PumpPower,
    LockoutThreshold,
    LockoutLeakRate,
    PressureLockoutOverride,
}

impl ConfigField {
    /// Fields an operator can flip from the air alarm are medium impact;
    /// the tuning values are low.
    pub fn impact(self) -> LogImpact {
        match self {
            ConfigField::Enabled
            | ConfigField::Direction
            | ConfigField::PressureChecks
            | ConfigField::InternalPressureBound
            | ConfigField::ExternalPressureBound
            | ConfigField::PressureLockoutOverride => LogImpact::Medium,
            ConfigField::MaxPressure
            | ConfigField::TargetPressureChange
            | ConfigField::PumpPower
            | ConfigField::LockoutThreshold
            | ConfigField::LockoutLeakRate => LogImpact::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Enabled => "enabled",
            ConfigField::Direction => "direction",
            ConfigField::PressureChecks => "pressure check",
            ConfigField::InternalPressureBound => "internal pressure bound",
            ConfigField::ExternalPressureBound => "external pressure bound",
            ConfigField::MaxPressure => "max pressure",
            ConfigField::TargetPressureChange => "target pressure change",
            ConfigField::PumpPower => "pump power",
            ConfigField::LockoutThreshold => "under-pressure lockout threshold",
            ConfigField::LockoutLeakRate => "under-pressure lockout leak rate",
            ConfigField::PressureLockoutOverride => "pressure lockout override",
        }
    }
}

/// Old or new value of a changed field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Flag(bool),
    Direction(PumpDirection),
    Checks(PressureChecks),
    /// kPa.
    Pressure(f32),
    Scalar(f32),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Flag(true) => write!(f, "enabled"),
            ConfigValue::Flag(false) => write!(f, "disabled"),
            ConfigValue::Direction(d) => write!(f, "{}", d),
            ConfigValue::Checks(c) => write!(f, "{}", c),
            ConfigValue::Pressure(p) => write!(f, "{} kPa", p),
            ConfigValue::Scalar(v) => write!(f, "{}", v),
        }
    }
}

/// One audited field change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub field: ConfigField,
    pub old: ConfigValue,
    pub new: ConfigValue,
    pub impact: LogImpact,
}

impl ConfigChange {
    fn new(field: ConfigField, old: ConfigValue, new: ConfigValue) -> Self {
        Self {
            field,
            old,
            new,
            impact: field.impact(),
        }
    }
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.new {
            ConfigValue::Flag(_) if self.field == ConfigField::Enabled => write!(f, "{}", self.new),
            ConfigValue::Flag(_) => write!(f, "{} {}", self.field.label(), self.new),
            ConfigValue::Direction(_) | ConfigValue::Checks(_) => {
                write!(f, "{} changed to {}", self.field.label(), self.new)
            }
            _ => write!(
                f,
                "{} changed from {} to {}",
                self.field.label(),
                self.old,
                self.new
            ),
        }
    }
}

/// Diff every field of `old` against `new`.
pub fn diff_configs(old: &VentPumpConfig, new: &VentPumpConfig) -> Vec<ConfigChange> {
    let mut changes = Vec::new();

    if old.enabled != new.enabled {
        changes.push(ConfigChange::new(
            ConfigField::Enabled,
            ConfigValue::Flag(old.enabled),
            ConfigValue::Flag(new.enabled),
        ));
    }
    if old.direction != new.direction {
        changes.push(ConfigChange::new(
            ConfigField::Direction,
            ConfigValue::Direction(old.direction),
            ConfigValue::Direction(new.direction),
        ));
    }
    if old.pressure_checks != new.pressure_checks {
        changes.push(ConfigChange::new(
            ConfigField::PressureChecks,
            ConfigValue::Checks(old.pressure_checks),
            ConfigValue::Checks(new.pressure_checks),
        ));
    }

    let pressures = [
        (
            ConfigField::ExternalPressureBound,
            old.external_pressure_bound,
            new.external_pressure_bound,
        ),
        (
            ConfigField::InternalPressureBound,
            old.internal_pressure_bound,
            new.internal_pressure_bound,
        ),
        (ConfigField::MaxPressure, old.max_pressure, new.max_pressure),
        (
            ConfigField::TargetPressureChange,
            old.target_pressure_change,
            new.target_pressure_change,
        ),
        (
            ConfigField::LockoutThreshold,
            old.under_pressure_lockout_threshold,
            new.under_pressure_lockout_threshold,
        ),
    ];
    for (field, before, after) in pressures {
        if before != after {
            changes.push(ConfigChange::new(
                field,
                ConfigValue::Pressure(before),
                ConfigValue::Pressure(after),
            ));
        }
    }

    let scalars = [
        (ConfigField::PumpPower, old.pump_power, new.pump_power),
        (
            ConfigField::LockoutLeakRate,
            old.under_pressure_lockout_leak_rate,
            new.under_pressure_lockout_leak_rate,
        ),
    ];
    for (field, before, after) in scalars {
        if before != after {
            changes.push(ConfigChange::new(
                field,
                ConfigValue::Scalar(before),
                ConfigValue::Scalar(after),
            ));
        }
    }

    if old.pressure_lockout_override != new.pressure_lockout_override {
        changes.push(ConfigChange::new(
            ConfigField::PressureLockoutOverride,
            ConfigValue::Flag(old.pressure_lockout_override),
            ConfigValue::Flag(new.pressure_lockout_override),
        ));
    }

    changes
}

/// Audit sink failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditError(pub String);

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audit sink failed: {}", self.0)
    }
}

impl std::error::Error for AuditError {}

/// Receives audit records for a device.
pub trait AuditSink {
    fn record(&mut self, device: &str, change: &ConfigChange) -> Result<(), AuditError>;
}

/// One stored audit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub device: String,
    pub impact: LogImpact,
    pub message: String,
}

/// In-memory audit trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    pub entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, device: &str, change: &ConfigChange) -> Result<(), AuditError> {
        self.entries.push(AuditEntry {
            device: device.to_string(),
            impact: change.impact,
            message: format!("{} {}", device, change),
        });
        Ok(())
    }
}
