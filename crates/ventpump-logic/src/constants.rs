//! Physical constants and stock device values.
//!
//! Pressures are in kPa, temperatures in Kelvin, volumes in litres and
//! times in seconds of simulation clock.

/// Ideal gas constant used by the mole/pressure conversions.
pub const GAS_CONSTANT: f32 = 8.314_462_6;

/// One standard atmosphere in kPa.
pub const ONE_ATMOSPHERE: f32 = 101.325;

/// Room temperature (20 °C).
pub const T20C: f32 = 293.15;

/// Stock values for a freshly built vent pump.
pub mod vent_defaults {
    use super::ONE_ATMOSPHERE;

    /// Environment-side target while releasing.
    pub const EXTERNAL_PRESSURE_BOUND: f32 = ONE_ATMOSPHERE;
    /// Pipe-side floor while releasing.
    pub const INTERNAL_PRESSURE_BOUND: f32 = 0.0;
    /// Hard ceiling above which the vent refuses to move gas.
    pub const MAX_PRESSURE: f32 = 4500.0;
    /// Nominal pressure change per second.
    pub const TARGET_PRESSURE_CHANGE: f32 = ONE_ATMOSPHERE;
    /// Fraction of pipe pressure deliverable as supply pressure.
    pub const PUMP_POWER: f32 = 1.0;
    /// Environment pressure below which the vent locks out.
    pub const UNDER_PRESSURE_LOCKOUT_THRESHOLD: f32 = 80.0;
    /// Leak coefficient while locked out.
    pub const UNDER_PRESSURE_LOCKOUT_LEAK_RATE: f32 = 0.0001;

    /// Preset external bound selected by the "pressurize" port.
    pub const PRESSURIZE_PRESSURE: f32 = ONE_ATMOSPHERE;
    /// Preset external bound selected by the "depressurize" port.
    pub const DEPRESSURIZE_PRESSURE: f32 = 0.0;

    /// How long the unlock interaction takes, seconds.
    pub const UNLOCK_DO_AFTER: f64 = 2.0;
    /// How long a completed unlock suppresses the lockout, seconds.
    pub const MANUAL_OVERRIDE_DURATION: f64 = 30.0;
}

/// Named pipe node and signal port identifiers.
pub mod ports {
    /// Default node name for both inlet and outlet.
    pub const PIPE: &str = "pipe";
    /// Mode signal selecting the pressurize preset.
    pub const PRESSURIZE: &str = "pressurize";
    /// Mode signal selecting the depressurize preset.
    pub const DEPRESSURIZE: &str = "depressurize";
}

/// Device-network packet keys.
pub mod packet_keys {
    pub const COMMAND: &str = "command";
    pub const SYNC_DATA: &str = "sync_data";
    pub const SET_STATE: &str = "set_state";
}
