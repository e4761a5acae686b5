//! Presentation state handed to the sprite/ambience layer.

use serde::{Deserialize, Serialize};

use crate::config::{PumpDirection, VentPumpConfig};

/// What the vent should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VentPumpVisual {
    Welded,
    Off,
    Lockout,
    /// Releasing.
    Out,
    /// Siphoning.
    In,
}

/// Sprite state plus whether the ambient hum plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualUpdate {
    pub state: VentPumpVisual,
    pub ambience: bool,
}

/// Derive the presentation state.
///
/// `suppressing` is true when the lockout flag is set and neither override
/// is active, i.e. when releasing flow is being throttled to a leak.
pub fn visual_state(
    welded: bool,
    powered: bool,
    config: &VentPumpConfig,
    suppressing: bool,
) -> VisualUpdate {
    if welded {
        return VisualUpdate {
            state: VentPumpVisual::Welded,
            ambience: false,
        };
    }
    if !powered || !config.enabled {
        return VisualUpdate {
            state: VentPumpVisual::Off,
            ambience: false,
        };
    }
    let state = match config.direction {
        PumpDirection::Releasing if suppressing => VentPumpVisual::Lockout,
        PumpDirection::Releasing => VentPumpVisual::Out,
        PumpDirection::Siphoning => VentPumpVisual::In,
    };
    VisualUpdate {
        state,
        ambience: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welded_wins() {
        let v = visual_state(true, false, &VentPumpConfig::default(), true);
        assert_eq!(v.state, VentPumpVisual::Welded);
        assert!(!v.ambience);
    }

    #[test]
    fn test_unpowered_or_disabled_is_off() {
        let config = VentPumpConfig::default();
        assert_eq!(
            visual_state(false, false, &config, false).state,
            VentPumpVisual::Off
        );
        let disabled = VentPumpConfig {
            enabled: false,
            ..config
        };
        let v = visual_state(false, true, &disabled, false);
        assert_eq!(v.state, VentPumpVisual::Off);
        assert!(!v.ambience);
    }

    #[test]
    fn test_releasing_lockout_vs_out() {
        let config = VentPumpConfig::default();
        assert_eq!(
            visual_state(false, true, &config, true).state,
            VentPumpVisual::Lockout
        );
        assert_eq!(
            visual_state(false, true, &config, false).state,
            VentPumpVisual::Out
        );
    }

    #[test]
    fn test_siphoning_ignores_lockout() {
        let config = VentPumpConfig {
            direction: PumpDirection::Siphoning,
            ..Default::default()
        };
        let v = visual_state(false, true, &config, true);
        assert_eq!(v.state, VentPumpVisual::In);
        assert!(v.ambience);
    }
}
