//! Bidirectional vent pump regulation.
//!
//! Once per device update the host calls [`VentPumpRegulator::tick`] with the
//! active pipe node mixture and the ambient mixture. The regulator decides
//! whether to move gas, how much and which way, and returns a
//! [`TransferOutcome`]. It never touches the mixtures itself; the host applies
//! a [`TransferInstruction`] with [`TransferInstruction::apply`].
//!
//! # Safety bounds
//!
//! | Bound | Releasing | Siphoning |
//! |-------|-----------|-----------|
//! | External | caps supply pressure | floor under the environment |
//! | Internal | floor under the pipe | caps pipe pressure |
//! | Max pressure | environment ceiling | pipe ceiling |
//! | Lockout | leak only while the room is near vacuum | not applied |
//!
//! Mole counts use the pipe temperature when releasing and the environment
//! temperature when siphoning; the other side's temperature is ignored.
//!
//! ```
//! use ventpump_logic::config::{PressureChecks, VentPumpConfig};
//! use ventpump_logic::gas::{GasMixture, IdealGasMixture};
//! use ventpump_logic::regulator::{TickContext, TransferOutcome, VentPumpRegulator};
//!
//! let mut vent = VentPumpRegulator::new(VentPumpConfig {
//!     pressure_checks: PressureChecks::NONE,
//!     ..Default::default()
//! });
//! let mut pipe = IdealGasMixture::at_pressure(200.0, 10.0, 300.0);
//! let mut room = IdealGasMixture::at_pressure(90.0, 50.0, 293.15);
//!
//! let report = vent.tick(0.0, &TickContext::powered(1.0), Some(&pipe), Some(&room));
//! if let TransferOutcome::Transfer(transfer) = report.outcome {
//!     transfer.apply(&mut pipe, &mut room);
//! }
//! assert!(room.pressure() > 90.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::audit::{diff_configs, ConfigChange};
use crate::config::{DeviceSettings, ModeSignal, PumpDirection, VentPumpConfig};
use crate::gas::{moles_for_pressure, GasMixture};
use crate::lockout::{LockoutTimer, UnlockError, UnlockOutcome};
use crate::visuals::{visual_state, VisualUpdate};

/// Per-tick device conditions supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Elapsed seconds since the previous update.
    pub dt: f32,
    /// Mechanically sealed shut.
    pub welded: bool,
    pub powered: bool,
}

impl TickContext {
    /// Unwelded and powered.
    pub fn powered(dt: f32) -> Self {
        Self {
            dt,
            welded: false,
            powered: true,
        }
    }
}

/// Why a tick moved no gas. None of these are faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleReason {
    Welded,
    Unpowered,
    Disabled,
    /// The node for the current direction is not connected.
    NoPipeNode,
    /// The vent sits on an air-blocked tile.
    AirBlocked,
    /// The side gas would be taken from holds no pressure.
    EmptySource,
    /// The receiving side is above `max_pressure`.
    OverPressure,
    /// Target pressure already met.
    NoPressureDelta,
    /// The source side is at or below its bound.
    BoundReached,
    /// Locked out and the room is above pipe pressure.
    LockoutBackflow,
}

/// Gas to move this tick. `moles` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub direction: PumpDirection,
    pub moles: f32,
    /// Whether the lockout leak replaced nominal flow.
    pub leak: bool,
}

impl TransferInstruction {
    /// Remove from the source side and merge into the other.
    pub fn apply<G: GasMixture>(&self, pipe: &mut G, environment: &mut G) {
        match self.direction {
            PumpDirection::Releasing => {
                let removed = pipe.remove(self.moles);
                environment.merge(removed);
            }
            PumpDirection::Siphoning => {
                let removed = environment.remove(self.moles);
                pipe.merge(removed);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransferOutcome {
    Idle(IdleReason),
    Transfer(TransferInstruction),
}

impl TransferOutcome {
    pub fn moles(&self) -> f32 {
        match self {
            TransferOutcome::Idle(_) => 0.0,
            TransferOutcome::Transfer(t) => t.moles,
        }
    }

    pub fn instruction(&self) -> Option<&TransferInstruction> {
        match self {
            TransferOutcome::Idle(_) => None,
            TransferOutcome::Transfer(t) => Some(t),
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub outcome: TransferOutcome,
    /// The lockout flag flipped; the presentation layer should refresh.
    pub lockout_changed: bool,
    /// The manual override ran out at the start of this tick.
    pub override_expired: bool,
}

impl TickReport {
    fn idle(reason: IdleReason) -> Self {
        Self {
            outcome: TransferOutcome::Idle(reason),
            lockout_changed: false,
            override_expired: false,
        }
    }
}

/// Atmosphere alarm level broadcast by the area's air alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmType {
    Normal,
    Warning,
    Danger,
}

/// One vent pump: configuration plus derived lockout state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentPumpRegulator {
    pub config: VentPumpConfig,
    pub settings: DeviceSettings,
    under_pressure_lockout: bool,
    timer: LockoutTimer,
}

impl VentPumpRegulator {
    pub fn new(config: VentPumpConfig) -> Self {
        Self::with_settings(config, DeviceSettings::default())
    }

    pub fn with_settings(config: VentPumpConfig, settings: DeviceSettings) -> Self {
        Self {
            config,
            settings,
            under_pressure_lockout: false,
            timer: LockoutTimer::default(),
        }
    }

    /// Environment was below the lockout threshold at the last tick, with no
    /// manual override running.
    pub fn under_pressure_lockout(&self) -> bool {
        self.under_pressure_lockout
    }

    pub fn manual_override_active(&self) -> bool {
        self.timer.is_overridden()
    }

    pub fn timer(&self) -> &LockoutTimer {
        &self.timer
    }

    /// Lockout is set and neither override applies, so releasing flow leaks.
    pub fn suppressing(&self) -> bool {
        self.under_pressure_lockout
            && !self.config.pressure_lockout_override
            && !self.timer.is_overridden()
    }

    /// Name of the pipe node the current direction draws on.
    pub fn active_node(&self) -> &str {
        self.settings.node_for(self.config.direction)
    }

    /// Run one regulation step.
    ///
    /// `pipe` is `None` when the active node is missing; `environment` is
    /// `None` when the tile is sealed. Either makes the tick a no-op.
    pub fn tick<G: GasMixture>(
        &mut self,
        now: f64,
        ctx: &TickContext,
        pipe: Option<&G>,
        environment: Option<&G>,
    ) -> TickReport {
        if ctx.welded {
            return TickReport::idle(IdleReason::Welded);
        }
        if !ctx.powered {
            return TickReport::idle(IdleReason::Unpowered);
        }
        if !self.config.enabled {
            return TickReport::idle(IdleReason::Disabled);
        }
        let Some(pipe) = pipe else {
            return TickReport::idle(IdleReason::NoPipeNode);
        };
        let Some(environment) = environment else {
            return TickReport::idle(IdleReason::AirBlocked);
        };

        let override_expired = self.timer.expire(now);

        let lockout = environment.pressure() < self.config.under_pressure_lockout_threshold
            && !self.timer.is_overridden();
        let lockout_changed = lockout != self.under_pressure_lockout;
        self.under_pressure_lockout = lockout;

        let outcome = match self.config.direction {
            PumpDirection::Releasing => self.release(ctx.dt, pipe, environment),
            PumpDirection::Siphoning => self.siphon(ctx.dt, pipe, environment),
        };

        TickReport {
            outcome,
            lockout_changed,
            override_expired,
        }
    }

    fn release<G: GasMixture>(&self, dt: f32, pipe: &G, environment: &G) -> TransferOutcome {
        let config = &self.config;
        if pipe.pressure() <= 0.0 {
            return TransferOutcome::Idle(IdleReason::EmptySource);
        }
        if environment.pressure() > config.max_pressure {
            return TransferOutcome::Idle(IdleReason::OverPressure);
        }

        let mut pressure_delta = dt * config.target_pressure_change;
        if config.pressure_checks.external() {
            // Supply pressure scales with the pipe, so a starved pipe cannot
            // push a room up to the full bound.
            let supply = (pipe.pressure() * config.pump_power).min(config.external_pressure_bound);
            pressure_delta = pressure_delta.min(supply - environment.pressure());
        }
        if pressure_delta <= 0.0 {
            return TransferOutcome::Idle(IdleReason::NoPressureDelta);
        }

        let mut moles =
            moles_for_pressure(pressure_delta, environment.volume(), pipe.temperature());

        let leak = self.suppressing();
        if leak {
            let pipe_delta = pipe.pressure() - environment.pressure();
            moles = dt * pipe_delta * config.under_pressure_lockout_leak_rate;
            if moles < 0.0 {
                return TransferOutcome::Idle(IdleReason::LockoutBackflow);
            }
        }

        if config.pressure_checks.internal() {
            let internal_delta = pipe.pressure() - config.internal_pressure_bound;
            if internal_delta <= 0.0 {
                return TransferOutcome::Idle(IdleReason::BoundReached);
            }
            let max_transfer =
                moles_for_pressure(internal_delta, pipe.volume(), pipe.temperature());
            moles = moles.min(max_transfer);
        }

        TransferOutcome::Transfer(TransferInstruction {
            direction: PumpDirection::Releasing,
            moles,
            leak,
        })
    }

    fn siphon<G: GasMixture>(&self, dt: f32, pipe: &G, environment: &G) -> TransferOutcome {
        let config = &self.config;
        if environment.pressure() <= 0.0 {
            return TransferOutcome::Idle(IdleReason::EmptySource);
        }
        if pipe.pressure() > config.max_pressure {
            return TransferOutcome::Idle(IdleReason::OverPressure);
        }

        let mut pressure_delta = dt * config.target_pressure_change;
        if config.pressure_checks.internal() {
            pressure_delta = pressure_delta.min(config.internal_pressure_bound - pipe.pressure());
        }
        if pressure_delta <= 0.0 {
            return TransferOutcome::Idle(IdleReason::NoPressureDelta);
        }

        let mut moles =
            moles_for_pressure(pressure_delta, pipe.volume(), environment.temperature());

        if config.pressure_checks.external() {
            let external_delta = environment.pressure() - config.external_pressure_bound;
            if external_delta <= 0.0 {
                return TransferOutcome::Idle(IdleReason::BoundReached);
            }
            let max_transfer = moles_for_pressure(
                external_delta,
                environment.volume(),
                environment.temperature(),
            );
            moles = moles.min(max_transfer);
        }

        TransferOutcome::Transfer(TransferInstruction {
            direction: PumpDirection::Siphoning,
            moles,
            leak: false,
        })
    }

    /// Diff against the current config, then replace it. The caller refreshes
    /// presentation and forwards the changes to its audit sink.
    pub fn apply_remote_config(&mut self, new_config: VentPumpConfig) -> Vec<ConfigChange> {
        let changes = diff_configs(&self.config, &new_config);
        self.config = new_config;
        changes
    }

    /// Switch to a canned mode. Returns false when the ports are not linked.
    pub fn apply_mode_signal(&mut self, signal: ModeSignal) -> bool {
        if !self.settings.can_link {
            return false;
        }
        self.config = self.settings.mode_config(&self.config, signal);
        true
    }

    /// Danger alarms shut the vent off, a return to normal turns it back on.
    pub fn on_alarm(&mut self, alarm: AlarmType) {
        match alarm {
            AlarmType::Danger => self.config.enabled = false,
            AlarmType::Normal => self.config.enabled = true,
            AlarmType::Warning => {}
        }
    }

    /// Start the manual unlock. Returns when the interaction will finish.
    pub fn begin_unlock(&mut self, now: f64, anchored: bool) -> Result<f64, UnlockError> {
        self.timer.begin_unlock(
            now,
            self.settings.unlock_do_after,
            self.under_pressure_lockout,
            anchored,
        )
    }

    /// Finish the manual unlock and start the override window.
    pub fn complete_unlock(&mut self, now: f64) -> UnlockOutcome {
        self.timer
            .complete_unlock(now, self.settings.manual_override_duration)
    }

    pub fn interrupt_unlock(&mut self) -> bool {
        self.timer.interrupt()
    }

    pub fn visual(&self, welded: bool, powered: bool) -> VisualUpdate {
        visual_state(welded, powered, &self.config, self.suppressing())
    }

    /// Close-range inspection text.
    pub fn examine_text(&self) -> Option<&'static str> {
        if self.config.direction == PumpDirection::Releasing && self.suppressing() {
            Some("The vent's under-pressure lockout is engaged.")
        } else {
            None
        }
    }
}
