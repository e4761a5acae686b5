//! Integration tests for the regulation loop.
//!
//! Exercises: config → tick → transfer apply → lockout / override → remote diff
//!
//! All tests are pure logic - no engine, no world.

use ventpump_logic::config::{PressureChecks, PumpDirection, VentPumpConfig};
use ventpump_logic::constants::GAS_CONSTANT;
use ventpump_logic::gas::{GasMixture, IdealGasMixture};
use ventpump_logic::network::set_state_payload;
use ventpump_logic::regulator::{
    IdleReason, TickContext, TransferOutcome, VentPumpRegulator,
};

// ── Helpers ────────────────────────────────────────────────────────────

fn scenario_config() -> VentPumpConfig {
    VentPumpConfig {
        direction: PumpDirection::Releasing,
        pressure_checks: PressureChecks::NONE,
        max_pressure: 100.0,
        target_pressure_change: 10.0,
        under_pressure_lockout_threshold: 25.0,
        ..Default::default()
    }
}

fn scenario_pipe() -> IdealGasMixture {
    IdealGasMixture::at_pressure(200.0, 10.0, 300.0)
}

fn scenario_room(pressure: f32) -> IdealGasMixture {
    IdealGasMixture::at_pressure(pressure, 50.0, 293.15)
}

/// Tick once and apply whatever transfer comes back.
fn step(
    vent: &mut VentPumpRegulator,
    now: f64,
    pipe: &mut IdealGasMixture,
    room: &mut IdealGasMixture,
) -> TransferOutcome {
    let report = vent.tick(now, &TickContext::powered(1.0), Some(&*pipe), Some(&*room));
    if let Some(transfer) = report.outcome.instruction() {
        assert!(transfer.moles >= 0.0, "transfer must never be negative");
        transfer.apply(pipe, room);
    }
    report.outcome
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn nominal_release_moves_gas_into_room() {
    let mut vent = VentPumpRegulator::new(scenario_config());
    let mut pipe = scenario_pipe();
    let mut room = scenario_room(90.0);
    let pipe_before = pipe.pressure();
    let room_moles_before = room.total_moles();

    let outcome = step(&mut vent, 0.0, &mut pipe, &mut room);

    let expected = 10.0 * 50.0 / (300.0 * GAS_CONSTANT);
    assert!((outcome.moles() - expected).abs() < 1e-5);
    assert!(pipe.pressure() < pipe_before);
    assert!((room.total_moles() - room_moles_before - expected).abs() < 1e-4);
    // Mole-weighted mixing makes the room rise by exactly the pressure delta.
    assert!((room.pressure() - 100.0).abs() < 0.01);
}

#[test]
fn overpressure_room_gets_nothing() {
    let mut vent = VentPumpRegulator::new(scenario_config());
    let mut pipe = scenario_pipe();
    let mut room = scenario_room(101.0);
    let before = (pipe, room);

    let outcome = step(&mut vent, 0.0, &mut pipe, &mut room);

    assert_eq!(outcome, TransferOutcome::Idle(IdleReason::OverPressure));
    assert_eq!((pipe, room), before);
}

#[test]
fn near_vacuum_room_only_gets_a_leak() {
    let mut vent = VentPumpRegulator::new(scenario_config());
    let mut pipe = scenario_pipe();
    let mut room = scenario_room(5.0);

    let outcome = step(&mut vent, 0.0, &mut pipe, &mut room);

    let nominal = 10.0 * 50.0 / (300.0 * GAS_CONSTANT);
    let transfer = outcome.instruction().expect("leak still transfers");
    assert!(transfer.leak);
    assert!(transfer.moles > 0.0);
    assert!(transfer.moles < nominal);
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn release_never_overshoots_external_bound() {
    let mut vent = VentPumpRegulator::new(VentPumpConfig {
        pressure_checks: PressureChecks::EXTERNAL,
        external_pressure_bound: 95.0,
        target_pressure_change: 3.0,
        max_pressure: 4500.0,
        ..scenario_config()
    });
    let mut pipe = IdealGasMixture::at_pressure(4000.0, 200.0, 300.0);
    let mut room = scenario_room(80.0);

    for tick in 0..20 {
        step(&mut vent, tick as f64, &mut pipe, &mut room);
        assert!(room.pressure() <= 95.0 + 1e-2, "tick {tick}: {}", room.pressure());
    }
    assert!((room.pressure() - 95.0).abs() < 0.05, "room should settle at the bound");
}

#[test]
fn siphon_never_overshoots_internal_bound() {
    let mut vent = VentPumpRegulator::new(VentPumpConfig {
        direction: PumpDirection::Siphoning,
        pressure_checks: PressureChecks::INTERNAL,
        internal_pressure_bound: 120.0,
        max_pressure: 4500.0,
        ..scenario_config()
    });
    let mut pipe = IdealGasMixture::at_pressure(50.0, 10.0, 300.0);
    let mut room = IdealGasMixture::at_pressure(101.0, 2500.0, 293.15);

    for tick in 0..20 {
        step(&mut vent, tick as f64, &mut pipe, &mut room);
        assert!(pipe.pressure() <= 120.0 + 1e-2, "tick {tick}: {}", pipe.pressure());
    }
}

#[test]
fn siphon_stops_at_pipe_max_pressure() {
    let mut vent = VentPumpRegulator::new(VentPumpConfig {
        direction: PumpDirection::Siphoning,
        ..scenario_config()
    });
    let mut pipe = IdealGasMixture::at_pressure(100.5, 10.0, 300.0);
    let mut room = scenario_room(90.0);
    let outcome = step(&mut vent, 0.0, &mut pipe, &mut room);
    assert_eq!(outcome, TransferOutcome::Idle(IdleReason::OverPressure));
}

#[test]
fn manual_override_runs_its_course() {
    let mut vent = VentPumpRegulator::new(VentPumpConfig {
        target_pressure_change: 0.1,
        ..scenario_config()
    });
    let mut pipe = IdealGasMixture::at_pressure(4000.0, 2000.0, 300.0);
    let mut room = IdealGasMixture::at_pressure(5.0, 50_000.0, 293.15);

    step(&mut vent, 0.0, &mut pipe, &mut room);
    assert!(vent.under_pressure_lockout());

    let ready = vent.begin_unlock(0.0, true).expect("locked out and anchored");
    vent.complete_unlock(ready);
    let expires = vent.timer().expires_at().expect("override running");

    let mut now = ready;
    while now < expires {
        let outcome = step(&mut vent, now, &mut pipe, &mut room);
        assert!(!vent.under_pressure_lockout(), "suppressed at t={now}");
        if let Some(t) = outcome.instruction() {
            assert!(!t.leak);
        }
        now += 1.0;
    }

    step(&mut vent, expires, &mut pipe, &mut room);
    assert!(!vent.manual_override_active());
    assert!(room.pressure() < 25.0);
    assert!(vent.under_pressure_lockout(), "lockout re-arms without outside input");
}

#[test]
fn repeated_set_state_audits_once() {
    let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
    let target = VentPumpConfig {
        enabled: false,
        pressure_checks: PressureChecks::BOTH,
        internal_pressure_bound: 12.5,
        ..Default::default()
    };
    let packet = set_state_payload(&target);

    let first = vent.handle_packet(&packet).unwrap();
    let second = vent.handle_packet(&packet).unwrap();

    use ventpump_logic::network::PacketResponse;
    assert!(matches!(first, PacketResponse::Applied(ref c) if c.len() == 3));
    assert_eq!(second, PacketResponse::Applied(Vec::new()));
}
