//! VentPump Headless Simulation Harness
//!
//! Validates the regulation logic, the packet surface and the shipped presets.
//! Runs entirely in-process - no host game, no networking, no rendering.
//!
//! Usage:
//!   cargo run -p ventpump-simtest
//!   cargo run -p ventpump-simtest -- --verbose

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use ventpump_core::prelude::*;
use ventpump_logic::config::{presets_from_json, validate_config, VentPreset};
use ventpump_logic::constants::GAS_CONSTANT;
use ventpump_logic::lockout::UnlockOutcome;
use ventpump_logic::network::{set_state_payload, PacketError, PacketResponse};
use ventpump_logic::regulator::{IdleReason, TickContext, TransferOutcome};

// ── Device presets (same JSON a host would ship) ────────────────────────
const PRESETS_JSON: &str = include_str!("../../../data/vent_presets.json");

const SWEEP_SEED: u64 = 0x5EED_7E47;
const SWEEP_CASES: usize = 5_000;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== VentPump Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Preset data validation
    results.extend(validate_presets(verbose));

    // 2. Fixed regulation scenarios
    results.extend(validate_scenarios(verbose));

    // 3. Randomized property sweep
    results.extend(validate_random_sweep(verbose));

    // 4. Device-network packets
    results.extend(validate_packets(verbose));

    // 5. Full engine run
    results.extend(validate_engine_run(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_presets() -> Result<std::collections::BTreeMap<String, VentPreset>, String> {
    presets_from_json(PRESETS_JSON).map_err(|e| format!("JSON parse error: {}", e))
}

fn tick_and_apply(
    vent: &mut VentPumpRegulator,
    now: f64,
    dt: f32,
    pipe: &mut IdealGasMixture,
    room: &mut IdealGasMixture,
) -> TransferOutcome {
    let report = vent.tick(now, &TickContext::powered(dt), Some(&*pipe), Some(&*room));
    if let Some(transfer) = report.outcome.instruction() {
        transfer.apply(pipe, room);
    }
    report.outcome
}

// ── 1. Presets ──────────────────────────────────────────────────────────

fn validate_presets(verbose: bool) -> Vec<TestResult> {
    println!("--- Presets ---");
    let mut results = Vec::new();

    let presets = match load_presets() {
        Ok(p) => p,
        Err(e) => {
            results.push(TestResult {
                name: "presets_parse".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "presets_not_empty".into(),
        passed: presets.len() >= 3,
        detail: format!("{} presets loaded", presets.len()),
    });

    let invalid: Vec<_> = presets
        .iter()
        .filter(|(_, p)| !validate_config(&p.config).is_empty())
        .map(|(name, _)| name.clone())
        .collect();
    results.push(TestResult {
        name: "presets_valid".into(),
        passed: invalid.is_empty(),
        detail: if invalid.is_empty() {
            "all presets pass validation".into()
        } else {
            format!("invalid presets: {}", invalid.join(", "))
        },
    });

    let standard_is_default = presets
        .get("station_standard")
        .map(|p| p.config == VentPumpConfig::default() && p.settings == DeviceSettings::default())
        .unwrap_or(false);
    results.push(TestResult {
        name: "presets_standard_matches_defaults".into(),
        passed: standard_is_default,
        detail: "station_standard equals the stock vent".into(),
    });

    if verbose {
        for (name, preset) in &presets {
            println!(
                "  {}: {} checks={} ext={} int={} can_link={}",
                name,
                preset.config.direction,
                preset.config.pressure_checks,
                preset.config.external_pressure_bound,
                preset.config.internal_pressure_bound,
                preset.settings.can_link
            );
        }
    }

    results
}

// ── 2. Scenarios ────────────────────────────────────────────────────────

fn scenario_config() -> VentPumpConfig {
    VentPumpConfig {
        pressure_checks: PressureChecks::NONE,
        max_pressure: 100.0,
        target_pressure_change: 10.0,
        under_pressure_lockout_threshold: 25.0,
        ..Default::default()
    }
}

fn validate_scenarios(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();

    // Nominal release
    let mut vent = VentPumpRegulator::new(scenario_config());
    let mut pipe = IdealGasMixture::at_pressure(200.0, 10.0, 300.0);
    let mut room = IdealGasMixture::at_pressure(90.0, 50.0, 293.15);
    let expected = 10.0 * 50.0 / (300.0 * GAS_CONSTANT);
    let outcome = tick_and_apply(&mut vent, 0.0, 1.0, &mut pipe, &mut room);
    results.push(TestResult {
        name: "scenario_nominal_release".into(),
        passed: (outcome.moles() - expected).abs() < 1e-4
            && (room.pressure() - 100.0).abs() < 0.01,
        detail: format!(
            "moved {:.4} mol (expected {:.4}), room now {:.3} kPa",
            outcome.moles(),
            expected,
            room.pressure()
        ),
    });

    // Overpressure
    let mut vent = VentPumpRegulator::new(scenario_config());
    let mut pipe = IdealGasMixture::at_pressure(200.0, 10.0, 300.0);
    let mut room = IdealGasMixture::at_pressure(101.0, 50.0, 293.15);
    let outcome = tick_and_apply(&mut vent, 0.0, 1.0, &mut pipe, &mut room);
    results.push(TestResult {
        name: "scenario_overpressure".into(),
        passed: outcome == TransferOutcome::Idle(IdleReason::OverPressure),
        detail: format!("{:?}", outcome),
    });

    // Lockout leak
    let mut vent = VentPumpRegulator::new(scenario_config());
    let mut pipe = IdealGasMixture::at_pressure(200.0, 10.0, 300.0);
    let mut room = IdealGasMixture::at_pressure(5.0, 50.0, 293.15);
    let outcome = tick_and_apply(&mut vent, 0.0, 1.0, &mut pipe, &mut room);
    let leaked = outcome.instruction().map(|t| t.leak).unwrap_or(false);
    results.push(TestResult {
        name: "scenario_lockout_leak".into(),
        passed: vent.under_pressure_lockout() && leaked && outcome.moles() < expected,
        detail: format!("lockout engaged, leaked {:.6} mol", outcome.moles()),
    });

    // Manual override: unlock, run out the timer, re-arm
    let unlocked = vent.begin_unlock(0.0, true);
    let ready_at = unlocked.as_ref().copied().unwrap_or(0.0);
    let completed = vent.complete_unlock(ready_at) == UnlockOutcome::Completed;
    let expires = vent.timer().expires_at().unwrap_or(0.0);
    let suppressed = {
        let outcome = tick_and_apply(&mut vent, ready_at + 1.0, 0.01, &mut pipe, &mut room);
        !vent.under_pressure_lockout() && outcome.instruction().map(|t| !t.leak).unwrap_or(true)
    };
    tick_and_apply(&mut vent, expires, 0.01, &mut pipe, &mut room);
    let rearmed = vent.under_pressure_lockout() && !vent.manual_override_active();
    results.push(TestResult {
        name: "scenario_manual_override".into(),
        passed: unlocked.is_ok() && completed && suppressed && rearmed,
        detail: format!(
            "override {:.1}s..{:.1}s, suppressed={} rearmed={}",
            ready_at, expires, suppressed, rearmed
        ),
    });

    results
}

// ── 3. Random sweep ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SweepCase {
    config: VentPumpConfig,
    pipe: IdealGasMixture,
    room: IdealGasMixture,
    dt: f32,
}

fn random_case(rng: &mut StdRng) -> SweepCase {
    let direction = if rng.gen_bool(0.5) {
        PumpDirection::Releasing
    } else {
        PumpDirection::Siphoning
    };
    let checks = match rng.gen_range(0..4u8) {
        0 => PressureChecks::NONE,
        1 => PressureChecks::INTERNAL,
        2 => PressureChecks::EXTERNAL,
        _ => PressureChecks::BOTH,
    };
    let config = VentPumpConfig {
        enabled: true,
        direction,
        pressure_checks: checks,
        internal_pressure_bound: rng.gen_range(0.0..3000.0),
        external_pressure_bound: rng.gen_range(0.0..200.0),
        max_pressure: rng.gen_range(50.0..5000.0),
        target_pressure_change: rng.gen_range(1.0..300.0),
        pump_power: rng.gen_range(0.1..=1.0),
        under_pressure_lockout_threshold: rng.gen_range(0.0..100.0),
        under_pressure_lockout_leak_rate: rng.gen_range(0.0..0.01),
        pressure_lockout_override: rng.gen_bool(0.2),
    };
    SweepCase {
        config,
        pipe: IdealGasMixture::at_pressure(
            rng.gen_range(1.0..5000.0),
            rng.gen_range(10.0..2000.0),
            rng.gen_range(150.0..500.0),
        ),
        room: IdealGasMixture::at_pressure(
            rng.gen_range(1.0..300.0),
            rng.gen_range(50.0..5000.0),
            rng.gen_range(150.0..500.0),
        ),
        dt: rng.gen_range(0.1..2.0),
    }
}

fn within(value: f32, bound: f32) -> bool {
    value <= bound + 1e-3 * bound.max(1.0)
}

fn validate_random_sweep(verbose: bool) -> Vec<TestResult> {
    println!("--- Random Sweep ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(SWEEP_SEED);

    let mut negative = 0;
    let mut overshoot = 0;
    let mut overpressure_moved = 0;
    let mut transfers = 0;
    let mut first_failure: Option<SweepCase> = None;

    for _ in 0..SWEEP_CASES {
        let case = random_case(&mut rng);
        let mut vent = VentPumpRegulator::new(case.config);
        let mut pipe = case.pipe;
        let mut room = case.room;
        let outcome = tick_and_apply(&mut vent, 0.0, case.dt, &mut pipe, &mut room);
        let config = &case.config;

        let mut failed = false;
        if outcome.moles() < 0.0 {
            negative += 1;
            failed = true;
        }

        let receiver_before = match config.direction {
            PumpDirection::Releasing => case.room.pressure(),
            PumpDirection::Siphoning => case.pipe.pressure(),
        };
        if receiver_before > config.max_pressure && outcome.moles() > 0.0 {
            overpressure_moved += 1;
            failed = true;
        }

        if let Some(transfer) = outcome.instruction() {
            transfers += 1;
            let checks = config.pressure_checks;
            let respected = match config.direction {
                PumpDirection::Releasing => {
                    let external_ok = transfer.leak
                        || !checks.external()
                        || within(room.pressure(), config.external_pressure_bound);
                    let internal_ok = !checks.internal()
                        || within(config.internal_pressure_bound, pipe.pressure());
                    external_ok && internal_ok
                }
                PumpDirection::Siphoning => {
                    let internal_ok = !checks.internal()
                        || within(pipe.pressure(), config.internal_pressure_bound);
                    let external_ok = !checks.external()
                        || within(config.external_pressure_bound, room.pressure());
                    internal_ok && external_ok
                }
            };
            if !respected {
                overshoot += 1;
                failed = true;
            }
        }

        if failed && first_failure.is_none() {
            first_failure = Some(case);
        }
    }

    results.push(TestResult {
        name: "sweep_no_negative_transfer".into(),
        passed: negative == 0,
        detail: format!("{} negative transfers in {} cases", negative, SWEEP_CASES),
    });
    results.push(TestResult {
        name: "sweep_bounds_respected".into(),
        passed: overshoot == 0,
        detail: format!("{} overshoots in {} transfers", overshoot, transfers),
    });
    results.push(TestResult {
        name: "sweep_overpressure_guard".into(),
        passed: overpressure_moved == 0,
        detail: format!("{} transfers into an over-max receiver", overpressure_moved),
    });

    if let Some(case) = first_failure {
        if verbose {
            println!(
                "  first failing case: {}",
                serde_json::to_string(&case).unwrap_or_default()
            );
        }
    }

    results
}

// ── 4. Packets ──────────────────────────────────────────────────────────

fn validate_packets(_verbose: bool) -> Vec<TestResult> {
    println!("--- Packets ---");
    let mut results = Vec::new();

    let mut vent = VentPumpRegulator::new(VentPumpConfig::default());
    let reply = vent.handle_packet(&json!({ "command": "sync_data" }));
    let echoes_config = match &reply {
        Ok(PacketResponse::Reply(payload)) => {
            payload["sync_data"] == serde_json::to_value(vent.config).unwrap_or_default()
        }
        _ => false,
    };
    results.push(TestResult {
        name: "packets_sync_reply".into(),
        passed: echoes_config,
        detail: "sync_data echoes the live config".into(),
    });

    let target = VentPumpConfig {
        direction: PumpDirection::Siphoning,
        pressure_checks: PressureChecks::INTERNAL,
        internal_pressure_bound: 2000.0,
        ..Default::default()
    };
    let first = vent.handle_packet(&set_state_payload(&target));
    let second = vent.handle_packet(&set_state_payload(&target));
    let first_count = match &first {
        Ok(PacketResponse::Applied(changes)) => changes.len(),
        _ => 0,
    };
    let second_empty = matches!(&second, Ok(PacketResponse::Applied(c)) if c.is_empty());
    results.push(TestResult {
        name: "packets_set_state_idempotent".into(),
        passed: first_count == 3 && second_empty && vent.config == target,
        detail: format!("first apply {} changes, second apply empty={}", first_count, second_empty),
    });

    let unknown = vent.handle_packet(&json!({ "command": "purge" }));
    results.push(TestResult {
        name: "packets_unknown_ignored".into(),
        passed: matches!(unknown, Err(PacketError::UnknownCommand(_))),
        detail: "unknown command rejected".into(),
    });

    let mut bad = serde_json::to_value(VentPumpConfig::default()).unwrap_or_default();
    bad["direction"] = json!("Sideways");
    let before = vent.config;
    let rejected = vent.handle_packet(&json!({ "command": "set_state", "set_state": bad }));
    results.push(TestResult {
        name: "packets_bad_direction_rejected".into(),
        passed: matches!(rejected, Err(PacketError::Malformed(_))) && vent.config == before,
        detail: "unknown direction fails decoding, config untouched".into(),
    });

    results
}

// ── 5. Engine run ───────────────────────────────────────────────────────

fn validate_engine_run(verbose: bool) -> Vec<TestResult> {
    println!("--- Engine Run ---");
    let mut results = Vec::new();

    let presets = match load_presets() {
        Ok(p) => p,
        Err(e) => {
            results.push(TestResult {
                name: "engine_presets".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };
    let preset = |name: &str| presets.get(name).cloned().unwrap_or_else(|| VentPreset {
        config: VentPumpConfig::default(),
        settings: DeviceSettings::default(),
    });

    let mut sim = VentSimulation::new();

    // Room 1: ordinary pressurization
    let room_tile = TilePosition::new(0, 0);
    sim.atmosphere
        .set_air(room_tile, IdealGasMixture::at_pressure(90.0, 2500.0, 293.15));
    let supply = sim.add_pipe_network(IdealGasMixture::at_pressure(3000.0, 2000.0, 293.15));
    let standard = preset("station_standard");
    sim.spawn_vent(
        VentSpawn::new("vent-room", room_tile, supply)
            .with_regulator(VentPumpRegulator::with_settings(standard.config, standard.settings)),
    );

    // Room 2: near vacuum, will lock out
    let breach_tile = TilePosition::new(5, 0);
    sim.atmosphere
        .set_air(breach_tile, IdealGasMixture::at_pressure(10.0, 2500.0, 293.15));
    let breach_vent = sim.spawn_vent(VentSpawn::new("vent-breach", breach_tile, supply));

    // Room 3: airlock, linked to mode signals
    let airlock_tile = TilePosition::new(10, 0);
    sim.atmosphere
        .set_air(airlock_tile, IdealGasMixture::at_pressure(101.0, 1000.0, 293.15));
    let airlock = preset("airlock_linked");
    let airlock_vent = sim.spawn_vent(
        VentSpawn::new("vent-airlock", airlock_tile, supply)
            .with_regulator(VentPumpRegulator::with_settings(airlock.config, airlock.settings)),
    );

    for _ in 0..120 {
        sim.update(0.5);
    }

    let room_pressure = sim.atmosphere.air(room_tile).map(|a| a.pressure()).unwrap_or(0.0);
    results.push(TestResult {
        name: "engine_room_pressurized".into(),
        passed: (room_pressure - 101.325).abs() < 0.5 && room_pressure <= 101.325 + 0.05,
        detail: format!("room at {:.3} kPa after 60s", room_pressure),
    });

    let locked = sim
        .regulator(breach_vent)
        .map(|r| r.under_pressure_lockout())
        .unwrap_or(false);
    results.push(TestResult {
        name: "engine_breach_locked_out".into(),
        passed: locked,
        detail: format!(
            "breach room at {:.3} kPa, examine: {:?}",
            sim.atmosphere.air(breach_tile).map(|a| a.pressure()).unwrap_or(0.0),
            sim.examine(breach_vent).ok().flatten()
        ),
    });

    // Unlock the breach vent by hand
    sim.take_unlock_results();
    sim.submit(breach_vent, DeviceCommand::StartUnlock);
    for _ in 0..6 {
        sim.update(0.5);
    }
    let unlocks = sim.take_unlock_results();
    let completed = unlocks
        .iter()
        .any(|r| r.entity == breach_vent && r.outcome == UnlockOutcome::Completed);
    let suppressed = sim
        .regulator(breach_vent)
        .map(|r| r.manual_override_active() && !r.under_pressure_lockout())
        .unwrap_or(false);
    results.push(TestResult {
        name: "engine_manual_unlock".into(),
        passed: completed && suppressed,
        detail: format!("{} unlock results, override active={}", unlocks.len(), suppressed),
    });

    // Depressurize the airlock over its signal port
    sim.submit(airlock_vent, DeviceCommand::Signal("depressurize".into()));
    for _ in 0..240 {
        sim.update(0.5);
    }
    let airlock_direction = sim.regulator(airlock_vent).map(|r| r.config.direction).ok();
    let airlock_pressure = sim
        .atmosphere
        .air(airlock_tile)
        .map(|a| a.pressure())
        .unwrap_or(f32::MAX);
    results.push(TestResult {
        name: "engine_airlock_depressurize".into(),
        passed: airlock_direction == Some(PumpDirection::Siphoning) && airlock_pressure < 101.0,
        detail: format!("airlock at {:.3} kPa", airlock_pressure),
    });

    let audited = sim.audit().entries.len();
    results.push(TestResult {
        name: "engine_signal_not_audited".into(),
        passed: audited == 0,
        detail: format!("{} audit entries", audited),
    });

    if verbose {
        let sweep = sim.last_sweep();
        println!(
            "  t={:.1}s vents={} transfers={} released={:.3} siphoned={:.3}",
            sim.sim_time(),
            sweep.vents,
            sweep.transfers,
            sweep.moles_released,
            sweep.moles_siphoned
        );
    }

    results
}
