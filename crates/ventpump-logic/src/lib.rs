//! Pure regulation logic for VentPump.
//!
//! This crate holds the vent pump's decision making with no engine, world or
//! transport attached. Functions take plain data and return results, so the
//! same code runs under the `ventpump-core` engine, the headless harness, and
//! any host that can hand over two gas mixtures once per tick.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`audit`] | Field-by-field config diff and audit sinks |
//! | [`config`] | Remote config, fixed device settings, validation, presets |
//! | [`constants`] | Gas constant, stock device values, port and packet names |
//! | [`diagnostics`] | Volume-normalized analyzer scan of the active node |
//! | [`gas`] | `GasMixture` abstraction and an ideal-gas reference mixture |
//! | [`lockout`] | Manual override timer (Idle / Unlocking / Overridden) |
//! | [`network`] | `sync_data` / `set_state` packet handling |
//! | [`regulator`] | Per-tick transfer decision and lockout recompute |
//! | [`visuals`] | Sprite/ambience state |

pub mod audit;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod gas;
pub mod lockout;
pub mod network;
pub mod regulator;
pub mod visuals;
