//! Manual lockout override timer.
//!
//! A vent that is under-pressure locked out can be unlocked by hand. The
//! unlock is a timed interaction owned by the host; this module only tracks
//! its three phases:
//!
//! | Phase | Left by |
//! |-------|---------|
//! | `Idle` | [`LockoutTimer::begin_unlock`] when locked out and anchored |
//! | `Unlocking` | [`LockoutTimer::complete_unlock`] or [`LockoutTimer::interrupt`] |
//! | `Overridden` | [`LockoutTimer::expire`] once the clock reaches the deadline |
//!
//! ```
//! use ventpump_logic::lockout::{LockoutTimer, UnlockOutcome};
//!
//! let mut timer = LockoutTimer::default();
//! timer.begin_unlock(10.0, 2.0, true, true).unwrap();
//! assert_eq!(timer.complete_unlock(12.0, 30.0), UnlockOutcome::Completed);
//! assert!(timer.is_overridden());
//! assert!(!timer.expire(41.9));
//! assert!(timer.expire(42.0));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the manual override currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum OverridePhase {
    #[default]
    Idle,
    /// Unlock interaction in progress; the host reports completion once `ready_at` passes.
    Unlocking { started_at: f64, ready_at: f64 },
    /// Lockout suppressed until `expires_at`.
    Overridden { expires_at: f64 },
}

/// Response to an unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockOutcome {
    Completed,
    Cancelled,
}

/// Why an unlock could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockError {
    /// The vent is not locked out; nothing to unlock.
    NotLockedOut,
    /// The vent is not anchored in place.
    NotAnchored,
    /// An unlock is already running.
    AlreadyUnlocking,
    /// A completed unlock is still suppressing the lockout.
    AlreadyOverridden,
}

impl fmt::Display for UnlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockError::NotLockedOut => write!(f, "vent is not under pressure lockout"),
            UnlockError::NotAnchored => write!(f, "vent is not anchored"),
            UnlockError::AlreadyUnlocking => write!(f, "unlock already in progress"),
            UnlockError::AlreadyOverridden => write!(f, "lockout already manually disabled"),
        }
    }
}

impl std::error::Error for UnlockError {}

/// Tracks a single pending re-arm deadline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LockoutTimer {
    phase: OverridePhase,
}

impl LockoutTimer {
    pub fn phase(&self) -> OverridePhase {
        self.phase
    }

    /// Whether the manual override is currently suppressing the lockout.
    pub fn is_overridden(&self) -> bool {
        matches!(self.phase, OverridePhase::Overridden { .. })
    }

    pub fn is_unlocking(&self) -> bool {
        matches!(self.phase, OverridePhase::Unlocking { .. })
    }

    pub fn expires_at(&self) -> Option<f64> {
        match self.phase {
            OverridePhase::Overridden { expires_at } => Some(expires_at),
            _ => None,
        }
    }

    /// `Idle → Unlocking`. Returns the time at which the interaction finishes.
    pub fn begin_unlock(
        &mut self,
        now: f64,
        do_after: f64,
        locked_out: bool,
        anchored: bool,
    ) -> Result<f64, UnlockError> {
        if self.is_unlocking() {
            return Err(UnlockError::AlreadyUnlocking);
        }
        if self.is_overridden() {
            return Err(UnlockError::AlreadyOverridden);
        }
        if !locked_out {
            return Err(UnlockError::NotLockedOut);
        }
        if !anchored {
            return Err(UnlockError::NotAnchored);
        }
        let ready_at = now + do_after;
        self.phase = OverridePhase::Unlocking {
            started_at: now,
            ready_at,
        };
        Ok(ready_at)
    }

    /// `Unlocking → Overridden`. A completion that arrives when no unlock is
    /// pending has already been handled and reports `Cancelled`.
    pub fn complete_unlock(&mut self, now: f64, override_duration: f64) -> UnlockOutcome {
        match self.phase {
            OverridePhase::Unlocking { .. } => {
                self.phase = OverridePhase::Overridden {
                    expires_at: now + override_duration,
                };
                UnlockOutcome::Completed
            }
            _ => UnlockOutcome::Cancelled,
        }
    }

    /// `Unlocking → Idle` on interruption. Returns whether an unlock was pending.
    pub fn interrupt(&mut self) -> bool {
        if self.is_unlocking() {
            self.phase = OverridePhase::Idle;
            true
        } else {
            false
        }
    }

    /// `Overridden → Idle` once `now` reaches the deadline. Returns whether it expired.
    pub fn expire(&mut self, now: f64) -> bool {
        match self.phase {
            OverridePhase::Overridden { expires_at } if now >= expires_at => {
                self.phase = OverridePhase::Idle;
                true
            }
            _ => false,
        }
    }
}
