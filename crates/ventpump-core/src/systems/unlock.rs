//! Unlock do-after tracking - the timed, interruptible manual lockout release.

use hecs::{Entity, World};
use ventpump_logic::lockout::UnlockOutcome;
use ventpump_logic::regulator::VentPumpRegulator;

use super::{device_name, HostOutputs, UnlockResult};

/// An unlock interaction in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingUnlock {
    pub entity: Entity,
    /// Sim time at which the interaction completes.
    pub ready_at: f64,
}

/// Unlock interactions waiting on their timers (singleton-like, stored in engine)
#[derive(Debug, Clone, Default)]
pub struct UnlockQueue {
    pub pending: Vec<PendingUnlock>,
}

impl UnlockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, entity: Entity, ready_at: f64) {
        self.pending.retain(|p| p.entity != entity);
        self.pending.push(PendingUnlock { entity, ready_at });
    }

    /// Forget a device's pending unlock. Returns whether one existed.
    pub fn cancel(&mut self, entity: Entity) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.entity != entity);
        self.pending.len() != before
    }

    pub fn is_pending(&self, entity: Entity) -> bool {
        self.pending.iter().any(|p| p.entity == entity)
    }
}

/// Interrupt a device's unlock (moved, welded, damaged) and report `Cancelled`.
pub fn interrupt_unlock(
    world: &World,
    queue: &mut UnlockQueue,
    entity: Entity,
    outputs: &mut HostOutputs,
) {
    let was_unlocking = match world.get::<&mut VentPumpRegulator>(entity) {
        Ok(mut regulator) => regulator.interrupt_unlock(),
        Err(_) => false,
    };
    if queue.cancel(entity) || was_unlocking {
        log::info!("{} unlock interrupted", device_name(world, entity));
        outputs.unlock_results.push(UnlockResult {
            entity,
            outcome: UnlockOutcome::Cancelled,
        });
    }
}

/// Complete every unlock whose timer has run out.
pub fn resolve_unlocks(
    world: &World,
    queue: &mut UnlockQueue,
    now: f64,
    outputs: &mut HostOutputs,
) {
    let (ready, waiting): (Vec<PendingUnlock>, Vec<PendingUnlock>) =
        std::mem::take(&mut queue.pending)
            .into_iter()
            .partition(|p| p.ready_at <= now);
    queue.pending = waiting;

    for pending in ready {
        let outcome = match world.get::<&mut VentPumpRegulator>(pending.entity) {
            Ok(mut regulator) => regulator.complete_unlock(now),
            Err(_) => UnlockOutcome::Cancelled,
        };
        if outcome == UnlockOutcome::Completed {
            log::info!(
                "{} pressure lockout manually disabled",
                device_name(world, pending.entity)
            );
        }
        outputs.unlock_results.push(UnlockResult {
            entity: pending.entity,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_replaces_existing() {
        let mut world = World::new();
        let e = world.spawn(());
        let mut queue = UnlockQueue::new();
        queue.start(e, 2.0);
        queue.start(e, 5.0);
        assert_eq!(queue.pending.len(), 1);
        assert_eq!(queue.pending[0].ready_at, 5.0);
    }

    #[test]
    fn test_resolve_only_ready() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut queue = UnlockQueue::new();
        queue.start(a, 1.0);
        queue.start(b, 3.0);

        let mut outputs = HostOutputs::default();
        resolve_unlocks(&world, &mut queue, 2.0, &mut outputs);

        assert!(!queue.is_pending(a));
        assert!(queue.is_pending(b));
        // `a` has no regulator, so the completion has nothing to act on.
        assert_eq!(
            outputs.unlock_results,
            vec![UnlockResult {
                entity: a,
                outcome: UnlockOutcome::Cancelled
            }]
        );
    }
}
