//! Single-threaded timer queue for delayed and repeating combat tasks
//!
//! Tasks are plain data, dispatched by the world when due. Guarded tasks
//! belong to an owner's lane and die silently when that lane is cancelled.
//! Unguarded tasks (damage, block feedback, despawn) always fire and
//! re-validate what they touch.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::combat::body_zone::HitLocation;
use crate::core::types::{CombatantId, FormationId, Seconds, Vec2};

/// Cancellation group for an owner's guarded tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Attack cadence loop
    Offense,
    /// Flee timers and other behaviour coroutines
    Behaviour,
}

/// Work the world performs when a timer fires
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// One iteration of an attack loop
    AttackCycle { attacker: CombatantId },
    /// Committed damage landing after the weapon's damage delay
    ApplyDamage {
        attacker: CombatantId,
        defender: CombatantId,
        amount: f32,
        location: HitLocation,
    },
    BlockFeedback { defender: CombatantId, attacker: CombatantId },
    BlockRecovered { defender: CombatantId },
    FleeMove { combatant: CombatantId, destination: Vec2 },
    FleeEnd { combatant: CombatantId, return_to: Option<Vec2> },
    Despawn { combatant: CombatantId },
    FormationAdvance { formation: FormationId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Guard {
    owner: CombatantId,
    lane: Lane,
    generation: u64,
}

#[derive(Debug, Clone)]
struct Scheduled {
    at: OrderedFloat<Seconds>,
    seq: u64,
    guard: Option<Guard>,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; earlier seq first on ties
        other.at.cmp(&self.at).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Seconds,
    seq: u64,
    heap: BinaryHeap<Scheduled>,
    generations: AHashMap<(CombatantId, Lane), u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Seconds {
        self.now
    }

    pub fn advance(&mut self, dt: f32) {
        self.now += dt.max(0.0) as Seconds;
    }

    /// Queue a task that always fires
    pub fn schedule(&mut self, delay: f32, task: Task) {
        self.push(delay, None, task);
    }

    /// Queue a task that dies if `owner`'s `lane` is cancelled first
    pub fn schedule_guarded(&mut self, owner: CombatantId, lane: Lane, delay: f32, task: Task) {
        let generation = self.generation(owner, lane);
        self.push(delay, Some(Guard { owner, lane, generation }), task);
    }

    /// Invalidate every pending guarded task on this lane
    pub fn cancel(&mut self, owner: CombatantId, lane: Lane) {
        *self.generations.entry((owner, lane)).or_insert(0) += 1;
    }

    pub fn cancel_all(&mut self, owner: CombatantId) {
        self.cancel(owner, Lane::Offense);
        self.cancel(owner, Lane::Behaviour);
    }

    /// Pop the next due task, skipping cancelled ones
    pub fn pop_due(&mut self) -> Option<Task> {
        loop {
            let next = self.heap.peek()?;
            if next.at.0 > self.now {
                return None;
            }
            let scheduled = self.heap.pop()?;
            if let Some(guard) = scheduled.guard {
                if guard.generation != self.generation(guard.owner, guard.lane) {
                    continue;
                }
            }
            return Some(scheduled.task);
        }
    }

    /// Drop a despawned owner's guarded tasks and generation counters
    pub fn forget(&mut self, owner: CombatantId) {
        let heap = std::mem::take(&mut self.heap);
        self.heap = heap
            .into_iter()
            .filter(|s| s.guard.map_or(true, |g| g.owner != owner))
            .collect();
        self.generations.retain(|(id, _), _| *id != owner);
    }

    fn generation(&self, owner: CombatantId, lane: Lane) -> u64 {
        self.generations.get(&(owner, lane)).copied().unwrap_or(0)
    }

    fn push(&mut self, delay: f32, guard: Option<Guard>, task: Task) {
        let at = self.now + delay.max(0.0) as Seconds;
        self.seq += 1;
        self.heap.push(Scheduled {
            at: OrderedFloat(at),
            seq: self.seq,
            guard,
            task,
        });
    }
}
