//! The combat world: registry, tick loop and external triggers
//!
//! Tick order:
//! 1. host environment and scheduler clocks advance
//! 2. due timer tasks fire (attack cycles, delayed damage, block, flee, despawn)
//! 3. offense flags are refreshed and broken attack loops stopped
//! 4. AI directors decide and their directives are applied
//! 5. formations run morale checks and advance triggers
//! 6. stamina recovers
//!
//! Cross-combatant references are ids. A despawn broadcasts the id to every
//! offense controller and director so nothing keeps pointing at it.

use ahash::AHashMap;
use rand::Rng;

use crate::abilities::{battle_roar_chance, AbilityKind, AbilityOutcome};
use crate::ai::director::{DirectorContext, Directive, FormationLink, Sighting};
use crate::ai::fear::FearDestinations;
use crate::ai::state::DirectorState;
use crate::combat::armory::Armory;
use crate::combat::constants::MIN_ATTACK_CYCLE_SECONDS;
use crate::combat::defense::{DefenseContext, DefenseOutcome};
use crate::combat::event::AttackAdjustments;
use crate::combat::health::HealthChange;
use crate::combat::math;
use crate::combat::offense::{CycleStart, OffenseFlags};
use crate::core::config::CombatConfig;
use crate::core::error::{Result, SkirmishError};
use crate::core::rng::CombatRng;
use crate::core::types::{CombatantId, FormationId, Seconds, Vec2, WeaponId};
use crate::formation::{FormationBlueprint, FormationCoordinator, FormationOrder, FormationTick};
use crate::simulation::combatant::{Combatant, CombatantBlueprint};
use crate::simulation::environment::{Environment, Feedback};
use crate::simulation::events::CombatEvent;
use crate::simulation::scheduler::{Lane, Scheduler, Task};

pub struct World<E: Environment> {
    env: E,
    config: CombatConfig,
    armory: Armory,
    rng: CombatRng,
    scheduler: Scheduler,
    combatants: AHashMap<CombatantId, Combatant>,
    /// Spawn order; every per-tick pass walks this for determinism
    roster: Vec<CombatantId>,
    formations: AHashMap<FormationId, FormationCoordinator>,
    formation_order: Vec<FormationId>,
    fear: Option<FearDestinations>,
    player: Option<CombatantId>,
    next_combatant: u32,
    next_formation: u32,
    events: Vec<CombatEvent>,
}

impl<E: Environment> World<E> {
    pub fn new(env: E, config: CombatConfig, armory: Armory, seed: u64) -> Self {
        Self {
            env,
            config,
            armory,
            rng: CombatRng::new(seed),
            scheduler: Scheduler::new(),
            combatants: AHashMap::new(),
            roster: Vec::new(),
            formations: AHashMap::new(),
            formation_order: Vec::new(),
            fear: None,
            player: None,
            next_combatant: 1,
            next_formation: 1,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn armory(&self) -> &Armory {
        &self.armory
    }

    /// Seconds of simulated time since the world was created
    pub fn now(&self) -> Seconds {
        self.scheduler.now()
    }

    pub fn set_fear_destinations(&mut self, fear: FearDestinations) {
        self.fear = Some(fear);
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Registered combatants in spawn order
    pub fn combatant_ids(&self) -> &[CombatantId] {
        &self.roster
    }

    pub fn player(&self) -> Option<CombatantId> {
        self.player
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.combatants.get(&id).map_or(false, |c| c.is_alive())
    }

    pub fn state(&self, id: CombatantId) -> Option<DirectorState> {
        self.combatants.get(&id)?.director.as_ref().map(|d| d.state())
    }

    /// Current offense target
    pub fn target(&self, id: CombatantId) -> Option<CombatantId> {
        self.combatants.get(&id)?.offense.target()
    }

    pub fn is_attacking(&self, id: CombatantId) -> bool {
        self.combatants.get(&id).map_or(false, |c| c.offense.is_attacking())
    }

    pub fn health_percent(&self, id: CombatantId) -> Option<f32> {
        self.combatants.get(&id).map(|c| c.health.percent())
    }

    pub fn stamina_percent(&self, id: CombatantId) -> Option<f32> {
        self.combatants.get(&id)?.abilities.as_ref().map(|a| a.stamina.percent())
    }

    /// Remaining uses of a limited ability, `None` if unlimited
    pub fn ability_uses(&self, id: CombatantId, slot: usize) -> Result<Option<u32>> {
        let combatant = self.get(id)?;
        let abilities = combatant.abilities.as_ref().ok_or(SkirmishError::NoAbilities(id))?;
        Ok(abilities.slot(id, slot)?.uses_remaining())
    }

    pub fn formation(&self, id: FormationId) -> Option<&FormationCoordinator> {
        self.formations.get(&id)
    }

    pub fn formation_of(&self, id: CombatantId) -> Option<FormationId> {
        self.combatants.get(&id)?.formation
    }

    pub fn formation_count(&self) -> usize {
        self.formations.len()
    }

    /// Events raised by external triggers since the last tick
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Validate a blueprint and add the combatant to the registry and scene
    pub fn spawn(&mut self, blueprint: CombatantBlueprint) -> Result<CombatantId> {
        let id = CombatantId(self.next_combatant);
        let combatant = Combatant::from_blueprint(id, &blueprint, &self.armory)?;
        self.next_combatant += 1;

        if combatant.is_player() {
            if let Some(previous) = self.player {
                tracing::warn!(%previous, replacement = %id, "replacing registered player");
            }
            self.player = Some(id);
        }

        self.env.place(id, blueprint.position, blueprint.facing);
        tracing::debug!(
            %id,
            name = %combatant.name,
            is_enemy = combatant.is_enemy,
            weapon = %combatant.offense.weapon(),
            "spawned combatant"
        );
        self.combatants.insert(id, combatant);
        self.roster.push(id);
        Ok(id)
    }

    /// Group existing AI combatants into a formation; the first member leads
    pub fn create_formation(
        &mut self,
        blueprint: FormationBlueprint,
        members: Vec<CombatantId>,
    ) -> Result<FormationId> {
        for &member in &members {
            let combatant = self.get(member)?;
            if !combatant.is_ai() {
                return Err(SkirmishError::InvalidConfig(format!(
                    "{} is player-controlled and cannot join formation {}",
                    member, blueprint.name
                )));
            }
            if let Some(existing) = combatant.formation {
                return Err(SkirmishError::InvalidConfig(format!(
                    "{} already belongs to {}",
                    member, existing
                )));
            }
        }
        let is_enemy = match members.first() {
            Some(&leader) => self.get(leader)?.is_enemy,
            None => false,
        };

        let id = FormationId(self.next_formation);
        let formation = FormationCoordinator::new(id, blueprint, members, is_enemy)?;
        self.next_formation += 1;

        let facing = formation.facing();
        for &member in formation.members() {
            if let Some(slot) = formation.slot_of(member) {
                self.env.place(member, slot, facing);
            }
            if let Some(combatant) = self.combatants.get_mut(&member) {
                combatant.formation = Some(id);
            }
        }
        tracing::info!(
            formation = %id,
            name = %formation.name,
            members = formation.members().len(),
            "formation created"
        );
        self.formations.insert(id, formation);
        self.formation_order.push(id);
        Ok(id)
    }

    /// Add one AI combatant to the next free slot of a formation
    pub fn assign_to_formation(&mut self, id: CombatantId, formation: FormationId) -> Result<()> {
        let combatant = self.get(id)?;
        if !combatant.is_ai() {
            return Err(SkirmishError::InvalidConfig(format!(
                "{} is player-controlled and cannot join {}",
                id, formation
            )));
        }
        if let Some(existing) = combatant.formation {
            return Err(SkirmishError::InvalidConfig(format!("{} already belongs to {}", id, existing)));
        }
        let coordinator = self
            .formations
            .get_mut(&formation)
            .ok_or(SkirmishError::FormationNotFound(formation))?;
        coordinator.add_member(id)?;
        let slot = coordinator.slot_of(id);

        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.formation = Some(formation);
        }
        if let Some(slot) = slot {
            self.env.move_towards(id, slot);
        }
        tracing::debug!(%id, %formation, "joined formation");
        Ok(())
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the world by `dt` seconds and return everything that happened
    pub fn tick(&mut self, dt: f32) -> Vec<CombatEvent> {
        let dt = dt.max(0.0);
        self.env.advance(dt);
        self.scheduler.advance(dt);

        while let Some(task) = self.scheduler.pop_due() {
            self.dispatch(task);
        }
        self.refresh_offense();
        self.run_directors(dt);
        self.run_formations(dt);
        self.recover_stamina(dt);

        std::mem::take(&mut self.events)
    }

    fn dispatch(&mut self, task: Task) {
        match task {
            Task::AttackCycle { attacker } => self.run_attack_cycle(attacker),
            Task::ApplyDamage { attacker, defender, amount, location } => {
                if !self.is_alive(attacker) || !self.is_alive(defender) {
                    tracing::debug!(%attacker, %defender, "discarding damage, a side is gone");
                    self.events.push(CombatEvent::DamageDiscarded { attacker, defender });
                    return;
                }
                self.env.play_feedback(defender, Feedback::Hit(location));
                self.apply_health_delta(defender, amount);
            }
            Task::BlockFeedback { defender, attacker } => {
                if !self.combatants.contains_key(&defender) {
                    return;
                }
                if self.is_alive(attacker) {
                    self.env.play_feedback(defender, Feedback::Block);
                }
                let recovery = self.config.defense.block_recovery_seconds;
                self.scheduler.schedule(recovery, Task::BlockRecovered { defender });
            }
            Task::BlockRecovered { defender } => {
                if let Some(combatant) = self.combatants.get_mut(&defender) {
                    combatant.defense.release_block();
                }
            }
            Task::FleeMove { combatant, destination } => {
                if self.is_alive(combatant) {
                    self.env.move_towards(combatant, destination);
                }
            }
            Task::FleeEnd { combatant, return_to } => self.end_flee(combatant, return_to),
            Task::Despawn { combatant } => self.despawn(combatant),
            Task::FormationAdvance { formation } => self.complete_advance(formation),
        }
    }

    /// Liveness and reach of `id` against its current target
    fn offense_flags(&self, id: CombatantId) -> Option<OffenseFlags> {
        let combatant = self.combatants.get(&id)?;
        let mut flags = OffenseFlags {
            attacker_alive: combatant.is_alive(),
            ..Default::default()
        };
        let Some(target) = combatant.offense.target() else {
            return Some(flags);
        };
        flags.target_alive = self.is_alive(target);
        if let (Ok(weapon), Some(distance)) = (
            self.armory.weapon(combatant.offense.weapon()),
            self.env.distance(id, target),
        ) {
            flags.target_in_range =
                distance <= weapon.attack_range + self.config.offense.attack_range_tolerance;
        }
        Some(flags)
    }

    fn refresh_offense(&mut self) {
        for id in self.roster.clone() {
            let Some(flags) = self.offense_flags(id) else {
                continue;
            };
            let Some(combatant) = self.combatants.get_mut(&id) else {
                continue;
            };
            let must_stop = combatant.offense.update_flags(flags);
            let facing_target = combatant
                .offense
                .target()
                .filter(|_| combatant.offense.is_attacking() && flags.can_attack());
            if must_stop {
                tracing::debug!(%id, ?flags, "attack loop broken");
                self.scheduler.cancel(id, Lane::Offense);
                if let Some(combatant) = self.combatants.get_mut(&id) {
                    combatant.offense.stop();
                }
            } else if let Some(target) = facing_target {
                if let Some(point) = self.env.position(target) {
                    self.env.face_towards(id, point);
                }
            }
        }
    }

    fn run_directors(&mut self, dt: f32) {
        for id in self.roster.clone() {
            let Some(combatant) = self.combatants.get(&id) else {
                continue;
            };
            if !combatant.is_alive() {
                continue;
            }
            let Some(director) = combatant.director.as_ref() else {
                continue;
            };
            let Some(position) = self.env.position(id) else {
                continue;
            };
            let weapon_range = match self.armory.weapon(combatant.offense.weapon()) {
                Ok(weapon) => weapon.attack_range,
                Err(err) => {
                    tracing::warn!(%id, %err, "skipping decision, weapon unresolved");
                    continue;
                }
            };
            let formation = self.formation_link(id);
            let radius = director.scan_radius(weapon_range, formation.as_ref());
            let opponents = self.sightings(id, position, radius);

            let ctx = DirectorContext {
                position,
                weapon_range,
                formation,
                opponents: &opponents,
                dt,
            };
            let Some(director) = self.combatants.get_mut(&id).and_then(|c| c.director.as_mut()) else {
                continue;
            };
            let from = director.state();
            let directives = director.decide(&ctx);
            let to = director.state();

            if from != to {
                tracing::debug!(%id, %from, %to, "director state change");
                self.events.push(CombatEvent::StateChanged { combatant: id, from, to });
            }
            for directive in directives {
                self.apply_directive(id, directive);
            }
        }
    }

    fn formation_link(&self, id: CombatantId) -> Option<FormationLink> {
        let formation = self.combatants.get(&id)?.formation?;
        self.formations.get(&formation)?.link_for(id)
    }

    /// Living valid opponents of `observer` within `radius`
    fn sightings(&self, observer: CombatantId, center: Vec2, radius: f32) -> Vec<Sighting> {
        let Some(me) = self.combatants.get(&observer) else {
            return Vec::new();
        };
        self.env
            .combatants_in_radius(center, radius)
            .into_iter()
            .filter_map(|other| {
                let them = self.combatants.get(&other)?;
                if !them.is_alive() || !me.is_valid_opponent(them) {
                    return None;
                }
                let position = self.env.position(other)?;
                Some(Sighting {
                    id: other,
                    position,
                    distance: center.distance(&position),
                })
            })
            .collect()
    }

    fn apply_directive(&mut self, id: CombatantId, directive: Directive) {
        let result = match directive {
            Directive::CancelActivity => {
                self.scheduler.cancel(id, Lane::Behaviour);
                Ok(())
            }
            Directive::StopAttacking => self.stop_attacking(id),
            Directive::MoveTo(point) => {
                self.env.move_towards(id, point);
                Ok(())
            }
            Directive::HoldPosition => {
                self.env.stop(id);
                Ok(())
            }
            Directive::StartAttacking(target) => self.start_attacking(id, target),
            Directive::ChangeTarget(target) => self.change_target(id, target),
        };
        if let Err(err) = result {
            tracing::debug!(%id, ?directive, %err, "directive dropped");
        }
    }

    fn run_formations(&mut self, dt: f32) {
        for formation in self.formation_order.clone() {
            let Some(coordinator) = self.formations.get(&formation) else {
                continue;
            };
            let leader_valid = coordinator.leader().map_or(false, |l| self.is_alive(l));
            let alive: Vec<CombatantId> = coordinator
                .members()
                .iter()
                .copied()
                .filter(|&m| self.is_alive(m))
                .collect();
            let player_position = self
                .player
                .filter(|&p| self.is_alive(p))
                .and_then(|p| self.env.position(p));
            let tick = FormationTick {
                leader_valid,
                alive: &alive,
                player_position,
                dt,
            };
            let Some(coordinator) = self.formations.get_mut(&formation) else {
                continue;
            };
            let orders = coordinator.tick(&tick, &mut self.rng);
            for order in orders {
                self.apply_formation_order(formation, order);
            }
        }
    }

    fn apply_formation_order(&mut self, formation: FormationId, order: FormationOrder) {
        match order {
            FormationOrder::Dissolve => self.dissolve_formation(formation),
            FormationOrder::Flee(members) => {
                let duration = self.config.ai.formation_flee_seconds;
                for member in members {
                    if self.state(member) == Some(DirectorState::Fleeing) {
                        continue;
                    }
                    if let Err(err) = self.start_fleeing(member, duration, false, None) {
                        tracing::debug!(%member, %err, "formation flee order dropped");
                    }
                }
            }
            FormationOrder::ScheduleAdvance { delay } => {
                tracing::info!(%formation, delay, "formation advance triggered");
                self.scheduler.schedule(delay, Task::FormationAdvance { formation });
            }
        }
    }

    fn dissolve_formation(&mut self, formation: FormationId) {
        let Some(coordinator) = self.formations.remove(&formation) else {
            return;
        };
        self.formation_order.retain(|&f| f != formation);
        for member in coordinator.members() {
            if let Some(combatant) = self.combatants.get_mut(member) {
                if combatant.formation == Some(formation) {
                    combatant.formation = None;
                }
            }
        }
        tracing::info!(%formation, name = %coordinator.name, "formation dissolved, leader lost");
        self.events.push(CombatEvent::FormationDissolved { formation });
    }

    fn complete_advance(&mut self, formation: FormationId) {
        let Some(coordinator) = self.formations.get_mut(&formation) else {
            return;
        };
        let Some(anchor) = coordinator.complete_advance() else {
            return;
        };
        let slots: Vec<(CombatantId, Vec2)> = coordinator
            .members()
            .iter()
            .filter_map(|&m| coordinator.slot_of(m).map(|slot| (m, slot)))
            .collect();
        for (member, slot) in slots {
            let idle = self.is_alive(member)
                && !matches!(
                    self.state(member),
                    Some(DirectorState::Fleeing | DirectorState::Attacking | DirectorState::Chasing)
                );
            if idle {
                self.env.move_towards(member, slot);
            }
        }
        tracing::info!(%formation, x = anchor.x, y = anchor.y, "formation advanced");
        self.events.push(CombatEvent::FormationAdvanced { formation, anchor });
    }

    fn recover_stamina(&mut self, dt: f32) {
        for combatant in self.combatants.values_mut() {
            if !combatant.is_alive() {
                continue;
            }
            if let Some(abilities) = combatant.abilities.as_mut() {
                abilities.stamina.recover(dt);
            }
        }
    }

    // ========================================================================
    // Offense
    // ========================================================================

    /// Set or clear a combatant's target; clearing stops its attack loop
    pub fn set_target(&mut self, id: CombatantId, target: Option<CombatantId>) -> Result<()> {
        if let Some(target) = target {
            self.get(target)?;
        }
        let combatant = self.get_mut(id)?;
        if combatant.offense.set_target(target) {
            self.scheduler.cancel(id, Lane::Offense);
        }
        Ok(())
    }

    /// Begin the attack loop against `target`; no-op if already attacking
    pub fn start_attacking(&mut self, id: CombatantId, target: CombatantId) -> Result<()> {
        self.get(target)?;
        let combatant = self.combatants.get_mut(&id).ok_or(SkirmishError::CombatantNotFound(id))?;
        let weapon = self.armory.weapon(combatant.offense.weapon())?;
        let is_ai = combatant.is_ai();
        match combatant.offense.start_attacking(target, is_ai, weapon) {
            CycleStart::AlreadyAttacking => {}
            CycleStart::Immediate => {
                tracing::debug!(%id, %target, "attack loop started");
                self.run_attack_cycle(id);
            }
            CycleStart::Delayed(delay) => {
                tracing::debug!(%id, %target, delay, "attack loop started");
                self.scheduler
                    .schedule_guarded(id, Lane::Offense, delay, Task::AttackCycle { attacker: id });
            }
        }
        Ok(())
    }

    /// Move the attack loop onto `target`, restarting only when it differs
    pub fn change_target(&mut self, id: CombatantId, target: CombatantId) -> Result<()> {
        self.get(target)?;
        let combatant = self.get_mut(id)?;
        if !combatant.offense.needs_restart_for(target) {
            return Ok(());
        }
        combatant.offense.stop();
        self.scheduler.cancel(id, Lane::Offense);
        self.start_attacking(id, target)
    }

    pub fn stop_attacking(&mut self, id: CombatantId) -> Result<()> {
        let combatant = self.get_mut(id)?;
        if combatant.offense.stop() {
            tracing::debug!(%id, "attack loop stopped");
        }
        self.scheduler.cancel(id, Lane::Offense);
        Ok(())
    }

    /// One attack with adjustments now, then the normal loop after `recovery`
    ///
    /// Returns whether the attack was issued.
    pub fn special_attack(
        &mut self,
        id: CombatantId,
        target: CombatantId,
        adj: AttackAdjustments,
        recovery: f32,
    ) -> Result<bool> {
        self.get(target)?;
        let combatant = self.get_mut(id)?;
        combatant.offense.set_target(Some(target));
        let issued = self.perform_attack(id, target, adj);

        let combatant = self.combatants.get_mut(&id).ok_or(SkirmishError::CombatantNotFound(id))?;
        let weapon = self.armory.weapon(combatant.offense.weapon())?;
        let is_ai = combatant.is_ai();
        if combatant.offense.start_attacking(target, is_ai, weapon) != CycleStart::AlreadyAttacking {
            self.scheduler
                .schedule_guarded(id, Lane::Offense, recovery.max(0.0), Task::AttackCycle { attacker: id });
        }
        Ok(issued)
    }

    /// Swap the dominant weapon for another armory entry
    pub fn equip_weapon(&mut self, id: CombatantId, weapon: WeaponId) -> Result<()> {
        self.armory.weapon(&weapon)?;
        let combatant = self.get_mut(id)?;
        combatant.offense.set_weapon(weapon.clone());
        tracing::info!(%id, %weapon, "weapon equipped");
        self.events.push(CombatEvent::WeaponEquipped {
            combatant: id,
            weapon: weapon.0,
        });
        Ok(())
    }

    fn run_attack_cycle(&mut self, id: CombatantId) {
        let Some(flags) = self.offense_flags(id) else {
            return;
        };
        let Some(combatant) = self.combatants.get_mut(&id) else {
            return;
        };
        combatant.offense.update_flags(flags);
        let target = combatant.offense.target();
        let (Some(target), true) = (target, flags.can_attack()) else {
            tracing::debug!(%id, ?flags, "attack loop ended");
            combatant.offense.stop();
            return;
        };

        self.perform_attack(id, target, AttackAdjustments::default());

        let Some(combatant) = self.combatants.get(&id) else {
            return;
        };
        let Ok(weapon) = self.armory.weapon(combatant.offense.weapon()) else {
            return;
        };
        let delay = combatant
            .offense
            .next_cycle_delay(
                weapon,
                combatant.animation_speed,
                self.config.offense.cadence_jitter,
                &mut self.rng,
            )
            .max(MIN_ATTACK_CYCLE_SECONDS);
        self.scheduler
            .schedule_guarded(id, Lane::Offense, delay, Task::AttackCycle { attacker: id });
    }

    /// Issue one attack and resolve the defense immediately
    fn perform_attack(&mut self, attacker: CombatantId, target: CombatantId, adj: AttackAdjustments) -> bool {
        let (Some(a), Some(d)) = (self.combatants.get(&attacker), self.combatants.get(&target)) else {
            tracing::debug!(%attacker, %target, "attack aborted, combatant missing");
            return false;
        };
        if !a.is_alive() || !d.is_alive() {
            tracing::debug!(%attacker, %target, "attack aborted, combatant dead");
            return false;
        }
        let (Some(from), Some(at), Some(facing)) = (
            self.env.position(attacker),
            self.env.position(target),
            self.env.facing(target),
        ) else {
            tracing::debug!(%attacker, %target, "attack aborted, no position");
            return false;
        };
        let weapon = match self.armory.weapon(a.offense.weapon()) {
            Ok(weapon) => weapon,
            Err(err) => {
                tracing::warn!(%attacker, %err, "attack aborted");
                return false;
            }
        };

        let angle = math::attack_angle(from, at, facing);
        let penalty = math::resolve_defense_penalty(angle, &self.config.defense);
        let event = a.offense.build_attack(attacker, target, weapon, penalty, adj, &mut self.rng);

        self.env.play_feedback(attacker, Feedback::Attack(event.kind));
        self.events.push(CombatEvent::Attack {
            attacker,
            target,
            kind: event.kind,
        });

        let Some(defender) = self.combatants.get_mut(&target) else {
            return true;
        };
        let own_weapon = match self.armory.weapon(defender.offense.weapon()) {
            Ok(weapon) => weapon,
            Err(err) => {
                tracing::warn!(%target, %err, "defense skipped");
                return true;
            }
        };
        let ctx = DefenseContext {
            armory: &self.armory,
            own_weapon,
            tuning: &self.config.defense,
            is_player: defender.is_player(),
        };
        match defender.defense.defend(&event, &ctx, &mut self.rng) {
            DefenseOutcome::Hit { location, armor_absorbed, damage, delay } => {
                let amount = damage.total();
                self.events.push(CombatEvent::Hit {
                    attacker,
                    defender: target,
                    location,
                    armor_absorbed,
                    damage: amount,
                });
                self.scheduler.schedule(
                    delay,
                    Task::ApplyDamage { attacker, defender: target, amount, location },
                );
            }
            DefenseOutcome::Blocked { feedback_delay } => {
                self.events.push(CombatEvent::Blocked { attacker, defender: target });
                self.scheduler
                    .schedule(feedback_delay, Task::BlockFeedback { defender: target, attacker });
            }
            DefenseOutcome::BlockedWhileRecovering => {
                self.events.push(CombatEvent::Blocked { attacker, defender: target });
            }
        }
        true
    }

    // ========================================================================
    // Health and lifecycle
    // ========================================================================

    /// Deal damage directly (traps, scripted hits)
    pub fn apply_damage(&mut self, id: CombatantId, amount: f32) -> Result<HealthChange> {
        self.get(id)?;
        self.apply_health_delta(id, amount.max(0.0))
            .ok_or(SkirmishError::CombatantNotFound(id))
    }

    pub fn heal(&mut self, id: CombatantId, amount: f32) -> Result<HealthChange> {
        self.get(id)?;
        self.apply_health_delta(id, -amount.max(0.0))
            .ok_or(SkirmishError::CombatantNotFound(id))
    }

    fn apply_health_delta(&mut self, id: CombatantId, delta: f32) -> Option<HealthChange> {
        let combatant = self.combatants.get_mut(&id)?;
        let change = combatant.health.adjust(delta);
        let lost = change.amount_lost();
        if lost > 0.0 {
            tracing::debug!(%id, amount = lost, remaining = change.current, "damaged");
            self.events.push(CombatEvent::Damaged {
                combatant: id,
                amount: lost,
                remaining: change.current,
            });
        } else if lost < 0.0 {
            self.events.push(CombatEvent::Healed { combatant: id, amount: -lost });
        }
        if change.died {
            self.handle_death(id);
        }
        Some(change)
    }

    fn handle_death(&mut self, id: CombatantId) {
        self.scheduler.cancel_all(id);
        let Some(combatant) = self.combatants.get_mut(&id) else {
            return;
        };
        combatant.offense.set_target(None);
        if let Some(director) = combatant.director.as_mut() {
            director.clear_target();
        }
        let is_player = combatant.is_player();

        self.env.stop(id);
        self.env.play_feedback(id, Feedback::Death);
        tracing::info!(%id, name = %combatant.name, "combatant died");
        self.events.push(CombatEvent::Died { combatant: id });

        if is_player {
            self.events.push(CombatEvent::PlayerDefeated { combatant: id });
        } else {
            let delay = self.config.lifecycle.death_vanish_seconds;
            self.scheduler.schedule(delay, Task::Despawn { combatant: id });
        }
    }

    /// Remove a combatant and invalidate every reference to it
    pub fn despawn(&mut self, id: CombatantId) {
        let Some(combatant) = self.combatants.remove(&id) else {
            return;
        };
        self.roster.retain(|&c| c != id);
        self.env.despawn(id);
        self.scheduler.forget(id);
        if self.player == Some(id) {
            self.player = None;
        }

        for other in self.roster.clone() {
            let Some(c) = self.combatants.get_mut(&other) else {
                continue;
            };
            if c.offense.target() == Some(id) && c.offense.set_target(None) {
                self.scheduler.cancel(other, Lane::Offense);
            }
            if let Some(director) = c.director.as_mut() {
                if director.target() == Some(id) {
                    director.clear_target();
                }
            }
        }

        tracing::info!(%id, name = %combatant.name, "combatant despawned");
        self.events.push(CombatEvent::Despawned { combatant: id });
    }

    // ========================================================================
    // Fear
    // ========================================================================

    /// Send an AI combatant running to a fear destination
    ///
    /// `source` defaults to the nearest valid opponent within aggro range,
    /// else the combatant itself. Returns false when no destination qualifies
    /// or the combatant cannot flee.
    pub fn start_fleeing(
        &mut self,
        id: CombatantId,
        duration: f32,
        to_return: bool,
        source: Option<CombatantId>,
    ) -> Result<bool> {
        let combatant = self.get(id)?;
        if !combatant.is_ai() || !combatant.is_alive() || combatant.director.is_none() {
            tracing::debug!(%id, "cannot flee");
            return Ok(false);
        }
        let Some(fear) = self.fear.as_ref() else {
            tracing::debug!(%id, "no fear destinations in scene");
            return Ok(false);
        };
        let Some(position) = self.env.position(id) else {
            return Ok(false);
        };
        let source_position = match source.and_then(|s| self.env.position(s)) {
            Some(p) => p,
            None => self.nearest_threat(id, position).unwrap_or(position),
        };
        let destination = fear.select(
            position,
            source_position,
            self.config.ai.fear_min_distance,
            self.config.ai.fear_selection,
            |point| self.env.is_reachable(id, point),
        );
        let Some(destination) = destination else {
            tracing::debug!(%id, "no reachable fear destination");
            return Ok(false);
        };

        self.scheduler.cancel(id, Lane::Behaviour);
        self.stop_attacking(id)?;
        self.env.stop(id);
        let combatant = self.combatants.get_mut(&id).ok_or(SkirmishError::CombatantNotFound(id))?;
        combatant.offense.set_target(None);
        if let Some(director) = combatant.director.as_mut() {
            let from = director.state();
            director.begin_flee();
            if from != DirectorState::Fleeing {
                self.events.push(CombatEvent::StateChanged {
                    combatant: id,
                    from,
                    to: DirectorState::Fleeing,
                });
            }
        }

        let delay = self.config.ai.flee_start_delay;
        self.scheduler.schedule_guarded(
            id,
            Lane::Behaviour,
            delay,
            Task::FleeMove { combatant: id, destination },
        );
        self.scheduler.schedule_guarded(
            id,
            Lane::Behaviour,
            delay + duration.max(0.0),
            Task::FleeEnd {
                combatant: id,
                return_to: to_return.then_some(position),
            },
        );

        tracing::info!(%id, x = destination.x, y = destination.y, duration, to_return, "fleeing");
        self.events.push(CombatEvent::FleeStarted {
            combatant: id,
            destination,
            returning: to_return,
        });
        Ok(true)
    }

    /// Nearest valid opponent position within the combatant's aggro range
    fn nearest_threat(&self, id: CombatantId, position: Vec2) -> Option<Vec2> {
        let director = self.combatants.get(&id)?.director.as_ref()?;
        let link = self.formation_link(id);
        let aggro = director.aggro_distance(link.as_ref());
        self.sightings(id, position, aggro)
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|s| s.position)
    }

    fn end_flee(&mut self, id: CombatantId, return_to: Option<Vec2>) {
        if !self.is_alive(id) {
            return;
        }
        match return_to {
            Some(point) => {
                if let Some(director) = self.combatants.get_mut(&id).and_then(|c| c.director.as_mut()) {
                    let from = director.state();
                    director.end_flee_returning(point);
                    self.events.push(CombatEvent::StateChanged {
                        combatant: id,
                        from,
                        to: DirectorState::Returning,
                    });
                }
                tracing::debug!(%id, "flee over, returning");
                self.env.move_towards(id, point);
            }
            None => {
                tracing::debug!(%id, "flee over, leaving the field");
                self.despawn(id);
            }
        }
    }

    // ========================================================================
    // Allegiance
    // ========================================================================

    /// Flip an AI combatant's side; all in-progress activity is dropped
    pub fn set_allegiance(&mut self, id: CombatantId, is_enemy: bool) -> Result<()> {
        let combatant = self.get_mut(id)?;
        if combatant.is_player() {
            tracing::warn!(%id, "ignoring allegiance change on the player");
            return Ok(());
        }
        combatant.is_enemy = is_enemy;
        combatant.offense.set_target(None);
        let state_change = combatant.director.as_mut().and_then(|director| {
            let from = director.state();
            director.reset();
            (from != DirectorState::Idle).then_some(from)
        });

        self.scheduler.cancel_all(id);
        self.env.stop(id);
        if let Some(from) = state_change {
            self.events.push(CombatEvent::StateChanged {
                combatant: id,
                from,
                to: DirectorState::Idle,
            });
        }
        tracing::info!(%id, is_enemy, "allegiance changed");
        self.events.push(CombatEvent::AllegianceChanged { combatant: id, is_enemy });
        Ok(())
    }

    /// Flip every member of a formation at once
    pub fn set_formation_allegiance(&mut self, formation: FormationId, is_enemy: bool) -> Result<()> {
        let coordinator = self
            .formations
            .get_mut(&formation)
            .ok_or(SkirmishError::FormationNotFound(formation))?;
        coordinator.set_allegiance(is_enemy);
        let members = coordinator.members().to_vec();
        for member in members {
            if self.combatants.contains_key(&member) {
                self.set_allegiance(member, is_enemy)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Abilities
    // ========================================================================

    /// Try to use the ability in `slot`; refusals consume nothing
    pub fn attempt_ability(
        &mut self,
        id: CombatantId,
        slot: usize,
        target: Option<CombatantId>,
    ) -> Result<AbilityOutcome> {
        let combatant = self.get(id)?;
        if !combatant.is_alive() {
            return Ok(AbilityOutcome::Incapacitated);
        }
        let abilities = combatant.abilities.as_ref().ok_or(SkirmishError::NoAbilities(id))?;
        let ability = abilities.slot(id, slot)?;
        if !ability.has_uses() {
            return Ok(AbilityOutcome::NoUsesRemaining);
        }
        let config = ability.config.clone();

        match config.kind {
            AbilityKind::FirstAid { safe_radius, .. } if safe_radius > 0.0 => {
                if self.opponent_within(id, safe_radius) {
                    return Ok(AbilityOutcome::EnemiesTooClose);
                }
            }
            ref kind if kind.needs_target() => {
                let usable = target.map_or(false, |t| t != id && self.is_alive(t));
                if !usable {
                    return Ok(AbilityOutcome::NoTarget);
                }
            }
            _ => {}
        }

        let outcome = self
            .get_mut(id)?
            .abilities
            .as_mut()
            .ok_or(SkirmishError::NoAbilities(id))?
            .commit(id, slot)?;
        if outcome != AbilityOutcome::Used {
            tracing::debug!(%id, ability = %config.name, ?outcome, "ability refused");
            return Ok(outcome);
        }

        self.env.play_feedback(id, Feedback::Ability(config.name.clone()));
        tracing::info!(%id, ability = %config.name, "ability used");
        self.events.push(CombatEvent::AbilityUsed {
            combatant: id,
            ability: config.name.clone(),
        });

        match config.kind {
            AbilityKind::FirstAid { heal_percent, .. } => {
                let combatant = self.get_mut(id)?;
                let change = combatant.health.adjust_percent(heal_percent, false);
                let healed = -change.amount_lost();
                if healed > 0.0 {
                    self.events.push(CombatEvent::Healed { combatant: id, amount: healed });
                }
            }
            AbilityKind::AreaEffect { extra_damage, radius } => {
                let center = self.env.position(id).unwrap_or(Vec2::ZERO);
                for other in self.env.combatants_in_radius(center, radius) {
                    if other != id && self.is_alive(other) {
                        self.apply_health_delta(other, extra_damage);
                    }
                }
            }
            AbilityKind::BattleRoar { level, radius, duration } => {
                self.battle_roar(id, level, radius, duration)?;
            }
            AbilityKind::AimedShot { .. } | AbilityKind::FeignedAttack { .. } => {
                if let (Some((adj, recovery)), Some(target)) = (config.kind.special_attack(), target) {
                    self.special_attack(id, target, adj, recovery)?;
                }
            }
        }
        Ok(AbilityOutcome::Used)
    }

    /// Restock a limited-use ability; returns the new count
    pub fn add_ability_uses(&mut self, id: CombatantId, slot: usize, amount: u32) -> Result<Option<u32>> {
        let combatant = self.get_mut(id)?;
        let abilities = combatant.abilities.as_mut().ok_or(SkirmishError::NoAbilities(id))?;
        let remaining = abilities.add_uses(id, slot, amount)?;
        tracing::debug!(%id, slot, amount, ?remaining, "ability uses added");
        Ok(remaining)
    }

    fn battle_roar(&mut self, id: CombatantId, level: u32, radius: f32, duration: f32) -> Result<()> {
        let center = self.env.position(id).unwrap_or(Vec2::ZERO);
        let scared: Vec<(CombatantId, f32)> = {
            let me = self.get(id)?;
            self.env
                .combatants_in_radius(center, radius)
                .into_iter()
                .filter_map(|other| {
                    let them = self.combatants.get(&other)?;
                    let fearable = them.is_ai() && them.is_alive() && me.is_valid_opponent(them);
                    fearable.then(|| (other, battle_roar_chance(level, them.level)))
                })
                .collect()
        };
        for (other, chance) in scared {
            if chance > 0.0 && self.rng.gen::<f32>() <= chance {
                self.start_fleeing(other, duration, true, Some(id))?;
            }
        }
        Ok(())
    }

    fn opponent_within(&self, id: CombatantId, radius: f32) -> bool {
        self.env
            .position(id)
            .map_or(false, |p| !self.sightings(id, p, radius).is_empty())
    }

    fn get(&self, id: CombatantId) -> Result<&Combatant> {
        self.combatants.get(&id).ok_or(SkirmishError::CombatantNotFound(id))
    }

    fn get_mut(&mut self, id: CombatantId) -> Result<&mut Combatant> {
        self.combatants
            .get_mut(&id)
            .ok_or(SkirmishError::CombatantNotFound(id))
    }
}
