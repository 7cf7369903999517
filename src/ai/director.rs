//! Per-combatant AI decision state machine
//!
//! Each tick the world hands the director what it can see (valid opponents
//! already filtered by allegiance and liveness) and gets back a list of
//! directives to carry out. The director never touches the world itself,
//! which keeps every transition testable without an environment.

use serde::{Deserialize, Serialize};

use crate::ai::patrol::PatrolRoute;
use crate::ai::state::DirectorState;
use crate::combat::constants::{
    DEFAULT_AGGRO_DISTANCE, DEFAULT_WAYPOINT_DWELL, DEFAULT_WAYPOINT_TOLERANCE,
};
use crate::core::types::{CombatantId, Vec2};

/// Perception and patrol tuning for one AI combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorProfile {
    /// Opponents closer than this are chased
    pub aggro_distance: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_tolerance: f32,
    /// Pause at each waypoint before moving on
    pub dwell_seconds: f32,
}

impl Default for DirectorProfile {
    fn default() -> Self {
        Self {
            aggro_distance: DEFAULT_AGGRO_DISTANCE,
            waypoint_tolerance: DEFAULT_WAYPOINT_TOLERANCE,
            dwell_seconds: DEFAULT_WAYPOINT_DWELL,
        }
    }
}

/// A valid opponent inside the scan radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub id: CombatantId,
    pub position: Vec2,
    pub distance: f32,
}

/// Formation membership as seen by the director
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationLink {
    /// Replaces the combatant's own aggro distance while in formation
    pub aggro_distance: f32,
    pub slot: Vec2,
}

/// Everything the director needs for one decision pass
#[derive(Debug, Clone)]
pub struct DirectorContext<'a> {
    pub position: Vec2,
    pub weapon_range: f32,
    pub formation: Option<FormationLink>,
    pub opponents: &'a [Sighting],
    pub dt: f32,
}

/// Instructions for the world to carry out on the director's behalf
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// Cancel pending behaviour timers
    CancelActivity,
    StopAttacking,
    MoveTo(Vec2),
    /// Stop walking where we stand
    HoldPosition,
    StartAttacking(CombatantId),
    /// Swap the attack loop onto another target if it differs
    ChangeTarget(CombatantId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantDirector {
    pub profile: DirectorProfile,
    state: DirectorState,
    target: Option<CombatantId>,
    patrol: Option<PatrolRoute>,
    dwell_remaining: Option<f32>,
    /// Where a combatant walks back to after fleeing
    return_point: Option<Vec2>,
}

impl CombatantDirector {
    pub fn new(profile: DirectorProfile, patrol: Option<PatrolRoute>) -> Self {
        Self {
            profile,
            state: DirectorState::Idle,
            target: None,
            patrol,
            dwell_remaining: None,
            return_point: None,
        }
    }

    pub fn state(&self) -> DirectorState {
        self.state
    }

    pub fn target(&self) -> Option<CombatantId> {
        self.target
    }

    pub fn patrol(&self) -> Option<&PatrolRoute> {
        self.patrol.as_ref()
    }

    pub fn return_point(&self) -> Option<Vec2> {
        self.return_point
    }

    /// Aggro distance in effect, honouring a formation override
    pub fn aggro_distance(&self, formation: Option<&FormationLink>) -> f32 {
        formation.map_or(self.profile.aggro_distance, |f| f.aggro_distance)
    }

    /// Radius to query for opponents
    pub fn scan_radius(&self, weapon_range: f32, formation: Option<&FormationLink>) -> f32 {
        self.aggro_distance(formation).max(weapon_range)
    }

    /// Forget the current target (it was despawned or allegiance changed)
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Back to a clean idle state; used by explicit overrides
    pub fn reset(&mut self) {
        self.state = DirectorState::Idle;
        self.target = None;
        self.dwell_remaining = None;
        self.return_point = None;
    }

    /// Enter the fleeing state; only a timer or an override leaves it
    pub fn begin_flee(&mut self) {
        self.state = DirectorState::Fleeing;
        self.target = None;
        self.dwell_remaining = None;
        self.return_point = None;
    }

    /// Flee timer ran out and the combatant walks back to `point`
    pub fn end_flee_returning(&mut self, point: Vec2) {
        self.state = DirectorState::Returning;
        self.return_point = Some(point);
    }

    /// Keep the current target if still visible, else take the nearest
    pub fn select_target(&self, opponents: &[Sighting]) -> Option<Sighting> {
        if let Some(current) = self.target {
            if let Some(kept) = opponents.iter().find(|s| s.id == current) {
                return Some(*kept);
            }
        }
        opponents
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .copied()
    }

    /// Run one decision pass
    pub fn decide(&mut self, ctx: &DirectorContext<'_>) -> Vec<Directive> {
        if self.state.is_locked() {
            return Vec::new();
        }

        let aggro = self.aggro_distance(ctx.formation.as_ref());
        let sighting = self.select_target(ctx.opponents);
        self.target = sighting.map(|s| s.id);

        let (in_attack, in_aggro) = match sighting {
            Some(s) => {
                let in_attack = s.distance <= ctx.weapon_range;
                (in_attack, s.distance <= aggro && !in_attack)
            }
            None => (false, false),
        };

        let mut directives = Vec::new();
        match sighting {
            Some(s) if in_attack => self.engage(s, &mut directives),
            Some(s) if in_aggro => self.chase(s, &mut directives),
            _ => self.no_opponent(ctx, &mut directives),
        }
        directives
    }

    fn engage(&mut self, target: Sighting, out: &mut Vec<Directive>) {
        if self.state == DirectorState::Attacking {
            out.push(Directive::ChangeTarget(target.id));
            return;
        }
        self.dwell_remaining = None;
        self.return_point = None;
        self.state = DirectorState::Attacking;
        out.push(Directive::CancelActivity);
        out.push(Directive::HoldPosition);
        out.push(Directive::StartAttacking(target.id));
    }

    fn chase(&mut self, target: Sighting, out: &mut Vec<Directive>) {
        if self.state != DirectorState::Chasing {
            self.dwell_remaining = None;
            self.return_point = None;
            self.state = DirectorState::Chasing;
            out.push(Directive::CancelActivity);
            out.push(Directive::StopAttacking);
        }
        out.push(Directive::MoveTo(target.position));
    }

    fn no_opponent(&mut self, ctx: &DirectorContext<'_>, out: &mut Vec<Directive>) {
        if let Some(route) = self.patrol.as_mut() {
            if self.state != DirectorState::Patrolling {
                self.state = DirectorState::Patrolling;
                self.dwell_remaining = None;
                self.return_point = None;
                out.push(Directive::CancelActivity);
                out.push(Directive::StopAttacking);
                out.push(Directive::MoveTo(route.advance()));
                return;
            }

            match self.dwell_remaining {
                Some(remaining) => {
                    let remaining = remaining - ctx.dt;
                    if remaining <= 0.0 {
                        self.dwell_remaining = None;
                        out.push(Directive::MoveTo(route.advance()));
                    } else {
                        self.dwell_remaining = Some(remaining);
                    }
                }
                None => {
                    if ctx.position.distance(&route.current()) <= self.profile.waypoint_tolerance {
                        self.dwell_remaining = Some(self.profile.dwell_seconds);
                    }
                }
            }
            return;
        }

        if self.state == DirectorState::Attacking {
            out.push(Directive::StopAttacking);
        }

        if let Some(link) = ctx.formation {
            self.state = DirectorState::Returning;
            out.push(Directive::MoveTo(link.slot));
            return;
        }

        if let Some(point) = self.return_point {
            if ctx.position.distance(&point) > self.profile.waypoint_tolerance {
                self.state = DirectorState::Returning;
                return;
            }
            self.return_point = None;
        }

        // Idle means standing still, not finishing the chase
        if self.state == DirectorState::Chasing {
            out.push(Directive::HoldPosition);
        }
        self.state = DirectorState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(id: u32, x: f32) -> Sighting {
        Sighting {
            id: CombatantId(id),
            position: Vec2::new(x, 0.0),
            distance: x.abs(),
        }
    }

    fn ctx<'a>(opponents: &'a [Sighting]) -> DirectorContext<'a> {
        DirectorContext {
            position: Vec2::ZERO,
            weapon_range: 2.0,
            formation: None,
            opponents,
            dt: 0.1,
        }
    }

    #[test]
    fn test_idle_without_opponents() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        assert!(director.decide(&ctx(&[])).is_empty());
        assert_eq!(director.state(), DirectorState::Idle);
    }

    #[test]
    fn test_chase_then_attack() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);

        let far = [sighting(2, 5.0)];
        let directives = director.decide(&ctx(&far));
        assert_eq!(director.state(), DirectorState::Chasing);
        assert_eq!(
            directives,
            vec![
                Directive::CancelActivity,
                Directive::StopAttacking,
                Directive::MoveTo(Vec2::new(5.0, 0.0))
            ]
        );

        // Still chasing: just keeps following
        let closer = [sighting(2, 4.0)];
        assert_eq!(director.decide(&ctx(&closer)), vec![Directive::MoveTo(Vec2::new(4.0, 0.0))]);

        let near = [sighting(2, 2.0)];
        let directives = director.decide(&ctx(&near));
        assert_eq!(director.state(), DirectorState::Attacking);
        assert_eq!(
            directives,
            vec![
                Directive::CancelActivity,
                Directive::HoldPosition,
                Directive::StartAttacking(CombatantId(2))
            ]
        );
    }

    #[test]
    fn test_attacking_swaps_target_without_restart() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.decide(&ctx(&[sighting(2, 1.0)]));
        let directives = director.decide(&ctx(&[sighting(3, 1.5)]));
        assert_eq!(directives, vec![Directive::ChangeTarget(CombatantId(3))]);
        assert_eq!(director.target(), Some(CombatantId(3)));
    }

    #[test]
    fn test_keeps_current_target_over_nearer_one() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.decide(&ctx(&[sighting(2, 6.0)]));
        director.decide(&ctx(&[sighting(3, 3.0), sighting(2, 6.0)]));
        assert_eq!(director.target(), Some(CombatantId(2)));
    }

    #[test]
    fn test_picks_nearest_when_no_current_target() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.decide(&ctx(&[sighting(4, 8.0), sighting(3, 3.0)]));
        assert_eq!(director.target(), Some(CombatantId(3)));
    }

    #[test]
    fn test_formation_aggro_override() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        let opponents = [sighting(2, 5.0)];
        let link = FormationLink { aggro_distance: 3.0, slot: Vec2::new(-1.0, -1.0) };
        let context = DirectorContext { formation: Some(link), ..ctx(&opponents) };
        let directives = director.decide(&context);
        assert_eq!(director.state(), DirectorState::Returning);
        assert_eq!(directives, vec![Directive::MoveTo(Vec2::new(-1.0, -1.0))]);
        assert_eq!(director.scan_radius(2.0, Some(&link)), 3.0);
    }

    #[test]
    fn test_patrol_dwell_then_advance() {
        let route = PatrolRoute::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)],
            "guard",
        )
        .expect("route");
        let profile = DirectorProfile { dwell_seconds: 0.25, ..Default::default() };
        let mut director = CombatantDirector::new(profile, Some(route));

        // Entering patrol heads for the next waypoint
        let directives = director.decide(&ctx(&[]));
        assert_eq!(director.state(), DirectorState::Patrolling);
        assert_eq!(directives.last(), Some(&Directive::MoveTo(Vec2::new(1.0, 0.0))));

        // Within tolerance: start dwelling, no movement yet
        assert!(director.decide(&ctx(&[])).is_empty());
        assert!(director.decide(&ctx(&[])).is_empty());
        assert!(director.decide(&ctx(&[])).is_empty());
        // Dwell elapsed: wrap back to the first waypoint
        assert_eq!(director.decide(&ctx(&[])), vec![Directive::MoveTo(Vec2::new(0.0, 0.0))]);
    }

    #[test]
    fn test_losing_target_stops_attack_loop() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.decide(&ctx(&[sighting(2, 1.0)]));
        assert_eq!(director.decide(&ctx(&[])), vec![Directive::StopAttacking]);
        assert_eq!(director.state(), DirectorState::Idle);
        assert!(director.target().is_none());
    }

    #[test]
    fn test_fleeing_ignores_opponents() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.begin_flee();
        assert!(director.decide(&ctx(&[sighting(2, 1.0)])).is_empty());
        assert_eq!(director.state(), DirectorState::Fleeing);
        director.end_flee_returning(Vec2::new(10.0, 0.0));
        assert_eq!(director.state(), DirectorState::Returning);
    }

    #[test]
    fn test_lost_chase_target_holds_position() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.decide(&ctx(&[sighting(2, 5.0)]));
        assert_eq!(director.state(), DirectorState::Chasing);

        assert_eq!(director.decide(&ctx(&[])), vec![Directive::HoldPosition]);
        assert_eq!(director.state(), DirectorState::Idle);
        // Already idle: nothing more to say
        assert!(director.decide(&ctx(&[])).is_empty());
    }

    #[test]
    fn test_returning_until_back_at_return_point() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.begin_flee();
        director.end_flee_returning(Vec2::new(10.0, 0.0));

        // Still far from home
        assert!(director.decide(&ctx(&[])).is_empty());
        assert_eq!(director.state(), DirectorState::Returning);
        assert_eq!(director.return_point(), Some(Vec2::new(10.0, 0.0)));

        // Within waypoint tolerance (3.0) of home
        let home = DirectorContext { position: Vec2::new(8.0, 0.0), ..ctx(&[]) };
        assert!(director.decide(&home).is_empty());
        assert_eq!(director.state(), DirectorState::Idle);
        assert_eq!(director.return_point(), None);
    }

    #[test]
    fn test_opponent_interrupts_return() {
        let mut director = CombatantDirector::new(DirectorProfile::default(), None);
        director.begin_flee();
        director.end_flee_returning(Vec2::new(20.0, 0.0));
        director.decide(&ctx(&[sighting(2, 5.0)]));
        assert_eq!(director.state(), DirectorState::Chasing);
        assert_eq!(director.return_point(), None);
    }
}
