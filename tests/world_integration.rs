//! End-to-end scenarios through the world tick

use skirmish::abilities::{AbilityConfig, AbilityKind, AbilityOutcome};
use skirmish::ai::{DirectorState, FearDestinations};
use skirmish::combat::Armory;
use skirmish::core::config::OffenseTuning;
use skirmish::core::CombatConfig;
use skirmish::formation::FormationBlueprint;
use skirmish::simulation::{CombatantBlueprint, Feedback};
use skirmish::{CombatEvent, CombatantId, Environment, Sandbox, Vec2, World};

fn world(seed: u64) -> World<Sandbox> {
    World::new(Sandbox::default(), CombatConfig::default(), Armory::with_defaults(), seed)
}

fn run(world: &mut World<Sandbox>, ticks: usize, dt: f32) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(world.tick(dt));
    }
    events
}

/// World whose attack cadence has no jitter
fn steady_world(seed: u64) -> World<Sandbox> {
    let config = CombatConfig {
        offense: OffenseTuning { cadence_jitter: 0.0, ..Default::default() },
        ..Default::default()
    };
    World::new(Sandbox::default(), config, Armory::with_defaults(), seed)
}

/// Seconds at which each attack by `attacker` was issued, with its target
fn attack_times(world: &mut World<Sandbox>, attacker: CombatantId, until: f64) -> Vec<(f64, CombatantId)> {
    let mut times = Vec::new();
    while world.now() < until {
        for event in world.tick(0.1) {
            if let CombatEvent::Attack { attacker: a, target, .. } = event {
                if a == attacker {
                    times.push((world.now(), target));
                }
            }
        }
    }
    times
}

/// A friendly dummy that survives a long exchange
fn dummy(at: Vec2) -> CombatantBlueprint {
    CombatantBlueprint { max_health: 5000.0, ..CombatantBlueprint::ai("dummy", "sword").at(at) }
}

/// A blueprint that always lands its attacks
fn sure_hitter(blueprint: CombatantBlueprint) -> CombatantBlueprint {
    CombatantBlueprint { attack_bonus: 1000.0, ..blueprint }
}

/// A blueprint that never blocks
fn open_guard(blueprint: CombatantBlueprint) -> CombatantBlueprint {
    CombatantBlueprint { block_bonus: 0.0, ..blueprint }
}

#[test]
fn test_chase_then_attack() {
    let mut world = world(1);
    let hero = world
        .spawn(CombatantBlueprint::player("hero", "sword").at(Vec2::new(5.0, 0.0)))
        .expect("spawn");
    let bandit = world
        .spawn(CombatantBlueprint::ai("bandit", "sword").hostile().at(Vec2::ZERO))
        .expect("spawn");

    let events = world.tick(0.1);
    assert_eq!(world.state(bandit), Some(DirectorState::Chasing));
    assert!(events.contains(&CombatEvent::StateChanged {
        combatant: bandit,
        from: DirectorState::Idle,
        to: DirectorState::Chasing,
    }));
    assert_eq!(world.env().destination(bandit), Some(Vec2::new(5.0, 0.0)));

    let mut attacking_after = None;
    for tick in 0..30 {
        world.tick(0.1);
        if world.state(bandit) == Some(DirectorState::Attacking) {
            attacking_after = Some(tick);
            break;
        }
    }
    assert!(attacking_after.is_some(), "bandit never closed to weapon range");
    assert_eq!(world.target(bandit), Some(hero));
    assert!(world.is_attacking(bandit));

    // AI holds the first swing for the damage delay, then attacks
    let events = run(&mut world, 10, 0.1);
    assert!(events
        .iter()
        .any(|e| matches!(e, CombatEvent::Attack { attacker, .. } if *attacker == bandit)));
}

#[test]
fn test_out_of_aggro_stays_idle() {
    let mut world = world(1);
    world
        .spawn(CombatantBlueprint::player("hero", "sword").at(Vec2::new(11.0, 0.0)))
        .expect("spawn");
    let bandit = world
        .spawn(CombatantBlueprint::ai("bandit", "sword").hostile())
        .expect("spawn");
    run(&mut world, 5, 0.1);
    assert_eq!(world.state(bandit), Some(DirectorState::Idle));
}

#[test]
fn test_damage_discarded_when_target_dies_first() {
    let mut world = world(3);
    let hero = world
        .spawn(sure_hitter(CombatantBlueprint::player("hero", "sword")))
        .expect("spawn");
    let bandit = world
        .spawn(open_guard(
            CombatantBlueprint::ai("bandit", "sword").hostile().at(Vec2::new(0.0, 1.5)),
        ))
        .expect("spawn");

    world.start_attacking(hero, bandit).expect("attack");
    let events = world.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, CombatEvent::Hit { defender, .. } if *defender == bandit)));

    // Something else kills the bandit before the blow lands
    world.apply_damage(bandit, 1000.0).expect("damage");
    let deaths_before = world
        .take_events()
        .iter()
        .filter(|e| matches!(e, CombatEvent::Died { .. }))
        .count();
    assert_eq!(deaths_before, 1);

    let events = world.tick(0.6);
    assert!(events.contains(&CombatEvent::DamageDiscarded { attacker: hero, defender: bandit }));
    assert!(!events.iter().any(|e| matches!(e, CombatEvent::Died { .. })));
    assert!(!world.is_attacking(hero));
}

#[test]
fn test_damage_discarded_when_attacker_dies_first() {
    let mut world = world(3);
    let hero = world
        .spawn(open_guard(CombatantBlueprint::player("hero", "sword")))
        .expect("spawn");
    let bandit = world
        .spawn(sure_hitter(
            CombatantBlueprint::ai("bandit", "sword").hostile().at(Vec2::new(0.0, 1.5)),
        ))
        .expect("spawn");

    // Player-style immediate attack from the bandit
    world
        .special_attack(bandit, hero, Default::default(), 5.0)
        .expect("attack");
    world.take_events();
    world.apply_damage(bandit, 1000.0).expect("damage");

    let events = world.tick(0.6);
    assert!(events.contains(&CombatEvent::DamageDiscarded { attacker: bandit, defender: hero }));
    assert_eq!(world.health_percent(hero), Some(1.0));
}

#[test]
fn test_delayed_damage_lands() {
    let mut world = world(5);
    let hero = world
        .spawn(sure_hitter(CombatantBlueprint::player("hero", "sword")))
        .expect("spawn");
    let dummy = world
        .spawn(open_guard(CombatantBlueprint::ai("dummy", "sword").at(Vec2::new(0.0, 1.0))))
        .expect("spawn");

    world.start_attacking(hero, dummy).expect("attack");
    assert_eq!(world.health_percent(dummy), Some(1.0));
    let events = world.tick(0.6);
    assert!(events
        .iter()
        .any(|e| matches!(e, CombatEvent::Damaged { combatant, .. } if *combatant == dummy)));
    assert!(world.health_percent(dummy).unwrap_or(1.0) < 1.0);
    assert!(world
        .env()
        .feedback_for(hero)
        .any(|f| matches!(f, Feedback::Attack(_))));
}

#[test]
fn test_block_feedback_and_recovery() {
    let mut world = world(9);
    let hero = world
        .spawn(CombatantBlueprint { attack_bonus: -500.0, ..CombatantBlueprint::player("hero", "sword") })
        .expect("spawn");
    let guard = world
        .spawn(CombatantBlueprint::ai("wall", "sword").at(Vec2::new(0.0, 1.0)))
        .expect("spawn");

    world.start_attacking(hero, guard).expect("attack");
    assert!(world
        .take_events()
        .contains(&CombatEvent::Blocked { attacker: hero, defender: guard }));
    assert!(world.combatant(guard).map_or(false, |c| c.defense.is_blocking()));

    // Block feedback at 0.5 - 0.25, recovery 0.5 after that
    world.tick(0.3);
    assert!(world.env().feedback_for(guard).any(|f| *f == Feedback::Block));
    assert!(world.combatant(guard).map_or(false, |c| c.defense.is_blocking()));
    world.tick(0.5);
    assert!(!world.combatant(guard).map_or(true, |c| c.defense.is_blocking()));
}

#[test]
fn test_despawn_clears_references() {
    let mut world = world(4);
    let guard = world
        .spawn(CombatantBlueprint::ai("guard", "sword").at(Vec2::ZERO))
        .expect("spawn");
    let bandit = world
        .spawn(
            CombatantBlueprint::ai("bandit", "sword")
                .hostile()
                .at(Vec2::new(1.5, 0.0)),
        )
        .expect("spawn");
    world.tick(0.1);
    assert_eq!(world.target(guard), Some(bandit));

    world.despawn(bandit);
    assert_eq!(world.target(guard), None);
    assert!(!world.is_attacking(guard));
    assert!(world.combatant(bandit).is_none());
    assert!(world.take_events().contains(&CombatEvent::Despawned { combatant: bandit }));

    // Ids are never reused
    let next = world.spawn(CombatantBlueprint::ai("late", "sword")).expect("spawn");
    assert!(next > bandit);
}

#[test]
fn test_leader_loss_dissolves_within_one_tick() {
    let mut world = world(6);
    let members: Vec<CombatantId> = (0..3)
        .map(|_| {
            world
                .spawn(CombatantBlueprint::ai("pike", "spear").hostile())
                .expect("spawn")
        })
        .collect();
    let formation = world
        .create_formation(
            FormationBlueprint {
                name: "pikes".into(),
                anchor: Vec2::new(0.0, 30.0),
                slots: vec![Vec2::ZERO, Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0)],
                ..Default::default()
            },
            members.clone(),
        )
        .expect("formation");
    assert_eq!(world.formation_of(members[1]), Some(formation));
    assert_eq!(world.env().position(members[2]), Some(Vec2::new(2.0, 30.0)));

    world.apply_damage(members[0], 1000.0).expect("damage");
    let events = world.tick(0.1);
    assert!(events.contains(&CombatEvent::FormationDissolved { formation }));
    assert!(world.formation(formation).is_none());
    assert_eq!(world.formation_of(members[1]), None);
    assert_eq!(world.formation_of(members[2]), None);
}

#[test]
fn test_members_return_to_slots() {
    let mut world = world(6);
    let a = world.spawn(CombatantBlueprint::ai("a", "sword").hostile()).expect("spawn");
    let b = world.spawn(CombatantBlueprint::ai("b", "sword").hostile()).expect("spawn");
    world
        .create_formation(
            FormationBlueprint {
                slots: vec![Vec2::ZERO, Vec2::new(3.0, 0.0)],
                anchor: Vec2::new(10.0, 10.0),
                ..Default::default()
            },
            vec![a, b],
        )
        .expect("formation");
    world.tick(0.1);
    assert_eq!(world.state(b), Some(DirectorState::Returning));
    assert_eq!(world.env().destination(b), Some(Vec2::new(13.0, 10.0)));
}

#[test]
fn test_heavy_casualties_break_formation() {
    let mut world = world(8);
    world.set_fear_destinations(FearDestinations::new(vec![Vec2::new(0.0, -60.0)]));
    let members: Vec<CombatantId> = (0..4)
        .map(|_| world.spawn(CombatantBlueprint::ai("levy", "sword")).expect("spawn"))
        .collect();
    world
        .create_formation(
            FormationBlueprint {
                slots: (0..4).map(|i| Vec2::new(i as f32 * 2.0, 0.0)).collect(),
                morale: 0.5,
                ..Default::default()
            },
            members.clone(),
        )
        .expect("formation");

    for &member in &members[1..] {
        world.apply_damage(member, 1000.0).expect("damage");
    }
    // 0.75 casualties against 0.5 morale: the leader breaks sooner or later
    let events = run(&mut world, 60, 1.0);
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::FleeStarted { combatant, returning: false, .. } if *combatant == members[0]
    )));
}

#[test]
fn test_steady_formation_never_breaks() {
    let mut world = world(8);
    world.set_fear_destinations(FearDestinations::new(vec![Vec2::new(0.0, -60.0)]));
    let members: Vec<CombatantId> = (0..4)
        .map(|_| world.spawn(CombatantBlueprint::ai("levy", "sword")).expect("spawn"))
        .collect();
    world
        .create_formation(
            FormationBlueprint {
                slots: (0..4).map(|i| Vec2::new(i as f32 * 2.0, 0.0)).collect(),
                morale: 0.5,
                ..Default::default()
            },
            members.clone(),
        )
        .expect("formation");
    world.apply_damage(members[3], 1000.0).expect("damage");
    world.apply_damage(members[2], 1000.0).expect("damage");

    // Exactly at morale: flee chance is zero
    let events = run(&mut world, 60, 1.0);
    assert!(!events.iter().any(|e| matches!(e, CombatEvent::FleeStarted { .. })));
}

#[test]
fn test_formation_allegiance_flip() {
    let mut world = world(2);
    let a = world.spawn(CombatantBlueprint::ai("a", "sword").hostile()).expect("spawn");
    let b = world.spawn(CombatantBlueprint::ai("b", "sword").hostile()).expect("spawn");
    let formation = world
        .create_formation(
            FormationBlueprint { slots: vec![Vec2::ZERO, Vec2::new(2.0, 0.0)], ..Default::default() },
            vec![a, b],
        )
        .expect("formation");

    world.set_formation_allegiance(formation, false).expect("flip");
    assert!(world.combatant(a).map_or(false, |c| !c.is_enemy));
    assert!(world.combatant(b).map_or(false, |c| !c.is_enemy));
    assert_eq!(world.formation(formation).map(|f| f.is_enemy()), Some(false));
}

#[test]
fn test_first_aid_limited_to_five_uses() {
    let mut world = world(11);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "sword")
                .with_abilities(vec![AbilityConfig::new("First Aid", AbilityKind::first_aid()).with_cost(0.0)]),
        )
        .expect("spawn");

    for _ in 0..5 {
        world.apply_damage(hero, 50.0).expect("damage");
        assert_eq!(world.attempt_ability(hero, 0, None).expect("ability"), AbilityOutcome::Used);
    }
    assert_eq!(world.ability_uses(hero, 0).expect("slot"), Some(0));

    world.apply_damage(hero, 10.0).expect("damage");
    let health = world.health_percent(hero);
    let stamina = world.stamina_percent(hero);
    assert_eq!(
        world.attempt_ability(hero, 0, None).expect("ability"),
        AbilityOutcome::NoUsesRemaining
    );
    assert_eq!(world.health_percent(hero), health);
    assert_eq!(world.stamina_percent(hero), stamina);

    assert_eq!(world.add_ability_uses(hero, 0, 2).expect("slot"), Some(2));
}

#[test]
fn test_first_aid_heals_share_of_missing_health() {
    let mut world = world(11);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "sword")
                .with_abilities(vec![AbilityConfig::new("First Aid", AbilityKind::first_aid())]),
        )
        .expect("spawn");
    world.apply_damage(hero, 50.0).expect("damage");
    world.attempt_ability(hero, 0, None).expect("ability");
    // 60% of the missing 50
    let health = world.health_percent(hero).unwrap_or(0.0);
    assert!((health - 0.8).abs() < 1e-5, "health {}", health);
}

#[test]
fn test_first_aid_refused_with_enemies_near() {
    let mut world = world(11);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "sword")
                .with_abilities(vec![AbilityConfig::new("First Aid", AbilityKind::first_aid())]),
        )
        .expect("spawn");
    world
        .spawn(CombatantBlueprint::ai("bandit", "sword").hostile().at(Vec2::new(10.0, 0.0)))
        .expect("spawn");
    world.apply_damage(hero, 50.0).expect("damage");

    assert_eq!(
        world.attempt_ability(hero, 0, None).expect("ability"),
        AbilityOutcome::EnemiesTooClose
    );
    assert_eq!(world.ability_uses(hero, 0).expect("slot"), Some(5));
    assert_eq!(world.stamina_percent(hero), Some(1.0));
    assert_eq!(world.health_percent(hero), Some(0.5));
}

#[test]
fn test_out_of_stamina_refused() {
    let mut world = world(11);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "sword")
                .with_abilities(vec![AbilityConfig::new("Area", AbilityKind::area_effect()).with_cost(80.0)]),
        )
        .expect("spawn");
    assert_eq!(world.attempt_ability(hero, 0, None).expect("ability"), AbilityOutcome::Used);
    assert_eq!(
        world.attempt_ability(hero, 0, None).expect("ability"),
        AbilityOutcome::OutOfStamina
    );
}

#[test]
fn test_area_effect_hits_everyone_else_in_radius() {
    let mut world = world(12);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "sword")
                .with_abilities(vec![AbilityConfig::new("Blast", AbilityKind::area_effect())]),
        )
        .expect("spawn");
    let friend = world
        .spawn(CombatantBlueprint::ai("friend", "sword").at(Vec2::new(3.0, 0.0)))
        .expect("spawn");
    let foe = world
        .spawn(CombatantBlueprint::ai("foe", "sword").hostile().at(Vec2::new(0.0, 14.0)))
        .expect("spawn");
    let far = world
        .spawn(CombatantBlueprint::ai("far", "sword").hostile().at(Vec2::new(0.0, 30.0)))
        .expect("spawn");

    world.attempt_ability(hero, 0, None).expect("ability");
    assert_eq!(world.health_percent(hero), Some(1.0));
    assert_eq!(world.health_percent(friend), Some(0.9));
    assert_eq!(world.health_percent(foe), Some(0.9));
    assert_eq!(world.health_percent(far), Some(1.0));
}

#[test]
fn test_battle_roar_scares_weak_enemies() {
    let mut world = world(13);
    world.set_fear_destinations(FearDestinations::new(vec![Vec2::new(0.0, 50.0)]));
    // Level 5 against level 1 is a certain scare; against level 6 no chance
    let hero = world
        .spawn(CombatantBlueprint {
            level: 5,
            ..CombatantBlueprint::player("hero", "sword")
                .with_abilities(vec![AbilityConfig::new("Roar", AbilityKind::battle_roar())])
        })
        .expect("spawn");
    let coward = world
        .spawn(CombatantBlueprint::ai("coward", "sword").hostile().at(Vec2::new(0.0, 5.0)))
        .expect("spawn");
    let veteran = world
        .spawn(CombatantBlueprint {
            level: 6,
            ..CombatantBlueprint::ai("veteran", "sword").hostile().at(Vec2::new(0.0, -5.0))
        })
        .expect("spawn");
    let ally = world
        .spawn(CombatantBlueprint::ai("ally", "sword").at(Vec2::new(5.0, 0.0)))
        .expect("spawn");

    assert_eq!(world.attempt_ability(hero, 0, None).expect("ability"), AbilityOutcome::Used);
    assert_eq!(world.state(coward), Some(DirectorState::Fleeing));
    assert_ne!(world.state(veteran), Some(DirectorState::Fleeing));
    assert_ne!(world.state(ally), Some(DirectorState::Fleeing));
    assert!(world.take_events().iter().any(|e| matches!(
        e,
        CombatEvent::FleeStarted { combatant, returning: true, .. } if *combatant == coward
    )));
}

#[test]
fn test_aimed_shot_needs_target() {
    let mut world = world(14);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "bow")
                .with_abilities(vec![AbilityConfig::new("Aimed Shot", AbilityKind::aimed_shot())]),
        )
        .expect("spawn");
    let bandit = world
        .spawn(CombatantBlueprint::ai("bandit", "sword").hostile().at(Vec2::new(0.0, 10.0)))
        .expect("spawn");

    assert_eq!(world.attempt_ability(hero, 0, None).expect("ability"), AbilityOutcome::NoTarget);
    assert_eq!(world.stamina_percent(hero), Some(1.0));

    assert_eq!(
        world.attempt_ability(hero, 0, Some(bandit)).expect("ability"),
        AbilityOutcome::Used
    );
    let events = world.take_events();
    assert!(events.contains(&CombatEvent::Attack {
        attacker: hero,
        target: bandit,
        kind: skirmish::combat::AttackKind::Thrust,
    }));
    assert!(world.is_attacking(hero));
    assert_eq!(world.target(hero), Some(bandit));
}

#[test]
fn test_same_seed_same_fight() {
    fn fight(seed: u64) -> Vec<CombatEvent> {
        let mut world = world(seed);
        world
            .spawn(CombatantBlueprint::ai("guard", "sword").at(Vec2::ZERO))
            .expect("spawn");
        world
            .spawn(CombatantBlueprint::ai("bandit", "mace").hostile().at(Vec2::new(4.0, 0.0)))
            .expect("spawn");
        run(&mut world, 200, 0.05)
    }
    assert_eq!(fight(99), fight(99));
}

#[test]
fn test_change_target_cancels_pending_cycle() {
    let mut world = steady_world(21);
    let hero = world.spawn(CombatantBlueprint::player("hero", "sword")).expect("spawn");
    let first = world.spawn(dummy(Vec2::new(1.0, 0.0))).expect("spawn");
    let second = world.spawn(dummy(Vec2::new(-1.0, 0.0))).expect("spawn");

    // Swing at 0.0, next cycle due at 2.0 (1s swing + 1s pause)
    world.start_attacking(hero, first).expect("attack");
    world.tick(0.5);
    world.take_events();

    world.change_target(hero, second).expect("switch");
    assert!(world.take_events().iter().any(|e| matches!(
        e,
        CombatEvent::Attack { attacker, target, .. } if *attacker == hero && *target == second
    )));
    assert_eq!(world.target(hero), Some(second));

    let attacks = attack_times(&mut world, hero, 4.0);
    assert!(attacks.iter().all(|&(_, target)| target == second), "stray swing: {:?}", attacks);
    // The old 2.0 cycle is gone; the new loop swings 2.0 after the switch
    let (at, _) = attacks.first().copied().expect("loop should continue on the new target");
    assert!((2.45..2.65).contains(&at), "next swing at {}", at);
}

#[test]
fn test_change_target_to_same_target_keeps_cadence() {
    let mut world = steady_world(22);
    let hero = world.spawn(CombatantBlueprint::player("hero", "sword")).expect("spawn");
    let foe = world.spawn(dummy(Vec2::new(1.0, 0.0))).expect("spawn");

    world.start_attacking(hero, foe).expect("attack");
    world.tick(0.5);
    world.change_target(hero, foe).expect("same target");

    let attacks = attack_times(&mut world, hero, 2.5);
    let (at, _) = attacks.first().copied().expect("loop should continue");
    assert!((1.95..2.15).contains(&at), "next swing at {}", at);
}

#[test]
fn test_special_attack_resumes_cycle_after_recovery() {
    let mut world = steady_world(23);
    let hero = world
        .spawn(
            CombatantBlueprint::player("hero", "bow")
                .with_abilities(vec![AbilityConfig::new("Aimed Shot", AbilityKind::aimed_shot())]),
        )
        .expect("spawn");
    let mark = world.spawn(dummy(Vec2::new(0.0, 10.0))).expect("spawn");

    assert_eq!(world.attempt_ability(hero, 0, Some(mark)).expect("ability"), AbilityOutcome::Used);
    assert!(world
        .take_events()
        .iter()
        .any(|e| matches!(e, CombatEvent::Attack { attacker, .. } if *attacker == hero)));

    // Aimed shot recovery is 1.0; the bow then cycles every 2.0
    let attacks = attack_times(&mut world, hero, 3.5);
    let times: Vec<f64> = attacks.iter().map(|&(at, _)| at).collect();
    assert_eq!(times.len(), 2, "attacks at {:?}", times);
    assert!((0.95..1.15).contains(&times[0]), "first cycle at {}", times[0]);
    assert!((2.95..3.15).contains(&times[1]), "second cycle at {}", times[1]);
    assert!(attacks.iter().all(|&(_, target)| target == mark));
}

#[test]
fn test_formation_rejects_repeated_member() {
    let mut world = world(24);
    let a = world.spawn(CombatantBlueprint::ai("a", "sword").hostile()).expect("spawn");
    let b = world.spawn(CombatantBlueprint::ai("b", "sword").hostile()).expect("spawn");
    let result = world.create_formation(
        FormationBlueprint {
            slots: vec![Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(4.0, 0.0)],
            ..Default::default()
        },
        vec![a, b, b],
    );
    assert!(matches!(result, Err(skirmish::SkirmishError::InvalidConfig(_))));
    assert_eq!(world.formation_count(), 0);
    assert_eq!(world.formation_of(b), None);
}
