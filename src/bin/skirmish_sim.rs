//! Headless Skirmish Runner
//!
//! Runs a scripted fight in the kinematic sandbox: the player and a town
//! guard against a bandit formation and a patrolling archer. Prints a
//! summary as text or JSON.

use std::collections::BTreeMap;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use skirmish::abilities::{AbilityConfig, AbilityKind, AbilityOutcome};
use skirmish::ai::{DirectorState, FearDestinations};
use skirmish::combat::{ArmorLoadout, Armory};
use skirmish::core::types::ArmorId;
use skirmish::core::{load_combat_config, CombatConfig};
use skirmish::formation::{AdvanceOrder, FormationBlueprint};
use skirmish::simulation::CombatantBlueprint;
use skirmish::{CombatEvent, CombatantId, Environment, Sandbox, Vec2, World};

/// Headless Skirmish Runner - scripted fight in the sandbox
#[derive(Parser, Debug)]
#[command(name = "skirmish_sim")]
#[command(about = "Run a scripted skirmish and print a summary")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1800)]
    ticks: u32,

    /// Ticks per simulated second
    #[arg(long, default_value_t = 30)]
    tick_hz: u32,

    /// Global combat config (TOML)
    #[arg(long, default_value = "data/combat.toml")]
    config: String,

    /// Weapon and armor tables (TOML)
    #[arg(long, default_value = "data/armory.toml")]
    armory: String,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct SurvivorSummary {
    id: CombatantId,
    name: String,
    health_percent: f32,
    state: Option<DirectorState>,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishSummary {
    seed: u64,
    ticks: u32,
    seconds: f64,
    player_alive: bool,
    player_health_percent: f32,
    event_counts: BTreeMap<&'static str, usize>,
    survivors: Vec<SurvivorSummary>,
}

fn event_name(event: &CombatEvent) -> &'static str {
    match event {
        CombatEvent::Attack { .. } => "attack",
        CombatEvent::Hit { .. } => "hit",
        CombatEvent::Blocked { .. } => "blocked",
        CombatEvent::Damaged { .. } => "damaged",
        CombatEvent::Healed { .. } => "healed",
        CombatEvent::DamageDiscarded { .. } => "damage_discarded",
        CombatEvent::Died { .. } => "died",
        CombatEvent::PlayerDefeated { .. } => "player_defeated",
        CombatEvent::Despawned { .. } => "despawned",
        CombatEvent::StateChanged { .. } => "state_changed",
        CombatEvent::FleeStarted { .. } => "flee_started",
        CombatEvent::FormationDissolved { .. } => "formation_dissolved",
        CombatEvent::FormationAdvanced { .. } => "formation_advanced",
        CombatEvent::AllegianceChanged { .. } => "allegiance_changed",
        CombatEvent::AbilityUsed { .. } => "ability_used",
        CombatEvent::WeaponEquipped { .. } => "weapon_equipped",
    }
}

struct Cast {
    player: CombatantId,
}

fn setup(world: &mut World<Sandbox>) -> skirmish::Result<Cast> {
    world.set_fear_destinations(FearDestinations::new(vec![
        Vec2::new(-40.0, 40.0),
        Vec2::new(40.0, 40.0),
        Vec2::new(0.0, 60.0),
        Vec2::new(0.0, -40.0),
    ]));

    let player = world.spawn(
        CombatantBlueprint::player("Hero", "sword")
            .with_armor(ArmorLoadout::full(ArmorId::new("mail")))
            .with_abilities(vec![
                AbilityConfig::new("First Aid", AbilityKind::first_aid()).with_cost(10.0),
                AbilityConfig::new("Battle Roar", AbilityKind::battle_roar()).with_cost(40.0),
                AbilityConfig::new("Aimed Shot", AbilityKind::aimed_shot()),
            ]),
    )?;

    world.spawn(CombatantBlueprint::ai("Town Guard", "spear").at(Vec2::new(3.0, 0.0)))?;

    let bandits = ["Bandit Chief", "Bandit", "Bandit", "Bandit"]
        .iter()
        .map(|name| {
            world.spawn(
                CombatantBlueprint::ai(*name, "axe")
                    .hostile()
                    .with_armor(ArmorLoadout::full(ArmorId::new("leather"))),
            )
        })
        .collect::<skirmish::Result<Vec<_>>>()?;
    world.create_formation(
        FormationBlueprint {
            name: "Bandit Line".into(),
            anchor: Vec2::new(0.0, 20.0),
            facing: Vec2::new(0.0, -1.0),
            slots: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(-2.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(0.0, 2.0),
            ],
            morale: 0.4,
            aggro_distance: 4.0,
            advance: Some(AdvanceOrder {
                to: Vec2::new(0.0, 6.0),
                delay: 2.0,
                trigger_distance: 18.0,
            }),
        },
        bandits,
    )?;

    world.spawn(
        CombatantBlueprint::ai("Archer", "bow")
            .hostile()
            .at(Vec2::new(15.0, 15.0))
            .with_patrol(vec![Vec2::new(15.0, 15.0), Vec2::new(15.0, 25.0), Vec2::new(25.0, 25.0)]),
    )?;

    Ok(Cast { player })
}

/// Stand-in for player input: fight the nearest enemy, heal when hurt
fn drive_player(world: &mut World<Sandbox>, player: CombatantId, roared: &mut bool) {
    if !world.is_alive(player) {
        return;
    }
    let Some(position) = world.env().position(player) else {
        return;
    };

    if world.health_percent(player).unwrap_or(1.0) < 0.5 {
        if let Ok(AbilityOutcome::Used) = world.attempt_ability(player, 0, None) {
            return;
        }
    }

    let nearest = world
        .combatant_ids()
        .iter()
        .filter_map(|&id| {
            let c = world.combatant(id)?;
            if !c.is_alive() || !c.is_enemy {
                return None;
            }
            let distance = world.env().position(id)?.distance(&position);
            Some((id, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let Some((enemy, distance)) = nearest else {
        world.env_mut().stop(player);
        return;
    };

    if !*roared && distance < 6.0 {
        *roared = true;
        if let Err(err) = world.attempt_ability(player, 1, None) {
            tracing::warn!(%err, "battle roar failed");
        }
    }

    if distance > 2.0 {
        if let Some(at) = world.env().position(enemy) {
            world.env_mut().move_towards(player, at);
        }
    } else {
        world.env_mut().stop(player);
        let result = if world.is_attacking(player) {
            world.change_target(player, enemy)
        } else {
            world.start_attacking(player, enemy)
        };
        if let Err(err) = result {
            tracing::warn!(%err, "player attack failed");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = load_combat_config(&args.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load combat config '{}': {}", args.config, e);
        eprintln!("Using default tuning");
        CombatConfig::default()
    });
    let armory = Armory::load(&args.armory).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load armory '{}': {}", args.armory, e);
        eprintln!("Using built-in armory");
        Armory::with_defaults()
    });

    let mut world = World::new(Sandbox::default(), config, armory, seed);
    let cast = match setup(&mut world) {
        Ok(cast) => cast,
        Err(e) => {
            eprintln!("Error: scenario setup failed: {}", e);
            std::process::exit(1);
        }
    };

    let dt = 1.0 / args.tick_hz.max(1) as f32;
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut roared = false;
    let mut ticks_run = 0;

    for _ in 0..args.ticks {
        drive_player(&mut world, cast.player, &mut roared);
        let events = world.tick(dt);
        ticks_run += 1;
        let mut defeated = false;
        for event in &events {
            *counts.entry(event_name(event)).or_insert(0) += 1;
            if args.format == "text" {
                match event {
                    CombatEvent::Died { combatant } => println!("[{:7.2}s] {} died", world.now(), combatant),
                    CombatEvent::FormationDissolved { formation } => {
                        println!("[{:7.2}s] {} dissolved", world.now(), formation)
                    }
                    CombatEvent::FleeStarted { combatant, .. } => {
                        println!("[{:7.2}s] {} flees", world.now(), combatant)
                    }
                    CombatEvent::AbilityUsed { combatant, ability } => {
                        println!("[{:7.2}s] {} used {}", world.now(), combatant, ability)
                    }
                    _ => {}
                }
            }
            defeated |= matches!(event, CombatEvent::PlayerDefeated { .. });
        }
        if defeated {
            break;
        }
    }

    let survivors = world
        .combatant_ids()
        .iter()
        .filter_map(|&id| {
            let c = world.combatant(id)?;
            c.is_alive().then(|| SurvivorSummary {
                id,
                name: c.name.clone(),
                health_percent: c.health.percent(),
                state: world.state(id),
            })
        })
        .collect();

    let summary = SkirmishSummary {
        seed,
        ticks: ticks_run,
        seconds: world.now(),
        player_alive: world.is_alive(cast.player),
        player_health_percent: world.health_percent(cast.player).unwrap_or(0.0),
        event_counts: counts,
        survivors,
    };

    if args.format == "json" {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!();
        println!("=== Skirmish summary (seed {}) ===", summary.seed);
        println!("Simulated {:.1}s over {} ticks", summary.seconds, summary.ticks);
        println!(
            "Player: {} ({:.0}% health)",
            if summary.player_alive { "alive" } else { "defeated" },
            summary.player_health_percent * 100.0
        );
        for (name, count) in &summary.event_counts {
            println!("  {:<20} {}", name, count);
        }
        println!("Survivors:");
        for s in &summary.survivors {
            let state = s.state.map_or_else(|| "player".to_string(), |st| st.to_string());
            println!("  {} {:<14} {:>4.0}%  {}", s.id, s.name, s.health_percent * 100.0, state);
        }
    }
}
