//! Console driver for the adventure combat engine.
//!
//! Builds a player party and an enemy party from command-line flags, fights
//! one encounter and prints the battle log.
//!
//! ```bash
//! cargo run -p adventure -- --hero mage --companion healer --enemy goblin --enemy orc --seed 7
//! cargo run -p adventure -- --hero warrior --boss troll --level 3 --interactive
//! ```

mod console;

use adventure_core::{
    AutoPilot, BattleResult, CommandSource, Entity, EntityKind, HeadlessBattle, HeadlessConfig,
    Party, SaveSlot, SaveStore,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Fight one encounter from the command line
#[derive(Parser, Debug)]
#[command(name = "adventure")]
#[command(about = "Turn-based party combat in the terminal", long_about = None)]
#[command(version)]
struct Args {
    /// Player class (warrior, mage, archer)
    #[arg(long, default_value = "warrior")]
    hero: EntityKind,

    /// Player character name
    #[arg(long, default_value = "Hero")]
    name: String,

    /// Recruit a companion (fighter, healer, rogue); repeatable
    #[arg(long = "companion", value_name = "KIND")]
    companions: Vec<EntityKind>,

    /// Add an enemy (ogre, goblin, orc); repeatable
    #[arg(long = "enemy", value_name = "KIND")]
    enemies: Vec<EntityKind>,

    /// Add a boss (dragon, troll, giant)
    #[arg(long)]
    boss: Option<EntityKind>,

    /// Starting level for the hero and companions
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// RNG seed for a reproducible encounter
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many turns
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Choose the player side's actions on stdin
    #[arg(long)]
    interactive: bool,

    /// Autosave the hero into this directory after the encounter
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Location recorded in the save file
    #[arg(long, default_value = "Dark Forest")]
    location: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (mut heroes, mut foes) = build_parties(&args)?;

    println!("=== Encounter ===");
    print_status(&heroes, &foes);
    println!();

    let config = HeadlessConfig::new().with_max_turns(args.max_turns);
    let config = match args.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    };
    let battle = HeadlessBattle::new(config);

    let player_source: Box<dyn CommandSource> = if args.interactive {
        Box::new(console::StdinCommands::new())
    } else {
        Box::new(AutoPilot)
    };
    let report = battle
        .run(&mut heroes, &mut foes, player_source, AutoPilot)
        .context("Could not start the encounter")?;

    for line in &report.log {
        println!("{line}");
    }
    println!();
    println!(
        "Result: {:?} after {} turns ({} rounds, seed {})",
        report.result, report.turns, report.rounds, report.seed
    );
    print_status(&heroes, &foes);

    if let Some(dir) = &args.save_dir {
        if report.result != BattleResult::Defeat {
            let hero = heroes.member(0).context("Player party is empty")?;
            let store = SaveStore::new(dir).await?;
            let path = store.save(hero, &args.location, SaveSlot::Auto).await?;
            info!(path = %path.display(), "Autosaved");
            println!("[SAVED] {}", path.display());
        }
    }

    Ok(())
}

fn build_parties(args: &Args) -> Result<(Party, Party)> {
    let mut heroes = Party::player();
    heroes
        .add_member(Entity::new(&args.name, args.hero, args.level))
        .with_context(|| format!("{} cannot lead the party", args.hero))?;
    for kind in &args.companions {
        heroes
            .add_member(Entity::new(kind.name(), *kind, args.level))
            .with_context(|| format!("Cannot recruit {kind}"))?;
    }

    let mut foes = Party::enemy();
    let enemies = if args.enemies.is_empty() && args.boss.is_none() {
        vec![EntityKind::Goblin]
    } else {
        args.enemies.clone()
    };
    for kind in enemies {
        foes.add_member(Entity::scaled_enemy(kind.name(), kind, args.level))
            .with_context(|| format!("Cannot add {kind} to the enemy party"))?;
    }
    if let Some(kind) = args.boss {
        foes.add_member(Entity::scaled_boss(kind.name(), kind, args.level, heroes.len()))
            .with_context(|| format!("Cannot add {kind} to the enemy party"))?;
    }

    Ok((heroes, foes))
}

fn print_status(heroes: &Party, foes: &Party) {
    println!("Party:");
    for line in heroes.status_lines() {
        println!("  {line}");
    }
    println!("Enemies:");
    for line in foes.status_lines() {
        println!("  {line}");
    }
}
