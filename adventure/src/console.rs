//! Line-oriented player input.
//!
//! Reads one command per line from stdin:
//! - `attack <n>` attacks enemy `n` (1-based)
//! - `cast <spell> <side><n>` casts at `e2` (enemy 2) or `p1` (party member 1)
//! - `item <name>` or `item <name> <side><n>` uses an item
//! - `flee` tries to run
//! - `#status` prints both parties, `#quit` stops asking and hands over to autopilot

use adventure_core::{
    Action, AutoPilot, BattleView, CombatantRef, CommandSource, Faction, Rejection,
};
use std::io::{self, BufRead, Write};

/// Player commands typed on stdin.
#[derive(Debug, Default)]
pub struct StdinCommands {
    /// Set once input ends or the player quits.
    autopilot: bool,
}

impl StdinCommands {
    pub fn new() -> Self {
        Self { autopilot: false }
    }

    fn prompt(view: &BattleView<'_>) {
        let name = view
            .active_entity()
            .map(|e| e.name.as_str())
            .unwrap_or("?");
        print!("[Round {}] {name}> ", view.round);
        let _ = io::stdout().flush();
    }

    fn print_status(view: &BattleView<'_>) {
        println!("[STATUS]");
        for line in view.player.status_lines() {
            println!("  {line}");
        }
        for line in view.enemy.status_lines() {
            println!("  {line}");
        }
        if let Some(actor) = view.active_entity() {
            let spells: Vec<_> = actor.spells().map(|s| s.name.as_str()).collect();
            if !spells.is_empty() {
                println!("  Spells: {}", spells.join(", "));
            }
            if let Some(inventory) = actor.inventory() {
                let items: Vec<_> = inventory
                    .iter()
                    .map(|(name, count)| format!("{name} x{count}"))
                    .collect();
                println!("  Items: {}", items.join(", "));
            }
        }
    }
}

impl CommandSource for StdinCommands {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action {
        let stdin = io::stdin();
        while !self.autopilot {
            Self::prompt(view);
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    self.autopilot = true;
                    break;
                }
                Ok(_) => {}
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                "#status" => Self::print_status(view),
                "#quit" => {
                    println!("Handing over to autopilot.");
                    self.autopilot = true;
                }
                _ => match parse_action(line) {
                    Some(action) => return action,
                    None => println!("[ERROR] Unrecognised command: {line}"),
                },
            }
        }
        AutoPilot.next_action(view)
    }

    fn rejected(&mut self, reason: &Rejection) -> bool {
        if self.autopilot {
            return false;
        }
        println!("[ERROR] {reason}. Try again.");
        true
    }
}

/// Parse one command line into an action.
fn parse_action(line: &str) -> Option<Action> {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match verb.to_ascii_lowercase().as_str() {
        "flee" | "run" => Some(Action::Flee),
        "attack" | "a" => {
            let n: usize = rest.parse().ok()?;
            Some(Action::attack(n.checked_sub(1)?))
        }
        "cast" | "c" => {
            let (spell, target) = rest.rsplit_once(' ')?;
            Some(Action::cast(spell.trim(), parse_target(target)?))
        }
        "item" | "use" | "i" => match rest.rsplit_once(' ').and_then(|(name, t)| {
            parse_target(t).map(|target| (name.trim(), target))
        }) {
            Some((name, target)) => Some(Action::use_item(name, Some(target))),
            None if !rest.is_empty() => Some(Action::use_item(rest, None)),
            None => None,
        },
        _ => None,
    }
}

/// `e2` is enemy 2, `p1` is party member 1.
fn parse_target(token: &str) -> Option<CombatantRef> {
    let token = token.trim();
    let side = match token.chars().next()?.to_ascii_lowercase() {
        'e' => Faction::Enemy,
        'p' => Faction::Player,
        _ => return None,
    };
    let n: usize = token[1..].parse().ok()?;
    Some(CombatantRef {
        side,
        index: n.checked_sub(1)?,
    })
}
