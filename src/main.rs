//! Uphill headless driver
//!
//! An external collaborator around the simulation core: owns the wall clock,
//! the scheduler cadences (auto pushes, autosave) and file persistence. Runs
//! a fixed-step simulated session and prints where the boulder ended up.
//!
//! Usage: `uphill [seconds]` - simulated session length, default 120.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use uphill::consts::DEFAULT_TICK_DT;
use uphill::{Game, SaveSnapshot};

/// Save file next to the working directory
const SAVE_PATH: &str = "uphill_save.json";

/// Autosave cadence in simulated seconds
const AUTOSAVE_INTERVAL: f32 = 30.0;

/// The demo player mashes the push button this often
const MANUAL_PUSH_INTERVAL: f32 = 0.25;

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn load_save(path: &Path) -> Option<SaveSnapshot> {
    let json = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            log::warn!("Save file unreadable ({err}), starting fresh");
            None
        }
    }
}

fn write_save(path: &Path, game: &Game) {
    let snapshot = game.snapshot(unix_now());
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            if let Err(err) = fs::write(path, json) {
                log::warn!("Failed to write save: {err}");
            } else {
                log::info!("Game saved (distance {:.1})", snapshot.distance);
            }
        }
        Err(err) => log::warn!("Failed to serialize save: {err}"),
    }
}

/// Buy the cheapest affordable unlocked upgrade, if any
fn greedy_purchase(game: &mut Game) {
    use uphill::catalog::{PrestigeId, UpgradeId};

    let pick = UpgradeId::ALL
        .iter()
        .filter(|&&id| game.is_unlocked(id))
        .filter_map(|&id| game.cost(id).map(|cost| (id, cost)))
        .filter(|&(_, cost)| cost <= game.grit())
        .min_by_key(|&(_, cost)| cost);
    if let Some((id, _)) = pick {
        game.purchase(id);
    }

    let prestige_pick = PrestigeId::ALL
        .iter()
        .filter_map(|&id| game.prestige_cost(id).map(|cost| (id, cost)))
        .filter(|&(_, cost)| cost <= game.favors())
        .min_by_key(|&(_, cost)| cost);
    if let Some((id, _)) = prestige_pick {
        game.purchase_prestige(id);
    }
}

fn main() {
    env_logger::init();
    log::info!("Uphill starting...");

    let session_secs: f32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(120.0);

    let seed = unix_now() as u64;
    let mut game = Game::new(seed);

    // Wire a few signals to the log so the subscription surface is visible
    game.critical_hit()
        .connect(|power| log::debug!("Critical push! effective {power:.1}"));
    game.upgrade_unlocked()
        .connect(|id| log::info!("Upgrade unlocked: {id:?}"));
    game.upgrade_purchased()
        .connect(|(id, level)| log::info!("Bought {id:?} -> level {level}"));
    game.prestige_available()
        .connect(|_| log::info!("Prestige available!"));
    game.prestige_completed()
        .connect(|favors| log::info!("Prestige complete: +{favors} favors"));

    // Continue from disk when there's a valid save, and pay out the absence
    let save_path = Path::new(SAVE_PATH);
    if let Some(snapshot) = load_save(save_path) {
        let saved_at = snapshot.saved_at;
        if game.load_snapshot(&snapshot) {
            let elapsed = unix_now() - saved_at;
            if let Some(gain) = game.apply_offline_progress(&snapshot, elapsed) {
                log::info!(
                    "Welcome back: +{:.1} distance, +{} grit while away",
                    gain.distance,
                    gain.grit
                );
            }
        }
    } else {
        log::info!("New game with seed {seed}");
    }

    // Fixed-step session. The core has no timers, so all cadences live here:
    // manual pushes, auto pushes at the ledger's rate, autosave.
    let mut elapsed = 0.0f32;
    let mut manual_accum = 0.0f32;
    let mut auto_accum = 0.0f32;
    let mut autosave_accum = 0.0f32;

    while elapsed < session_secs {
        game.tick(DEFAULT_TICK_DT);
        elapsed += DEFAULT_TICK_DT;
        manual_accum += DEFAULT_TICK_DT;
        autosave_accum += DEFAULT_TICK_DT;

        if manual_accum >= MANUAL_PUSH_INTERVAL {
            manual_accum -= MANUAL_PUSH_INTERVAL;
            game.manual_push();
            greedy_purchase(&mut game);
        }

        // Auto pushes accumulate at the current rate; rate 0 never fires
        auto_accum += game.auto_push_rate() * DEFAULT_TICK_DT;
        while auto_accum >= 1.0 {
            auto_accum -= 1.0;
            game.auto_push();
        }

        if game.prestige_eligible() {
            game.execute_prestige();
        }

        if autosave_accum >= AUTOSAVE_INTERVAL {
            autosave_accum -= AUTOSAVE_INTERVAL;
            write_save(save_path, &game);
        }
    }

    write_save(save_path, &game);

    println!("Session over after {session_secs:.0} simulated seconds:");
    println!("  distance  {:.1}", game.distance());
    println!("  slope     {:.2}", game.slope());
    println!("  grit      {}", game.grit());
    println!("  favors    {}", game.favors());
    println!("  prestiges {}", game.prestige_count());
}
