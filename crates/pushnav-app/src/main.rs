//! `pushnav` replays a scripted navigation session headless.
//!
//! Usage: `pushnav <session.toml>`. Each step's outcome is logged, followed
//! by the final history stack, cache contents and region contents. Set
//! `RUST_LOG=debug` to trace cache and sequencing decisions.

mod session;

use anyhow::{Context, Result};

use pushnav_core::HistoryStack;
use session::{Replay, Session, Step};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PUSHNAV_SESSION").ok())
        .context("usage: pushnav <session.toml>")?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let session = Session::from_toml(&text)?;
    log::info!(
        "Replaying {path} ({} steps, {} pages)",
        session.steps.len(),
        session.pages.len()
    );

    let mut replay = Replay::new(&session)?;
    for (i, line) in session.steps.iter().enumerate() {
        let step: Step = line
            .parse()
            .with_context(|| format!("step {}: '{line}'", i + 1))?;
        let outcome = replay
            .step(&step)
            .with_context(|| format!("step {}: '{line}'", i + 1))?;
        log::info!("{:>3}. {line:<32} {outcome:?}", i + 1);
        for diag in replay.engine.take_diagnostics() {
            log::warn!("     {diag}");
        }
    }

    let engine = &replay.engine;
    let history = engine.history();
    log::info!("History ({} entries):", history.len());
    for (i, entry) in history.entries().iter().enumerate() {
        let marker = if i == history.current_index() { '>' } else { ' ' };
        log::info!("  {marker} {}", entry.url);
    }

    log::info!(
        "Cache ({} entries, {:?}):",
        engine.cache().size(),
        engine.cache().policy()
    );
    for url in engine.cache().urls() {
        log::info!("    {url}");
    }

    log::info!("Regions:");
    for region in &session.regions {
        let content = engine.dom().content_of(&region.id).unwrap_or("");
        log::info!("    #{}: {content}", region.id);
    }

    if engine.queued() > 0 {
        log::warn!(
            "{} navigation(s) still waiting on fetches: {:?}",
            engine.queued(),
            engine.http().requests().collect::<Vec<_>>()
        );
    }

    Ok(())
}
