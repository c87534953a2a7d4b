//! Mobridge host binary
//!
//! Boots a script runtime, installs the `Sys*` bridge globals backed by
//! a shared buffer arena, and runs the script file given on the command
//! line. Settings come from an optional `mobridge.json` beside the script.

mod settings;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context as _, Result};
use tracing_subscriber::EnvFilter;

use mobridge_memory::BufferArena;
use mobridge_script::{register_bridge, ScriptRuntime, SharedArena};

use settings::Settings;

fn main() -> Result<()> {
    let script_path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => bail!("usage: mobridge <script.js>"),
    };

    let settings_path = script_path.with_file_name("mobridge.json");
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log.filter.clone())),
        )
        .init();

    tracing::info!("Mobridge v{}", mobridge_memory::VERSION);

    let arena: SharedArena = Rc::new(RefCell::new(BufferArena::new()));
    let runtime = ScriptRuntime::new().context("creating script runtime")?;
    register_bridge(&runtime, arena.clone()).context("installing bridge globals")?;

    tracing::info!(script = %script_path.display(), "running script");
    runtime
        .execute_file(&script_path)
        .with_context(|| format!("running {}", script_path.display()))?;

    if let Some(entry) = &settings.entry_function {
        tracing::info!(entry, "calling entry function");
        runtime
            .call_function(entry)
            .with_context(|| format!("calling entry function {entry}"))?;
    }

    let live = arena.borrow().live_count();
    if live > 0 {
        tracing::warn!(live, "script exited with live buffers");
    }

    Ok(())
}
