mod helper;
mod logging;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use kiln_application::{CommandOutcome, Shell};
use kiln_engine::KilnEngine;
use kiln_infrastructure::{ConfigService, DirSubmissionRepository};

use crate::helper::ReplHelper;

/// Interactive Kiln shell.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Interactive Kiln language shell")]
struct Cli {
    /// Configuration file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding stored submissions.
    #[arg(long = "store-dir")]
    store_dir: Option<PathBuf>,
    /// Start with an empty session instead of replaying stored submissions.
    #[arg(long = "no-replay")]
    no_replay: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigService::new(cli.config)?.load()?;
    let _log_guard = logging::init(&config);

    let store = match cli.store_dir.or_else(|| config.store_dir.clone()) {
        Some(directory) => DirSubmissionRepository::new(directory),
        None => DirSubmissionRepository::default_location()?,
    };
    tracing::info!("[Store] Using {}", store.directory().display());

    let engine = Arc::new(KilnEngine::new());
    let mut shell = Shell::new(engine.clone(), Box::new(store), io::stdout());
    shell.set_show_tree(config.show_tree);
    shell.set_show_program(config.show_program);

    let mut rl: Editor<ReplHelper<KilnEngine>, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper::new(engine, shell.command_names())));

    if config.replay_on_start && !cli.no_replay {
        shell.replay()?;
    }

    loop {
        match rl.readline(&config.prompt) {
            Ok(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(text.as_str());

                match shell.submit(&text)? {
                    CommandOutcome::Continue => {}
                    CommandOutcome::ClearScreen => rl.clear_screen()?,
                    CommandOutcome::Exit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Input cancelled (use :exit or Ctrl-D to quit)".bright_black());
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!("[Session] Exiting");
    Ok(())
}
