use anyhow::{Context, Result};
use console::{Term, style};
use log::{info, warn};
use media_ingest::Repository;
use media_ingest::init;
use media_ingest::menu::show_main_menu;
use media_ingest::signal::setup_shutdown_signal;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal();

    let root = match env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => env::current_dir().context("cannot read the current directory")?,
    };
    let mut repo = Repository::open(&root)
        .with_context(|| format!("cannot open repository at {}", root.display()))?;

    loop {
        match show_main_menu(&term, &shutdown_signal, &mut repo) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("Goodbye!").green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style("Error:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
