use crate::menu::handlers::{
    run_generate_storyboards, run_list_videos, run_register_all, run_strategy_settings,
    run_unregister,
};
use crate::repository::Repository;
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Shows the main menu once. Returns `false` when the user chose to exit.
pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    repo: &mut Repository,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("Media ingest").cyan().bold());
    println!("{}", style(repo.layout().root().display()).dim());
    println!("{}", style("Press ESC to exit").dim());

    let options = [
        "Register all videos",
        "Generate storyboards",
        "Unregister a video",
        "List registered videos",
        "Storyboard settings",
        "Exit",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select an action")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => run_register_all(term, shutdown_signal, repo)?,
        Some(1) => run_generate_storyboards(term, shutdown_signal, repo)?,
        Some(2) => run_unregister(term, repo)?,
        Some(3) => run_list_videos(term, repo)?,
        Some(4) => {
            if run_strategy_settings(term, repo)?.is_some() {
                *repo = Repository::open(repo.layout().root())?;
            }
        }
        Some(5) | None => return Ok(false),
        _ => unreachable!(),
    }

    Ok(true)
}
