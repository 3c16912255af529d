use crate::component::registration::RegistrationOutcome;
use crate::component::storyboard_builder::StoryboardOutcome;
use crate::config::KeyframeStrategy;
use crate::pause;
use crate::repository::Repository;
use crate::storage::{VideoRecord, VideoStore};
use crate::tools::resolve_relative;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct BatchSummary {
    created: usize,
    unchanged: usize,
    moved: usize,
    failed: usize,
}

fn progress_bar(len: usize, message: &'static str) -> ProgressBar {
    let progress_bar = ProgressBar::new(len as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    progress_bar.set_message(message);
    progress_bar
}

fn print_error(e: impl std::fmt::Display) {
    eprintln!("{} {}", style("Error:").red().bold(), e);
}

fn print_interrupted(shutdown_signal: &AtomicBool, aborted: bool) {
    if aborted {
        println!("{}", style("Batch stopped after a configuration error.").red());
    } else if shutdown_signal.load(Ordering::SeqCst) {
        println!("{}", style("Batch interrupted; remaining videos were skipped.").yellow());
    }
}

pub fn run_register_all(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    repo: &Repository,
) -> Result<()> {
    if let Err(e) = register_all(shutdown_signal, repo) {
        print_error(e);
    }
    pause(term)?;
    Ok(())
}

fn register_all(shutdown_signal: &Arc<AtomicBool>, repo: &Repository) -> Result<()> {
    let videos = repo.scan();
    if videos.is_empty() {
        println!(
            "{} {}",
            style("No video files found under").yellow(),
            repo.layout().root().display()
        );
        return Ok(());
    }
    println!("{} {} video files", style("Found").cyan(), videos.len());

    let mut run = repo
        .batch(Arc::clone(shutdown_signal))
        .with_progress(progress_bar(videos.len(), "Registering..."))
        .register_all(Arc::clone(repo.pipeline()), videos)?;

    let mut summary = BatchSummary::default();
    for item in run.by_ref() {
        match item.result {
            Ok(RegistrationOutcome::Registered(_)) => summary.created += 1,
            Ok(RegistrationOutcome::Unchanged(_)) => summary.unchanged += 1,
            Ok(RegistrationOutcome::Moved { .. }) => summary.moved += 1,
            Err(_) => summary.failed += 1,
        }
    }

    println!();
    print_interrupted(shutdown_signal, run.aborted());
    println!("{}", style("Registration finished").cyan().bold());
    println!("  {} {}", style("Registered:").green(), summary.created);
    println!("  {} {}", style("Already present:").dim(), summary.unchanged);
    println!("  {} {}", style("Moved:").cyan(), summary.moved);
    println!("  {} {}", style("Failed:").red(), summary.failed);
    Ok(())
}

pub fn run_generate_storyboards(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    repo: &Repository,
) -> Result<()> {
    if let Err(e) = generate_storyboards(shutdown_signal, repo) {
        print_error(e);
    }
    pause(term)?;
    Ok(())
}

fn generate_storyboards(shutdown_signal: &Arc<AtomicBool>, repo: &Repository) -> Result<()> {
    let records = repo.store().list_all()?;
    if records.is_empty() {
        println!("{}", style("No registered videos. Register some first.").yellow());
        return Ok(());
    }

    let force = Confirm::new()
        .with_prompt("Regenerate storyboards that already exist?")
        .default(false)
        .interact()?;

    let paths: Vec<PathBuf> = records
        .iter()
        .map(|record| resolve_relative(repo.layout().root(), &record.file_path))
        .collect();

    let mut run = repo
        .batch(Arc::clone(shutdown_signal))
        .with_progress(progress_bar(paths.len(), "Building storyboards..."))
        .storyboard_all(Arc::clone(repo.storyboards()), paths, force)?;

    let mut summary = BatchSummary::default();
    let mut tiles = 0;
    for item in run.by_ref() {
        match item.result {
            Ok(StoryboardOutcome::Created(manifest)) => {
                summary.created += 1;
                tiles += manifest.tiles().len();
            }
            Ok(StoryboardOutcome::AlreadyExists) => summary.unchanged += 1,
            Err(_) => summary.failed += 1,
        }
    }

    println!();
    print_interrupted(shutdown_signal, run.aborted());
    println!("{}", style("Storyboards finished").cyan().bold());
    println!(
        "  {} {} ({} tiles)",
        style("Created:").green(),
        summary.created,
        tiles
    );
    println!("  {} {}", style("Already present:").dim(), summary.unchanged);
    println!("  {} {}", style("Failed:").red(), summary.failed);
    Ok(())
}

pub fn run_unregister(term: &Term, repo: &Repository) -> Result<()> {
    if let Err(e) = unregister(term, repo) {
        print_error(e);
    }
    pause(term)?;
    Ok(())
}

const ENTER_PATH: &str = "Enter a file path...";

/// Menu line for one record. The id is shown so identical titles stay apart.
fn record_label(record: &VideoRecord) -> String {
    let short_id = record.id.get(..8).unwrap_or(&record.id);
    format!("{} ({}) [{short_id}]", record.title, record.file_path)
}

/// Lets the user pick a registered video, or type the path of one. Picking
/// works even when the source file has been deleted.
fn unregister(term: &Term, repo: &Repository) -> Result<()> {
    let records = repo.store().list_all()?;
    let mut items: Vec<String> = records.iter().map(record_label).collect();
    items.push(ENTER_PATH.to_string());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Video to unregister")
        .items(&items)
        .default(0)
        .interact_on_opt(term)?;
    let Some(selection) = selection else {
        return Ok(());
    };

    match records.get(selection) {
        Some(record) => confirm_and_unregister(&record_label(record), || {
            repo.pipeline().unregister(&record.id)
        }),
        None => {
            let path = prompt_video_path(repo)?;
            confirm_and_unregister(&path.display().to_string(), || {
                repo.pipeline().unregister_path(&path)
            })
        }
    }
}

fn prompt_video_path(repo: &Repository) -> Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("Path of the video to unregister")
        .interact_text()?;
    let path = PathBuf::from(path.trim());
    Ok(if path.is_relative() {
        repo.layout().root().join(path)
    } else {
        path
    })
}

fn confirm_and_unregister(
    target: &str,
    unregister: impl FnOnce() -> crate::Result<VideoRecord>,
) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Remove {target} and its generated assets?"))
        .default(false)
        .interact()?;
    if !confirmed {
        return Ok(());
    }

    let record = unregister()?;
    println!(
        "{} {} ({})",
        style("Unregistered").green(),
        record.title,
        style(&record.id).dim()
    );
    Ok(())
}

pub fn run_list_videos(term: &Term, repo: &Repository) -> Result<()> {
    match repo.store().list_all() {
        Ok(records) if records.is_empty() => {
            println!("{}", style("No registered videos.").yellow());
        }
        Ok(records) => {
            println!("{}", style(format!("{} registered videos", records.len())).cyan());
            println!();
            for record in &records {
                println!(
                    "  {} {} ({}s, {}x{})",
                    style(&record.id).dim(),
                    record.title,
                    record.duration_seconds,
                    record.resolution.width,
                    record.resolution.height
                );
                println!("    {}", style(&record.file_path).dim());
            }
        }
        Err(e) => print_error(e),
    }
    pause(term)?;
    Ok(())
}

/// Picks the storyboard keyframe strategy. Returns the new strategy when it
/// changed and was saved.
pub fn run_strategy_settings(term: &Term, repo: &Repository) -> Result<Option<KeyframeStrategy>> {
    term.clear_screen()?;

    let current = repo.config().storyboard.strategy;
    println!("{}", style("Storyboard keyframes").cyan().bold());
    println!("\n{} {:?}\n", style("Current:").dim(), current);

    let strategies = [
        KeyframeStrategy::Keyframes,
        KeyframeStrategy::Uniform,
        KeyframeStrategy::Scene,
    ];
    let items = [
        "Encoded keyframes",
        "Evenly spaced samples",
        "Scene changes",
    ];
    let default_index = strategies.iter().position(|&s| s == current).unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose how storyboard frames are picked")
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(None);
    };
    let selected = strategies[selection];
    if selected == current {
        return Ok(None);
    }

    let mut config = repo.config().clone();
    config.storyboard.strategy = selected;
    config.save(repo.layout().root())?;
    println!("\n{} {:?}", style("Saved:").green(), selected);
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(Some(selected))
}
