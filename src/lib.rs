pub mod component;
pub mod config;
pub mod cue;
pub mod error;
pub mod init;
pub mod menu;
pub mod repository;
pub mod signal;
pub mod storage;
pub mod tools;

pub use error::{IngestError, Result};
pub use repository::Repository;

use console::{Term, style};

pub fn pause(term: &Term) -> anyhow::Result<()> {
    println!("\n{}", style("Press Enter to continue...").dim());
    term.read_line()?;
    Ok(())
}
