use std::path::PathBuf;

use clap::Parser;

use crate::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Meme idea to generate from right away
    #[arg(short, long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// JSON file of example memes, overriding the bundled templates
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Completion calls allowed per meme
    #[arg(short, long, value_name = "N")]
    pub attempts: Option<usize>,

    /// Keep events in memory instead of writing them to disk
    #[arg(long)]
    pub dry_run: bool,

    /// Event database (or JSON-lines file) to write to
    #[arg(long, value_name = "FILE", conflicts_with = "dry_run")]
    pub events: Option<PathBuf>,
}
