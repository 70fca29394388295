use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "noticast",
    version,
    about = "Read and listen to the news feed from the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    List,
    Tui,
}
