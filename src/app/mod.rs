mod news;
mod playback;
mod player;
mod process;
mod readmarks;
mod tui;


use anyhow::Result;

use crate::cli::{Cli, Command};
use crate::db::Database;
use crate::paths::database_file_path;

use self::news::{fetch_all_news, format_published_display, truncate};
use self::readmarks::load_read_marks;

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;

    match cli.command {
        Some(Command::List) => run_list(&db)?,
        Some(Command::Tui) | None => tui::run_tui(&db)?,
    }

    Ok(())
}

fn run_list(db: &Database) -> Result<()> {
    let marks_read = load_read_marks(db);
    for warning in &marks_read.warnings {
        eprintln!("Warning: {warning}");
    }

    let fetch = fetch_all_news();
    for warning in &fetch.warnings {
        eprintln!("Warning: {warning}");
    }
    if fetch.items.is_empty() {
        println!("No news items available.");
        return Ok(());
    }

    println!(
        "{:<8} {:<48} {:<18} {:<12} {:<12} {:<5}",
        "ID", "TITLE", "PUBLISHER", "DATE", "MEDIA", "READ"
    );
    for item in &fetch.items {
        let media = match (item.has_audio(), item.has_video()) {
            (true, true) => "audio+video",
            (true, false) => "audio",
            (false, true) => "video",
            (false, false) => "-",
        };
        println!(
            "{:<8} {:<48} {:<18} {:<12} {:<12} {:<5}",
            item.id,
            truncate(&item.title, 48),
            truncate(item.publisher.as_deref().unwrap_or("-"), 18),
            item.published_at
                .as_deref()
                .map(format_published_display)
                .unwrap_or_else(|| "-".to_string()),
            media,
            if marks_read.marks.is_read(item.id) {
                "yes"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
