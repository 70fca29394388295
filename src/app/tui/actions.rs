use std::process::{Command as ProcessCommand, Stdio};
use std::sync::mpsc;

use anyhow::{Context, Result};
use ratatui::widgets::TableState;

use super::super::news::{NewsItem, fetch_all_news, truncate};
use super::FeedState;

#[derive(Debug)]
pub(super) struct FeedFetchResult {
    pub(super) items: Vec<NewsItem>,
    pub(super) warning: Option<String>,
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(super) fn spawn_feed_fetch(tx: &mpsc::Sender<FeedFetchResult>) {
    let tx = tx.clone();
    std::thread::spawn(move || {
        let fetch = fetch_all_news();
        let warning = (!fetch.warnings.is_empty()).then(|| fetch.warnings.join(" | "));
        let _ = tx.send(FeedFetchResult {
            items: fetch.items,
            warning,
        });
    });
}

pub(super) fn drain_feed_results(
    rx: &mpsc::Receiver<FeedFetchResult>,
    items: &mut Vec<NewsItem>,
    feed_state: &mut FeedState,
    table_state: &mut TableState,
    status: &mut String,
) {
    while let Ok(result) = rx.try_recv() {
        *items = result.items;
        // An errored fetch and an empty feed render the same; only the
        // status line tells them apart.
        *feed_state = FeedState::Ready;
        table_state.select((!items.is_empty()).then_some(0));
        *status = match &result.warning {
            Some(warning) => status_error(warning),
            None if items.is_empty() => status_info("No news items available."),
            None => status_info("Ready."),
        };
    }
}

pub(super) fn open_source_link(item: &NewsItem) -> Result<String> {
    let Some(source) = item.source.as_deref() else {
        return Ok("This item has no source link.".to_string());
    };
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    ProcessCommand::new(opener)
        .arg(source)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to launch {opener}"))?;
    Ok(format!("Opened source: {}", truncate(source, 60)))
}
