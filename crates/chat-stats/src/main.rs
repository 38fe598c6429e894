mod bootstrap;
mod table_view;

use anyhow::{Context, Result};
use stats_core::settings::Settings;
use stats_data::analysis::analyze_conversations;
use stats_data::loader::{ConversationLoader, LoaderConfig};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("chat-stats v{} starting", env!("CARGO_PKG_VERSION"));

    let inbox = bootstrap::resolve_inbox(settings.inbox.as_ref())?;
    let granularity = settings.granularity();
    tracing::info!(
        "Inbox: {}, View: {}, Granularity: {}",
        inbox.display(),
        settings.view,
        granularity
    );

    let loader =
        ConversationLoader::new(LoaderConfig::new(&inbox).with_repair_text(!settings.no_repair));

    let analysis = analyze_conversations(&loader, &settings.chats, granularity, settings.top)
        .with_context(|| format!("failed to analyse conversations in {}", inbox.display()))?;

    let output = if settings.wants_json() {
        match settings.view.as_str() {
            "senders" | "period" | "summary" => serde_json::to_string_pretty(&analysis)?,
            "merged" => serde_json::to_string_pretty(&analysis.merged)?,
            "cumulative" => serde_json::to_string_pretty(&analysis.cumulative)?,
            unknown => anyhow::bail!("Unknown view: {}", unknown),
        }
    } else {
        match settings.view.as_str() {
            "summary" => table_view::render_summary(&analysis),
            "senders" => table_view::render_senders(&analysis),
            "period" => table_view::render_periods(&analysis),
            "merged" => table_view::render_merged(
                &analysis.merged,
                &format!("Messages per {}", granularity),
            ),
            "cumulative" => table_view::render_merged(
                &analysis.cumulative,
                &format!("Cumulative messages per {}", granularity),
            ),
            unknown => anyhow::bail!("Unknown view: {}", unknown),
        }
    };

    println!("{}", output);
    Ok(())
}
