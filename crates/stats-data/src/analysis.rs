//! Multi-conversation analysis pipeline.
//!
//! Loads the requested conversations, ranks them by size and produces the
//! per-conversation summaries plus the merged and cumulative period tables,
//! ready for printing or plotting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use stats_core::error::Result;
use stats_core::formatting::percentage;
use stats_core::models::{Conversation, ThreadType};
use stats_core::time_utils::Granularity;
use tracing::{info, warn};

use crate::aggregator::{ConversationAggregator, MergedPeriodTable, PeriodCount, SenderStats};
use crate::loader::ConversationLoader;

// ── Public types ──────────────────────────────────────────────────────────────

/// Statistics for one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub thread_type: ThreadType,
    /// Records of every kind.
    pub record_count: usize,
    /// Share of all analysed records, in percent (two decimals).
    pub share_of_total: f64,
    /// `Generic` records.
    pub message_count: usize,
    /// `Call` records.
    pub call_count: usize,
    /// Summed call length in seconds.
    pub total_call_seconds: f64,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub senders: Vec<SenderStats>,
    /// Sparse counts at the analysis granularity.
    pub periods: Vec<PeriodCount>,
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    pub granularity: Granularity,
    /// Conversations that went into the tables.
    pub conversations_analyzed: usize,
    /// Conversations skipped because they hold no records.
    pub conversations_skipped: usize,
    pub records_processed: usize,
    /// Wall-clock seconds spent loading and parsing documents.
    pub load_time_seconds: f64,
}

/// The complete output of [`analyze_conversations`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    /// Largest conversation first.
    pub conversations: Vec<ConversationSummary>,
    pub merged: MergedPeriodTable,
    pub cumulative: MergedPeriodTable,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Load the conversations named by `ids`, or every conversation in the
///    inbox when `ids` is empty.
/// 2. Drop conversations without records (they have no count distribution).
/// 3. Rank by record count and keep the `top` largest when set.
/// 4. Summarise each conversation and merge their period counts.
pub fn analyze_conversations(
    loader: &ConversationLoader,
    ids: &[String],
    granularity: Granularity,
    top: Option<usize>,
) -> Result<AnalysisResult> {
    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let loaded = if ids.is_empty() {
        loader.load_all()?
    } else {
        ids.iter()
            .map(|id| loader.load_conversation(id))
            .collect::<Result<Vec<_>>>()?
    };
    let load_time = load_start.elapsed().as_secs_f64();

    // ── Step 2: Skip empty conversations ──────────────────────────────────────
    let loaded_count = loaded.len();
    let mut conversations: Vec<Conversation> = loaded
        .into_iter()
        .filter(|c| {
            if c.is_empty() {
                warn!("Skipping conversation '{}': no records", c.id());
            }
            !c.is_empty()
        })
        .collect();
    let skipped = loaded_count - conversations.len();

    // ── Step 3: Rank ──────────────────────────────────────────────────────────
    rank_by_size(&mut conversations);
    if let Some(n) = top {
        conversations.truncate(n);
    }

    // ── Step 4: Summarise ─────────────────────────────────────────────────────
    let records_processed: usize = conversations.iter().map(Conversation::len).sum();
    let summaries = conversations
        .iter()
        .map(|c| summarize(c, granularity, records_processed))
        .collect::<Result<Vec<_>>>()?;

    let merged = ConversationAggregator::merged_by_period(&conversations, granularity)?;
    let cumulative = ConversationAggregator::cumulative(&merged);

    info!(
        "Analysed {} conversations ({} records, {} {} periods)",
        conversations.len(),
        records_processed,
        merged.rows.len(),
        granularity
    );

    Ok(AnalysisResult {
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            granularity,
            conversations_analyzed: conversations.len(),
            conversations_skipped: skipped,
            records_processed,
            load_time_seconds: load_time,
        },
        conversations: summaries,
        merged,
        cumulative,
    })
}

/// Sort conversations by record count, largest first; ties by id.
pub fn rank_by_size(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.id().cmp(b.id())));
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn summarize(
    conversation: &Conversation,
    granularity: Granularity,
    total_records: usize,
) -> Result<ConversationSummary> {
    Ok(ConversationSummary {
        id: conversation.id().to_string(),
        title: conversation.title().to_string(),
        thread_type: conversation.thread_type(),
        record_count: conversation.len(),
        share_of_total: percentage(conversation.len() as f64, total_records as f64, 2),
        message_count: ConversationAggregator::messages(conversation).len(),
        call_count: ConversationAggregator::calls(conversation).len(),
        total_call_seconds: ConversationAggregator::total_call_duration(conversation),
        first_activity: conversation.first_activity(),
        last_activity: conversation.last_activity(),
        senders: ConversationAggregator::by_sender(conversation)?,
        periods: ConversationAggregator::by_period(conversation, granularity)?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
