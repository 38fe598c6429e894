//! Plain-text table rendering for the aggregate reports.
//!
//! Column widths are measured with `unicode-width` so repaired titles with
//! accents, CJK or emoji still line up in a terminal.

use stats_core::formatting::{format_call_duration, format_count, format_percent};
use stats_data::aggregator::MergedPeriodTable;
use stats_data::analysis::{AnalysisResult, ConversationSummary};
use unicode_width::UnicodeWidthStr;

/// A bordered text table with a header row and an optional totals row.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    totals: Option<Vec<String>>,
}

impl TextTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            totals: None,
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn set_totals(&mut self, cells: Vec<String>) {
        self.totals = Some(cells);
    }

    /// Render with `title` above the table. The first column is left-aligned,
    /// every other column right-aligned.
    pub fn render(&self, title: &str) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in self.rows.iter().chain(self.totals.iter()) {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }

        let rule: String = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        let rule = format!("+{}+", rule);

        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&render_line(&self.headers, &widths));
        out.push_str(&rule);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&render_line(row, &widths));
        }
        if let Some(totals) = &self.totals {
            out.push_str(&rule);
            out.push('\n');
            out.push_str(&render_line(totals, &widths));
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = " ".repeat(width.saturating_sub(cell.width()));
        if i == 0 {
            line.push_str(&format!(" {}{} |", cell, pad));
        } else {
            line.push_str(&format!(" {}{} |", pad, cell));
        }
    }
    line.push('\n');
    line
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// One row per conversation with counts, calls and activity span.
pub fn render_summary(result: &AnalysisResult) -> String {
    let mut table = TextTable::new([
        "Conversation",
        "Type",
        "Records",
        "Share",
        "Messages",
        "Calls",
        "Call time",
        "First",
        "Last",
    ]);
    for conv in &result.conversations {
        table.push_row(vec![
            conv.title.clone(),
            conv.thread_type.to_string(),
            format_count(conv.record_count as u64),
            format_percent(conv.share_of_total),
            format_count(conv.message_count as u64),
            format_count(conv.call_count as u64),
            format_call_duration(conv.total_call_seconds),
            format_day(conv.first_activity),
            format_day(conv.last_activity),
        ]);
    }
    table.set_totals(vec![
        "TOTAL".to_string(),
        format!("{} chats", result.metadata.conversations_analyzed),
        format_count(result.metadata.records_processed as u64),
    ]);
    table.render("Conversations")
}

/// A sender table for every conversation.
pub fn render_senders(result: &AnalysisResult) -> String {
    result
        .conversations
        .iter()
        .map(render_sender_table)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_sender_table(conv: &ConversationSummary) -> String {
    let mut table = TextTable::new(["Sender", "Records", "Share"]);
    for row in &conv.senders {
        table.push_row(vec![
            row.sender_name.clone(),
            format_count(row.count),
            format_percent(row.percentage),
        ]);
    }
    table.set_totals(vec![
        "TOTAL".to_string(),
        format_count(conv.record_count as u64),
        format_percent(100.0),
    ]);
    table.render(&conv.title)
}

/// The sparse period table of every conversation.
pub fn render_periods(result: &AnalysisResult) -> String {
    let granularity = result.metadata.granularity;
    result
        .conversations
        .iter()
        .map(|conv| {
            let mut table = TextTable::new(["Period", "Records"]);
            for pc in &conv.periods {
                table.push_row(vec![granularity.format_key(pc.period), format_count(pc.count)]);
            }
            table.set_totals(vec![
                format!("{} periods", conv.periods.len()),
                format_count(conv.record_count as u64),
            ]);
            table.render(&conv.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A merged (or cumulative) period × conversation table.
pub fn render_merged(table: &MergedPeriodTable, title: &str) -> String {
    let headers = std::iter::once("Period".to_string()).chain(table.columns.iter().cloned());
    let mut text = TextTable::new(headers);
    for row in &table.rows {
        let mut cells = vec![table.period_label(row)];
        cells.extend(row.counts.iter().map(|c| format_count(*c)));
        text.push_row(cells);
    }
    text.render(title)
}

fn format_day(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
