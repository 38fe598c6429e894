//! Message count aggregation per sender and per calendar period.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use stats_core::error::{Result, StatsError};
use stats_core::models::{Conversation, ConversationRecord, MessageKind};
use stats_core::time_utils::Granularity;

// ── SenderStats ───────────────────────────────────────────────────────────────

/// One row of the per-sender table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderStats {
    pub sender_name: String,
    /// Records of every kind sent by this sender.
    pub count: u64,
    /// `100 * count / total`, unrounded.
    pub percentage: f64,
}

// ── PeriodCount ───────────────────────────────────────────────────────────────

/// Number of records in one calendar period of a single conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    /// First day of the period.
    pub period: NaiveDate,
    pub count: u64,
}

// ── MergedPeriodTable ─────────────────────────────────────────────────────────

/// One period row of a [`MergedPeriodTable`]; `counts[i]` belongs to column `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRow {
    pub period: NaiveDate,
    pub counts: Vec<u64>,
}

/// Period × conversation count matrix.
///
/// Rows cover every period in which any input conversation was active, in
/// ascending order. Columns are keyed by conversation title. Cells for
/// inactive (period, conversation) pairs are `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedPeriodTable {
    pub granularity: Granularity,
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedPeriodTable {
    /// A table with no columns and no rows.
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, in period order.
    pub fn column(&self, name: &str) -> Option<Vec<u64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.counts[idx]).collect())
    }

    /// The cell for `period` and column `name`.
    ///
    /// Returns `None` when either the period row or the column does not exist.
    pub fn get(&self, period: NaiveDate, name: &str) -> Option<u64> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .find(|row| row.period == period)
            .map(|row| row.counts[idx])
    }

    /// Sum of every column.
    pub fn column_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.columns.len()];
        for row in &self.rows {
            for (total, count) in totals.iter_mut().zip(&row.counts) {
                *total += count;
            }
        }
        totals
    }

    /// Row label formatted for this table's granularity.
    pub fn period_label(&self, row: &MergedRow) -> String {
        self.granularity.format_key(row.period)
    }
}

// ── ConversationAggregator ────────────────────────────────────────────────────

/// Stateless helper that summarises conversations.
pub struct ConversationAggregator;

impl ConversationAggregator {
    /// Count records per sender, over all kinds.
    ///
    /// Rows are sorted by descending count. Callers must not rely on the order
    /// of senders with equal counts; this implementation happens to list them
    /// by name.
    pub fn by_sender(conversation: &Conversation) -> Result<Vec<SenderStats>> {
        ensure_not_empty(conversation, "by_sender")?;

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for record in conversation.records() {
            *counts.entry(record.sender_name.as_str()).or_default() += 1;
        }

        let total = conversation.len() as f64;
        let mut rows: Vec<SenderStats> = counts
            .into_iter()
            .map(|(sender, count)| SenderStats {
                sender_name: sender.to_string(),
                count,
                percentage: 100.0 * count as f64 / total,
            })
            .collect();

        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.sender_name.cmp(&b.sender_name))
        });
        Ok(rows)
    }

    /// Count records per calendar period.
    ///
    /// The result is sparse: only periods holding at least one record appear,
    /// sorted ascending.
    pub fn by_period(
        conversation: &Conversation,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCount>> {
        ensure_not_empty(conversation, "by_period")?;

        let mut map: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for record in conversation.records() {
            *map.entry(granularity.truncate(record.timestamp)).or_default() += 1;
        }

        Ok(map
            .into_iter()
            .map(|(period, count)| PeriodCount { period, count })
            .collect())
    }

    pub fn by_day(conversation: &Conversation) -> Result<Vec<PeriodCount>> {
        Self::by_period(conversation, Granularity::Day)
    }

    pub fn by_month(conversation: &Conversation) -> Result<Vec<PeriodCount>> {
        Self::by_period(conversation, Granularity::Month)
    }

    pub fn by_year(conversation: &Conversation) -> Result<Vec<PeriodCount>> {
        Self::by_period(conversation, Granularity::Year)
    }

    /// Combine the period counts of several conversations into one table.
    ///
    /// Rows are the union of every conversation's active periods; missing cells
    /// are zero-filled. An empty input yields an empty table. A conversation
    /// without records is rejected, as in [`Self::by_period`].
    ///
    /// Columns are named after conversation titles. When a title is already
    /// taken by an earlier column, the conversation id is appended:
    /// `"Family (family_b2)"`.
    pub fn merged_by_period<'a, I>(
        conversations: I,
        granularity: Granularity,
    ) -> Result<MergedPeriodTable>
    where
        I: IntoIterator<Item = &'a Conversation>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut per_column: Vec<HashMap<NaiveDate, u64>> = Vec::new();
        let mut periods: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut taken: HashSet<String> = HashSet::new();

        for conversation in conversations {
            let counts = Self::by_period(conversation, granularity)?;
            periods.extend(counts.iter().map(|pc| pc.period));
            per_column.push(counts.into_iter().map(|pc| (pc.period, pc.count)).collect());

            let name = unique_column_name(conversation, &taken);
            taken.insert(name.clone());
            columns.push(name);
        }

        let rows = periods
            .into_iter()
            .map(|period| MergedRow {
                period,
                counts: per_column
                    .iter()
                    .map(|counts| counts.get(&period).copied().unwrap_or(0))
                    .collect(),
            })
            .collect();

        Ok(MergedPeriodTable {
            granularity,
            columns,
            rows,
        })
    }

    /// Running sum down each column, in period order.
    pub fn cumulative(table: &MergedPeriodTable) -> MergedPeriodTable {
        let mut running = vec![0u64; table.columns.len()];
        let rows = table
            .rows
            .iter()
            .map(|row| {
                for (acc, count) in running.iter_mut().zip(&row.counts) {
                    *acc += count;
                }
                MergedRow {
                    period: row.period,
                    counts: running.clone(),
                }
            })
            .collect();

        MergedPeriodTable {
            granularity: table.granularity,
            columns: table.columns.clone(),
            rows,
        }
    }

    /// Records whose kind tag equals `kind` exactly (case-sensitive).
    pub fn records_of_kind<'a>(
        conversation: &'a Conversation,
        kind: &MessageKind,
    ) -> Vec<&'a ConversationRecord> {
        conversation
            .records()
            .iter()
            .filter(|r| r.kind.as_str() == kind.as_str())
            .collect()
    }

    /// Call records only.
    pub fn calls(conversation: &Conversation) -> Vec<&ConversationRecord> {
        Self::records_of_kind(conversation, &MessageKind::Call)
    }

    /// Plain text records only.
    pub fn messages(conversation: &Conversation) -> Vec<&ConversationRecord> {
        Self::records_of_kind(conversation, &MessageKind::Generic)
    }

    /// Total length of all calls, in seconds.
    pub fn total_call_duration(conversation: &Conversation) -> f64 {
        Self::calls(conversation)
            .iter()
            .filter_map(|r| r.call_duration)
            .sum()
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn ensure_not_empty(conversation: &Conversation, operation: &str) -> Result<()> {
    if conversation.is_empty() {
        return Err(StatsError::InvalidInput(format!(
            "{}: conversation '{}' has no records",
            operation,
            conversation.id()
        )));
    }
    Ok(())
}

fn unique_column_name(conversation: &Conversation, taken: &HashSet<String>) -> String {
    let title = conversation.title();
    if !taken.contains(title) {
        return title.to_string();
    }

    let base = format!("{} ({})", title, conversation.id());
    let mut name = base.clone();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{} #{}", base, n);
        n += 1;
    }
    name
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use stats_core::models::ThreadType;

    fn record(sender: &str, kind: &str, ts: DateTime<Utc>) -> ConversationRecord {
        ConversationRecord {
            sender_name: sender.to_string(),
            kind: MessageKind::from(kind),
            content: String::new(),
            call_duration: (kind == "Call").then_some(60.0),
            timestamp: ts,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn conversation(id: &str, title: &str, records: Vec<ConversationRecord>) -> Conversation {
        Conversation::new(id, title, ThreadType::Direct, records)
    }

    fn two_record_example() -> Conversation {
        conversation(
            "chat_1",
            "A and B",
            vec![
                record("A", "Generic", DateTime::from_timestamp_millis(1000).unwrap()),
                record("B", "Call", DateTime::from_timestamp_millis(500).unwrap()),
            ],
        )
    }

    // ── by_sender ─────────────────────────────────────────────────────────────

    #[test]
    fn test_by_sender_two_record_example() {
        let rows = ConversationAggregator::by_sender(&two_record_example()).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.count, 1);
            assert!((row.percentage - 50.0).abs() < 1e-9);
        }
        let mut names: Vec<&str> = rows.iter().map(|r| r.sender_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_by_sender_sorted_descending_and_counts_all_kinds() {
        let conv = conversation(
            "c",
            "C",
            vec![
                record("Ann", "Generic", at(2024, 1, 1, 8)),
                record("Bob", "Generic", at(2024, 1, 1, 9)),
                record("Bob", "Call", at(2024, 1, 1, 10)),
                record("Bob", "Share", at(2024, 1, 2, 10)),
                record("Cid", "Generic", at(2024, 1, 3, 10)),
                record("Cid", "Generic", at(2024, 1, 3, 11)),
            ],
        );
        let rows = ConversationAggregator::by_sender(&conv).unwrap();
        assert_eq!(rows[0].sender_name, "Bob");
        assert_eq!(rows[0].count, 3);
        assert!((rows[0].percentage - 50.0).abs() < 1e-9);
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[2].count, 1);
        for pair in rows.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn test_by_sender_percentages_sum_to_100() {
        let records: Vec<ConversationRecord> = (0..7)
            .map(|i| record(["x", "y", "z"][i % 3], "Generic", at(2024, 1, 1, i as u32)))
            .collect();
        let rows = ConversationAggregator::by_sender(&conversation("c", "C", records)).unwrap();
        let sum: f64 = rows.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9, "sum = {sum}");
    }

    #[test]
    fn test_by_sender_empty_is_invalid_input() {
        let result = ConversationAggregator::by_sender(&conversation("e", "E", vec![]));
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));
    }

    // ── by_period ─────────────────────────────────────────────────────────────

    #[test]
    fn test_by_period_two_record_example_same_day() {
        let rows = ConversationAggregator::by_day(&two_record_example()).unwrap();
        assert_eq!(rows, vec![PeriodCount { period: date(1970, 1, 1), count: 2 }]);
    }

    #[test]
    fn test_by_period_is_sparse() {
        let conv = conversation(
            "c",
            "C",
            vec![
                record("A", "Generic", at(2024, 1, 1, 8)),
                record("A", "Generic", at(2024, 1, 5, 8)),
                record("B", "Generic", at(2024, 1, 5, 23)),
            ],
        );
        let rows = ConversationAggregator::by_day(&conv).unwrap();
        assert_eq!(
            rows,
            vec![
                PeriodCount { period: date(2024, 1, 1), count: 1 },
                PeriodCount { period: date(2024, 1, 5), count: 2 },
            ]
        );
    }

    #[test]
    fn test_by_month_and_year() {
        let conv = conversation(
            "c",
            "C",
            vec![
                record("A", "Generic", at(2023, 12, 31, 23)),
                record("A", "Generic", at(2024, 1, 1, 0)),
                record("A", "Generic", at(2024, 1, 20, 0)),
                record("A", "Generic", at(2024, 3, 2, 0)),
            ],
        );

        let months = ConversationAggregator::by_month(&conv).unwrap();
        let keys: Vec<String> = months
            .iter()
            .map(|p| Granularity::Month.format_key(p.period))
            .collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-03"]);
        assert_eq!(months[1].count, 2);

        let years = ConversationAggregator::by_year(&conv).unwrap();
        assert_eq!(
            years,
            vec![
                PeriodCount { period: date(2023, 1, 1), count: 1 },
                PeriodCount { period: date(2024, 1, 1), count: 3 },
            ]
        );
    }

    #[test]
    fn test_by_period_empty_is_invalid_input() {
        let result =
            ConversationAggregator::by_period(&conversation("e", "E", vec![]), Granularity::Day);
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));
    }

    // ── merged_by_period ──────────────────────────────────────────────────────

    fn alice_and_bob() -> (Conversation, Conversation) {
        let alice = conversation(
            "alice_1",
            "Alice",
            vec![
                record("Alice", "Generic", at(2024, 1, 1, 8)),
                record("Me", "Generic", at(2024, 1, 1, 9)),
                record("Alice", "Generic", at(2024, 1, 3, 9)),
            ],
        );
        let bob = conversation(
            "bob_2",
            "Bob",
            vec![
                record("Bob", "Generic", at(2024, 1, 2, 8)),
                record("Bob", "Generic", at(2024, 1, 3, 8)),
            ],
        );
        (alice, bob)
    }

    #[test]
    fn test_merged_by_period_union_and_zero_fill() {
        let (alice, bob) = alice_and_bob();
        let table =
            ConversationAggregator::merged_by_period([&alice, &bob], Granularity::Day).unwrap();

        assert_eq!(table.columns, vec!["Alice", "Bob"]);
        let periods: Vec<NaiveDate> = table.rows.iter().map(|r| r.period).collect();
        assert_eq!(
            periods,
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert_eq!(table.column("Alice").unwrap(), vec![2, 0, 1]);
        assert_eq!(table.column("Bob").unwrap(), vec![0, 1, 1]);
        assert_eq!(table.get(date(2024, 1, 2), "Alice"), Some(0));
        assert_eq!(table.get(date(2024, 1, 9), "Alice"), None);
    }

    #[test]
    fn test_merged_by_period_empty_list() {
        let none: Vec<Conversation> = Vec::new();
        let table = ConversationAggregator::merged_by_period(&none, Granularity::Day).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
        assert_eq!(table, MergedPeriodTable::empty(Granularity::Day));
    }

    #[test]
    fn test_merged_by_period_rejects_empty_member() {
        let (alice, _) = alice_and_bob();
        let empty = conversation("e", "Empty", vec![]);
        let result =
            ConversationAggregator::merged_by_period([&alice, &empty], Granularity::Day);
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));
    }

    #[test]
    fn test_merged_by_period_disambiguates_titles() {
        let a = conversation("fam_a", "Family", vec![record("A", "Generic", at(2024, 1, 1, 0))]);
        let b = conversation("fam_b", "Family", vec![record("B", "Generic", at(2024, 1, 1, 0))]);
        let table = ConversationAggregator::merged_by_period([&a, &b], Granularity::Year).unwrap();
        assert_eq!(table.columns, vec!["Family", "Family (fam_b)"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].counts, vec![1, 1]);
    }

    #[test]
    fn test_merged_by_period_same_conversation_twice() {
        let a = conversation("fam_a", "Family", vec![record("A", "Generic", at(2024, 1, 1, 0))]);
        let table =
            ConversationAggregator::merged_by_period([&a, &a, &a], Granularity::Day).unwrap();
        assert_eq!(
            table.columns,
            vec!["Family", "Family (fam_a)", "Family (fam_a) #2"]
        );
    }

    // ── cumulative ────────────────────────────────────────────────────────────

    #[test]
    fn test_cumulative_running_sums() {
        let (alice, bob) = alice_and_bob();
        let table =
            ConversationAggregator::merged_by_period([&alice, &bob], Granularity::Day).unwrap();
        let cumulative = ConversationAggregator::cumulative(&table);

        assert_eq!(cumulative.columns, table.columns);
        assert_eq!(cumulative.column("Alice").unwrap(), vec![2, 2, 3]);
        assert_eq!(cumulative.column("Bob").unwrap(), vec![0, 1, 2]);
        assert_eq!(
            cumulative.rows.last().unwrap().counts,
            table.column_totals()
        );
    }

    #[test]
    fn test_cumulative_of_empty_table() {
        let table = MergedPeriodTable::empty(Granularity::Month);
        assert_eq!(ConversationAggregator::cumulative(&table), table);
    }

    // ── records_of_kind ───────────────────────────────────────────────────────

    #[test]
    fn test_records_of_kind_exact_match() {
        let conv = conversation(
            "c",
            "C",
            vec![
                record("A", "Generic", at(2024, 1, 1, 1)),
                record("A", "Call", at(2024, 1, 1, 2)),
                record("A", "Share", at(2024, 1, 1, 3)),
                record("A", "share", at(2024, 1, 1, 4)),
                record("A", "Generic", at(2024, 1, 1, 5)),
            ],
        );

        assert_eq!(ConversationAggregator::messages(&conv).len(), 2);
        assert_eq!(ConversationAggregator::calls(&conv).len(), 1);
        let shares =
            ConversationAggregator::records_of_kind(&conv, &MessageKind::Other("Share".into()));
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].timestamp, at(2024, 1, 1, 3));
    }

    #[test]
    fn test_total_call_duration() {
        let conv = conversation(
            "c",
            "C",
            vec![
                record("A", "Call", at(2024, 1, 1, 1)),
                record("B", "Call", at(2024, 1, 1, 2)),
                record("A", "Generic", at(2024, 1, 1, 3)),
            ],
        );
        assert!((ConversationAggregator::total_call_duration(&conv) - 120.0).abs() < 1e-9);
    }
}
