//! Deterministic on-device fallback: summary statistics per analysis kind.

use async_trait::async_trait;
use chrono::NaiveDate;
use nestling_types::{
    ActivityKind, ActivityRecord, AnalysisKind, AnalysisPayload, FeedingKind, FeedingRecord,
    GrowthRecord, SleepRecord,
};
use std::collections::BTreeMap;

use super::collaborators::LocalAnalyzer;

#[derive(Debug, Default, Clone, Copy)]
pub struct BasicLocalAnalyzer;

impl BasicLocalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`LocalAnalyzer::analyze`].
    pub fn summarize(&self, kind: AnalysisKind, payload: &AnalysisPayload) -> Option<String> {
        match kind {
            AnalysisKind::SleepPattern => sleep_section(&payload.sleep),
            AnalysisKind::FeedingPattern => feeding_section(&payload.feeding),
            AnalysisKind::GrowthTrend => growth_section(&payload.growth),
            AnalysisKind::DailySummary => daily_summary(payload),
            AnalysisKind::Comprehensive => {
                let sections: Vec<String> = [
                    sleep_section(&payload.sleep),
                    feeding_section(&payload.feeding),
                    growth_section(&payload.growth),
                    activity_section(&payload.activity),
                ]
                .into_iter()
                .flatten()
                .collect();
                if sections.is_empty() {
                    None
                } else {
                    Some(sections.join("\n"))
                }
            },
        }
    }
}

#[async_trait]
impl LocalAnalyzer for BasicLocalAnalyzer {
    async fn analyze(&self, kind: AnalysisKind, payload: &AnalysisPayload) -> Option<String> {
        self.summarize(kind, payload)
    }
}

fn sleep_section(records: &[SleepRecord]) -> Option<String> {
    let durations: Vec<i64> = records.iter().filter_map(SleepRecord::duration_minutes).collect();
    if durations.is_empty() {
        return None;
    }
    let total: i64 = durations.iter().sum();
    let average = total as f64 / durations.len() as f64;
    let longest = durations.iter().copied().max().unwrap_or(0);
    Some(format!(
        "Sleep: {} sessions, {} in total, {:.0} min on average, longest {}.",
        durations.len(),
        hours_minutes(total),
        average,
        hours_minutes(longest)
    ))
}

fn feeding_section(records: &[FeedingRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
    for r in records {
        *by_kind.entry(feeding_kind_label(r.kind)).or_default() += 1;
    }
    let kinds: Vec<String> = by_kind.iter().map(|(k, n)| format!("{} {}", n, k)).collect();

    let mut text = format!("Feeding: {} feedings ({}).", records.len(), kinds.join(", "));

    let amounts: Vec<f64> = records.iter().filter_map(|r| r.amount_ml).collect();
    if !amounts.is_empty() {
        let average = amounts.iter().sum::<f64>() / amounts.len() as f64;
        text.push_str(&format!(" Average volume {:.0} ml.", average));
    }

    let mut times: Vec<_> = records.iter().map(|r| r.time).collect();
    times.sort();
    if times.len() > 1 {
        let span = (times[times.len() - 1] - times[0]).num_minutes();
        let interval = span as f64 / (times.len() - 1) as f64;
        text.push_str(&format!(" Average interval {}.", hours_minutes(interval.round() as i64)));
    }
    Some(text)
}

fn growth_section(records: &[GrowthRecord]) -> Option<String> {
    let mut sorted: Vec<&GrowthRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);
    let (first, last) = (sorted.first()?, sorted.last()?);

    let mut parts = Vec::new();
    if let Some(w) = last.weight_kg {
        parts.push(format!("weight {:.2} kg{}", w, change(first.weight_kg, w, "kg")));
    }
    if let Some(h) = last.height_cm {
        parts.push(format!("height {:.1} cm{}", h, change(first.height_cm, h, "cm")));
    }
    if let Some(c) = last.head_circumference_cm {
        parts.push(format!(
            "head circumference {:.1} cm{}",
            c,
            change(first.head_circumference_cm, c, "cm")
        ));
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("Growth (latest {}): {}.", last.date, parts.join(", ")))
}

fn activity_section(records: &[ActivityRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut by_kind: BTreeMap<ActivityKind, usize> = BTreeMap::new();
    for r in records {
        *by_kind.entry(r.kind).or_default() += 1;
    }
    let kinds: Vec<String> = by_kind.iter().map(|(k, n)| format!("{} {}", n, k.as_str())).collect();
    Some(format!("Activities: {}.", kinds.join(", ")))
}

/// Statistics for the most recent day that has any sleep, feeding or activity.
fn daily_summary(payload: &AnalysisPayload) -> Option<String> {
    let day = payload
        .sleep
        .iter()
        .map(|r| r.start.date_naive())
        .chain(payload.feeding.iter().map(|r| r.time.date_naive()))
        .chain(payload.activity.iter().map(|r| r.time.date_naive()))
        .max()?;

    let on_day = |d: NaiveDate| d == day;
    let sleep: Vec<SleepRecord> =
        payload.sleep.iter().filter(|r| on_day(r.start.date_naive())).cloned().collect();
    let feeding: Vec<FeedingRecord> =
        payload.feeding.iter().filter(|r| on_day(r.time.date_naive())).cloned().collect();
    let activity: Vec<ActivityRecord> =
        payload.activity.iter().filter(|r| on_day(r.time.date_naive())).cloned().collect();

    let sections: Vec<String> = [
        sleep_section(&sleep),
        feeding_section(&feeding),
        activity_section(&activity),
    ]
    .into_iter()
    .flatten()
    .collect();
    if sections.is_empty() {
        return None;
    }
    Some(format!("Summary for {}:\n{}", day, sections.join("\n")))
}

fn feeding_kind_label(kind: FeedingKind) -> &'static str {
    match kind {
        FeedingKind::Breast => "breast",
        FeedingKind::Bottle => "bottle",
        FeedingKind::Formula => "formula",
        FeedingKind::Solid => "solid",
    }
}

fn change(first: Option<f64>, last: f64, unit: &str) -> String {
    match first {
        Some(f) if (last - f).abs() > f64::EPSILON => format!(" ({:+.2} {})", last - f, unit),
        _ => String::new(),
    }
}

fn hours_minutes(minutes: i64) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    if h == 0 {
        format!("{}m", m)
    } else {
        format!("{}h{:02}m", h, m)
    }
}
