//! Text report of an [`ImpactSummary`].

use std::fmt::Write as _;

use rally_impact_rally_models::{ImpactSummary, ImpactTrend};
use strum::IntoEnumIterator as _;

fn stat(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Renders the summary as the lines printed by the CLI.
///
/// The median/mean/std line matches the annotation of the percent change
/// histogram.
#[must_use]
pub fn render(summary: &ImpactSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Rallies: {} ({} matched, {} without mortality data)",
        summary.rallies,
        summary.matched(),
        summary.unmatched
    );
    let _ = writeln!(
        out,
        "Median: {}\nMean: {}\nStd: {}",
        stat(summary.median),
        stat(summary.mean),
        stat(summary.std_dev)
    );
    for trend in ImpactTrend::iter() {
        let _ = writeln!(out, "{trend}: {}", summary.count(trend));
    }

    out
}
