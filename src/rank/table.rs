//! Leaderboard table markup
//!
//! ```text
//! Dataset & \multicolumn{3}{c}{SOTA} & \multicolumn{3}{c}{Runner-up} \\
//!  & Model & GAUC & MRR & Model & GAUC & MRR \\
//! Books & DCNv2 & 71.20 ± 0.35 & 30.10 ± 0.20 & DeepFM & ... \\
//! ```

use super::{RankedEntry, RankingReport};
use crate::catalog::{dataset_name, metric_name};

const CELL_SEPARATOR: &str = " & ";
const ROW_TERMINATOR: &str = " \\\\";

/// Header label of a 1-based rank.
fn rank_label(rank: usize) -> String {
    match rank {
        1 => "SOTA".to_string(),
        2 => "Runner-up".to_string(),
        n => format!("Rank-{n}"),
    }
}

fn stats_cell(entry: &RankedEntry, metric: &str) -> String {
    entry.performance.get(metric).map_or_else(
        || "-".to_string(),
        |stats| format!("{:.2} ± {:.2}", stats.mean * 100.0, stats.std * 100.0),
    )
}

pub(super) fn render(report: &RankingReport) -> String {
    let metrics = report.metrics();
    let top_k = report.top_k();
    let group_width = metrics.len() + 1;

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(report.datasets().len() + 2);

    let mut header = vec!["Dataset".to_string()];
    header.extend(
        (1..=top_k).map(|rank| format!("\\multicolumn{{{group_width}}}{{c}}{{{}}}", rank_label(rank))),
    );
    rows.push(header);

    let mut sub_header = vec![String::new()];
    for _ in 0..top_k {
        sub_header.push("Model".to_string());
        sub_header.extend(metrics.iter().map(|m| metric_name(m).to_string()));
    }
    rows.push(sub_header);

    for ranking in report.datasets() {
        let mut row = vec![dataset_name(&ranking.dataset).to_string()];
        for slot in 0..top_k {
            match ranking.entries.get(slot) {
                Some(entry) => {
                    row.push(entry.model.clone());
                    row.extend(metrics.iter().map(|m| stats_cell(entry, m)));
                }
                None => row.extend(std::iter::repeat(String::new()).take(group_width)),
            }
        }
        rows.push(row);
    }

    rows.iter()
        .map(|row| format!("{}{ROW_TERMINATOR}", row.join(CELL_SEPARATOR)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MetricStats;
    use crate::rank::DatasetRanking;
    use std::collections::BTreeMap;

    fn entry(rank: usize, model: &str, mean: f64, std: f64) -> RankedEntry {
        let mut performance = BTreeMap::new();
        performance.insert(
            "gauc".to_string(),
            MetricStats {
                mean,
                std,
                count: 5,
            },
        );
        RankedEntry {
            rank,
            signature: format!("sig-{rank}"),
            dataset: "books".to_string(),
            model_key: model.to_lowercase(),
            model: model.to_string(),
            score: mean,
            replicates: 5,
            performance,
        }
    }

    fn report(entries: Vec<RankedEntry>, metrics: &[&str], top_k: usize) -> RankingReport {
        RankingReport {
            metrics: metrics.iter().map(|m| (*m).to_string()).collect(),
            top_k,
            datasets: vec![DatasetRanking {
                dataset: "books".to_string(),
                entries,
            }],
        }
    }

    #[test]
    fn test_rank_labels() {
        assert_eq!(rank_label(1), "SOTA");
        assert_eq!(rank_label(2), "Runner-up");
        assert_eq!(rank_label(3), "Rank-3");
    }

    #[test]
    fn test_render_single_rank() {
        let table = report(vec![entry(1, "DCNv2", 0.7123, 0.0035)], &["gauc"], 1).to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Dataset & \\multicolumn{2}{c}{SOTA} \\\\");
        assert_eq!(lines[1], " & Model & GAUC \\\\");
        assert_eq!(lines[2], "Books & DCNv2 & 71.23 ± 0.35 \\\\");
    }

    #[test]
    fn test_render_missing_slots_and_metrics() {
        let table = report(vec![entry(1, "DCNv2", 0.7, 0.01)], &["gauc", "mrr"], 2).to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(
            lines[0],
            "Dataset & \\multicolumn{3}{c}{SOTA} & \\multicolumn{3}{c}{Runner-up} \\\\"
        );
        assert_eq!(lines[1], " & Model & GAUC & MRR & Model & GAUC & MRR \\\\");
        assert_eq!(lines[2], "Books & DCNv2 & 70.00 ± 1.00 & - &  &  &  \\\\");
    }
}
