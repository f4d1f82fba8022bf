//! Summary cards: mean interest per term and the leading term.
//! Pure functions; computed per request in the caller's term order.

use serde::Serialize;

use crate::model::Series;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermSummary {
    pub term: String,
    /// Arithmetic mean over the series, one decimal.
    pub mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Ranked by mean, highest first; ties keep `terms` order.
    pub ranking: Vec<TermSummary>,
    pub leader: Option<String>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Mean per term in `terms` order. Terms with no data get 0.0.
pub fn term_means(series: &Series, terms: &[String]) -> Vec<TermSummary> {
    terms
        .iter()
        .map(|t| {
            let (sum, n) = series
                .points()
                .iter()
                .filter_map(|p| p.scores.get(t))
                .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
            let mean = if n > 0 { round1(sum / n as f64) } else { 0.0 };
            TermSummary {
                term: t.clone(),
                mean,
            }
        })
        .collect()
}

pub fn summarize(series: &Series, terms: &[String]) -> Summary {
    if series.is_empty() {
        return Summary::default();
    }
    let mut ranking = term_means(series, terms);
    // stable sort keeps first-seen order on ties
    ranking.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    let leader = ranking.first().map(|s| s.term.clone());
    Summary { ranking, leader }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{FrameRow, InterestFrame};
    use chrono::{TimeZone, Utc};

    fn series(cols: &[&str], rows: &[&[f64]]) -> Series {
        Series::from_frame(InterestFrame {
            columns: cols.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, v)| FrameRow {
                    at: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                    values: v.to_vec(),
                })
                .collect(),
        })
    }

    fn terms(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn means_are_rounded_to_one_decimal() {
        let s = series(&["A", "B"], &[&[10.0, 1.0], &[20.0, 2.0], &[25.0, 2.0]]);
        let m = term_means(&s, &terms(&["A", "B"]));
        assert_eq!(m[0].mean, 18.3);
        assert_eq!(m[1].mean, 1.7);
    }

    #[test]
    fn leader_is_highest_mean() {
        let s = series(&["A", "B", "C"], &[&[10.0, 80.0, 30.0], &[20.0, 60.0, 30.0]]);
        let sum = summarize(&s, &terms(&["A", "B", "C"]));
        assert_eq!(sum.leader.as_deref(), Some("B"));
        let order: Vec<_> = sum.ranking.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn ties_follow_caller_term_order() {
        let s = series(&["A", "B"], &[&[50.0, 50.0]]);
        assert_eq!(
            summarize(&s, &terms(&["A", "B"])).leader.as_deref(),
            Some("A")
        );
        assert_eq!(
            summarize(&s, &terms(&["B", "A"])).leader.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn empty_series_has_no_leader() {
        let sum = summarize(&Series::default(), &terms(&["A"]));
        assert!(sum.leader.is_none());
        assert!(sum.ranking.is_empty());
    }
}
