//! Dashboard progress aggregation

use serde::Serialize;
use tutor_common::ProgressItem;

/// Per-subject completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectProgress {
    pub subject: String,
    /// Percent, one decimal
    pub rate: f64,
    pub items: usize,
}

/// Summary of a student's progress rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    /// Percent, one decimal; 0 when nothing is tracked
    pub progress_rate: f64,
    pub planned_hours: f64,
    pub completed_hours: f64,
    /// Subjects in order of first appearance
    pub by_subject: Vec<SubjectProgress>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Completion ratio capped at 1; `None` for rows without units
fn capped_ratio(item: &ProgressItem) -> Option<f64> {
    if item.total_units <= 0 {
        return None;
    }
    let ratio = item.completed_units.max(0) as f64 / item.total_units as f64;
    Some(ratio.min(1.0))
}

pub fn summarize(items: &[ProgressItem]) -> ProgressSummary {
    let mut ratio_sum = 0.0;
    let mut counted = 0usize;
    let mut planned = 0.0;
    let mut completed = 0.0;
    let mut subjects: Vec<(String, f64, usize)> = Vec::new();

    for item in items {
        let Some(ratio) = capped_ratio(item) else {
            continue;
        };
        ratio_sum += ratio;
        counted += 1;

        if let Some(hours) = item.duration.filter(|h| *h > 0.0) {
            planned += hours;
            completed += hours * ratio;
        }

        match subjects.iter_mut().find(|(s, _, _)| *s == item.subject) {
            Some((_, sum, n)) => {
                *sum += ratio;
                *n += 1;
            }
            None => subjects.push((item.subject.clone(), ratio, 1)),
        }
    }

    let progress_rate = if counted == 0 {
        0.0
    } else {
        round1(ratio_sum / counted as f64 * 100.0)
    };

    ProgressSummary {
        progress_rate,
        planned_hours: round1(planned),
        completed_hours: round1(completed),
        by_subject: subjects
            .into_iter()
            .map(|(subject, sum, n)| SubjectProgress {
                subject,
                rate: round1(sum / n as f64 * 100.0),
                items: n,
            })
            .collect(),
    }
}
