//! Admission calendar grid
//!
//! Lays out one month of admission dates as a grid: one row per application,
//! one column per day. A cell collects every date marker falling on its day.
//! Display follows a fixed precedence so a busy cell stays readable:
//! procedure and announcement markers always show, the exam marker shows only
//! when neither of those does, and the application deadline only when the
//! cell is otherwise empty. The cell title always lists every marker.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use tutor_common::models::AdmissionRecord;

const WEEKDAY_LABELS: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

/// Kind of date shown on the calendar, in title order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DateMarker {
    ProcedureDeadline,
    Announcement,
    Exam,
    ApplicationDeadline,
}

impl DateMarker {
    pub fn glyph(self) -> &'static str {
        match self {
            DateMarker::ProcedureDeadline => "手",
            DateMarker::Announcement => "合",
            DateMarker::Exam => "受",
            DateMarker::ApplicationDeadline => "出",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateMarker::ProcedureDeadline => "手続期日",
            DateMarker::Announcement => "発表日",
            DateMarker::Exam => "受験日",
            DateMarker::ApplicationDeadline => "出願期日",
        }
    }
}

impl fmt::Display for DateMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    pub day: u32,
    pub weekday: &'static str,
    pub is_saturday: bool,
    pub is_sunday: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    /// Markers on this day, in title order
    pub markers: Vec<DateMarker>,
}

impl CalendarCell {
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers that are displayed after precedence is applied
    pub fn display_markers(&self) -> Vec<DateMarker> {
        let mut shown = Vec::new();
        for &marker in &self.markers {
            let visible = match marker {
                DateMarker::ProcedureDeadline | DateMarker::Announcement => true,
                DateMarker::Exam => shown.is_empty(),
                DateMarker::ApplicationDeadline => shown.is_empty(),
            };
            if visible {
                shown.push(marker);
            }
        }
        shown
    }

    /// Displayed glyphs joined with `/`
    pub fn text(&self) -> String {
        self.display_markers()
            .iter()
            .map(|m| m.glyph())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Every marker's label joined with `, `
    pub fn title(&self) -> String {
        self.markers
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarRow {
    pub university_name: String,
    pub faculty_name: String,
    pub department_name: Option<String>,
    pub exam_system: Option<String>,
    /// One cell per day of the month
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayColumn>,
    pub rows: Vec<CalendarRow>,
}

impl MonthGrid {
    /// Heading such as `2025年 2月`
    pub fn heading(&self) -> String {
        format!("{}年 {}月", self.year, self.month)
    }
}

/// First day of the `YYYY-MM` month, or of `today`'s month when absent or malformed
pub fn parse_target_month(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.and_then(|s| NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::from_ymd_opt(today.year(), today.month(), 1))
        .unwrap_or(today)
}

/// Parse a stored date: `YYYY-MM-DD` or `YYYY/MM/DD`, time suffix ignored
pub fn parse_record_date(raw: Option<&str>) -> Option<NaiveDate> {
    let s = raw?.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y/%m/%d"))
        .ok()
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.and_then(|n| n.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

/// Missing dates sort last
fn cmp_optional_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

struct ParsedRecord<'a> {
    record: &'a AdmissionRecord,
    application: Option<NaiveDate>,
    exam: Option<NaiveDate>,
    announcement: Option<NaiveDate>,
    procedure: Option<NaiveDate>,
}

impl<'a> ParsedRecord<'a> {
    fn new(record: &'a AdmissionRecord) -> Self {
        Self {
            record,
            application: parse_record_date(record.application_deadline.as_deref()),
            exam: parse_record_date(record.exam_date.as_deref()),
            announcement: parse_record_date(record.announcement_date.as_deref()),
            procedure: parse_record_date(record.procedure_deadline.as_deref()),
        }
    }

    fn markers_on(&self, date: NaiveDate) -> Vec<DateMarker> {
        [
            (self.procedure, DateMarker::ProcedureDeadline),
            (self.announcement, DateMarker::Announcement),
            (self.exam, DateMarker::Exam),
            (self.application, DateMarker::ApplicationDeadline),
        ]
        .into_iter()
        .filter(|(d, _)| *d == Some(date))
        .map(|(_, marker)| marker)
        .collect()
    }
}

/// Build the grid for the month starting at `first`
pub fn build_month_grid(records: &[AdmissionRecord], first: NaiveDate) -> MonthGrid {
    let dates: Vec<NaiveDate> = (1..=days_in_month(first))
        .filter_map(|d| first.with_day(d))
        .collect();

    let days = dates
        .iter()
        .map(|d| {
            let weekday = d.weekday();
            DayColumn {
                day: d.day(),
                weekday: WEEKDAY_LABELS[weekday.num_days_from_monday() as usize],
                is_saturday: weekday == Weekday::Sat,
                is_sunday: weekday == Weekday::Sun,
            }
        })
        .collect();

    let mut parsed: Vec<ParsedRecord> = records.iter().map(ParsedRecord::new).collect();
    parsed.sort_by(|a, b| {
        cmp_optional_dates(a.application, b.application)
            .then_with(|| cmp_optional_dates(a.exam, b.exam))
            .then_with(|| a.record.university_name.cmp(&b.record.university_name))
            .then_with(|| a.record.faculty_name.cmp(&b.record.faculty_name))
    });

    let rows = parsed
        .iter()
        .map(|p| CalendarRow {
            university_name: p.record.university_name.clone(),
            faculty_name: p.record.faculty_name.clone(),
            department_name: p.record.department_name.clone(),
            exam_system: p.record.exam_system.clone(),
            cells: dates
                .iter()
                .map(|d| CalendarCell {
                    markers: p.markers_on(*d),
                })
                .collect(),
        })
        .collect();

    MonthGrid {
        year: first.year(),
        month: first.month(),
        days,
        rows,
    }
}
