//! Ingestion checks on a fetched snapshot.
//!
//! The CMS enforces none of these, so a snapshot is checked as a whole before
//! any route is resolved. Every problem is logged; the first one aborts the
//! build. Slug problems come first (works, categories, tags), then date
//! ranges (works, then histories depth-first), each in record order.
//!
//! - Work, category and tag slugs are unique and URL-safe.
//! - Date ranges are ordered (`to` not before `from`).
//! - A history entry, at any depth, never has both `to` and `nowWorking`.
//!
//! Dangling category/tag references are caught by the resolver, which has to
//! look them up anyway.

use crate::types::{History, Snapshot};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate {kind} slug `{slug}`")]
    DuplicateSlug { kind: RecordKind, slug: String },
    #[error("{kind} `{slug}` has a slug that is not URL-safe")]
    InvalidSlug { kind: RecordKind, slug: String },
    #[error("invalid date range on {kind} `{record}`: {problem}")]
    InvalidDateRange {
        kind: RecordKind,
        record: String,
        problem: DateRangeProblem,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Work,
    Category,
    Tag,
    History,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Work => "work",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::History => "history",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRangeProblem {
    EndsBeforeStart { from: NaiveDate, to: NaiveDate },
    EndedButNowWorking { to: NaiveDate },
}

impl fmt::Display for DateRangeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndsBeforeStart { from, to } => write!(f, "ends {to} before it starts {from}"),
            Self::EndedButNowWorking { to } => {
                write!(f, "has an end date {to} but is marked as now working")
            }
        }
    }
}

/// Check a `(from, to?, now_working)` triple.
pub fn check_period(
    from: NaiveDate,
    to: Option<NaiveDate>,
    now_working: bool,
) -> Result<(), DateRangeProblem> {
    match to {
        Some(to) if to < from => Err(DateRangeProblem::EndsBeforeStart { from, to }),
        Some(to) if now_working => Err(DateRangeProblem::EndedButNowWorking { to }),
        _ => Ok(()),
    }
}

/// Slugs become path segments: ASCII letters, digits, `-` and `_` only.
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Collect every problem in the snapshot: slugs first, then date ranges.
pub fn check_snapshot(snapshot: &Snapshot) -> Vec<ValidationError> {
    let mut problems = Vec::new();

    check_slugs(
        RecordKind::Work,
        snapshot.works.iter().map(|w| w.slug.as_str()),
        &mut problems,
    );
    check_slugs(
        RecordKind::Category,
        snapshot.categories.iter().map(|c| c.slug.as_str()),
        &mut problems,
    );
    check_slugs(
        RecordKind::Tag,
        snapshot.tags.iter().map(|t| t.slug.as_str()),
        &mut problems,
    );

    for work in &snapshot.works {
        if let Err(problem) = check_period(work.from, work.to, false) {
            problems.push(ValidationError::InvalidDateRange {
                kind: RecordKind::Work,
                record: work.slug.clone(),
                problem,
            });
        }
    }

    for history in &snapshot.histories {
        check_history(history, &mut problems);
    }

    problems
}

/// Validate a snapshot, failing on the first problem found.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ValidationError> {
    let mut problems = check_snapshot(snapshot).into_iter();
    let Some(first) = problems.next() else {
        return Ok(());
    };
    tracing::warn!(problem = %first, "snapshot rejected");
    for problem in problems {
        tracing::warn!(problem = %problem, "snapshot rejected");
    }
    Err(first)
}

fn check_slugs<'a>(
    kind: RecordKind,
    slugs: impl Iterator<Item = &'a str>,
    problems: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for slug in slugs {
        if !is_url_safe(slug) {
            problems.push(ValidationError::InvalidSlug {
                kind,
                slug: slug.to_string(),
            });
        } else if !seen.insert(slug) {
            problems.push(ValidationError::DuplicateSlug {
                kind,
                slug: slug.to_string(),
            });
        }
    }
}

fn check_history(history: &History, problems: &mut Vec<ValidationError>) {
    if let Err(problem) = check_period(history.from, history.to, history.now_working) {
        problems.push(ValidationError::InvalidDateRange {
            kind: RecordKind::History,
            record: history.title.clone(),
            problem,
        });
    }
    for child in &history.sub_histories {
        check_history(child, problems);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn sample_snapshot_is_valid() {
        assert!(check_snapshot(&sample_snapshot()).is_empty());
        assert!(validate_snapshot(&sample_snapshot()).is_ok());
    }

    #[test]
    fn period_checks() {
        assert!(check_period(date("2020-01-01"), None, true).is_ok());
        assert!(check_period(date("2020-01-01"), Some(date("2020-01-01")), false).is_ok());
        assert_eq!(
            check_period(date("2021-01-01"), Some(date("2020-01-01")), false),
            Err(DateRangeProblem::EndsBeforeStart {
                from: date("2021-01-01"),
                to: date("2020-01-01"),
            })
        );
        assert_eq!(
            check_period(date("2020-01-01"), Some(date("2021-01-01")), true),
            Err(DateRangeProblem::EndedButNowWorking {
                to: date("2021-01-01")
            })
        );
    }

    #[test]
    fn duplicate_work_slug_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.works.push(work("kaiwa", "design", &[], "2020-01-01", None, false));

        let result = validate_snapshot(&snapshot);
        assert_eq!(
            result,
            Err(ValidationError::DuplicateSlug {
                kind: RecordKind::Work,
                slug: "kaiwa".to_string(),
            })
        );
    }

    #[test]
    fn same_slug_in_different_kinds_is_fine() {
        let mut snapshot = sample_snapshot();
        snapshot.tags.push(tag("design", "Design"));
        assert!(validate_snapshot(&snapshot).is_ok());
    }

    #[test]
    fn unsafe_slugs_rejected() {
        assert!(is_url_safe("kaiwa-2_b"));
        assert!(!is_url_safe(""));
        assert!(!is_url_safe("../etc"));
        assert!(!is_url_safe("with space"));

        let mut snapshot = sample_snapshot();
        snapshot.categories.push(category("a/b", "Bad"));
        assert!(matches!(
            validate_snapshot(&snapshot),
            Err(ValidationError::InvalidSlug {
                kind: RecordKind::Category,
                ..
            })
        ));
    }

    #[test]
    fn nested_history_with_end_and_now_working_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.histories.push(history(
            "Parent",
            "2010-01-01",
            Some("2012-01-01"),
            false,
            vec![history("Child", "2010-06-01", Some("2011-01-01"), true, vec![])],
        ));

        let problems = check_snapshot(&snapshot);
        assert_eq!(problems.len(), 1);
        assert!(matches!(
            &problems[0],
            ValidationError::InvalidDateRange { kind: RecordKind::History, record, .. } if record == "Child"
        ));
    }

    #[test]
    fn work_ending_before_start_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.works.push(work(
            "backwards",
            "design",
            &[],
            "2022-01-01",
            Some("2021-01-01"),
            false,
        ));
        let err = validate_snapshot(&snapshot).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid date range on work `backwards`: ends 2021-01-01 before it starts 2022-01-01"
        );
    }

    #[test]
    fn slug_problems_reported_before_date_ranges() {
        let mut snapshot = sample_snapshot();
        snapshot.works[0].to = Some(date("2000-01-01"));
        snapshot.tags.push(tag("vue", "Vue again"));

        let problems = check_snapshot(&snapshot);
        assert_eq!(problems.len(), 2);
        assert!(matches!(
            &problems[0],
            ValidationError::DuplicateSlug { kind: RecordKind::Tag, .. }
        ));
        assert!(matches!(
            &problems[1],
            ValidationError::InvalidDateRange { kind: RecordKind::Work, .. }
        ));
    }

    #[test]
    fn all_problems_collected() {
        let mut snapshot = sample_snapshot();
        snapshot.works.push(work("kaiwa", "design", &[], "2020-01-01", None, false));
        snapshot.tags.push(tag("vue", "Vue again"));
        assert_eq!(check_snapshot(&snapshot).len(), 2);
    }
}
