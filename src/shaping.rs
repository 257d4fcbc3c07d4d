//! Pure transformations from content records to render-ready view models.
//!
//! Nothing in here touches the filesystem or holds state. Every function takes
//! borrowed records and returns new values, so the resolver can call them in
//! any order and get the same result.
//!
//! ## Orderings
//!
//! | Operation | Order | Ties |
//! |---|---|---|
//! | [`sort_by_recency`] | `to` descending, ongoing first | input order |
//! | [`rank_tags`] | usage count descending | input order |
//! | [`shape_histories`] | `from` ascending, at every level | input order |
//!
//! Tag ties are deliberately left in the order the CMS returned them. There
//! is no secondary alphabetical key.
//!
//! ## Period labels
//!
//! Dates are shown as `year.month` without zero padding (`2020.9`), and
//! ranges as one of three forms:
//!
//! ```text
//! 2020.9 - 2021.3     closed range
//! 2022.4 - present    open-ended
//! 2013.4              single point
//! ```

use crate::types::{Certification, History, Reference, Skill, SkillCategory, Tag, Work};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// `2020-09-01` → `"2020.9"`.
pub fn year_month(date: NaiveDate) -> String {
    format!("{}.{}", date.year(), date.month())
}

/// `2020-09-01` → `"2020.9.1"`.
pub fn year_month_day(date: NaiveDate) -> String {
    format!("{}.{}.{}", date.year(), date.month(), date.day())
}

/// Resolve a period to exactly one of the three label forms.
///
/// `to` and `now_working` must not both be set; snapshots are checked for
/// that at ingestion (see [`crate::validate`]). If it happens anyway the
/// closed range wins.
pub fn period_label(from: NaiveDate, to: Option<NaiveDate>, now_working: bool) -> String {
    debug_assert!(
        !(to.is_some() && now_working),
        "period with both an end date and now_working"
    );
    match (to, now_working) {
        (Some(to), _) => format!("{} - {}", year_month(from), year_month(to)),
        (None, true) => format!("{} - present", year_month(from)),
        (None, false) => year_month(from),
    }
}

/// Month-precision period of a work. A work without an end date is ongoing.
pub fn work_period(work: &Work) -> String {
    period_label(work.from, work.to, work.is_ongoing())
}

/// Day-precision period of a work, for the detail page.
pub fn work_period_detail(work: &Work) -> String {
    match work.to {
        Some(to) => format!("{} - {}", year_month_day(work.from), year_month_day(to)),
        None => format!("{} - present", year_month_day(work.from)),
    }
}

/// Split works into `(pick_up, other)`, keeping relative order in both.
pub fn partition_pick_up<T: Borrow<Work>>(works: Vec<T>) -> (Vec<T>, Vec<T>) {
    works.into_iter().partition(|w| w.borrow().pick_up)
}

/// Sort works newest first by end date. Ongoing works sort before everything.
///
/// The sort is stable: works ending on the same day keep their input order.
pub fn sort_by_recency<T: Borrow<Work>>(works: &mut [T]) {
    works.sort_by_key(|w| {
        let to = w.borrow().to;
        (to.is_some(), Reverse(to))
    });
}

/// A tag with the number of works that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTag {
    pub slug: String,
    pub name: String,
    pub count: usize,
}

/// Count works per tag slug. A work listing the same tag twice counts once.
pub fn tag_counts(works: &[Work]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for work in works {
        let mut seen = HashSet::new();
        for tag in &work.tags {
            if seen.insert(tag.slug.as_str()) {
                *counts.entry(tag.slug.as_str()).or_default() += 1;
            }
        }
    }
    counts
}

/// Rank tags by popularity, most used first. Equal counts keep input order.
pub fn rank_tags(tags: &[Tag], works: &[Work]) -> Vec<RankedTag> {
    let counts = tag_counts(works);
    let mut ranked: Vec<RankedTag> = tags
        .iter()
        .map(|tag| RankedTag {
            slug: tag.slug.clone(),
            name: tag.name.clone(),
            count: counts.get(tag.slug.as_str()).copied().unwrap_or(0),
        })
        .collect();
    ranked.sort_by_key(|t| Reverse(t.count));
    ranked
}

/// Compact listing entry for a work (cards on the works, category and tag pages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub title: String,
    pub slug: String,
    pub category: Reference,
    pub tags: Vec<Reference>,
    pub short_description: String,
    pub thumbnail: String,
    pub period: String,
    pub pick_up: bool,
}

impl WorkSummary {
    pub fn of(work: &Work) -> Self {
        Self {
            title: work.title.clone(),
            slug: work.slug.clone(),
            category: work.category.clone(),
            tags: work.tags.clone(),
            short_description: work.short_description.clone(),
            thumbnail: work.thumbnail.url.clone(),
            period: work_period(work),
            pick_up: work.pick_up,
        }
    }
}

/// Works split for display: featured ones first, then the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkGroups {
    pub pick_up: Vec<WorkSummary>,
    pub other: Vec<WorkSummary>,
}

impl WorkGroups {
    /// Sort by recency, then partition on the pick-up flag.
    pub fn build<T: Borrow<Work>>(mut works: Vec<T>) -> Self {
        sort_by_recency(&mut works);
        let (pick_up, other) = partition_pick_up(works);
        Self {
            pick_up: pick_up.iter().map(|w| WorkSummary::of(w.borrow())).collect(),
            other: other.iter().map(|w| WorkSummary::of(w.borrow())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pick_up.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Featured works first, then the rest.
    pub fn iter(&self) -> impl Iterator<Item = &WorkSummary> {
        self.pick_up.iter().chain(self.other.iter())
    }
}

// ============================================================================
// Nested records
// ============================================================================

/// Records whose children have their own shape.
///
/// Node-based CMS sources list nested entries at the top level as well as
/// under their parent, so [`roots`] needs a way to recognise the same entry
/// in both places. `identity` is `(title, from)`: a top-level entry sharing
/// both with a nested entry anywhere in the list is treated as that entry.
pub trait Nested: Sized {
    fn children(&self) -> &[Self];
    fn identity(&self) -> (&str, NaiveDate);
}

impl Nested for History {
    fn children(&self) -> &[Self] {
        &self.sub_histories
    }

    fn identity(&self) -> (&str, NaiveDate) {
        (&self.title, self.from)
    }
}

impl Nested for Skill {
    fn children(&self) -> &[Self] {
        &self.sub_skills
    }

    fn identity(&self) -> (&str, NaiveDate) {
        (&self.title, self.from)
    }
}

/// Entries that are not a descendant of any other entry, in input order.
pub fn roots<T: Nested>(items: &[T]) -> Vec<&T> {
    fn descendants<'a, T: Nested>(items: &'a [T], out: &mut HashSet<(&'a str, NaiveDate)>) {
        for item in items {
            out.insert(item.identity());
            descendants(item.children(), out);
        }
    }

    let mut nested = HashSet::new();
    for item in items {
        descendants(item.children(), &mut nested);
    }
    items
        .iter()
        .filter(|item| {
            let (title, from) = item.identity();
            let keep = !nested.contains(&(title, from));
            if !keep {
                tracing::debug!(title, %from, "dropping top-level entry listed under a parent");
            }
            keep
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryView {
    pub title: String,
    pub detail: Vec<String>,
    pub period: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HistoryView>,
}

/// Shape one history entry and, recursively, everything under it.
pub fn shape_history(history: &History) -> HistoryView {
    let mut children: Vec<&History> = history.sub_histories.iter().collect();
    children.sort_by_key(|h| h.from);
    HistoryView {
        title: history.title.clone(),
        detail: history.detail.clone(),
        period: period_label(history.from, history.to, history.now_working),
        children: children.into_iter().map(shape_history).collect(),
    }
}

/// Root histories, oldest first, each shaped recursively.
pub fn shape_histories(histories: &[History]) -> Vec<HistoryView> {
    let mut top = roots(histories);
    top.sort_by_key(|h| h.from);
    top.into_iter().map(shape_history).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillView {
    pub title: String,
    pub level: u32,
    /// Year the skill was picked up.
    pub since: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SkillView>,
}

pub fn shape_skill(skill: &Skill) -> SkillView {
    SkillView {
        title: skill.title.clone(),
        level: skill.level,
        since: skill.from.year(),
        children: skill.sub_skills.iter().map(shape_skill).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: SkillCategory,
    pub skills: Vec<SkillView>,
}

/// Group root skills by category in [`SkillCategory::ALL`] order. Empty
/// groups are dropped. A sub-skill stays under its parent whatever its own
/// category says.
pub fn group_skills(skills: &[Skill]) -> Vec<SkillGroup> {
    let top = roots(skills);
    SkillCategory::ALL
        .iter()
        .map(|&category| SkillGroup {
            category,
            skills: top
                .iter()
                .filter(|s| s.category == category)
                .map(|s| shape_skill(s))
                .collect(),
        })
        .filter(|group| !group.skills.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationView {
    pub title: String,
    pub date: String,
}

pub fn shape_certifications(certifications: &[Certification]) -> Vec<CertificationView> {
    certifications
        .iter()
        .map(|c| CertificationView {
            title: c.title.clone(),
            date: year_month(c.date),
        })
        .collect()
}
