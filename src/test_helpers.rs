//! Shared test utilities for the folio test suite.
//!
//! Record builders keep test data to one line per entity, and route lookups
//! panic with the list of what *was* there, so a failing assertion says more
//! than `None`.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let snapshot = sample_snapshot();
//! let routes = resolve(&snapshot).unwrap();
//! let page = find_route(&routes, "/works/detail/kaiwa");
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::resolve::{Route, RouteSet};
use crate::types::{
    Asset, Category, Certification, History, Reference, Skill, SkillCategory, Snapshot, Tag, Work,
};

// =========================================================================
// Fixture setup
// =========================================================================

/// `fixtures/content/` in the source tree.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content")
}

/// Copy `fixtures/content/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for entry in std::fs::read_dir(fixtures_dir()).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), tmp.path().join(entry.file_name())).unwrap();
    }
    tmp
}

// =========================================================================
// Record builders
// =========================================================================

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn reference(slug: &str) -> Reference {
    Reference {
        slug: slug.to_string(),
        name: slug.to_string(),
    }
}

/// A work whose category and tag references carry the slug as name; the
/// resolver replaces the names with the referenced records'.
pub fn work(
    slug: &str,
    category: &str,
    tags: &[&str],
    from: &str,
    to: Option<&str>,
    pick_up: bool,
) -> Work {
    Work {
        title: format!("Work {slug}"),
        slug: slug.to_string(),
        category: reference(category),
        tags: tags.iter().map(|t| reference(t)).collect(),
        from: date(from),
        to: to.map(date),
        short_description: format!("About {slug}"),
        thumbnail: Asset {
            url: format!("https://cdn.example.com/{slug}.png"),
        },
        description: vec![],
        pick_up,
        url: None,
    }
}

pub fn category(slug: &str, name: &str) -> Category {
    Category {
        id: None,
        slug: slug.to_string(),
        name: name.to_string(),
    }
}

pub fn tag(slug: &str, name: &str) -> Tag {
    Tag {
        id: None,
        slug: slug.to_string(),
        name: name.to_string(),
        works: vec![],
    }
}

pub fn history(
    title: &str,
    from: &str,
    to: Option<&str>,
    now_working: bool,
    children: Vec<History>,
) -> History {
    History {
        title: title.to_string(),
        detail: vec![],
        from: date(from),
        to: to.map(date),
        now_working,
        sub_histories: children,
    }
}

pub fn skill(title: &str, category: SkillCategory, from: &str, children: Vec<Skill>) -> Skill {
    Skill {
        title: title.to_string(),
        category,
        level: 3,
        from: date(from),
        sub_skills: children,
    }
}

/// Small but complete portfolio: two categories, three tags, three works.
///
/// - `kaiwa`: web-app, ongoing, pick-up, tags vue + python
/// - `folio`: web-app, ended 2022-03, tags gatsby + vue
/// - `banner`: design, ended 2021-03, pick-up, no tags
pub fn sample_snapshot() -> Snapshot {
    Snapshot {
        works: vec![
            work("kaiwa", "web-app", &["vue", "python"], "2021-04-01", None, true),
            work(
                "folio",
                "web-app",
                &["gatsby", "vue"],
                "2022-01-01",
                Some("2022-03-31"),
                false,
            ),
            work("banner", "design", &[], "2020-09-01", Some("2021-03-31"), true),
        ],
        categories: vec![
            category("web-app", "Web Application"),
            category("design", "Design"),
        ],
        tags: vec![
            tag("python", "Python"),
            tag("vue", "Vue.js"),
            tag("gatsby", "Gatsby"),
        ],
        histories: vec![
            history("Job", "2022-04-01", None, true, vec![]),
            history(
                "University",
                "2016-04-01",
                Some("2022-03-31"),
                false,
                vec![history("Internship", "2021-02-01", None, false, vec![])],
            ),
        ],
        skills: vec![
            skill("HTML", SkillCategory::Frontend, "2016-01-01", vec![]),
            skill("Figma", SkillCategory::Design, "2022-01-01", vec![]),
        ],
        certifications: vec![Certification {
            title: "TOEIC 900".to_string(),
            date: date("2021-06-01"),
        }],
        profile: None,
    }
}

// =========================================================================
// Route lookups: panic with a clear message on miss
// =========================================================================

/// Find a route by path. Panics if not found.
pub fn find_route<'a>(routes: &'a RouteSet, path: &str) -> &'a Route {
    routes
        .routes
        .iter()
        .find(|r| r.path == path)
        .unwrap_or_else(|| {
            let paths = route_paths(routes);
            panic!("route '{path}' not found. Available: {paths:?}")
        })
}

/// All route paths in emission order.
pub fn route_paths(routes: &RouteSet) -> Vec<&str> {
    routes.routes.iter().map(|r| r.path.as_str()).collect()
}
