//! Page resolution: snapshot → routes.
//!
//! Stage 2 of the folio build pipeline. Takes the complete snapshot produced
//! by the fetch stage and decides which pages exist and what data each one is
//! bound to. Nothing is rendered here; routes are handed to a [`PageSink`].
//!
//! ## Generated Routes
//!
//! ```text
//! /                          Home: featured (pick-up) works
//! /about                     Profile, skills, history, certifications
//! /works                     All works, ranked tags, categories
//! /works/detail/<slug>       One per work
//! /works/category/<slug>     One per category, its works split pick-up/other
//! /works/tag/<slug>          One per tag, its works split pick-up/other
//! ```
//!
//! Routes are emitted in that order; detail, category and tag routes follow
//! snapshot order. Paths are unique as long as slugs are, which
//! [`validate`](crate::validate) checks before anything is resolved.
//!
//! ## Cross-references
//!
//! A work points at its category and tags by slug. Resolution replaces the
//! names on those references with the names of the referenced records, so a
//! renamed category shows up everywhere at once. A slug that points at
//! nothing fails the build: the work is never dropped silently.
//!
//! ## Determinism
//!
//! Resolving the same snapshot twice gives the same routes, byte for byte.
//! [`RouteSet::fingerprint`] is a SHA-256 of the serialized route list, so the
//! property can be checked from the outside.

use crate::manifest;
use crate::shaping::{
    self, CertificationView, HistoryView, RankedTag, SkillGroup, WorkGroups, WorkSummary,
};
use crate::types::{Category, Profile, Reference, Snapshot, Tag, Work};
use crate::validate::{self, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("work `{work}` references unknown {kind} `{slug}`")]
    MissingReference {
        work: String,
        kind: ReferenceKind,
        slug: String,
    },
    #[error("Invalid content: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Category,
    Tag,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Category => "category",
            Self::Tag => "tag",
        })
    }
}

/// One generated page: where it lives and what it shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub context: PageContext,
}

/// The data bound to a route. Sinks read it; they never change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageContext {
    Home(HomePage),
    About(AboutPage),
    Works(WorksPage),
    WorkDetail(WorkDetailPage),
    Category(CategoryPage),
    Tag(TagPage),
}

impl PageContext {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Home(_) => "home",
            Self::About(_) => "about",
            Self::Works(_) => "works",
            Self::WorkDetail(_) => "work",
            Self::Category(_) => "category",
            Self::Tag(_) => "tag",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomePage {
    pub featured: Vec<WorkSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    pub skills: Vec<SkillGroup>,
    pub histories: Vec<HistoryView>,
    pub certifications: Vec<CertificationView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksPage {
    pub works: WorkGroups,
    pub tags: Vec<RankedTag>,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub slug: String,
    pub name: String,
    pub count: usize,
}

/// The full work record, with category and tag names taken from the
/// referenced records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDetailPage {
    pub work: Work,
    /// `2021.4 - present`
    pub period: String,
    /// `2021.4.1 - present`
    pub period_detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPage {
    pub slug: String,
    pub category: Category,
    pub works: WorkGroups,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPage {
    pub slug: String,
    pub tag: Tag,
    pub count: usize,
    pub works: WorkGroups,
}

/// Every route of one build, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSet {
    /// Fingerprint of the snapshot these routes were resolved from.
    pub source: String,
    /// Fingerprint of `routes`.
    pub fingerprint: String,
    pub routes: Vec<Route>,
}

impl RouteSet {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Receives resolved routes, one at a time, in order.
///
/// The HTML writer in [`crate::generate`] is the production sink; tests use
/// sinks that just record what they were given.
pub trait PageSink {
    type Error;

    fn register(&mut self, route: &Route) -> Result<(), Self::Error>;
}

/// Hand every route to `sink`. Stops at the first sink error.
pub fn register_routes<S: PageSink>(routes: &RouteSet, sink: &mut S) -> Result<usize, S::Error> {
    for route in &routes.routes {
        tracing::debug!(path = %route.path, kind = route.context.kind(), "registering route");
        sink.register(route)?;
    }
    Ok(routes.len())
}

/// Validate the snapshot and resolve every route.
///
/// Fails without producing any routes if validation fails or a work points
/// at a category or tag that is not in the snapshot.
pub fn resolve(snapshot: &Snapshot) -> Result<RouteSet, ResolveError> {
    validate::validate_snapshot(snapshot)?;

    let catalog = Catalog::new(snapshot);
    let works = snapshot
        .works
        .iter()
        .map(|w| catalog.link(w))
        .collect::<Result<Vec<_>, _>>()?;

    let mut routes = Vec::with_capacity(3 + works.len() + catalog.len());
    routes.push(home_route(&works));
    routes.push(about_route(snapshot));
    routes.push(works_route(snapshot, &works));

    for work in &works {
        routes.push(Route {
            path: format!("/works/detail/{}", work.slug),
            context: PageContext::WorkDetail(WorkDetailPage {
                work: work.clone(),
                period: shaping::work_period(work),
                period_detail: shaping::work_period_detail(work),
            }),
        });
    }

    for category in &snapshot.categories {
        let members: Vec<&Work> = works
            .iter()
            .filter(|w| w.category.slug == category.slug)
            .collect();
        routes.push(Route {
            path: format!("/works/category/{}", category.slug),
            context: PageContext::Category(CategoryPage {
                slug: category.slug.clone(),
                category: category.clone(),
                works: WorkGroups::build(members),
            }),
        });
    }

    let counts = shaping::tag_counts(&works);
    for tag in &snapshot.tags {
        let members: Vec<&Work> = works
            .iter()
            .filter(|w| w.tags.iter().any(|t| t.slug == tag.slug))
            .collect();
        routes.push(Route {
            path: format!("/works/tag/{}", tag.slug),
            context: PageContext::Tag(TagPage {
                slug: tag.slug.clone(),
                tag: tag.clone(),
                count: counts.get(tag.slug.as_str()).copied().unwrap_or(0),
                works: WorkGroups::build(members),
            }),
        });
    }

    let source = manifest::fingerprint(snapshot);
    let fingerprint = manifest::fingerprint(&routes);
    tracing::info!(routes = routes.len(), %fingerprint, "resolved routes");

    Ok(RouteSet {
        source,
        fingerprint,
        routes,
    })
}

fn home_route(works: &[Work]) -> Route {
    let featured = WorkGroups::build(works.iter().filter(|w| w.pick_up).collect());
    Route {
        path: "/".to_string(),
        context: PageContext::Home(HomePage {
            featured: featured.pick_up,
        }),
    }
}

fn about_route(snapshot: &Snapshot) -> Route {
    Route {
        path: "/about".to_string(),
        context: PageContext::About(AboutPage {
            profile: snapshot.profile.clone(),
            skills: shaping::group_skills(&snapshot.skills),
            histories: shaping::shape_histories(&snapshot.histories),
            certifications: shaping::shape_certifications(&snapshot.certifications),
        }),
    }
}

fn works_route(snapshot: &Snapshot, works: &[Work]) -> Route {
    let categories = snapshot
        .categories
        .iter()
        .map(|c| CategoryCount {
            slug: c.slug.clone(),
            name: c.name.clone(),
            count: works.iter().filter(|w| w.category.slug == c.slug).count(),
        })
        .collect();
    Route {
        path: "/works".to_string(),
        context: PageContext::Works(WorksPage {
            works: WorkGroups::build(works.iter().collect()),
            tags: shaping::rank_tags(&snapshot.tags, works),
            categories,
        }),
    }
}

/// Slug lookups over categories and tags.
struct Catalog<'a> {
    categories: HashMap<&'a str, &'a Category>,
    tags: HashMap<&'a str, &'a Tag>,
}

impl<'a> Catalog<'a> {
    fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            categories: snapshot
                .categories
                .iter()
                .map(|c| (c.slug.as_str(), c))
                .collect(),
            tags: snapshot.tags.iter().map(|t| (t.slug.as_str(), t)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.categories.len() + self.tags.len()
    }

    /// Copy of `work` with its references' names taken from the catalog.
    fn link(&self, work: &Work) -> Result<Work, ResolveError> {
        let missing = |kind, slug: &str| ResolveError::MissingReference {
            work: work.slug.clone(),
            kind,
            slug: slug.to_string(),
        };

        let category = self
            .categories
            .get(work.category.slug.as_str())
            .ok_or_else(|| missing(ReferenceKind::Category, &work.category.slug))?;

        let tags = work
            .tags
            .iter()
            .map(|t| {
                self.tags
                    .get(t.slug.as_str())
                    .map(|tag| Reference {
                        slug: tag.slug.clone(),
                        name: tag.name.clone(),
                    })
                    .ok_or_else(|| missing(ReferenceKind::Tag, &t.slug))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Work {
            category: Reference {
                slug: category.slug.clone(),
                name: category.name.clone(),
            },
            tags,
            ..work.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    /// Records every route it is given.
    #[derive(Default)]
    struct RecordingSink {
        paths: Vec<String>,
    }

    impl PageSink for RecordingSink {
        type Error = String;

        fn register(&mut self, route: &Route) -> Result<(), String> {
            self.paths.push(route.path.clone());
            Ok(())
        }
    }

    /// Fails on the n-th route.
    struct FailingSink {
        remaining: usize,
    }

    impl PageSink for FailingSink {
        type Error = String;

        fn register(&mut self, route: &Route) -> Result<(), String> {
            if self.remaining == 0 {
                return Err(format!("cannot write {}", route.path));
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    fn work_slugs(groups: &WorkGroups) -> (Vec<&str>, Vec<&str>) {
        (
            groups.pick_up.iter().map(|w| w.slug.as_str()).collect(),
            groups.other.iter().map(|w| w.slug.as_str()).collect(),
        )
    }

    #[test]
    fn routes_in_emission_order() {
        let routes = resolve(&sample_snapshot()).unwrap();
        assert_eq!(
            route_paths(&routes),
            vec![
                "/",
                "/about",
                "/works",
                "/works/detail/kaiwa",
                "/works/detail/folio",
                "/works/detail/banner",
                "/works/category/web-app",
                "/works/category/design",
                "/works/tag/python",
                "/works/tag/vue",
                "/works/tag/gatsby",
            ]
        );
    }

    #[test]
    fn detail_route_carries_the_full_work() {
        let snapshot = sample_snapshot();
        let routes = resolve(&snapshot).unwrap();

        let detail = routes
            .routes
            .iter()
            .filter(|r| matches!(&r.context, PageContext::WorkDetail(p) if p.work.slug == "kaiwa"))
            .collect::<Vec<_>>();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0].path, "/works/detail/kaiwa");

        let PageContext::WorkDetail(page) = &detail[0].context else {
            panic!("expected a work detail page");
        };
        assert_eq!(page.work.title, snapshot.works[0].title);
        assert_eq!(page.work.from, snapshot.works[0].from);
        assert_eq!(page.period, "2021.4 - present");
        assert_eq!(page.period_detail, "2021.4.1 - present");
    }

    #[test]
    fn references_take_names_from_records() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let PageContext::WorkDetail(page) = &find_route(&routes, "/works/detail/kaiwa").context
        else {
            panic!("expected a work detail page");
        };
        assert_eq!(page.work.category.name, "Web Application");
        let tag_names: Vec<&str> = page.work.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["Vue.js", "Python"]);
    }

    #[test]
    fn category_route_holds_only_its_works() {
        let mut snapshot = sample_snapshot();
        snapshot.categories = vec![category("design", "Design"), category("web-app", "Web")];
        snapshot.works = vec![
            work("poster", "design", &[], "2020-01-01", Some("2020-02-01"), true),
            work("kaiwa", "web-app", &[], "2021-01-01", None, false),
            work("logo", "design", &[], "2019-01-01", Some("2019-05-01"), false),
        ];
        let routes = resolve(&snapshot).unwrap();

        let PageContext::Category(page) = &find_route(&routes, "/works/category/design").context
        else {
            panic!("expected a category page");
        };
        assert_eq!(page.slug, "design");
        assert_eq!(page.category.name, "Design");
        assert_eq!(page.works.len(), 2);
        let (pick_up, other) = work_slugs(&page.works);
        assert_eq!(pick_up, vec!["poster"]);
        assert_eq!(other, vec!["logo"]);
        assert!(!page.works.iter().any(|w| w.slug == "kaiwa"));
    }

    #[test]
    fn category_works_sorted_by_recency_within_partitions() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let PageContext::Category(page) = &find_route(&routes, "/works/category/web-app").context
        else {
            panic!("expected a category page");
        };
        let (pick_up, other) = work_slugs(&page.works);
        assert_eq!(pick_up, vec!["kaiwa"]);
        assert_eq!(other, vec!["folio"]);
    }

    #[test]
    fn tag_route_has_count_and_tagged_works() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let PageContext::Tag(page) = &find_route(&routes, "/works/tag/vue").context else {
            panic!("expected a tag page");
        };
        assert_eq!(page.slug, "vue");
        assert_eq!(page.tag.name, "Vue.js");
        assert_eq!(page.count, 2);
        let (pick_up, other) = work_slugs(&page.works);
        assert_eq!(pick_up, vec!["kaiwa"]);
        assert_eq!(other, vec!["folio"]);
    }

    #[test]
    fn works_page_ranks_tags_and_counts_categories() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let PageContext::Works(page) = &find_route(&routes, "/works").context else {
            panic!("expected the works page");
        };
        let tags: Vec<(&str, usize)> = page.tags.iter().map(|t| (t.slug.as_str(), t.count)).collect();
        assert_eq!(tags, vec![("vue", 2), ("python", 1), ("gatsby", 1)]);

        let categories: Vec<(&str, usize)> = page
            .categories
            .iter()
            .map(|c| (c.slug.as_str(), c.count))
            .collect();
        assert_eq!(categories, vec![("web-app", 2), ("design", 1)]);

        let (pick_up, other) = work_slugs(&page.works);
        assert_eq!(pick_up, vec!["kaiwa", "banner"]);
        assert_eq!(other, vec!["folio"]);
    }

    #[test]
    fn home_features_pick_up_works() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let PageContext::Home(page) = &find_route(&routes, "/").context else {
            panic!("expected the home page");
        };
        let featured: Vec<&str> = page.featured.iter().map(|w| w.slug.as_str()).collect();
        assert_eq!(featured, vec!["kaiwa", "banner"]);
    }

    #[test]
    fn about_page_is_shaped() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let PageContext::About(page) = &find_route(&routes, "/about").context else {
            panic!("expected the about page");
        };
        let histories: Vec<(&str, &str)> = page
            .histories
            .iter()
            .map(|h| (h.title.as_str(), h.period.as_str()))
            .collect();
        assert_eq!(
            histories,
            vec![
                ("University", "2016.4 - 2022.3"),
                ("Job", "2022.4 - present")
            ]
        );
        assert_eq!(page.histories[0].children[0].period, "2021.2");
        assert_eq!(page.skills.len(), 2);
        assert_eq!(page.certifications[0].date, "2021.6");
    }

    #[test]
    fn dangling_category_fails_the_build() {
        let mut snapshot = sample_snapshot();
        snapshot
            .works
            .push(work("ghost", "missing", &[], "2020-01-01", None, false));
        assert_eq!(
            resolve(&snapshot),
            Err(ResolveError::MissingReference {
                work: "ghost".to_string(),
                kind: ReferenceKind::Category,
                slug: "missing".to_string(),
            })
        );
    }

    #[test]
    fn dangling_tag_fails_the_build() {
        let mut snapshot = sample_snapshot();
        snapshot.works[1].tags.push(Reference {
            slug: "rust".to_string(),
            name: "Rust".to_string(),
        });
        let err = resolve(&snapshot).unwrap_err();
        assert_eq!(err.to_string(), "work `folio` references unknown tag `rust`");
    }

    #[test]
    fn invalid_snapshot_fails_before_resolution() {
        let mut snapshot = sample_snapshot();
        snapshot.histories[0].to = Some(date("2023-01-01"));
        assert!(matches!(
            resolve(&snapshot),
            Err(ResolveError::Validation(ValidationError::InvalidDateRange { .. }))
        ));
    }

    #[test]
    fn resolution_is_idempotent() {
        let snapshot = sample_snapshot();
        let first = resolve(&snapshot).unwrap();
        let second = resolve(&snapshot).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(first.fingerprint.len(), 64);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut snapshot = sample_snapshot();
        let before = resolve(&snapshot).unwrap();
        snapshot.works[0].title = "Kaiwa 2".to_string();
        let after = resolve(&snapshot).unwrap();
        assert_ne!(before.fingerprint, after.fingerprint);
        assert_ne!(before.source, after.source);
    }

    #[test]
    fn empty_snapshot_still_has_static_pages() {
        let routes = resolve(&Snapshot::default()).unwrap();
        assert_eq!(route_paths(&routes), vec!["/", "/about", "/works"]);
    }

    #[test]
    fn sink_receives_every_route_in_order() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let mut sink = RecordingSink::default();
        let count = register_routes(&routes, &mut sink).unwrap();
        assert_eq!(count, routes.len());
        assert_eq!(sink.paths, route_paths(&routes));
    }

    #[test]
    fn sink_error_stops_registration() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let mut sink = FailingSink { remaining: 2 };
        let err = register_routes(&routes, &mut sink).unwrap_err();
        assert_eq!(err, "cannot write /works");
    }

    #[test]
    fn route_set_round_trips_through_json() {
        let routes = resolve(&sample_snapshot()).unwrap();
        let json = serde_json::to_string(&routes).unwrap();
        let back: RouteSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, routes);
        assert!(json.contains(r#""kind":"work_detail""#));
    }
}
