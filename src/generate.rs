//! HTML site generation.
//!
//! Stage 3 of the folio build pipeline. Reads `routes.json` from the resolve
//! stage and writes one HTML page per route through [`HtmlSite`], the
//! production [`PageSink`].
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                     # /
//! ├── about/index.html               # /about
//! ├── works/
//! │   ├── index.html                 # /works
//! │   ├── detail/<slug>/index.html   # one per work
//! │   ├── category/<slug>/index.html # one per category
//! │   └── tag/<slug>/index.html      # one per tag
//! └── ...                            # files from the assets directory
//! ```
//!
//! Detail, category and tag directories whose record is gone from the route
//! set are removed after the pages are written, so a rebuild never serves a
//! page for a deleted work. Anything else in `dist/` is left alone.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Markup is semantic and unstyled; a stylesheet can be dropped into the
//! assets directory. Work descriptions are Markdown, rendered with
//! pulldown-cmark. Every page carries the same SEO head: title, description,
//! canonical URL and a twitter card.

use crate::config::SiteMeta;
use crate::manifest::{self, ManifestError};
use crate::resolve::{
    self, AboutPage, CategoryPage, HomePage, PageContext, PageSink, Route, RouteSet, TagPage,
    WorkDetailPage, WorksPage,
};
use crate::shaping::{HistoryView, SkillView, WorkGroups, WorkSummary};
use crate::types::{DescriptionBlock, Reference};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("cannot copy assets: {0}")]
    Assets(#[from] walkdir::Error),
}

/// What the generate stage wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Fingerprint of the route set the pages were rendered from.
    pub fingerprint: String,
    pub pages: Vec<WrittenPage>,
    /// Number of files copied from the assets directory.
    pub assets: usize,
    /// Stale record pages removed from the output directory.
    pub pruned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    pub path: String,
    pub kind: &'static str,
    pub file: PathBuf,
}

/// Writes `<output>/<route path>/index.html` for each registered route.
pub struct HtmlSite<'a> {
    site: &'a SiteMeta,
    output_dir: PathBuf,
    written: Vec<WrittenPage>,
}

impl<'a> HtmlSite<'a> {
    pub fn new(site: &'a SiteMeta, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            site,
            output_dir: output_dir.into(),
            written: Vec::new(),
        }
    }

    pub fn into_pages(self) -> Vec<WrittenPage> {
        self.written
    }
}

impl PageSink for HtmlSite<'_> {
    type Error = GenerateError;

    fn register(&mut self, route: &Route) -> Result<(), GenerateError> {
        let file = page_file(&self.output_dir, &route.path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, render_page(self.site, route).into_string())?;
        self.written.push(WrittenPage {
            path: route.path.clone(),
            kind: route.context.kind(),
            file,
        });
        Ok(())
    }
}

/// Render every route in `routes_path` into `output_dir` and copy the assets.
pub fn generate(
    routes_path: &Path,
    site: &SiteMeta,
    assets_dir: &Path,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let routes: RouteSet = manifest::read_json(routes_path)?;
    fs::create_dir_all(output_dir)?;

    let assets = copy_assets(assets_dir, output_dir)?;

    let mut sink = HtmlSite::new(site, output_dir);
    resolve::register_routes(&routes, &mut sink)?;
    let pages = sink.into_pages();
    let pruned = prune_stale_pages(output_dir, &pages)?;

    tracing::info!(
        pages = pages.len(),
        assets,
        pruned,
        output = %output_dir.display(),
        "generated site"
    );
    Ok(GenerateReport {
        fingerprint: routes.fingerprint,
        pages,
        assets,
        pruned,
    })
}

/// Route families whose pages come and go with CMS records.
const RECORD_PAGE_DIRS: [&str; 3] = ["works/detail", "works/category", "works/tag"];

/// Remove `<family>/<slug>/` directories holding a page that was not written
/// in this run.
fn prune_stale_pages(output_dir: &Path, written: &[WrittenPage]) -> Result<usize, GenerateError> {
    let current: HashSet<&Path> = written.iter().map(|page| page.file.as_path()).collect();
    let mut pruned = 0;
    for family in RECORD_PAGE_DIRS {
        let dir = output_dir.join(family);
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let page = entry.path().join("index.html");
            if entry.file_type()?.is_dir() && page.is_file() && !current.contains(page.as_path()) {
                tracing::debug!(dir = %entry.path().display(), "removing stale page");
                fs::remove_dir_all(entry.path())?;
                pruned += 1;
            }
        }
    }
    Ok(pruned)
}

/// `/` → `index.html`, `/works/tag/vue` → `works/tag/vue/index.html`.
pub fn page_file(output_dir: &Path, route_path: &str) -> PathBuf {
    let relative = route_path.trim_matches('/');
    if relative.is_empty() {
        output_dir.join("index.html")
    } else {
        output_dir.join(relative).join("index.html")
    }
}

/// Copy everything under `src` into `dst`, keeping the directory layout.
/// A missing assets directory copies nothing.
fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        tracing::debug!(dir = %src.display(), "no assets directory");
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Per-page values for the SEO head.
struct PageHead<'a> {
    /// `None` renders the bare site title (home page).
    title: Option<&'a str>,
    description: Option<&'a str>,
    path: &'a str,
}

/// Renders the base HTML document structure with the SEO head.
fn base_document(site: &SiteMeta, head: &PageHead, content: Markup) -> Markup {
    let title = match head.title {
        Some(title) => format!("{title} | {}", site.title),
        None => site.title.clone(),
    };
    let description = head.description.unwrap_or(site.description.as_str());
    let url = format!("{}{}", site.site_url, head.path);
    let image = format!("{}{}", site.site_url, site.image);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(description);
                meta name="image" content=(image);
                link rel="canonical" href=(url);
                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:title" content=(title);
                meta name="twitter:url" content=(url);
                meta name="twitter:description" content=(description);
                meta name="twitter:image" content=(image);
                @if !site.twitter_username.is_empty() {
                    meta name="twitter:creator" content=(site.twitter_username);
                }
            }
            body {
                (site_header(site))
                main { (content) }
            }
        }
    }
}

fn site_header(site: &SiteMeta) -> Markup {
    html! {
        header {
            a href="/" { (site.title) }
            nav {
                ul {
                    li { a href="/works" { "Works" } }
                    li { a href="/about" { "About" } }
                }
            }
        }
    }
}

/// Short descriptions keep their line breaks.
fn multiline(text: &str) -> Markup {
    html! {
        @for (idx, line) in text.lines().enumerate() {
            @if idx > 0 { br; }
            (line)
        }
    }
}

fn markdown(text: &str) -> Markup {
    let parser = Parser::new(text);
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);
    PreEscaped(body_html)
}

fn tag_links(tags: &[Reference]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.tags {
                @for tag in tags {
                    li { a href={ "/works/tag/" (tag.slug) } { "#" (tag.name) } }
                }
            }
        }
    }
}

fn work_card(work: &WorkSummary) -> Markup {
    html! {
        article.work {
            a href={ "/works/detail/" (work.slug) } {
                img src=(work.thumbnail) alt=(work.title) loading="lazy";
                h3 { (work.title) }
            }
            p.period { (work.period) }
            p.category {
                a href={ "/works/category/" (work.category.slug) } { (work.category.name) }
            }
            (tag_links(&work.tags))
            p.short-description { (multiline(&work.short_description)) }
        }
    }
}

fn work_groups(groups: &WorkGroups) -> Markup {
    html! {
        @if groups.is_empty() {
            p { "No works yet." }
        }
        @if !groups.pick_up.is_empty() {
            section.pick-up {
                h2 { "Pick up" }
                @for work in &groups.pick_up { (work_card(work)) }
            }
        }
        @if !groups.other.is_empty() {
            section.other {
                h2 { "Others" }
                @for work in &groups.other { (work_card(work)) }
            }
        }
    }
}

fn history_item(history: &HistoryView) -> Markup {
    html! {
        li {
            span.period { (history.period) }
            " "
            strong { (history.title) }
            @for line in &history.detail {
                p { (line) }
            }
            @if !history.children.is_empty() {
                ul {
                    @for child in &history.children { (history_item(child)) }
                }
            }
        }
    }
}

fn skill_item(skill: &SkillView) -> Markup {
    html! {
        li {
            (skill.title)
            " "
            meter min="0" max="5" value=(skill.level) { (skill.level) "/5" }
            " since " (skill.since)
            @if !skill.children.is_empty() {
                ul {
                    @for child in &skill.children { (skill_item(child)) }
                }
            }
        }
    }
}

fn description_block(block: &DescriptionBlock) -> Markup {
    html! {
        section.description {
            (markdown(&block.text))
            @if let Some(image) = &block.image {
                img src=(image.url) alt="" loading="lazy";
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Render the page for one route. The route is only read.
pub fn render_page(site: &SiteMeta, route: &Route) -> Markup {
    match &route.context {
        PageContext::Home(page) => render_home(site, route, page),
        PageContext::About(page) => render_about(site, route, page),
        PageContext::Works(page) => render_works(site, route, page),
        PageContext::WorkDetail(page) => render_work_detail(site, route, page),
        PageContext::Category(page) => render_category(site, route, page),
        PageContext::Tag(page) => render_tag(site, route, page),
    }
}

fn render_home(site: &SiteMeta, route: &Route, page: &HomePage) -> Markup {
    let content = html! {
        h1 { (site.title) }
        p { (site.description) }
        section.featured {
            h2 { "Featured works" }
            @for work in &page.featured { (work_card(work)) }
        }
        p { a href="/works" { "All works" } }
    };
    let head = PageHead {
        title: None,
        description: None,
        path: &route.path,
    };
    base_document(site, &head, content)
}

fn render_about(site: &SiteMeta, route: &Route, page: &AboutPage) -> Markup {
    let content = html! {
        h1 { "About" }
        @if let Some(profile) = &page.profile {
            section.profile {
                @if let Some(photo) = &profile.photo {
                    img src=(photo.url) alt=(profile.name);
                }
                h2 { (profile.name) }
                @for line in &profile.headline {
                    p { (line) }
                }
                @if !profile.hobbies.is_empty() {
                    h3 { "Hobbies" }
                    ul {
                        @for hobby in &profile.hobbies { li { (hobby) } }
                    }
                }
                @if !profile.links.is_empty() {
                    ul.links {
                        @for link in &profile.links {
                            li { a href=(link.url) rel="noopener" { (link.label) } }
                        }
                    }
                }
                @if let Some(email) = &profile.email {
                    p { a href={ "mailto:" (email) } { (email) } }
                }
            }
        }
        section.skills {
            h2 { "Skills" }
            @for group in &page.skills {
                h3 { (group.category.label()) }
                ul {
                    @for skill in &group.skills { (skill_item(skill)) }
                }
            }
        }
        section.histories {
            h2 { "History" }
            ul {
                @for history in &page.histories { (history_item(history)) }
            }
        }
        @if !page.certifications.is_empty() {
            section.certifications {
                h2 { "Certifications" }
                ul {
                    @for cert in &page.certifications {
                        li { span.period { (cert.date) } " " (cert.title) }
                    }
                }
            }
        }
    };
    let head = PageHead {
        title: Some("About"),
        description: None,
        path: &route.path,
    };
    base_document(site, &head, content)
}

fn render_works(site: &SiteMeta, route: &Route, page: &WorksPage) -> Markup {
    let content = html! {
        h1 { "Works" }
        nav.categories {
            ul {
                @for category in &page.categories {
                    li {
                        a href={ "/works/category/" (category.slug) } { (category.name) }
                        " (" (category.count) ")"
                    }
                }
            }
        }
        nav.tags {
            ul {
                @for tag in &page.tags {
                    li {
                        a href={ "/works/tag/" (tag.slug) } { "#" (tag.name) }
                        " (" (tag.count) ")"
                    }
                }
            }
        }
        (work_groups(&page.works))
    };
    let head = PageHead {
        title: Some("Works"),
        description: None,
        path: &route.path,
    };
    base_document(site, &head, content)
}

fn render_work_detail(site: &SiteMeta, route: &Route, page: &WorkDetailPage) -> Markup {
    let work = &page.work;
    let content = html! {
        article.work-detail {
            h1 { (work.title) }
            p.period { time datetime=(work.from) { (page.period_detail) } }
            p.category {
                a href={ "/works/category/" (work.category.slug) } { (work.category.name) }
            }
            (tag_links(&work.tags))
            img src=(work.thumbnail.url) alt=(work.title);
            p.short-description { (multiline(&work.short_description)) }
            @if let Some(url) = &work.url {
                p { a href=(url) rel="noopener" { (url) } }
            }
            @for block in &work.description { (description_block(block)) }
        }
    };
    let head = PageHead {
        title: Some(work.title.as_str()),
        description: Some(work.short_description.as_str()),
        path: &route.path,
    };
    base_document(site, &head, content)
}

fn render_category(site: &SiteMeta, route: &Route, page: &CategoryPage) -> Markup {
    let content = html! {
        h1 { (page.category.name) }
        (work_groups(&page.works))
        p { a href="/works" { "All works" } }
    };
    let head = PageHead {
        title: Some(page.category.name.as_str()),
        description: None,
        path: &route.path,
    };
    base_document(site, &head, content)
}

fn render_tag(site: &SiteMeta, route: &Route, page: &TagPage) -> Markup {
    let content = html! {
        h1 { "#" (page.tag.name) }
        p.count {
            (page.count) @if page.count == 1 { " work" } @else { " works" }
        }
        (work_groups(&page.works))
        p { a href="/works" { "All works" } }
    };
    let head = PageHead {
        title: Some(page.tag.name.as_str()),
        description: None,
        path: &route.path,
    };
    base_document(site, &head, content)
}

// ============================================================================
// Tests
// ============================================================================
