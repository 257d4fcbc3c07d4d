//! # Folio
//!
//! A static site generator for a personal portfolio whose content lives in a
//! headless CMS. Works, categories, tags, career history, skills and
//! certifications are fetched once, shaped into page data, and rendered to
//! plain HTML.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Folio processes content through three independent stages, each producing
//! a JSON artifact that the next stage consumes:
//!
//! ```text
//! 1. Fetch     content store  →  snapshot.json   (every collection, fully materialized)
//! 2. Resolve   snapshot       →  routes.json     (validated, one context per page)
//! 3. Generate  routes         →  dist/           (final HTML site)
//! ```
//!
//! Both artifacts are human-readable and fingerprinted with SHA-256, so a
//! stage can be rerun on its own and an unchanged input is visible as an
//! unchanged fingerprint.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`source`] | Stage 1: reads every collection from a JSON export or a GraphQL CMS, in parallel |
//! | [`validate`] | Ingestion checks: unique URL-safe slugs, ordered date ranges |
//! | [`resolve`] | Stage 2: builds the route list and hands routes to a [`resolve::PageSink`] |
//! | [`shaping`] | Pure helpers: period labels, recency order, pick-up split, tag ranking, nesting |
//! | [`generate`] | Stage 3: the HTML sink, rendered with Maud |
//! | [`config`] | `config.toml` loading, merging onto stock defaults, validation |
//! | [`types`] | Content records shared by every stage |
//! | [`manifest`] | Artifact reading, writing and fingerprinting |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## Fetch Everything, Then Resolve
//!
//! The resolver never talks to the content store. It works from one complete
//! snapshot, which makes resolution a pure function: easy to test, and
//! repeatable byte for byte.
//!
//! ## Broken References Fail the Build
//!
//! A work that points at a category or tag that does not exist stops the
//! build with an error naming both. Quietly dropping the work would publish
//! an incomplete portfolio with no hint as to why.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed markup is a build error, and every
//! interpolated value is escaped.

pub mod config;
pub mod generate;
pub mod manifest;
pub mod output;
pub mod resolve;
pub mod shaping;
pub mod source;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
