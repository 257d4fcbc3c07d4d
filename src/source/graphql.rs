//! Headless CMS over GraphQL.
//!
//! List collections are paged with `first`/`skip` until a short page comes
//! back; the profile is a single request. The response handling
//! ([`extract_collection`]) and the page loop ([`paginate`]) are pure
//! functions so they can be tested without a server.

use super::{Collection, ContentSource, SourceError};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Records requested per page. Most hosted CMSes cap `first` at 100.
pub const PAGE_SIZE: usize = 100;
/// Upper bound on pages per collection, for servers that ignore `skip`.
const MAX_PAGES: usize = 1000;

const WORKS_QUERY: &str = r#"query Works($first: Int!, $skip: Int!) {
  works(first: $first, skip: $skip) {
    title
    slug
    category { name slug }
    tags { name slug }
    from
    to
    url
    shortDescription
    thumbnail { url }
    description { text image { url } }
    pickUp
  }
}"#;

const CATEGORIES_QUERY: &str = r#"query Categories($first: Int!, $skip: Int!) {
  categories(first: $first, skip: $skip) { id name slug }
}"#;

const TAGS_QUERY: &str = r#"query Tags($first: Int!, $skip: Int!) {
  tags(first: $first, skip: $skip) { id name slug works { title } }
}"#;

const HISTORIES_QUERY: &str = r#"query Histories($first: Int!, $skip: Int!) {
  histories(first: $first, skip: $skip) {
    title detail from to nowWorking
    subHistories {
      title detail from to nowWorking
      subHistories { title detail from to nowWorking }
    }
  }
}"#;

const SKILLS_QUERY: &str = r#"query Skills($first: Int!, $skip: Int!) {
  skills(first: $first, skip: $skip) {
    title category level from
    subSkills {
      title category level from
      subSkills { title category level from }
    }
  }
}"#;

const CERTIFICATIONS_QUERY: &str = r#"query Certifications($first: Int!, $skip: Int!) {
  certifications(first: $first, skip: $skip) { title date }
}"#;

const PROFILE_QUERY: &str = r#"{
  profiles(first: 1) {
    name headline hobbies email
    photo { url }
    links { label url }
  }
}"#;

/// The GraphQL document for one collection.
pub fn query_for(collection: Collection) -> &'static str {
    match collection {
        Collection::Works => WORKS_QUERY,
        Collection::Categories => CATEGORIES_QUERY,
        Collection::Tags => TAGS_QUERY,
        Collection::Histories => HISTORIES_QUERY,
        Collection::Skills => SKILLS_QUERY,
        Collection::Certifications => CERTIFICATIONS_QUERY,
        Collection::Profile => PROFILE_QUERY,
    }
}

/// Top-level field under `data` holding the collection's records.
fn data_field(collection: Collection) -> &'static str {
    match collection {
        Collection::Profile => "profiles",
        other => other.name(),
    }
}

pub struct GraphqlSource {
    client: Client,
    endpoint: String,
}

impl GraphqlSource {
    pub fn new(endpoint: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl GraphqlSource {
    fn query(&self, collection: Collection, variables: Option<Value>) -> Result<Value, SourceError> {
        let mut body = json!({ "query": query_for(collection) });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }
        let response = self.client.post(&self.endpoint).json(&body).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Query {
                collection,
                message: format!("HTTP {status}"),
            });
        }

        let payload: Value = response.json()?;
        extract_collection(collection, payload)
    }
}

impl ContentSource for GraphqlSource {
    fn fetch(&self, collection: Collection) -> Result<Value, SourceError> {
        if collection == Collection::Profile {
            return self.query(collection, None);
        }
        paginate(collection, |skip| {
            self.query(
                collection,
                Some(json!({ "first": PAGE_SIZE, "skip": skip })),
            )
        })
    }
}

/// Request pages of [`PAGE_SIZE`] records until one comes back short, and
/// concatenate them.
///
/// `fetch_page` receives the `skip` offset and returns the extracted page.
/// A `null` first page means the source has nothing for the collection and
/// is passed through unchanged.
pub fn paginate<F>(collection: Collection, mut fetch_page: F) -> Result<Value, SourceError>
where
    F: FnMut(usize) -> Result<Value, SourceError>,
{
    let mut records = Vec::new();
    for page in 0..MAX_PAGES {
        let batch = match fetch_page(page * PAGE_SIZE)? {
            Value::Null if page == 0 => return Ok(Value::Null),
            Value::Null => Vec::new(),
            Value::Array(batch) => batch,
            _ => {
                return Err(SourceError::Query {
                    collection,
                    message: format!("data.{} is not a list", data_field(collection)),
                });
            }
        };
        let short = batch.len() < PAGE_SIZE;
        records.extend(batch);
        if short {
            tracing::debug!(%collection, records = records.len(), pages = page + 1, "paged collection");
            return Ok(Value::Array(records));
        }
    }
    Err(SourceError::Query {
        collection,
        message: format!("more than {} records; is `skip` supported?", MAX_PAGES * PAGE_SIZE),
    })
}

/// Pull one collection's records out of a GraphQL response body.
///
/// - A non-empty `errors` array fails with the joined error messages.
/// - A missing or `null` `data.<field>` fails.
/// - For the profile, the first element of `profiles` is returned, or
///   `null` when there is none.
///
/// Certifications and profile are optional: a schema without them (an
/// `errors` payload) or a `null` field yields `null`, which the fetch turns
/// into empty or absent.
pub fn extract_collection(collection: Collection, payload: Value) -> Result<Value, SourceError> {
    if let Some(errors) = payload
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    {
        let message = errors
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
            })
            .collect::<Vec<_>>()
            .join("; ");
        if !collection.is_required() {
            tracing::warn!(%collection, %message, "optional collection unavailable, skipping");
            return Ok(Value::Null);
        }
        return Err(SourceError::Query {
            collection,
            message,
        });
    }

    let field = data_field(collection);
    let data = payload
        .get("data")
        .and_then(|data| data.get(field))
        .cloned()
        .unwrap_or(Value::Null);

    match (collection, data) {
        (_, Value::Null) if !collection.is_required() => Ok(Value::Null),
        (_, Value::Null) => Err(SourceError::Query {
            collection,
            message: format!("response has no data.{field}"),
        }),
        (Collection::Profile, Value::Array(profiles)) => {
            Ok(profiles.into_iter().next().unwrap_or(Value::Null))
        }
        (_, data) => Ok(data),
    }
}
