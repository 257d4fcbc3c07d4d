//! Content records shared by every pipeline stage.
//!
//! These are read-only snapshots of what the CMS holds. Field names follow the
//! CMS's camelCase on the wire so a JSON export and a GraphQL response decode
//! into the same structs. They are serialized into `snapshot.json` between
//! the fetch and resolve stages.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A portfolio project.
///
/// `to` absent means the work is ongoing. `category` and `tags` are
/// references by slug; the resolver replaces their names with the names of
/// the referenced records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub title: String,
    pub slug: String,
    pub category: Reference,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<Reference>,
    #[serde(with = "date")]
    pub from: NaiveDate,
    #[serde(default, with = "date::option")]
    pub to: Option<NaiveDate>,
    pub short_description: String,
    pub thumbnail: Asset,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Vec<DescriptionBlock>,
    #[serde(default, deserialize_with = "nullable")]
    pub pick_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Work {
    pub fn is_ongoing(&self) -> bool {
        self.to.is_none()
    }
}

/// A `{ slug, name }` pointer from a work to a category or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub slug: String,
    pub name: String,
}

/// An uploaded file in the CMS asset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub url: String,
}

/// One section of a work's long description: Markdown text with an
/// optional illustrating image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub slug: String,
    pub name: String,
    /// Back-references as the CMS reports them. Informational only: tag
    /// popularity is counted from the works themselves.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub works: Vec<WorkTitle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTitle {
    pub title: String,
}

/// A career or education entry. Self-referential: sub-histories have the
/// same shape as their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub detail: Vec<String>,
    #[serde(with = "date")]
    pub from: NaiveDate,
    #[serde(default, with = "date::option")]
    pub to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub now_working: bool,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub sub_histories: Vec<History>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub title: String,
    pub category: SkillCategory,
    pub level: u32,
    #[serde(with = "date")]
    pub from: NaiveDate,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub sub_skills: Vec<Skill>,
}

/// The fixed set of skill groupings shown on the about page.
///
/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Frontend,
    Design,
    Other,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 3] = [Self::Frontend, Self::Design, Self::Other];

    pub fn label(self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::Design => "Design",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub title: String,
    #[serde(with = "date")]
    pub date: NaiveDate,
}

/// Owner profile for the about page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Short lines under the name (role, hometown, ...).
    #[serde(default, deserialize_with = "nullable")]
    pub headline: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub hobbies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Asset>,
    #[serde(default, deserialize_with = "nullable")]
    pub links: Vec<ProfileLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    pub label: String,
    pub url: String,
}

/// Everything fetched for one build, fully materialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub works: Vec<Work>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub histories: Vec<History>,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

/// Treat an explicit `null` like a missing field. GraphQL returns `null`
/// for unset lists and booleans rather than omitting them.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Calendar dates as `YYYY-MM-DD`. RFC 3339 timestamps are accepted on input
/// and truncated to their date in the timestamp's own offset.
pub(crate) mod date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Result<NaiveDate, String> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .map_err(|_| format!("invalid date `{raw}`, expected YYYY-MM-DD or RFC 3339"))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::{FORMAT, parse};
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_some(&date.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse(&raw))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn work_decodes_from_cms_shape() {
        let work: Work = serde_json::from_value(json!({
            "title": "Kaiwa",
            "slug": "kaiwa",
            "category": { "name": "Web Application", "slug": "web-app" },
            "from": "2021-04-01",
            "to": null,
            "url": null,
            "shortDescription": "Phrasebook\nwith speech",
            "tags": [{ "name": "Vue.js", "slug": "vue" }],
            "thumbnail": { "url": "https://cdn.example.com/kaiwa.png" },
            "description": [{ "text": "Intro", "image": null }],
            "pickUp": true
        }))
        .unwrap();

        assert_eq!(work.slug, "kaiwa");
        assert!(work.is_ongoing());
        assert!(work.pick_up);
        assert_eq!(work.tags.len(), 1);
        assert_eq!(work.description[0].image, None);
        assert_eq!(work.from, NaiveDate::from_ymd_opt(2021, 4, 1).unwrap());
    }

    #[test]
    fn null_lists_and_flags_become_defaults() {
        let history: History = serde_json::from_value(json!({
            "title": "University",
            "detail": null,
            "from": "2016-04-01",
            "to": "2022-03-31",
            "nowWorking": null,
            "subHistories": null
        }))
        .unwrap();

        assert!(history.detail.is_empty());
        assert!(!history.now_working);
        assert!(history.sub_histories.is_empty());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let result: Result<Work, _> = serde_json::from_value(json!({
            "title": "No slug",
            "category": { "name": "Design", "slug": "design" },
            "from": "2021-04-01",
            "shortDescription": "",
            "thumbnail": { "url": "x" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn date_accepts_rfc3339_timestamps() {
        assert_eq!(
            date::parse("2022-04-01T00:00:00+09:00").unwrap(),
            NaiveDate::from_ymd_opt(2022, 4, 1).unwrap()
        );
        assert_eq!(
            date::parse("2020-09-01").unwrap(),
            NaiveDate::from_ymd_opt(2020, 9, 1).unwrap()
        );
        assert!(date::parse("April 2022").is_err());
    }

    #[test]
    fn dates_serialize_as_plain_calendar_dates() {
        let cert = Certification {
            title: "TOEIC 900".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 7, 4).unwrap(),
        };
        let value = serde_json::to_value(&cert).unwrap();
        assert_eq!(value["date"], "2021-07-04");
    }

    #[test]
    fn skill_category_order_is_display_order() {
        let mut categories = vec![
            SkillCategory::Other,
            SkillCategory::Frontend,
            SkillCategory::Design,
        ];
        categories.sort();
        assert_eq!(categories, SkillCategory::ALL.to_vec());
    }

    #[test]
    fn nested_skills_decode() {
        let skill: Skill = serde_json::from_value(json!({
            "title": "CSS",
            "category": "Frontend",
            "level": 4,
            "from": "2016-01-01",
            "subSkills": [
                { "title": "SCSS", "category": "Frontend", "level": 3, "from": "2020-01-01" }
            ]
        }))
        .unwrap();
        assert_eq!(skill.sub_skills.len(), 1);
        assert_eq!(skill.sub_skills[0].title, "SCSS");
    }
}
