use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Stable identity of an article within a fetched batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ArticleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ArticleId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub headline: String,
    pub teaser: String,
    pub published_date: Option<DateTime<Utc>>,
    pub duration: String,
    pub article: String,
    pub summary: String,
    pub ai_summary: String,
}

impl Article {
    /// Text shown when `section` is expanded on this article's card.
    pub fn section_text(&self, section: SectionName) -> &str {
        match section {
            SectionName::Summary => &self.summary,
            SectionName::Article => &self.article,
            SectionName::AiSummary => &self.ai_summary,
        }
    }
}

/// An article record as delivered on the wire. Every field is optional so a
/// bad record can be reported instead of failing the whole body parse.
///
/// The news-API spellings (`url`, `title`, `description`, `publishedAt`,
/// `content`) are kept as their own fields; the primary field wins when a
/// record carries both.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    #[serde(default, deserialize_with = "de_id")]
    pub id: Option<ArticleId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub teaser: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
}

impl RawArticle {
    /// Validates the record found at `index` of its batch.
    ///
    /// Only the headline is required. Records without an id are keyed
    /// `#<index>`, which no wire id in the same batch is expected to use.
    pub fn into_article(self, index: usize) -> Result<Article> {
        let headline = match self.headline.or(self.title) {
            Some(h) if !h.trim().is_empty() => h,
            Some(_) => return Err(Error::malformed(index, "blank headline")),
            None => return Err(Error::malformed(index, "missing headline")),
        };

        let id = self
            .id
            .or_else(|| self.url.map(ArticleId::from))
            .unwrap_or_else(|| positional_id(index));

        Ok(Article {
            id,
            headline,
            teaser: self.teaser.or(self.description).unwrap_or_default(),
            published_date: self.published_date.or(self.published_at),
            duration: self.duration.unwrap_or_default(),
            article: self.article.or(self.content).unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            ai_summary: self.ai_summary.unwrap_or_default(),
        })
    }
}

fn positional_id(index: usize) -> ArticleId {
    ArticleId::new(format!("#{}", index))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

fn de_id<'de, D>(deserializer: D) -> std::result::Result<Option<ArticleId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<WireId>::deserialize(deserializer)?.map(|id| match id {
        WireId::Text(s) => ArticleId::from(s),
        WireId::Number(n) => ArticleId::from(n),
    }))
}

fn de_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid timestamp: {}", s))
}

/// Parses a fetch response body: either a JSON array of records or an
/// object carrying them under `articles`.
///
/// Records are decoded one by one so a bad field is reported against its
/// position as `MalformedData`.
pub fn parse_batch(body: &str) -> Result<Vec<RawArticle>> {
    let records = match serde_json::from_str::<Value>(body)? {
        Value::Array(records) => records,
        Value::Object(mut envelope) => match envelope.remove("articles") {
            Some(Value::Array(records)) => records,
            _ => return Err(Error::FetchFailed("response has no articles list".to_string())),
        },
        _ => return Err(Error::FetchFailed("response is not an article list".to_string())),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|e| Error::malformed(index, e.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    ByDate,
    ByDuration,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::ByDate => write!(f, "date"),
            SortKey::ByDuration => write!(f, "duration"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" | "bydate" => Ok(SortKey::ByDate),
            "duration" | "byduration" => Ok(SortKey::ByDuration),
            other => Err(format!("Invalid sort key: {} (expected date or duration)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionName {
    Summary,
    Article,
    AiSummary,
}

impl SectionName {
    pub const ALL: [SectionName; 3] = [SectionName::Summary, SectionName::Article, SectionName::AiSummary];

    pub fn label(&self) -> &'static str {
        match self {
            SectionName::Summary => "Summary",
            SectionName::Article => "Article",
            SectionName::AiSummary => "AI Summary",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SectionName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "summary" => Ok(SectionName::Summary),
            "article" => Ok(SectionName::Article),
            "aisummary" | "ai" => Ok(SectionName::AiSummary),
            _ => Err(format!("Invalid section: {} (expected summary, article or ai-summary)", s)),
        }
    }
}

/// What to ask the fetch collaborator for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchQuery {
    #[default]
    Latest,
    Search(String),
}

impl FetchQuery {
    /// Builds a query from user input; a blank term means the latest feed.
    pub fn from_term(term: Option<&str>) -> Self {
        match term.map(str::trim) {
            Some(t) if !t.is_empty() => FetchQuery::Search(t.to_string()),
            _ => FetchQuery::Latest,
        }
    }

    pub fn term(&self) -> Option<&str> {
        match self {
            FetchQuery::Latest => None,
            FetchQuery::Search(term) => Some(term),
        }
    }
}

impl fmt::Display for FetchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchQuery::Latest => write!(f, "latest"),
            FetchQuery::Search(term) => write!(f, "search \"{}\"", term),
        }
    }
}
