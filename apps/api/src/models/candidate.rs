use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One candidate row per applicant folder. Profile fields are written once by
/// the loader and never mutated afterwards; reviewer state (`starred`,
/// `notes`, `viewed`) changes only through the update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub folder_name: String,
    pub full_name: String,
    pub title: Option<String>,
    pub primary_email: Option<String>,
    pub linkedin_url: Option<String>,
    /// JSON-encoded `Vec<String>`, arxiv.org links already filtered out.
    pub display_urls: String,
    /// JSON-encoded `Vec<ExperienceEntry>`.
    pub experience: String,
    /// JSON-encoded `Vec<EducationEntry>`.
    pub education: String,
    pub experience_text: Option<String>,
    pub education_text: Option<String>,
    pub cv_text: Option<String>,
    pub starred: bool,
    pub notes: Option<String>,
    pub viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One position from the sidecar `experience` list. The sidecar files name
/// the employer `work`; it is accepted on input and serialized back out as
/// `organization`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "work")]
    pub organization: Option<String>,
    /// `[start, end]` strings as found in the sidecar.
    #[serde(default)]
    pub time: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub time: Option<Vec<String>>,
}

/// Full candidate record as returned by `GET /api/candidates/{id}` and
/// `PATCH /api/candidates/{id}`, with the JSON columns decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDetail {
    pub id: i64,
    pub folder_name: String,
    pub full_name: String,
    pub title: Option<String>,
    pub primary_email: Option<String>,
    pub linkedin_url: Option<String>,
    pub display_urls: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub experience_text: Option<String>,
    pub education_text: Option<String>,
    pub cv_text: Option<String>,
    pub starred: bool,
    pub notes: Option<String>,
    pub viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateDetail {
    fn from(row: CandidateRow) -> Self {
        CandidateDetail {
            id: row.id,
            folder_name: row.folder_name,
            full_name: row.full_name,
            title: row.title,
            primary_email: row.primary_email,
            linkedin_url: row.linkedin_url,
            display_urls: decode_list(&row.display_urls),
            experience: decode_list(&row.experience),
            education: decode_list(&row.education),
            experience_text: row.experience_text,
            education_text: row.education_text,
            cv_text: row.cv_text,
            starred: row.starred,
            notes: row.notes,
            viewed: row.viewed,
            viewed_at: row.viewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A JSON column that fails to decode yields an empty list rather than a 500.
fn decode_list<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Lightweight projection for the list/navigation view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: i64,
    pub folder_name: String,
    pub full_name: String,
    pub title: Option<String>,
    pub starred: bool,
    pub viewed: bool,
    pub has_notes: bool,
}

/// Projection returned by `GET /api/search`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchHit {
    pub id: i64,
    pub folder_name: String,
    pub full_name: String,
    pub title: Option<String>,
    pub education_text: Option<String>,
    pub experience_text: Option<String>,
    pub starred: bool,
    pub viewed: bool,
}

/// Merge-patch body for `PATCH /api/candidates/{id}`: absent fields are left
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub viewed: i64,
    pub unviewed: i64,
    pub starred: i64,
    pub with_notes: i64,
}

/// `data` payload of `GET /api/candidates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateListData {
    pub candidates: Vec<CandidateSummary>,
}

/// `data` payload of `GET /api/search`, echoing the query back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchData {
    pub candidates: Vec<SearchHit>,
    pub query: String,
}

/// True when notes are present and non-empty after trimming.
pub fn has_notes(notes: Option<&str>) -> bool {
    notes.map_or(false, |n| !n.trim().is_empty())
}
