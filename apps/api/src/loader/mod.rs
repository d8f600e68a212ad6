use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::models::candidate::{EducationEntry, ExperienceEntry};

/// `basic_info.json` — profile payload nested under a top-level `data` key.
#[derive(Debug, Default, Deserialize)]
struct BasicInfoDoc {
    #[serde(default)]
    data: BasicInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BasicInfo {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    experience: Vec<ExperienceEntry>,
    #[serde(default)]
    education: Vec<EducationEntry>,
}

/// `personal_info.json` — contact payload nested under a top-level `data` key.
#[derive(Debug, Default, Deserialize)]
struct PersonalInfoDoc {
    #[serde(default)]
    data: PersonalInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonalInfo {
    #[serde(default)]
    primary_email: Option<String>,
    #[serde(default)]
    linkedin_url: Option<String>,
    #[serde(default)]
    display_urls: Vec<String>,
}

/// A candidate parsed from an applicant folder, ready for insertion.
#[derive(Debug)]
pub struct NewCandidate {
    pub folder_name: String,
    pub full_name: String,
    pub title: Option<String>,
    pub primary_email: Option<String>,
    pub linkedin_url: Option<String>,
    pub display_urls: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub experience_text: String,
    pub education_text: String,
    pub cv_text: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScanReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Scans the applicants root and inserts one row per folder not already in
/// the store. Folders already present are skipped without being re-read, so
/// re-running the scan never touches reviewer state. Each insert commits
/// independently; a failure partway leaves earlier rows intact.
pub async fn load_candidates(pool: &SqlitePool, root: &Path) -> Result<ScanReport> {
    if !root.exists() {
        warn!("Applicants path does not exist: {}", root.display());
        return Ok(ScanReport::default());
    }

    let mut folders: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    folders.sort();

    let mut report = ScanReport::default();
    for folder in folders {
        let Some(folder_name) = folder.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM candidates WHERE folder_name = $1")
                .bind(folder_name)
                .fetch_optional(pool)
                .await?;
        if existing.is_some() {
            report.skipped += 1;
            continue;
        }

        let candidate = parse_folder(&folder, folder_name);
        insert_candidate(pool, &candidate).await?;
        report.loaded += 1;
    }

    info!(
        "Loaded {} new candidates, skipped {} existing",
        report.loaded, report.skipped
    );
    Ok(report)
}

/// Reads both sidecar documents and derives the stored fields. Missing or
/// malformed JSON degrades to an empty document so one bad folder cannot
/// abort the whole scan.
fn parse_folder(folder: &Path, folder_name: &str) -> NewCandidate {
    let basic: BasicInfoDoc = read_json(&folder.join("basic_info.json"));
    let personal: PersonalInfoDoc = read_json(&folder.join("personal_info.json"));

    let full_name = basic
        .data
        .full_name
        .unwrap_or_else(|| folder_name.replace('-', " "));

    let experience_text = flatten_experience(&basic.data.experience);
    let education_text = flatten_education(&basic.data.education);
    let cv_text = extract_cv_text(&folder.join("cv.pdf"));

    NewCandidate {
        folder_name: folder_name.to_string(),
        full_name,
        title: basic.data.title,
        primary_email: personal.data.primary_email,
        linkedin_url: personal.data.linkedin_url,
        display_urls: filter_urls(personal.data.display_urls),
        experience: basic.data.experience,
        education: basic.data.education,
        experience_text,
        education_text,
        cv_text,
    }
}

async fn insert_candidate(pool: &SqlitePool, candidate: &NewCandidate) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO candidates
            (folder_name, full_name, title, primary_email, linkedin_url,
             display_urls, experience, education, experience_text,
             education_text, cv_text, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        "#,
    )
    .bind(&candidate.folder_name)
    .bind(&candidate.full_name)
    .bind(&candidate.title)
    .bind(&candidate.primary_email)
    .bind(&candidate.linkedin_url)
    .bind(serde_json::to_string(&candidate.display_urls)?)
    .bind(serde_json::to_string(&candidate.experience)?)
    .bind(serde_json::to_string(&candidate.education)?)
    .bind(&candidate.experience_text)
    .bind(&candidate.education_text)
    .bind(&candidate.cv_text)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed {}: {e}", path.display());
            T::default()
        }),
        Err(_) => T::default(),
    }
}

/// Drops any URL containing `arxiv.org`.
fn filter_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter().filter(|u| !u.contains("arxiv.org")).collect()
}

/// Flattens experience entries into searchable text:
/// `"{title} {organization}"` per entry, joined with `", "`.
fn flatten_experience(entries: &[ExperienceEntry]) -> String {
    let parts: Vec<String> = entries
        .iter()
        .filter_map(|e| {
            let title = e.title.as_deref().unwrap_or("");
            let organization = e.organization.as_deref().unwrap_or("");
            if title.is_empty() && organization.is_empty() {
                None
            } else {
                Some(format!("{title} {organization}").trim().to_string())
            }
        })
        .collect();
    parts.join(", ")
}

/// Flattens education entries into searchable text:
/// `"{degree} {major} {school}"` per entry, joined with `", "`.
fn flatten_education(entries: &[EducationEntry]) -> String {
    let parts: Vec<String> = entries
        .iter()
        .filter_map(|e| {
            let degree = e.degree.as_deref().unwrap_or("");
            let major = e.major.as_deref().unwrap_or("");
            let school = e.school.as_deref().unwrap_or("");
            if degree.is_empty() && major.is_empty() && school.is_empty() {
                None
            } else {
                Some(
                    format!("{degree} {major} {school}")
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            }
        })
        .collect();
    parts.join(", ")
}

/// Extracts plain text from the candidate's CV for search. Absent or
/// unreadable PDFs yield `None`; extraction problems are logged, not fatal.
fn extract_cv_text(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    match pdf_extract::extract_text(path) {
        Ok(text) => {
            let cleaned: String = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        }
        Err(e) => {
            warn!("Failed to extract text from {}: {e}", path.display());
            None
        }
    }
}
