use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::candidate::{
    has_notes, CandidateDetail, CandidateRow, CandidateSummary, CandidateUpdate, SearchHit, Stats,
};

/// Stable ordering for every listing: name first, id as tiebreak.
const LIST_ORDER: &str = "ORDER BY full_name, id";

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i64,
    folder_name: String,
    full_name: String,
    title: Option<String>,
    starred: bool,
    viewed: bool,
    notes: Option<String>,
}

/// Returns all candidates as lightweight summary projections.
pub async fn list_summaries(pool: &SqlitePool) -> Result<Vec<CandidateSummary>, AppError> {
    let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
        "SELECT id, folder_name, full_name, title, starred, viewed, notes
         FROM candidates {LIST_ORDER}"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CandidateSummary {
            id: row.id,
            folder_name: row.folder_name,
            full_name: row.full_name,
            title: row.title,
            starred: row.starred,
            viewed: row.viewed,
            has_notes: has_notes(row.notes.as_deref()),
        })
        .collect())
}

/// Returns the full record. First read marks the candidate viewed: `viewed`
/// flips to true and `viewed_at` is stamped exactly once.
pub async fn get_full(pool: &SqlitePool, id: i64) -> Result<CandidateDetail, AppError> {
    let mut row = fetch_row(pool, id).await?;

    if !row.viewed {
        let now = Utc::now();
        sqlx::query(
            "UPDATE candidates SET viewed = 1, viewed_at = $1, updated_at = $1 WHERE id = $2",
        )
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        row.viewed = true;
        row.viewed_at = Some(now);
        row.updated_at = now;
    }

    Ok(row.into())
}

/// Applies a merge-patch to the reviewer fields: only fields present in the
/// patch change, `updated_at` is always stamped, and `viewed_at` is stamped
/// the first time `viewed` goes true.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: &CandidateUpdate,
) -> Result<CandidateDetail, AppError> {
    let mut row = fetch_row(pool, id).await?;
    let now = Utc::now();

    if let Some(starred) = patch.starred {
        row.starred = starred;
    }
    if let Some(notes) = &patch.notes {
        row.notes = Some(notes.clone());
    }
    if let Some(viewed) = patch.viewed {
        row.viewed = viewed;
        if viewed && row.viewed_at.is_none() {
            row.viewed_at = Some(now);
        }
    }
    row.updated_at = now;

    sqlx::query(
        "UPDATE candidates
         SET starred = $1, notes = $2, viewed = $3, viewed_at = $4, updated_at = $5
         WHERE id = $6",
    )
    .bind(row.starred)
    .bind(&row.notes)
    .bind(row.viewed)
    .bind(row.viewed_at)
    .bind(row.updated_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(row.into())
}

/// Case-insensitive substring search over name, experience and education
/// text. A blank query returns no rows; `%` and `_` in the query are treated
/// as literals.
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<SearchHit>, AppError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(trimmed));
    let hits: Vec<SearchHit> = sqlx::query_as(&format!(
        r#"
        SELECT id, folder_name, full_name, title, education_text,
               experience_text, starred, viewed
        FROM candidates
        WHERE full_name LIKE $1 ESCAPE '\'
           OR experience_text LIKE $1 ESCAPE '\'
           OR education_text LIKE $1 ESCAPE '\'
        {LIST_ORDER}
        "#
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(hits)
}

/// Aggregate review-progress counts.
pub async fn stats(pool: &SqlitePool) -> Result<Stats, AppError> {
    let (total, viewed, starred, with_notes): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*),
                COALESCE(SUM(viewed), 0),
                COALESCE(SUM(starred), 0),
                COALESCE(SUM(CASE WHEN notes IS NOT NULL AND TRIM(notes) <> ''
                             THEN 1 ELSE 0 END), 0)
         FROM candidates",
    )
    .fetch_one(pool)
    .await?;

    Ok(Stats {
        total,
        viewed,
        unviewed: total - viewed,
        starred,
        with_notes,
    })
}

/// Resolves `{root}/{folder_name}/cv.pdf`, failing with NotFound when either
/// the candidate or the file is missing.
pub async fn resume_path(pool: &SqlitePool, root: &Path, id: i64) -> Result<PathBuf, AppError> {
    let row = fetch_row(pool, id).await?;
    let path = root.join(&row.folder_name).join("cv.pdf");
    if !path.exists() {
        return Err(AppError::NotFound(format!(
            "Resume not found for candidate {id}"
        )));
    }
    Ok(path)
}

async fn fetch_row(pool: &SqlitePool, id: i64) -> Result<CandidateRow, AppError> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool, folder: &str, name: &str, experience: &str, education: &str) -> i64 {
        sqlx::query(
            "INSERT INTO candidates
                 (folder_name, full_name, title, experience_text, education_text,
                  created_at, updated_at)
             VALUES ($1, $2, 'Engineer', $3, $4, $5, $5)",
        )
        .bind(folder)
        .bind(name)
        .bind(experience)
        .bind(education)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn seeded_pool() -> (SqlitePool, i64, i64, i64) {
        let pool = test_pool().await;
        let alice = seed(
            &pool,
            "Alice-Smith",
            "Alice Smith",
            "Research Scientist DeepMind",
            "PhD CS Stanford",
        )
        .await;
        let bob = seed(&pool, "Bob-Jones", "Bob Jones", "Engineer Meta", "BS EE MIT").await;
        let carol = seed(
            &pool,
            "Carol-White",
            "Carol White",
            "Engineer Acme",
            "MS ML Georgia Tech",
        )
        .await;
        (pool, alice, bob, carol)
    }

    #[tokio::test]
    async fn test_list_summaries_orders_by_name() {
        let (pool, ..) = seeded_pool().await;
        let summaries = list_summaries(&pool).await.unwrap();
        let names: Vec<_> = summaries.iter().map(|s| s.full_name.as_str()).collect();
        assert_eq!(names, vec!["Alice Smith", "Bob Jones", "Carol White"]);
        assert!(summaries.iter().all(|s| !s.starred && !s.viewed && !s.has_notes));
    }

    #[tokio::test]
    async fn test_get_full_marks_viewed_once() {
        let (pool, alice, ..) = seeded_pool().await;

        let first = get_full(&pool, alice).await.unwrap();
        assert!(first.viewed);
        let stamped = first.viewed_at.expect("viewed_at set on first read");

        let second = get_full(&pool, alice).await.unwrap();
        assert_eq!(second.viewed_at, Some(stamped));
    }

    #[tokio::test]
    async fn test_get_full_unknown_id_is_not_found() {
        let pool = test_pool().await;
        let err = get_full(&pool, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_is_a_merge_patch() {
        let (pool, alice, ..) = seeded_pool().await;

        let before = fetch_row(&pool, alice).await.unwrap();
        let updated = update(
            &pool,
            alice,
            &CandidateUpdate {
                notes: Some("strong systems background".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.notes.as_deref(), Some("strong systems background"));
        assert_eq!(updated.starred, before.starred);
        assert_eq!(updated.viewed, before.viewed);
        assert!(updated.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_viewed_stamps_viewed_at_once() {
        let (pool, alice, ..) = seeded_pool().await;

        let first = update(
            &pool,
            alice,
            &CandidateUpdate {
                viewed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stamped = first.viewed_at.expect("viewed_at stamped");

        let second = update(
            &pool,
            alice,
            &CandidateUpdate {
                viewed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(second.viewed_at, Some(stamped));
    }

    #[tokio::test]
    async fn test_search_blank_query_returns_nothing() {
        let (pool, ..) = seeded_pool().await;
        assert!(search(&pool, "").await.unwrap().is_empty());
        assert!(search(&pool, "   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_each_text_field() {
        let (pool, _, bob, carol) = seeded_pool().await;

        let by_name = search(&pool, "alice").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].full_name, "Alice Smith");

        let by_experience = search(&pool, "meta").await.unwrap();
        assert_eq!(by_experience.len(), 1);
        assert_eq!(by_experience[0].id, bob);

        let by_education = search(&pool, "Georgia Tech").await.unwrap();
        assert_eq!(by_education.len(), 1);
        assert_eq!(by_education[0].id, carol);

        assert!(search(&pool, "nonexistent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_as_literals() {
        let (pool, ..) = seeded_pool().await;
        assert!(search(&pool, "%").await.unwrap().is_empty());
        assert!(search(&pool, "_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_counts_add_up() {
        let (pool, alice, bob, _) = seeded_pool().await;

        get_full(&pool, alice).await.unwrap();
        update(
            &pool,
            bob,
            &CandidateUpdate {
                starred: Some(true),
                notes: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = stats(&pool).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.viewed, 1);
        assert_eq!(stats.unviewed, 2);
        assert_eq!(stats.starred, 1);
        // Whitespace-only notes do not count.
        assert_eq!(stats.with_notes, 0);
    }

    #[tokio::test]
    async fn test_resume_path_requires_file_on_disk() {
        let (pool, alice, ..) = seeded_pool().await;
        let dir = tempfile::tempdir().unwrap();

        let err = resume_path(&pool, dir.path(), alice).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let cv_dir = dir.path().join("Alice-Smith");
        std::fs::create_dir_all(&cv_dir).unwrap();
        std::fs::write(cv_dir.join("cv.pdf"), b"%PDF-1.4").unwrap();

        let path = resume_path(&pool, dir.path(), alice).await.unwrap();
        assert!(path.ends_with("Alice-Smith/cv.pdf"));
    }
}
