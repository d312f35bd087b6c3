use anistore_core::codec::{decode, encode};
use anistore_core::title::TitleSummary;
use sqlx::SqlitePool;
use tracing::warn;

use crate::{DbError, WriteOutcome};

const SELECT_SUMMARY: &str = "SELECT anime_id, title, cover_url, region, kind, premiere, status, \
     latest_episode, description, tags_doc, rank, hits, score FROM title_summary";

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    anime_id: String,
    title: String,
    cover_url: String,
    region: String,
    kind: String,
    premiere: String,
    status: String,
    latest_episode: String,
    description: String,
    tags_doc: String,
    rank: i64,
    hits: i64,
    score: String,
}

impl TryFrom<SummaryRow> for TitleSummary {
    type Error = DbError;

    fn try_from(row: SummaryRow) -> Result<Self, DbError> {
        Ok(Self {
            tags: decode(&row.tags_doc)?,
            anime_id: row.anime_id,
            title: row.title,
            cover_url: row.cover_url,
            region: row.region,
            kind: row.kind,
            premiere: row.premiere,
            status: row.status,
            latest_episode: row.latest_episode,
            description: row.description,
            rank: row.rank,
            hits: row.hits,
            score: row.score,
        })
    }
}

pub async fn list_summaries(pool: &SqlitePool) -> Result<Vec<TitleSummary>, DbError> {
    let rows = sqlx::query_as::<_, SummaryRow>(SELECT_SUMMARY)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(TitleSummary::try_from).collect()
}

pub async fn get_summary(pool: &SqlitePool, anime_id: &str) -> Result<Option<TitleSummary>, DbError> {
    let row = sqlx::query_as::<_, SummaryRow>(&format!("{SELECT_SUMMARY} WHERE anime_id = ?"))
        .bind(anime_id)
        .fetch_optional(pool)
        .await?;
    row.map(TitleSummary::try_from).transpose()
}

/// Insert a summary and read it back. `None` on a duplicate key or any write failure.
pub async fn insert_summary(pool: &SqlitePool, summary: &TitleSummary) -> Option<TitleSummary> {
    let result: Result<Option<TitleSummary>, DbError> = async {
        let written = sqlx::query(
            "INSERT INTO title_summary (anime_id, title, cover_url, region, kind, premiere, \
             status, latest_episode, description, tags_doc, rank, hits, score) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&summary.anime_id)
        .bind(&summary.title)
        .bind(&summary.cover_url)
        .bind(&summary.region)
        .bind(&summary.kind)
        .bind(&summary.premiere)
        .bind(&summary.status)
        .bind(&summary.latest_episode)
        .bind(&summary.description)
        .bind(encode(&summary.tags)?)
        .bind(summary.rank)
        .bind(summary.hits)
        .bind(&summary.score)
        .execute(pool)
        .await?
        .rows_affected();

        if written == 0 {
            return Ok(None);
        }
        get_summary(pool, &summary.anime_id).await
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(anime_id = %summary.anime_id, error = %e, "title summary insert failed");
        None
    })
}

/// Overwrite every column of the summary keyed by `anime_id`. The key itself is not changed.
pub async fn update_summary(pool: &SqlitePool, anime_id: &str, summary: &TitleSummary) -> WriteOutcome {
    let result: Result<u64, DbError> = async {
        let rows = sqlx::query(
            "UPDATE title_summary SET title = ?, cover_url = ?, region = ?, kind = ?, \
             premiere = ?, status = ?, latest_episode = ?, description = ?, tags_doc = ?, \
             rank = ?, hits = ?, score = ? WHERE anime_id = ?",
        )
        .bind(&summary.title)
        .bind(&summary.cover_url)
        .bind(&summary.region)
        .bind(&summary.kind)
        .bind(&summary.premiere)
        .bind(&summary.status)
        .bind(&summary.latest_episode)
        .bind(&summary.description)
        .bind(encode(&summary.tags)?)
        .bind(summary.rank)
        .bind(summary.hits)
        .bind(&summary.score)
        .bind(anime_id)
        .execute(pool)
        .await?
        .rows_affected();
        Ok(rows)
    }
    .await;
    WriteOutcome::settle(result, "update_summary")
}

pub async fn delete_summary(pool: &SqlitePool, anime_id: &str) -> WriteOutcome {
    let result = sqlx::query("DELETE FROM title_summary WHERE anime_id = ?")
        .bind(anime_id)
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(DbError::from);
    WriteOutcome::settle(result, "delete_summary")
}
