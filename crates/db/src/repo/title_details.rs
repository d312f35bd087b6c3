use anistore_core::codec::{decode, encode};
use anistore_core::title::TitleDetail;
use sqlx::SqlitePool;
use tracing::warn;

use crate::{DbError, WriteOutcome};

/// Scalar columns in bind order, shared by insert and update.
const SCALAR_COLUMNS: &[&str] = &[
    "title",
    "original_title",
    "alias",
    "cover_url",
    "cover_small_url",
    "region",
    "kind",
    "premiere",
    "status",
    "studio",
    "director",
    "writer",
    "website",
    "description",
    "latest_episode",
    "total_episodes",
    "score",
    "rank",
    "updated_label",
    "updated_unix",
    "collect_count",
    "comment_count",
    "rank_count",
    "default_play_index",
    "file_path",
    "last_modified",
    "modified_time",
];

const DOC_COLUMNS: &[&str] = &[
    "cast_doc",
    "related_doc",
    "ratings_doc",
    "tags_doc",
    "download_links_doc",
    "player_groups_doc",
];

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    anime_id: String,
    title: String,
    original_title: String,
    alias: String,
    cover_url: String,
    cover_small_url: String,
    region: String,
    kind: String,
    premiere: String,
    status: String,
    studio: String,
    director: String,
    writer: String,
    website: String,
    description: String,
    latest_episode: String,
    total_episodes: i64,
    score: String,
    rank: i64,
    updated_label: String,
    updated_unix: i64,
    collect_count: i64,
    comment_count: i64,
    rank_count: i64,
    default_play_index: i64,
    file_path: String,
    last_modified: String,
    modified_time: i64,
    cast_doc: String,
    related_doc: String,
    ratings_doc: String,
    tags_doc: String,
    download_links_doc: String,
    player_groups_doc: String,
}

impl TryFrom<DetailRow> for TitleDetail {
    type Error = DbError;

    fn try_from(row: DetailRow) -> Result<Self, DbError> {
        Ok(Self {
            cast: decode(&row.cast_doc)?,
            related: decode(&row.related_doc)?,
            ratings: decode(&row.ratings_doc)?,
            tags: decode(&row.tags_doc)?,
            download_links: decode(&row.download_links_doc)?,
            player_groups: decode(&row.player_groups_doc)?,
            anime_id: row.anime_id,
            title: row.title,
            original_title: row.original_title,
            alias: row.alias,
            cover_url: row.cover_url,
            cover_small_url: row.cover_small_url,
            region: row.region,
            kind: row.kind,
            premiere: row.premiere,
            status: row.status,
            studio: row.studio,
            director: row.director,
            writer: row.writer,
            website: row.website,
            description: row.description,
            latest_episode: row.latest_episode,
            total_episodes: row.total_episodes,
            score: row.score,
            rank: row.rank,
            updated_label: row.updated_label,
            updated_unix: row.updated_unix,
            collect_count: row.collect_count,
            comment_count: row.comment_count,
            rank_count: row.rank_count,
            default_play_index: row.default_play_index,
            file_path: row.file_path,
            last_modified: row.last_modified,
            modified_time: row.modified_time,
        })
    }
}

fn select_sql() -> String {
    format!(
        "SELECT anime_id, {}, {} FROM title_detail",
        SCALAR_COLUMNS.join(", "),
        DOC_COLUMNS.join(", ")
    )
}

/// Encoded document columns in `DOC_COLUMNS` order.
fn encode_docs(detail: &TitleDetail) -> Result<[String; 6], DbError> {
    Ok([
        encode(&detail.cast)?,
        encode(&detail.related)?,
        encode(&detail.ratings)?,
        encode(&detail.tags)?,
        encode(&detail.download_links)?,
        encode(&detail.player_groups)?,
    ])
}

/// Bind scalars then documents, in column-list order.
fn bind_detail<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    detail: &'q TitleDetail,
    docs: [String; 6],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query = query
        .bind(&detail.title)
        .bind(&detail.original_title)
        .bind(&detail.alias)
        .bind(&detail.cover_url)
        .bind(&detail.cover_small_url)
        .bind(&detail.region)
        .bind(&detail.kind)
        .bind(&detail.premiere)
        .bind(&detail.status)
        .bind(&detail.studio)
        .bind(&detail.director)
        .bind(&detail.writer)
        .bind(&detail.website)
        .bind(&detail.description)
        .bind(&detail.latest_episode)
        .bind(detail.total_episodes)
        .bind(&detail.score)
        .bind(detail.rank)
        .bind(&detail.updated_label)
        .bind(detail.updated_unix)
        .bind(detail.collect_count)
        .bind(detail.comment_count)
        .bind(detail.rank_count)
        .bind(detail.default_play_index)
        .bind(&detail.file_path)
        .bind(&detail.last_modified)
        .bind(detail.modified_time);
    for doc in docs {
        query = query.bind(doc);
    }
    query
}

pub async fn list_details(pool: &SqlitePool) -> Result<Vec<TitleDetail>, DbError> {
    let rows = sqlx::query_as::<_, DetailRow>(&select_sql())
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(TitleDetail::try_from).collect()
}

pub async fn get_detail(pool: &SqlitePool, anime_id: &str) -> Result<Option<TitleDetail>, DbError> {
    let query = format!("{} WHERE anime_id = ?", select_sql());
    let row = sqlx::query_as::<_, DetailRow>(&query)
        .bind(anime_id)
        .fetch_optional(pool)
        .await?;
    row.map(TitleDetail::try_from).transpose()
}

/// Insert a detail record and read it back. `None` on a duplicate key or any write failure.
pub async fn insert_detail(pool: &SqlitePool, detail: &TitleDetail) -> Option<TitleDetail> {
    let result: Result<Option<TitleDetail>, DbError> = async {
        let docs = encode_docs(detail)?;
        let columns = SCALAR_COLUMNS.len() + DOC_COLUMNS.len();
        let sql = format!(
            "INSERT INTO title_detail ({}, {}, anime_id) VALUES ({}?)",
            SCALAR_COLUMNS.join(", "),
            DOC_COLUMNS.join(", "),
            "?, ".repeat(columns)
        );
        let written = bind_detail(sqlx::query(&sql), detail, docs)
            .bind(&detail.anime_id)
            .execute(pool)
            .await?
            .rows_affected();

        if written == 0 {
            return Ok(None);
        }
        get_detail(pool, &detail.anime_id).await
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(anime_id = %detail.anime_id, error = %e, "title detail insert failed");
        None
    })
}

/// Overwrite every column of the detail record keyed by `anime_id`.
pub async fn update_detail(pool: &SqlitePool, anime_id: &str, detail: &TitleDetail) -> WriteOutcome {
    let result: Result<u64, DbError> = async {
        let docs = encode_docs(detail)?;
        let assignments: Vec<String> = SCALAR_COLUMNS
            .iter()
            .chain(DOC_COLUMNS)
            .map(|column| format!("{column} = ?"))
            .collect();
        let sql = format!(
            "UPDATE title_detail SET {} WHERE anime_id = ?",
            assignments.join(", ")
        );
        let rows = bind_detail(sqlx::query(&sql), detail, docs)
            .bind(anime_id)
            .execute(pool)
            .await?
            .rows_affected();
        Ok(rows)
    }
    .await;
    WriteOutcome::settle(result, "update_detail")
}

pub async fn delete_detail(pool: &SqlitePool, anime_id: &str) -> WriteOutcome {
    let result = sqlx::query("DELETE FROM title_detail WHERE anime_id = ?")
        .bind(anime_id)
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(DbError::from);
    WriteOutcome::settle(result, "delete_detail")
}
