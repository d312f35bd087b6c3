use anistore_core::EmbeddedDoc;
use anistore_core::TableKind;
use anistore_core::title::{DownloadLinks, TitleDetail, TitleSummary};
use anistore_core::user::NewUser;
use tracing::{info, warn};

use crate::repo::{download_links, episode_rosters, title_details, title_summaries, users};
use crate::{DbError, Store};

pub const DEFAULT_USER_NAME: &str = "default";
pub const DEFAULT_USER_CREDENTIAL: &str = "123456789";
pub const DEFAULT_AVATAR_URL: &str = "https://img.anistore.invalid/avatar/default.png";
pub const DEFAULT_TITLE_ID: &str = "1";

/// Which tables received a default row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: Vec<TableKind>,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.seeded.is_empty()
    }
}

/// Give every empty table one default row.
///
/// Safe to run on every start: tables that already hold rows are left alone.
/// Two processes seeding the same fresh database at once may both insert.
pub async fn seed_defaults(store: &Store) -> Result<SeedReport, DbError> {
    let pool = store.pool();
    let mut report = SeedReport::default();

    if users::list_users(pool).await?.is_empty() {
        let user = NewUser {
            name: DEFAULT_USER_NAME.to_string(),
            credential: DEFAULT_USER_CREDENTIAL.to_string(),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            favorites: EmbeddedDoc::Empty,
            history: EmbeddedDoc::Empty,
            subscriptions: EmbeddedDoc::Empty,
            ..Default::default()
        };
        record(&mut report, TableKind::Users, users::insert_user(pool, &user).await.is_some());
    }

    if title_summaries::list_summaries(pool).await?.is_empty() {
        let inserted =
            title_summaries::insert_summary(pool, &TitleSummary::new(DEFAULT_TITLE_ID)).await;
        record(&mut report, TableKind::TitleSummaries, inserted.is_some());
    }

    if title_details::list_details(pool).await?.is_empty() {
        let inserted = title_details::insert_detail(pool, &TitleDetail::new(DEFAULT_TITLE_ID)).await;
        record(&mut report, TableKind::TitleDetails, inserted.is_some());
    }

    if episode_rosters::list_rosters(pool).await?.is_empty() {
        let inserted = episode_rosters::insert_roster(pool, DEFAULT_TITLE_ID, &[vec![]]).await;
        record(&mut report, TableKind::EpisodeRosters, inserted.is_some());
    }

    if download_links::list_all(pool).await?.is_empty() {
        let links = DownloadLinks {
            anime_id: DEFAULT_TITLE_ID.to_string(),
            links: vec![],
        };
        let inserted = download_links::insert_links(pool, &links).await;
        record(&mut report, TableKind::DownloadLinks, inserted.is_some());
    }

    Ok(report)
}

fn record(report: &mut SeedReport, table: TableKind, inserted: bool) {
    if inserted {
        info!(%table, "seeded default row");
        report.seeded.push(table);
    } else {
        warn!(%table, "default row was not inserted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_each_table_once() {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        let store = Store::new(pool);

        let first = seed_defaults(&store).await.unwrap();
        assert_eq!(first.seeded.len(), TableKind::ALL.len());
        for table in TableKind::ALL {
            assert!(first.seeded.contains(&table), "{table} not seeded");
        }

        let second = seed_defaults(&store).await.unwrap();
        assert!(second.is_empty());

        let users = users::list_users(store.pool()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, DEFAULT_USER_NAME);
        assert!(users::verify_credential(&users[0], DEFAULT_USER_CREDENTIAL).unwrap());
        assert_eq!(users[0].favorites, EmbeddedDoc::Empty);

        let roster = episode_rosters::get_roster(store.pool(), DEFAULT_TITLE_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(roster.groups.len(), 1);
        assert!(roster.groups[0].is_empty());

        let links = download_links::get_links(store.pool(), DEFAULT_TITLE_ID)
            .await
            .unwrap()
            .unwrap();
        assert!(links.links.is_empty());
    }

    #[tokio::test]
    async fn leaves_populated_tables_alone() {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        let store = Store::new(pool);

        title_summaries::insert_summary(store.pool(), &TitleSummary::new("42"))
            .await
            .unwrap();
        let report = seed_defaults(&store).await.unwrap();
        assert!(!report.seeded.contains(&TableKind::TitleSummaries));

        let summaries = title_summaries::list_summaries(store.pool()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].anime_id, "42");
    }
}
