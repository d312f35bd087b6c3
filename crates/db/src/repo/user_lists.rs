//! Embedded user lists: favorites, history and subscriptions.
//!
//! Every mutation is a read-modify-write of one document column, done while
//! holding the user's entry in [`Store`]'s lock table so concurrent merges on
//! the same user are applied one after another instead of overwriting each
//! other. The lock is process-local.

use anistore_core::codec::{decode_column, encode};
use anistore_core::merge::{self, RemoveSelector};
use anistore_core::user::{FavoriteEntry, HistoryEntry, SubscriptionEntry};
use anistore_core::{EmbeddedDoc, Keyed, ListDoc, Reconcile, UserListKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use tracing::debug;

use crate::{DbError, Store, WriteOutcome};

/// Marker for one embedded list column of `user_account`.
pub trait UserList {
    const KIND: UserListKind;
    const COLUMN: &'static str;
    type Entry: Keyed + Clone + Serialize + DeserializeOwned + Send;
}

pub struct Favorites;
pub struct History;
pub struct Subscriptions;

impl UserList for Favorites {
    const KIND: UserListKind = UserListKind::Favorites;
    const COLUMN: &'static str = "favorites_doc";
    type Entry = FavoriteEntry;
}

impl UserList for History {
    const KIND: UserListKind = UserListKind::History;
    const COLUMN: &'static str = "history_doc";
    type Entry = HistoryEntry;
}

impl UserList for Subscriptions {
    const KIND: UserListKind = UserListKind::Subscriptions;
    const COLUMN: &'static str = "subscriptions_doc";
    type Entry = SubscriptionEntry;
}

/// Read one list of a user. Outer `None` when the user does not exist.
pub async fn get_list<L: UserList>(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<EmbeddedDoc<L::Entry>>, DbError> {
    let query = format!("SELECT {} FROM user_account WHERE id = ?", L::COLUMN);
    let row: Option<(Option<String>,)> = sqlx::query_as(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((raw,)) => Ok(Some(decode_column(raw.as_deref())?)),
        None => Ok(None),
    }
}

async fn write_list<L: UserList>(
    pool: &SqlitePool,
    user_id: i64,
    doc: &ListDoc<L::Entry>,
) -> Result<u64, DbError> {
    let raw = encode(doc)?;
    let query = format!("UPDATE user_account SET {} = ? WHERE id = ?", L::COLUMN);
    let result = sqlx::query(&query)
        .bind(raw)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Append `delta` after the stored entries. Duplicate keys are kept.
pub async fn append<L: UserList>(store: &Store, user_id: i64, delta: Vec<L::Entry>) -> WriteOutcome {
    let _guard = store.user_locks().acquire(&user_id).await;
    let result: Result<u64, DbError> = async {
        let Some(existing) = get_list::<L>(store.pool(), user_id).await? else {
            return Ok(0);
        };
        let doc = merge::append(existing, delta);
        debug!(user_id, list = %L::KIND, size = doc.all_size, "appending entries");
        write_list::<L>(store.pool(), user_id, &doc).await
    }
    .await;
    WriteOutcome::settle(result, "append")
}

/// Overwrite matching entries in place and append the unmatched ones.
///
/// Refuses with [`WriteOutcome::Unseeded`] when the stored list is absent or
/// empty; use [`replace`] to seed it.
pub async fn reconcile<L>(store: &Store, user_id: i64, delta: Vec<L::Entry>) -> WriteOutcome
where
    L: UserList,
    L::Entry: Reconcile,
{
    let _guard = store.user_locks().acquire(&user_id).await;
    let existing = match get_list::<L>(store.pool(), user_id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return WriteOutcome::NotFound,
        Err(e) => return WriteOutcome::settle(Err(e), "reconcile"),
    };

    let Some(reconciled) = merge::reconcile(existing, delta) else {
        debug!(user_id, list = %L::KIND, "nothing to reconcile against");
        return WriteOutcome::Unseeded;
    };
    debug!(
        user_id,
        list = %L::KIND,
        updated = reconciled.updated,
        appended = reconciled.appended,
        "reconciling entries"
    );
    let result = write_list::<L>(store.pool(), user_id, &reconciled.doc).await;
    WriteOutcome::settle(result, "reconcile")
}

/// Remove entries by single key, else by key set. The list is written back even when unchanged.
pub async fn remove<L: UserList>(
    store: &Store,
    user_id: i64,
    key: &str,
    keys: &[String],
) -> WriteOutcome {
    let selector = RemoveSelector::from_request(key, keys);
    let _guard = store.user_locks().acquire(&user_id).await;
    let result: Result<u64, DbError> = async {
        let Some(existing) = get_list::<L>(store.pool(), user_id).await? else {
            return Ok(0);
        };
        let before = existing.len();
        let doc = merge::remove(existing, &selector);
        debug!(user_id, list = %L::KIND, removed = before - doc.all_size, "removing entries");
        write_list::<L>(store.pool(), user_id, &doc).await
    }
    .await;
    WriteOutcome::settle(result, "remove")
}

/// Replace the whole list. The only write that can seed an absent list with entries.
pub async fn replace<L: UserList>(store: &Store, user_id: i64, list: Vec<L::Entry>) -> WriteOutcome {
    let _guard = store.user_locks().acquire(&user_id).await;
    let doc = ListDoc::new(list);
    let result = write_list::<L>(store.pool(), user_id, &doc).await;
    WriteOutcome::settle(result, "replace")
}

pub async fn get_favorites(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<EmbeddedDoc<FavoriteEntry>>, DbError> {
    get_list::<Favorites>(pool, user_id).await
}

pub async fn get_history(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<EmbeddedDoc<HistoryEntry>>, DbError> {
    get_list::<History>(pool, user_id).await
}

pub async fn get_subscriptions(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<EmbeddedDoc<SubscriptionEntry>>, DbError> {
    get_list::<Subscriptions>(pool, user_id).await
}

pub async fn add_favorites(store: &Store, user_id: i64, delta: Vec<FavoriteEntry>) -> WriteOutcome {
    append::<Favorites>(store, user_id, delta).await
}

pub async fn add_history(store: &Store, user_id: i64, delta: Vec<HistoryEntry>) -> WriteOutcome {
    append::<History>(store, user_id, delta).await
}

pub async fn add_subscriptions(
    store: &Store,
    user_id: i64,
    delta: Vec<SubscriptionEntry>,
) -> WriteOutcome {
    append::<Subscriptions>(store, user_id, delta).await
}

pub async fn reconcile_history(
    store: &Store,
    user_id: i64,
    delta: Vec<HistoryEntry>,
) -> WriteOutcome {
    reconcile::<History>(store, user_id, delta).await
}

pub async fn remove_favorites(store: &Store, user_id: i64, key: &str, keys: &[String]) -> WriteOutcome {
    remove::<Favorites>(store, user_id, key, keys).await
}

pub async fn remove_history(store: &Store, user_id: i64, key: &str, keys: &[String]) -> WriteOutcome {
    remove::<History>(store, user_id, key, keys).await
}

pub async fn remove_subscriptions(
    store: &Store,
    user_id: i64,
    key: &str,
    keys: &[String],
) -> WriteOutcome {
    remove::<Subscriptions>(store, user_id, key, keys).await
}

pub async fn replace_favorites(store: &Store, user_id: i64, list: Vec<FavoriteEntry>) -> WriteOutcome {
    replace::<Favorites>(store, user_id, list).await
}

pub async fn replace_history(store: &Store, user_id: i64, list: Vec<HistoryEntry>) -> WriteOutcome {
    replace::<History>(store, user_id, list).await
}

pub async fn replace_subscriptions(
    store: &Store,
    user_id: i64,
    list: Vec<SubscriptionEntry>,
) -> WriteOutcome {
    replace::<Subscriptions>(store, user_id, list).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::users;
    use anistore_core::user::NewUser;

    async fn store_with_user(favorites: EmbeddedDoc<FavoriteEntry>) -> (Store, i64) {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        let store = Store::new(pool);
        let user = users::insert_user(
            store.pool(),
            &NewUser {
                name: "tester".into(),
                credential: "pw".into(),
                favorites,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (store, user.id)
    }

    fn aids<T: Keyed>(doc: &EmbeddedDoc<T>) -> Vec<&str> {
        doc.as_slice().iter().map(Keyed::key).collect()
    }

    fn history(aid: &str, progress: i64) -> HistoryEntry {
        HistoryEntry {
            progress,
            ..HistoryEntry::new(aid)
        }
    }

    #[tokio::test]
    async fn append_to_absent_list_creates_it() {
        let (store, id) = store_with_user(EmbeddedDoc::Absent).await;
        assert!(add_subscriptions(&store, id, vec![SubscriptionEntry::new("S1")]).await.applied());

        let subs = get_subscriptions(store.pool(), id).await.unwrap().unwrap();
        assert_eq!(aids(&subs), ["S1"]);
    }

    #[tokio::test]
    async fn append_for_missing_user_is_not_found() {
        let (store, _) = store_with_user(EmbeddedDoc::Empty).await;
        let outcome = add_favorites(&store, 999, vec![FavoriteEntry::new("A1")]).await;
        assert_eq!(outcome, WriteOutcome::NotFound);
    }

    #[tokio::test]
    async fn reconcile_refuses_unseeded_list() {
        let (store, id) = store_with_user(EmbeddedDoc::Empty).await;
        let outcome = reconcile_history(&store, id, vec![history("A1", 5)]).await;
        assert_eq!(outcome, WriteOutcome::Unseeded);
        assert_eq!(get_history(store.pool(), id).await.unwrap(), Some(EmbeddedDoc::Absent));

        // replace seeds it, after which reconcile works
        assert!(replace_history(&store, id, vec![history("A1", 5)]).await.applied());
        assert!(reconcile_history(&store, id, vec![history("A1", 6)]).await.applied());
        let stored = get_history(store.pool(), id).await.unwrap().unwrap();
        assert_eq!(stored.as_slice()[0].progress, 6);
    }

    #[tokio::test]
    async fn reconcile_for_missing_user_is_not_found() {
        let (store, _) = store_with_user(EmbeddedDoc::Empty).await;
        let outcome = reconcile_history(&store, 999, vec![history("A1", 5)]).await;
        assert_eq!(outcome, WriteOutcome::NotFound);
    }

    #[tokio::test]
    async fn remove_writes_back_even_when_absent() {
        let (store, id) = store_with_user(EmbeddedDoc::Absent).await;
        assert!(remove_history(&store, id, "A1", &[]).await.applied());
        assert_eq!(get_history(store.pool(), id).await.unwrap(), Some(EmbeddedDoc::Empty));
    }

    #[tokio::test]
    async fn remove_with_no_selector_keeps_list() {
        let favs = EmbeddedDoc::from_list(vec![FavoriteEntry::new("A1"), FavoriteEntry::new("A2")]);
        let (store, id) = store_with_user(favs).await;
        assert!(remove_favorites(&store, id, "null", &[]).await.applied());
        let stored = get_favorites(store.pool(), id).await.unwrap().unwrap();
        assert_eq!(aids(&stored), ["A1", "A2"]);
    }

    #[tokio::test]
    async fn malformed_stored_list_is_not_applied() {
        let (store, id) = store_with_user(EmbeddedDoc::Empty).await;
        sqlx::query("UPDATE user_account SET favorites_doc = '[1,2' WHERE id = ?")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();

        let outcome = add_favorites(&store, id, vec![FavoriteEntry::new("A1")]).await;
        assert_eq!(outcome.code(), "malformed_document");
        assert!(!outcome.applied());
        assert!(matches!(
            get_favorites(store.pool(), id).await,
            Err(DbError::Document(_))
        ));
    }

    #[tokio::test]
    async fn replace_keeps_all_size_consistent() {
        let (store, id) = store_with_user(EmbeddedDoc::Absent).await;
        let subs = vec![SubscriptionEntry::new("S1"), SubscriptionEntry::new("S2")];
        assert!(replace_subscriptions(&store, id, subs).await.applied());

        let (raw,): (String,) =
            sqlx::query_as("SELECT subscriptions_doc FROM user_account WHERE id = ?")
                .bind(id)
                .fetch_one(store.pool())
                .await
                .unwrap();
        let doc: ListDoc<SubscriptionEntry> = anistore_core::codec::decode(&raw).unwrap();
        assert_eq!(doc.all_size, 2);
        assert!(!doc.is_inconsistent());
    }
}
