use anistore_core::codec::{decode_column, encode_column};
use anistore_core::user::{NewUser, UserAccount, UserPatch};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::{DbError, Store, WriteOutcome};

type UserTuple = (
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
);

const SELECT_USER: &str = "SELECT id, name, credential, contact, avatar_url, \
     favorites_doc, history_doc, subscriptions_doc, created_ts FROM user_account";

/// List all users, decoding every embedded list.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserAccount>, DbError> {
    let rows: Vec<UserTuple> = sqlx::query_as(SELECT_USER).fetch_all(pool).await?;
    rows.into_iter().map(row_to_user).collect()
}

/// Find user by ID.
pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<UserAccount>, DbError> {
    let row: Option<UserTuple> = sqlx::query_as(&format!("{SELECT_USER} WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.map(row_to_user).transpose()
}

/// Insert a user and read it back. `None` when nothing was written.
pub async fn insert_user(pool: &SqlitePool, user: &NewUser) -> Option<UserAccount> {
    match try_insert_user(pool, user).await {
        Ok(inserted) => inserted,
        Err(e) => {
            warn!(name = %user.name, error = %e, "user insert failed");
            None
        }
    }
}

async fn try_insert_user(pool: &SqlitePool, user: &NewUser) -> Result<Option<UserAccount>, DbError> {
    let credential = hash_password(&user.credential)?;
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "INSERT INTO user_account (name, credential, contact, avatar_url, \
         favorites_doc, history_doc, subscriptions_doc, created_ts) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.name)
    .bind(&credential)
    .bind(&user.contact)
    .bind(&user.avatar_url)
    .bind(encode_column(&user.favorites)?)
    .bind(encode_column(&user.history)?)
    .bind(encode_column(&user.subscriptions)?)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_user(pool, result.last_insert_rowid()).await
}

/// Apply a partial patch to a user's credential, contact and avatar.
///
/// Fields left `None` keep their stored value. A supplied credential is hashed first.
pub async fn update_user(store: &Store, user_id: i64, patch: &UserPatch) -> WriteOutcome {
    let _guard = store.user_locks().acquire(&user_id).await;
    let result = patch_user(store.pool(), user_id, patch).await;
    WriteOutcome::settle(result, "update_user")
}

async fn patch_user(pool: &SqlitePool, user_id: i64, patch: &UserPatch) -> Result<u64, DbError> {
    let Some(mut user) = get_user(pool, user_id).await? else {
        return Ok(0);
    };

    let hashed = UserPatch {
        credential: patch.credential.as_deref().map(hash_password).transpose()?,
        ..patch.clone()
    };
    if !hashed.apply(&mut user) {
        debug!(user_id, "user patch changed nothing");
    }

    let result = sqlx::query(
        "UPDATE user_account SET credential = ?, contact = ?, avatar_url = ? WHERE id = ?",
    )
    .bind(&user.credential)
    .bind(&user.contact)
    .bind(&user.avatar_url)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a user by ID.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> WriteOutcome {
    let result = sqlx::query("DELETE FROM user_account WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(DbError::from);
    WriteOutcome::settle(result, "delete_user")
}

/// Check if any users exist (for bootstrap seeding).
pub async fn count_users(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_account")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Verify a candidate credential against a user's stored hash.
pub fn verify_credential(user: &UserAccount, candidate: &str) -> Result<bool, DbError> {
    let parsed =
        PasswordHash::new(&user.credential).map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}

fn hash_password(password: &str) -> Result<String, DbError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

fn row_to_user(r: UserTuple) -> Result<UserAccount, DbError> {
    Ok(UserAccount {
        id: r.0,
        name: r.1,
        credential: r.2,
        contact: r.3,
        avatar_url: r.4,
        favorites: decode_column(r.5.as_deref())?,
        history: decode_column(r.6.as_deref())?,
        subscriptions: decode_column(r.7.as_deref())?,
        created_ts: r.8,
    })
}
