use crate::model::leave_request_type::{LeaveSettings, StoredLeaveTypes};
use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::OnceCell;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

/// team_id => settings snapshot
static SETTINGS_CACHE: OnceCell<Cache<u64, Arc<LeaveSettings>>> = OnceCell::new();

const DEFAULT_CAPACITY: u64 = 10_000;
const DEFAULT_TTL_SECS: u64 = 300;

/// Sizes the cache; only the first call has an effect.
pub fn init(capacity: u64, ttl: Duration) {
    let _ = SETTINGS_CACHE.set(build(capacity, ttl));
}

fn build(capacity: u64, ttl: Duration) -> Cache<u64, Arc<LeaveSettings>> {
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(ttl)
        .build()
}

fn cache() -> &'static Cache<u64, Arc<LeaveSettings>> {
    SETTINGS_CACHE.get_or_init(|| build(DEFAULT_CAPACITY, Duration::from_secs(DEFAULT_TTL_SECS)))
}

/// Reads a team's settings row, bypassing the cache.
/// No row means no types configured.
pub async fn load(pool: &MySqlPool, team_id: u64) -> Result<LeaveSettings> {
    let raw = sqlx::query_scalar::<_, String>(
        "SELECT leave_request_types FROM team_settings WHERE team_id = ?",
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await?;

    Ok(raw
        .as_deref()
        .map(LeaveSettings::from_stored)
        .unwrap_or_default())
}

/// Cached settings for a team, loading on a miss.
pub async fn get(pool: &MySqlPool, team_id: u64) -> Result<Arc<LeaveSettings>> {
    if let Some(settings) = cache().get(&team_id).await {
        return Ok(settings);
    }

    let settings = Arc::new(load(pool, team_id).await?);
    cache().insert(team_id, settings.clone()).await;
    tracing::debug!(
        team_id,
        types = settings.leave_request_types.len(),
        "Leave settings cached"
    );

    Ok(settings)
}

/// Locked read-modify-write of a team's stored type list.
///
/// The settings row is read `FOR UPDATE`, so concurrent edits of one team run
/// one after another. When `edit` fails nothing is written and its error is
/// returned as the inner result.
pub async fn update<T, E>(
    pool: &MySqlPool,
    team_id: u64,
    edit: impl FnOnce(&mut StoredLeaveTypes) -> std::result::Result<T, E>,
) -> Result<std::result::Result<T, E>> {
    // a row must exist before it can be locked
    sqlx::query("INSERT IGNORE INTO team_settings (team_id, leave_request_types) VALUES (?, '[]')")
        .bind(team_id)
        .execute(pool)
        .await?;

    let mut tx = pool.begin().await?;
    let raw = sqlx::query_scalar::<_, String>(
        "SELECT leave_request_types FROM team_settings WHERE team_id = ? FOR UPDATE",
    )
    .bind(team_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut stored = StoredLeaveTypes::from_stored(&raw);
    let outcome = match edit(&mut stored) {
        Ok(outcome) => outcome,
        // dropping the transaction rolls back and releases the lock
        Err(e) => return Ok(Err(e)),
    };

    sqlx::query("UPDATE team_settings SET leave_request_types = ? WHERE team_id = ?")
        .bind(stored.to_stored())
        .bind(team_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    invalidate(team_id).await;
    Ok(Ok(outcome))
}

pub async fn invalidate(team_id: u64) {
    cache().invalidate(&team_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn cached_entries_are_dropped_on_invalidate() {
        let settings = Arc::new(LeaveSettings::from_stored(
            r#"[{"id":"a","name":"A","isEnabled":true}]"#,
        ));
        cache().insert(9_001, settings.clone()).await;
        assert_eq!(cache().get(&9_001).await, Some(settings));

        invalidate(9_001).await;
        assert!(cache().get(&9_001).await.is_none());
    }

    /// Runs against a scratch database holding `schema.sql`, e.g.
    /// `SETTINGS_TEST_DATABASE_URL=mysql://root@localhost/planopia_test`.
    /// Skipped when it is not set.
    #[actix_web::test]
    async fn concurrent_updates_of_one_team_are_all_kept() {
        let Ok(url) = std::env::var("SETTINGS_TEST_DATABASE_URL") else {
            return;
        };
        let pool = MySqlPool::connect(&url).await.unwrap();
        let team_id = 9_002;
        sqlx::query("DELETE FROM team_settings WHERE team_id = ?")
            .bind(team_id)
            .execute(&pool)
            .await
            .unwrap();
        update(&pool, team_id, |_| Ok::<_, ()>(())).await.unwrap().unwrap();

        let writes = (0..8).map(|i| {
            let pool = pool.clone();
            async move {
                update(&pool, team_id, |stored| {
                    stored.push(&crate::model::leave_request_type::LeaveRequestType {
                        id: format!("custom-{i}"),
                        name: format!("Typ {i}"),
                        name_en: None,
                        is_enabled: true,
                        require_approval: None,
                    })
                })
                .await
                .unwrap()
                .unwrap();
            }
        });
        futures::future::join_all(writes).await;

        let mut ids: Vec<String> = load(&pool, team_id)
            .await
            .unwrap()
            .leave_request_types
            .into_iter()
            .map(|t| t.id)
            .collect();
        ids.sort();
        assert_eq!(ids.len(), 8);

        // a rejected edit leaves the row as it was
        let rejected = update(&pool, team_id, |stored| {
            *stored = StoredLeaveTypes::default();
            Err::<(), _>("rejected")
        })
        .await
        .unwrap();
        assert_eq!(rejected, Err("rejected"));
        assert_eq!(load(&pool, team_id).await.unwrap().leave_request_types.len(), 8);

        sqlx::query("DELETE FROM team_settings WHERE team_id = ?")
            .bind(team_id)
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }
}
