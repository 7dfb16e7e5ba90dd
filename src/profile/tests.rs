//! Profile Cache Tests
//!
//! ## Test Scopes
//! - **Cache-Aside**: Misses load from the store and fill the cache; hits cost no store query.
//! - **Single-Flight**: Concurrent lookups for one uncached email query the store once.
//! - **Degraded Paths**: Corrupt entries, lock contention, cancellation and outages.
//! - **Lock Striping**: Stable stripe assignment with a fixed stripe count.

#[cfg(test)]
mod tests {
    use crate::config::ProfileSettings;
    use crate::error::Error;
    use crate::profile::handlers::handle_find_user;
    use crate::profile::{LockStripes, ProfileService, profile_key};
    use crate::storage::{CacheStore, MemoryRemoteStore, MemoryUserStore, NewUser, UserStore};
    use axum::extract::{Extension, Path};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct Fixture {
        remote: Arc<MemoryRemoteStore>,
        users: Arc<MemoryUserStore>,
        profiles: Arc<ProfileService>,
    }

    fn fixture(settings: ProfileSettings) -> Fixture {
        let remote = Arc::new(MemoryRemoteStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let profiles = Arc::new(ProfileService::new(remote.clone(), users.clone(), settings));
        Fixture {
            remote,
            users,
            profiles,
        }
    }

    /// Short lock timeout and backoff, few attempts.
    fn contention_settings() -> ProfileSettings {
        ProfileSettings {
            lock_timeout: Duration::from_millis(50),
            retry_backoff: Duration::from_millis(10),
            max_lookup_attempts: 3,
            ..ProfileSettings::default()
        }
    }

    // ============================================================
    // CACHE-ASIDE
    // ============================================================

    #[tokio::test]
    async fn test_miss_loads_from_store_and_fills_cache() {
        let f = fixture(ProfileSettings::default());
        let record = f.users.insert(NewUser::new("p@example.com")).await.unwrap();

        let found = f.profiles.find_user("p@example.com").await.unwrap();

        assert_eq!(found, record);
        assert_eq!(f.users.lookup_count(), 1);
        let cached = f.remote.get(&profile_key("p@example.com")).await.unwrap();
        assert!(cached.is_some());
        assert!(cached.unwrap().contains("\"email_hash\""));
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let f = fixture(ProfileSettings::default());
        f.users.insert(NewUser::new("hit@example.com")).await.unwrap();

        let first = f.profiles.find_user("hit@example.com").await.unwrap();
        let second = f.profiles.find_user("hit@example.com").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.users.lookup_count(), 1, "cache hit must not query the store");
    }

    #[tokio::test]
    async fn test_expired_entry_is_reloaded() {
        let f = fixture(ProfileSettings {
            cache_ttl: Duration::from_millis(20),
            ..ProfileSettings::default()
        });
        f.users.insert(NewUser::new("ttl@example.com")).await.unwrap();

        f.profiles.find_user("ttl@example.com").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.profiles.find_user("ttl@example.com").await.unwrap();

        assert_eq!(f.users.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let f = fixture(ProfileSettings::default());

        let result = f.profiles.find_user("ghost@example.com").await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(f.remote.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_email_is_rejected() {
        let f = fixture(ProfileSettings::default());

        let result = f.profiles.find_user(" ").await;

        assert!(matches!(result, Err(Error::InvalidEmail)));
        assert_eq!(f.users.lookup_count(), 0);
    }

    // ============================================================
    // SINGLE-FLIGHT
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_lookups_query_store_once() {
        let f = fixture(ProfileSettings::default());
        let record = f.users.insert(NewUser::new("hot@example.com")).await.unwrap();
        f.users.set_latency(Duration::from_millis(50));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let profiles = f.profiles.clone();
            handles.push(tokio::spawn(async move {
                profiles.find_user("hot@example.com").await
            }));
        }

        for handle in handles {
            let found = handle.await.unwrap().unwrap();
            assert_eq!(found, record);
        }
        assert_eq!(f.users.lookup_count(), 1);
    }

    // ============================================================
    // DEGRADED PATHS
    // ============================================================

    #[tokio::test]
    async fn test_corrupt_entry_falls_back_to_store() {
        let f = fixture(ProfileSettings::default());
        let record = f.users.insert(NewUser::new("bad@example.com")).await.unwrap();
        f.remote.put_raw(
            &profile_key("bad@example.com"),
            "{not json",
            Duration::from_secs(60),
        );

        let found = f.profiles.find_user("bad@example.com").await.unwrap();

        assert_eq!(found, record);
        assert_eq!(f.users.lookup_count(), 1);
        // The entry was replaced with a readable one.
        f.profiles.find_user("bad@example.com").await.unwrap();
        assert_eq!(f.users.lookup_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lock_contention_gives_up_with_timeout() {
        let f = fixture(contention_settings());
        f.users.insert(NewUser::new("busy@example.com")).await.unwrap();
        f.users.set_latency(Duration::from_millis(600));

        let holder = {
            let profiles = f.profiles.clone();
            tokio::spawn(async move { profiles.find_user("busy@example.com").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = f.profiles.find_user("busy@example.com").await;

        assert!(matches!(waiter, Err(Error::Timeout(_))));
        assert!(holder.await.unwrap().is_ok());
        assert_eq!(f.users.lookup_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancellation_while_waiting_is_distinguishable() {
        let f = fixture(ProfileSettings::default());
        f.users.insert(NewUser::new("cancel@example.com")).await.unwrap();
        f.users.set_latency(Duration::from_millis(500));

        let holder = {
            let profiles = f.profiles.clone();
            tokio::spawn(async move { profiles.find_user("cancel@example.com").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let waiter = f
            .profiles
            .find_user_cancellable("cancel@example.com", &token)
            .await;

        assert!(matches!(waiter, Err(Error::Cancelled)));
        assert!(holder.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_does_no_io() {
        let f = fixture(ProfileSettings::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = f
            .profiles
            .find_user_cancellable("x@example.com", &token)
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(f.users.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_outage_is_an_error() {
        let f = fixture(ProfileSettings::default());
        f.users.insert(NewUser::new("c@example.com")).await.unwrap();
        f.remote.set_available(false);

        let result = f.profiles.find_user("c@example.com").await;

        assert!(matches!(result, Err(Error::Cache(_))));
    }

    #[tokio::test]
    async fn test_store_outage_is_an_error_not_a_miss() {
        let f = fixture(ProfileSettings::default());
        f.users.set_available(false);

        let result = f.profiles.find_user("s@example.com").await;

        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_lock_released_after_failed_load() {
        let f = fixture(contention_settings());
        f.users.set_available(false);
        assert!(f.profiles.find_user("retry@example.com").await.is_err());

        f.users.set_available(true);
        f.users.insert(NewUser::new("retry@example.com")).await.unwrap();

        // Would time out on the stripe if the failed lookup had kept it.
        assert!(f.profiles.find_user("retry@example.com").await.is_ok());
    }

    // ============================================================
    // LOCK STRIPING
    // ============================================================

    #[test]
    fn test_stripe_assignment_is_stable_and_bounded() {
        let stripes = LockStripes::new(16);

        assert_eq!(stripes.len(), 16);
        for i in 0..1_000 {
            let email = format!("s{}@example.com", i);
            let stripe = stripes.stripe_for(&email);
            assert!(stripe < 16);
            assert_eq!(stripe, stripes.stripe_for(&email));
        }
    }

    #[test]
    fn test_zero_stripes_is_clamped() {
        let stripes = LockStripes::new(0);
        assert_eq!(stripes.len(), 1);
        assert_eq!(stripes.stripe_for("any@example.com"), 0);
    }

    // ============================================================
    // HANDLERS
    // ============================================================

    #[tokio::test]
    async fn test_find_user_handler_status_codes() {
        let f = fixture(ProfileSettings::default());
        f.users.insert(NewUser::new("web@example.com")).await.unwrap();

        let (status, body) = handle_find_user(
            Extension(f.profiles.clone()),
            Path("web@example.com".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.user.as_ref().unwrap().email, "web@example.com");

        let (status, body) = handle_find_user(
            Extension(f.profiles.clone()),
            Path("nobody@example.com".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.user.is_none());
        assert!(body.error.is_some());
    }
}
