use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use email_registry::config::Config;
use email_registry::hashing::verify_digest;
use email_registry::index::{EMAIL_HASH_KEY, MembershipIndex};
use email_registry::pipeline::BulkPipeline;
use email_registry::pipeline::handlers::{handle_dump_users, handle_load_index};
use email_registry::pipeline::protocol::{ENDPOINT_DUMP_USERS, ENDPOINT_LOAD_INDEX};
use email_registry::profile::ProfileService;
use email_registry::profile::handlers::handle_find_user;
use email_registry::profile::protocol::ENDPOINT_USER_PROFILE;
use email_registry::registration::RegistrationService;
use email_registry::registration::handlers::{handle_check_email, handle_register_email};
use email_registry::registration::protocol::{ENDPOINT_CHECK, ENDPOINT_REGISTER};
use email_registry::storage::{MemoryRemoteStore, MemoryUserStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let config = match Config::from_args(&args[1..]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!(
                "Usage: {} [--bind <addr:port>] [--users <n>] [--batch-size <n>] [--page-size <n>] \
                 [--workers <n>] [--queue-depth <n>] [--lock-timeout-ms <n>] [--cache-ttl-secs <n>] \
                 [--retry-backoff-ms <n>] [--max-lookup-attempts <n>] [--lock-stripes <n>] \
                 [--io-timeout-ms <n>] [--bulk-io-timeout-ms <n>] [--log-level <level>] [--verify-membership]",
                args[0]
            );
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // 1. Refuse to derive offsets from a broken digest:
    verify_digest()?;

    tracing::info!("Starting email registry on {}", config.bind_addr);
    tracing::info!("Membership policy: {:?}", config.membership_policy);

    // 2. Stores:
    let remote = Arc::new(MemoryRemoteStore::new());
    let users = Arc::new(MemoryUserStore::new());
    let index = MembershipIndex::new(remote.clone(), config.io_timeout);

    // 3. Coordinators:
    let shutdown = CancellationToken::new();

    let registration = Arc::new(RegistrationService::new(
        index.clone(),
        users.clone(),
        config.membership_policy,
        config.io_timeout,
    ));
    let profiles = Arc::new(ProfileService::new(
        remote.clone(),
        users.clone(),
        config.profile.clone(),
    ));
    let pipeline = Arc::new(BulkPipeline::new(
        users.clone(),
        index,
        config.pipeline.clone(),
        shutdown.clone(),
    ));

    // 4. HTTP Router:
    let app = Router::new()
        .route(ENDPOINT_CHECK, get(handle_check_email))
        .route(ENDPOINT_REGISTER, post(handle_register_email))
        .route(ENDPOINT_DUMP_USERS, post(handle_dump_users))
        .route(ENDPOINT_LOAD_INDEX, post(handle_load_index))
        .route(
            &format!("{}/:email", ENDPOINT_USER_PROFILE),
            get(handle_find_user),
        )
        .layer(Extension(registration))
        .layer(Extension(profiles))
        .layer(Extension(pipeline));

    // 5. Spawn stats reporter:
    let stats_users = users.clone();
    let stats_remote = remote.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));

        loop {
            interval.tick().await;
            tracing::info!(
                "Registry stats: {} users, {} index bits, {} cached profiles",
                stats_users.len(),
                stats_remote.bit_count(EMAIL_HASH_KEY),
                stats_remote.entry_count()
            );
        }
    });

    // 6. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested, cancelling bulk jobs");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
