//! Service Configuration
//!
//! All tunables consumed by the coordinators and bulk jobs, with the defaults
//! the service ships with. Values are parsed from `--flag value` command line
//! pairs in `main` and handed to each component through its constructor.

use crate::error::{Error, Result};
use crate::registration::types::MembershipPolicy;

use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 5_000;
pub const DEFAULT_GENERATE_COUNT: u64 = 100_000_000;
pub const DEFAULT_PAGE_SIZE: usize = 1_000_000;
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BULK_IO_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_LOOKUP_ATTEMPTS: usize = 20;

/// Settings for the cache-aside profile lookups.
#[derive(Debug, Clone)]
pub struct ProfileSettings {
    /// Expiration applied to every cached profile.
    pub cache_ttl: Duration,
    /// Bounded wait for the per-email lock.
    pub lock_timeout: Duration,
    /// Pause before retrying after a lock timeout.
    pub retry_backoff: Duration,
    /// Upper bound on cache-then-lock rounds for a single lookup.
    pub max_lookup_attempts: usize,
    /// Number of lock stripes shared by all emails.
    pub lock_stripes: usize,
    /// Deadline for each cache or store call.
    pub io_timeout: Duration,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_lookup_attempts: DEFAULT_MAX_LOOKUP_ATTEMPTS,
            lock_stripes: 1024,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

/// Settings for the bulk generate and reconcile jobs.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub generate_count: u64,
    pub page_size: usize,
    pub worker_count: usize,
    /// Batches allowed to wait for a worker before the producer blocks.
    pub queue_depth: usize,
    /// Deadline for one batch insert or one page read.
    pub io_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let worker_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            generate_count: DEFAULT_GENERATE_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
            worker_count,
            queue_depth: worker_count * 2,
            io_timeout: DEFAULT_BULK_IO_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_level: tracing::Level,
    pub membership_policy: MembershipPolicy,
    /// Deadline for each bitmap or store call on the registration path.
    pub io_timeout: Duration,
    pub profile: ProfileSettings,
    pub pipeline: PipelineSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: tracing::Level::INFO,
            membership_policy: MembershipPolicy::BitOnly,
            io_timeout: DEFAULT_IO_TIMEOUT,
            profile: ProfileSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Config {
    /// Builds a config from `--flag value` pairs (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Config::default();
        let mut queue_depth_set = false;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();

            // Boolean flags take no value.
            if flag == "--verify-membership" {
                config.membership_policy = MembershipPolicy::Verified;
                i += 1;
                continue;
            }

            let value = args
                .get(i + 1)
                .ok_or_else(|| Error::Config(format!("{} requires a value", flag)))?;

            match flag {
                "--bind" => config.bind_addr = parse(flag, value)?,
                "--log-level" => config.log_level = parse(flag, value)?,
                "--users" => config.pipeline.generate_count = parse(flag, value)?,
                "--batch-size" => config.pipeline.batch_size = parse(flag, value)?,
                "--page-size" => config.pipeline.page_size = parse(flag, value)?,
                "--workers" => config.pipeline.worker_count = parse(flag, value)?,
                "--queue-depth" => {
                    config.pipeline.queue_depth = parse(flag, value)?;
                    queue_depth_set = true;
                }
                "--lock-timeout-ms" => {
                    config.profile.lock_timeout = Duration::from_millis(parse(flag, value)?)
                }
                "--cache-ttl-secs" => {
                    config.profile.cache_ttl = Duration::from_secs(parse(flag, value)?)
                }
                "--retry-backoff-ms" => {
                    config.profile.retry_backoff = Duration::from_millis(parse(flag, value)?)
                }
                "--max-lookup-attempts" => {
                    config.profile.max_lookup_attempts = parse(flag, value)?
                }
                "--lock-stripes" => config.profile.lock_stripes = parse(flag, value)?,
                "--io-timeout-ms" => {
                    let timeout = Duration::from_millis(parse(flag, value)?);
                    config.io_timeout = timeout;
                    config.profile.io_timeout = timeout;
                }
                "--bulk-io-timeout-ms" => {
                    config.pipeline.io_timeout = Duration::from_millis(parse(flag, value)?)
                }
                other => return Err(Error::Config(format!("Unknown flag: {}", other))),
            }
            i += 2;
        }

        if !queue_depth_set {
            config.pipeline.queue_depth = config.pipeline.worker_count * 2;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if p.batch_size == 0 || p.page_size == 0 || p.worker_count == 0 || p.queue_depth == 0 {
            return Err(Error::Config(
                "batch size, page size, workers and queue depth must be positive".to_string(),
            ));
        }
        if self.profile.lock_stripes == 0 || self.profile.max_lookup_attempts == 0 {
            return Err(Error::Config(
                "lock stripes and lookup attempts must be positive".to_string(),
            ));
        }
        if self.io_timeout.is_zero()
            || self.profile.io_timeout.is_zero()
            || self.pipeline.io_timeout.is_zero()
        {
            return Err(Error::Config("I/O timeout must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse<T>(flag: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| Error::Config(format!("Invalid value for {}: {}", flag, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_match_service_constants() {
        let config = Config::default();

        assert_eq!(config.pipeline.batch_size, 5_000);
        assert_eq!(config.pipeline.page_size, 1_000_000);
        assert_eq!(config.pipeline.generate_count, 100_000_000);
        assert_eq!(config.profile.lock_timeout, Duration::from_secs(1));
        assert_eq!(config.profile.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.profile.retry_backoff, Duration::from_millis(100));
        assert_eq!(config.membership_policy, MembershipPolicy::BitOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_args_overrides() {
        let config = Config::from_args(&args(&[
            "--bind",
            "0.0.0.0:9000",
            "--users",
            "1000",
            "--batch-size",
            "100",
            "--workers",
            "3",
            "--verify-membership",
            "--log-level",
            "debug",
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.pipeline.generate_count, 1000);
        assert_eq!(config.pipeline.batch_size, 100);
        assert_eq!(config.pipeline.worker_count, 3);
        assert_eq!(config.pipeline.queue_depth, 6);
        assert_eq!(config.membership_policy, MembershipPolicy::Verified);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_from_args_lookup_and_bulk_tunables() {
        let config = Config::from_args(&args(&[
            "--retry-backoff-ms",
            "250",
            "--max-lookup-attempts",
            "5",
            "--bulk-io-timeout-ms",
            "30000",
        ]))
        .unwrap();

        assert_eq!(config.profile.retry_backoff, Duration::from_millis(250));
        assert_eq!(config.profile.max_lookup_attempts, 5);
        assert_eq!(config.pipeline.io_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_args_rejects_zero_lookup_attempts() {
        let result = Config::from_args(&args(&["--max-lookup-attempts", "0"]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_args_rejects_unknown_flag() {
        let result = Config::from_args(&args(&["--nope", "1"]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_args_rejects_missing_value() {
        let result = Config::from_args(&args(&["--users"]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_args_rejects_zero_batch_size() {
        let result = Config::from_args(&args(&["--batch-size", "0"]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
