//! Proc Sampler: point-in-time and rate-derived memory and CPU measurements of a single
//! process, normalised across hosts with and without a process-information filesystem.
//!
//! The library is split into a typed metric store ([`metrics`]) and the sampler that
//! fills it ([`process`]). Deciding when to sample and what to do with the readings is
//! left to the caller; [`run`] is the minimal loop used by the bundled binary.

use std::future::Future;
use std::time::{Duration, Instant};

use config::SamplerConfig;
use error::ResultOkLogExt;
use process::ProcessSampler;

pub mod config;
pub mod error;
pub mod fsutil;
pub mod metrics;
pub mod process;

/// Runs the sampling loop until Ctrl-C.
///
/// Reads [`SamplerConfig`] from the environment, samples the configured pid once per cycle
/// and logs a JSON snapshot of the store after every successful pass. Failed passes are
/// logged and retried on the next tick.
///
/// # Errors
///
/// Possible errors include:
/// - Malformed configuration variables.
/// - A panic inside the blocking sampling task.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = SamplerConfig::from_env()?;
    log::debug!("Configuration: {:?}", config);
    sample_until(&config, tokio::signal::ctrl_c()).await
}

/// Samples as configured by `config` until `shutdown` completes.
///
/// `shutdown` is polled across passes, so a signal that arrives while a pass is running
/// stops the loop before the next one.
///
/// # Errors
///
/// Returns an error if the process metrics cannot be declared or the blocking sampling
/// task panics.
pub async fn sample_until<F: Future>(
    config: &SamplerConfig,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>> {
    let pid = config.pid.unwrap_or_else(std::process::id);
    let mut sampler = ProcessSampler::from_config(config)?;
    log::info!(
        "Sampling pid {} every {}s from `{}`",
        pid,
        config.cycle_secs,
        sampler.proc_root().display()
    );

    let mut interval = sampling_interval(config.cycle());
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                log::info!("Shutdown requested, stopping");
                return Ok(());
            }
        }

        // The sampler moves into the blocking task and back, so passes never overlap.
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let before = Instant::now();
            let result = sampler.collect(pid);
            log::trace!("collect() took {} nanoseconds", before.elapsed().as_nanos());
            (sampler, result)
        })
        .await?;
        sampler = returned;

        if result.ok_log(format_args!("sampling pid {pid}")).is_none() {
            continue;
        }
        let snapshot = serde_json::to_string(&sampler.store().snapshot());
        if let Some(json) = snapshot.ok_log("serializing snapshot") {
            log::info!(target: "sampler", "pid={pid} {json}");
        }
    }
}

/// Ticks once per `cycle`. Ticks missed during a slow pass are delayed, never burst.
fn sampling_interval(cycle: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(cycle);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sampling_interval_delays_missed_ticks() {
        let interval = sampling_interval(Duration::from_secs(15));
        assert_eq!(
            interval.missed_tick_behavior(),
            tokio::time::MissedTickBehavior::Delay
        );
        assert_eq!(interval.period(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_sample_until_stops_on_shutdown() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = SamplerConfig {
            proc_root: dir.path().to_path_buf(),
            cycle_secs: 1,
            pid: Some(4242),
            ..SamplerConfig::default()
        };

        // The first pass fails on the empty root and is logged; the loop keeps running
        // until the shutdown future resolves.
        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let stopped = tokio::time::timeout(Duration::from_secs(5), sample_until(&config, shutdown))
            .await
            .expect("loop should stop on shutdown");
        assert!(stopped.is_ok());
    }
}
