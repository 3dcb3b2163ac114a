//! Keep-alive supervision.
//!
//! Each connected session runs one supervisor task: ping on a fixed
//! interval, wait for the pong fan-out, and force a disconnect after too
//! many consecutive silent windows. The supervisor never surfaces errors
//! to the caller; its only escalation is the forced disconnect.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use drivelink_transport::Transport;

use crate::vehicle::Vehicle;

/// Liveness policy for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepAliveConfig {
    /// Pause between pings.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// How long to wait for a pong after each ping.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Consecutive silent windows tolerated before the session is
    /// forcibly disconnected. The disconnect fires when the counter
    /// exceeds this value.
    #[serde(default = "default_max_timeouts")]
    pub max_timeouts: u32,
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_timeouts() -> u32 {
    2
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            max_timeouts: default_max_timeouts(),
        }
    }
}

/// Supervisor loop. Spawned by `Vehicle::connect`, cancelled by
/// `Vehicle::disconnect`; also terminates on its own once the session
/// leaves the connected state for any reason.
pub(crate) async fn run<T: Transport + 'static>(
    vehicle: Vehicle<T>,
    config: KeepAliveConfig,
    cancel: CancellationToken,
) {
    let mut pongs = vehicle.pong_events();
    let mut missed = 0u32;

    while vehicle.is_connected() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.interval) => {}
        }
        if !vehicle.is_connected() {
            return;
        }

        // Pongs that raced in since the last window would mask a vehicle
        // that has since gone silent.
        loop {
            match pongs.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }

        if let Err(err) = vehicle.ping().await {
            tracing::debug!(id = vehicle.id(), %err, "keep-alive ping was not sent");
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = tokio::time::timeout(config.timeout, pongs.recv()) => outcome,
        };
        match outcome {
            Ok(Ok(())) | Ok(Err(RecvError::Lagged(_))) => missed = 0,
            Ok(Err(RecvError::Closed)) => return,
            Err(_) => {
                missed += 1;
                tracing::debug!(
                    id = vehicle.id(),
                    missed,
                    "ping window elapsed without a pong"
                );
            }
        }

        if missed > config.max_timeouts {
            tracing::warn!(
                id = vehicle.id(),
                "vehicle stopped answering pings, disconnecting"
            );
            if let Err(err) = vehicle.disconnect().await {
                tracing::warn!(id = vehicle.id(), %err, "forced disconnect failed");
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let config = KeepAliveConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_timeouts, 2);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: KeepAliveConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, KeepAliveConfig::default());

        let config: KeepAliveConfig =
            serde_json::from_str(r#"{"interval": "2s", "max_timeouts": 5}"#).unwrap();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_timeouts, 5);
    }
}
