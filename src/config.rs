//! Tracer configuration.

use crate::builder::impl_builder;
use crate::error::BuilderError;
use std::time::Duration;

/// Entry point of a program's main thread.
pub const MAIN_ENTRYPOINT: &str = "main([Ljava/lang/String;)V";

/// Entry point of a spawned thread or task.
pub const RUN_ENTRYPOINT: &str = "run()V";

/// Configuration for a single-thread tracer.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TracerConfig {
    /// Bounded wait for each poll of the event channel (default: 1s).
    ///
    /// Between polls the consumer rechecks tracee liveness and interrupts,
    /// so this is also the worst-case shutdown latency.
    pub poll_timeout: Duration,

    /// Name+descriptor of the methods whose frames start the trace.
    ///
    /// Top-level frames matching none of these are skipped entirely.
    pub entrypoints: Vec<String>,

    /// Name given to the consumer thread (default: "__TRACER__").
    pub thread_name: String,

    /// Capacity of the event channel. `None` means unbounded; with a bound,
    /// the producer blocks in `consume` while the channel is full.
    pub channel_capacity: Option<usize>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            entrypoints: vec![MAIN_ENTRYPOINT.into(), RUN_ENTRYPOINT.into()],
            thread_name: "__TRACER__".into(),
            channel_capacity: None,
        }
    }
}

impl TracerConfig {
    /// Whether `name_desc` is one of the configured trace entry points.
    pub fn is_entrypoint(&self, name_desc: &str) -> bool {
        self.entrypoints.iter().any(|e| e == name_desc)
    }

    fn validate(&self) -> Result<(), BuilderError> {
        if self.poll_timeout.is_zero() {
            return Err(BuilderError::InvalidField {
                builder: "TracerConfigBuilder",
                field: "poll_timeout",
                reason: "must be non-zero".into(),
            });
        }
        if self.entrypoints.is_empty() {
            return Err(BuilderError::InvalidField {
                builder: "TracerConfigBuilder",
                field: "entrypoints",
                reason: "at least one entry point is required".into(),
            });
        }
        Ok(())
    }
}

impl_builder!(TracerConfig, TracerConfigBuilder {
    defaulted {
        poll_timeout: Duration,
        entrypoints: Vec<String>,
        thread_name: String,
    }
    optional {
        channel_capacity: usize,
    }
});
