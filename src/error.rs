use std::io;

use thiserror::Error;

/// Raised by [`ReporterBuilder::build`](crate::ReporterBuilder::build) when
/// the configuration cannot produce a reporter.
///
/// Nothing has been started when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The application name is missing or blank.
    #[error("application name must not be empty")]
    MissingApplication,
    /// The service name is missing or blank.
    #[error("service name must not be empty")]
    MissingService,
    /// The reporting interval is zero.
    #[error("reporting interval must be at least one second")]
    InvalidInterval,
    /// An explicit source was given but it is blank.
    #[error("source must not be empty")]
    EmptySource,
}

/// The local host name could not be determined.
///
/// The builder recovers from this by reporting under the `unknown` source.
#[derive(Debug, Error)]
pub enum HostResolutionError {
    /// The operating system call failed.
    #[error("failed to look up local host name")]
    Io(#[from] io::Error),
    /// The host name is not valid unicode.
    #[error("local host name is not valid unicode")]
    InvalidName,
}

/// A metric point could not be delivered by a [`MetricSender`](crate::MetricSender).
#[derive(Debug, Error)]
pub enum SendError {
    /// The backend refused the point.
    #[error("point rejected: {0}")]
    Rejected(String),
    /// Writing to the backend failed.
    #[error("failed to send point")]
    Io(#[from] io::Error),
    /// The sender has been shut down.
    #[error("sender is closed")]
    Closed,
}
