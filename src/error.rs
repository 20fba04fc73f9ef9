#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the profile-stats crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Every failure in the pipeline is fatal except the contribution lookup,
//! which callers downgrade to a warning. Nothing here is retried.

use std::path::{Path, PathBuf};

/// Exit status reported when required configuration is missing or invalid.
pub const CONFIGURATION_EXIT_CODE: i32 = 2;

/// Exit status reported for every other fatal error.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Unified error type returned by the fetcher, renderers and CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Required input is absent or a configured value is out of range.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human readable description of the problem.
        message: String
    },
    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("network error while requesting {url}: {source}")]
    Transport {
        /// URL that was being requested.
        url:    String,
        /// Underlying client error.
        source: octocrab::Error
    },
    /// GitHub answered with a non-2xx status.
    #[error("GitHub API error {status} for {url}: {detail}")]
    Upstream {
        /// URL that was being requested.
        url:    String,
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body, verbatim.
        detail: String
    },
    /// A GraphQL response carried an `errors` array.
    #[error("GraphQL query reported errors: {message}")]
    GraphQl {
        /// Rendered error list.
        message: String
    },
    /// The decoded payload is not of the expected kind.
    #[error("unexpected {context} payload from GitHub API: {message}")]
    Shape {
        /// Which payload was being decoded.
        context: &'static str,
        /// What was wrong with it.
        message: String
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path:?}: {source}")]
    ConfigIo {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// The configuration file is not valid YAML for the expected document.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// An output artifact could not be read or written.
    #[error("failed to write artifact at {path:?}: {source}")]
    ArtifactIo {
        /// Location of the artifact.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    }
}

impl Error {
    /// Constructs a configuration error from the provided message.
    pub fn configuration<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Configuration {
            message: message.into()
        }
    }

    /// Constructs a shape error for the named payload.
    ///
    /// # Parameters
    ///
    /// * `context` - Short name of the payload (`"user"`, `"repos"`, ...).
    /// * `message` - What made the payload unacceptable.
    pub fn shape<M>(context: &'static str, message: M) -> Self
    where
        M: Into<String>
    {
        Self::Shape {
            context,
            message: message.into()
        }
    }

    /// Process exit status matching the error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration {
                ..
            }
            | Self::ConfigIo {
                ..
            }
            | Self::ConfigParse {
                ..
            } => CONFIGURATION_EXIT_CODE,
            _ => FAILURE_EXIT_CODE
        }
    }

    /// Formats the error for diagnostics without the variant name.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            source
        }
    }
}

/// Creates an [`Error::ConfigIo`] variant capturing the failing path and
/// source.
pub fn config_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ConfigIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ArtifactIo`] variant capturing the failing path and
/// source.
///
/// # Parameters
///
/// * `path` - Location of the artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn artifact_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ArtifactIo {
        path: path.to_path_buf(),
        source
    }
}
