//! Service binding resolution from `VCAP_SERVICES`.
//!
//! Cloud Foundry style platforms inject service credentials through a single
//! JSON environment variable. This crate turns that document into file-backed
//! service bindings: every credential of a matching binding is written to
//! `<working_dir>/<binding_guid>/<credential key>` and handed back as a
//! [`Binding`] whose [`Entry`] values point at those files.
//!
//! The pipeline has three stages:
//!
//! 1. [`VcapServices::parse`] decodes the raw document.
//! 2. [`VcapServices::filter_on_type_and_provider`] selects bindings by label
//!    and, optionally, provider.
//! 3. [`VcapServices::to_bindings`] materializes the selection on disk.
//!
//! [`VcapBindingResolver`] composes the three and owns the environment lookup.
//!
//! # Example
//!
//! ```no_run
//! use vcap_bindings::VcapBindingResolver;
//! use std::path::Path;
//!
//! let resolver = VcapBindingResolver::new();
//! let bindings = resolver.resolve("htpasswd", "", Path::new("/tmp/bindings"))?;
//! for binding in &bindings {
//!     if let Some(entry) = binding.entries.get(".htpasswd") {
//!         println!("htpasswd file at {}", entry.path().display());
//!     }
//! }
//! # Ok::<(), vcap_bindings::Error>(())
//! ```

mod binding;
mod resolver;
mod vcap;

pub use binding::{Binding, Entry};
pub use resolver::{DEFAULT_ENV_VAR, ResolverConfig, VcapBindingResolver};
pub use vcap::{VcapBinding, VcapServices};

use std::path::PathBuf;

/// Errors produced while resolving service bindings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The binding document is not valid JSON or does not match the expected shape.
    #[error("Failed to parse VCAP_SERVICES: {source}")]
    Parse {
        /// Underlying decoder error, carrying line and column.
        #[source]
        source: serde_json::Error,
    },

    /// The environment variable is set but does not hold valid UTF-8.
    /// Only raised where the environment cannot be read as raw bytes.
    #[error("Environment variable '{var}' does not contain valid UTF-8")]
    NotUnicode {
        /// Name of the offending variable.
        var: String,
    },

    /// A binding GUID or credential key cannot be used as a path segment.
    #[error("Invalid binding path segment '{name}': {reason}")]
    InvalidName {
        /// The rejected GUID or credential key.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Filesystem failure with the path that triggered it.
    #[error("Failed to {operation} '{path}': {source}")]
    Io {
        /// What was being attempted (e.g. "create directory", "write").
        operation: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an I/O error with path context.
    pub fn io_with_context(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error was raised before any filesystem mutation,
    /// while decoding the binding document.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::NotUnicode { .. })
    }

    /// Returns true if the error was raised while materializing bindings on disk.
    #[must_use]
    pub fn is_materialize(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::Io { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Parse { source }
    }
}

/// Result type for binding resolution.
pub type Result<T> = std::result::Result<T, Error>;
