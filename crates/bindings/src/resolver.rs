//! Resolve service bindings from the process environment.

#[cfg(not(unix))]
use crate::Error;
use crate::{Binding, Result, VcapServices};
use std::ffi::OsString;
use std::path::Path;

/// Environment variable the platform uses to inject service bindings.
pub const DEFAULT_ENV_VAR: &str = "VCAP_SERVICES";

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Name of the environment variable holding the binding document.
    pub env_var: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            env_var: DEFAULT_ENV_VAR.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Read bindings from a different environment variable.
    #[must_use]
    pub fn with_env_var(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }
}

/// Resolves `VCAP_SERVICES` bindings into file-backed [`Binding`]s.
///
/// Each call is a single pass: read, parse, filter, materialize. Nothing is
/// cached between calls, and concurrent calls writing the same binding
/// directory are not coordinated.
#[derive(Debug, Clone, Default)]
pub struct VcapBindingResolver {
    config: ResolverConfig,
}

impl VcapBindingResolver {
    /// Create a resolver reading [`DEFAULT_ENV_VAR`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with explicit configuration.
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve bindings of type `typ` (and `provider`, unless empty) from the
    /// configured environment variable, materializing them under `working_dir`.
    ///
    /// An unset variable yields no bindings.
    ///
    /// # Errors
    ///
    /// Returns a parse-class error if the variable is not a valid binding
    /// document, and a materialize-class error if writing under `working_dir`
    /// fails.
    pub fn resolve(&self, typ: &str, provider: &str, working_dir: &Path) -> Result<Vec<Binding>> {
        let raw = std::env::var_os(&self.config.env_var)
            .map(|value| self.env_bytes(value))
            .transpose()?;

        self.resolve_from(raw.as_deref(), typ, provider, working_dir)
    }

    /// Unix variables are handed to the decoder as-is so invalid UTF-8 is
    /// reported with its position.
    #[cfg(unix)]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    fn env_bytes(&self, value: OsString) -> Result<Vec<u8>> {
        use std::os::unix::ffi::OsStringExt;
        Ok(value.into_vec())
    }

    #[cfg(not(unix))]
    fn env_bytes(&self, value: OsString) -> Result<Vec<u8>> {
        value
            .into_string()
            .map(String::into_bytes)
            .map_err(|_| Error::NotUnicode {
                var: self.config.env_var.clone(),
            })
    }

    /// Resolve bindings from an explicit document instead of the environment.
    ///
    /// `None` means the platform supplied no document and yields no bindings.
    ///
    /// # Errors
    ///
    /// See [`VcapBindingResolver::resolve`].
    pub fn resolve_from(
        &self,
        raw: Option<&[u8]>,
        typ: &str,
        provider: &str,
        working_dir: &Path,
    ) -> Result<Vec<Binding>> {
        let Some(raw) = raw else {
            tracing::debug!(
                env_var = %self.config.env_var,
                "No service binding document present"
            );
            return Ok(Vec::new());
        };

        VcapServices::parse(raw)?
            .filter_on_type_and_provider(typ, provider)
            .to_bindings(working_dir)
    }
}
