//! The `VCAP_SERVICES` document: parsing, filtering and materialization.

use crate::{Binding, Entry, Error, Result};
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Service group name -> bindings declared under it, in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VcapServices {
    groups: IndexMap<String, Vec<VcapBinding>>,
}

/// One service binding as declared by the platform.
///
/// Nothing here is validated at parse time. An empty or unsafe
/// `binding_guid` is only rejected when the binding is materialized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VcapBinding {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Service type, e.g. `htpasswd`.
    #[serde(default)]
    pub label: String,
    /// Optional provider; empty when not declared.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub provider: String,
    /// Unique binding identifier, used as the directory name.
    #[serde(default)]
    pub binding_guid: String,
    /// Credential key -> value.
    #[serde(default, deserialize_with = "deserialize_credentials")]
    pub credentials: BTreeMap<String, SecretString>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_credentials<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, String>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, SecretString::from(value)))
        .collect())
}

impl VcapServices {
    /// Decode a `VCAP_SERVICES` document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `contents` is not valid JSON or does not
    /// have the `{group: [binding, ...]}` shape.
    pub fn parse(contents: impl AsRef<[u8]>) -> Result<Self> {
        let services: Self = serde_json::from_slice(contents.as_ref())?;
        tracing::debug!(
            groups = services.groups.len(),
            bindings = services.len(),
            "Parsed VCAP_SERVICES"
        );
        Ok(services)
    }

    /// Append a binding to `group`, creating the group if needed.
    pub fn insert(&mut self, group: impl Into<String>, binding: VcapBinding) {
        self.groups.entry(group.into()).or_default().push(binding);
    }

    /// Bindings declared under `group`.
    #[must_use]
    pub fn group(&self, group: &str) -> Option<&[VcapBinding]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Iterate over group names.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Iterate over every binding, group by group.
    pub fn bindings(&self) -> impl Iterator<Item = &VcapBinding> {
        self.groups.values().flatten()
    }

    /// Total number of bindings across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Check if there are no bindings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select bindings whose label equals `typ` and whose provider equals
    /// `provider`. An empty `provider` matches any binding provider.
    ///
    /// Comparison is exact and case-sensitive. Groups without a match are
    /// dropped; order within a group is preserved.
    #[must_use]
    pub fn filter_on_type_and_provider(&self, typ: &str, provider: &str) -> Self {
        let mut filtered = Self::default();

        for (group, bindings) in &self.groups {
            for binding in bindings {
                if binding.matches(typ, provider) {
                    filtered.insert(group.clone(), binding.clone());
                }
            }
        }

        tracing::debug!(
            kind = %typ,
            provider = %provider,
            matched = filtered.len(),
            "Filtered VCAP_SERVICES bindings"
        );
        filtered
    }

    /// Materialize every binding under `working_dir`, in iteration order.
    ///
    /// Stops at the first failure. Directories and files written before the
    /// failure are left on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for an unusable GUID or credential key,
    /// or [`Error::Io`] if a directory or file cannot be written.
    pub fn to_bindings(&self, working_dir: &Path) -> Result<Vec<Binding>> {
        self.bindings()
            .map(|binding| binding.to_binding(working_dir))
            .collect()
    }
}

impl VcapBinding {
    /// Create a binding with no provider and no credentials.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        binding_guid: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            binding_guid: binding_guid.into(),
            ..Self::default()
        }
    }

    /// Set the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Add a credential.
    #[must_use]
    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), SecretString::from(value.into()));
        self
    }

    /// Check the label/provider selection rule.
    #[must_use]
    pub fn matches(&self, typ: &str, provider: &str) -> bool {
        self.label == typ && (provider.is_empty() || provider == self.provider)
    }

    /// Write this binding's credentials to `<working_dir>/<binding_guid>/`.
    ///
    /// The directory is created if missing. Existing credential files are
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the GUID or a credential key is not
    /// a plain file name, or [`Error::Io`] if the filesystem rejects a write.
    pub fn to_binding(&self, working_dir: &Path) -> Result<Binding> {
        validate_path_segment(&self.binding_guid)?;
        for key in self.credentials.keys() {
            validate_path_segment(key)?;
        }

        let binding_directory = working_dir.join(&self.binding_guid);
        create_binding_directory(&binding_directory)?;

        let mut entries = BTreeMap::new();
        for (key, credential) in &self.credentials {
            let filename = binding_directory.join(key);
            write_credential(&filename, credential.expose_secret().as_bytes())?;
            entries.insert(key.clone(), Entry::new(filename));
        }

        tracing::info!(
            binding_guid = %self.binding_guid,
            path = %binding_directory.display(),
            entries = entries.len(),
            "Materialized service binding"
        );

        Ok(Binding {
            name: self.name.clone(),
            kind: self.label.clone(),
            provider: (!self.provider.is_empty()).then(|| self.provider.clone()),
            path: binding_directory,
            entries,
        })
    }
}

/// Reject names that would escape or collapse the binding directory.
fn validate_path_segment(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name cannot be empty"
    } else if name.chars().any(std::path::is_separator) {
        "name cannot contain path separators"
    } else if name == "." || name == ".." {
        "name cannot be a directory reference"
    } else if name.contains('\0') {
        "name cannot contain NUL bytes"
    } else {
        return Ok(());
    };

    Err(Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn create_binding_directory(path: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(path)
        .map_err(|e| Error::io_with_context("create directory", path, e))
}

fn write_credential(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut file = options
        .open(path)
        .map_err(|e| Error::io_with_context("write", path, e))?;
    file.write_all(contents)
        .map_err(|e| Error::io_with_context("write", path, e))
}
