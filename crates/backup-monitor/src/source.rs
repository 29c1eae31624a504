//! Where backups come from.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::ApiResource;
use kube::{Client, Config};
use serde_json::Value;
use tracing::info;

/// A listing of raw backup objects.
#[async_trait]
pub trait BackupSource: Send + Sync {
    /// Name used in listing-failure reports.
    fn describe(&self) -> &str;

    /// Namespace being watched.
    fn namespace(&self) -> &str;

    /// List every backup object as untyped JSON.
    async fn list(&self) -> Result<Vec<Value>>;
}

/// Velero `Backup` API resource definition.
fn velero_backup_api() -> ApiResource {
    ApiResource {
        group: "velero.io".to_string(),
        version: "v1".to_string(),
        api_version: "velero.io/v1".to_string(),
        kind: "Backup".to_string(),
        plural: "backups".to_string(),
    }
}

/// Reads Velero backups from the Kubernetes API.
pub struct KubeBackupSource {
    api: Api<DynamicObject>,
    namespace: String,
}

impl KubeBackupSource {
    /// Build a source from an existing client.
    #[must_use]
    pub fn new(client: Client, namespace: &str) -> Self {
        let api = Api::namespaced_with(client, namespace, &velero_backup_api());
        Self {
            api,
            namespace: namespace.to_string(),
        }
    }

    /// Connect to the cluster, preferring a local kubeconfig over in-cluster config.
    ///
    /// `kubeconfig` overrides the lookup. Otherwise the first existing entry
    /// of the `KUBECONFIG` path list is used, then `$HOME/.kube/config`. If no
    /// file exists, the in-cluster service account is used.
    pub async fn connect(namespace: &str, kubeconfig: Option<&Path>) -> Result<Self> {
        let path = resolve_kubeconfig(
            kubeconfig,
            std::env::var_os("KUBECONFIG").as_deref(),
            std::env::var_os("HOME").as_deref(),
        );

        let config = match path {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(&path).with_context(|| {
                    format!("Failed to read kubeconfig from {}", path.display())
                })?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .context("Failed to build Kubernetes config from kubeconfig")?;
                info!(path = %path.display(), "Using local kubeconfig to connect to the cluster");
                config
            }
            None => {
                let config =
                    Config::incluster().context("Failed to load in-cluster configuration")?;
                info!("Kubeconfig file not found, using in-cluster configuration");
                config
            }
        };

        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
        Ok(Self::new(client, namespace))
    }
}

/// Pick the kubeconfig file to load, if any exists.
fn resolve_kubeconfig(
    explicit: Option<&Path>,
    kubeconfig_env: Option<&OsStr>,
    home: Option<&OsStr>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf()).filter(|p| p.exists());
    }

    let from_env = kubeconfig_env
        .into_iter()
        .flat_map(std::env::split_paths)
        .filter(|p| !p.as_os_str().is_empty());
    let from_home = home
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".kube").join("config"));

    from_env.chain(from_home).find(|p| p.exists())
}

#[async_trait]
impl BackupSource for KubeBackupSource {
    fn describe(&self) -> &str {
        "Velero"
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list(&self) -> Result<Vec<Value>> {
        let list = self.api.list(&ListParams::default()).await?;

        list.items
            .into_iter()
            .map(|item| serde_json::to_value(item).map_err(anyhow::Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")
    }

    #[test]
    fn test_kubeconfig_list_uses_first_existing_entry() {
        let list = std::env::join_paths([PathBuf::from("/nonexistent/kubeconfig"), manifest()])
            .unwrap();

        let resolved = resolve_kubeconfig(None, Some(list.as_os_str()), None);
        assert_eq!(resolved, Some(manifest()));
    }

    #[test]
    fn test_no_existing_kubeconfig_resolves_to_none() {
        let home = Path::new(env!("CARGO_MANIFEST_DIR")).join("missing-home");
        let list = std::env::join_paths(["/nonexistent/a", "/nonexistent/b"]).unwrap();

        let resolved = resolve_kubeconfig(None, Some(list.as_os_str()), Some(home.as_os_str()));
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_explicit_kubeconfig_wins() {
        let list = std::env::join_paths([manifest()]).unwrap();
        let missing = Path::new("/nonexistent/explicit");

        assert_eq!(resolve_kubeconfig(Some(manifest().as_path()), None, None), Some(manifest()));
        assert_eq!(resolve_kubeconfig(Some(missing), Some(list.as_os_str()), None), None);
    }

    #[test]
    fn test_backup_api_resource() {
        let api = velero_backup_api();
        assert_eq!(api.api_version, "velero.io/v1");
        assert_eq!(api.plural, "backups");
    }

    #[test]
    fn test_dynamic_object_serializes_to_paths() {
        let object: DynamicObject = serde_json::from_value(serde_json::json!({
            "apiVersion": "velero.io/v1",
            "kind": "Backup",
            "metadata": {"name": "nightly-01"},
            "status": {"phase": "Completed"}
        }))
        .unwrap();

        let value = serde_json::to_value(object).unwrap();
        assert_eq!(value.pointer("/metadata/name").unwrap(), "nightly-01");
        assert_eq!(value.pointer("/status/phase").unwrap(), "Completed");
    }
}
