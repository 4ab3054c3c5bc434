//! Object storage upload (S3, GCS, Azure, local directory, in-memory)

use crate::config::Connection;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode, PutOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Where objects are uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum StorageTarget {
    /// AWS S3 or any S3-compatible endpoint (R2, MinIO)
    S3 {
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        allow_http: bool,
        /// Connection holding `login` = access key id, `password` = secret
        #[serde(default)]
        conn_id: Option<String>,
    },
    /// Google Cloud Storage
    Gcs {
        #[serde(default)]
        service_account_path: Option<PathBuf>,
    },
    /// Azure Blob Storage; the bucket is the container
    Azure {
        #[serde(default)]
        account: Option<String>,
        #[serde(default)]
        conn_id: Option<String>,
    },
    /// Local directory; each bucket is a subdirectory of `root`
    Local { root: PathBuf },
}

impl StorageTarget {
    /// Connection id the provider needs resolved, if any
    pub fn conn_id(&self) -> Option<&str> {
        match self {
            StorageTarget::S3 { conn_id, .. } | StorageTarget::Azure { conn_id, .. } => {
                conn_id.as_deref()
            }
            _ => None,
        }
    }

    /// URL scheme for logging
    pub fn scheme(&self) -> &'static str {
        match self {
            StorageTarget::S3 { .. } => "s3",
            StorageTarget::Gcs { .. } => "gs",
            StorageTarget::Azure { .. } => "az",
            StorageTarget::Local { .. } => "file",
        }
    }
}

/// The upload operation the object store sink consumes
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Upload a local file to `key` in `bucket`
    ///
    /// With `overwrite` false the upload fails if the key already exists.
    async fn load_file(&self, local_path: &Path, key: &str, bucket: &str, overwrite: bool)
        -> Result<()>;
}

#[derive(Debug, Clone)]
enum Backend {
    Target {
        target: StorageTarget,
        connection: Option<Connection>,
    },
    /// One store for every bucket; objects live at `{bucket}/{key}`
    Shared(Arc<dyn ObjectStore>),
}

/// `ObjectUploader` backed by the `object_store` crate
#[derive(Debug, Clone)]
pub struct ObjectStoreUploader {
    backend: Backend,
}

impl ObjectStoreUploader {
    /// Uploader for a configured provider
    ///
    /// `connection` supplies static credentials for S3 and Azure. Without it
    /// the provider's environment variables are used.
    pub fn new(target: StorageTarget, connection: Option<Connection>) -> Self {
        Self {
            backend: Backend::Target { target, connection },
        }
    }

    /// Uploader writing every bucket into one existing store
    pub fn shared(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            backend: Backend::Shared(store),
        }
    }

    /// Uploader over a fresh in-memory store, returned alongside it
    pub fn in_memory() -> (Self, Arc<InMemory>) {
        let store = Arc::new(InMemory::new());
        (Self::shared(store.clone()), store)
    }

    fn scheme(&self) -> &'static str {
        match &self.backend {
            Backend::Target { target, .. } => target.scheme(),
            Backend::Shared(_) => "memory",
        }
    }

    /// Resolve the store and object path for one upload
    fn resolve(&self, bucket: &str, key: &str) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
        let (target, connection) = match &self.backend {
            Backend::Shared(store) => {
                let path = ObjectPath::from(format!("{bucket}/{}", key.trim_start_matches('/')));
                return Ok((Arc::clone(store), path));
            }
            Backend::Target { target, connection } => (target, connection.as_ref()),
        };

        let path = ObjectPath::from(key);
        let store: Arc<dyn ObjectStore> = match target {
            StorageTarget::S3 {
                region,
                endpoint,
                allow_http,
                ..
            } => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_allow_http(*allow_http);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some((login, secret)) = connection.and_then(Connection::login_and_password) {
                    builder = builder
                        .with_access_key_id(login)
                        .with_secret_access_key(secret);
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?,
                )
            }
            StorageTarget::Gcs {
                service_account_path,
            } => {
                let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
                if let Some(path) = service_account_path {
                    builder = builder.with_service_account_path(path.to_string_lossy());
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
                )
            }
            StorageTarget::Azure { account, .. } => {
                let mut builder = MicrosoftAzureBuilder::from_env().with_container_name(bucket);
                if let Some(account) = account {
                    builder = builder.with_account(account);
                }
                if let Some((login, key)) = connection.and_then(Connection::login_and_password) {
                    builder = builder.with_account(login).with_access_key(key);
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
                )
            }
            StorageTarget::Local { root } => {
                let dir = root.join(bucket);
                std::fs::create_dir_all(&dir).map_err(|e| {
                    Error::sink(format!("Failed to create directory {}: {e}", dir.display()))
                })?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(&dir)
                        .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?,
                )
            }
        };

        Ok((store, path))
    }
}

#[async_trait]
impl ObjectUploader for ObjectStoreUploader {
    async fn load_file(
        &self,
        local_path: &Path,
        key: &str,
        bucket: &str,
        overwrite: bool,
    ) -> Result<()> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            Error::sink(format!("Failed to read {}: {e}", local_path.display()))
        })?;
        let size = data.len();

        let (store, path) = self.resolve(bucket, key)?;
        let mode = if overwrite {
            PutMode::Overwrite
        } else {
            PutMode::Create
        };
        debug!("put {path} ({size} bytes, mode={mode:?})");

        store
            .put_opts(
                &path,
                Bytes::from(data).into(),
                PutOptions {
                    mode,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                object_store::Error::AlreadyExists { .. } => Error::sink(format!(
                    "Object {bucket}/{key} already exists and overwrite is disabled"
                )),
                other => Error::sink(format!("Failed to upload {bucket}/{key}: {other}")),
            })?;

        info!("Uploaded {size} bytes to {}://{bucket}/{key}", self.scheme());
        Ok(())
    }
}
