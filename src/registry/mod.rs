use anyhow::{Context, Result};
use async_trait::async_trait;
use oci_distribution::client::ClientConfig;
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Client, Reference, RegistryOperation};
use sha256::digest;
use tracing::{debug, info};

use crate::image::PlatformImage;
use crate::manifest::{ImageIndex, ManifestDescriptor, INDEX_MEDIA_TYPE, MANIFEST_MEDIA_TYPE};


/// Push operations the release pipeline performs against a registry.
/// The release service works through this seam so tests can record
/// pushes without a live registry.
#[async_trait]
pub trait Registry: Send {
    async fn push_platform_image(
        &mut self,
        repository: &str,
        image: &PlatformImage,
        auth: &RegistryAuth,
    ) -> Result<(String, i64)>;

    async fn push_manifest_list(
        &mut self,
        image_ref: &str,
        manifest_descriptors: Vec<ManifestDescriptor>,
        auth: &RegistryAuth,
    ) -> Result<String>;
}

pub struct RegistryClient {
    client: Client,
}

impl RegistryClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(ClientConfig::default()),
        }
    }

    /// Push one platform image (config blob, layer blob, manifest) to
    /// the repository. The manifest is pushed by digest; only the
    /// final manifest list carries tags. Returns the manifest digest
    /// and its size for the index entry.
    pub async fn push_platform_image(
        &mut self,
        repository: &str,
        image: &PlatformImage,
        auth: &RegistryAuth,
    ) -> Result<(String, i64)> {
        let reference: Reference = format!("{}:latest", repository)
            .parse()
            .context("Failed to parse repository reference")?;

        info!("Pushing platform image to {}", repository);

        self.client
            .auth(&reference, auth, RegistryOperation::Push)
            .await
            .context("Failed to authenticate with registry")?;

        let config_digest = format!("sha256:{}", digest(&image.config_data));
        debug!("Pushing config blob: {}", config_digest);
        self.client
            .push_blob(&reference, &image.config_data, &config_digest)
            .await
            .context("Failed to push config blob")?;

        let layer_digest = format!("sha256:{}", digest(&image.layer_data));
        debug!("Pushing layer blob: {}", layer_digest);
        self.client
            .push_blob(&reference, &image.layer_data, &layer_digest)
            .await
            .context("Failed to push layer blob")?;

        // Serialize the manifest once and address it by the digest of
        // those exact bytes.
        let manifest_bytes = serde_json::to_vec(&image.manifest)?;
        let manifest_digest = format!("sha256:{}", digest(&manifest_bytes));
        let manifest_size = manifest_bytes.len() as i64;

        let digest_ref: Reference = format!("{}@{}", repository, manifest_digest)
            .parse()
            .context("Failed to parse digest reference")?;

        debug!("Pushing manifest: {}", manifest_digest);
        self.client
            .push_manifest_raw(&digest_ref, manifest_bytes, MANIFEST_MEDIA_TYPE.parse()?)
            .await
            .context("Failed to push manifest")?;

        info!(
            "Successfully pushed platform image {}@{}",
            repository, manifest_digest
        );

        Ok((manifest_digest, manifest_size))
    }

    /// Push the multi-arch manifest list under the given tagged
    /// reference, returning the digest-addressed reference.
    pub async fn push_manifest_list(
        &mut self,
        image_ref: &str,
        manifest_descriptors: Vec<ManifestDescriptor>,
        auth: &RegistryAuth,
    ) -> Result<String> {
        let reference: Reference = image_ref
            .parse()
            .with_context(|| format!("Failed to parse image reference: {}", image_ref))?;

        self.client
            .auth(&reference, auth, RegistryOperation::Push)
            .await
            .context("Failed to authenticate with registry")?;

        let index = ImageIndex::new(manifest_descriptors);
        let index_bytes = serde_json::to_vec(&index)?;
        let index_digest = format!("sha256:{}", digest(&index_bytes));

        debug!(
            "Pushing manifest list with {} manifests to {}",
            index.manifests.len(),
            reference
        );
        for m in &index.manifests {
            debug!(
                "  - Platform: {}/{}{}, digest: {}",
                m.platform.os,
                m.platform.architecture,
                m.platform
                    .variant
                    .as_deref()
                    .map(|v| format!("/{}", v))
                    .unwrap_or_default(),
                m.digest
            );
        }

        self.client
            .push_manifest_raw(&reference, index_bytes, INDEX_MEDIA_TYPE.parse()?)
            .await
            .context("Failed to push manifest list")?;

        info!("Successfully pushed manifest list to {}", reference);

        Ok(format!(
            "{}/{}@{}",
            reference.registry(),
            reference.repository(),
            index_digest
        ))
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn push_platform_image(
        &mut self,
        repository: &str,
        image: &PlatformImage,
        auth: &RegistryAuth,
    ) -> Result<(String, i64)> {
        RegistryClient::push_platform_image(self, repository, image, auth).await
    }

    async fn push_manifest_list(
        &mut self,
        image_ref: &str,
        manifest_descriptors: Vec<ManifestDescriptor>,
        auth: &RegistryAuth,
    ) -> Result<String> {
        RegistryClient::push_manifest_list(self, image_ref, manifest_descriptors, auth).await
    }
}

pub fn parse_image_reference(image: &str) -> Result<(String, String, String)> {
    let reference: Reference = image.parse().context("Failed to parse image reference")?;

    let registry = reference.registry().to_string();
    let repository = reference.repository().to_string();
    let tag = reference.tag().unwrap_or("latest").to_string();

    Ok((registry, repository, tag))
}
