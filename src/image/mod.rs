use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha256::digest;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tar::Builder;
use tracing::{debug, info};

use crate::constants::user;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub architecture: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub config: RuntimeConfig,
    pub rootfs: RootFs,
    pub history: Vec<History>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "Env")]
    pub env: Vec<String>,
    #[serde(rename = "Entrypoint")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(rename = "WorkingDir")]
    pub working_dir: String,
    #[serde(rename = "User")]
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootFs {
    #[serde(rename = "type")]
    pub fs_type: String,
    pub diff_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub created: String,
    pub created_by: String,
    pub comment: String,
    pub empty_layer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: i32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub size: i64,
    pub digest: String,
}

/// Assembled single-platform image, ready to push.
pub struct PlatformImage {
    pub config_data: Vec<u8>,
    pub layer_data: Vec<u8>,
    pub manifest: Manifest,
}

/// Assembles a minimal runtime image: one layer holding the static
/// binary, run as the entrypoint by a nonroot user.
pub struct ImageAssembler {
    binary_path: PathBuf,
    platform: String,
}

impl ImageAssembler {
    pub fn new(binary_path: PathBuf, platform: String) -> Self {
        Self {
            binary_path,
            platform,
        }
    }

    pub fn assemble(&self) -> Result<PlatformImage> {
        info!("Assembling container image for {}", self.platform);

        let (os, arch, variant) = parse_platform(&self.platform)?;

        let (layer_data, diff_id) = self.create_layer()?;
        let layer_digest = format!("sha256:{}", digest(&layer_data));
        let layer_size = layer_data.len() as i64;

        let config = self.create_config(&os, &arch, variant, &diff_id)?;
        let config_data = serde_json::to_vec(&config)?;
        let config_digest = format!("sha256:{}", digest(&config_data));
        let config_size = config_data.len() as i64;

        let manifest = Manifest {
            schema_version: 2,
            media_type: "application/vnd.oci.image.manifest.v1+json".to_string(),
            config: Descriptor {
                media_type: "application/vnd.oci.image.config.v1+json".to_string(),
                size: config_size,
                digest: config_digest,
            },
            layers: vec![Descriptor {
                media_type: "application/vnd.oci.image.layer.v1.tar+gzip".to_string(),
                size: layer_size,
                digest: layer_digest,
            }],
        };

        Ok(PlatformImage {
            config_data,
            layer_data,
            manifest,
        })
    }

    /// Tar up the binary at app/<name>, gzip it, and return the
    /// compressed layer plus the diff_id of the uncompressed tar.
    fn create_layer(&self) -> Result<(Vec<u8>, String)> {
        debug!("Creating layer from binary: {:?}", self.binary_path);

        let mut tar_data = Vec::new();
        {
            let mut tar = Builder::new(&mut tar_data);

            let mut file = File::open(&self.binary_path)?;
            let binary_name = self.binary_name()?;

            let mut header = tar::Header::new_gnu();
            header.set_path(format!("app/{}", binary_name))?;
            header.set_size(std::fs::metadata(&self.binary_path)?.len());
            header.set_mode(0o755);
            header.set_cksum();

            tar.append(&header, &mut file)?;
            tar.finish()?;
        }

        let diff_id = format!("sha256:{}", digest(&tar_data));

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_data)?;
        let compressed = encoder.finish()?;

        Ok((compressed, diff_id))
    }

    fn create_config(
        &self,
        os: &str,
        arch: &str,
        variant: Option<String>,
        diff_id: &str,
    ) -> Result<ImageConfig> {
        let binary_name = self.binary_name()?;

        Ok(ImageConfig {
            architecture: arch.to_string(),
            os: os.to_string(),
            variant,
            config: RuntimeConfig {
                env: vec![
                    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".to_string(),
                ],
                entrypoint: Some(vec![format!("/app/{}", binary_name)]),
                working_dir: "/".to_string(),
                user: format!("{}:{}", user::NONROOT_UID, user::NONROOT_GID),
            },
            rootfs: RootFs {
                fs_type: "layers".to_string(),
                diff_ids: vec![diff_id.to_string()],
            },
            history: vec![History {
                created: chrono::Utc::now().to_rfc3339(),
                created_by: "smsb release".to_string(),
                comment: "smsb runtime image".to_string(),
                empty_layer: false,
            }],
        })
    }

    fn binary_name(&self) -> Result<&str> {
        self.binary_path
            .file_name()
            .context("Invalid binary path")?
            .to_str()
            .context("Invalid UTF-8 in binary name")
    }
}

/// Split a platform identifier into (os, architecture, variant).
/// `linux/arm/v7` carries a variant; the two 64-bit platforms do not.
pub fn parse_platform(platform: &str) -> Result<(String, String, Option<String>)> {
    let parts: Vec<&str> = platform.split('/').collect();
    match parts.as_slice() {
        [os, arch] => Ok((os.to_string(), arch.to_string(), None)),
        [os, arch, variant] => Ok((
            os.to_string(),
            arch.to_string(),
            Some(variant.to_string()),
        )),
        _ => anyhow::bail!("Invalid platform format: {}", platform),
    }
}
