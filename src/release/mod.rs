//! Release pipeline: cross-build the binary for every configured
//! platform, assemble per-platform images, and publish a multi-arch
//! manifest list under the floating and commit-derived tags when the
//! run is on the publish branch.

use anyhow::{Context, Result};
use oci_distribution::secrets::RegistryAuth;
use std::path::PathBuf;
use tracing::info;

use crate::auth::resolve_auth;
use crate::builder::{rust_target_triple, ReleaseBuilder};
use crate::constants::tag;
use crate::image::{parse_platform, ImageAssembler, PlatformImage};
use crate::manifest::{ManifestDescriptor, Platform, MANIFEST_MEDIA_TYPE};
use crate::registry::{parse_image_reference, Registry, RegistryClient};

pub mod context;

#[cfg(test)]
mod tests;

pub use context::{short_sha, ReleaseContext};

/// Configuration for one release run
pub struct ReleaseOptions {
    pub project_path: PathBuf,
    pub repository: String,
    pub platforms: Vec<String>,
    pub publish_branch: String,
    pub no_push: bool,
    pub cargo_args: Vec<String>,
}

/// What a release run produced
pub struct ReleaseOutcome {
    pub built_platforms: Vec<String>,
    /// Digest-addressed references of the published manifest lists,
    /// one per tag; empty when the publish gate was closed.
    pub published: Vec<String>,
}

pub struct ReleaseService;

impl ReleaseService {
    pub async fn run(options: ReleaseOptions) -> Result<ReleaseOutcome> {
        validate_repository(&options.repository)?;

        let ctx = ReleaseContext::resolve(&options.project_path)?;
        let publish = !options.no_push && ctx.should_publish(&options.publish_branch);

        if options.no_push {
            info!("Skipping push (--no-push specified)");
        } else if !publish {
            info!(
                "Branch {:?} is not the publish branch {:?}; building without publishing",
                ctx.branch, options.publish_branch
            );
        }

        // Every platform builds regardless of the gate; only the push
        // is conditional.
        let mut images = Vec::with_capacity(options.platforms.len());
        for platform in &options.platforms {
            info!("Building for platform: {}", platform);

            let target = rust_target_triple(platform)?;
            let artifact = ReleaseBuilder::new(&options.project_path, &target)
                .with_cargo_args(options.cargo_args.clone())
                .build()?;

            let image =
                ImageAssembler::new(artifact.binary_path.clone(), platform.clone()).assemble()?;
            images.push((platform.clone(), image));
        }

        if !publish {
            info!(
                "Successfully built image for {} platform(s)",
                options.platforms.len()
            );
            return Ok(ReleaseOutcome {
                built_platforms: options.platforms,
                published: Vec::new(),
            });
        }

        let (registry_host, _, _) = parse_image_reference(&options.repository)?;
        let auth = resolve_auth(&registry_host)?;
        let mut registry = RegistryClient::new();

        let published =
            publish_images(&mut registry, &options.repository, &ctx, &images, &auth).await?;

        Ok(ReleaseOutcome {
            built_platforms: options.platforms,
            published,
        })
    }
}

/// The two tags every publishing run pushes together: the floating tag
/// and the commit-derived one.
pub fn release_tags(ctx: &ReleaseContext) -> [String; 2] {
    [tag::LATEST.to_string(), ctx.short_sha()]
}

/// The release derives its own tags, so the repository must not carry
/// one.
fn validate_repository(repository: &str) -> Result<()> {
    let reference: oci_distribution::Reference = repository
        .parse()
        .with_context(|| format!("Invalid repository {:?}", repository))?;

    if reference.tag().is_some() || reference.digest().is_some() {
        anyhow::bail!(
            "Repository {:?} must not include a tag or digest; release tags are derived from the commit",
            repository
        );
    }
    Ok(())
}

/// Index entry for one pushed platform image.
fn platform_descriptor(platform: &str, digest: String, size: i64) -> Result<ManifestDescriptor> {
    let (os, arch, variant) = parse_platform(platform)?;
    Ok(ManifestDescriptor {
        media_type: MANIFEST_MEDIA_TYPE.to_string(),
        size,
        digest,
        platform: Platform {
            architecture: arch,
            os,
            variant,
        },
    })
}

/// Push every platform image, then the manifest list under both
/// release tags. One descriptor per image; any failed push fails the
/// run.
async fn publish_images(
    registry: &mut dyn Registry,
    repository: &str,
    ctx: &ReleaseContext,
    images: &[(String, PlatformImage)],
    auth: &RegistryAuth,
) -> Result<Vec<String>> {
    let mut descriptors = Vec::with_capacity(images.len());
    for (platform, image) in images {
        let (digest, size) = registry
            .push_platform_image(repository, image, auth)
            .await
            .with_context(|| format!("Failed to push image for {}", platform))?;
        descriptors.push(platform_descriptor(platform, digest, size)?);
    }

    let mut published = Vec::new();
    for t in release_tags(ctx) {
        let image_ref = format!("{}:{}", repository, t);
        let digest_ref = registry
            .push_manifest_list(&image_ref, descriptors.clone(), auth)
            .await
            .with_context(|| format!("Failed to publish {}", image_ref))?;
        info!("Published {}", image_ref);
        published.push(digest_ref);
    }

    Ok(published)
}
