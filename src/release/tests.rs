#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::image::{Descriptor, Manifest};
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingRegistry {
        platform_pushes: Vec<String>,
        list_pushes: Vec<(String, usize)>,
    }

    #[async_trait]
    impl Registry for RecordingRegistry {
        async fn push_platform_image(
            &mut self,
            repository: &str,
            _image: &PlatformImage,
            _auth: &RegistryAuth,
        ) -> Result<(String, i64)> {
            self.platform_pushes.push(repository.to_string());
            let n = self.platform_pushes.len();
            Ok((format!("sha256:{:064x}", n), 400 + n as i64))
        }

        async fn push_manifest_list(
            &mut self,
            image_ref: &str,
            manifest_descriptors: Vec<ManifestDescriptor>,
            _auth: &RegistryAuth,
        ) -> Result<String> {
            self.list_pushes
                .push((image_ref.to_string(), manifest_descriptors.len()));
            Ok(format!("{}@sha256:{:064x}", image_ref, self.list_pushes.len()))
        }
    }

    fn fake_image() -> PlatformImage {
        PlatformImage {
            config_data: vec![1],
            layer_data: vec![2],
            manifest: Manifest {
                schema_version: 2,
                media_type: MANIFEST_MEDIA_TYPE.to_string(),
                config: Descriptor {
                    media_type: "application/vnd.oci.image.config.v1+json".to_string(),
                    size: 1,
                    digest: "sha256:aa".to_string(),
                },
                layers: vec![],
            },
        }
    }

    fn images_for(platforms: &[&str]) -> Vec<(String, PlatformImage)> {
        platforms
            .iter()
            .map(|p| (p.to_string(), fake_image()))
            .collect()
    }

    #[test]
    fn test_release_tags_are_latest_and_short_sha() {
        let ctx = ReleaseContext::new("main", "abc1234def5678");
        assert_eq!(release_tags(&ctx), ["latest", "abc1234"]);
    }

    #[test]
    fn test_one_descriptor_per_platform() {
        let platforms = ["linux/amd64", "linux/arm64", "linux/arm/v7"];
        let descriptors: Vec<_> = platforms
            .iter()
            .map(|p| platform_descriptor(p, "sha256:aa".to_string(), 1234).unwrap())
            .collect();

        assert_eq!(descriptors.len(), platforms.len());
        assert_eq!(descriptors[0].platform.architecture, "amd64");
        assert_eq!(descriptors[1].platform.architecture, "arm64");
        assert_eq!(descriptors[2].platform.architecture, "arm");
        assert_eq!(descriptors[2].platform.variant.as_deref(), Some("v7"));
        assert!(descriptors.iter().all(|d| d.platform.os == "linux"));
    }

    #[test]
    fn test_validate_repository_accepts_tagless() {
        assert!(validate_repository("ghcr.io/owner/smsb").is_ok());
    }

    #[test]
    fn test_validate_repository_rejects_tag() {
        let err = validate_repository("ghcr.io/owner/smsb:dev").unwrap_err();
        assert!(err.to_string().contains("must not include a tag"));
    }

    #[tokio::test]
    async fn test_publish_pushes_one_image_per_platform() {
        let mut registry = RecordingRegistry::default();
        let ctx = ReleaseContext::new("main", "abc1234def");
        let images = images_for(&["linux/amd64", "linux/arm64", "linux/arm/v7"]);

        publish_images(
            &mut registry,
            "ghcr.io/owner/smsb",
            &ctx,
            &images,
            &RegistryAuth::Anonymous,
        )
        .await
        .unwrap();

        assert_eq!(registry.platform_pushes.len(), 3);
        // Every manifest list carries one descriptor per platform
        assert!(registry.list_pushes.iter().all(|(_, count)| *count == 3));
    }

    #[tokio::test]
    async fn test_publish_pushes_both_tags_together() {
        let mut registry = RecordingRegistry::default();
        let ctx = ReleaseContext::new("main", "abc1234def");
        let images = images_for(&["linux/amd64"]);

        let published = publish_images(
            &mut registry,
            "ghcr.io/owner/smsb",
            &ctx,
            &images,
            &RegistryAuth::Anonymous,
        )
        .await
        .unwrap();

        let refs: Vec<&str> = registry
            .list_pushes
            .iter()
            .map(|(r, _)| r.as_str())
            .collect();
        assert_eq!(
            refs,
            vec!["ghcr.io/owner/smsb:latest", "ghcr.io/owner/smsb:abc1234"]
        );
        assert_eq!(published.len(), 2);
    }
}
