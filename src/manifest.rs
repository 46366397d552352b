use serde::{Deserialize, Serialize};

/// OCI image index grouping the per-platform manifests of one release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageIndex {
    #[serde(rename = "schemaVersion")]
    pub schema_version: i32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub manifests: Vec<ManifestDescriptor>,
}

/// Descriptor for one platform-specific manifest in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDescriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub size: i64,
    pub digest: String,
    pub platform: Platform,
}

/// Platform a manifest was built for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

pub const INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
pub const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

impl ImageIndex {
    pub fn new(manifests: Vec<ManifestDescriptor>) -> Self {
        Self {
            schema_version: 2,
            media_type: INDEX_MEDIA_TYPE.to_string(),
            manifests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_holds_one_manifest_per_platform() {
        let descriptors = [("amd64", None), ("arm64", None), ("arm", Some("v7"))]
            .into_iter()
            .map(|(arch, variant)| ManifestDescriptor {
                media_type: MANIFEST_MEDIA_TYPE.to_string(),
                size: 1234,
                digest: "sha256:abc".to_string(),
                platform: Platform {
                    architecture: arch.to_string(),
                    os: "linux".to_string(),
                    variant: variant.map(str::to_string),
                },
            })
            .collect::<Vec<_>>();

        let index = ImageIndex::new(descriptors);
        assert_eq!(index.schema_version, 2);
        assert_eq!(index.manifests.len(), 3);
    }

    #[test]
    fn test_variant_omitted_when_absent() {
        let platform = Platform {
            architecture: "amd64".to_string(),
            os: "linux".to_string(),
            variant: None,
        };
        let json = serde_json::to_string(&platform).unwrap();
        assert!(!json.contains("variant"));

        let platform = Platform {
            architecture: "arm".to_string(),
            os: "linux".to_string(),
            variant: Some("v7".to_string()),
        };
        let json = serde_json::to_string(&platform).unwrap();
        assert!(json.contains(r#""variant":"v7""#));
    }
}
