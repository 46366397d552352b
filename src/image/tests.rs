#[cfg(test)]
mod tests {
    use super::super::*;
    use std::io::Read;

    fn fake_binary(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("smsb");
        std::fs::write(&path, b"#!ELF not really").unwrap();
        path
    }

    #[test]
    fn test_parse_platform() {
        let (os, arch, variant) = parse_platform("linux/amd64").unwrap();
        assert_eq!(os, "linux");
        assert_eq!(arch, "amd64");
        assert!(variant.is_none());
    }

    #[test]
    fn test_parse_platform_with_variant() {
        let (os, arch, variant) = parse_platform("linux/arm/v7").unwrap();
        assert_eq!(os, "linux");
        assert_eq!(arch, "arm");
        assert_eq!(variant.as_deref(), Some("v7"));
    }

    #[test]
    fn test_parse_platform_invalid() {
        assert!(parse_platform("invalid-platform").is_err());
        assert!(parse_platform("linux/arm/v7/extra").is_err());
    }

    #[test]
    fn test_assemble_produces_single_layer_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = ImageAssembler::new(fake_binary(&dir), "linux/amd64".to_string());

        let image = assembler.assemble().unwrap();
        assert_eq!(image.manifest.schema_version, 2);
        assert_eq!(image.manifest.layers.len(), 1);
        assert_eq!(
            image.manifest.layers[0].media_type,
            "application/vnd.oci.image.layer.v1.tar+gzip"
        );
        assert_eq!(image.manifest.layers[0].size, image.layer_data.len() as i64);
        assert_eq!(image.manifest.config.size, image.config_data.len() as i64);
    }

    #[test]
    fn test_layer_contains_only_the_binary() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = ImageAssembler::new(fake_binary(&dir), "linux/amd64".to_string());

        let image = assembler.assemble().unwrap();

        let mut decoder = flate2::read::GzDecoder::new(&image.layer_data[..]);
        let mut tar_data = Vec::new();
        decoder.read_to_end(&mut tar_data).unwrap();

        let mut archive = tar::Archive::new(&tar_data[..]);
        let entries: Vec<_> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap())
            .map(|e| {
                (
                    e.path().unwrap().to_string_lossy().to_string(),
                    e.header().mode().unwrap(),
                )
            })
            .collect();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "app/smsb");
        assert_eq!(entries[0].1, 0o755);
    }

    #[test]
    fn test_config_runs_binary_as_nonroot_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = ImageAssembler::new(fake_binary(&dir), "linux/arm/v7".to_string());

        let image = assembler.assemble().unwrap();
        let config: ImageConfig = serde_json::from_slice(&image.config_data).unwrap();

        assert_eq!(config.os, "linux");
        assert_eq!(config.architecture, "arm");
        assert_eq!(config.variant.as_deref(), Some("v7"));
        assert_eq!(
            config.config.entrypoint,
            Some(vec!["/app/smsb".to_string()])
        );
        assert_eq!(config.config.user, "65532:65532");
        assert_eq!(config.rootfs.diff_ids.len(), 1);
    }
}
