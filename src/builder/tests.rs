#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_target_triples_for_release_platforms() {
        assert_eq!(
            rust_target_triple("linux/amd64").unwrap(),
            "x86_64-unknown-linux-musl"
        );
        assert_eq!(
            rust_target_triple("linux/arm64").unwrap(),
            "aarch64-unknown-linux-musl"
        );
        assert_eq!(
            rust_target_triple("linux/arm/v7").unwrap(),
            "armv7-unknown-linux-musleabihf"
        );
    }

    #[test]
    fn test_unsupported_platform() {
        assert!(rust_target_triple("windows/amd64").is_err());
        assert!(rust_target_triple("not-a-platform").is_err());
    }

    #[test]
    fn test_platforms_outside_the_release_set_rejected() {
        assert!(rust_target_triple("linux/386").is_err());
        assert!(rust_target_triple("linux/arm/v6").is_err());
    }

    #[test]
    fn test_linker_env_var() {
        assert_eq!(
            linker_env_var("x86_64-unknown-linux-musl"),
            "CARGO_TARGET_X86_64_UNKNOWN_LINUX_MUSL_LINKER"
        );
        assert_eq!(
            linker_env_var("armv7-unknown-linux-musleabihf"),
            "CARGO_TARGET_ARMV7_UNKNOWN_LINUX_MUSLEABIHF_LINKER"
        );
    }
}
