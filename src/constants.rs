/// Platform constants for the release build
pub mod platform {
    /// Linux AMD64 platform identifier
    pub const LINUX_AMD64: &str = "linux/amd64";

    /// Linux ARM64 platform identifier
    pub const LINUX_ARM64: &str = "linux/arm64";

    /// Linux ARMv7 platform identifier
    pub const LINUX_ARM_V7: &str = "linux/arm/v7";

    /// The platforms a release builds by default
    pub const DEFAULTS: [&str; 3] = [LINUX_AMD64, LINUX_ARM64, LINUX_ARM_V7];
}

/// Container image tag constants
pub mod tag {
    /// Floating tag reassigned on every publishing release
    pub const LATEST: &str = "latest";

    /// Length of the commit-derived tag
    pub const SHORT_SHA_LEN: usize = 7;
}

/// Worker schedule constants
pub mod schedule {
    /// B3 trading hours in UTC, every half hour on weekdays
    pub const DEFAULT_CRON: &str = "0 0,30 13-21 * * Mon-Fri";
}

/// User and group constants for the runtime image
pub mod user {
    /// Nonroot user UID
    pub const NONROOT_UID: u32 = 65532;

    /// Nonroot user GID
    pub const NONROOT_GID: u32 = 65532;
}
