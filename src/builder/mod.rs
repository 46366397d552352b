use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, error, info};

#[cfg(test)]
mod tests;

/// Cross-compiles the release binary for one target platform.
pub struct ReleaseBuilder {
    project_path: PathBuf,
    target: String,
    cargo_args: Vec<String>,
}

pub struct BuildArtifact {
    pub binary_path: PathBuf,
    _temp_dir: TempDir, // Keep temp dir alive until the artifact is dropped
}

impl ReleaseBuilder {
    pub fn new(project_path: impl AsRef<Path>, target: &str) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            target: target.to_string(),
            cargo_args: Vec::new(),
        }
    }

    pub fn with_cargo_args(mut self, args: Vec<String>) -> Self {
        self.cargo_args = args;
        self
    }

    pub fn build(&self) -> Result<BuildArtifact> {
        info!("Building release binary at {:?}", self.project_path);

        // A unique target directory avoids conflicts between the
        // per-platform builds of one release run.
        let temp_target_dir =
            tempfile::tempdir().context("Failed to create temporary directory")?;
        let target_dir = temp_target_dir.path();

        let mut cmd = Command::new("cargo");
        cmd.arg("build")
            .arg("--release")
            .arg("--target")
            .arg(&self.target)
            .arg("--target-dir")
            .arg(target_dir)
            .current_dir(&self.project_path);

        // Fully static binaries so the runtime image needs no libc
        cmd.env("RUSTFLAGS", "-C target-feature=+crt-static");

        if let Some(linker) = find_cross_linker(&self.target) {
            cmd.env(linker_env_var(&self.target), &linker);
            debug!("Using linker: {}", linker);
        }

        for arg in &self.cargo_args {
            cmd.arg(arg);
        }

        info!("Running cargo build for target: {}", self.target);
        debug!("Running command: {:?}", cmd);

        let output = cmd.output().context("Failed to execute cargo build")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Cargo build failed for {}!", self.target);
            error!("stderr:\n{}", stderr);
            anyhow::bail!("Cargo build failed: {}", stderr);
        }

        let binary_name = self.binary_name()?;
        let binary_path = target_dir
            .join(&self.target)
            .join("release")
            .join(&binary_name);

        if !binary_path.exists() {
            anyhow::bail!("Built binary not found at {:?}", binary_path);
        }

        info!("Successfully built binary at {:?}", binary_path);

        Ok(BuildArtifact {
            binary_path,
            _temp_dir: temp_target_dir,
        })
    }

    fn binary_name(&self) -> Result<String> {
        let cargo_toml_path = self.project_path.join("Cargo.toml");
        let content =
            std::fs::read_to_string(&cargo_toml_path).context("Failed to read Cargo.toml")?;

        let manifest: toml::Value =
            toml::from_str(&content).context("Failed to parse Cargo.toml")?;

        let name = manifest
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .context("Failed to get package name from Cargo.toml")?;

        Ok(name.to_string())
    }
}

/// Map a container platform identifier to the musl target triple we
/// cross-compile for.
pub fn rust_target_triple(platform: &str) -> Result<String> {
    match platform {
        "linux/amd64" => Ok("x86_64-unknown-linux-musl".to_string()),
        "linux/arm64" => Ok("aarch64-unknown-linux-musl".to_string()),
        "linux/arm/v7" => Ok("armv7-unknown-linux-musleabihf".to_string()),
        _ => anyhow::bail!("Unsupported platform: {}", platform),
    }
}

/// Cargo linker env var for a target triple, e.g.
/// CARGO_TARGET_X86_64_UNKNOWN_LINUX_MUSL_LINKER.
fn linker_env_var(target: &str) -> String {
    format!(
        "CARGO_TARGET_{}_LINKER",
        target.replace('-', "_").to_uppercase()
    )
}

/// Probe PATH for a cross-linker matching the target. Native builds
/// need none, so absence is not an error.
fn find_cross_linker(target: &str) -> Option<String> {
    let candidates: &[&str] = if target.starts_with("x86_64") {
        &["x86_64-linux-musl-gcc", "musl-gcc"]
    } else if target.starts_with("aarch64") {
        &["aarch64-linux-musl-gcc", "aarch64-linux-gnu-gcc"]
    } else if target.starts_with("armv7") {
        &["arm-linux-musleabihf-gcc", "arm-linux-gnueabihf-gcc"]
    } else {
        &[]
    };

    candidates
        .iter()
        .find(|linker| which::which(linker).is_ok())
        .map(|linker| linker.to_string())
}
