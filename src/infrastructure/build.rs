//! Maven build tool invocation
//!
//! Prefers the project-pinned wrapper over a global install, runs a full
//! package build with tests skipped, and locates the produced artifact.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::domain::services::{BuildError, BuildTool};

/// Wrapper script name at the project root.
const WRAPPER_SCRIPT: &str = "mvnw";
/// Properties file that must accompany the wrapper script for it to be usable.
const WRAPPER_PROPERTIES: &str = ".mvn/wrapper/maven-wrapper.properties";
/// Directory Maven writes packaged artifacts into.
const OUTPUT_DIR: &str = "target";
/// Prefix the shade plugin gives the pre-shaded jar it leaves behind.
const PRE_SHADED_PREFIX: &str = "original";

pub struct MavenBuildTool;

impl Default for MavenBuildTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MavenBuildTool {
    pub fn new() -> Self {
        Self
    }

    /// The wrapper is only trusted when both the script and its properties
    /// file are present; otherwise fall back to a global `mvn`.
    fn command_for(&self, project_dir: &Path) -> String {
        let script = project_dir.join(WRAPPER_SCRIPT);
        if script.is_file() && project_dir.join(WRAPPER_PROPERTIES).is_file() {
            script.display().to_string()
        } else {
            "mvn".to_string()
        }
    }

    /// First packaged jar in the output directory that is not the shade
    /// plugin's pre-shaded leftover.
    fn locate_artifact(&self, project_dir: &Path) -> Result<PathBuf, BuildError> {
        let output_dir = project_dir.join(OUTPUT_DIR);
        let mut jars: Vec<PathBuf> = std::fs::read_dir(&output_dir)
            .map_err(|_| BuildError::ArtifactNotFound(output_dir.clone()))?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jar"))
            .filter(|p| {
                !p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(PRE_SHADED_PREFIX))
            })
            .collect();
        jars.sort();

        jars.into_iter()
            .next()
            .ok_or(BuildError::ArtifactNotFound(output_dir))
    }
}

#[async_trait]
impl BuildTool for MavenBuildTool {
    async fn build(&self, project_dir: &Path) -> Result<PathBuf, BuildError> {
        let program = self.command_for(project_dir);
        info!(dir = %project_dir.display(), tool = %program, "Starting package build");

        // Inherit stdio so the build log stays observable.
        let status = Command::new(&program)
            .args(["clean", "package", "-DskipTests"])
            .current_dir(project_dir)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if !status.success() {
            return Err(BuildError::Failed(status.code().unwrap_or(-1)));
        }

        let artifact = self.locate_artifact(project_dir)?;
        info!(artifact = %artifact.display(), "Build produced artifact");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn wrapper_requires_both_script_and_properties() {
        let temp_dir = TempDir::new().unwrap();
        let tool = MavenBuildTool::new();

        assert_eq!(tool.command_for(temp_dir.path()), "mvn");

        touch(temp_dir.path(), "mvnw");
        assert_eq!(tool.command_for(temp_dir.path()), "mvn");

        touch(temp_dir.path(), ".mvn/wrapper/maven-wrapper.properties");
        assert_eq!(
            tool.command_for(temp_dir.path()),
            temp_dir.path().join("mvnw").display().to_string()
        );
    }

    #[test]
    fn artifact_lookup_skips_pre_shaded_jar() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "target/original-app-1.0.jar");
        touch(temp_dir.path(), "target/app-1.0.jar");
        touch(temp_dir.path(), "target/notes.txt");

        let artifact = MavenBuildTool::new().locate_artifact(temp_dir.path()).unwrap();
        assert_eq!(artifact, temp_dir.path().join("target/app-1.0.jar"));
    }

    #[test]
    fn missing_artifact_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "target/original-app-1.0.jar");

        let err = MavenBuildTool::new()
            .locate_artifact(temp_dir.path())
            .unwrap_err();
        assert!(matches!(err, BuildError::ArtifactNotFound(_)));
    }
}
