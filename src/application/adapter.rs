//! Runtime adaptation of server projects
//!
//! Rewrites an uploaded Spring Boot tree so it can run inside AWS Lambda:
//! injects the serverless-container bridge dependencies and packaging plugin
//! overrides into `pom.xml`, synthesizes a stream-request handler class in
//! the application's own package, and injects a permissive CORS
//! configuration class. Every step checks for prior presence before writing,
//! so re-running on an already-adapted tree is a no-op.
//!
//! The transform runs against a [`SourceTree`] and returns an
//! [`AdapterReport`] describing what changed, so it can be tested against an
//! in-memory tree without real I/O.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::services::SourceTree;

use super::classifier::{BUILD_DESCRIPTOR, SERVER_SOURCE_DIR};
use super::introspection::{ENTRY_POINT_SUFFIX, STARTUP_MARKERS};

/// Simple name of the synthesized handler class. The invocation target the
/// compute provider is told to call is `<package>.StreamLambdaHandler::handleRequest`.
const HANDLER_CLASS: &str = "StreamLambdaHandler";
/// Entry method on the handler class.
const HANDLER_METHOD: &str = "handleRequest";
/// Simple name of the injected CORS configuration class.
const CORS_CLASS: &str = "SkyliftCorsConfig";

/// Presence marker for the dependency block.
const CONTAINER_DEPENDENCY_MARKER: &str = "aws-serverless-java-container-springboot3";
/// Insertion anchor for the dependency block. Missing anchor is fatal.
const DEPENDENCIES_ANCHOR: &str = "</dependencies>";
/// Presence marker for the boot-plugin skip override.
const BOOT_SKIP_MARKER: &str = "<skip>true</skip>";
/// Presence marker for the shade plugin.
const SHADE_PLUGIN_MARKER: &str = "maven-shade-plugin";
/// Insertion anchor for plugin blocks. Missing anchor is logged and skipped.
const PLUGINS_ANCHOR: &str = "</plugins>";

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("no startup class found under {}", SERVER_SOURCE_DIR)]
    EntryPointNotFound,

    #[error("no package declaration in {0}")]
    MissingPackage(PathBuf),

    #[error("build descriptor {} not found at project root", BUILD_DESCRIPTOR)]
    MissingDescriptor,

    #[error("build descriptor has no {DEPENDENCIES_ANCHOR} to anchor dependency injection on")]
    MissingAnchor,

    #[error("tree access failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What the adapter did to the tree.
#[derive(Debug, Clone)]
pub struct AdapterReport {
    /// Fully-qualified invocation target for the compute provider
    pub invocation_target: String,
    /// Root-relative paths of files synthesized in this run
    pub written: Vec<PathBuf>,
    /// Whether the build descriptor was modified in this run
    pub descriptor_updated: bool,
}

pub struct RuntimeAdapter;

impl Default for RuntimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Transform a server tree for the compute-function runtime.
    pub fn adapt(&self, tree: &dyn SourceTree) -> Result<AdapterReport, AdapterError> {
        let entry = self.find_entry_point(tree)?;
        let package = extract_package(tree, &entry)?;

        if !tree.exists(Path::new(BUILD_DESCRIPTOR)) {
            return Err(AdapterError::MissingDescriptor);
        }
        let descriptor_updated = self.update_descriptor(tree)?;

        let mut written = Vec::new();
        if let Some(path) = self.write_handler_class(tree, &package, &entry)? {
            written.push(path);
        }
        if let Some(path) = self.write_cors_config(tree, &package)? {
            written.push(path);
        }

        let invocation_target = format!("{package}.{HANDLER_CLASS}::{HANDLER_METHOD}");
        info!(handler = %invocation_target, "Prepared tree for compute-function runtime");

        Ok(AdapterReport {
            invocation_target,
            written,
            descriptor_updated,
        })
    }

    /// Locate the startup class: conventional file-name suffix plus marker.
    fn find_entry_point(&self, tree: &dyn SourceTree) -> Result<PathBuf, AdapterError> {
        let source_root = Path::new(SERVER_SOURCE_DIR);
        for path in tree.files()? {
            if !path.starts_with(source_root) {
                continue;
            }
            let is_candidate = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(ENTRY_POINT_SUFFIX));
            if !is_candidate {
                continue;
            }
            let Ok(content) = tree.read(&path) else {
                continue;
            };
            if STARTUP_MARKERS.iter().any(|m| content.contains(m)) {
                return Ok(path);
            }
        }
        Err(AdapterError::EntryPointNotFound)
    }

    /// Inject dependency and plugin blocks; each guarded by its own
    /// presence check so repeated runs never duplicate.
    fn update_descriptor(&self, tree: &dyn SourceTree) -> Result<bool, AdapterError> {
        let descriptor_path = Path::new(BUILD_DESCRIPTOR);
        let mut descriptor = tree.read(descriptor_path)?;
        let mut changed = false;

        if !descriptor.contains(CONTAINER_DEPENDENCY_MARKER) {
            let Some(idx) = descriptor.find(DEPENDENCIES_ANCHOR) else {
                return Err(AdapterError::MissingAnchor);
            };
            descriptor.insert_str(idx, LAMBDA_DEPENDENCIES_SNIPPET);
            changed = true;
            info!("Injected compute-runtime bridge dependencies into build descriptor");
        }

        if !descriptor.contains(BOOT_SKIP_MARKER) {
            match descriptor.find(PLUGINS_ANCHOR) {
                Some(idx) => {
                    descriptor.insert_str(idx, BOOT_SKIP_SNIPPET);
                    changed = true;
                    info!("Injected boot-plugin repackage skip into build descriptor");
                }
                None => {
                    warn!("No {} anchor found; skipping boot-plugin override", PLUGINS_ANCHOR)
                }
            }
        }

        if !descriptor.contains(SHADE_PLUGIN_MARKER) {
            match descriptor.find(PLUGINS_ANCHOR) {
                Some(idx) => {
                    descriptor.insert_str(idx, SHADE_PLUGIN_SNIPPET);
                    changed = true;
                    info!("Injected shade-plugin configuration into build descriptor");
                }
                None => {
                    warn!("No {} anchor found; skipping shade-plugin insertion", PLUGINS_ANCHOR)
                }
            }
        }

        if changed {
            tree.write(descriptor_path, &descriptor)?;
        }
        Ok(changed)
    }

    /// Synthesize the stream-request handler next to the startup class.
    fn write_handler_class(
        &self,
        tree: &dyn SourceTree,
        package: &str,
        entry: &Path,
    ) -> Result<Option<PathBuf>, AdapterError> {
        let main_class = entry
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let dir = package_dir(package);
        let path = dir.join(format!("{HANDLER_CLASS}.java"));
        if tree.exists(&path) {
            return Ok(None);
        }

        tree.create_dir_all(&dir)?;
        tree.write(&path, &handler_source(package, &main_class))?;
        info!(path = %path.display(), "Synthesized stream-request handler");
        Ok(Some(path))
    }

    /// Synthesize the permissive CORS configuration in `<package>.config`.
    fn write_cors_config(
        &self,
        tree: &dyn SourceTree,
        package: &str,
    ) -> Result<Option<PathBuf>, AdapterError> {
        let config_package = format!("{package}.config");
        let dir = package_dir(&config_package);
        let path = dir.join(format!("{CORS_CLASS}.java"));
        if tree.exists(&path) {
            return Ok(None);
        }

        tree.create_dir_all(&dir)?;
        tree.write(&path, &cors_source(&config_package))?;
        info!(path = %path.display(), "Synthesized cross-origin configuration");
        Ok(Some(path))
    }
}

fn package_dir(package: &str) -> PathBuf {
    Path::new(SERVER_SOURCE_DIR).join(package.replace('.', "/"))
}

fn extract_package(tree: &dyn SourceTree, entry: &Path) -> Result<String, AdapterError> {
    let content = tree.read(entry)?;
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("package ") {
            return Ok(rest.trim().trim_end_matches(';').to_string());
        }
    }
    Err(AdapterError::MissingPackage(entry.to_path_buf()))
}

const LAMBDA_DEPENDENCIES_SNIPPET: &str = r#"
        <!-- Added by skylift for Lambda + API Gateway support -->
        <dependency>
            <groupId>com.amazonaws.serverless</groupId>
            <artifactId>aws-serverless-java-container-springboot3</artifactId>
            <version>1.9.1</version>
        </dependency>
        <dependency>
            <groupId>com.amazonaws</groupId>
            <artifactId>aws-lambda-java-core</artifactId>
            <version>1.2.3</version>
        </dependency>
"#;

const BOOT_SKIP_SNIPPET: &str = r#"
            <!-- Added by skylift to skip the boot fat-jar repackage for Lambda -->
            <plugin>
                <groupId>org.springframework.boot</groupId>
                <artifactId>spring-boot-maven-plugin</artifactId>
                <configuration>
                    <skip>true</skip>
                </configuration>
            </plugin>
"#;

const SHADE_PLUGIN_SNIPPET: &str = r#"
            <!-- Added by skylift: build a single self-contained artifact for Lambda -->
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-shade-plugin</artifactId>
                <version>3.5.0</version>
                <executions>
                    <execution>
                        <phase>package</phase>
                        <goals>
                            <goal>shade</goal>
                        </goals>
                        <configuration>
                            <createDependencyReducedPom>false</createDependencyReducedPom>
                        </configuration>
                    </execution>
                </executions>
            </plugin>
"#;

fn handler_source(package: &str, main_class: &str) -> String {
    format!(
        r#"package {package};

import com.amazonaws.serverless.exceptions.ContainerInitializationException;
import com.amazonaws.serverless.proxy.model.AwsProxyRequest;
import com.amazonaws.serverless.proxy.model.AwsProxyResponse;
import com.amazonaws.serverless.proxy.spring.SpringBootLambdaContainerHandler;
import com.amazonaws.services.lambda.runtime.Context;
import com.amazonaws.services.lambda.runtime.RequestStreamHandler;

import java.io.IOException;
import java.io.InputStream;
import java.io.OutputStream;

/**
 * Generated by skylift. Boots the application inside AWS Lambda and
 * forwards API Gateway proxy events to the embedded container.
 */
public class {HANDLER_CLASS} implements RequestStreamHandler {{

    private static final SpringBootLambdaContainerHandler<AwsProxyRequest, AwsProxyResponse> handler;

    static {{
        try {{
            handler = SpringBootLambdaContainerHandler.getAwsProxyHandler({main_class}.class);
        }} catch (ContainerInitializationException e) {{
            throw new RuntimeException("Could not initialize application", e);
        }}
    }}

    @Override
    public void {HANDLER_METHOD}(InputStream input, OutputStream output, Context context) throws IOException {{
        handler.proxyStream(input, output, context);
    }}
}}
"#
    )
}

fn cors_source(config_package: &str) -> String {
    format!(
        r#"package {config_package};

import org.springframework.context.annotation.Configuration;
import org.springframework.web.servlet.config.annotation.CorsRegistry;
import org.springframework.web.servlet.config.annotation.WebMvcConfigurer;

@Configuration
public class {CORS_CLASS} implements WebMvcConfigurer {{
    @Override
    public void addCorsMappings(CorsRegistry registry) {{
        registry.addMapping("/**")
                .allowedOrigins("*")
                .allowedMethods("GET", "POST", "PUT", "DELETE", "OPTIONS")
                .allowedHeaders("*")
                .allowCredentials(false)
                .maxAge(3600);
    }}
}}
"#
    )
}
