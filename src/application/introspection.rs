//! Endpoint and entry-point introspection for server projects
//!
//! Best-effort text scanning, explicitly not a parser: the report is a
//! confidence-free guess used for display only and never gates a
//! provisioning decision. Unreadable files are skipped; a missing source
//! directory yields an empty report.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::classifier::SERVER_SOURCE_DIR;

static GET_MAPPING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@GetMapping\s*\([^)]*["']([^"']+)["']"#).unwrap());
static POST_MAPPING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@PostMapping\s*\([^)]*["']([^"']+)["']"#).unwrap());
static PUT_MAPPING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@PutMapping\s*\([^)]*["']([^"']+)["']"#).unwrap());
static DELETE_MAPPING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@DeleteMapping\s*\([^)]*["']([^"']+)["']"#).unwrap());
static REQUEST_MAPPING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@RequestMapping\s*\([^)]*["']([^"']+)["']"#).unwrap());

/// Marker identifying the application's startup class.
pub const STARTUP_MARKERS: [&str; 2] = ["@SpringBootApplication", "SpringApplication.run"];
/// Conventional suffix of the entry-point file.
pub const ENTRY_POINT_SUFFIX: &str = "Application.java";

/// Introspection output: reporting data only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntrospectionReport {
    /// Dotted module-qualified name of the startup class, when found
    pub entry_point: Option<String>,
    /// Discovered HTTP routes, deduplicated and lexicographically sorted
    pub routes: Vec<String>,
}

pub struct EndpointIntrospector;

impl Default for EndpointIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointIntrospector {
    pub fn new() -> Self {
        Self
    }

    /// Scan a server project root for its entry point and exposed routes.
    pub fn introspect(&self, root: &Path) -> IntrospectionReport {
        let source_root = root.join(SERVER_SOURCE_DIR);
        if !source_root.is_dir() {
            return IntrospectionReport::default();
        }

        let mut routes = Vec::new();
        let mut entry_point = None;

        for path in java_files(&source_root) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };

            if is_rest_controller(&content) {
                routes.extend(extract_routes(&content));
            }

            if entry_point.is_none()
                && path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(ENTRY_POINT_SUFFIX))
                && STARTUP_MARKERS.iter().any(|m| content.contains(m))
            {
                entry_point = dotted_name(&path, &source_root);
            }
        }

        routes.sort();
        routes.dedup();

        IntrospectionReport { entry_point, routes }
    }
}

fn java_files(source_root: &Path) -> Vec<PathBuf> {
    WalkDir::new(source_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
        .map(|e| e.into_path())
        .collect()
}

fn is_rest_controller(content: &str) -> bool {
    content.contains("@RestController")
        || (content.contains("@Controller") && content.contains("@ResponseBody"))
}

/// Extract routes from one controller file.
///
/// Scans line by line so a pattern never bleeds across methods; the first
/// base-path annotation seen on a line without an access modifier becomes the
/// class-level base, later path annotations are method-level and get
/// concatenated with it.
fn extract_routes(content: &str) -> Vec<String> {
    let mut routes = Vec::new();
    let mut class_base: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if class_base.is_none() {
            if let Some(caps) = REQUEST_MAPPING.captures(trimmed) {
                if looks_like_class_level(trimmed) {
                    let base = caps[1].to_string();
                    routes.push(normalize_path(Some(&base), ""));
                    class_base = Some(base);
                    continue;
                }
            }
        }

        let mut method_path = None;
        for pattern in [&GET_MAPPING, &POST_MAPPING, &PUT_MAPPING, &DELETE_MAPPING] {
            if let Some(caps) = pattern.captures(trimmed) {
                method_path = Some(caps[1].to_string());
            }
        }

        // A second or later base-path annotation is method-level.
        if method_path.is_none() && class_base.is_some() && !looks_like_class_level(trimmed) {
            if let Some(caps) = REQUEST_MAPPING.captures(trimmed) {
                method_path = Some(caps[1].to_string());
            }
        }

        if let Some(path) = method_path {
            routes.push(normalize_path(class_base.as_deref(), &path));
        }
    }

    routes
}

/// Annotation lines before the class declaration carry no access modifier.
fn looks_like_class_level(line: &str) -> bool {
    !line.contains("public") && !line.contains("private") && !line.contains("protected")
}

/// Join base and method path with leading slashes and collapsed repeats.
fn normalize_path(class_base: Option<&str>, method_path: &str) -> String {
    let prefix_slash = |s: &str| -> String {
        let s = s.trim();
        if s.is_empty() {
            String::new()
        } else if s.starts_with('/') {
            s.to_string()
        } else {
            format!("/{}", s)
        }
    };

    let combined = format!(
        "{}{}",
        prefix_slash(class_base.unwrap_or("")),
        prefix_slash(method_path)
    );
    if combined.is_empty() {
        return "/".to_string();
    }

    let mut collapsed = String::with_capacity(combined.len());
    let mut last_was_slash = false;
    for ch in combined.chars() {
        if ch == '/' {
            if !last_was_slash {
                collapsed.push(ch);
            }
            last_was_slash = true;
        } else {
            collapsed.push(ch);
            last_was_slash = false;
        }
    }
    collapsed
}

/// Dotted path of a source file relative to the source root.
fn dotted_name(path: &Path, source_root: &Path) -> Option<String> {
    let relative = path.strip_prefix(source_root).ok()?;
    let mut parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let file = parts.pop()?;
    parts.push(file.strip_suffix(".java")?.to_string());
    Some(parts.join("."))
}
