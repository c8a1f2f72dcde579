//! Database flavor detection and compute-function environment mapping
//!
//! Server projects cannot reach an external database from the managed
//! runtime, so every detected flavor is downgraded to an embedded in-memory
//! database. Dialects with an embedded compatibility mode keep it; everything
//! else falls back to the plain embedded URL with a persistence warning in
//! the environment so the deployed application can surface it.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::services::SourceTree;
use crate::domain::value_objects::DatabaseFlavor;

use super::classifier::BUILD_DESCRIPTOR;

/// Properties file consulted first for the datasource URL.
const PROPERTIES_FILE: &str = "src/main/resources/application.properties";
/// Environment key the deployed application reads its warning from.
const WARNING_KEY: &str = "SKYLIFT_DB_WARNING";

pub struct DatabaseConfigurator;

impl Default for DatabaseConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseConfigurator {
    pub fn new() -> Self {
        Self
    }

    /// Detect the project's database flavor.
    ///
    /// Order: `spring.datasource.url` in the properties file by URL-scheme
    /// substring, then build-descriptor dependency substrings, then
    /// [`DatabaseFlavor::None`]. Never a hard failure; unreadable files
    /// count as absent.
    pub fn detect(&self, tree: &dyn SourceTree) -> DatabaseFlavor {
        if let Some(flavor) = self.detect_from_properties(tree) {
            info!(flavor = %flavor, "Detected database from datasource URL");
            return flavor;
        }

        if let Some(flavor) = self.detect_from_descriptor(tree) {
            info!(flavor = %flavor, "Detected database from build descriptor dependencies");
            return flavor;
        }

        info!("No database detected");
        DatabaseFlavor::None
    }

    fn detect_from_properties(&self, tree: &dyn SourceTree) -> Option<DatabaseFlavor> {
        let content = tree.read(Path::new(PROPERTIES_FILE)).ok()?;
        let url = content.lines().find_map(|line| {
            let line = line.trim();
            line.strip_prefix("spring.datasource.url")
                .and_then(|rest| rest.trim_start().strip_prefix('='))
                .map(|v| v.trim().to_lowercase())
        })?;

        if url.contains("h2:") {
            Some(DatabaseFlavor::H2)
        } else if url.contains("mysql:") {
            Some(DatabaseFlavor::MySql)
        } else if url.contains("postgresql:") {
            Some(DatabaseFlavor::PostgreSql)
        } else if url.contains("mongodb:") {
            Some(DatabaseFlavor::MongoDb)
        } else if url.contains("mariadb:") {
            Some(DatabaseFlavor::MariaDb)
        } else if url.contains("oracle:") {
            Some(DatabaseFlavor::Oracle)
        } else if url.contains("sqlserver:") {
            Some(DatabaseFlavor::SqlServer)
        } else {
            None
        }
    }

    fn detect_from_descriptor(&self, tree: &dyn SourceTree) -> Option<DatabaseFlavor> {
        let descriptor = tree.read(Path::new(BUILD_DESCRIPTOR)).ok()?.to_lowercase();

        if descriptor.contains("<artifactid>h2</artifactid>") {
            Some(DatabaseFlavor::H2)
        } else if descriptor.contains("<artifactid>mysql-connector")
            || descriptor.contains("<artifactid>mysql</artifactid>")
        {
            Some(DatabaseFlavor::MySql)
        } else if descriptor.contains("<artifactid>postgresql</artifactid>") {
            Some(DatabaseFlavor::PostgreSql)
        } else if descriptor.contains("<artifactid>mongodb")
            || descriptor.contains("spring-boot-starter-data-mongodb")
        {
            Some(DatabaseFlavor::MongoDb)
        } else if descriptor.contains("<artifactid>mariadb") {
            Some(DatabaseFlavor::MariaDb)
        } else if descriptor.contains("<artifactid>ojdbc") || descriptor.contains("oracle") {
            Some(DatabaseFlavor::Oracle)
        } else if descriptor.contains("mssql-jdbc") || descriptor.contains("sqlserver") {
            Some(DatabaseFlavor::SqlServer)
        } else {
            None
        }
    }
}

/// Compute-function environment for a detected flavor.
///
/// Total over [`DatabaseFlavor`]: every variant yields a map with an
/// embedded-database `SPRING_DATASOURCE_URL`. Flavors that are not already
/// embedded carry a non-empty [`WARNING_KEY`] entry.
pub fn lambda_environment(flavor: DatabaseFlavor) -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert(
        "SPRING_DATASOURCE_DRIVER_CLASS_NAME".to_string(),
        "org.h2.Driver".to_string(),
    );
    env.insert("SPRING_JPA_HIBERNATE_DDL_AUTO".to_string(), "create".to_string());

    let url = match flavor {
        DatabaseFlavor::MySql => "jdbc:h2:mem:testdb;MODE=MySQL;DATABASE_TO_LOWER=TRUE",
        DatabaseFlavor::PostgreSql => "jdbc:h2:mem:testdb;MODE=PostgreSQL;DATABASE_TO_LOWER=TRUE",
        DatabaseFlavor::MariaDb => "jdbc:h2:mem:testdb;MODE=MySQL",
        _ => "jdbc:h2:mem:testdb",
    };
    env.insert("SPRING_DATASOURCE_URL".to_string(), url.to_string());

    match flavor {
        DatabaseFlavor::H2 | DatabaseFlavor::None => {
            env.insert("SPRING_H2_CONSOLE_ENABLED".to_string(), "false".to_string());
        }
        DatabaseFlavor::MySql | DatabaseFlavor::PostgreSql | DatabaseFlavor::MariaDb => {
            warn!(flavor = %flavor, "Downgrading database to embedded in-memory store");
            env.insert(
                "SPRING_JPA_DATABASE_PLATFORM".to_string(),
                "org.hibernate.dialect.H2Dialect".to_string(),
            );
            if !matches!(flavor, DatabaseFlavor::MariaDb) {
                env.insert("SPRING_H2_CONSOLE_ENABLED".to_string(), "false".to_string());
            }
            env.insert(
                WARNING_KEY.to_string(),
                format!(
                    "Database converted from {flavor} to H2. Data won't persist between invocations."
                ),
            );
        }
        DatabaseFlavor::MongoDb => {
            warn!("MongoDB cannot be downgraded to an embedded relational store");
            env.insert(
                WARNING_KEY.to_string(),
                "MongoDB is not supported in the managed runtime. Using H2 as fallback.".to_string(),
            );
        }
        DatabaseFlavor::Oracle | DatabaseFlavor::SqlServer => {
            warn!(flavor = %flavor, "Downgrading database to embedded in-memory store");
            env.insert(
                "SPRING_JPA_DATABASE_PLATFORM".to_string(),
                "org.hibernate.dialect.H2Dialect".to_string(),
            );
            env.insert(
                WARNING_KEY.to_string(),
                format!("Database converted from {flavor} to H2."),
            );
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fs::MemTree;

    const FLAVORS: [DatabaseFlavor; 8] = [
        DatabaseFlavor::H2,
        DatabaseFlavor::MySql,
        DatabaseFlavor::PostgreSql,
        DatabaseFlavor::MariaDb,
        DatabaseFlavor::MongoDb,
        DatabaseFlavor::Oracle,
        DatabaseFlavor::SqlServer,
        DatabaseFlavor::None,
    ];

    #[test]
    fn mapping_is_total_over_all_flavors() {
        for flavor in FLAVORS {
            let env = lambda_environment(flavor);
            let url = env.get("SPRING_DATASOURCE_URL").unwrap();
            assert!(url.starts_with("jdbc:h2:mem:"), "flavor {flavor}: {url}");
        }
    }

    #[test]
    fn downgraded_flavors_carry_a_warning() {
        for flavor in FLAVORS {
            let env = lambda_environment(flavor);
            let expects_warning =
                !matches!(flavor, DatabaseFlavor::H2 | DatabaseFlavor::None);
            assert_eq!(
                env.get("SKYLIFT_DB_WARNING").is_some_and(|w| !w.is_empty()),
                expects_warning,
                "flavor {flavor}"
            );
        }
    }

    #[test]
    fn mysql_maps_to_compatibility_mode() {
        let env = lambda_environment(DatabaseFlavor::MySql);
        assert!(env.get("SPRING_DATASOURCE_URL").unwrap().contains("MODE=MySQL"));
        assert_eq!(
            env.get("SPRING_H2_CONSOLE_ENABLED").map(String::as_str),
            Some("false")
        );
    }

    #[test]
    fn postgres_maps_to_compatibility_mode() {
        let env = lambda_environment(DatabaseFlavor::PostgreSql);
        assert!(env.get("SPRING_DATASOURCE_URL").unwrap().contains("MODE=PostgreSQL"));
        assert_eq!(
            env.get("SPRING_H2_CONSOLE_ENABLED").map(String::as_str),
            Some("false")
        );
    }

    #[test]
    fn datasource_url_wins_over_descriptor() {
        let tree = MemTree::new()
            .with_file(
                "src/main/resources/application.properties",
                "spring.datasource.url=jdbc:mysql://localhost:3306/app\n",
            )
            .with_file(
                "pom.xml",
                "<dependencies><artifactId>postgresql</artifactId></dependencies>",
            );

        assert_eq!(DatabaseConfigurator::new().detect(&tree), DatabaseFlavor::MySql);
    }

    #[test]
    fn falls_back_to_descriptor_dependencies() {
        let tree = MemTree::new().with_file(
            "pom.xml",
            "<dependencies><artifactId>postgresql</artifactId></dependencies>",
        );

        assert_eq!(
            DatabaseConfigurator::new().detect(&tree),
            DatabaseFlavor::PostgreSql
        );
    }

    #[test]
    fn nothing_detected_yields_none() {
        let tree = MemTree::new().with_file("pom.xml", "<project></project>");
        assert_eq!(DatabaseConfigurator::new().detect(&tree), DatabaseFlavor::None);
    }
}
