use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    classifier::parse_source_unit,
    error::AnalysisError,
    language::get_language_for_file,
    role::Role,
    source_unit::SourceUnit,
    usage::{find_column_usages, UsageRecord},
};

const REPOSITORY_REASON: &str = "Indirect: Uses impacted repository";
const SERVICE_REASON: &str = "Indirect: Uses impacted service";

#[derive(Debug, Clone, Serialize)]
/// Outcome of the impact analysis of one column.
///
/// ## Properties:
/// * `column_name` (`String`): Analyzed column,
/// * `project_path` (`std::path::PathBuf`): Root of the analyzed project,
/// * `repositories` (`Vec<SourceUnit>`): Impacted repositories,
/// * `entities` (`Vec<SourceUnit>`): Impacted entities,
/// * `services` (`Vec<SourceUnit>`): Impacted services,
/// * `controllers` (`Vec<SourceUnit>`): Impacted controllers,
/// * `usages` (`Vec<UsageRecord>`): Every direct reference to the column,
/// * `elapsed_millis` (`u64`): Duration of the analysis,
/// * `timestamp` (`chrono::DateTime<chrono::Local>`): When the analysis started.
pub struct AnalysisResult {
    pub column_name: String,
    pub project_path: PathBuf,
    pub repositories: Vec<SourceUnit>,
    pub entities: Vec<SourceUnit>,
    pub services: Vec<SourceUnit>,
    pub controllers: Vec<SourceUnit>,
    pub usages: Vec<UsageRecord>,
    pub elapsed_millis: u64,
    pub timestamp: DateTime<Local>,
}

impl AnalysisResult {
    pub(crate) fn new(column_name: &str, project_path: &Path) -> Self {
        AnalysisResult {
            column_name: column_name.to_string(),
            project_path: project_path.to_path_buf(),
            repositories: Vec::new(),
            entities: Vec::new(),
            services: Vec::new(),
            controllers: Vec::new(),
            usages: Vec::new(),
            elapsed_millis: 0,
            timestamp: Local::now(),
        }
    }

    /// Impacted units of a role, always empty for roles which are not reported.
    pub fn units(&self, role: Role) -> &[SourceUnit] {
        match role {
            Role::Repository => &self.repositories,
            Role::Entity => &self.entities,
            Role::Service => &self.services,
            Role::Controller => &self.controllers,
            Role::Configuration | Role::Component | Role::Unknown => &[],
        }
    }

    fn units_mut(&mut self, role: Role) -> Option<&mut Vec<SourceUnit>> {
        match role {
            Role::Repository => Some(&mut self.repositories),
            Role::Entity => Some(&mut self.entities),
            Role::Service => Some(&mut self.services),
            Role::Controller => Some(&mut self.controllers),
            Role::Configuration | Role::Component | Role::Unknown => None,
        }
    }

    fn contains(&self, role: Role, name: &str) -> bool {
        self.units(role).iter().any(|unit| unit.name == name)
    }

    /// Adds a unit to the category of its role, even when another unit has the same simple name.
    /// Returns false when the role is not reported.
    pub(crate) fn insert(&mut self, unit: SourceUnit) -> bool {
        match self.units_mut(unit.role) {
            Some(units) => {
                units.push(unit);
                true
            }
            None => false,
        }
    }

    fn names(&self, role: Role) -> Vec<String> {
        self.units(role).iter().map(|unit| unit.name.clone()).collect()
    }

    pub fn total_impacted_classes(&self) -> usize {
        Role::impact_categories()
            .map(|role| self.units(*role).len())
            .sum()
    }

    pub fn total_usages(&self) -> usize {
        self.usages.len()
    }
}

/// Checks the arguments of an analysis before any work starts.
///
/// ## Parameters:
/// * `project_path` (`&str`): Root directory of the project,
/// * `column_name` (`&str`): Column to look for.
///
/// ## Returns:
/// * (`Result<(), AnalysisError>`): `InvalidInput` if the path is blank, missing or not a
///   directory, or if the column is blank.
pub fn validate_input(project_path: &str, column_name: &str) -> Result<(), AnalysisError> {
    if project_path.trim().is_empty() {
        return Err(AnalysisError::invalid_input("Project path cannot be empty"));
    }
    let path = Path::new(project_path);
    if !path.exists() {
        return Err(AnalysisError::invalid_input(format!(
            "Project path does not exist: {project_path}"
        )));
    }
    if !path.is_dir() {
        return Err(AnalysisError::invalid_input(format!(
            "Project path is not a directory: {project_path}"
        )));
    }
    if column_name.trim().is_empty() {
        return Err(AnalysisError::invalid_input("Column name cannot be empty"));
    }
    Ok(())
}

/// Finds the classes of a project impacted by a change of the given column.
///
/// ## Parameters:
/// * `project_path` (`&str`): Root directory of the project, searched recursively,
/// * `column_name` (`&str`): Column to look for, usually in snake_case.
///
/// ## Returns:
/// * (`Result<AnalysisResult, AnalysisError>`): Impacted classes and column usages. Only fails on
///   invalid input, files which can not be analyzed are skipped.
pub fn analyze(project_path: &str, column_name: &str) -> Result<AnalysisResult, AnalysisError> {
    validate_input(project_path, column_name)?;
    info!(
        "Starting impact analysis for column: {} in project: {}",
        column_name, project_path
    );
    let start = Instant::now();
    let root = Path::new(project_path);
    let mut result = AnalysisResult::new(column_name, root);

    let mut units = discover_units(root);
    info!("Found {} classes to analyze", units.len());
    if units.is_empty() {
        warn!("No Java classes found in path: {}", project_path);
        result.elapsed_millis = elapsed_millis(start);
        return Ok(result);
    }
    log_class_counts(&units);

    apply_direct_impacts(&mut units, column_name, &mut result);
    apply_indirect_impacts(&units, &mut result);

    result.elapsed_millis = elapsed_millis(start);
    info!(
        "Impact analysis completed in {}ms. Found {} repositories, {} entities, {} services, {} controllers",
        result.elapsed_millis,
        result.repositories.len(),
        result.entities.len(),
        result.services.len(),
        result.controllers.len(),
    );
    Ok(result)
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Source files under the root, in a stable order.
fn source_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                debug!("Skipping unreadable entry: {}", error);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| get_language_for_file(entry.path()).is_supported())
        .map(|entry| entry.into_path())
        .collect()
}

/// Parses and classifies every source file, skipping the ones which fail.
fn discover_units(root: &Path) -> Vec<SourceUnit> {
    let parsed: Vec<Option<SourceUnit>> = source_files(root)
        .par_iter()
        .map(|path| match parse_source_unit(path) {
            Ok(unit) => unit,
            Err(error) => {
                debug_assert!(error.is_file_local());
                warn!("Skipping file: {}", error);
                None
            }
        })
        .collect();
    let units: Vec<SourceUnit> = parsed.into_iter().flatten().collect();
    for unit in &units {
        debug!("Classified {}", unit);
    }
    info!("Parsed {} Java files", units.len());
    units
}

fn log_class_counts(units: &[SourceUnit]) {
    let count = |role: Role| units.iter().filter(|unit| unit.role == role).count();
    for role in Role::iter() {
        debug!("{} classes: {}", role, count(*role));
    }
    info!(
        "Class breakdown - Repositories: {}, Entities: {}, Services: {}, Controllers: {}",
        count(Role::Repository),
        count(Role::Entity),
        count(Role::Service),
        count(Role::Controller),
    );
}

/// Runs the usage detector on every unit and records the ones referencing the column.
fn apply_direct_impacts(
    units: &mut [SourceUnit],
    column_name: &str,
    result: &mut AnalysisResult,
) {
    let usages: Vec<Vec<UsageRecord>> = units
        .par_iter()
        .map(|unit| find_column_usages(&unit.file_path, column_name))
        .collect();
    for (unit, usages) in units.iter_mut().zip(usages) {
        if usages.is_empty() {
            continue;
        }
        unit.impact_reason = Some(format!("Direct usage: {} occurrence(s)", usages.len()));
        unit.usage_count = usages.len();
        if !unit.role.is_impact_category() {
            debug!("Unreported class type: {} for class: {}", unit.role, unit.name);
        }
        for usage in &usages {
            debug!("Found usage: {}", usage.description());
        }
        result.insert(unit.clone());
        result.usages.extend(usages);
    }
}

/// Services using an impacted repository, then controllers using an impacted service.
/// One hop per layer, computed from the direct impacts only.
fn apply_indirect_impacts(units: &[SourceUnit], result: &mut AnalysisResult) {
    let repositories = result.names(Role::Repository);
    propagate(units, Role::Service, &repositories, "repository", REPOSITORY_REASON, result);
    let services = result.names(Role::Service);
    propagate(units, Role::Controller, &services, "service", SERVICE_REASON, result);
}

fn propagate(
    units: &[SourceUnit],
    role: Role,
    impacted_names: &[String],
    layer_suffix: &str,
    reason: &str,
    result: &mut AnalysisResult,
) {
    if impacted_names.is_empty() {
        return;
    }
    for unit in units.iter().filter(|unit| unit.role == role) {
        if result.contains(role, &unit.name) {
            continue;
        }
        if references_any(unit, impacted_names, layer_suffix) {
            let mut impacted = unit.clone();
            impacted.impact_reason = Some(reason.to_string());
            result.insert(impacted);
        }
    }
}

/// true iff the file of the unit names one of the given classes, or one of its fields looks like
/// one of them once the layer suffix is removed (eg. `userRepo` for `UserRepository`).
fn references_any(unit: &SourceUnit, names: &[String], layer_suffix: &str) -> bool {
    let content = match fs::read_to_string(&unit.file_path) {
        Ok(content) => content,
        Err(error) => {
            debug!("Could not check dependencies of {}: {}", unit.name, error);
            return false;
        }
    };
    names.iter().any(|name| {
        let stripped = name.to_lowercase().replace(layer_suffix, "");
        content.contains(name.as_str())
            || (!stripped.is_empty()
                && unit
                    .fields
                    .iter()
                    .any(|field| field.to_lowercase().contains(&stripped)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const USER_REPOSITORY: &str = indoc! {r#"
        package com.shop.repository;

        public interface UserRepository extends JpaRepository<User, Long> {
            User findByUserEmail(String email);
        }
    "#};

    const USER: &str = indoc! {r#"
        package com.shop.entity;

        @Entity
        public class User {
            @Column(name = "user_email")
            private String email;
        }
    "#};

    const ACCOUNT_SERVICE: &str = indoc! {r#"
        package com.shop.service;

        @Service
        public class AccountService {
            private UserRepository userRepository;

            public User load(Long id) {
                return userRepository.findById(id);
            }
        }
    "#};

    const ACCOUNT_CONTROLLER: &str = indoc! {r#"
        package com.shop.controller;

        @RestController
        public class AccountController {
            private final AccountService accountService;

            @GetMapping("/accounts/{id}")
            public User get(Long id) {
                return accountService.load(id);
            }
        }
    "#};

    const ADMIN_CONTROLLER: &str = indoc! {r#"
        package com.shop.controller;

        @RestController
        public class AdminController {
            private final UserRepository users;

            @DeleteMapping("/admin/users/{id}")
            public void delete(Long id) {
                users.deleteById(id);
            }
        }
    "#};

    const COLUMNS: &str = indoc! {r#"
        package com.shop.util;

        public class Columns {
            public static final String EMAIL = "user_email";
        }
    "#};

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create directories");
        fs::write(path, content).expect("write fixture");
    }

    fn shop() -> TempDir {
        let directory = tempfile::tempdir().expect("temporary directory");
        let root = directory.path();
        let base = "src/main/java/com/shop";
        write(root, &format!("{base}/repository/UserRepository.java"), USER_REPOSITORY);
        write(root, &format!("{base}/entity/User.java"), USER);
        write(root, &format!("{base}/service/AccountService.java"), ACCOUNT_SERVICE);
        write(root, &format!("{base}/controller/AccountController.java"), ACCOUNT_CONTROLLER);
        write(root, &format!("{base}/controller/AdminController.java"), ADMIN_CONTROLLER);
        write(root, &format!("{base}/util/Columns.java"), COLUMNS);
        write(root, &format!("{base}/Broken.java"), "public class Broken {");
        write(root, "README.md", "Renaming user_email is risky.");
        directory
    }

    fn names(units: &[SourceUnit]) -> Vec<&str> {
        units.iter().map(|unit| unit.name.as_str()).collect()
    }

    fn run(directory: &TempDir, column: &str) -> AnalysisResult {
        analyze(directory.path().to_str().expect("utf-8 path"), column).expect("analysis")
    }

    #[test]
    fn rejects_invalid_input() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let file = directory.path().join("User.java");
        fs::write(&file, USER).expect("write fixture");
        let root = directory.path().to_str().expect("utf-8 path");

        for (path, column) in [
            ("", "user_email"),
            ("   ", "user_email"),
            ("/definitely/not/here", "user_email"),
            (file.to_str().expect("utf-8 path"), "user_email"),
            (root, ""),
            (root, "  "),
        ] {
            assert!(
                matches!(analyze(path, column), Err(AnalysisError::InvalidInput(_))),
                "{path:?} {column:?}"
            );
        }
    }

    #[test]
    fn empty_project_gives_empty_result() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let result = run(&directory, "user_email");
        assert_eq!(result.total_impacted_classes(), 0);
        assert_eq!(result.total_usages(), 0);
        assert_eq!(result.column_name, "user_email");
    }

    #[test]
    fn direct_impacts_are_grouped_by_role() {
        let directory = shop();
        let result = run(&directory, "user_email");

        assert_eq!(names(&result.repositories), vec!["UserRepository"]);
        assert_eq!(names(&result.entities), vec!["User"]);
        let repository = &result.repositories[0];
        assert_eq!(repository.usage_count, 2);
        assert_eq!(
            repository.impact_reason.as_deref(),
            Some("Direct usage: 2 occurrence(s)")
        );
        assert_eq!(
            result
                .usages
                .iter()
                .map(|usage| usage.unit_name.as_str())
                .collect::<Vec<_>>(),
            vec!["User", "User", "UserRepository", "UserRepository", "Columns"]
        );
    }

    #[test]
    fn services_and_controllers_are_impacted_one_hop_at_a_time() {
        let directory = shop();
        let result = run(&directory, "user_email");

        assert_eq!(names(&result.services), vec!["AccountService"]);
        let service = &result.services[0];
        assert_eq!(
            service.impact_reason.as_deref(),
            Some("Indirect: Uses impacted repository")
        );
        assert_eq!(service.usage_count, 0);

        assert_eq!(names(&result.controllers), vec!["AccountController"]);
        let controller = &result.controllers[0];
        assert_eq!(
            controller.impact_reason.as_deref(),
            Some("Indirect: Uses impacted service")
        );
        assert_eq!(controller.routes, vec!["GET /accounts/{id}"]);
    }

    #[test]
    fn no_indirect_impact_without_direct_repository_impact() {
        let directory = shop();
        let result = run(&directory, "order_total");
        assert!(result.repositories.is_empty());
        assert!(result.services.is_empty());
        assert!(result.controllers.is_empty());
    }

    #[test]
    fn indirect_impact_matches_fields_without_layer_suffix() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let root = directory.path();
        write(root, "UserRepository.java", USER_REPOSITORY);
        write(
            root,
            "Billing.java",
            indoc! {r#"
                @Service
                public class Billing {
                    private Object userRepo;
                }
            "#},
        );
        let result = run(&directory, "user_email");
        assert_eq!(names(&result.services), vec!["Billing"]);
    }

    #[test]
    fn units_appear_in_a_single_category() {
        let directory = shop();
        let result = run(&directory, "user_email");
        let mut all: Vec<&str> = Role::impact_categories()
            .flat_map(|role| names(result.units(*role)))
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(total, result.total_impacted_classes());
        assert!(result.units(Role::Unknown).is_empty());
    }

    #[test]
    fn same_simple_name_in_different_packages_is_listed_twice() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let root = directory.path();
        for package in ["billing", "shipping"] {
            write(
                root,
                &format!("{package}/UserService.java"),
                &format!(
                    "package com.{package}.service;\n\n@Service\npublic class UserService {{\n    private String userEmail;\n}}\n"
                ),
            );
        }
        let result = run(&directory, "user_email");
        assert_eq!(
            result
                .services
                .iter()
                .map(SourceUnit::full_name)
                .collect::<Vec<_>>(),
            vec![
                "com.billing.service.UserService",
                "com.shipping.service.UserService"
            ]
        );
        assert_eq!(result.total_usages(), 2);
        assert_eq!(result.total_impacted_classes(), 2);
    }

    #[test]
    fn class_named_after_its_layer_only_matches_by_text() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let root = directory.path();
        write(
            root,
            "Repository.java",
            "public interface Repository extends JpaRepository<User, Long> {\n    User findByUserEmail(String email);\n}\n",
        );
        write(
            root,
            "Mailer.java",
            "@Service\npublic class Mailer {\n    private Object sender;\n}\n",
        );
        write(
            root,
            "Archive.java",
            "@Service\npublic class Archive {\n    private Repository store;\n}\n",
        );
        let result = run(&directory, "user_email");
        assert_eq!(names(&result.repositories), vec!["Repository"]);
        assert_eq!(names(&result.services), vec!["Archive"]);
    }

    #[test]
    fn directly_impacted_service_is_not_reinserted() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let root = directory.path();
        write(root, "UserRepository.java", USER_REPOSITORY);
        write(
            root,
            "UserService.java",
            indoc! {r#"
                @Service
                public class UserService {
                    private UserRepository userRepository;

                    public User byMail(String userEmail) {
                        return userRepository.findByUserEmail(userEmail);
                    }
                }
            "#},
        );
        let result = run(&directory, "user_email");
        assert_eq!(names(&result.services), vec!["UserService"]);
        assert_eq!(
            result.services[0].impact_reason.as_deref(),
            Some("Direct usage: 2 occurrence(s)")
        );
    }
}
