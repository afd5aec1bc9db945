use serde::Serialize;
use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use crate::role::Role;

const SHORT_PATH_LENGTH: usize = 50;

#[derive(Debug, Clone, Serialize)]
/// One parsed source file, described by its primary type.
///
/// ## Properties:
/// * `name` (`String`): Simple name of the primary type,
/// * `package_path` (`String`): Dotted package of the file, may be empty,
/// * `file_path` (`std::path::PathBuf`): Path of the file,
/// * `role` (`role::Role`): Layer the file belongs to,
/// * `methods` (`Vec<String>`): Methods declared by the primary type,
/// * `fields` (`Vec<String>`): Fields declared by the primary type,
/// * `annotations` (`Vec<String>`): Annotations on the primary type,
/// * `routes` (`Vec<String>`): `"METHOD PATH"` routes, only filled for controllers,
/// * `impact_reason` (`Option<String>`): Why the unit is impacted, if it is,
/// * `usage_count` (`usize`): Number of direct column usages found in the file.
pub struct SourceUnit {
    /// Simple name of the primary type.
    pub name: String,
    /// Dotted package of the file, may be empty.
    pub package_path: String,
    /// Path of the file.
    pub file_path: PathBuf,
    /// Layer the file belongs to.
    pub role: Role,
    /// Methods declared by the primary type.
    pub methods: Vec<String>,
    /// Fields declared by the primary type.
    pub fields: Vec<String>,
    /// Annotations on the primary type.
    pub annotations: Vec<String>,
    /// `"METHOD PATH"` routes, only filled for controllers.
    pub routes: Vec<String>,
    /// Why the unit is impacted, if it is.
    pub impact_reason: Option<String>,
    /// Number of direct column usages found in the file.
    pub usage_count: usize,
}

impl SourceUnit {
    /// Package qualified name of the primary type.
    ///
    /// ## Returns:
    /// * (`String`): eg. `com.shop.UserService`, or `UserService` without package.
    pub fn full_name(&self) -> String {
        if self.package_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package_path, self.name)
        }
    }

    /// Path of the file, shortened to its end when too long to be displayed.
    pub fn short_file_path(&self) -> String {
        let path = self.file_path.to_string_lossy();
        let length = path.chars().count();
        if length > SHORT_PATH_LENGTH {
            let tail: String = path.chars().skip(length - (SHORT_PATH_LENGTH - 3)).collect();
            format!("...{tail}")
        } else {
            path.to_string()
        }
    }
}

impl Display for SourceUnit {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{} \x1b[1m{}\x1b[0m ({})",
            self.role,
            self.full_name(),
            self.file_path.to_str().unwrap_or("<invalid>"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(package_path: &str, file_path: &str) -> SourceUnit {
        SourceUnit {
            name: "UserService".to_string(),
            package_path: package_path.to_string(),
            file_path: PathBuf::from(file_path),
            role: Role::Service,
            methods: Vec::new(),
            fields: Vec::new(),
            annotations: Vec::new(),
            routes: Vec::new(),
            impact_reason: None,
            usage_count: 0,
        }
    }

    #[test]
    fn full_name_is_package_qualified() {
        assert_eq!(
            unit("com.shop.service", "UserService.java").full_name(),
            "com.shop.service.UserService"
        );
        assert_eq!(unit("", "UserService.java").full_name(), "UserService");
    }

    #[test]
    fn long_paths_are_shortened() {
        let short = "src/UserService.java";
        assert_eq!(unit("", short).short_file_path(), short);

        let long = format!("{}/UserService.java", "a".repeat(60));
        let shortened = unit("", &long).short_file_path();
        assert_eq!(shortened.chars().count(), SHORT_PATH_LENGTH);
        assert!(shortened.starts_with("..."));
        assert!(shortened.ends_with("/UserService.java"));
    }
}
