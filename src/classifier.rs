use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::{
    error::AnalysisError,
    language::{get_language_for_file, java, parsable_language::ParsableLanguage},
    role::Role,
    source_unit::SourceUnit,
};

const ANNOTATION_ROLES: [(&str, Role); 8] = [
    ("Repository", Role::Repository),
    ("Entity", Role::Entity),
    ("Table", Role::Entity),
    ("Service", Role::Service),
    ("Controller", Role::Controller),
    ("RestController", Role::Controller),
    ("Component", Role::Component),
    ("Configuration", Role::Configuration),
];

const NAMESPACE_ROLES: [(&str, Role); 7] = [
    ("repository", Role::Repository),
    ("entity", Role::Entity),
    ("model", Role::Entity),
    ("service", Role::Service),
    ("controller", Role::Controller),
    ("web", Role::Controller),
    ("config", Role::Configuration),
];

const FILE_NAME_ROLES: [(&str, Role); 5] = [
    ("repository", Role::Repository),
    ("entity", Role::Entity),
    ("model", Role::Entity),
    ("service", Role::Service),
    ("controller", Role::Controller),
];

const BASE_REPOSITORIES: [&str; 2] = ["JpaRepository", "CrudRepository"];

const ROUTE_ANNOTATIONS: [(&str, &str); 5] = [
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];
const REQUEST_MAPPING: &str = "RequestMapping";

#[derive(Debug, Clone, Default)]
/// What the classifier looks at to decide the role of a type.
///
/// ## Properties:
/// * `name` (`String`): Simple name of the type,
/// * `package` (`String`): Dotted package of the file,
/// * `file_name` (`String`): Name of the file, without directories,
/// * `is_interface` (`bool`): true iff the type is an interface,
/// * `annotations` (`Vec<String>`): Annotations on the type, in source order,
/// * `supertypes` (`Vec<String>`): Interfaces extended by the type, only read for interfaces.
pub struct ClassDeclaration {
    pub name: String,
    pub package: String,
    pub file_name: String,
    pub is_interface: bool,
    pub annotations: Vec<String>,
    pub supertypes: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Annotation,
    Namespace,
    FileName,
    Supertype,
}

/// Rules in precedence order, the first one giving a role wins.
const RULES: [Rule; 4] = [
    Rule::Annotation,
    Rule::Namespace,
    Rule::FileName,
    Rule::Supertype,
];

impl Rule {
    fn apply(&self, declaration: &ClassDeclaration) -> Option<Role> {
        match self {
            Rule::Annotation => declaration.annotations.iter().find_map(|annotation| {
                ANNOTATION_ROLES
                    .iter()
                    .find(|(name, _)| *name == annotation.as_str())
                    .map(|(_, role)| *role)
            }),
            Rule::Namespace => role_from_patterns(&declaration.package, &NAMESPACE_ROLES),
            Rule::FileName => role_from_patterns(&declaration.file_name, &FILE_NAME_ROLES),
            Rule::Supertype => (declaration.is_interface
                && declaration.supertypes.iter().any(|supertype| {
                    supertype.contains("Repository")
                        || BASE_REPOSITORIES.contains(&supertype.as_str())
                }))
            .then_some(Role::Repository),
        }
    }
}

fn role_from_patterns(text: &str, patterns: &[(&str, Role)]) -> Option<Role> {
    let text = text.to_lowercase();
    patterns
        .iter()
        .find(|(pattern, _)| text.contains(*pattern))
        .map(|(_, role)| *role)
}

/// Assigns a role to a type declaration.
///
/// ## Parameters:
/// * `declaration` (`&ClassDeclaration`): Type to classify.
///
/// ## Returns:
/// * (`role::Role`): Role given by the first matching rule among annotations, package, file name
///   and extended interfaces, `Role::Unknown` if none matches.
pub fn classify(declaration: &ClassDeclaration) -> Role {
    RULES
        .iter()
        .find_map(|rule| rule.apply(declaration))
        .unwrap_or(Role::Unknown)
}

/// Routes exposed by a controller method, one per mapping annotation.
///
/// ## Parameters:
/// * `method` (`tree_sitter::Node`): `method_declaration` node,
/// * `source` (`&str`): Content of the file.
///
/// ## Returns:
/// * (`Vec<String>`): `"METHOD PATH"` descriptors, eg. `"GET /users"`.
pub fn extract_routes(method: Node, source: &str) -> Vec<String> {
    let method_name = java::declared_name(method, source).unwrap_or_default();
    let default_path = format!("/{}", method_name.to_lowercase());
    let mut routes = Vec::new();
    for annotation in java::annotations_of(method) {
        let name = java::annotation_name(annotation, source);
        let verb = if name == REQUEST_MAPPING {
            java::annotation_argument(annotation, source, &["method"])
                .map(|value| java::node_text(value, source).replace("RequestMethod.", ""))
                .unwrap_or_else(|| "ALL".to_string())
        } else if let Some((_, verb)) = ROUTE_ANNOTATIONS
            .iter()
            .find(|(mapping, _)| *mapping == name)
        {
            verb.to_string()
        } else {
            continue;
        };
        let path = java::annotation_string_argument(annotation, source, &["value", "path"])
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| default_path.clone());
        routes.push(format!("{verb} {path}"));
    }
    routes
}

/// Builds the source unit of an already parsed file.
///
/// ## Parameters:
/// * `tree` (`&tree_sitter::Tree`): File parsed with tree-sitter,
/// * `source` (`&str`): Content of the file,
/// * `path` (`&std::path::Path`): Path of the file.
///
/// ## Returns:
/// * (`Option<SourceUnit>`): None if the file declares no class nor interface.
pub fn source_unit_from_tree(tree: &Tree, source: &str, path: &Path) -> Option<SourceUnit> {
    let root = tree.root_node();
    let type_declaration = java::primary_type_declaration(root)?;
    let is_interface = type_declaration.kind() == "interface_declaration";
    let declaration = ClassDeclaration {
        name: java::declared_name(type_declaration, source)?,
        package: java::package_name(root, source),
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        is_interface,
        annotations: java::annotations_of(type_declaration)
            .into_iter()
            .map(|annotation| java::annotation_name(annotation, source))
            .collect(),
        supertypes: if is_interface {
            java::extended_interfaces(type_declaration, source)
        } else {
            Vec::new()
        },
    };
    let role = classify(&declaration);

    let methods = java::body_members(type_declaration, &["method_declaration"]);
    let routes = if role == Role::Controller {
        methods
            .iter()
            .flat_map(|method| extract_routes(*method, source))
            .collect()
    } else {
        Vec::new()
    };

    Some(SourceUnit {
        name: declaration.name,
        package_path: declaration.package,
        file_path: path.to_path_buf(),
        role,
        methods: methods
            .iter()
            .filter_map(|method| java::declared_name(*method, source))
            .collect(),
        fields: java::body_members(type_declaration, &["field_declaration", "constant_declaration"])
            .into_iter()
            .flat_map(|field| java::declarator_names(field, source))
            .collect(),
        annotations: declaration.annotations,
        routes,
        impact_reason: None,
        usage_count: 0,
    })
}

/// Reads, parses and classifies one source file.
///
/// ## Parameters:
/// * `path` (`&std::path::Path`): Path of the file.
///
/// ## Returns:
/// * (`Result<Option<SourceUnit>, AnalysisError>`): None if the file declares no type. Fails with
///   `FileRead` or `FileParse`, both meaning the file must be skipped.
pub fn parse_source_unit(path: &Path) -> Result<Option<SourceUnit>, AnalysisError> {
    let source = std::fs::read_to_string(path).map_err(|source| AnalysisError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let language = get_language_for_file(path);
    debug!("Parsing {:?} as {}", path, language.name());
    let tree = language
        .parse(&source)
        .map_err(|error| AnalysisError::FileParse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
    let unit = source_unit_from_tree(&tree, &source, path);
    if unit.is_none() {
        debug!("No class or interface declared in {:?}", path);
    }
    Ok(unit)
}
