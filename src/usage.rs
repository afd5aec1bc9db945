use serde::Serialize;
use std::{
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::{
    language::{get_language_for_file, java, parsable_language::ParsableLanguage},
    naming::{contains_column, contains_column_in_method_name, is_column_match},
};

const QUERY_ANNOTATIONS: [&str; 3] = ["Query", "NamedQuery", "Modifying"];
const QUERY_ARGUMENTS: [&str; 2] = ["value", "nativeQuery"];
/// Lines holding one of these were already reported by the query scan.
const QUERY_MARKERS: [&str; 2] = ["@Query", "@NamedQuery"];
const COLUMN_ANNOTATION: &str = "Column";
const UNKNOWN_UNIT: &str = "Unknown";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Where a column reference was found.
pub enum UsageKind {
    Field,
    Query,
    Parameter,
    Method,
    MethodName,
    String,
    ColumnAnnotation,
}

impl Display for UsageKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UsageKind::Field => "FIELD",
            UsageKind::Query => "QUERY",
            UsageKind::Parameter => "PARAMETER",
            UsageKind::Method => "METHOD",
            UsageKind::MethodName => "METHOD_NAME",
            UsageKind::String => "STRING",
            UsageKind::ColumnAnnotation => "COLUMN_ANNOTATION",
        };
        formatter.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Reference to the column in a source file.
///
/// ## Properties:
/// * `unit_name` (`String`): Primary type of the file,
/// * `member_name` (`String`): Method or field holding the reference, or `query`, `annotation`,
///   `string-literal`,
/// * `kind` (`UsageKind`): How the reference was found,
/// * `context_text` (`String`): Human readable description of the reference,
/// * `line_number` (`usize`): 1-based line of the reference, 0 if unknown,
/// * `file_path` (`std::path::PathBuf`): File holding the reference.
pub struct UsageRecord {
    /// Primary type of the file.
    pub unit_name: String,
    /// Method or field holding the reference.
    pub member_name: String,
    /// How the reference was found.
    #[serde(rename = "usage_kind")]
    pub kind: UsageKind,
    /// Human readable description of the reference.
    pub context_text: String,
    /// 1-based line of the reference, 0 if unknown.
    pub line_number: usize,
    /// File holding the reference.
    pub file_path: PathBuf,
}

impl UsageRecord {
    /// One line summary, eg. `UserRepository:12 - METHOD_NAME in findByUserEmail`.
    pub fn description(&self) -> String {
        format!(
            "{}:{} - {} in {}",
            self.unit_name, self.line_number, self.kind, self.member_name
        )
    }
}

struct Detector<'a> {
    source: &'a str,
    column: &'a str,
    unit_name: String,
    file_path: &'a Path,
    usages: Vec<UsageRecord>,
}

impl<'a> Detector<'a> {
    fn record(
        &mut self,
        member_name: &str,
        kind: UsageKind,
        context_text: String,
        line_number: usize,
    ) {
        self.usages.push(UsageRecord {
            unit_name: self.unit_name.clone(),
            member_name: member_name.to_string(),
            kind,
            context_text,
            line_number,
            file_path: self.file_path.to_path_buf(),
        });
    }

    fn scan_fields(&mut self, root: Node) {
        for field in java::find_all(root, &["field_declaration", "constant_declaration"]) {
            let line = java::start_line(field);
            for annotation in java::annotations_of(field) {
                if java::annotation_name(annotation, self.source) != COLUMN_ANNOTATION {
                    continue;
                }
                let name = java::annotation_string_argument(annotation, self.source, &["name"]);
                if let Some(name) = name {
                    if is_column_match(&name, self.column) {
                        self.record(
                            "annotation",
                            UsageKind::ColumnAnnotation,
                            format!("@Column(name=\"{name}\")"),
                            line,
                        );
                    }
                }
            }
            for name in java::declarator_names(field, self.source) {
                if is_column_match(&name, self.column) {
                    let context = format!("Field declaration: {name}");
                    self.record(&name, UsageKind::Field, context, line);
                }
            }
        }
    }

    fn scan_queries(&mut self, root: Node) {
        for annotation in java::find_all(root, &["annotation"]) {
            let name = java::annotation_name(annotation, self.source);
            if !QUERY_ANNOTATIONS.contains(&name.as_str()) {
                continue;
            }
            let query = java::annotation_string_argument(annotation, self.source, &QUERY_ARGUMENTS);
            let Some(query) = query else {
                continue;
            };
            if contains_column(&query, self.column) {
                self.record(
                    "query",
                    UsageKind::Query,
                    "SQL Query contains column".to_string(),
                    java::start_line(annotation),
                );
            }
        }
    }

    fn scan_methods(&mut self, root: Node) {
        for method in java::find_all(root, &["method_declaration"]) {
            let name = java::declared_name(method, self.source).unwrap_or_default();
            let line = java::start_line(method);
            if contains_column(java::node_text(method, self.source), self.column) {
                let context = "Method contains column reference".to_string();
                self.record(&name, UsageKind::Method, context, line);
            }
            for parameter in java::parameter_names(method, self.source) {
                if is_column_match(&parameter, self.column) {
                    let context = format!("Method parameter: {parameter}");
                    self.record(&name, UsageKind::Parameter, context, line);
                }
            }
            if contains_column_in_method_name(&name, self.column) {
                let context = "Method name references column".to_string();
                self.record(&name, UsageKind::MethodName, context, line);
            }
        }
    }

    fn scan_strings(&mut self) {
        let source = self.source;
        for (index, line) in source.split('\n').enumerate() {
            let line = line.trim();
            if line.contains('"')
                && contains_column(line, self.column)
                && !QUERY_MARKERS.iter().any(|marker| line.contains(marker))
            {
                self.record("string-literal", UsageKind::String, line.to_string(), index + 1);
            }
        }
    }
}

/// Finds every reference to a column in a parsed file.
///
/// ## Parameters:
/// * `tree` (`&tree_sitter::Tree`): File parsed with tree-sitter,
/// * `source` (`&str`): Content of the file,
/// * `file_path` (`&std::path::Path`): Path of the file, copied into the records,
/// * `column` (`&str`): Column to look for.
///
/// ## Returns:
/// * (`Vec<UsageRecord>`): Field usages, then query usages, then method usages, then string
///   literals, each in source order.
pub fn detect_column_usages(
    tree: &Tree,
    source: &str,
    file_path: &Path,
    column: &str,
) -> Vec<UsageRecord> {
    let root = tree.root_node();
    let unit_name = java::primary_type_declaration(root)
        .and_then(|declaration| java::declared_name(declaration, source))
        .unwrap_or_else(|| UNKNOWN_UNIT.to_string());
    let mut detector = Detector {
        source,
        column,
        unit_name,
        file_path,
        usages: Vec::new(),
    };
    detector.scan_fields(root);
    detector.scan_queries(root);
    detector.scan_methods(root);
    detector.scan_strings();
    detector.usages
}

/// Reads and parses a file, then finds every reference to the column in it.
/// A file which can not be read or parsed has no usage.
pub fn find_column_usages(file_path: &Path, column: &str) -> Vec<UsageRecord> {
    let source = match fs::read_to_string(file_path) {
        Ok(source) => source,
        Err(error) => {
            debug!("Error reading file: {:?} - {}", file_path, error);
            return Vec::new();
        }
    };
    match get_language_for_file(file_path).parse(&source) {
        Ok(tree) => detect_column_usages(&tree, &source, file_path, column),
        Err(error) => {
            debug!("Error analyzing file: {:?} - {}", file_path, error);
            Vec::new()
        }
    }
}
