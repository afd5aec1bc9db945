use super::parsable_language::ParsableLanguage;
use anyhow::{anyhow, bail, Result};
use tree_sitter::{Node, Parser, Tree};
use tree_sitter_java::LANGUAGE as java_language;

/// Node kinds declaring a class-like type the analysis understands.
pub const TYPE_DECLARATIONS: [&str; 2] = ["class_declaration", "interface_declaration"];
const ANNOTATIONS: [&str; 2] = ["annotation", "marker_annotation"];
const COMMENTS: [&str; 2] = ["line_comment", "block_comment"];

#[derive(Debug)]
pub struct JavaLanguage {}

impl ParsableLanguage for JavaLanguage {
    fn name(&self) -> &'static str {
        "java"
    }

    fn parse(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser.set_language(&java_language.into())?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow!("Parse failed"))?;
        if tree.root_node().has_error() {
            bail!("syntax error in Java source");
        }
        Ok(tree)
    }
}

pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based line where the node starts, leading annotations included.
pub fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// Last segment of a possibly qualified name, eg. `Query` for `org.springframework.Query`.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Collects, in pre-order, every node of the subtree whose kind is one of `kinds`.
///
/// ## Parameters:
/// * `node` (`tree_sitter::Node`): Root of the subtree, included in the search,
/// * `kinds` (`&[&str]`): Tree-sitter kinds to collect.
///
/// ## Returns:
/// * (`Vec<tree_sitter::Node>`): Matching nodes in source order.
pub fn find_all<'a>(node: Node<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
    let mut found = Vec::new();
    walk_tree(node, &mut |candidate| {
        if kinds.contains(&candidate.kind()) {
            found.push(candidate);
        }
    });
    found
}

fn walk_tree<'a, F>(node: Node<'a>, visit: &mut F)
where
    F: FnMut(Node<'a>),
{
    visit(node);
    for child in node.children(&mut node.walk()) {
        walk_tree(child, visit);
    }
}

/// Dotted name of the `package` declaration, empty when the file has none.
pub fn package_name(root: Node, source: &str) -> String {
    root.named_children(&mut root.walk())
        .find(|child| child.kind() == "package_declaration")
        .and_then(|package| {
            package
                .named_children(&mut package.walk())
                .find(|child| matches!(child.kind(), "identifier" | "scoped_identifier"))
        })
        .map(|name| node_text(name, source).to_string())
        .unwrap_or_default()
}

/// First class or interface declaration of the file, in pre-order.
pub fn primary_type_declaration(root: Node) -> Option<Node> {
    find_all(root, &TYPE_DECLARATIONS).into_iter().next()
}

/// Name of a declaration (type, method, parameter or variable declarator).
pub fn declared_name(node: Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name| node_text(name, source).to_string())
}

/// Annotations written on a declaration, in source order.
pub fn annotations_of(declaration: Node) -> Vec<Node> {
    let mut annotations = Vec::new();
    for child in declaration.children(&mut declaration.walk()) {
        if child.kind() == "modifiers" {
            annotations.extend(
                child
                    .children(&mut child.walk())
                    .filter(|modifier| ANNOTATIONS.contains(&modifier.kind())),
            );
        }
    }
    annotations
}

/// Simple name of an annotation node, eg. `GetMapping` for `@GetMapping("/users")`.
pub fn annotation_name(annotation: Node, source: &str) -> String {
    annotation
        .child_by_field_name("name")
        .map(|name| simple_name(node_text(name, source)).to_string())
        .unwrap_or_default()
}

/// Value node of the first annotation argument named by one of `keys`.
/// A single unnamed argument is the implicit `value` argument.
///
/// ## Parameters:
/// * `annotation` (`tree_sitter::Node`): `annotation` node, marker annotations have no argument,
/// * `source` (`&str`): Content of the file,
/// * `keys` (`&[&str]`): Accepted argument names.
///
/// ## Returns:
/// * (`Option<tree_sitter::Node>`): Value of the argument, None if absent.
pub fn annotation_argument<'a>(
    annotation: Node<'a>,
    source: &str,
    keys: &[&str],
) -> Option<Node<'a>> {
    let arguments = annotation.child_by_field_name("arguments")?;
    let values: Vec<Node> = arguments
        .named_children(&mut arguments.walk())
        .filter(|argument| !COMMENTS.contains(&argument.kind()))
        .collect();
    for value in &values {
        if value.kind() != "element_value_pair" {
            return keys.contains(&"value").then_some(*value);
        }
        let Some(key) = value.child_by_field_name("key") else {
            continue;
        };
        if keys.contains(&node_text(key, source)) {
            return value.child_by_field_name("value");
        }
    }
    None
}

/// Like `annotation_argument`, but only accepts a string literal argument.
/// Arguments given with another kind of value are skipped.
pub fn annotation_string_argument(annotation: Node, source: &str, keys: &[&str]) -> Option<String> {
    let arguments = annotation.child_by_field_name("arguments")?;
    for argument in arguments.named_children(&mut arguments.walk()) {
        let value = match argument.kind() {
            "element_value_pair" => {
                let (Some(key), Some(value)) = (
                    argument.child_by_field_name("key"),
                    argument.child_by_field_name("value"),
                ) else {
                    continue;
                };
                if !keys.contains(&node_text(key, source)) {
                    continue;
                }
                value
            }
            kind if COMMENTS.contains(&kind) => continue,
            _ if keys.contains(&"value") => argument,
            _ => continue,
        };
        if let Some(text) = string_literal_value(value, source) {
            return Some(text);
        }
    }
    None
}

/// Content of a string literal or text block, without its delimiters.
pub fn string_literal_value(node: Node, source: &str) -> Option<String> {
    if node.kind() != "string_literal" {
        return None;
    }
    let text = node_text(node, source);
    let delimiter = if text.starts_with("\"\"\"") { "\"\"\"" } else { "\"" };
    text.strip_prefix(delimiter)
        .and_then(|rest| rest.strip_suffix(delimiter))
        .map(|content| content.to_string())
}

/// Names of the variables declared by a field or constant declaration.
pub fn declarator_names(declaration: Node, source: &str) -> Vec<String> {
    declaration
        .named_children(&mut declaration.walk())
        .filter(|child| child.kind() == "variable_declarator")
        .filter_map(|declarator| declared_name(declarator, source))
        .collect()
}

/// Names of the parameters of a method declaration, varargs included.
pub fn parameter_names(method: Node, source: &str) -> Vec<String> {
    let Some(parameters) = method.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for parameter in parameters.named_children(&mut parameters.walk()) {
        match parameter.kind() {
            "formal_parameter" => names.extend(declared_name(parameter, source)),
            "spread_parameter" => names.extend(
                parameter
                    .named_children(&mut parameter.walk())
                    .filter(|child| child.kind() == "variable_declarator")
                    .filter_map(|declarator| declared_name(declarator, source)),
            ),
            _ => (),
        }
    }
    names
}

/// Simple names of the interfaces an interface declaration extends.
pub fn extended_interfaces(declaration: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for child in declaration.children(&mut declaration.walk()) {
        if child.kind() != "extends_interfaces" {
            continue;
        }
        for listed in find_all(child, &["type_list"]) {
            for supertype in listed.named_children(&mut listed.walk()) {
                let name_node = match supertype.kind() {
                    "generic_type" => supertype.named_child(0),
                    _ => Some(supertype),
                };
                if let Some(name_node) = name_node {
                    names.push(simple_name(node_text(name_node, source)).to_string());
                }
            }
        }
    }
    names
}

/// Members declared directly in the body of a type declaration, filtered by kind.
pub fn body_members<'a>(declaration: Node<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
    let Some(body) = declaration.child_by_field_name("body") else {
        return Vec::new();
    };
    body.named_children(&mut body.walk())
        .filter(|member| kinds.contains(&member.kind()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const REPOSITORY: &str = indoc! {r#"
        package com.shop.repository;

        import org.springframework.data.jpa.repository.JpaRepository;

        @Repository
        public interface UserRepository extends JpaRepository<User, Long>, Auditable {
            @Query(value = "SELECT u FROM User u WHERE u.user_email = ?1")
            User findByUserEmail(String userEmail, String... tags);
        }
    "#};

    fn parse(source: &str) -> Tree {
        JavaLanguage {}.parse(source).expect("valid java")
    }

    #[test]
    fn reads_package_and_primary_type() {
        let tree = parse(REPOSITORY);
        let root = tree.root_node();
        assert_eq!(package_name(root, REPOSITORY), "com.shop.repository");
        let declaration = primary_type_declaration(root).expect("interface");
        assert_eq!(declaration.kind(), "interface_declaration");
        assert_eq!(
            declared_name(declaration, REPOSITORY).as_deref(),
            Some("UserRepository")
        );
        assert_eq!(
            extended_interfaces(declaration, REPOSITORY),
            vec!["JpaRepository".to_string(), "Auditable".to_string()]
        );
    }

    #[test]
    fn reads_annotation_arguments() {
        let tree = parse(REPOSITORY);
        let queries: Vec<Node> = find_all(tree.root_node(), &["annotation"])
            .into_iter()
            .filter(|annotation| annotation_name(*annotation, REPOSITORY) == "Query")
            .collect();
        assert_eq!(queries.len(), 1);
        assert_eq!(start_line(queries[0]), 7);
        assert_eq!(
            annotation_string_argument(queries[0], REPOSITORY, &["value", "nativeQuery"])
                .as_deref(),
            Some("SELECT u FROM User u WHERE u.user_email = ?1")
        );
        assert!(annotation_string_argument(queries[0], REPOSITORY, &["name"]).is_none());
    }

    #[test]
    fn single_argument_is_the_value() {
        let source = "class A { @GetMapping(\"/users\") void list() {} }";
        let tree = parse(source);
        let mapping = find_all(tree.root_node(), &["annotation"])[0];
        assert_eq!(
            annotation_string_argument(mapping, source, &["value", "path"]).as_deref(),
            Some("/users")
        );
        assert!(annotation_argument(mapping, source, &["method"]).is_none());
    }

    #[test]
    fn reads_parameters_including_varargs() {
        let tree = parse(REPOSITORY);
        let method = find_all(tree.root_node(), &["method_declaration"])[0];
        assert_eq!(
            parameter_names(method, REPOSITORY),
            vec!["userEmail".to_string(), "tags".to_string()]
        );
    }

    #[test]
    fn rejects_malformed_source() {
        assert!(JavaLanguage {}.parse("public class {{{ oops").is_err());
    }
}
