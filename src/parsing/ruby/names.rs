//! Naming rules shared by extraction, nesting and hover.

use tree_sitter::Node;

pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Text of a constant reference, `A::B::C` style.
///
/// A leading `::` is kept so callers can force top-level lookup. Returns
/// `None` when the scope is not itself a constant path (`foo::Bar`).
pub fn constant_path(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "constant" => Some(node_text(node, source).to_string()),
        "scope_resolution" => {
            let name = node_text(node.child_by_field_name("name")?, source);
            match node.child_by_field_name("scope") {
                Some(scope) => Some(format!("{}::{name}", constant_path(scope, source)?)),
                None => Some(format!("::{name}")),
            }
        }
        _ => None,
    }
}

/// Qualifies a constant path written inside `namespace`, by plain
/// concatenation. A leading `::` makes the path absolute.
pub fn qualify(namespace: Option<&str>, path: &str) -> String {
    if let Some(absolute) = path.strip_prefix("::") {
        return absolute.to_string();
    }
    match namespace {
        Some(namespace) => format!("{namespace}::{path}"),
        None => path.to_string(),
    }
}

/// Splits `A::B::C` into `(Some("A::B"), "C")`.
pub fn split_qualified(qualified: &str) -> (Option<&str>, &str) {
    match qualified.rsplit_once("::") {
        Some((owner, name)) => (Some(owner), name),
        None => (None, qualified),
    }
}

/// Name carried by a symbol or string literal argument (`:foo`, `"foo"`).
pub fn literal_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "simple_symbol" => Some(node_text(node, source).trim_start_matches(':').to_string()),
        "delimited_symbol" | "string" => {
            let mut cursor = node.walk();
            let content = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "string_content")?;
            Some(node_text(content, source).to_string())
        }
        "identifier" | "constant" | "operator" | "setter" => {
            Some(node_text(node, source).to_string())
        }
        _ => None,
    }
}

/// `user_account` → `UserAccount`, `@post` → `Post`.
pub fn camelize(name: &str) -> String {
    name.trim_start_matches('@')
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(Some("A"), "Foo::Bar"), "A::Foo::Bar");
        assert_eq!(qualify(Some("A"), "::Foo"), "Foo");
        assert_eq!(qualify(None, "Foo"), "Foo");
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("A::B::C"), (Some("A::B"), "C"));
        assert_eq!(split_qualified("C"), (None, "C"));
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("user"), "User");
        assert_eq!(camelize("user_account"), "UserAccount");
        assert_eq!(camelize("@post"), "Post");
        assert_eq!(camelize("_tmp"), "Tmp");
    }
}
