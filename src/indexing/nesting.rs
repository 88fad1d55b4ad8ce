//! Lexical context at a position
//!
//! Replays the scope rules the extractor uses along the path from the root
//! to the node under the cursor, so references resolve against the same
//! owners their declarations were filed under.

use crate::declaration::OBJECT;
use crate::parsing::ruby::names::node_text;
use crate::parsing::{ParsedDocument, ParserContext, ScopeType};
use crate::types::{Position, Range};
use std::collections::HashSet;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodScope {
    pub name: String,
    /// Namespace the enclosing method is defined on
    pub owner: String,
    pub singleton: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingContext {
    /// Enclosing class/module names, outermost first
    pub namespaces: Vec<String>,
    /// Namespace `self` is an instance of at the position
    pub self_type: String,
    pub method: Option<MethodScope>,
    pub class_variable_owner: String,
    /// Local variable names visible at the position
    pub locals: HashSet<String>,
}

impl Default for NestingContext {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            self_type: OBJECT.to_string(),
            method: None,
            class_variable_owner: OBJECT.to_string(),
            locals: HashSet::new(),
        }
    }
}

impl NestingContext {
    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains(name)
    }
}

pub struct NestingResolver;

impl NestingResolver {
    pub fn resolve(document: &ParsedDocument, position: Position) -> NestingContext {
        let source = document.source.as_str();
        let mut context = ParserContext::new();
        let mut path: Vec<Node> = Vec::new();

        let mut node = document.root();
        loop {
            let mut cursor = node.walk();
            let next = node
                .named_children(&mut cursor)
                .find(|child| Range::from_node(child).contains_position(position));
            let Some(child) = next else {
                break;
            };
            if !in_namespace_header(child, position) {
                context.enter_node(child, source);
            }
            path.push(child);
            node = child;
        }

        let method = context.current_method().map(|scope| MethodScope {
            name: scope.method_name.clone().unwrap_or_default(),
            owner: scope.name.clone(),
            singleton: matches!(scope.scope_type, ScopeType::Method { singleton: true }),
        });

        NestingContext {
            namespaces: context.nesting(),
            self_type: context.self_type(),
            method,
            class_variable_owner: context.class_variable_owner(),
            locals: collect_locals(document.root(), &path, position, source),
        }
    }
}

/// The name and superclass of a `class`/`module` are evaluated in the
/// enclosing scope, not in the namespace being opened.
fn in_namespace_header(node: Node, position: Position) -> bool {
    if !matches!(node.kind(), "class" | "module") {
        return false;
    }
    ["name", "superclass"]
        .into_iter()
        .filter_map(|field| node.child_by_field_name(field))
        .any(|header| Range::from_node(&header).contains_position(position))
}

fn opens_local_scope(kind: &str) -> bool {
    matches!(
        kind,
        "method" | "singleton_method" | "class" | "module" | "singleton_class"
    )
}

/// Parameters of the innermost local scope and of blocks on the way to the
/// position, plus identifiers assigned in that scope before the position.
fn collect_locals(root: Node, path: &[Node], position: Position, source: &str) -> HashSet<String> {
    let mut locals = HashSet::new();

    let scope_index = path.iter().rposition(|node| opens_local_scope(node.kind()));
    let scope = scope_index.map(|index| path[index]).unwrap_or(root);
    let below = scope_index.map(|index| &path[index + 1..]).unwrap_or(path);

    if let Some(parameters) = scope.child_by_field_name("parameters") {
        parameter_names(parameters, source, &mut locals);
    }
    for node in below {
        if !matches!(node.kind(), "block" | "do_block" | "lambda") {
            continue;
        }
        if let Some(parameters) = node.child_by_field_name("parameters") {
            parameter_names(parameters, source, &mut locals);
        }
    }

    assigned_names(scope, position, source, &mut locals);
    locals
}

fn parameter_names(parameters: Node, source: &str, locals: &mut HashSet<String>) {
    let mut cursor = parameters.walk();
    for parameter in parameters.named_children(&mut cursor) {
        match parameter.kind() {
            "identifier" => {
                locals.insert(node_text(parameter, source).to_string());
            }
            "destructured_parameter" => parameter_names(parameter, source, locals),
            _ => {
                if let Some(name) = parameter.child_by_field_name("name") {
                    locals.insert(node_text(name, source).to_string());
                }
            }
        }
    }
}

fn assigned_names(node: Node, position: Position, source: &str, locals: &mut HashSet<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if Position::from(child.start_position()) > position {
            break;
        }
        if opens_local_scope(child.kind()) {
            continue;
        }
        if matches!(child.kind(), "assignment" | "operator_assignment") {
            if let Some(left) = child.child_by_field_name("left") {
                target_names(left, source, locals);
            }
        }
        assigned_names(child, position, source, locals);
    }
}

fn target_names(target: Node, source: &str, locals: &mut HashSet<String>) {
    match target.kind() {
        "identifier" => {
            locals.insert(node_text(target, source).to_string());
        }
        "left_assignment_list" | "destructured_left_assignment" | "rest_assignment" => {
            let mut cursor = target.walk();
            for inner in target.named_children(&mut cursor) {
                target_names(inner, source, locals);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::RubyParser;

    fn resolve(source: &str, line: u32, column: u16) -> NestingContext {
        let mut parser = RubyParser::new().unwrap();
        let doc = parser.parse("file:///test.rb", source).unwrap();
        NestingResolver::resolve(&doc, Position::new(line, column))
    }

    #[test]
    fn test_top_level() {
        let context = resolve("puts 1\n", 0, 1);
        assert!(context.namespaces.is_empty());
        assert_eq!(context.self_type, "Object");
        assert!(context.method.is_none());
    }

    #[test]
    fn test_nested_namespaces_and_method() {
        let source = "module Foo\n  class Bar\n    def baz\n      qux\n    end\n  end\nend\n";
        let context = resolve(source, 3, 7);

        assert_eq!(context.namespaces, vec!["Foo", "Foo::Bar"]);
        assert_eq!(context.self_type, "Foo::Bar");
        assert_eq!(
            context.method,
            Some(MethodScope {
                name: "baz".to_string(),
                owner: "Foo::Bar".to_string(),
                singleton: false,
            })
        );
        assert_eq!(context.class_variable_owner, "Foo::Bar");
    }

    #[test]
    fn test_singleton_method_self_type() {
        let source = "class Foo\n  def self.bar\n    @a\n  end\nend\n";
        let context = resolve(source, 2, 5);

        assert_eq!(context.self_type, "Foo::<Class:Foo>");
        assert_eq!(context.namespaces, vec!["Foo"]);
        assert!(context.method.as_ref().is_some_and(|method| method.singleton));
    }

    #[test]
    fn test_class_header_uses_enclosing_nesting() {
        let source = "module App\n  class Foo < Bar\n    baz\n  end\nend\n";

        let superclass = resolve(source, 1, 15);
        assert_eq!(superclass.namespaces, vec!["App"]);
        assert_eq!(superclass.self_type, "App::<Class:App>");

        let name = resolve(source, 1, 9);
        assert_eq!(name.namespaces, vec!["App"]);

        let body = resolve(source, 2, 5);
        assert_eq!(body.namespaces, vec!["App", "App::Foo"]);
    }

    #[test]
    fn test_class_body_self_is_singleton() {
        let source = "class Foo\n  attr_reader :a\nend\n";
        let context = resolve(source, 1, 4);
        assert_eq!(context.self_type, "Foo::<Class:Foo>");
    }

    #[test]
    fn test_locals_from_parameters_blocks_and_assignments() {
        let source =
            "def run(foo, bar: 1)\n  total = 0\n  items.each do |item|\n    item\n  end\nend\n";
        let context = resolve(source, 3, 5);

        assert!(context.is_local("foo"));
        assert!(context.is_local("bar"));
        assert!(context.is_local("total"));
        assert!(context.is_local("item"));
        assert!(!context.is_local("items"));
    }

    #[test]
    fn test_assignment_after_position_is_not_local() {
        let source = "def run\n  value\n  value = 1\nend\n";
        let context = resolve(source, 1, 3);
        assert!(!context.is_local("value"));
    }
}
