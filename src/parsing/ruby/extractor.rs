//! Declaration extraction for Ruby
//!
//! Walks one tree-sitter tree and produces every declaration it contains:
//! namespaces, methods, constants, variables of all kinds and aliases.
//! `ERROR` regions are skipped without aborting the walk, so a file with a
//! syntax error still contributes everything around the broken part.

use crate::declaration::{
    ConstantRef, Declaration, NamespaceData, Parameter, ParameterKind, Signature, Visibility,
    is_singleton_name, singleton_name,
};
use crate::parsing::context::ParserContext;
use crate::parsing::parser::ParsedDocument;
use crate::parsing::ruby::names::{self, node_text};
use crate::parsing::sigil;
use crate::types::DeclarationCounter;
use crate::{DeclarationKind, FileId, Range};
use std::collections::HashMap;
use tree_sitter::Node;

/// Extracts all declarations of `doc`, allocating ids from `counter`.
pub fn extract(doc: &ParsedDocument, file_id: FileId, counter: &mut DeclarationCounter) -> Vec<Declaration> {
    let mut extractor = DeclarationExtractor::new(&doc.source, &doc.uri, file_id, counter);
    extractor.comments = collect_comments(doc.root(), &doc.source);
    extractor.visit(doc.root());
    extractor.finish()
}

struct DeclarationExtractor<'a> {
    source: &'a str,
    uri: &'a str,
    file_id: FileId,
    counter: &'a mut DeclarationCounter,
    context: ParserContext,
    /// Full-line comments keyed by row
    comments: HashMap<usize, String>,
    declarations: Vec<Declaration>,
    /// `(owner, name)` pairs marked by `private_constant`
    private_constants: Vec<(Option<String>, String)>,
}

impl<'a> DeclarationExtractor<'a> {
    fn new(
        source: &'a str,
        uri: &'a str,
        file_id: FileId,
        counter: &'a mut DeclarationCounter,
    ) -> Self {
        Self {
            source,
            uri,
            file_id,
            counter,
            context: ParserContext::new(),
            comments: HashMap::new(),
            declarations: Vec::new(),
            private_constants: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<Declaration> {
        for (owner, name) in std::mem::take(&mut self.private_constants) {
            for decl in &mut self.declarations {
                if decl.kind.is_constant_like() && decl.owner == owner && *decl.name == *name {
                    decl.visibility = Visibility::Private;
                }
            }
        }
        self.declarations
    }

    fn visit(&mut self, node: Node) {
        if node.is_error() {
            return;
        }

        match node.kind() {
            "class" | "module" => self.visit_namespace(node),
            "singleton_class" => self.visit_singleton_class(node),
            "method" | "singleton_method" => self.visit_method(node),
            "assignment" | "operator_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.write_target(left, node);
                }
                self.visit_children(node);
            }
            "call" => {
                self.visit_call(node);
                self.visit_children(node);
            }
            "alias" => self.visit_alias(node),
            "identifier" => self.visit_bare_identifier(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_namespace(&mut self, node: Node) {
        let outer_nesting = self.context.nesting();
        if !self.context.enter_node(node, self.source) {
            self.visit_children(node);
            return;
        }

        let qualified = self
            .context
            .current_namespace()
            .map(str::to_string)
            .unwrap_or_default();
        let data = if node.kind() == "class" {
            let superclass = node
                .child_by_field_name("superclass")
                .and_then(|superclass| superclass.named_child(0))
                .and_then(|expr| names::constant_path(expr, self.source))
                .map(|path| ConstantRef::new(path, outer_nesting));
            NamespaceData::class(superclass)
        } else {
            NamespaceData::module()
        };

        let name_range = node
            .child_by_field_name("name")
            .map(|name| Range::from_node(&name))
            .unwrap_or_else(|| Range::from_node(&node));
        let (owner, name) = names::split_qualified(&qualified);
        let mut decl = self
            .declaration(DeclarationKind::Namespace, name, node)
            .with_name_range(name_range)
            .with_namespace(data);
        if let Some(owner) = owner {
            decl = decl.with_owner(owner);
        }
        let index = self.push(decl);
        self.context.set_scope_declaration(index);

        self.visit_children(node);
        self.context.exit_scope();
    }

    fn visit_singleton_class(&mut self, node: Node) {
        if !self.context.enter_node(node, self.source) {
            self.visit_children(node);
            return;
        }

        let qualified = self
            .context
            .current_namespace()
            .map(str::to_string)
            .unwrap_or_default();
        let (owner, name) = names::split_qualified(&qualified);
        let mut decl = self
            .declaration(DeclarationKind::Namespace, name, node)
            .with_namespace(NamespaceData::singleton());
        if let Some(owner) = owner {
            decl = decl.with_owner(owner);
        }
        let index = self.push(decl);
        self.context.set_scope_declaration(index);

        self.visit_children(node);
        self.context.exit_scope();
    }

    fn visit_method(&mut self, node: Node) {
        let visibility = self.inline_visibility(node).unwrap_or_else(|| {
            if node.kind() == "method" {
                self.context.default_visibility()
            } else {
                Visibility::Public
            }
        });

        if !self.context.enter_node(node, self.source) {
            self.visit_children(node);
            return;
        }

        let owner = self
            .context
            .current_method()
            .map(|scope| scope.name.clone())
            .unwrap_or_default();
        let name = self
            .context
            .current_method()
            .and_then(|scope| scope.method_name.clone())
            .unwrap_or_default();
        let signature = node
            .child_by_field_name("parameters")
            .map(|params| self.signature(params))
            .unwrap_or_default();
        let name_range = node
            .child_by_field_name("name")
            .map(|name| Range::from_node(&name))
            .unwrap_or_else(|| Range::from_node(&node));

        let singleton = is_singleton_name(&owner);
        let decl = self
            .declaration(DeclarationKind::Method, &name, node)
            .with_owner(owner)
            .with_name_range(name_range)
            .with_visibility(visibility)
            .with_signature(signature)
            .singleton(singleton);
        self.push(decl);

        self.visit_children(node);
        self.context.exit_scope();
    }

    /// Visibility granted by a wrapping `private def ...` call.
    fn inline_visibility(&self, node: Node) -> Option<Visibility> {
        let arguments = node.parent().filter(|p| p.kind() == "argument_list")?;
        let call = arguments.parent().filter(|p| p.kind() == "call")?;
        if call.child_by_field_name("receiver").is_some() {
            return None;
        }
        let method = node_text(call.child_by_field_name("method")?, self.source);
        match method {
            "private" | "private_class_method" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "public" | "public_class_method" => Some(Visibility::Public),
            _ => None,
        }
    }

    fn signature(&self, params: Node) -> Signature {
        let mut cursor = params.walk();
        let parameters = params
            .named_children(&mut cursor)
            .filter_map(|param| self.parameter(param))
            .collect();
        Signature::new(parameters)
    }

    fn parameter(&self, param: Node) -> Option<Parameter> {
        let name_of = |node: Node| {
            node.child_by_field_name("name")
                .map(|name| node_text(name, self.source).to_string())
                .unwrap_or_default()
        };

        let parameter = match param.kind() {
            "identifier" => Parameter::new(node_text(param, self.source), ParameterKind::Required),
            "destructured_parameter" => {
                Parameter::new(node_text(param, self.source), ParameterKind::Required)
            }
            "optional_parameter" => Parameter::new(name_of(param), ParameterKind::Optional),
            "splat_parameter" => Parameter::new(name_of(param), ParameterKind::Rest),
            "hash_splat_parameter" => Parameter::new(name_of(param), ParameterKind::KeywordRest),
            "block_parameter" => Parameter::new(name_of(param), ParameterKind::Block),
            "keyword_parameter" => {
                let kind = if param.child_by_field_name("value").is_some() {
                    ParameterKind::OptionalKeyword
                } else {
                    ParameterKind::Keyword
                };
                Parameter::new(name_of(param), kind)
            }
            "forward_parameter" => Parameter::new("...", ParameterKind::Forward),
            _ => return None,
        };
        Some(parameter)
    }

    /// Records the declaration produced by one write target of `statement`.
    fn write_target(&mut self, target: Node, statement: Node) {
        match target.kind() {
            "instance_variable" => {
                let owner = self.context.instance_variable_owner();
                self.variable(DeclarationKind::InstanceVariable, target, statement, Some(owner));
            }
            "class_variable" => {
                let owner = self.context.class_variable_owner();
                self.variable(DeclarationKind::ClassVariable, target, statement, Some(owner));
            }
            "global_variable" => {
                self.variable(DeclarationKind::GlobalVariable, target, statement, None);
            }
            "constant" | "scope_resolution" => {
                let Some(path) = names::constant_path(target, self.source) else {
                    return;
                };
                let qualified = names::qualify(self.context.current_lexical_namespace(), &path);
                let (owner, name) = names::split_qualified(&qualified);
                let mut decl = self
                    .declaration(DeclarationKind::Constant, name, statement)
                    .with_name_range(Range::from_node(&target));
                if let Some(owner) = owner {
                    decl = decl.with_owner(owner);
                }
                self.push(decl);
            }
            "left_assignment_list" | "destructured_left_assignment" | "rest_assignment" => {
                let mut cursor = target.walk();
                let targets: Vec<Node> = target.named_children(&mut cursor).collect();
                for inner in targets {
                    self.write_target(inner, statement);
                }
            }
            _ => {}
        }
    }

    fn variable(&mut self, kind: DeclarationKind, target: Node, statement: Node, owner: Option<String>) {
        let name = node_text(target, self.source);
        let range = Range::from_node(&target);
        let documentation = self.documentation(statement);
        let mut decl = Declaration::new(self.counter.next_id(), kind, name, self.file_id, range)
            .with_uri(self.uri)
            .with_documentation(documentation);
        if let Some(owner) = owner {
            decl = decl.with_owner(owner);
        }
        self.push(decl);
    }

    fn visit_call(&mut self, node: Node) {
        if node.child_by_field_name("receiver").is_some() {
            return;
        }
        let Some(method) = node.child_by_field_name("method") else {
            return;
        };
        let arguments: Vec<Node> = match node.child_by_field_name("arguments") {
            Some(args) => {
                let mut cursor = args.walk();
                args.named_children(&mut cursor).collect()
            }
            None => Vec::new(),
        };

        match node_text(method, self.source) {
            "include" | "prepend" | "extend" => {
                self.mixin(node_text(method, self.source), &arguments);
            }
            "attr_reader" | "attr_writer" | "attr_accessor" => {
                self.attributes(node, node_text(method, self.source), &arguments);
            }
            "alias_method" => {
                if let [new_name, old_name, ..] = arguments.as_slice()
                    && let (Some(new_name_text), Some(old_name_text)) = (
                        names::literal_name(*new_name, self.source),
                        names::literal_name(*old_name, self.source),
                    )
                {
                    self.alias(node, *new_name, new_name_text, old_name_text);
                }
            }
            "private" | "protected" | "public" if !arguments.is_empty() => {
                let visibility = match node_text(method, self.source) {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    _ => Visibility::Public,
                };
                let owner = self.context.method_owner();
                self.set_method_visibility(&owner, &arguments, visibility);
            }
            "private" | "protected" | "public" => {
                self.apply_default_visibility(node_text(method, self.source));
            }
            "private_class_method" => {
                let owner = singleton_name(&self.context.method_owner());
                self.set_method_visibility(&owner, &arguments, Visibility::Private);
            }
            "private_constant" => {
                let owner = self.context.current_lexical_namespace().map(str::to_string);
                for arg in &arguments {
                    if let Some(name) = names::literal_name(*arg, self.source) {
                        self.private_constants.push((owner.clone(), name));
                    }
                }
            }
            _ => {}
        }
    }

    fn mixin(&mut self, kind: &str, arguments: &[Node]) {
        let Some(index) = self.context.namespace_declaration() else {
            return;
        };
        let nesting = self.context.nesting();
        let refs: Vec<ConstantRef> = arguments
            .iter()
            .filter_map(|arg| names::constant_path(*arg, self.source))
            .map(|path| ConstantRef::new(path, nesting.clone()))
            .collect();

        let Some(data) = self
            .declarations
            .get_mut(index)
            .and_then(|decl| decl.namespace.as_mut())
        else {
            return;
        };
        match kind {
            "include" => data.includes.extend(refs),
            "prepend" => data.prepends.extend(refs),
            _ => data.extends.extend(refs),
        }
    }

    fn attributes(&mut self, call: Node, kind: &str, arguments: &[Node]) {
        let owner = self.context.method_owner();
        let visibility = self.context.default_visibility();
        for arg in arguments {
            let Some(name) = names::literal_name(*arg, self.source) else {
                continue;
            };
            if kind != "attr_writer" {
                let decl = self
                    .declaration(DeclarationKind::Method, &name, call)
                    .with_owner(owner.clone())
                    .with_name_range(Range::from_node(arg))
                    .with_visibility(visibility)
                    .with_signature(Signature::default());
                self.push(decl);
            }
            if kind != "attr_reader" {
                let decl = self
                    .declaration(DeclarationKind::Method, &format!("{name}="), call)
                    .with_owner(owner.clone())
                    .with_name_range(Range::from_node(arg))
                    .with_visibility(visibility)
                    .with_signature(Signature::new(vec![Parameter::new(
                        "value",
                        ParameterKind::Required,
                    )]));
                self.push(decl);
            }
        }
    }

    fn visit_alias(&mut self, node: Node) {
        let (Some(new_name), Some(old_name)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("alias"),
        ) else {
            return;
        };
        // `alias $new $old` aliases globals, not methods
        if new_name.kind() == "global_variable" {
            return;
        }
        let (Some(new_text), Some(old_text)) = (
            names::literal_name(new_name, self.source),
            names::literal_name(old_name, self.source),
        ) else {
            return;
        };
        self.alias(node, new_name, new_text, old_text);
    }

    fn alias(&mut self, statement: Node, name_node: Node, new_name: String, old_name: String) {
        let owner = self.context.method_owner();
        let decl = self
            .declaration(DeclarationKind::Alias, &new_name, statement)
            .with_owner(owner)
            .with_name_range(Range::from_node(&name_node))
            .with_alias_target(old_name);
        self.push(decl);
    }

    /// A bare `private` / `protected` / `public` on its own line.
    fn visit_bare_identifier(&mut self, node: Node) {
        let in_statement_position = node.parent().is_some_and(|parent| {
            matches!(
                parent.kind(),
                "body_statement" | "program" | "class" | "module" | "singleton_class"
            )
        });
        if in_statement_position {
            self.apply_default_visibility(node_text(node, self.source));
        }
    }

    fn apply_default_visibility(&mut self, keyword: &str) {
        let visibility = match keyword {
            "private" => Visibility::Private,
            "protected" => Visibility::Protected,
            "public" => Visibility::Public,
            _ => return,
        };
        if self.context.current_method().is_none() {
            self.context.set_default_visibility(visibility);
        }
    }

    fn set_method_visibility(&mut self, owner: &str, arguments: &[Node], visibility: Visibility) {
        for arg in arguments {
            let Some(name) = names::literal_name(*arg, self.source) else {
                continue;
            };
            for decl in &mut self.declarations {
                if matches!(decl.kind, DeclarationKind::Method | DeclarationKind::Alias)
                    && decl.owner.as_deref() == Some(owner)
                    && *decl.name == *name
                {
                    decl.visibility = visibility;
                }
            }
        }
    }

    /// Base declaration spanning `node`, with documentation attached.
    fn declaration(&mut self, kind: DeclarationKind, name: &str, node: Node) -> Declaration {
        let documentation = self.documentation(node);
        Declaration::new(
            self.counter.next_id(),
            kind,
            name,
            self.file_id,
            Range::from_node(&node),
        )
        .with_uri(self.uri)
        .with_documentation(documentation)
    }

    fn push(&mut self, decl: Declaration) -> usize {
        self.declarations.push(decl);
        self.declarations.len() - 1
    }

    /// Contiguous full-line comments directly above `node`.
    fn documentation(&self, node: Node) -> String {
        let mut row = node.start_position().row;
        let mut lines = Vec::new();
        while row > 0 {
            row -= 1;
            match self.comments.get(&row) {
                Some(text) if !sigil::is_magic_comment(text) => lines.push(strip_comment(text)),
                _ => break,
            }
        }
        lines.reverse();
        lines.join("\n")
    }
}

/// Collects comments that sit alone on their line.
fn collect_comments(root: Node, source: &str) -> HashMap<usize, String> {
    let mut comments = HashMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "comment" {
            let column = node.start_position().column;
            let line_start = node.start_byte().saturating_sub(column);
            let prefix = source.get(line_start..node.start_byte()).unwrap_or("");
            let text = node_text(node, source);
            if prefix.trim().is_empty() && !text.starts_with("=begin") {
                comments.insert(node.start_position().row, text.to_string());
            }
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    comments
}

fn strip_comment(text: &str) -> String {
    let body = text.strip_prefix('#').unwrap_or(text);
    body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::RubyParser;

    fn extract_source(source: &str) -> Vec<Declaration> {
        let mut parser = RubyParser::new().unwrap();
        let doc = parser.parse("file:///test.rb", source).unwrap();
        let mut counter = DeclarationCounter::new();
        extract(&doc, FileId::new(1).unwrap(), &mut counter)
    }

    fn find<'d>(decls: &'d [Declaration], qualified: &str) -> Vec<&'d Declaration> {
        decls
            .iter()
            .filter(|decl| decl.qualified_name() == qualified)
            .collect()
    }

    #[test]
    fn test_namespaces_and_superclass() {
        let decls = extract_source(
            "module Foo\n  # A bar\n  class Bar < Base\n  end\nend\n",
        );

        let bar = find(&decls, "Foo::Bar");
        assert_eq!(bar.len(), 1);
        assert_eq!(bar[0].documentation, "A bar");
        let data = bar[0].namespace.as_ref().unwrap();
        let superclass = data.superclass.as_ref().unwrap();
        assert_eq!(superclass.name, "Base");
        assert_eq!(superclass.nesting, vec!["Foo"]);
        assert_eq!(find(&decls, "Foo").len(), 1);
    }

    #[test]
    fn test_compact_names() {
        let decls = extract_source("module A\n  class Foo::Bar\n  end\nend\nclass ::Top; end\n");
        assert_eq!(find(&decls, "A::Foo::Bar").len(), 1);
        assert_eq!(find(&decls, "Top").len(), 1);
    }

    #[test]
    fn test_methods_and_owners() {
        let decls = extract_source(
            "def main; end\nclass Foo\n  def bar(a, b = 1, *c, d:, e: 1, **f, &g); end\n  def self.baz; end\n  class << self\n    def qux; end\n  end\nend\n",
        );

        assert_eq!(find(&decls, "Object#main").len(), 1);
        let bar = find(&decls, "Foo#bar");
        let kinds: Vec<ParameterKind> = bar[0].signatures[0]
            .parameters
            .iter()
            .map(|p| p.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::Required,
                ParameterKind::Optional,
                ParameterKind::Rest,
                ParameterKind::Keyword,
                ParameterKind::OptionalKeyword,
                ParameterKind::KeywordRest,
                ParameterKind::Block,
            ]
        );
        assert!(find(&decls, "Foo::<Class:Foo>#baz")[0].singleton);
        assert_eq!(find(&decls, "Foo::<Class:Foo>#qux").len(), 1);
        assert_eq!(find(&decls, "Foo::<Class:Foo>").len(), 1);
    }

    #[test]
    fn test_variable_owners() {
        let decls = extract_source(
            "class Foo\n  @a = 1\n  @@b = 1\n  def x\n    @c = 1\n  end\n  def self.y\n    @d = 1\n    @@e = 1\n  end\nend\n$g = 1\n",
        );

        assert_eq!(find(&decls, "Foo::<Class:Foo>#@a").len(), 1);
        assert_eq!(find(&decls, "Foo#@@b").len(), 1);
        assert_eq!(find(&decls, "Foo#@c").len(), 1);
        assert_eq!(find(&decls, "Foo::<Class:Foo>#@d").len(), 1);
        assert_eq!(find(&decls, "Foo#@@e").len(), 1);
        let global = find(&decls, "$g");
        assert_eq!(global.len(), 1);
        assert!(global[0].owner.is_none());
    }

    #[test]
    fn test_every_global_write_form() {
        let decls = extract_source(
            "# and write\n$bar &&= 1\n# op write\n$baz += 1\n# or write\n$qux ||= 1\n# target write\n$quux, $corge = 1\n",
        );

        assert_eq!(find(&decls, "$bar")[0].documentation, "and write");
        assert_eq!(find(&decls, "$baz")[0].documentation, "op write");
        assert_eq!(find(&decls, "$qux")[0].documentation, "or write");
        assert_eq!(find(&decls, "$quux")[0].documentation, "target write");
        assert_eq!(find(&decls, "$corge")[0].documentation, "target write");
    }

    #[test]
    fn test_constants_and_private_constant() {
        let decls = extract_source(
            "class A\n  CONST = 123\n  OTHER = 1\n  private_constant(:CONST)\nend\nA::LATER = 2\nQUX = 42\n",
        );

        assert!(find(&decls, "A::CONST")[0].is_private());
        assert!(!find(&decls, "A::OTHER")[0].is_private());
        assert_eq!(find(&decls, "A::LATER").len(), 1);
        assert!(find(&decls, "QUX")[0].owner.is_none());
    }

    #[test]
    fn test_mixins_attach_to_namespace() {
        let decls = extract_source(
            "class Foo\n  include Bar\n  prepend Baz\n  extend Qux\nend\n",
        );

        let data = find(&decls, "Foo")[0].namespace.clone().unwrap();
        assert_eq!(data.includes[0].name, "Bar");
        assert_eq!(data.prepends[0].name, "Baz");
        assert_eq!(data.extends[0].name, "Qux");
    }

    #[test]
    fn test_visibility_forms() {
        let decls = extract_source(
            "class Foo\n  def a; end\n  private def b; end\n  def c; end\n  private :c\n  protected\n  def d; end\n  public\n  def e; end\nend\n",
        );

        assert_eq!(find(&decls, "Foo#a")[0].visibility, Visibility::Public);
        assert_eq!(find(&decls, "Foo#b")[0].visibility, Visibility::Private);
        assert_eq!(find(&decls, "Foo#c")[0].visibility, Visibility::Private);
        assert_eq!(find(&decls, "Foo#d")[0].visibility, Visibility::Protected);
        assert_eq!(find(&decls, "Foo#e")[0].visibility, Visibility::Public);
    }

    #[test]
    fn test_attributes_and_aliases() {
        let decls = extract_source(
            "class Foo\n  attr_accessor :name\n  attr_reader :age\n  # Alias\n  alias baz bar\n  alias_method :qux, :bar\nend\n",
        );

        assert_eq!(find(&decls, "Foo#name").len(), 1);
        assert_eq!(find(&decls, "Foo#name=").len(), 1);
        assert_eq!(find(&decls, "Foo#age").len(), 1);
        assert!(find(&decls, "Foo#age=").is_empty());

        let baz = find(&decls, "Foo#baz");
        assert_eq!(baz[0].kind, DeclarationKind::Alias);
        assert_eq!(baz[0].alias_target.as_deref(), Some("bar"));
        assert_eq!(baz[0].documentation, "Alias");
        assert_eq!(find(&decls, "Foo#qux")[0].alias_target.as_deref(), Some("bar"));
    }

    #[test]
    fn test_documentation_rules() {
        let decls = extract_source(
            "# typed: true\n# Hello\n# World\nclass A; end\n\n# detached\n\nclass B; end\nx = 1 # trailing\nclass C; end\n",
        );

        assert_eq!(find(&decls, "A")[0].documentation, "Hello\nWorld");
        assert_eq!(find(&decls, "B")[0].documentation, "");
        assert_eq!(find(&decls, "C")[0].documentation, "");
    }

    #[test]
    fn test_error_regions_do_not_abort() {
        let decls = extract_source("class Good\n  def ok; end\nend\n\ndef broken(\n");
        assert_eq!(find(&decls, "Good").len(), 1);
        assert_eq!(find(&decls, "Good#ok").len(), 1);
    }
}
