//! Hover over references in Ruby source
//!
//! Two listener registrations cover every reference kind. The static one
//! handles constants, globals, class variables, keywords and calls on an
//! explicit receiver, and always runs. The dynamic one handles calls on
//! `self`, bare method references, instance variables and `super`; it is
//! switched off for files a type checker owns.

pub mod format;
pub mod gems;
pub mod guess;
pub mod keywords;

use crate::config::HoverConfig;
use crate::declaration::Declaration;
use crate::dispatch::{Dispatcher, ListenerContext, ListenerHandle, Listener, StrictnessGate};
use crate::error::ListenerResult;
use crate::parsing::Strictness;
use crate::parsing::ruby::names;
use crate::response::Category;
use crate::types::{DeclarationId, DeclarationKind, Range};
use guess::ReceiverType;
use std::collections::HashSet;
use tree_sitter::Node;

const STATIC_KINDS: &[&str] = &[
    "constant",
    "scope_resolution",
    "global_variable",
    "class_variable",
    "call",
];

const DYNAMIC_KINDS: &[&str] = &["call", "identifier", "instance_variable", "super"];

/// Parents under which an identifier declares a name instead of using one.
const DECLARING_PARENTS: &[&str] = &[
    "alias",
    "block_parameter",
    "block_parameters",
    "destructured_parameter",
    "hash_splat_parameter",
    "keyword_parameter",
    "lambda_parameters",
    "method_parameters",
    "optional_parameter",
    "splat_parameter",
    "undef",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverFocus {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverRegistration {
    pub static_listener: ListenerHandle,
    pub dynamic_listener: ListenerHandle,
}

/// Registers the hover listeners for a file of the given strictness.
pub fn register_hover_listeners(
    dispatcher: &mut Dispatcher<'_>,
    config: &HoverConfig,
    strictness: Strictness,
) -> HoverRegistration {
    let mut static_kinds = STATIC_KINDS.to_vec();
    static_kinds.extend_from_slice(keywords::KEYWORD_NODE_KINDS);

    let static_listener = dispatcher.register(
        &static_kinds,
        HoverListener::new(HoverFocus::Static, config.clone()),
    );
    let dynamic_listener = dispatcher.register(
        DYNAMIC_KINDS,
        HoverListener::new(HoverFocus::Dynamic, config.clone()),
    );
    dispatcher.set_enabled(
        dynamic_listener,
        StrictnessGate::from_config(config).allows(strictness),
    );

    HoverRegistration {
        static_listener,
        dynamic_listener,
    }
}

pub struct HoverListener {
    focus: HoverFocus,
    config: HoverConfig,
}

impl HoverListener {
    pub fn new(focus: HoverFocus, config: HoverConfig) -> Self {
        Self { focus, config }
    }

    fn on_constant(&self, node: Node, context: &mut ListenerContext<'_>) {
        // The enclosing scope resolution answers for its own name
        if let Some(parent) = node.parent() {
            if parent.kind() == "scope_resolution" && parent.child_by_field_name("name") == Some(node)
            {
                return;
            }
        }
        let path = context.text(node).to_string();
        self.hover_constant(&path, context);
    }

    fn on_scope_resolution(&self, node: Node, context: &mut ListenerContext<'_>) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        if !at_position(name, context) {
            return;
        }
        if let Some(path) = names::constant_path(node, &context.document.source) {
            self.hover_constant(&path, context);
        }
    }

    fn hover_constant(&self, path: &str, context: &mut ListenerContext<'_>) {
        let Some(qualified) = context
            .index
            .resolve_constant_path(path, &context.nesting.namespaces)
        else {
            return;
        };
        let declarations: Vec<Declaration> = context
            .index
            .resolve(&qualified)
            .into_iter()
            .filter(|declaration| declaration.kind.is_constant_like())
            .collect();
        self.push_declarations(format::code_title(&qualified), &declarations, context);
    }

    fn on_global_variable(&self, node: Node, context: &mut ListenerContext<'_>) {
        let name = context.text(node).to_string();
        let declarations: Vec<Declaration> = context
            .index
            .resolve(&name)
            .into_iter()
            .filter(|declaration| declaration.kind == DeclarationKind::GlobalVariable)
            .collect();
        self.push_declarations(format::code_title(&name), &declarations, context);
    }

    fn on_class_variable(&self, node: Node, context: &mut ListenerContext<'_>) {
        let name = context.text(node).to_string();
        let declarations = context
            .index
            .resolve_class_variable(&context.nesting.class_variable_owner, &name);
        self.push_declarations(format::code_title(&name), &declarations, context);
    }

    fn on_instance_variable(&self, node: Node, context: &mut ListenerContext<'_>) {
        let name = context.text(node).to_string();
        let declarations = context
            .index
            .resolve_instance_variable(&context.nesting.self_type, &name);
        self.push_declarations(format::code_title(&name), &declarations, context);
    }

    fn on_call(&self, node: Node, context: &mut ListenerContext<'_>) {
        // Dependency declarations belong to the Gemfile listener
        if context.document.is_gemfile() && gems::is_gem_call(node, &context.document.source) {
            return;
        }
        let Some(method) = node.child_by_field_name("method") else {
            return;
        };
        if method.kind() == "super" || !at_position(method, context) {
            return;
        }
        let name = context.text(method).to_string();

        match node.child_by_field_name("receiver") {
            None => {
                if self.focus == HoverFocus::Dynamic {
                    self.hover_self_method(&name, context);
                }
            }
            Some(receiver) if receiver.kind() == "self" => {
                if self.focus == HoverFocus::Dynamic {
                    self.hover_self_method(&name, context);
                }
            }
            Some(receiver) => {
                if self.focus == HoverFocus::Static {
                    self.hover_receiver_method(receiver, &name, context);
                }
            }
        }
    }

    fn on_identifier(&self, node: Node, context: &mut ListenerContext<'_>) {
        if let Some(parent) = node.parent() {
            let field = |field: &str| parent.child_by_field_name(field) == Some(node);
            let declares = DECLARING_PARENTS.contains(&parent.kind())
                || (parent.kind() == "call" && field("method"))
                || (matches!(parent.kind(), "method" | "singleton_method") && field("name"))
                || (matches!(parent.kind(), "assignment" | "operator_assignment")
                    && field("left"));
            if declares {
                return;
            }
        }

        let name = context.text(node).to_string();
        if context.nesting.is_local(&name) || keywords::is_keyword(&name) {
            return;
        }
        self.hover_self_method(&name, context);
    }

    fn on_super(&self, context: &mut ListenerContext<'_>) {
        let Some(method) = context.nesting.method.clone() else {
            return;
        };
        let Some(parent) = context.index.resolve_super(&method.owner, &method.name) else {
            return;
        };
        let declarations = self.expand_aliases(vec![parent], context);
        self.push_method(&method.name, &declarations, context);
    }

    fn on_keyword(&self, node: Node, context: &mut ListenerContext<'_>) {
        let Some(keyword) = keyword_at(node, context) else {
            return;
        };
        let documentation = keywords::documentation(&keyword)
            .map(str::to_string)
            .unwrap_or_else(|| format!("No documentation found for {keyword}"));

        context.push(Category::Title, format::code_title(&keyword));
        context.push(Category::Documentation, documentation);
        context.push(
            Category::Links,
            format!(
                "[Read more]({}/{keyword}.md)",
                self.config.static_docs_base.trim_end_matches('/')
            ),
        );
    }

    fn hover_self_method(&self, name: &str, context: &mut ListenerContext<'_>) {
        let declarations = context.index.resolve_method(&context.nesting.self_type, name);
        let declarations = self.expand_aliases(declarations, context);
        self.push_method(name, &declarations, context);
    }

    fn hover_receiver_method(&self, receiver: Node, name: &str, context: &mut ListenerContext<'_>) {
        match guess::receiver_type(receiver, name, context, self.config.guess_receivers) {
            ReceiverType::Known(namespace) => {
                let declarations = context.index.resolve_method(&namespace, name);
                let declarations = self.expand_aliases(declarations, context);
                self.push_method(name, &declarations, context);
            }
            ReceiverType::Guessed(namespace) => {
                let declarations = context.index.resolve_method(&namespace, name);
                let declarations = self.expand_aliases(declarations, context);
                if declarations.is_empty() {
                    return;
                }
                self.push_method(name, &declarations, context);
                context.push(Category::Title, format!("Guessed receiver: {namespace}"));
                context.push(
                    Category::Links,
                    format!(
                        "[Learn more about guessed types]({})",
                        self.config.guessed_types_url
                    ),
                );
            }
            ReceiverType::Unknown => {
                let declarations = context.index.methods_named(name);
                let declarations = self.expand_aliases(declarations, context);
                self.push_method(name, &declarations, context);
            }
        }
    }

    /// Replaces each alias with itself followed by what it points at.
    fn expand_aliases(
        &self,
        declarations: Vec<Declaration>,
        context: &ListenerContext<'_>,
    ) -> Vec<Declaration> {
        let mut seen: HashSet<DeclarationId> = HashSet::new();
        let mut expanded = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let group = if declaration.kind == DeclarationKind::Alias {
                context.index.resolve_alias(&declaration)
            } else {
                vec![declaration]
            };
            for member in group {
                if seen.insert(member.id) {
                    expanded.push(member);
                }
            }
        }
        expanded
    }

    fn push_method(&self, name: &str, declarations: &[Declaration], context: &mut ListenerContext<'_>) {
        if declarations.is_empty() {
            return;
        }
        self.push_declarations(format::method_title(name, declarations), declarations, context);
    }

    fn push_declarations(
        &self,
        title: String,
        declarations: &[Declaration],
        context: &mut ListenerContext<'_>,
    ) {
        if declarations.is_empty() {
            return;
        }
        context.push(Category::Title, title);
        for doc in format::documentation(declarations) {
            context.push(Category::Documentation, doc);
        }
        if let Some(links) = format::definition_links(declarations, self.config.max_definition_links)
        {
            context.push(Category::Links, links);
        }
    }
}

impl Listener for HoverListener {
    fn name(&self) -> &str {
        match self.focus {
            HoverFocus::Static => "hover",
            HoverFocus::Dynamic => "hover-dynamic",
        }
    }

    fn enter(&mut self, node: Node<'_>, context: &mut ListenerContext<'_>) -> ListenerResult<()> {
        match (self.focus, node.kind()) {
            (HoverFocus::Static, "constant") => self.on_constant(node, context),
            (HoverFocus::Static, "scope_resolution") => self.on_scope_resolution(node, context),
            (HoverFocus::Static, "global_variable") => self.on_global_variable(node, context),
            (HoverFocus::Static, "class_variable") => self.on_class_variable(node, context),
            (_, "call") => self.on_call(node, context),
            (HoverFocus::Dynamic, "identifier") => self.on_identifier(node, context),
            (HoverFocus::Dynamic, "instance_variable") => self.on_instance_variable(node, context),
            (HoverFocus::Dynamic, "super") => self.on_super(context),
            (HoverFocus::Static, _) => self.on_keyword(node, context),
            (HoverFocus::Dynamic, _) => {}
        }
        Ok(())
    }
}

fn at_position(node: Node, context: &ListenerContext<'_>) -> bool {
    context
        .position
        .is_none_or(|position| Range::from_node(&node).contains_position(position))
}

/// The keyword under the cursor: the node itself for leaf keywords such as
/// `self` or `nil`, otherwise one of its keyword tokens.
fn keyword_at(node: Node, context: &ListenerContext<'_>) -> Option<String> {
    if node.child_count() == 0 {
        let text = context.text(node);
        return keywords::is_keyword(text).then(|| text.to_string());
    }

    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .find(|child| keywords::is_keyword(child.kind()) && at_position(*child, context))
        .map(|child| child.kind().to_string());
    found
}
