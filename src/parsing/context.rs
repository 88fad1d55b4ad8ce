//! Parser context for tracking lexical scope during AST traversal
//!
//! Both declaration extraction and the nesting resolver walk the tree with a
//! `ParserContext`, so a method or variable is always attributed to the same
//! owner whether it is being declared or referenced.

use crate::declaration::{OBJECT, Visibility, is_singleton_name, singleton_name};
use crate::parsing::ruby::names;
use tree_sitter::Node;

/// Scope types the Ruby walkers track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    Class,
    Module,
    /// `class << self` and friends
    SingletonClass,
    Method {
        /// `def self.x`, or any `def` directly inside a singleton class body
        singleton: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub scope_type: ScopeType,
    /// Qualified namespace name. For methods, the namespace owning the method.
    pub name: String,
    /// Method name, for method scopes only
    pub method_name: Option<String>,
    /// Visibility applied to `def`s that follow a bare `private` / `public`
    pub default_visibility: Visibility,
    /// Position of the declaration this scope opened, if the extractor created one
    pub declaration: Option<usize>,
}

/// Parser context for tracking current scope during parsing
#[derive(Debug, Clone, Default)]
pub struct ParserContext {
    /// Stack of current scopes (innermost last)
    scopes: Vec<Scope>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_namespace(&mut self, qualified: String, scope_type: ScopeType) {
        self.scopes.push(Scope {
            scope_type,
            name: qualified,
            method_name: None,
            default_visibility: Visibility::Public,
            declaration: None,
        });
    }

    pub fn enter_method(&mut self, name: String, owner: String, singleton: bool) {
        self.scopes.push(Scope {
            scope_type: ScopeType::Method { singleton },
            name: owner,
            method_name: Some(name),
            default_visibility: Visibility::Public,
            declaration: None,
        });
    }

    pub fn exit_scope(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Enters the scope opened by `node`, if it opens one.
    ///
    /// Returns true when a scope was pushed; the caller pops it with
    /// [`exit_scope`](Self::exit_scope) after visiting the children.
    pub fn enter_node(&mut self, node: Node, source: &str) -> bool {
        match node.kind() {
            "class" | "module" => {
                let Some(path) = node
                    .child_by_field_name("name")
                    .and_then(|name| names::constant_path(name, source))
                else {
                    return false;
                };
                let qualified = names::qualify(self.current_lexical_namespace(), &path);
                let scope_type = if node.kind() == "class" {
                    ScopeType::Class
                } else {
                    ScopeType::Module
                };
                self.enter_namespace(qualified, scope_type);
                true
            }
            "singleton_class" => {
                let target = node
                    .child_by_field_name("value")
                    .and_then(|value| self.receiver_namespace(value, source));
                let Some(target) = target else {
                    return false;
                };
                self.enter_namespace(singleton_name(&target), ScopeType::SingletonClass);
                true
            }
            "method" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return false;
                };
                let owner = self.method_owner();
                let singleton = is_singleton_name(&owner);
                self.enter_method(names::node_text(name, source).to_string(), owner, singleton);
                true
            }
            "singleton_method" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return false;
                };
                let target = node
                    .child_by_field_name("object")
                    .and_then(|object| self.receiver_namespace(object, source))
                    .unwrap_or_else(|| self.self_namespace());
                self.enter_method(
                    names::node_text(name, source).to_string(),
                    singleton_name(&target),
                    true,
                );
                true
            }
            _ => false,
        }
    }

    /// The namespace a `self` or constant receiver of `def x.y` / `class << x` denotes.
    fn receiver_namespace(&self, node: Node, source: &str) -> Option<String> {
        match node.kind() {
            "self" => Some(self.self_namespace()),
            "constant" | "scope_resolution" => {
                let path = names::constant_path(node, source)?;
                Some(names::qualify(self.current_lexical_namespace(), &path))
            }
            _ => None,
        }
    }

    /// The namespace whose singleton `self` refers to in a namespace body.
    fn self_namespace(&self) -> String {
        self.current_namespace()
            .map(str::to_string)
            .unwrap_or_else(|| OBJECT.to_string())
    }

    /// Qualified names of the enclosing non-singleton namespaces, outermost first.
    ///
    /// Used as the lexical scope list for constant lookup.
    pub fn nesting(&self) -> Vec<String> {
        self.scopes
            .iter()
            .filter(|scope| matches!(scope.scope_type, ScopeType::Class | ScopeType::Module))
            .map(|scope| scope.name.clone())
            .collect()
    }

    /// Innermost class/module, ignoring singleton blocks and methods.
    pub fn current_lexical_namespace(&self) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| matches!(scope.scope_type, ScopeType::Class | ScopeType::Module))
            .map(|scope| scope.name.as_str())
    }

    /// Innermost namespace including singleton blocks.
    pub fn current_namespace(&self) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| !matches!(scope.scope_type, ScopeType::Method { .. }))
            .map(|scope| scope.name.as_str())
    }

    pub fn current_method(&self) -> Option<&Scope> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| matches!(scope.scope_type, ScopeType::Method { .. }))
    }

    /// Owner for a plain `def` or `attr_*` at this point.
    pub fn method_owner(&self) -> String {
        match self.current_method() {
            // `def` nested in a method body defines on the same owner
            Some(method) => method.name.clone(),
            None => self.self_namespace(),
        }
    }

    /// Namespace `self` is an instance of: the method owner inside a method,
    /// the singleton of the current namespace in a namespace body.
    pub fn self_type(&self) -> String {
        match self.current_method() {
            Some(method) => method.name.clone(),
            None => match self.current_namespace() {
                Some(namespace) => singleton_name(namespace),
                None => OBJECT.to_string(),
            },
        }
    }

    /// Owner of instance variables written at this point.
    pub fn instance_variable_owner(&self) -> String {
        self.self_type()
    }

    /// Owner of class variables: the innermost class/module, never a singleton.
    pub fn class_variable_owner(&self) -> String {
        self.current_lexical_namespace()
            .map(str::to_string)
            .unwrap_or_else(|| OBJECT.to_string())
    }

    pub fn default_visibility(&self) -> Visibility {
        self.innermost_namespace_scope()
            .map(|scope| scope.default_visibility)
            .unwrap_or_default()
    }

    pub fn set_default_visibility(&mut self, visibility: Visibility) {
        if let Some(scope) = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| !matches!(scope.scope_type, ScopeType::Method { .. }))
        {
            scope.default_visibility = visibility;
        }
    }

    fn innermost_namespace_scope(&self) -> Option<&Scope> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| !matches!(scope.scope_type, ScopeType::Method { .. }))
    }

    /// Remembers which declaration the innermost scope opened.
    pub fn set_scope_declaration(&mut self, index: usize) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.declaration = Some(index);
        }
    }

    /// Declaration of the innermost namespace scope, for attaching mixins.
    pub fn namespace_declaration(&self) -> Option<usize> {
        self.innermost_namespace_scope()
            .and_then(|scope| scope.declaration)
    }
}
