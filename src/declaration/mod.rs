//! Declarations extracted from Ruby sources.
//!
//! A declaration never points at another declaration. Superclasses, mixins
//! and alias targets are kept as names and resolved through the index when
//! queried, so replacing one file's declarations can never leave a dangling
//! link behind.

use crate::types::{CompactString, DeclarationId, DeclarationKind, FileId, Range};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the implicit owner of top-level methods and class variables.
pub const OBJECT: &str = "Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
            Visibility::Protected => f.write_str("protected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamespaceFlavor {
    Class,
    Module,
    Singleton,
}

/// An unresolved constant reference, together with the lexical nesting it
/// appeared in. Resolution happens lazily against the current index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstantRef {
    pub name: String,
    /// Qualified names of the enclosing namespaces, outermost first.
    pub nesting: Vec<String>,
}

impl ConstantRef {
    pub fn new(name: impl Into<String>, nesting: Vec<String>) -> Self {
        Self {
            name: name.into(),
            nesting,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceData {
    pub flavor: Option<NamespaceFlavor>,
    pub superclass: Option<ConstantRef>,
    pub includes: Vec<ConstantRef>,
    pub prepends: Vec<ConstantRef>,
    pub extends: Vec<ConstantRef>,
}

impl NamespaceData {
    pub fn class(superclass: Option<ConstantRef>) -> Self {
        Self {
            flavor: Some(NamespaceFlavor::Class),
            superclass,
            ..Default::default()
        }
    }

    pub fn module() -> Self {
        Self {
            flavor: Some(NamespaceFlavor::Module),
            ..Default::default()
        }
    }

    pub fn singleton() -> Self {
        Self {
            flavor: Some(NamespaceFlavor::Singleton),
            ..Default::default()
        }
    }

    pub fn is_class(&self) -> bool {
        self.flavor == Some(NamespaceFlavor::Class)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    Required,
    Optional,
    Rest,
    Keyword,
    OptionalKeyword,
    KeywordRest,
    Block,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: DeclarationId,
    pub kind: DeclarationKind,
    pub name: CompactString,
    /// Qualified name of the owning namespace. `None` for globals and
    /// top-level constants.
    pub owner: Option<String>,
    pub file_id: FileId,
    pub uri: String,
    pub range: Range,
    pub name_range: Range,
    pub visibility: Visibility,
    pub documentation: String,
    pub signatures: Vec<Signature>,
    /// Set for methods defined on the singleton (`def self.x`).
    pub singleton: bool,
    pub namespace: Option<NamespaceData>,
    /// For aliases, the name of the aliased member on the same owner.
    pub alias_target: Option<String>,
}

impl Declaration {
    pub fn new(
        id: DeclarationId,
        kind: DeclarationKind,
        name: impl Into<CompactString>,
        file_id: FileId,
        range: Range,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            owner: None,
            file_id,
            uri: String::new(),
            range,
            name_range: range,
            visibility: Visibility::Public,
            documentation: String::new(),
            signatures: Vec::new(),
            singleton: false,
            namespace: None,
            alias_target: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_name_range(mut self, range: Range) -> Self {
        self.name_range = range;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn with_namespace(mut self, data: NamespaceData) -> Self {
        self.namespace = Some(data);
        self
    }

    pub fn with_alias_target(mut self, target: impl Into<String>) -> Self {
        self.alias_target = Some(target.into());
        self
    }

    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }

    /// Key under which the store files this declaration.
    pub fn qualified_name(&self) -> String {
        qualified_name(self.kind, self.owner.as_deref(), &self.name)
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// Builds the lookup key for a declaration of `kind` named `name` inside `owner`.
///
/// Constants and namespaces use `A::B`, members use `Owner#name`, globals
/// are keyed by their own `$name`.
pub fn qualified_name(kind: DeclarationKind, owner: Option<&str>, name: &str) -> String {
    match (kind, owner) {
        (DeclarationKind::GlobalVariable, _) => name.to_string(),
        (DeclarationKind::Namespace | DeclarationKind::Constant, Some(owner)) => {
            format!("{owner}::{name}")
        }
        (DeclarationKind::Namespace | DeclarationKind::Constant, None) => name.to_string(),
        (_, Some(owner)) => format!("{owner}#{name}"),
        (_, None) => format!("{OBJECT}#{name}"),
    }
}

/// Qualified name of the singleton namespace attached to `namespace`.
pub fn singleton_name(namespace: &str) -> String {
    format!("{namespace}::<Class:{}>", last_segment(namespace))
}

/// For a singleton name such as `Foo::<Class:Foo>`, the attached namespace.
pub fn attached_namespace(singleton: &str) -> Option<&str> {
    if !singleton.ends_with('>') {
        return None;
    }
    let (attached, last) = singleton.rsplit_once("::")?;
    last.starts_with("<Class:").then_some(attached)
}

pub fn is_singleton_name(name: &str) -> bool {
    attached_namespace(name).is_some()
}

pub fn last_segment(qualified: &str) -> &str {
    qualified.rsplit("::").next().unwrap_or(qualified)
}
