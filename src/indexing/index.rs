//! The declaration index
//!
//! Owns every declaration in the workspace and answers the lookups hover
//! needs: constants through lexical scope and ancestors, members through
//! the ancestor chain of their receiver. All reads go through one read lock;
//! a file reindex swaps its declarations under the write lock, so a request
//! observes the index either before or after any given reindex.

use crate::declaration::{
    ConstantRef, Declaration, NamespaceData, NamespaceFlavor, OBJECT, last_segment,
};
use crate::error::{IndexError, IndexResult};
use crate::indexing::ancestors::{AncestorResolver, LinearizationContext, NamespaceGraph};
use crate::parsing::ParsedDocument;
use crate::parsing::ruby::extract;
use crate::storage::DeclarationStore;
use crate::types::{DeclarationCounter, DeclarationId, DeclarationKind, FileId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub declaration_count: usize,
    pub file_count: usize,
}

#[derive(Debug, Default)]
struct IndexState {
    store: DeclarationStore,
    counter: DeclarationCounter,
    uris: HashMap<FileId, String>,
}

#[derive(Debug, Default)]
pub struct Index {
    state: RwLock<IndexState>,
    ancestors: AncestorResolver,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every declaration previously extracted from `file_id` with
    /// the declarations of `document`. Returns how many were added.
    pub fn index_file(&self, file_id: FileId, document: &ParsedDocument) -> usize {
        let mut state = self.state.write();
        let declarations = extract(document, file_id, &mut state.counter);
        self.swap_file(&mut state, file_id, &document.uri, declarations)
    }

    /// Files pre-built declarations under `file_id`.
    ///
    /// Ids, file ids and uris of the given declarations are overwritten, so
    /// callers can build them with placeholder values.
    pub fn index_declarations(
        &self,
        file_id: FileId,
        uri: &str,
        declarations: Vec<Declaration>,
    ) -> usize {
        let mut state = self.state.write();
        let declarations = declarations
            .into_iter()
            .map(|mut declaration| {
                declaration.id = state.counter.next_id();
                declaration.file_id = file_id;
                declaration.uri = uri.to_string();
                declaration
            })
            .collect();
        self.swap_file(&mut state, file_id, uri, declarations)
    }

    fn swap_file(
        &self,
        state: &mut IndexState,
        file_id: FileId,
        uri: &str,
        declarations: Vec<Declaration>,
    ) -> usize {
        let added = declarations.len();
        let removed = state.store.replace_file(file_id, declarations);
        state.uris.insert(file_id, uri.to_string());
        self.ancestors.invalidate_all();

        debug!("indexed {uri}: {added} declarations ({removed} replaced)");
        added
    }

    /// Drops every declaration of `file_id`.
    pub fn delete_file(&self, file_id: FileId) -> IndexResult<usize> {
        let mut state = self.state.write();
        if !state.store.has_file(file_id) {
            return Err(IndexError::FileNotFound { id: file_id });
        }

        let removed = state.store.remove_file(file_id).len();
        let uri = state.uris.remove(&file_id).unwrap_or_default();
        self.ancestors.invalidate_all();

        info!("removed {uri} from index ({removed} declarations)");
        Ok(removed)
    }

    pub fn contains_file(&self, file_id: FileId) -> bool {
        self.state.read().store.has_file(file_id)
    }

    pub fn uri(&self, file_id: FileId) -> Option<String> {
        self.state.read().uris.get(&file_id).cloned()
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            declaration_count: state.store.len(),
            file_count: state.store.file_count(),
        }
    }

    pub fn declarations_in_file(&self, file_id: FileId) -> Vec<Declaration> {
        let state = self.state.read();
        let mut found: Vec<Declaration> = state
            .store
            .find_by_file(file_id)
            .into_iter()
            .cloned()
            .collect();
        found.sort_by_key(|declaration| declaration.id);
        found
    }

    /// Every declaration filed under `qualified_name`, oldest first.
    pub fn resolve(&self, qualified_name: &str) -> Vec<Declaration> {
        let state = self.state.read();
        state
            .store
            .find(qualified_name)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let state = self.state.read();
        self.snapshot(&state).ancestors(name).to_vec()
    }

    /// Resolves a single constant name as written inside `nesting`.
    pub fn lookup_constant(&self, name: &str, nesting: &[String]) -> Option<Declaration> {
        let state = self.state.read();
        let snapshot = self.snapshot(&state);
        let qualified =
            snapshot.lookup_constant(name, nesting, &mut LinearizationContext::default())?;
        state.store.find(&qualified).into_iter().next().cloned()
    }

    /// Resolves a possibly scoped constant path (`A::B`, `::C`) to the
    /// qualified name it denotes.
    pub fn resolve_constant_path(&self, path: &str, nesting: &[String]) -> Option<String> {
        let state = self.state.read();
        let snapshot = self.snapshot(&state);
        snapshot.resolve_path(path, nesting, &mut LinearizationContext::default())
    }

    /// Every method (or alias) named `name` visible on instances of `receiver`,
    /// in ancestor order.
    pub fn resolve_method(&self, receiver: &str, name: &str) -> Vec<Declaration> {
        self.resolve_member(receiver, name, |kind| {
            matches!(kind, DeclarationKind::Method | DeclarationKind::Alias)
        })
    }

    pub fn resolve_instance_variable(&self, owner: &str, name: &str) -> Vec<Declaration> {
        self.resolve_member(owner, name, |kind| kind == DeclarationKind::InstanceVariable)
    }

    pub fn resolve_class_variable(&self, owner: &str, name: &str) -> Vec<Declaration> {
        self.resolve_member(owner, name, |kind| kind == DeclarationKind::ClassVariable)
    }

    fn resolve_member(
        &self,
        owner: &str,
        name: &str,
        accepts: impl Fn(DeclarationKind) -> bool,
    ) -> Vec<Declaration> {
        let state = self.state.read();
        let chain = self.snapshot(&state).ancestors(owner);

        chain
            .iter()
            .flat_map(|ancestor| state.store.find(&format!("{ancestor}#{name}")))
            .filter(|declaration| accepts(declaration.kind))
            .cloned()
            .collect()
    }

    /// The first definition of `method` found strictly after `owner` in the
    /// ancestor chain of `owner`.
    pub fn resolve_super(&self, owner: &str, method: &str) -> Option<Declaration> {
        let state = self.state.read();
        let chain = self.snapshot(&state).ancestors(owner);
        let start = chain.iter().position(|ancestor| ancestor == owner)?;

        chain[start + 1..]
            .iter()
            .flat_map(|ancestor| state.store.find(&format!("{ancestor}#{method}")))
            .find(|declaration| {
                matches!(
                    declaration.kind,
                    DeclarationKind::Method | DeclarationKind::Alias
                )
            })
            .cloned()
    }

    /// Resolves an alias to itself followed by the declarations it ends up
    /// pointing at. Chains of aliases are followed until a non-alias is found.
    pub fn resolve_alias(&self, alias: &Declaration) -> Vec<Declaration> {
        let mut resolved = vec![alias.clone()];
        let mut visited: HashSet<DeclarationId> = HashSet::from([alias.id]);
        let mut pending = vec![alias.clone()];

        while let Some(current) = pending.pop() {
            let (Some(target), Some(owner)) =
                (current.alias_target.as_deref(), current.owner.as_deref())
            else {
                continue;
            };

            for candidate in self.resolve_method(owner, target) {
                if !visited.insert(candidate.id) {
                    continue;
                }
                if candidate.kind == DeclarationKind::Alias {
                    pending.push(candidate);
                } else {
                    resolved.push(candidate);
                }
            }
        }

        resolved
    }

    /// Qualified names of the non-singleton namespaces whose last segment is
    /// `name`, in declaration order.
    pub fn namespaces_named(&self, name: &str) -> Vec<String> {
        let state = self.state.read();
        let mut names: Vec<String> = Vec::new();
        for declaration in state.store.find_by_name(DeclarationKind::Namespace, name) {
            let is_singleton = declaration
                .namespace
                .as_ref()
                .is_some_and(|data| data.flavor == Some(NamespaceFlavor::Singleton));
            let qualified = declaration.qualified_name();
            if !is_singleton && last_segment(&qualified) == name && !names.contains(&qualified) {
                names.push(qualified);
            }
        }
        names
    }

    /// Every method or alias named `name` anywhere in the index.
    pub fn methods_named(&self, name: &str) -> Vec<Declaration> {
        let state = self.state.read();
        let mut found: Vec<Declaration> = state
            .store
            .find_by_name(DeclarationKind::Method, name)
            .into_iter()
            .chain(state.store.find_by_name(DeclarationKind::Alias, name))
            .cloned()
            .collect();
        found.sort_by_key(|declaration| declaration.id);
        found
    }

    pub fn is_module(&self, name: &str) -> bool {
        let state = self.state.read();
        let snapshot = self.snapshot(&state);
        let data = snapshot.namespace_data(name);
        !data.iter().any(|namespace| namespace.is_class())
            && data
                .iter()
                .any(|namespace| namespace.flavor == Some(NamespaceFlavor::Module))
    }

    fn snapshot<'s>(&'s self, state: &'s IndexState) -> Snapshot<'s> {
        Snapshot {
            store: &state.store,
            resolver: &self.ancestors,
        }
    }
}

/// A consistent read view: the store under the read lock plus the shared
/// ancestor cache.
struct Snapshot<'s> {
    store: &'s DeclarationStore,
    resolver: &'s AncestorResolver,
}

impl Snapshot<'_> {
    fn ancestors(&self, name: &str) -> Arc<[String]> {
        self.resolver.ancestors(self, name)
    }

    fn constant_declarations(&self, qualified: &str) -> Vec<&Declaration> {
        self.store
            .find(qualified)
            .into_iter()
            .filter(|declaration| declaration.kind.is_constant_like())
            .collect()
    }

    /// Lexical scopes innermost first, then the ancestors of the innermost
    /// scope, then the top level.
    fn lookup_constant(
        &self,
        name: &str,
        nesting: &[String],
        context: &mut LinearizationContext,
    ) -> Option<String> {
        for scope in nesting.iter().rev() {
            let candidate = format!("{scope}::{name}");
            if !self.constant_declarations(&candidate).is_empty() {
                return Some(candidate);
            }
        }

        if let Some(innermost) = nesting.last() {
            let chain = self.resolver.linearize(self, innermost, context);
            // Prepended modules come before the namespace itself
            for ancestor in chain.iter().filter(|ancestor| *ancestor != innermost) {
                if ancestor == OBJECT {
                    break;
                }
                let candidate = format!("{ancestor}::{name}");
                let found = self.constant_declarations(&candidate);
                if !found.is_empty() {
                    return self.accessible(candidate, &found, ancestor, nesting);
                }
            }
        }

        if self.constant_declarations(name).is_empty() {
            return None;
        }
        Some(name.to_string())
    }

    /// Looks `name` up as a member of the namespace `owner`, through its ancestors.
    fn lookup_member_constant(
        &self,
        owner: &str,
        name: &str,
        nesting: &[String],
        context: &mut LinearizationContext,
    ) -> Option<String> {
        let chain = self.resolver.linearize(self, owner, context);
        for ancestor in chain.iter() {
            let candidate = if ancestor == OBJECT {
                name.to_string()
            } else {
                format!("{ancestor}::{name}")
            };
            let found = self.constant_declarations(&candidate);
            if !found.is_empty() {
                return self.accessible(candidate, &found, ancestor, nesting);
            }
        }
        None
    }

    /// A private constant is only visible from inside its declaring namespace.
    fn accessible(
        &self,
        candidate: String,
        found: &[&Declaration],
        declaring: &str,
        nesting: &[String],
    ) -> Option<String> {
        let private = found.iter().any(|declaration| declaration.is_private());
        if private && !nesting.iter().any(|scope| scope == declaring) {
            debug!("{candidate} is private to {declaring}");
            return None;
        }
        Some(candidate)
    }

    fn resolve_path(
        &self,
        path: &str,
        nesting: &[String],
        context: &mut LinearizationContext,
    ) -> Option<String> {
        let (absolute, path) = match path.strip_prefix("::") {
            Some(rest) => (true, rest),
            None => (false, path),
        };

        let mut segments = path.split("::").filter(|segment| !segment.is_empty());
        let first = segments.next()?;

        let mut current = if absolute {
            if self.constant_declarations(first).is_empty() {
                return None;
            }
            first.to_string()
        } else {
            self.lookup_constant(first, nesting, context)?
        };

        for segment in segments {
            current = self.lookup_member_constant(&current, segment, nesting, context)?;
        }
        Some(current)
    }
}

impl NamespaceGraph for Snapshot<'_> {
    fn namespace_data(&self, name: &str) -> Vec<&NamespaceData> {
        self.store
            .find(name)
            .into_iter()
            .filter(|declaration| declaration.kind == DeclarationKind::Namespace)
            .filter_map(|declaration| declaration.namespace.as_ref())
            .collect()
    }

    fn resolve_reference(
        &self,
        reference: &ConstantRef,
        _resolver: &AncestorResolver,
        context: &mut LinearizationContext,
    ) -> Option<String> {
        let resolved = self.resolve_path(&reference.name, &reference.nesting, context)?;
        // Only namespaces can be superclasses or mixins
        self.store
            .find(&resolved)
            .iter()
            .any(|declaration| declaration.kind == DeclarationKind::Namespace)
            .then_some(resolved)
    }
}
