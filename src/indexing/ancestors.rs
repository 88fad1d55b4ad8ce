//! Ancestor linearization for Ruby namespaces
//!
//! The chain of a namespace is its prepended modules, then the namespace,
//! then its included modules, then the chain of its superclass. Singleton
//! namespaces linearize on their own: the attached namespace's `extend`s act
//! as includes and the parent is the singleton of the attached superclass.
//!
//! Chains are computed lazily and cached by qualified name. Nothing in the
//! cache refers to declarations directly, so the index can drop the whole
//! cache on any reindex and rebuild on demand.

use crate::declaration::{
    ConstantRef, NamespaceData, NamespaceFlavor, OBJECT, attached_namespace, is_singleton_name,
    singleton_name,
};
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

pub const BASIC_OBJECT: &str = "BasicObject";
pub const MODULE: &str = "Module";
pub const CLASS: &str = "Class";

/// Read access to namespace data, as seen by the linearizer.
pub trait NamespaceGraph {
    /// Namespace data of every declaration filed under `name`, oldest first.
    fn namespace_data(&self, name: &str) -> Vec<&NamespaceData>;

    /// Resolves a superclass or mixin reference to a qualified namespace name.
    ///
    /// Implementations that need ancestors while resolving must go through
    /// `resolver` with the same `context` so cycles are caught.
    fn resolve_reference(
        &self,
        reference: &ConstantRef,
        resolver: &AncestorResolver,
        context: &mut LinearizationContext,
    ) -> Option<String>;
}

/// State for one top-level linearization request.
#[derive(Debug, Default)]
pub struct LinearizationContext {
    in_progress: HashSet<String>,
    /// Set once any chain below was cut short by a cycle. Such chains are
    /// returned but never cached.
    cyclic: bool,
}

impl LinearizationContext {
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }
}

#[derive(Debug, Default)]
pub struct AncestorResolver {
    cache: DashMap<String, Arc<[String]>>,
}

impl AncestorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ancestors<G: NamespaceGraph + ?Sized>(&self, graph: &G, name: &str) -> Arc<[String]> {
        let mut context = LinearizationContext::default();
        self.linearize(graph, name, &mut context)
    }

    /// Drops every cached chain.
    pub fn invalidate_all(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        if dropped > 0 {
            debug!("ancestor cache invalidated ({dropped} chains)");
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn linearize<G: NamespaceGraph + ?Sized>(
        &self,
        graph: &G,
        name: &str,
        context: &mut LinearizationContext,
    ) -> Arc<[String]> {
        if let Some(cached) = self.cache.get(name) {
            return Arc::clone(cached.value());
        }

        if !context.in_progress.insert(name.to_string()) {
            context.cyclic = true;
            return Arc::from(Vec::new());
        }

        let data = graph.namespace_data(name);
        let singleton_of = attached_namespace(name);

        let parent = match singleton_of {
            Some(attached) => {
                let parent = self.singleton_parent(graph, attached, context);
                Some(self.linearize(graph, &parent, context))
            }
            None => self
                .superclass(graph, name, &data, context)
                .map(|superclass| self.linearize(graph, &superclass, context)),
        };

        let mut mixins: Vec<Mixin> = Vec::new();
        if let Some(attached) = singleton_of {
            // An `extend` on the attached namespace is an include on its singleton
            for attached_data in graph.namespace_data(attached) {
                mixins.extend(attached_data.extends.iter().map(Mixin::Include));
            }
        }
        for namespace in &data {
            mixins.extend(namespace.prepends.iter().map(Mixin::Prepend));
            mixins.extend(namespace.includes.iter().map(Mixin::Include));
        }

        let (prepends, includes) = self.linearize_mixins(graph, mixins, parent.as_deref(), context);

        let mut chain: Vec<String> = Vec::new();
        chain.extend(prepends);
        chain.push(name.to_string());
        chain.extend(includes);
        if let Some(parent) = parent {
            chain.extend(parent.iter().cloned());
        }

        context.in_progress.remove(name);
        let chain: Arc<[String]> = Arc::from(chain);
        if !context.cyclic {
            self.cache.insert(name.to_string(), Arc::clone(&chain));
        }
        chain
    }

    /// Later mixins take precedence over earlier ones. Included modules
    /// already present in the parent chain are left where they are.
    fn linearize_mixins<G: NamespaceGraph + ?Sized>(
        &self,
        graph: &G,
        mixins: Vec<Mixin<'_>>,
        parent: Option<&[String]>,
        context: &mut LinearizationContext,
    ) -> (VecDeque<String>, VecDeque<String>) {
        let mut prepends: VecDeque<String> = VecDeque::new();
        let mut includes: VecDeque<String> = VecDeque::new();

        for mixin in mixins {
            let Some(module) = graph.resolve_reference(mixin.reference(), self, context) else {
                continue;
            };
            let mut ids: Vec<String> = self.linearize(graph, &module, context).to_vec();

            let target = match mixin {
                Mixin::Prepend(_) => &mut prepends,
                Mixin::Include(_) => {
                    if let Some(parent) = parent {
                        ids.retain(|id| !parent.contains(id));
                    }
                    &mut includes
                }
            };

            // Re-including a module that is already in the list is a no-op
            if ids.iter().any(|id| !target.contains(id)) {
                target.retain(|id| !ids.contains(id));
                for id in ids.into_iter().rev() {
                    target.push_front(id);
                }
            }
        }

        (prepends, includes)
    }

    fn superclass<G: NamespaceGraph + ?Sized>(
        &self,
        graph: &G,
        name: &str,
        data: &[&NamespaceData],
        context: &mut LinearizationContext,
    ) -> Option<String> {
        if name == BASIC_OBJECT || name == OBJECT {
            return None;
        }

        match flavor(name, data) {
            Some(NamespaceFlavor::Module) => None,
            _ => {
                let explicit = data
                    .iter()
                    .filter_map(|namespace| namespace.superclass.as_ref())
                    .find_map(|reference| graph.resolve_reference(reference, self, context));
                match explicit {
                    Some(parent) => Some(parent),
                    None if name == CLASS => Some(MODULE.to_string()),
                    None => Some(OBJECT.to_string()),
                }
            }
        }
    }

    /// Parent of the singleton attached to `attached`.
    fn singleton_parent<G: NamespaceGraph + ?Sized>(
        &self,
        graph: &G,
        attached: &str,
        context: &mut LinearizationContext,
    ) -> String {
        if attached == OBJECT || attached == BASIC_OBJECT {
            return CLASS.to_string();
        }
        if is_singleton_name(attached) {
            return CLASS.to_string();
        }

        let data = graph.namespace_data(attached);
        match flavor(attached, &data) {
            Some(NamespaceFlavor::Module) => MODULE.to_string(),
            _ => {
                let superclass = self
                    .superclass(graph, attached, &data, context)
                    .unwrap_or_else(|| OBJECT.to_string());
                singleton_name(&superclass)
            }
        }
    }
}

/// A namespace is a class if any of its declarations says so.
fn flavor(name: &str, data: &[&NamespaceData]) -> Option<NamespaceFlavor> {
    if name == MODULE || name == CLASS {
        return Some(NamespaceFlavor::Class);
    }
    if data.iter().any(|namespace| namespace.is_class()) {
        return Some(NamespaceFlavor::Class);
    }
    data.iter().find_map(|namespace| namespace.flavor)
}

#[derive(Debug, Clone, Copy)]
enum Mixin<'d> {
    Prepend(&'d ConstantRef),
    Include(&'d ConstantRef),
}

impl<'d> Mixin<'d> {
    fn reference(&self) -> &'d ConstantRef {
        match self {
            Mixin::Prepend(reference) | Mixin::Include(reference) => reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Graph whose references are already qualified names.
    #[derive(Default)]
    struct TestGraph {
        namespaces: HashMap<String, Vec<NamespaceData>>,
    }

    impl TestGraph {
        fn class(mut self, name: &str, superclass: Option<&str>) -> Self {
            let reference = superclass.map(|s| ConstantRef::new(s, Vec::new()));
            self.namespaces
                .entry(name.to_string())
                .or_default()
                .push(NamespaceData::class(reference));
            self
        }

        fn module(mut self, name: &str) -> Self {
            self.namespaces
                .entry(name.to_string())
                .or_default()
                .push(NamespaceData::module());
            self
        }

        fn mixin(mut self, name: &str, kind: &str, module: &str) -> Self {
            let reference = ConstantRef::new(module, Vec::new());
            let entry = self.namespaces.entry(name.to_string()).or_default();
            if entry.is_empty() {
                entry.push(NamespaceData::default());
            }
            let data = entry.last_mut().unwrap();
            match kind {
                "include" => data.includes.push(reference),
                "prepend" => data.prepends.push(reference),
                _ => data.extends.push(reference),
            }
            self
        }
    }

    impl NamespaceGraph for TestGraph {
        fn namespace_data(&self, name: &str) -> Vec<&NamespaceData> {
            self.namespaces
                .get(name)
                .map(|data| data.iter().collect())
                .unwrap_or_default()
        }

        fn resolve_reference(
            &self,
            reference: &ConstantRef,
            _resolver: &AncestorResolver,
            _context: &mut LinearizationContext,
        ) -> Option<String> {
            self.namespaces
                .contains_key(&reference.name)
                .then(|| reference.name.clone())
        }
    }

    fn chain(resolver: &AncestorResolver, graph: &TestGraph, name: &str) -> Vec<String> {
        resolver.ancestors(graph, name).to_vec()
    }

    #[test]
    fn test_class_chain_ends_in_object() {
        let graph = TestGraph::default()
            .class("Parent", None)
            .class("Child", Some("Parent"));
        let resolver = AncestorResolver::new();

        assert_eq!(chain(&resolver, &graph, "Child"), vec!["Child", "Parent", "Object"]);
        assert_eq!(chain(&resolver, &graph, "Object"), vec!["Object"]);
    }

    #[test]
    fn test_modules_have_no_implicit_parent() {
        let graph = TestGraph::default().module("Foo");
        let resolver = AncestorResolver::new();

        assert_eq!(chain(&resolver, &graph, "Foo"), vec!["Foo"]);
    }

    #[test]
    fn test_prepends_and_includes_order() {
        let graph = TestGraph::default()
            .module("A")
            .module("B")
            .module("P")
            .class("Foo", None)
            .mixin("Foo", "include", "A")
            .mixin("Foo", "include", "B")
            .mixin("Foo", "prepend", "P");
        let resolver = AncestorResolver::new();

        assert_eq!(
            chain(&resolver, &graph, "Foo"),
            vec!["P", "Foo", "B", "A", "Object"]
        );
    }

    #[test]
    fn test_include_already_in_parent_chain_is_skipped() {
        let graph = TestGraph::default()
            .module("Shared")
            .class("Parent", None)
            .mixin("Parent", "include", "Shared")
            .class("Child", Some("Parent"))
            .mixin("Child", "include", "Shared");
        let resolver = AncestorResolver::new();

        assert_eq!(
            chain(&resolver, &graph, "Child"),
            vec!["Child", "Parent", "Shared", "Object"]
        );
    }

    #[test]
    fn test_singleton_chain_uses_extends_and_superclass_singleton() {
        let graph = TestGraph::default()
            .module("Helpers")
            .class("Parent", None)
            .class("Child", Some("Parent"))
            .mixin("Child", "extend", "Helpers");
        let resolver = AncestorResolver::new();

        assert_eq!(
            chain(&resolver, &graph, "Child::<Class:Child>"),
            vec![
                "Child::<Class:Child>",
                "Helpers",
                "Parent::<Class:Parent>",
                "Object::<Class:Object>",
                "Class",
                "Module",
                "Object",
            ]
        );
        // The instance side never sees the extension
        assert_eq!(chain(&resolver, &graph, "Child"), vec!["Child", "Parent", "Object"]);
    }

    #[test]
    fn test_module_singleton_parent_is_module() {
        let graph = TestGraph::default().module("Foo");
        let resolver = AncestorResolver::new();

        assert_eq!(
            chain(&resolver, &graph, "Foo::<Class:Foo>"),
            vec!["Foo::<Class:Foo>", "Module", "Object"]
        );
    }

    #[test]
    fn test_cycles_terminate_and_are_not_cached() {
        let graph = TestGraph::default()
            .module("A")
            .module("B")
            .mixin("A", "include", "B")
            .mixin("B", "include", "A");
        let resolver = AncestorResolver::new();

        let a = chain(&resolver, &graph, "A");
        assert_eq!(a, vec!["A", "B"]);
        assert_eq!(resolver.cached_len(), 0);

        let mut context = LinearizationContext::default();
        resolver.linearize(&graph, "B", &mut context);
        assert!(context.is_cyclic());
    }

    #[test]
    fn test_cache_and_invalidation() {
        let graph = TestGraph::default().class("Foo", None);
        let resolver = AncestorResolver::new();

        chain(&resolver, &graph, "Foo");
        assert!(resolver.cached_len() >= 2);

        resolver.invalidate_all();
        assert_eq!(resolver.cached_len(), 0);
    }
}
