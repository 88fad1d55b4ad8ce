use crate::declaration::Declaration;
use crate::{DeclarationId, DeclarationKind, FileId};
use std::collections::HashMap;

/// Append-only declaration table keyed by qualified name.
///
/// Reopened namespaces and redefined methods each add another declaration
/// under the same key; nothing is ever overwritten in place. The only way
/// declarations leave the store is by removing the whole file they came from.
#[derive(Debug, Clone, Default)]
pub struct DeclarationStore {
    declarations: HashMap<DeclarationId, Declaration>,
    by_qualified: HashMap<String, Vec<DeclarationId>>,
    by_file: HashMap<FileId, Vec<DeclarationId>>,
}

impl DeclarationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, declaration: Declaration) -> DeclarationId {
        let id = declaration.id;
        let key = declaration.qualified_name();
        let file_id = declaration.file_id;

        self.declarations.insert(id, declaration);
        self.by_qualified.entry(key).or_default().push(id);
        self.by_file.entry(file_id).or_default().push(id);

        id
    }

    /// Swaps every declaration of `file_id` for `declarations`.
    ///
    /// Callers hold the index write lock across this call, so readers see
    /// either the old batch or the new one. Returns how many declarations
    /// were dropped.
    pub fn replace_file(
        &mut self,
        file_id: FileId,
        declarations: impl IntoIterator<Item = Declaration>,
    ) -> usize {
        let removed = self.remove_file(file_id).len();
        // Keep an entry so the file still counts as indexed when it declares nothing.
        self.by_file.entry(file_id).or_default();
        for declaration in declarations {
            self.insert(declaration);
        }
        removed
    }

    pub fn remove_file(&mut self, file_id: FileId) -> Vec<Declaration> {
        let Some(ids) = self.by_file.remove(&file_id) else {
            return Vec::new();
        };

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(declaration) = self.declarations.remove(&id) {
                let key = declaration.qualified_name();
                if let Some(entries) = self.by_qualified.get_mut(&key) {
                    entries.retain(|&other| other != id);
                    if entries.is_empty() {
                        self.by_qualified.remove(&key);
                    }
                }
                removed.push(declaration);
            }
        }
        removed
    }

    pub fn get(&self, id: DeclarationId) -> Option<&Declaration> {
        self.declarations.get(&id)
    }

    /// All declarations filed under `qualified_name`, oldest first.
    pub fn find(&self, qualified_name: &str) -> Vec<&Declaration> {
        self.by_qualified
            .get(qualified_name)
            .map(|ids| ids.iter().filter_map(|id| self.declarations.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.by_qualified.contains_key(qualified_name)
    }

    pub fn find_by_file(&self, file_id: FileId) -> Vec<&Declaration> {
        self.by_file
            .get(&file_id)
            .map(|ids| ids.iter().filter_map(|id| self.declarations.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every declaration of `kind` whose unqualified name is `name`, in id order.
    pub fn find_by_name(&self, kind: DeclarationKind, name: &str) -> Vec<&Declaration> {
        let mut found: Vec<&Declaration> = self
            .declarations
            .values()
            .filter(|decl| decl.kind == kind && &*decl.name == name)
            .collect();
        found.sort_by_key(|decl| decl.id);
        found
    }

    pub fn has_file(&self, file_id: FileId) -> bool {
        self.by_file.contains_key(&file_id)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> + '_ {
        self.declarations.values()
    }
}
