//! Workspace: open documents, file lifecycle and position requests
//!
//! The workspace owns the index and the parsed form of every open file.
//! Lifecycle events reindex one file at a time; position requests parse
//! nothing and run one dispatch over the stored tree.

use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::error::{IndexError, IndexResult};
use crate::hover::gems::{GemCatalog, register_gemfile_listener};
use crate::hover::register_hover_listeners;
use crate::indexing::{Index, NestingResolver};
use crate::parsing::{ParsedDocument, RubyParser};
use crate::response::ResponseBuilder;
use crate::types::{FileId, Position};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, info};

/// Extension point for contributing hover content.
///
/// Called once per request, after the built-in listeners are registered.
pub trait Addon: Send + Sync {
    fn name(&self) -> &str;

    fn register_hover_listeners<'a>(&'a self, dispatcher: &mut Dispatcher<'a>);
}

/// Identifies one in-flight request. Only the newest request per file may
/// publish a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    file_id: FileId,
    sequence: u64,
}

impl RequestTicket {
    pub fn file_id(&self) -> FileId {
        self.file_id
    }
}

pub struct Workspace {
    settings: Settings,
    index: Index,
    parser: Mutex<RubyParser>,
    documents: RwLock<HashMap<FileId, Arc<ParsedDocument>>>,
    file_ids: RwLock<HashMap<String, FileId>>,
    next_file_id: AtomicU32,
    latest_requests: DashMap<FileId, u64>,
    next_request: AtomicU64,
    addons: RwLock<Vec<Arc<dyn Addon>>>,
    gems: GemCatalog,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("open_documents", &self.documents.read().len())
            .field("index", &self.index.stats())
            .finish()
    }
}

impl Workspace {
    pub fn new(settings: Settings) -> IndexResult<Self> {
        Ok(Self {
            settings,
            index: Index::new(),
            parser: Mutex::new(RubyParser::new()?),
            documents: RwLock::new(HashMap::new()),
            file_ids: RwLock::new(HashMap::new()),
            next_file_id: AtomicU32::new(1),
            latest_requests: DashMap::new(),
            next_request: AtomicU64::new(1),
            addons: RwLock::new(Vec::new()),
            gems: GemCatalog::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Gem metadata shown when hovering dependencies in a Gemfile.
    pub fn gems(&self) -> &GemCatalog {
        &self.gems
    }

    /// Reads locked gem versions from a `Gemfile.lock` on disk.
    pub fn load_lockfile(&self, path: &Path) -> IndexResult<usize> {
        let (_, contents) = read_source(path)?;
        let count = self.gems.load_lockfile(&contents);
        info!("loaded {count} gems from {}", path.display());
        Ok(count)
    }

    pub fn register_addon(&self, addon: Arc<dyn Addon>) {
        info!("registered add-on '{}'", addon.name());
        self.addons.write().push(addon);
    }

    pub fn file_id(&self, uri: &str) -> Option<FileId> {
        self.file_ids.read().get(uri).copied()
    }

    pub fn document(&self, file_id: FileId) -> Option<Arc<ParsedDocument>> {
        self.documents.read().get(&file_id).cloned()
    }

    pub fn parse(&self, uri: &str, source: &str) -> IndexResult<ParsedDocument> {
        Ok(self.parser.lock().parse(uri, source)?)
    }

    /// Parses and opens `uri`, reusing its file id when it is already known.
    pub fn open(&self, uri: &str, source: &str) -> IndexResult<FileId> {
        let document = self.parse(uri, source)?;
        match self.file_id(uri) {
            Some(file_id) if self.is_open(file_id) => {
                self.on_file_changed(file_id, document)?;
                Ok(file_id)
            }
            Some(file_id) => {
                self.on_file_opened(file_id, document);
                Ok(file_id)
            }
            None => {
                let file_id = self.allocate_file_id()?;
                self.on_file_opened(file_id, document);
                Ok(file_id)
            }
        }
    }

    /// Indexes a file that is not open in an editor.
    pub fn index_source(&self, uri: &str, source: &str) -> IndexResult<FileId> {
        let document = self.parse(uri, source)?;
        let file_id = match self.file_id(uri) {
            Some(file_id) => file_id,
            None => self.allocate_file_id()?,
        };
        self.file_ids.write().insert(uri.to_string(), file_id);
        self.index.index_file(file_id, &document);
        Ok(file_id)
    }

    /// Reads and opens a file from disk.
    pub fn open_path(&self, path: &Path) -> IndexResult<FileId> {
        let (uri, source) = read_source(path)?;
        self.open(&uri, &source)
    }

    /// Reads and indexes a file from disk without opening it.
    pub fn index_path(&self, path: &Path) -> IndexResult<FileId> {
        let (uri, source) = read_source(path)?;
        self.index_source(&uri, &source)
    }

    pub fn on_file_opened(&self, file_id: FileId, document: ParsedDocument) {
        info!("opened {} as file {}", document.uri, file_id.value());
        self.store_document(file_id, document);
    }

    pub fn on_file_changed(&self, file_id: FileId, document: ParsedDocument) -> IndexResult<()> {
        if !self.is_open(file_id) {
            return Err(IndexError::FileNotFound { id: file_id });
        }
        debug!("reindexing {} after change", document.uri);
        self.store_document(file_id, document);
        Ok(())
    }

    /// Forgets the open buffer. Its declarations stay in the index.
    pub fn on_file_closed(&self, file_id: FileId) -> IndexResult<()> {
        let closed = self.documents.write().remove(&file_id);
        match closed {
            Some(document) => {
                self.latest_requests.remove(&file_id);
                info!("closed {}", document.uri);
                Ok(())
            }
            None => Err(IndexError::FileNotFound { id: file_id }),
        }
    }

    /// Drops the file from the workspace and its declarations from the index.
    pub fn on_file_deleted(&self, file_id: FileId) -> IndexResult<()> {
        self.documents.write().remove(&file_id);
        self.file_ids.write().retain(|_, id| *id != file_id);
        self.latest_requests.remove(&file_id);
        self.index.delete_file(file_id)?;
        Ok(())
    }

    /// Hover content for the given zero-based position, if any.
    pub fn resolve_at(&self, file_id: FileId, line: u32, column: u16) -> IndexResult<Option<String>> {
        let document = self
            .document(file_id)
            .ok_or(IndexError::FileNotFound { id: file_id })?;
        let ticket = self.begin_request(file_id);
        let position = Position::new(line, column);

        let nesting = NestingResolver::resolve(&document, position);
        let addons: Vec<Arc<dyn Addon>> = self.addons.read().clone();
        let mut builder = ResponseBuilder::new();
        {
            let mut dispatcher = Dispatcher::new();
            register_hover_listeners(&mut dispatcher, &self.settings.hover, document.strictness);
            register_gemfile_listener(&mut dispatcher, &self.gems);
            for addon in &addons {
                addon.register_hover_listeners(&mut dispatcher);
            }
            dispatcher.dispatch(&document, Some(position), &nesting, &self.index, &mut builder);
        }

        let rendered = builder.render();
        let result = (!rendered.is_empty()).then_some(rendered);
        Ok(self.finish_request(&ticket, result))
    }

    /// Starts a request for `file_id`, superseding any earlier one.
    pub fn begin_request(&self, file_id: FileId) -> RequestTicket {
        let sequence = self.next_request.fetch_add(1, Ordering::Relaxed);
        self.latest_requests.insert(file_id, sequence);
        RequestTicket { file_id, sequence }
    }

    /// Returns `result` only while `ticket` is still the newest request for
    /// its file.
    pub fn finish_request(&self, ticket: &RequestTicket, result: Option<String>) -> Option<String> {
        let current = self
            .latest_requests
            .get(&ticket.file_id)
            .is_some_and(|latest| *latest == ticket.sequence);
        if !current {
            debug!(
                "request {} for file {} superseded, dropping result",
                ticket.sequence,
                ticket.file_id.value()
            );
            return None;
        }
        result
    }

    fn is_open(&self, file_id: FileId) -> bool {
        self.documents.read().contains_key(&file_id)
    }

    fn store_document(&self, file_id: FileId, document: ParsedDocument) {
        self.index.index_file(file_id, &document);
        self.file_ids.write().insert(document.uri.clone(), file_id);
        self.documents.write().insert(file_id, Arc::new(document));
    }

    fn allocate_file_id(&self) -> IndexResult<FileId> {
        let value = self.next_file_id.fetch_add(1, Ordering::Relaxed);
        FileId::new(value).ok_or(IndexError::FileIdExhausted)
    }
}

/// `file://` URI for `path`, made absolute when the path exists.
pub fn path_to_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn read_source(path: &Path) -> IndexResult<(String, String)> {
    let source = std::fs::read_to_string(path).map_err(|source| IndexError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((path_to_uri(path), source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn workspace() -> Workspace {
        Workspace::new(Settings::default()).unwrap()
    }

    #[test]
    fn test_open_reuses_file_id() {
        let ws = workspace();
        let first = ws.open("file:///a.rb", "class A; end\n").unwrap();
        let second = ws.open("file:///a.rb", "class B; end\n").unwrap();

        assert_eq!(first, second);
        assert!(ws.index().resolve("A").is_empty());
        assert_eq!(ws.index().resolve("B").len(), 1);
    }

    #[test]
    fn test_close_keeps_declarations() {
        let ws = workspace();
        let id = ws.open("file:///a.rb", "class A; end\n").unwrap();
        ws.on_file_closed(id).unwrap();

        assert!(ws.document(id).is_none());
        assert_eq!(ws.index().resolve("A").len(), 1);
        assert!(matches!(
            ws.resolve_at(id, 0, 6),
            Err(IndexError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_removes_declarations() {
        let ws = workspace();
        let id = ws.open("file:///a.rb", "class A; end\n").unwrap();
        ws.on_file_deleted(id).unwrap();

        assert!(ws.index().resolve("A").is_empty());
        assert!(ws.file_id("file:///a.rb").is_none());
        assert!(ws.on_file_deleted(id).is_err());
    }

    #[test]
    fn test_change_requires_open_file() {
        let ws = workspace();
        let doc = ws.parse("file:///a.rb", "A = 1\n").unwrap();
        let unknown = FileId::new(42).unwrap();
        assert!(matches!(
            ws.on_file_changed(unknown, doc),
            Err(IndexError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_superseded_request_yields_nothing() {
        let ws = workspace();
        let id = ws.open("file:///a.rb", "A = 1\n").unwrap();

        let stale = ws.begin_request(id);
        let fresh = ws.begin_request(id);

        assert_eq!(ws.finish_request(&stale, Some("old".to_string())), None);
        assert_eq!(
            ws.finish_request(&fresh, Some("new".to_string())).as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_resolve_at_unknown_file() {
        let ws = workspace();
        let result = ws.resolve_at(FileId::new(7).unwrap(), 0, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_path_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# Stored on disk\nclass Disk\nend").unwrap();

        let ws = workspace();
        let id = ws.open_path(file.path()).unwrap();

        let uri = path_to_uri(file.path());
        assert_eq!(ws.file_id(&uri), Some(id));
        assert_eq!(ws.index().resolve("Disk")[0].documentation, "Stored on disk");
    }

    #[test]
    fn test_missing_path_is_a_read_error() {
        let ws = workspace();
        let result = ws.index_path(Path::new("/nonexistent/ruby-insight/missing.rb"));
        assert!(matches!(result, Err(IndexError::FileRead { .. })));
    }

    #[test]
    fn test_load_lockfile_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GEM\n  specs:\n    rake (13.2.1)\n").unwrap();

        let ws = workspace();
        assert_eq!(ws.load_lockfile(file.path()).unwrap(), 1);
        assert_eq!(ws.gems().get("rake").unwrap().version, "13.2.1");
        assert!(matches!(
            ws.load_lockfile(Path::new("/nonexistent/Gemfile.lock")),
            Err(IndexError::FileRead { .. })
        ));
    }
}
