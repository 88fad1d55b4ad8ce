/// Code intelligence core for Ruby: declaration index, ancestor
/// linearization, single-pass listener dispatch and hover.
pub mod config;
pub mod declaration;
pub mod dispatch;
pub mod error;
pub mod hover;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod response;
pub mod storage;
pub mod types;
pub mod workspace;

// Explicit exports for better API clarity
pub use config::Settings;
pub use declaration::{Declaration, Visibility};
pub use dispatch::{Dispatcher, Listener, ListenerContext, ListenerHandle};
pub use error::{
    IndexError, IndexResult, ListenerError, ListenerResult, ParseError, ParseResult,
};
pub use hover::gems::{GemCatalog, GemSpec};
pub use indexing::{Index, IndexStats};
pub use parsing::{DocumentLanguage, ParsedDocument, RubyParser, Strictness};
pub use response::{Category, ResponseBuilder};
pub use types::{
    CompactString, DeclarationId, DeclarationKind, FileId, Position, Range, compact_string,
};
pub use workspace::{Addon, RequestTicket, Workspace};
