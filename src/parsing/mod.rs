pub mod context;
pub mod parser;
pub mod ruby;
pub mod sigil;

pub use context::{ParserContext, Scope, ScopeType};
pub use parser::{DocumentLanguage, ParsedDocument, RubyParser};
pub use sigil::Strictness;
