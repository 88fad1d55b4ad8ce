use crate::error::ListenerResult;
use crate::indexing::{Index, NestingContext};
use crate::parsing::ParsedDocument;
use crate::response::{Category, ResponseBuilder};
use crate::types::Position;
use tree_sitter::Node;

/// Everything a listener sees while handling one node.
pub struct ListenerContext<'r> {
    pub builder: &'r mut ResponseBuilder,
    pub nesting: &'r NestingContext,
    pub document: &'r ParsedDocument,
    pub index: &'r Index,
    pub position: Option<Position>,
}

impl ListenerContext<'_> {
    pub fn push(&mut self, category: Category, text: impl Into<String>) {
        self.builder.push(category, text);
    }

    pub fn text(&self, node: Node) -> &str {
        &self.document.source[node.byte_range()]
    }
}

/// Reacts to nodes of the kinds it was registered for.
///
/// `enter` fires before a node's children are visited and `leave` after.
/// Returning an error, or panicking, disables the listener for the rest of
/// the request and discards what it pushed.
pub trait Listener {
    fn name(&self) -> &str;

    fn enter(&mut self, node: Node<'_>, context: &mut ListenerContext<'_>) -> ListenerResult<()>;

    fn leave(&mut self, _node: Node<'_>, _context: &mut ListenerContext<'_>) -> ListenerResult<()> {
        Ok(())
    }
}

/// Adapts a closure into an enter-only listener.
pub struct FnListener<F> {
    name: String,
    callback: F,
}

impl<F> FnListener<F>
where
    F: FnMut(Node<'_>, &mut ListenerContext<'_>) -> ListenerResult<()>,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> Listener for FnListener<F>
where
    F: FnMut(Node<'_>, &mut ListenerContext<'_>) -> ListenerResult<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn enter(&mut self, node: Node<'_>, context: &mut ListenerContext<'_>) -> ListenerResult<()> {
        (self.callback)(node, context)
    }
}
