//! Single-pass event dispatch over a syntax tree
//!
//! Every listener registers for a set of node kinds. One depth-first walk
//! fires `enter` on each matching node in registration order, visits the
//! children, then fires `leave` in reverse order. Requests at a position
//! skip every subtree that does not contain it.

use crate::dispatch::listener::{FnListener, Listener, ListenerContext};
use crate::error::{ListenerError, ListenerResult};
use crate::indexing::{Index, NestingContext};
use crate::parsing::ParsedDocument;
use crate::response::ResponseBuilder;
use crate::types::{Position, Range};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};
use tree_sitter::Node;

/// Identifies one registration within a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(usize);

struct Registration<'a> {
    listener: Box<dyn Listener + 'a>,
    kinds: Vec<String>,
    enabled: bool,
    faulted: bool,
}

#[derive(Default)]
pub struct Dispatcher<'a> {
    registrations: Vec<Registration<'a>>,
}

impl std::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .registrations
            .iter()
            .map(|registration| registration.listener.name())
            .collect();
        f.debug_struct("Dispatcher").field("listeners", &names).finish()
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kinds: &[&str], listener: impl Listener + 'a) -> ListenerHandle {
        self.register_boxed(kinds, Box::new(listener))
    }

    pub fn register_boxed(
        &mut self,
        kinds: &[&str],
        listener: Box<dyn Listener + 'a>,
    ) -> ListenerHandle {
        let handle = ListenerHandle(self.registrations.len());
        debug!("registered listener '{}' for {kinds:?}", listener.name());
        self.registrations.push(Registration {
            listener,
            kinds: kinds.iter().map(|kind| kind.to_string()).collect(),
            enabled: true,
            faulted: false,
        });
        handle
    }

    /// Registers a closure that runs when entering nodes of `kinds`.
    pub fn register_fn<F>(&mut self, name: &str, kinds: &[&str], callback: F) -> ListenerHandle
    where
        F: FnMut(Node<'_>, &mut ListenerContext<'_>) -> ListenerResult<()> + 'a,
    {
        self.register(kinds, FnListener::new(name, callback))
    }

    /// Turns a registration on or off. Disabled listeners receive no events.
    pub fn set_enabled(&mut self, handle: ListenerHandle, enabled: bool) {
        if let Some(registration) = self.registrations.get_mut(handle.0) {
            registration.enabled = enabled;
        }
    }

    pub fn is_enabled(&self, handle: ListenerHandle) -> bool {
        self.registrations
            .get(handle.0)
            .is_some_and(|registration| registration.enabled)
    }

    /// True once the listener failed during a dispatch.
    pub fn is_faulted(&self, handle: ListenerHandle) -> bool {
        self.registrations
            .get(handle.0)
            .is_some_and(|registration| registration.faulted)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Walks `document` once, feeding every registered listener.
    pub fn dispatch(
        &mut self,
        document: &ParsedDocument,
        position: Option<Position>,
        nesting: &NestingContext,
        index: &Index,
        builder: &mut ResponseBuilder,
    ) {
        let mut table: HashMap<String, Vec<usize>> = HashMap::new();
        for (slot, registration) in self.registrations.iter().enumerate() {
            for kind in &registration.kinds {
                table.entry(kind.clone()).or_default().push(slot);
            }
        }

        let mut walk = Walk {
            registrations: &mut self.registrations,
            table: &table,
            builder,
            nesting,
            document,
            index,
            position,
        };
        walk.visit(document.root());
        walk.builder.set_node_range(None);
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Enter,
    Leave,
}

struct Walk<'w, 'a> {
    registrations: &'w mut Vec<Registration<'a>>,
    table: &'w HashMap<String, Vec<usize>>,
    builder: &'w mut ResponseBuilder,
    nesting: &'w NestingContext,
    document: &'w ParsedDocument,
    index: &'w Index,
    position: Option<Position>,
}

impl Walk<'_, '_> {
    fn visit(&mut self, node: Node) {
        let range = Range::from_node(&node);
        if let Some(position) = self.position {
            if !range.contains_position(position) {
                return;
            }
        }

        let table = self.table;
        let slots = table.get(node.kind());

        if let Some(slots) = slots {
            self.builder.set_node_range(Some(range));
            for &slot in slots {
                self.invoke(slot, node, Phase::Enter);
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }

        if let Some(slots) = slots {
            self.builder.set_node_range(Some(range));
            for &slot in slots.iter().rev() {
                self.invoke(slot, node, Phase::Leave);
            }
        }
    }

    fn invoke(&mut self, slot: usize, node: Node, phase: Phase) {
        let registration = &mut self.registrations[slot];
        if !registration.enabled || registration.faulted {
            return;
        }

        let snapshot = self.builder.clone();
        self.builder.set_source(Some(slot));

        let listener = &mut registration.listener;
        let mut context = ListenerContext {
            builder: &mut *self.builder,
            nesting: self.nesting,
            document: self.document,
            index: self.index,
            position: self.position,
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match phase {
            Phase::Enter => listener.enter(node, &mut context),
            Phase::Leave => listener.leave(node, &mut context),
        }));
        self.builder.set_source(None);

        let error = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(payload) => ListenerError::Panicked {
                listener: registration.listener.name().to_string(),
                node_kind: node.kind().to_string(),
                message: panic_message(payload.as_ref()),
            },
        };

        warn!("{error}; listener disabled for this request");
        *self.builder = snapshot;
        self.builder.discard_source(slot);
        registration.faulted = true;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::RubyParser;
    use crate::response::Category;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn parse(source: &str) -> ParsedDocument {
        RubyParser::new()
            .unwrap()
            .parse("file:///test.rb", source)
            .unwrap()
    }

    fn run(dispatcher: &mut Dispatcher<'_>, doc: &ParsedDocument, position: Option<Position>) -> ResponseBuilder {
        let index = Index::new();
        let nesting = NestingContext::default();
        let mut builder = ResponseBuilder::new();
        dispatcher.dispatch(doc, position, &nesting, &index, &mut builder);
        builder
    }

    #[test]
    fn test_enter_in_order_leave_in_reverse() {
        let doc = parse("Foo\n");
        let events = Rc::new(RefCell::new(Vec::new()));

        struct Recorder {
            name: &'static str,
            events: Rc<RefCell<Vec<String>>>,
        }

        impl Listener for Recorder {
            fn name(&self) -> &str {
                self.name
            }

            fn enter(&mut self, _node: Node<'_>, _context: &mut ListenerContext<'_>) -> ListenerResult<()> {
                self.events.borrow_mut().push(format!("enter {}", self.name));
                Ok(())
            }

            fn leave(&mut self, _node: Node<'_>, _context: &mut ListenerContext<'_>) -> ListenerResult<()> {
                self.events.borrow_mut().push(format!("leave {}", self.name));
                Ok(())
            }
        }

        let mut dispatcher = Dispatcher::new();
        for name in ["a", "b"] {
            dispatcher.register(
                &["constant"],
                Recorder {
                    name,
                    events: Rc::clone(&events),
                },
            );
        }
        run(&mut dispatcher, &doc, None);

        assert_eq!(
            *events.borrow(),
            vec!["enter a", "enter b", "leave b", "leave a"]
        );
    }

    #[test]
    fn test_single_traversal_visits_each_node_once() {
        let doc = parse("A\nB\nC\n");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register_fn("collect", &["constant"], move |node, context| {
            sink.borrow_mut().push(context.text(node).to_string());
            Ok(())
        });
        run(&mut dispatcher, &doc, None);

        assert_eq!(*seen.borrow(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_position_prunes_other_subtrees() {
        let doc = parse("A\nB\nC\n");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register_fn("collect", &["constant"], move |node, context| {
            sink.borrow_mut().push(context.text(node).to_string());
            Ok(())
        });
        run(&mut dispatcher, &doc, Some(Position::new(1, 0)));

        assert_eq!(*seen.borrow(), vec!["B"]);
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let doc = parse("A\nB\n");
        let mut dispatcher = Dispatcher::new();

        let good = dispatcher.register_fn("good", &["constant"], |node, context| {
            let text = context.text(node).to_string();
            context.push(Category::Title, text);
            Ok(())
        });
        let bad = dispatcher.register_fn("bad", &["constant"], |node, context| {
            context.push(Category::Documentation, "partial");
            Err(ListenerError::failed("bad", node.kind(), "boom"))
        });

        let builder = run(&mut dispatcher, &doc, None);

        assert_eq!(builder.render(), "A\n\nB");
        assert!(dispatcher.is_faulted(bad));
        assert!(!dispatcher.is_faulted(good));
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let doc = parse("A\n");
        let mut dispatcher = Dispatcher::new();

        dispatcher.register_fn("first", &["constant"], |_node, context| {
            context.push(Category::Title, "kept");
            Ok(())
        });
        let bad = dispatcher.register_fn("panics", &["constant"], |_node, context| {
            context.push(Category::Links, "lost");
            panic!("listener bug");
        });

        let builder = run(&mut dispatcher, &doc, None);

        assert_eq!(builder.render(), "kept");
        assert!(dispatcher.is_faulted(bad));
    }

    #[test]
    fn test_disabled_registration_gets_no_events() {
        let doc = parse("A\n");
        let mut dispatcher = Dispatcher::new();
        let handle = dispatcher.register_fn("gated", &["constant"], |_node, context| {
            context.push(Category::Title, "should not appear");
            Ok(())
        });
        dispatcher.set_enabled(handle, false);

        let builder = run(&mut dispatcher, &doc, None);
        assert!(builder.is_empty());
        assert!(!dispatcher.is_enabled(handle));
    }
}
