//! Receiver typing for method calls
//!
//! Without type information the receiver of `user.name` is unknown. Constant
//! receivers and `Foo.new` are typed exactly; anything else may be guessed
//! from its name when exactly one namespace in the index fits.

use crate::declaration::singleton_name;
use crate::dispatch::ListenerContext;
use crate::parsing::ruby::names::{self, camelize};
use tracing::debug;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverType {
    /// The receiver is known to be an instance of this namespace
    Known(String),
    /// Inferred from the receiver's name
    Guessed(String),
    Unknown,
}

pub fn receiver_type(
    receiver: Node,
    method: &str,
    context: &ListenerContext<'_>,
    allow_guess: bool,
) -> ReceiverType {
    let source = context.document.source.as_str();
    let nesting = &context.nesting.namespaces;

    match receiver.kind() {
        "self" => ReceiverType::Known(context.nesting.self_type.clone()),
        "constant" | "scope_resolution" => names::constant_path(receiver, source)
            .and_then(|path| context.index.resolve_constant_path(&path, nesting))
            .map(|namespace| ReceiverType::Known(singleton_name(&namespace)))
            .unwrap_or(ReceiverType::Unknown),
        "call" => {
            let inner_method = receiver
                .child_by_field_name("method")
                .map(|node| names::node_text(node, source));
            let inner_receiver = receiver.child_by_field_name("receiver");

            if let (Some("new"), Some(class)) = (inner_method, inner_receiver) {
                if let Some(namespace) = names::constant_path(class, source)
                    .and_then(|path| context.index.resolve_constant_path(&path, nesting))
                {
                    return ReceiverType::Known(namespace);
                }
            }
            match inner_method {
                Some(name) if allow_guess => guess(name, method, context),
                _ => ReceiverType::Unknown,
            }
        }
        "identifier" | "instance_variable" if allow_guess => {
            guess(names::node_text(receiver, source), method, context)
        }
        _ => ReceiverType::Unknown,
    }
}

/// `user` guesses `User`, `@post_comment` guesses `PostComment`. The guess
/// only counts when exactly one namespace of that name defines `method`.
fn guess(name: &str, method: &str, context: &ListenerContext<'_>) -> ReceiverType {
    let candidate = camelize(name);
    if candidate.is_empty() {
        return ReceiverType::Unknown;
    }

    let matches: Vec<String> = context
        .index
        .namespaces_named(&candidate)
        .into_iter()
        .filter(|namespace| !context.index.resolve_method(namespace, method).is_empty())
        .collect();

    match matches.as_slice() {
        [only] => ReceiverType::Guessed(only.clone()),
        _ => {
            debug!(
                "no unique receiver guess for {name}.{method} ({} candidates)",
                matches.len()
            );
            ReceiverType::Unknown
        }
    }
}
