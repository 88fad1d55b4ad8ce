//! Event dispatch over parsed documents

pub mod dispatcher;
pub mod gate;
pub mod listener;

pub use dispatcher::{Dispatcher, ListenerHandle};
pub use gate::StrictnessGate;
pub use listener::{FnListener, Listener, ListenerContext};
