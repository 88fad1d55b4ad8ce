//! Response accumulation for position requests

pub mod builder;

pub use builder::{Category, ResponseBuilder};
