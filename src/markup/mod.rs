//! Markup access helpers
//!
//! Extractors never touch `scraper` element handles directly. They go through
//! [`Node`], whose queries are total: looking for something that isn't there
//! yields an absent node, empty text or `None`. The few places where absence
//! is a real failure call [`Node::require`] explicitly.

mod node;

pub use node::Node;
