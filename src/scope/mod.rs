//! # Variable scopes.
//!
//! - [`Scope`] layered global/local variable resolution shared across jobs
//! - [`Vars`] a set of variable bindings
//! - [`ProjectEnvironment`] project-level information carried by a scope
//!
//! ## Layering
//! ```text
//! Scope
//!   ├─ globals: [layer N] → [layer N-1] → ... → [layer 0]
//!   └─ locals:  [layer M] → ... → [layer 0]
//!
//! var(name):  locals (newest first) → globals (newest first)
//! ```
//!
//! Appending never mutates: it pushes a new `Arc` layer in front of the
//! existing chain and returns a new scope, so forks taken by concurrent jobs
//! never observe each other's bindings.

mod expand;
mod layers;
mod scope;

pub use scope::{ProjectEnvironment, Scope};

/// Variable bindings (name → value).
pub type Vars = std::collections::BTreeMap<String, String>;
