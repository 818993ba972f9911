// src/model/mod.rs
//! The crawl result: one merged tree of resource nodes.

mod node;

pub use node::{Outcome, ResourceNode};
