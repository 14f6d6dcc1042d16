//! # Import Model
//!
//! The minimal object model the import pipeline writes into.
//!
//! - **`item`**: identities, row items and containers
//! - **`structure`**: edges, structures and the [`StructureBuilder`] collaborator
//! - **`output`**: write-behind sinks and annotation storage

pub mod item;
pub mod output;
pub mod structure;

pub use item::{Container, ContainerType, Item, ItemId, LayerHandle, Member};
pub use output::{AnnotationStore, ImportOutput, LayerBuffer, Value, WriteSink};
pub use structure::{Edge, Node, Structure, StructureBuilder, StructureError};
