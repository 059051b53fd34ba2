//! Interleaved vertex-layout description.
//!
//! A [`VertexLayout`] describes how attributes are packed inside one vertex
//! of an interleaved buffer. It is backend-agnostic: the raster backend turns
//! it into `vertex_attrib_pointer` calls, the device backend into a
//! `wgpu::VertexBufferLayout`.
//!
//! The layout is also the single source of truth for vertex counting:
//! `vertex_count(byte_len) = byte_len / stride`, used by both backends.

mod format;
mod layout;

pub use format::{AttributeFormat, VertexAttribute};
pub use layout::{LayoutError, VertexLayout};
