//! Prism engine crate.
//!
//! A minimal cross-backend render-pipeline abstraction:
//! - describe an interleaved vertex layout (`vertex`)
//! - compile a shader pair into a pipeline on one of two backends (`pipeline`)
//! - upload vertex data and draw an ordered list of pipelines (`render`)
//!
//! Window/surface setup, adapter acquisition, and the frame loop are owned by
//! the embedding application; this crate only consumes contexts built there.

pub mod logging;
pub mod vertex;
pub mod pipeline;
pub mod render;
