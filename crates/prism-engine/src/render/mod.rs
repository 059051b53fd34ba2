//! Frame submission across pipelines.
//!
//! [`Renderer`] owns an ordered list of pipelines and drives one draw per
//! pipeline per call. Submission order is part of the contract: for
//! overlapping geometry, later pipelines draw over earlier ones.

mod renderer;

pub use renderer::Renderer;
