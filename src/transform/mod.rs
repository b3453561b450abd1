//! Stateless transform pipeline: source -> global -> viewer -> screen composition and the
//! voxel footprint estimate that drives mipmap level selection.

/// Composition helpers and mipmap level selection.
pub mod pipeline;
