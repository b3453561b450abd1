//! Data source abstraction: typed pyramid accessors, converters to display colors, and the
//! composed level-ordering and cache-hint strategies.
//!
//! The chunked on-disk formats and the asynchronous cell cache live outside this crate; they
//! plug in by implementing [`Source`](access::Source) and [`VoxelGrid`](voxel::VoxelGrid).

/// Source accessor traits and strategies.
pub mod access;
/// Value-to-color converters.
pub mod converter;
/// In-memory image pyramid.
pub mod pyramid;
/// Voxel grids and interpolation.
pub mod voxel;
