//! Optional extensions to the base arcball controller.

#[cfg(feature = "extension_pivot_indicator")]
pub mod pivot_indicator;
