//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pages ──▶ render ──▶ save
//! (path/bytes) (parse+group) (rasterizer) (label+encode)
//! ```
//!
//! 1. [`input`]  describe and validate the document source
//! 2. [`pages`]  parse the page-range expression, group it into runs
//! 3. [`render`] rasterise one run per call through the [`render::Rasterizer`] seam
//! 4. [`save`]   map images back to page numbers and write the files

pub mod input;
pub mod pages;
pub mod render;
pub mod save;
