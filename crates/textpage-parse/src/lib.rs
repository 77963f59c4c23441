//! PDF loading and content-stream interpretation for textpage-rs.
//!
//! This crate is the loader side of the pipeline: it opens documents
//! with [`lopdf`], resolves page geometry and resources, tokenizes and
//! interprets content streams, and feeds glyph events plus
//! marked-content notifications into the analysis core's page builder.
//!
//! # Layers
//!
//! - [`backend`] — document opening (passwords, pre-scan diagnostics),
//!   page tree access
//! - [`geometry`] — MediaBox, /Rotate and the base device transform
//! - [`tokenizer`] — content-stream lexing
//! - [`text_state`] — CTM stack and text matrices
//! - [`cmap`] / [`fonts`] — ToUnicode CMaps, encodings and widths, with
//!   the two process-wide mapping caches
//! - [`interpreter`] — operator execution emitting [`GlyphSink`] events

pub mod backend;
pub mod cmap;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod interpreter;
pub mod text_state;
pub mod tokenizer;

pub use backend::{LoadedDocument, open_bytes, open_file, page_content, page_geometry, page_resources};
pub use cmap::CMap;
pub use error::BackendError;
pub use fonts::{DecodedChar, FontWidths, LoadedFont};
pub use geometry::PageGeometry;
pub use interpreter::{GlyphSink, interpret_page};
pub use text_state::TextState;
pub use tokenizer::{Operand, Operator, tokenize};
