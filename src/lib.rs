//! **gldefs-preview** shows GZDoom hardware shaders in an external shader
//! viewer, without starting the engine.
//!
//! The pipeline has four stages:
//!
//! 1. [`LumpIndex::build`] indexes a mod directory by short lump name and by
//!    relative path.
//! 2. [`parse_definitions`] merges the mod's GLDEFS lumps, expands their
//!    `#include`s, strips comments and turns every `hardwareshader` block
//!    into a [`ShaderDefinition`].
//! 3. [`rewrite`] turns a definition's shader source into a standalone
//!    fragment shader in a temporary file, built on a compatibility shim.
//! 4. [`build_args`] and [`invoke`] run the viewer on it; [`view`] does
//!    stages 3 and 4 and removes the temporary file afterwards.
//!
//! Definitions that cannot be resolved are logged and skipped, so a mod with
//! a few broken blocks still yields everything else.
//!
//! # Example
//!
//! ```no_run
//! use gldefs_preview::{locate_viewer, view, RewriteOptions, Session, ViewerConfig};
//!
//! let mut session = Session::load("path/to/mod")?;
//! let viewer = ViewerConfig::new(locate_viewer("glslViewer")?);
//! let options = RewriteOptions::with_bundled_shim()?;
//!
//! if let Some(definition) = session.find_mut("brick1") {
//!     view(definition, &options, &viewer, None)?;
//! }
//! # Ok::<(), gldefs_preview::PreviewError>(())
//! ```

mod definition;
mod error;
mod gldefs;
mod include_provider;
mod lump_index;
mod rewriter;
mod scanner;
mod session;
mod uniform;
mod viewer;

pub use definition::{ShaderDefinition, ShaderKind};
pub use error::*;
pub use gldefs::{merged_gldefs, parse_definitions, parse_definitions_from_text, GLDEFS};
pub use include_provider::*;
pub use lump_index::{normalize_path, short_name, Lump, LumpIndex};
pub use rewriter::{render_shader, rewrite, RewriteOptions, BUNDLED_SHIM};
pub use scanner::{expand_includes, strip_comments};
pub use session::Session;
pub use uniform::{ShaderUniform, UniformType, UniformValue};
pub use viewer::{
    build_args, invoke, locate_viewer, view, ViewerConfig, DEFAULT_VIEWER, FLIP_FLAG,
};
