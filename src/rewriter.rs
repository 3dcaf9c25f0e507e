//! Turning a GZDoom shader into a standalone fragment shader for the viewer.
//!
//! The generated file starts with a fixed prefix:
//!
//! ```glsl
//! #version 120
//! #define TEXTURE_SHADER
//! #define SPEED 2.0
//! uniform sampler2D u_tex1;
//! #define detail u_tex1
//! uniform vec3 uObjectColor = vec3(1.0, 1.0, 1.0);
//! #include "/path/to/gzdoom_compat.glsl"
//! ```
//!
//! followed by the original source, with the texture coordinate input,
//! the `ProcessTexel` entry point and the `timer` uniform adjusted to what the
//! compatibility shim provides.

use std::io::Write;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::{PreviewError, ShaderDefinition};

/// Compatibility shim shipped with the crate
pub const BUNDLED_SHIM: &str = include_str!("../shaders/gzdoom_compat.glsl");

const BUNDLED_SHIM_FILE_NAME: &str = "gzdoom_compat.glsl";
const GENERATED_PREFIX: &str = "gldefs-preview-";
const GENERATED_SUFFIX: &str = ".frag";

lazy_static::lazy_static! {
    static ref TEXCOORD_RE: Regex = Regex::new(r"\bvTexCoord\b").unwrap();
    static ref PROCESS_TEXEL_RE: Regex = Regex::new(r"\bvec4\s+ProcessTexel\s*\(\s*\)").unwrap();
    static ref TIMER_RE: Regex = Regex::new(r"^\s*uniform\s+float\s+timer\s*;\s*$").unwrap();
}

const TEXCOORD_REPLACEMENT: &str = "v_texcoord";
const PROCESS_REPLACEMENT: &str = "vec4 Process(vec4 color)";

#[derive(Clone, Debug)]
pub struct RewriteOptions {
    /// Value of the `#version` pragma
    pub glsl_version: String,

    /// Compatibility shim, included by path from the generated shader
    pub shim: PathBuf,
}

impl RewriteOptions {
    pub fn new(shim: impl Into<PathBuf>) -> Self {
        RewriteOptions {
            glsl_version: "120".to_owned(),
            shim: shim.into(),
        }
    }

    /// Write [`BUNDLED_SHIM`] into a per-user temp directory and use it.
    pub fn with_bundled_shim() -> Result<Self, PreviewError> {
        let dir = std::env::temp_dir().join("gldefs-preview");
        std::fs::create_dir_all(&dir).map_err(|e| PreviewError::io(&dir, e))?;

        let shim = dir.join(BUNDLED_SHIM_FILE_NAME);
        std::fs::write(&shim, BUNDLED_SHIM).map_err(|e| PreviewError::io(&shim, e))?;

        Ok(RewriteOptions::new(shim))
    }
}

/// Apply the line substitutions to a single source line. Returns `None` for
/// lines that are dropped.
fn rewrite_line(line: &str) -> Option<String> {
    if TIMER_RE.is_match(line) {
        return None;
    }

    let line = TEXCOORD_RE.replace_all(line, TEXCOORD_REPLACEMENT);
    let line = PROCESS_TEXEL_RE.replace_all(&line, PROCESS_REPLACEMENT);
    Some(line.into_owned())
}

/// Build the text of the generated shader from the definition and its source.
pub fn render_shader(definition: &ShaderDefinition, source: &str, options: &RewriteOptions) -> String {
    let mut out = String::with_capacity(source.len() + 512);

    out.push_str(&format!("#version {}\n", options.glsl_version));
    out.push_str(&format!("#define {}\n", definition.kind.feature_define()));
    out.push_str(&format!("#define SPEED {:?}\n", definition.speed));

    for (i, (name, _)) in definition.textures.iter().enumerate() {
        let sampler = format!("u_tex{}", i + 1);
        out.push_str(&format!("uniform sampler2D {};\n", sampler));
        out.push_str(&format!("#define {} {}\n", name, sampler));
    }

    for uniform in &definition.uniforms {
        out.push_str(&uniform.declaration());
        out.push('\n');
    }

    out.push_str(&format!("#include \"{}\"\n", options.shim.display()));

    for line in source.lines().filter_map(rewrite_line) {
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// Generate the standalone shader for `definition` into a fresh temporary
/// file. The definition owns the file until [`ShaderDefinition::cleanup`]
/// is called or it is dropped.
pub fn rewrite<'d>(
    definition: &'d mut ShaderDefinition,
    options: &RewriteOptions,
) -> Result<&'d Path, PreviewError> {
    definition.cleanup();

    let source =
        std::fs::read(&definition.shader).map_err(|e| PreviewError::io(&definition.shader, e))?;
    let text = render_shader(definition, &String::from_utf8_lossy(&source), options);

    let temp_dir = std::env::temp_dir();
    let mut file = tempfile::Builder::new()
        .prefix(GENERATED_PREFIX)
        .suffix(GENERATED_SUFFIX)
        .tempfile()
        .map_err(|e| PreviewError::io(&temp_dir, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| PreviewError::io(file.path(), e))?;

    let path = file.into_temp_path();
    log::debug!(
        "generated {} for {:?}",
        path.display(),
        definition.identifier
    );

    Ok(&**definition.generated.insert(path))
}
