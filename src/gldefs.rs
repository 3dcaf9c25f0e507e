//! Parsing `hardwareshader` blocks out of a mod's GLDEFS lumps.
//!
//! The grammar is matched with regular expressions over the whole merged
//! text, the same shallow way the engine's definition files are usually
//! read by tools:
//!
//! * a block runs from the first `{` after its header to the first `}` that
//!   follows, so nested braces inside a block cut it short;
//! * `#include` expansion is a single pass, so includes inside included
//!   lumps are left as they are.
//!
//! Blocks that cannot be used are logged and skipped; the rest of the text is
//! still parsed.

use regex::{Captures, Regex};

use crate::scanner::{expand_includes, strip_comments};
use crate::{LumpIndex, PreviewError, ShaderDefinition, ShaderKind, ShaderUniform, UniformType};

/// Short lump name of definition files
pub const GLDEFS: &str = "gldefs";

// A double-quoted string (escapes allowed) or a run of non-whitespace.
macro_rules! token {
    () => {
        r#"("(?:[^"\\]|\\.)*"|[^\s"{}]+)"#
    };
}

lazy_static::lazy_static! {
    static ref BLOCK_RE: Regex = Regex::new(concat!(
        r"(?i)\bhardwareshader\s+", token!(), r"\s+", token!(), r"\s*\{([^}]*)\}"
    )).unwrap();

    static ref SHADER_RE: Regex = Regex::new(concat!(r"(?i)\bshader\s+", token!())).unwrap();

    static ref SPEED_RE: Regex = Regex::new(
        r"(?i)\bspeed\s+([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)"
    ).unwrap();

    static ref TEXTURE_RE: Regex = Regex::new(concat!(
        r"(?i)\btexture\s+", token!(), r"\s+", token!()
    )).unwrap();

    static ref DEFINE_RE: Regex = Regex::new(concat!(
        r#"(?i)\bdefine\s+("(?:[^"\\]|\\.)*"|[^\s"{}=]+)\s*=\s*"#, token!()
    )).unwrap();

    static ref UNIFORM_RE: Regex = Regex::new(concat!(
        r"(?i)\buniform\s+", token!(), r"\s+", token!()
    )).unwrap();

    /// Attached to definitions that declare no uniforms of their own
    static ref DEFAULT_UNIFORMS: Vec<ShaderUniform> = vec![
        ShaderUniform::new("uObjectColor", UniformType::Vec3),
        ShaderUniform::new("uObjectColor2", UniformType::Vec3),
    ];
}

/// Strip surrounding double quotes and unescape `\"`. Any other backslash is
/// kept, so `shaders\glow.fp` still names a path.
fn unquote(token: &str) -> String {
    match token
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\""),
        None => token.to_owned(),
    }
}

fn capture(captures: &Captures, group: usize) -> String {
    captures
        .get(group)
        .map(|m| unquote(m.as_str()))
        .unwrap_or_default()
}

/// Concatenate every GLDEFS lump, in walk order.
pub fn merged_gldefs(index: &LumpIndex) -> String {
    let mut merged = String::new();

    for lump in index.lumps_named(GLDEFS) {
        match std::fs::read(&lump.path) {
            Ok(bytes) => {
                log::debug!("reading definitions from {}", lump.path.display());
                merged.push_str(&String::from_utf8_lossy(&bytes));
                merged.push('\n');
            }
            Err(err) => log::warn!("could not read {}: {}", lump.path.display(), err),
        }
    }

    merged
}

/// Find and parse every shader definition in the mod indexed by `index`.
pub fn parse_definitions(index: &LumpIndex) -> Vec<ShaderDefinition> {
    parse_definitions_from_text(&merged_gldefs(index), index)
}

/// Expand includes in `text`, strip its comments, and parse the
/// `hardwareshader` blocks it contains. Names are resolved through `index`.
pub fn parse_definitions_from_text(text: &str, index: &LumpIndex) -> Vec<ShaderDefinition> {
    let mut include_provider = index;
    let text = strip_comments(&expand_includes(text, &mut include_provider));

    let mut definitions = Vec::new();

    for block in BLOCK_RE.captures_iter(&text) {
        let kind = ShaderKind::from_keyword(&capture(&block, 1));
        let texture = capture(&block, 2);
        let body = block.get(3).map(|m| m.as_str()).unwrap_or_default();

        if kind == ShaderKind::PostProcess {
            log::debug!("skipping postprocess shader {:?}", texture);
            continue;
        }

        match parse_block(kind, &texture, body, index) {
            Ok(definition) => definitions.push(definition),
            Err(err) => log::warn!("skipping shader for {:?}: {}", texture, err),
        }
    }

    definitions
}

fn parse_block(
    kind: ShaderKind,
    texture_name: &str,
    body: &str,
    index: &LumpIndex,
) -> Result<ShaderDefinition, PreviewError> {
    let texture = index.resolve(texture_name)?.to_path_buf();

    let shader_name = SHADER_RE
        .captures(body)
        .map(|c| capture(&c, 1))
        .ok_or_else(|| PreviewError::MalformedDefinition {
            texture: texture_name.to_owned(),
            reason: "no Shader directive".to_owned(),
        })?;
    let shader = index.resolve(&shader_name)?.to_path_buf();

    let mut definition =
        ShaderDefinition::new(texture_name.to_lowercase(), kind, texture, shader);

    if let Some(speed) = SPEED_RE
        .captures(body)
        .and_then(|c| c[1].parse::<f32>().ok())
    {
        definition.speed = speed;
    }

    for c in TEXTURE_RE.captures_iter(body) {
        let name = capture(&c, 1);
        let path = index.resolve(&capture(&c, 2))?.to_path_buf();
        definition.textures.push((name, path));
    }

    for c in DEFINE_RE.captures_iter(body) {
        definition.define(capture(&c, 1), capture(&c, 2));
    }

    definition.uniforms = UNIFORM_RE
        .captures_iter(body)
        .map(|c| ShaderUniform::new(capture(&c, 2), UniformType::from_glsl(&capture(&c, 1))))
        .collect();

    if definition.uniforms.is_empty() {
        definition.uniforms = DEFAULT_UNIFORMS.clone();
    }

    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoting() {
        assert_eq!(unquote(r#""brick1""#), "brick1");
        assert_eq!(unquote("brick1"), "brick1");
        assert_eq!(unquote(r#""a \"b\" c""#), r#"a "b" c"#);
        assert_eq!(unquote(r#""""#), "");
        assert_eq!(unquote(r#""shaders\glow.fp""#), r"shaders\glow.fp");
        assert_eq!(unquote(r#""a\b\"""#), r#"a\b""#);
    }

    #[test]
    fn block_header() {
        let text = "HardwareShader Texture \"BRICK1\"\n{\n Shader \"s.fp\"\n}";
        let c = BLOCK_RE.captures(text).unwrap();
        assert_eq!(capture(&c, 1), "Texture");
        assert_eq!(capture(&c, 2), "BRICK1");
        assert_eq!(c[3].trim(), "Shader \"s.fp\"");
    }

    #[test]
    fn block_stops_at_first_closing_brace() {
        let text = "hardwareshader texture brick1 { Shader s.fp { nested } Speed 3 }";
        let c = BLOCK_RE.captures(text).unwrap();
        assert_eq!(&c[3], " Shader s.fp { nested ");
    }

    #[test]
    fn directives() {
        let body = r#"
            Shader "shaders/s.fp"
            Speed 2.5
            Texture "detail" "textures/detail.png"
            Texture tex2 other.png
            define FOO = 1
            define BAR="two words"
            uniform float glow
            uniform vec4 tint
        "#;

        assert_eq!(capture(&SHADER_RE.captures(body).unwrap(), 1), "shaders/s.fp");
        assert_eq!(&SPEED_RE.captures(body).unwrap()[1], "2.5");

        let textures: Vec<_> = TEXTURE_RE
            .captures_iter(body)
            .map(|c| (capture(&c, 1), capture(&c, 2)))
            .collect();
        assert_eq!(
            textures,
            vec![
                ("detail".to_string(), "textures/detail.png".to_string()),
                ("tex2".to_string(), "other.png".to_string())
            ]
        );

        let defines: Vec<_> = DEFINE_RE
            .captures_iter(body)
            .map(|c| (capture(&c, 1), capture(&c, 2)))
            .collect();
        assert_eq!(
            defines,
            vec![
                ("FOO".to_string(), "1".to_string()),
                ("BAR".to_string(), "two words".to_string())
            ]
        );

        let uniforms: Vec<_> = UNIFORM_RE
            .captures_iter(body)
            .map(|c| (capture(&c, 1), capture(&c, 2)))
            .collect();
        assert_eq!(
            uniforms,
            vec![
                ("float".to_string(), "glow".to_string()),
                ("vec4".to_string(), "tint".to_string())
            ]
        );
    }
}
