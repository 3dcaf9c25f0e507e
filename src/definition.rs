use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::{PreviewError, ShaderUniform, UniformType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Texture,
    PostProcess,
}

impl ShaderKind {
    /// `postprocess` (any case) is a post-process shader; every other block
    /// kind (`texture`, `flat`, `sprite`, ...) binds to a texture.
    pub fn from_keyword(keyword: &str) -> ShaderKind {
        if keyword.eq_ignore_ascii_case("postprocess") {
            ShaderKind::PostProcess
        } else {
            ShaderKind::Texture
        }
    }

    /// Name of the boolean define announcing the kind to the shader source.
    pub fn feature_define(self) -> &'static str {
        match self {
            ShaderKind::Texture => "TEXTURE_SHADER",
            ShaderKind::PostProcess => "POSTPROCESS_SHADER",
        }
    }
}

/// One `hardwareshader` block, with every name resolved to a file
#[derive(Debug)]
pub struct ShaderDefinition {
    /// Lowercased, unquoted base texture name; also used as display name
    pub identifier: String,

    pub kind: ShaderKind,

    /// Base texture the shader is bound to
    pub texture: PathBuf,

    /// Fragment shader source
    pub shader: PathBuf,

    /// Animation speed, 1.0 unless given
    pub speed: f32,

    /// `define NAME = VALUE` pairs in declaration order
    pub defines: Vec<(String, String)>,

    /// `Texture NAME FILE` pairs in declaration order
    pub textures: Vec<(String, PathBuf)>,

    pub uniforms: Vec<ShaderUniform>,

    pub(crate) generated: Option<TempPath>,
}

impl ShaderDefinition {
    pub fn new(
        identifier: impl Into<String>,
        kind: ShaderKind,
        texture: PathBuf,
        shader: PathBuf,
    ) -> Self {
        ShaderDefinition {
            identifier: identifier.into(),
            kind,
            texture,
            shader,
            speed: 1.0,
            defines: Vec::new(),
            textures: Vec::new(),
            uniforms: Vec::new(),
            generated: None,
        }
    }

    /// Set a define, replacing the value of an existing one with the same name.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.defines.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.defines.push((name, value)),
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&ShaderUniform> {
        self.uniforms.iter().find(|u| u.name() == name)
    }

    /// Declare a new uniform. An existing uniform with the same name is kept
    /// as is, type included.
    pub fn add_uniform(&mut self, name: &str, ty: UniformType) -> &mut ShaderUniform {
        let position = match self.uniforms.iter().position(|u| u.name() == name) {
            Some(position) => position,
            None => {
                self.uniforms.push(ShaderUniform::new(name, ty));
                self.uniforms.len() - 1
            }
        };
        &mut self.uniforms[position]
    }

    pub fn set_uniform_value(&mut self, name: &str, text: &str) -> Result<(), PreviewError> {
        let uniform = self
            .uniforms
            .iter_mut()
            .find(|u| u.name() == name)
            .ok_or_else(|| PreviewError::Resolution {
                name: name.to_owned(),
            })?;
        uniform.set_value(text)
    }

    /// Path of the generated shader, once rewritten.
    pub fn generated_shader(&self) -> Option<&Path> {
        self.generated.as_deref()
    }

    /// Remove the generated shader file, if any. A file that is already gone
    /// is not an error.
    pub fn cleanup(&mut self) {
        if let Some(path) = self.generated.take() {
            let display = path.to_path_buf();
            match path.close() {
                Ok(()) => log::debug!("removed {}", display.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => log::warn!("could not remove {}: {}", display.display(), err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UniformValue;

    fn definition() -> ShaderDefinition {
        ShaderDefinition::new(
            "brick1",
            ShaderKind::Texture,
            PathBuf::from("brick1.png"),
            PathBuf::from("s.fp"),
        )
    }

    #[test]
    fn kinds() {
        assert_eq!(ShaderKind::from_keyword("PostProcess"), ShaderKind::PostProcess);
        assert_eq!(ShaderKind::from_keyword("texture"), ShaderKind::Texture);
        assert_eq!(ShaderKind::from_keyword("flat"), ShaderKind::Texture);
    }

    #[test]
    fn defines_keep_order_and_replace() {
        let mut def = definition();
        def.define("A", "1");
        def.define("B", "2");
        def.define("A", "3");

        assert_eq!(
            def.defines,
            vec![
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn user_uniforms() {
        let mut def = definition();
        def.add_uniform("glow", UniformType::Float);
        def.add_uniform("glow", UniformType::Vec2);
        assert_eq!(def.uniforms.len(), 1);
        assert_eq!(def.uniform("glow").unwrap().ty(), UniformType::Float);

        def.set_uniform_value("glow", "0.25").unwrap();
        assert_eq!(def.uniform("glow").unwrap().value(), UniformValue::Float(0.25));

        assert!(def.set_uniform_value("missing", "1").is_err());
    }

    #[test]
    fn cleanup_tolerates_missing_file() {
        let mut def = definition();
        let temp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        std::fs::remove_file(&temp).unwrap();
        def.generated = Some(temp);

        def.cleanup();
        assert!(def.generated_shader().is_none());

        // A second call has nothing to do.
        def.cleanup();
    }
}
