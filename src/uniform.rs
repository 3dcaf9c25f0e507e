use std::fmt;

use crate::PreviewError;

/// GLSL type of a user-adjustable uniform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
}

impl UniformType {
    /// Map a GLSL type keyword onto a supported type; anything unrecognized
    /// becomes `vec3`.
    pub fn from_glsl(keyword: &str) -> UniformType {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "int" => UniformType::Int,
            "float" => UniformType::Float,
            "vec2" => UniformType::Vec2,
            _ => UniformType::Vec3,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            UniformType::Int | UniformType::Float => 1,
            UniformType::Vec2 => 2,
            UniformType::Vec3 => 3,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            UniformType::Int => "int",
            UniformType::Float => "float",
            UniformType::Vec2 => "vec2",
            UniformType::Vec3 => "vec3",
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

impl UniformValue {
    /// A value of type `ty` with every component set to one.
    pub fn ones(ty: UniformType) -> UniformValue {
        match ty {
            UniformType::Int => UniformValue::Int(1),
            UniformType::Float => UniformValue::Float(1.0),
            UniformType::Vec2 => UniformValue::Vec2([1.0; 2]),
            UniformType::Vec3 => UniformValue::Vec3([1.0; 3]),
        }
    }

    /// Parse whitespace-separated components into a value of type `ty`.
    ///
    /// Missing components are zero, extra ones are ignored. `nan` and `inf`
    /// have no GLSL literal and are rejected.
    pub fn parse(text: &str, ty: UniformType) -> Result<UniformValue, PreviewError> {
        let mut components = [0.0f32; 3];

        for (slot, word) in components
            .iter_mut()
            .zip(text.split_whitespace())
            .take(ty.arity())
        {
            *slot = word
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| PreviewError::InvalidUniformValue {
                    value: text.to_owned(),
                    ty: ty.to_string(),
                })?;
        }

        Ok(match ty {
            UniformType::Int => UniformValue::Int(components[0] as i32),
            UniformType::Float => UniformValue::Float(components[0]),
            UniformType::Vec2 => UniformValue::Vec2([components[0], components[1]]),
            UniformType::Vec3 => UniformValue::Vec3(components),
        })
    }

    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
        }
    }
}

/// Renders the constructor arguments: a bare scalar, or comma-joined components.
impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Int(v) => write!(f, "{}", v),
            UniformValue::Float(v) => write!(f, "{:?}", v),
            UniformValue::Vec2([x, y]) => write!(f, "{:?}, {:?}", x, y),
            UniformValue::Vec3([x, y, z]) => write!(f, "{:?}, {:?}, {:?}", x, y, z),
        }
    }
}

/// A named, typed shader input whose value can be adjusted before viewing
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderUniform {
    name: String,
    value: UniformValue,
}

impl ShaderUniform {
    pub fn new(name: impl Into<String>, ty: UniformType) -> ShaderUniform {
        ShaderUniform {
            name: name.into(),
            value: UniformValue::ones(ty),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> UniformType {
        self.value.ty()
    }

    pub fn value(&self) -> UniformValue {
        self.value
    }

    /// Replace the value, keeping the declared type.
    pub fn set_value(&mut self, text: &str) -> Result<(), PreviewError> {
        self.value = UniformValue::parse(text, self.ty())?;
        Ok(())
    }

    /// `uniform <type> <name> = <type>(<components>);`
    pub fn declaration(&self) -> String {
        format!(
            "uniform {ty} {name} = {ty}({value});",
            ty = self.ty(),
            name = self.name,
            value = self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_become_vec3() {
        assert_eq!(UniformType::from_glsl("float"), UniformType::Float);
        assert_eq!(UniformType::from_glsl("INT"), UniformType::Int);
        assert_eq!(UniformType::from_glsl("vec4"), UniformType::Vec3);
        assert_eq!(UniformType::from_glsl("sampler2D"), UniformType::Vec3);
    }

    #[test]
    fn parse_pads_and_truncates() {
        assert_eq!(
            UniformValue::parse("1 2", UniformType::Vec2).unwrap(),
            UniformValue::Vec2([1.0, 2.0])
        );
        assert_eq!(
            UniformValue::parse("1", UniformType::Vec2).unwrap(),
            UniformValue::Vec2([1.0, 0.0])
        );
        assert_eq!(
            UniformValue::parse("0.5 0.25 0.125 9", UniformType::Vec3).unwrap(),
            UniformValue::Vec3([0.5, 0.25, 0.125])
        );
        assert_eq!(
            UniformValue::parse("", UniformType::Float).unwrap(),
            UniformValue::Float(0.0)
        );
        assert_eq!(
            UniformValue::parse("3.9", UniformType::Int).unwrap(),
            UniformValue::Int(3)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        match UniformValue::parse("1 red", UniformType::Vec3) {
            Err(PreviewError::InvalidUniformValue { value, ty }) => {
                assert_eq!(value, "1 red");
                assert_eq!(ty, "vec3");
            }
            val => panic!("{:?}", val),
        }
    }

    #[test]
    fn parse_rejects_non_finite() {
        for text in ["nan", "1 inf 1", "-infinity", "1e40"] {
            match UniformValue::parse(text, UniformType::Vec3) {
                Err(PreviewError::InvalidUniformValue { value, .. }) => assert_eq!(value, text),
                val => panic!("{}: {:?}", text, val),
            }
        }

        let mut glow = ShaderUniform::new("glow", UniformType::Float);
        assert!(glow.set_value("NaN").is_err());
        assert_eq!(glow.declaration(), "uniform float glow = float(1.0);");
    }

    #[test]
    fn declarations() {
        let mut color = ShaderUniform::new("uObjectColor", UniformType::Vec3);
        assert_eq!(
            color.declaration(),
            "uniform vec3 uObjectColor = vec3(1.0, 1.0, 1.0);"
        );

        color.set_value("0.5 0 1").unwrap();
        assert_eq!(
            color.declaration(),
            "uniform vec3 uObjectColor = vec3(0.5, 0.0, 1.0);"
        );

        let mut count = ShaderUniform::new("count", UniformType::Int);
        count.set_value("4").unwrap();
        assert_eq!(count.declaration(), "uniform int count = int(4);");

        let scale = ShaderUniform::new("scale", UniformType::Float);
        assert_eq!(scale.declaration(), "uniform float scale = float(1.0);");
    }
}
