use std::collections::BTreeMap;

use super::error::{Result, SceneError};

pub const MAX_PIXEL_RATIO: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Int,
    Vec2,
    Vec3,
}

impl UniformType {
    pub fn from_glsl(type_str: &str) -> Option<Self> {
        match type_str {
            "float" => Some(UniformType::Float),
            "int" => Some(UniformType::Int),
            "vec2" => Some(UniformType::Vec2),
            "vec3" => Some(UniformType::Vec3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    /// Colors are stored as vec3 in the 0..1 range.
    Vec3([f32; 3]),
}

impl UniformValue {
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
        }
    }
}

/// Material uniforms. The set of names and their types is fixed when the map
/// is built; afterwards only values change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformMap {
    values: BTreeMap<String, UniformValue>,
}

impl UniformMap {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, UniformValue)>,
        S: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| SceneError::UnknownUniform(name.to_string()))?;

        let expected = slot.uniform_type();
        let actual = value.uniform_type();
        if expected != actual {
            return Err(SceneError::UniformTypeMismatch {
                name: name.to_string(),
                expected,
                actual,
            });
        }

        *slot = value;
        Ok(())
    }

    /// Writes `value` only when the uniform exists with the same type.
    /// Returns whether the write happened.
    pub fn update_if_present(&mut self, name: &str, value: UniformValue) -> bool {
        match self.values.get_mut(name) {
            Some(slot) if slot.uniform_type() == value.uniform_type() => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn from_size(width: f32, height: f32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl ViewportState {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn physical_size(&self) -> [f32; 2] {
        [self.width * self.pixel_ratio, self.height * self.pixel_ratio]
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_size(self.width, self.height)
    }
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f32) -> f32 {
    device_pixel_ratio.clamp(1.0, MAX_PIXEL_RATIO)
}

/// Parses `#rrggbb` into a 0..1 color triple.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(digits.get(range)?, 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };

    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

#[derive(Debug, Clone, PartialEq)]
pub enum TunableTarget {
    ClearColor,
    Uniform(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TunableKind {
    Color([f32; 3]),
    Range {
        value: f32,
        min: f32,
        max: f32,
        step: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tunable {
    pub label: String,
    pub target: TunableTarget,
    pub kind: TunableKind,
}

impl Tunable {
    pub fn color(label: &str, target: TunableTarget, hex: &str) -> Self {
        Self {
            label: label.to_string(),
            target,
            kind: TunableKind::Color(parse_hex_color(hex).unwrap_or([1.0, 1.0, 1.0])),
        }
    }

    pub fn range(label: &str, uniform: &str, value: f32, min: f32, max: f32, step: f32) -> Self {
        Self {
            label: label.to_string(),
            target: TunableTarget::Uniform(uniform.to_string()),
            kind: TunableKind::Range { value, min, max, step },
        }
    }

    pub fn uniform_value(&self) -> UniformValue {
        match self.kind {
            TunableKind::Color(rgb) => UniformValue::Vec3(rgb),
            TunableKind::Range { value, .. } => UniformValue::Float(value),
        }
    }
}
