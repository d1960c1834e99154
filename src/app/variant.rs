use super::animation::AnimationClip;
use super::camera::PerspectiveCamera;
use super::data::{Tunable, TunableTarget, UniformMap, UniformValue, parse_hex_color};
use super::placement::Placement;

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CLEAR_COLOR: &str = "#26132f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneVariant {
    ShadertoyPlane,
    PulsingModel,
    ResponsiveModel,
}

impl SceneVariant {
    pub const ALL: [SceneVariant; 3] = [
        SceneVariant::ShadertoyPlane,
        SceneVariant::PulsingModel,
        SceneVariant::ResponsiveModel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SceneVariant::ShadertoyPlane => "shadertoy-plane",
            SceneVariant::PulsingModel => "pulsing-model",
            SceneVariant::ResponsiveModel => "responsive-model",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SceneVariant::ShadertoyPlane => "Shadertoy plane",
            SceneVariant::PulsingModel => "Pulsing model",
            SceneVariant::ResponsiveModel => "Responsive model",
        }
    }

    pub fn shader_dir(&self) -> String {
        format!("shaders/{}", self.name())
    }

    pub fn config(&self) -> VariantConfig {
        match self {
            SceneVariant::ShadertoyPlane => VariantConfig {
                camera: PerspectiveCamera::new(25.0, 1.0, 0.1, 100.0).at([0.0, 5.0, 5.0], [0.0, 0.0, 0.0]),
                mesh: MeshSource::Plane {
                    width: 5.0,
                    height: 5.0,
                    segments: 50,
                },
                base_rotation_x: -std::f32::consts::FRAC_PI_2,
                uniforms: UniformMap::new([
                    ("iResolution", UniformValue::Vec2([0.0, 0.0])),
                    ("iTime", UniformValue::Float(0.0)),
                    ("iTimeDelta", UniformValue::Float(0.0)),
                    ("iFrame", UniformValue::Int(0)),
                ]),
                tunables: vec![Tunable::color("clearColor", TunableTarget::ClearColor, DEFAULT_CLEAR_COLOR)],
                resolution_uniform: Some("iResolution"),
                placement: PlacementMode::Fixed(Placement::default()),
            },
            SceneVariant::PulsingModel => VariantConfig {
                camera: PerspectiveCamera::new(25.0, 1.0, 0.1, 100.0).at([0.0, 1.5, 9.0], [0.0, 0.0, 0.0]),
                mesh: MeshSource::Model {
                    path: "models/crystal.obj",
                    clips: vec![AnimationClip::turntable("spin", 12.0)],
                },
                base_rotation_x: 0.0,
                uniforms: UniformMap::new([
                    ("uTime", UniformValue::Float(0.0)),
                    ("colorAdjuster", UniformValue::Float(0.5)),
                    ("uColor", hex_uniform("#ff794d")),
                    ("uShadowColor", hex_uniform("#8e19b8")),
                    ("uLightColor", hex_uniform("#e5ffe0")),
                    ("uShadowRepetitions", UniformValue::Float(100.0)),
                    ("uLightRepetitions", UniformValue::Float(130.0)),
                ]),
                tunables: vec![
                    Tunable::color("clearColor", TunableTarget::ClearColor, DEFAULT_CLEAR_COLOR),
                    Tunable::color("color", TunableTarget::Uniform("uColor".into()), "#ff794d"),
                    Tunable::color("shadowColor", TunableTarget::Uniform("uShadowColor".into()), "#8e19b8"),
                    Tunable::color("lightColor", TunableTarget::Uniform("uLightColor".into()), "#e5ffe0"),
                    Tunable::range("shadowRepetitions", "uShadowRepetitions", 100.0, 1.0, 300.0, 1.0),
                    Tunable::range("lightRepetitions", "uLightRepetitions", 130.0, 1.0, 300.0, 1.0),
                ],
                resolution_uniform: None,
                placement: PlacementMode::Fixed(Placement { scale: 0.01, y: 0.0 }),
            },
            SceneVariant::ResponsiveModel => VariantConfig {
                camera: PerspectiveCamera::new(35.0, 1.0, 0.1, 100.0).at([0.0, 2.0, 14.0], [0.0, 2.0, 0.0]),
                mesh: MeshSource::Model {
                    path: "models/crystal.obj",
                    clips: vec![AnimationClip::combine(
                        "idle",
                        &[AnimationClip::turntable("turn", 20.0), AnimationClip::bob("float", 20.0, 0.3)],
                    )],
                },
                base_rotation_x: 0.0,
                uniforms: UniformMap::new([
                    ("uTime", UniformValue::Float(0.0)),
                    ("colorAdjuster", UniformValue::Float(0.5)),
                    ("uResolution", UniformValue::Vec2([0.0, 0.0])),
                    ("uColor", hex_uniform("#70c1ff")),
                ]),
                tunables: vec![
                    Tunable::color("clearColor", TunableTarget::ClearColor, DEFAULT_CLEAR_COLOR),
                    Tunable::color("color", TunableTarget::Uniform("uColor".into()), "#70c1ff"),
                ],
                resolution_uniform: Some("uResolution"),
                placement: PlacementMode::Responsive,
            },
        }
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<_> = SceneVariant::ALL.iter().map(|v| v.name()).collect();
                format!("unknown scene variant `{}` (expected one of: {})", s, known.join(", "))
            })
    }
}

fn hex_uniform(hex: &str) -> UniformValue {
    UniformValue::Vec3(parse_hex_color(hex).unwrap_or([1.0, 1.0, 1.0]))
}

#[derive(Debug, Clone)]
pub enum MeshSource {
    Plane { width: f32, height: f32, segments: u32 },
    Model { path: &'static str, clips: Vec<AnimationClip> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementMode {
    Fixed(Placement),
    /// Recomputed from viewport width and orientation.
    Responsive,
}

#[derive(Debug, Clone)]
pub struct VariantConfig {
    pub camera: PerspectiveCamera,
    pub mesh: MeshSource,
    pub base_rotation_x: f32,
    pub uniforms: UniformMap,
    pub tunables: Vec<Tunable>,
    pub resolution_uniform: Option<&'static str>,
    pub placement: PlacementMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::animation::AnimatedProperty;
    use crate::app::data::TunableKind;

    #[test]
    fn names_round_trip_through_from_str() {
        for variant in SceneVariant::ALL {
            assert_eq!(variant.name().parse::<SceneVariant>(), Ok(variant));
        }
        assert!("nope".parse::<SceneVariant>().is_err());
    }

    #[test]
    fn tunables_target_existing_uniforms_with_matching_types() {
        for variant in SceneVariant::ALL {
            let config = variant.config();
            for tunable in &config.tunables {
                if let TunableTarget::Uniform(name) = &tunable.target {
                    let value = config.uniforms.get(name).unwrap_or_else(|| panic!("{variant}: {name} missing"));
                    assert_eq!(value.uniform_type(), tunable.uniform_value().uniform_type());
                    assert_eq!(*value, tunable.uniform_value(), "{variant}: {name} default differs");
                }
            }
        }
    }

    #[test]
    fn repetition_sliders_are_bounded() {
        let config = SceneVariant::PulsingModel.config();
        let ranges: Vec<_> = config
            .tunables
            .iter()
            .filter_map(|t| match t.kind {
                TunableKind::Range { min, max, step, .. } => Some((min, max, step)),
                TunableKind::Color(_) => None,
            })
            .collect();
        assert_eq!(ranges, vec![(1.0, 300.0, 1.0), (1.0, 300.0, 1.0)]);
    }

    #[test]
    fn resolution_uniform_is_declared() {
        for variant in SceneVariant::ALL {
            let config = variant.config();
            if let Some(name) = config.resolution_uniform {
                assert!(config.uniforms.contains(name));
            }
        }
    }

    #[test]
    fn responsive_model_clip_turns_and_bobs() {
        let MeshSource::Model { clips, .. } = SceneVariant::ResponsiveModel.config().mesh else {
            panic!("responsive-model has no model");
        };
        let properties: Vec<_> = clips[0].tracks.iter().map(|t| t.property).collect();
        assert_eq!(properties, [AnimatedProperty::RotationY, AnimatedProperty::PositionY]);
    }
}
