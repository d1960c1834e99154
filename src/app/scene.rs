use super::animation::{AnimationMixer, Pose};
use super::camera::PerspectiveCamera;
use super::data::{Tunable, TunableKind, TunableTarget, UniformMap, UniformType, UniformValue, ViewportState};
use super::error::{Result, SceneError};
use super::model::ModelAsset;
use super::placement::{Placement, placement_for};
use super::variant::{PlacementMode, SceneVariant, VariantConfig};

use cgmath::{Matrix4, Rad, Vector3};
use std::path::PathBuf;

pub struct LoadedModel {
    pub path: PathBuf,
    pub mesh_count: usize,
    pub mixer: Option<AnimationMixer>,
}

pub struct Scene {
    variant: SceneVariant,
    viewport: ViewportState,
    camera: PerspectiveCamera,
    uniforms: UniformMap,
    tunables: Vec<Tunable>,
    clear_color: [f32; 3],
    base_rotation_x: f32,
    resolution_uniform: Option<&'static str>,
    placement_mode: PlacementMode,
    placement: Placement,
    model: Option<LoadedModel>,
}

impl Scene {
    pub fn new(variant: SceneVariant, config: VariantConfig, viewport: ViewportState) -> Self {
        let clear_color = config
            .tunables
            .iter()
            .find_map(|t| match (&t.target, &t.kind) {
                (TunableTarget::ClearColor, TunableKind::Color(rgb)) => Some(*rgb),
                _ => None,
            })
            .unwrap_or([0.0, 0.0, 0.0]);

        let placement = match config.placement {
            PlacementMode::Fixed(placement) => placement,
            PlacementMode::Responsive => Placement::default(),
        };

        let mut scene = Self {
            variant,
            viewport,
            camera: config.camera,
            uniforms: config.uniforms,
            tunables: config.tunables,
            clear_color,
            base_rotation_x: config.base_rotation_x,
            resolution_uniform: config.resolution_uniform,
            placement_mode: config.placement,
            placement,
            model: None,
        };
        scene.resize(viewport.width, viewport.height, viewport.pixel_ratio);
        scene
    }

    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn uniforms(&self) -> &UniformMap {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformMap {
        &mut self.uniforms
    }

    pub fn tunables(&self) -> &[Tunable] {
        &self.tunables
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn mixer_mut(&mut self) -> Option<&mut AnimationMixer> {
        self.model.as_mut()?.mixer.as_mut()
    }

    /// Applies a window/canvas size. Calling it again with the same values
    /// leaves the scene unchanged.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.viewport = ViewportState::new(width, height, device_pixel_ratio);
        self.camera.set_aspect(self.viewport.aspect());

        if let Some(name) = self.resolution_uniform {
            self.uniforms
                .update_if_present(name, UniformValue::Vec2(self.viewport.physical_size()));
        }

        if self.placement_mode == PlacementMode::Responsive {
            self.placement = placement_for(self.viewport.width, self.viewport.orientation());
        }
    }

    pub fn set_tunable(&mut self, index: usize, kind: TunableKind) -> Result<()> {
        let tunable = self
            .tunables
            .get(index)
            .ok_or(SceneError::UnknownTunable(index))?;

        let mut edited = tunable.clone();
        edited.kind = kind;

        match (&edited.target, &edited.kind) {
            (TunableTarget::ClearColor, TunableKind::Color(rgb)) => self.clear_color = *rgb,
            (TunableTarget::ClearColor, TunableKind::Range { .. }) => {
                return Err(SceneError::UniformTypeMismatch {
                    name: edited.label.clone(),
                    expected: UniformType::Vec3,
                    actual: UniformType::Float,
                });
            }
            (TunableTarget::Uniform(name), _) => self.uniforms.set(name, edited.uniform_value())?,
        }

        self.tunables[index] = edited;
        Ok(())
    }

    pub fn attach_model(&mut self, asset: &ModelAsset) {
        let mixer = if asset.clips.is_empty() {
            None
        } else {
            let mut mixer = AnimationMixer::new(&asset.clips);
            if let Some(first) = asset.clips.first() {
                if let Some(action) = mixer.clip_action(&first.name) {
                    action.play();
                    log::debug!("Playing clip `{}`", first.name);
                }
            }
            Some(mixer)
        };

        self.model = Some(LoadedModel {
            path: asset.path.clone(),
            mesh_count: asset.meshes.len(),
            mixer,
        });

        if self.placement_mode == PlacementMode::Responsive {
            self.placement = placement_for(self.viewport.width, self.viewport.orientation());
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        let pose = self
            .model
            .as_ref()
            .and_then(|m| m.mixer.as_ref())
            .map(|mixer| mixer.pose())
            .unwrap_or_default();
        model_matrix(self.placement, pose, self.base_rotation_x)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            camera: self.camera,
            model: self.model_matrix(),
            uniforms: self.uniforms.clone(),
            clear_color: self.clear_color,
            resolution_uniform: self.resolution_uniform,
        }
    }
}

fn model_matrix(placement: Placement, pose: Pose, base_rotation_x: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(0.0, placement.y + pose.offset_y, 0.0))
        * Matrix4::from_angle_y(Rad(pose.rotation_y))
        * Matrix4::from_angle_x(Rad(base_rotation_x))
        * Matrix4::from_scale(placement.scale)
}

#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub camera: PerspectiveCamera,
    pub model: Matrix4<f32>,
    pub uniforms: UniformMap,
    pub clear_color: [f32; 3],
    pub resolution_uniform: Option<&'static str>,
}

impl FrameSnapshot {
    /// Retargets the snapshot at an offscreen size in pixels.
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.camera.set_aspect(width as f32 / height.max(1) as f32);
        if let Some(name) = self.resolution_uniform {
            self.uniforms
                .update_if_present(name, UniformValue::Vec2([width as f32, height as f32]));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::animation::AnimationClip;
    use crate::app::data::Orientation;

    fn scene(variant: SceneVariant) -> Scene {
        Scene::new(variant, variant.config(), ViewportState::new(1280.0, 720.0, 1.0))
    }

    fn asset(clips: Vec<AnimationClip>) -> ModelAsset {
        ModelAsset {
            path: PathBuf::from("models/crystal.obj"),
            meshes: Vec::new(),
            clips,
        }
    }

    #[test]
    fn resize_is_idempotent() {
        let mut once = scene(SceneVariant::ResponsiveModel);
        once.resize(800.0, 1000.0, 3.0);

        let mut twice = scene(SceneVariant::ResponsiveModel);
        twice.resize(800.0, 1000.0, 3.0);
        twice.resize(800.0, 1000.0, 3.0);

        assert_eq!(once.viewport(), twice.viewport());
        assert_eq!(once.camera, twice.camera);
        assert_eq!(once.uniforms(), twice.uniforms());
        assert_eq!(once.placement, twice.placement);
    }

    #[test]
    fn resize_updates_camera_and_resolution() {
        let mut scene = scene(SceneVariant::ShadertoyPlane);
        scene.resize(1000.0, 500.0, 1.5);

        assert_eq!(scene.camera.aspect, 2.0);
        assert_eq!(
            scene.uniforms().get("iResolution"),
            Some(&UniformValue::Vec2([1500.0, 750.0]))
        );
    }

    #[test]
    fn responsive_placement_follows_orientation() {
        let mut scene = scene(SceneVariant::ResponsiveModel);
        scene.resize(800.0, 1200.0, 1.0);
        assert_eq!(scene.placement.y, -0.5);

        scene.resize(800.0, 600.0, 1.0);
        assert_eq!(scene.placement.y, 4.0);
        assert!((scene.placement.scale - 800.0 * 0.02 / 1920.0).abs() < 1e-7);
    }

    #[test]
    fn attached_model_is_placed_for_the_current_viewport() {
        let mut scene = scene(SceneVariant::ResponsiveModel);
        scene.resize(900.0, 1600.0, 2.0);
        scene.placement = Placement::default();

        scene.attach_model(&asset(Vec::new()));
        let expected = placement_for(900.0, Orientation::Portrait);
        assert_eq!(scene.placement, expected);
        assert_eq!(expected.y, -0.5);
    }

    #[test]
    fn fixed_placement_ignores_resize() {
        let mut scene = scene(SceneVariant::PulsingModel);
        let before = scene.placement;
        scene.resize(300.0, 900.0, 2.0);
        assert_eq!(scene.placement, before);
    }

    #[test]
    fn tunables_write_through_to_targets() {
        let mut scene = scene(SceneVariant::PulsingModel);

        scene.set_tunable(0, TunableKind::Color([0.1, 0.2, 0.3])).unwrap();
        assert_eq!(scene.clear_color, [0.1, 0.2, 0.3]);

        let index = scene
            .tunables()
            .iter()
            .position(|t| t.label == "shadowRepetitions")
            .unwrap();
        scene
            .set_tunable(index, TunableKind::Range { value: 42.0, min: 1.0, max: 300.0, step: 1.0 })
            .unwrap();
        assert_eq!(scene.uniforms().get("uShadowRepetitions"), Some(&UniformValue::Float(42.0)));
        assert!(matches!(scene.tunables()[index].kind, TunableKind::Range { value, .. } if value == 42.0));
    }

    #[test]
    fn mismatched_tunable_edit_is_rejected() {
        let mut scene = scene(SceneVariant::PulsingModel);
        let index = scene.tunables().iter().position(|t| t.label == "color").unwrap();
        let err = scene
            .set_tunable(index, TunableKind::Range { value: 1.0, min: 0.0, max: 1.0, step: 0.1 })
            .unwrap_err();
        assert!(matches!(err, SceneError::UniformTypeMismatch { .. }));
        assert!(matches!(scene.tunables()[index].kind, TunableKind::Color(_)));
    }

    #[test]
    fn attaching_a_model_starts_its_first_clip() {
        let mut scene = scene(SceneVariant::PulsingModel);
        assert!(scene.mixer_mut().is_none());

        scene.attach_model(&asset(vec![AnimationClip::turntable("spin", 12.0)]));
        let mixer = scene.mixer_mut().unwrap();
        assert!(mixer.clip_action("spin").unwrap().playing);
    }

    #[test]
    fn model_without_clips_has_no_mixer() {
        let mut scene = scene(SceneVariant::PulsingModel);
        scene.attach_model(&asset(Vec::new()));
        assert!(scene.model().is_some());
        assert!(scene.mixer_mut().is_none());
    }

    #[test]
    fn snapshot_retargets_resolution() {
        let scene = scene(SceneVariant::ShadertoyPlane);
        let snapshot = scene.snapshot().with_target_size(1920, 1080);
        assert_eq!(
            snapshot.uniforms.get("iResolution"),
            Some(&UniformValue::Vec2([1920.0, 1080.0]))
        );
        assert!((snapshot.camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
