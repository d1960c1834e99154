use super::data::UniformValue;
use super::scene::Scene;

pub const COLOR_ADJUSTER_FREQUENCY: f32 = 0.35;

const TIME_UNIFORMS: [&str; 3] = ["time", "uTime", "iTime"];

/// Smooth 0..1 pulse with a period of 2π/0.35 seconds.
pub fn color_adjuster(elapsed: f32) -> f32 {
    (elapsed * COLOR_ADJUSTER_FREQUENCY).sin() * 0.5 + 0.5
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub elapsed: f32,
    pub delta: f32,
    pub frame: u32,
    pub animated: bool,
    // another frame should be scheduled
    pub render: bool,
}

#[derive(Debug, Clone)]
pub struct FrameDriver {
    elapsed: f64,
    frame: u32,
    running: bool,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            frame: 0,
            running: true,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            log::info!("Frame driver resumed at {:.2}s", self.elapsed);
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Frame driver stopped at {:.2}s", self.elapsed);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn tick(&mut self, dt: f32, scene: &mut Scene) -> FrameReport {
        if !self.running {
            return FrameReport {
                elapsed: self.elapsed(),
                delta: 0.0,
                frame: self.frame,
                animated: false,
                render: false,
            };
        }

        let dt = dt.max(0.0);
        self.elapsed += dt as f64;
        let elapsed = self.elapsed();

        let uniforms = scene.uniforms_mut();
        for name in TIME_UNIFORMS {
            uniforms.update_if_present(name, UniformValue::Float(elapsed));
        }
        uniforms.update_if_present("colorAdjuster", UniformValue::Float(color_adjuster(elapsed)));
        uniforms.update_if_present("iTimeDelta", UniformValue::Float(dt));
        uniforms.update_if_present("iFrame", UniformValue::Int(self.frame as i32));

        // The model may still be loading.
        let animated = match scene.mixer_mut() {
            Some(mixer) => {
                mixer.update(dt);
                true
            }
            None => false,
        };

        let report = FrameReport {
            elapsed,
            delta: dt,
            frame: self.frame,
            animated,
            render: true,
        };
        self.frame = self.frame.wrapping_add(1);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::animation::AnimationClip;
    use crate::app::data::ViewportState;
    use crate::app::model::ModelAsset;
    use crate::app::variant::SceneVariant;
    use std::f32::consts::TAU;

    fn scene(variant: SceneVariant) -> Scene {
        Scene::new(variant, variant.config(), ViewportState::new(800.0, 600.0, 1.0))
    }

    #[test]
    fn color_adjuster_matches_formula_and_bounds() {
        for i in 0..2000 {
            let t = i as f32 * 0.05;
            let value = color_adjuster(t);
            assert_eq!(value, (t * 0.35).sin() * 0.5 + 0.5);
            assert!((0.0..=1.0).contains(&value));
        }
        assert_eq!(color_adjuster(0.0), 0.5);
    }

    #[test]
    fn color_adjuster_is_periodic() {
        let period = TAU / COLOR_ADJUSTER_FREQUENCY;
        assert!((period - 17.952).abs() < 1e-3);
        for t in [0.0f32, 1.3, 4.0, 9.9] {
            assert!((color_adjuster(t) - color_adjuster(t + period)).abs() < 1e-4);
        }
    }

    #[test]
    fn tick_pushes_time_uniforms() {
        let mut scene = scene(SceneVariant::PulsingModel);
        let mut driver = FrameDriver::new();

        driver.tick(0.5, &mut scene);
        let report = driver.tick(0.25, &mut scene);

        assert_eq!(report.elapsed, 0.75);
        assert_eq!(report.frame, 1);
        assert_eq!(scene.uniforms().get("uTime"), Some(&UniformValue::Float(0.75)));
        assert_eq!(
            scene.uniforms().get("colorAdjuster"),
            Some(&UniformValue::Float(color_adjuster(0.75)))
        );
    }

    #[test]
    fn shadertoy_uniforms_track_delta_and_frame() {
        let mut scene = scene(SceneVariant::ShadertoyPlane);
        let mut driver = FrameDriver::new();

        for _ in 0..3 {
            driver.tick(0.125, &mut scene);
        }

        assert_eq!(scene.uniforms().get("iTime"), Some(&UniformValue::Float(0.375)));
        assert_eq!(scene.uniforms().get("iTimeDelta"), Some(&UniformValue::Float(0.125)));
        assert_eq!(scene.uniforms().get("iFrame"), Some(&UniformValue::Int(2)));
        assert!(!scene.uniforms().contains("colorAdjuster"));
    }

    #[test]
    fn mixer_is_skipped_until_the_model_loads() {
        let mut scene = scene(SceneVariant::PulsingModel);
        let mut driver = FrameDriver::new();

        let report = driver.tick(0.016, &mut scene);
        assert!(!report.animated);
        assert!(report.render);

        scene.attach_model(&ModelAsset {
            path: "models/crystal.obj".into(),
            meshes: Vec::new(),
            clips: vec![AnimationClip::turntable("spin", 4.0)],
        });
        let report = driver.tick(1.0, &mut scene);
        assert!(report.animated);
        assert!((scene.mixer_mut().unwrap().pose().rotation_y - TAU / 4.0).abs() < 1e-5);
    }

    #[test]
    fn stopped_driver_does_not_advance() {
        let mut scene = scene(SceneVariant::PulsingModel);
        let mut driver = FrameDriver::new();
        driver.tick(1.0, &mut scene);

        driver.stop();
        let report = driver.tick(5.0, &mut scene);
        assert!(!report.render);
        assert_eq!(report.delta, 0.0);
        assert_eq!(report.frame, 1);
        assert_eq!(driver.elapsed(), 1.0);
        assert_eq!(scene.uniforms().get("uTime"), Some(&UniformValue::Float(1.0)));

        driver.start();
        driver.tick(0.5, &mut scene);
        assert_eq!(driver.elapsed(), 1.5);
    }
}
