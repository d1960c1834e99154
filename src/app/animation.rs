#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedProperty {
    RotationY,
    PositionY,
}

/// Keyframes for one property. `times` is ascending and the same length as
/// `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack {
    pub property: AnimatedProperty,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

impl KeyframeTrack {
    pub fn new(property: AnimatedProperty, times: Vec<f32>, values: Vec<f32>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self { property, times, values }
    }

    /// Linear interpolation, clamped to the first and last keys.
    pub fn sample(&self, time: f32) -> f32 {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return 0.0;
        };

        if time <= first {
            return self.values[0];
        }
        if time >= last {
            return self.values[self.values.len() - 1];
        }

        let next = self.times.partition_point(|&t| t <= time);
        let (t0, t1) = (self.times[next - 1], self.times[next]);
        let (v0, v1) = (self.values[next - 1], self.values[next]);
        let alpha = (time - t0) / (t1 - t0);
        v0 + (v1 - v0) * alpha
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<KeyframeTrack>,
}

impl AnimationClip {
    /// One full turn about Y over `duration` seconds.
    pub fn turntable(name: &str, duration: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            tracks: vec![KeyframeTrack::new(
                AnimatedProperty::RotationY,
                vec![0.0, duration],
                vec![0.0, std::f32::consts::TAU],
            )],
        }
    }

    /// Rise and fall of `height` over `duration` seconds.
    pub fn bob(name: &str, duration: f32, height: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            tracks: vec![KeyframeTrack::new(
                AnimatedProperty::PositionY,
                vec![0.0, duration * 0.5, duration],
                vec![0.0, height, 0.0],
            )],
        }
    }

    /// Runs as long as the longest input.
    pub fn combine(name: &str, clips: &[AnimationClip]) -> Self {
        Self {
            name: name.to_string(),
            duration: clips.iter().map(|c| c.duration).fold(0.0, f32::max),
            tracks: clips.iter().flat_map(|c| c.tracks.iter().cloned()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClipAction {
    pub clip: AnimationClip,
    pub time: f32,
    pub playing: bool,
    pub looping: bool,
}

impl ClipAction {
    pub fn play(&mut self) {
        self.playing = true;
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }

        self.time += dt;
        if self.clip.duration <= 0.0 {
            self.time = 0.0;
        } else if self.looping {
            self.time = self.time.rem_euclid(self.clip.duration);
        } else if self.time >= self.clip.duration {
            self.time = self.clip.duration;
            self.playing = false;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub rotation_y: f32,
    pub offset_y: f32,
}

#[derive(Debug, Clone)]
pub struct AnimationMixer {
    actions: Vec<ClipAction>,
}

impl AnimationMixer {
    pub fn new(clips: &[AnimationClip]) -> Self {
        let actions = clips
            .iter()
            .cloned()
            .map(|clip| ClipAction {
                clip,
                time: 0.0,
                playing: false,
                looping: true,
            })
            .collect();
        Self { actions }
    }

    pub fn clip_action(&mut self, name: &str) -> Option<&mut ClipAction> {
        self.actions.iter_mut().find(|a| a.clip.name == name)
    }

    pub fn update(&mut self, dt: f32) {
        for action in &mut self.actions {
            action.advance(dt);
        }
    }

    pub fn pose(&self) -> Pose {
        let mut pose = Pose::default();
        for action in self.actions.iter().filter(|a| a.playing || a.time > 0.0) {
            for track in &action.clip.tracks {
                let value = track.sample(action.time);
                match track.property {
                    AnimatedProperty::RotationY => pose.rotation_y += value,
                    AnimatedProperty::PositionY => pose.offset_y += value,
                }
            }
        }
        pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_interpolates_linearly_and_clamps() {
        let track = KeyframeTrack::new(AnimatedProperty::PositionY, vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 0.0]);
        assert_eq!(track.sample(-1.0), 0.0);
        assert!((track.sample(0.5) - 1.0).abs() < 1e-6);
        assert!((track.sample(2.0) - 1.0).abs() < 1e-6);
        assert_eq!(track.sample(5.0), 0.0);
    }

    #[test]
    fn looping_action_wraps_at_duration() {
        let mut mixer = AnimationMixer::new(&[AnimationClip::turntable("spin", 4.0)]);
        mixer.clip_action("spin").unwrap().play();

        mixer.update(5.0);
        let action = mixer.clip_action("spin").unwrap();
        assert!((action.time - 1.0).abs() < 1e-6);
        assert!((mixer.pose().rotation_y - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn combined_clip_turns_and_bobs() {
        let idle = AnimationClip::combine(
            "idle",
            &[AnimationClip::turntable("turn", 8.0), AnimationClip::bob("float", 8.0, 0.4)],
        );
        assert_eq!(idle.duration, 8.0);

        let mut mixer = AnimationMixer::new(&[idle]);
        mixer.clip_action("idle").unwrap().play();
        mixer.update(4.0);
        let pose = mixer.pose();
        assert!((pose.rotation_y - std::f32::consts::PI).abs() < 1e-5);
        assert!((pose.offset_y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn idle_actions_do_not_move() {
        let mut mixer = AnimationMixer::new(&[AnimationClip::bob("bob", 2.0, 1.0)]);
        mixer.update(0.5);
        assert_eq!(mixer.pose(), Pose::default());
    }

    #[test]
    fn one_shot_action_stops_at_end() {
        let mut mixer = AnimationMixer::new(&[AnimationClip::bob("bob", 2.0, 1.0)]);
        let action = mixer.clip_action("bob").unwrap();
        action.looping = false;
        action.playing = true;

        mixer.update(3.0);
        let action = mixer.clip_action("bob").unwrap();
        assert!(!action.playing);
        assert_eq!(action.time, 2.0);
    }
}
