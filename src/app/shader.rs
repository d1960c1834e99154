use super::data::{UniformMap, UniformType};
use super::error::{Result, SceneError};

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;

pub const VERTEX_FILE: &str = "vertex.glsl";
pub const FRAGMENT_FILE: &str = "fragment.glsl";

#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn read_from(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| SceneError::Io { path, source })
        };

        Ok(Self {
            vertex: read(VERTEX_FILE)?,
            fragment: read(FRAGMENT_FILE)?,
        })
    }

    /// Uniforms declared by either stage.
    pub fn declared_uniforms(&self) -> HashMap<String, UniformType> {
        let mut declared = parse_uniforms(&self.vertex);
        declared.extend(parse_uniforms(&self.fragment));
        declared
    }

    /// Every uniform the material drives must be declared with the same type.
    /// Uniforms the shaders declare beyond that are left at their GL default.
    pub fn check_contract(&self, uniforms: &UniformMap) -> Result<()> {
        let declared = self.declared_uniforms();

        for (name, value) in uniforms.iter() {
            let expected = value.uniform_type();
            if declared.get(name) != Some(&expected) {
                return Err(SceneError::ShaderContract {
                    name: name.to_string(),
                    expected,
                });
            }
        }

        for name in declared.keys().filter(|name| !uniforms.contains(name)) {
            log::debug!("Shader declares `{}` which the material does not drive", name);
        }
        Ok(())
    }
}

/// Parse GLSL source for `uniform <type> <name>;` declarations.
pub fn parse_uniforms(shader_source: &str) -> HashMap<String, UniformType> {
    static UNIFORM_RE: OnceLock<Regex> = OnceLock::new();
    let re = UNIFORM_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*uniform\s+(?:(?:lowp|mediump|highp)\s+)?(float|int|vec2|vec3)\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*;")
            .expect("Invalid regex pattern")
    });

    re.captures_iter(shader_source)
        .filter_map(|cap| {
            let uniform_type = UniformType::from_glsl(cap.get(1)?.as_str())?;
            Some((cap.get(2)?.as_str().to_string(), uniform_type))
        })
        .collect()
}

/// Trailing-edge debounce for watcher events. A reload is due once no event
/// has arrived for `window`, so a burst of writes is read once it settles.
#[derive(Debug, Clone)]
pub struct ReloadDebounce {
    window: Duration,
    last_event: Option<Instant>,
}

impl ReloadDebounce {
    pub fn new(window: Duration) -> Self {
        Self { window, last_event: None }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let at = self.last_event?;
        Some(self.window.saturating_sub(now.saturating_duration_since(at)))
    }

    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.remaining(now) {
            Some(left) if left.is_zero() => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }
}
