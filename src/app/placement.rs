use super::data::Orientation;

/// Reference width the placement scale is normalised against.
pub const REFERENCE_WIDTH: f32 = 1920.0;

const PORTRAIT_SCALE: f32 = 0.05;
const LANDSCAPE_SCALE: f32 = 0.02;
const PORTRAIT_Y: f32 = -0.5;
const LANDSCAPE_Y: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub y: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self { scale: 1.0, y: 0.0 }
    }
}

/// Portrait screens get a larger model sitting near the ground plane,
/// landscape screens a smaller one raised above it.
pub fn placement_for(width: f32, orientation: Orientation) -> Placement {
    match orientation {
        Orientation::Portrait => Placement {
            scale: width * PORTRAIT_SCALE / REFERENCE_WIDTH,
            y: PORTRAIT_Y,
        },
        Orientation::Landscape => Placement {
            scale: width * LANDSCAPE_SCALE / REFERENCE_WIDTH,
            y: LANDSCAPE_Y,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_800() {
        let p = placement_for(800.0, Orientation::Portrait);
        assert!((p.scale - 0.0208333).abs() < 1e-6);
        assert_eq!(p.y, -0.5);
    }

    #[test]
    fn landscape_800() {
        let p = placement_for(800.0, Orientation::Landscape);
        assert!((p.scale - 0.0083333).abs() < 1e-6);
        assert_eq!(p.y, 4.0);
    }

    #[test]
    fn scale_is_linear_in_width() {
        let narrow = placement_for(960.0, Orientation::Landscape);
        let wide = placement_for(1920.0, Orientation::Landscape);
        assert!((wide.scale - 2.0 * narrow.scale).abs() < 1e-6);
        assert_eq!(wide.scale, LANDSCAPE_SCALE);
    }
}
