use crate::render::Viewport;
use glam::Vec3;

/// Viewport class selecting grid and camera constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutProfile {
    Desktop,
    Tablet,
    Mobile,
}

impl LayoutProfile {
    pub fn for_viewport(viewport: Viewport) -> Self {
        match viewport.width {
            width if width >= 1024 => Self::Desktop,
            width if width >= 768 => Self::Tablet,
            _ => Self::Mobile,
        }
    }

    pub fn columns(self) -> usize {
        match self {
            Self::Desktop => 4,
            Self::Tablet => 3,
            Self::Mobile => 2,
        }
    }

    /// Horizontal and vertical distance between neighbouring fragments.
    pub fn spacing(self) -> (f32, f32) {
        match self {
            Self::Desktop => (6.0, 5.0),
            Self::Tablet => (5.0, 4.5),
            Self::Mobile => (4.5, 4.0),
        }
    }

    pub fn camera_distance(self) -> f32 {
        match self {
            Self::Desktop => 30.0,
            Self::Tablet => 34.0,
            Self::Mobile => 40.0,
        }
    }

    /// How far in front of the camera the immersion stage parks a fragment.
    pub fn rush_distance(self) -> f32 {
        match self {
            Self::Desktop => 8.0,
            Self::Tablet => 9.0,
            Self::Mobile => 11.0,
        }
    }

    pub fn portal_distance(self) -> f32 {
        match self {
            Self::Desktop => 3.0,
            Self::Tablet => 3.5,
            Self::Mobile => 4.0,
        }
    }

    pub fn fragment_scale(self) -> f32 {
        match self {
            Self::Desktop => 1.0,
            Self::Tablet => 0.9,
            Self::Mobile => 0.8,
        }
    }

    /// Resting position of fragment `index` in a centred grid of `count` fragments.
    pub fn grid_position(self, index: usize, count: usize) -> Vec3 {
        let columns = self.columns().max(1);
        let count = count.max(index + 1);
        let rows = count.div_ceil(columns);
        let (column, row) = (index % columns, index / columns);
        let (dx, dy) = self.spacing();
        let x = (column as f32 - (columns - 1) as f32 / 2.0) * dx;
        let y = ((rows - 1) as f32 / 2.0 - row as f32) * dy;
        Vec3::new(x, y, 0.0)
    }
}
