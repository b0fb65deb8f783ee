use super::Viewport;
use glam::{Mat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Perspective camera described by a position plus yaw/pitch angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            fov_y_deg: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1_000.0,
        }
    }

    /// Camera at `position` looking down -Z, the resting pose of every scene.
    pub fn facing_scene(position: Vec3) -> Self {
        Self::new(position, -std::f32::consts::FRAC_PI_2, 0.0)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        camera_basis(self.yaw, self.pitch)
    }

    pub fn forward(&self) -> Vec3 {
        self.basis().0
    }

    /// Move along the view direction.
    pub fn advance(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    pub fn point_in_front(&self, distance: f32) -> Vec3 {
        self.position + self.forward() * distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (forward, _right, up) = self.basis();
        Mat4::look_to_rh(self.position, forward, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(1e-3),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - self.position).normalize_or_zero();
        Ray {
            origin: self.position,
            direction,
        }
    }
}

/// Viewport pixels (top-left origin) to NDC (bottom-left origin, [-1, 1]).
pub fn pointer_to_ndc(x: f32, y: f32, viewport: Viewport) -> Vec2 {
    let width = viewport.width.max(1) as f32;
    let height = viewport.height.max(1) as f32;
    Vec2::new(x / width * 2.0 - 1.0, 1.0 - y / height * 2.0)
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_scene_looks_down_negative_z() {
        let camera = Camera::facing_scene(Vec3::new(0.0, 0.0, 30.0));
        let (forward, _right, up) = camera.basis();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
        assert!((up - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn centre_ray_follows_forward() {
        let camera = Camera::facing_scene(Vec3::new(0.0, 0.0, 30.0));
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn advance_moves_along_view_direction() {
        let mut camera = Camera::facing_scene(Vec3::new(0.0, 0.0, 30.0));
        camera.advance(5.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, 25.0)).length() < 1e-5);
    }

    #[test]
    fn pointer_corners_map_to_ndc_corners() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(pointer_to_ndc(0.0, 0.0, viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(800.0, 600.0, viewport), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(400.0, 300.0, viewport), Vec2::ZERO);
    }
}
