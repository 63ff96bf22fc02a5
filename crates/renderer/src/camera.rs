use glam::{Mat4, Vec3, Vec4};

/// Sub-rectangle of a larger virtual frustum the camera renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOffset {
    pub full_width: f32,
    pub full_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    view: Option<ViewOffset>,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            view: None,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_view_offset(
        &mut self,
        full_width: f32,
        full_height: f32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) {
        self.view = Some(ViewOffset {
            full_width,
            full_height,
            x,
            y,
            width,
            height,
        });
    }

    pub fn view_offset(&self) -> Option<&ViewOffset> {
        self.view.as_ref()
    }

    /// Off-centre projection with wgpu's 0..1 depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        let near = self.near;
        let mut top = near * (self.fov_degrees.to_radians() * 0.5).tan();
        let mut height = 2.0 * top;
        let mut width = self.aspect * height;
        let mut left = -0.5 * width;

        if let Some(view) = &self.view {
            let full_width = view.full_width.max(f32::EPSILON);
            let full_height = view.full_height.max(f32::EPSILON);
            left += view.x * width / full_width;
            top -= view.y * height / full_height;
            width *= view.width / full_width;
            height *= view.height / full_height;
        }

        frustum(left, left + width, top - height, top, near, self.far)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let x = 2.0 * near / (right - left);
    let y = 2.0 * near / (top - bottom);
    let a = (right + left) / (right - left);
    let b = (top + bottom) / (top - bottom);
    let c = far / (near - far);
    let d = near * far / (near - far);
    Mat4::from_cols(
        Vec4::new(x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y, 0.0, 0.0),
        Vec4::new(a, b, c, -1.0),
        Vec4::new(0.0, 0.0, d, 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(90.0, 800.0 / 600.0, 1.0, 2000.0);
        camera.position = Vec3::new(0.0, 0.0, 900.0);
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn centred_projection_matches_glam() {
        let camera = camera();
        let expected = Mat4::perspective_rh(90f32.to_radians(), 800.0 / 600.0, 1.0, 2000.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn full_window_offset_is_identity() {
        let mut camera = camera();
        let plain = camera.projection_matrix();
        camera.set_view_offset(800.0, 600.0, 0.0, 0.0, 800.0, 600.0);
        assert!(camera.projection_matrix().abs_diff_eq(plain, 1e-5));
    }

    #[test]
    fn positive_offset_shifts_scene_left() {
        let mut camera = camera();
        camera.set_view_offset(800.0, 600.0, 200.0, 0.0, 800.0, 600.0);
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc_x = clip.x / clip.w;
        // a quarter-width window shift moves the origin half a screen-half left
        assert!((ndc_x - (-0.5)).abs() < 1e-4, "ndc_x = {ndc_x}");

        camera.set_view_offset(800.0, 600.0, -200.0, 0.0, 800.0, 600.0);
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w - 0.5).abs() < 1e-4);
    }

    #[test]
    fn depth_range_maps_near_and_far() {
        let camera = camera();
        let projection = camera.projection_matrix();
        let near = projection * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = projection * Vec4::new(0.0, 0.0, -2000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }
}
