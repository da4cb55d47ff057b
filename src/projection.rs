use crate::camera::Camera;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Pixel dimensions of the raster surface and the constants derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub half_width: f32,
    pub horizon_y: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, horizon: f32) -> Self {
        Self {
            width,
            height,
            half_width: width / 2.0,
            horizon_y: height * horizon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Half road width in pixels at this depth.
    pub w: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub world: Point3,
    pub camera: Point3,
    /// `None` when the point is at or behind the camera plane.
    pub screen: Option<ScreenPoint>,
}

/// Pinhole projector. Built once per viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub camera_depth: f32,
    pub road_width: f32,
    pub viewport: Viewport,
}

impl Projector {
    pub fn new(field_of_view_deg: f32, road_width: f32, viewport: Viewport) -> Self {
        Self {
            camera_depth: 1.0 / (field_of_view_deg / 2.0).to_radians().tan(),
            road_width,
            viewport,
        }
    }

    pub fn project(&self, world: Point3, camera: &Camera) -> ProjectedPoint {
        let cam = camera.world_to_camera(world);
        if cam.z <= 0.0 {
            return ProjectedPoint {
                world,
                camera: cam,
                screen: None,
            };
        }

        let vp = &self.viewport;
        let scale = self.camera_depth / cam.z;
        ProjectedPoint {
            world,
            camera: cam,
            screen: Some(ScreenPoint {
                x: vp.half_width + scale * cam.x * vp.half_width,
                y: vp.horizon_y - scale * cam.y * vp.height * 0.9,
                w: scale * self.road_width * vp.half_width,
                scale,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> Projector {
        Projector::new(80.0, 36.0, Viewport::new(640.0, 480.0, 0.56))
    }

    #[test]
    fn camera_depth_from_field_of_view() {
        let p = Projector::new(90.0, 36.0, Viewport::new(640.0, 480.0, 0.5));
        assert!((p.camera_depth - 1.0).abs() < 1e-6);
    }

    #[test]
    fn points_at_or_behind_camera_have_no_screen_position() {
        let camera = Camera::new(Point3 {
            x: 0.0,
            y: 950.0,
            z: 500.0,
        });
        let p = projector();
        for z in [500.0, 499.0, 0.0] {
            let point = p.project(Point3 { x: 0.0, y: 0.0, z }, &camera);
            assert!(point.screen.is_none(), "z={z}");
            assert!(point.camera.z <= 0.0);
        }
        assert!(p.project(Point3 { x: 0.0, y: 0.0, z: 501.0 }, &camera).screen.is_some());
    }

    #[test]
    fn flat_road_rises_toward_horizon_with_depth() {
        let camera = Camera::new(Point3 {
            x: 0.0,
            y: 950.0,
            z: -128.0,
        });
        let p = projector();
        let mut last_y = f32::INFINITY;
        for i in 0..200 {
            let z = i as f32 * 80.0;
            let screen = p.project(Point3 { x: 0.0, y: 0.0, z }, &camera).screen.unwrap();
            assert!(screen.y < last_y, "segment {i}");
            assert!(screen.y > p.viewport.horizon_y);
            last_y = screen.y;
        }
    }

    #[test]
    fn centered_point_lands_on_screen_center() {
        let camera = Camera::new(Point3::default());
        let p = projector();
        let screen = p
            .project(Point3 { x: 0.0, y: 0.0, z: 100.0 }, &camera)
            .screen
            .unwrap();
        assert_eq!(screen.x, 320.0);
        assert_eq!(screen.y, p.viewport.horizon_y);
        assert!((screen.w - screen.scale * 36.0 * 320.0).abs() < 1e-4);
    }
}
