use crate::backdrop::Backdrop;
use crate::camera::Camera;
use crate::framebuffer::{Painter, Rgba};
use crate::projection::{Point3, Projector, ScreenPoint};
use crate::scenery::SpriteKind;
use crate::sim::Simulation;
use crate::track::{Segment, Track};
use crate::vehicle::VehicleState;

const SHOULDER_FACTOR: f32 = 1.15;
const LANE_FACTOR: f32 = 0.07;
const LEAN_DAMPING: f32 = 0.6;
/// Screen height the backdrop's pixel constants were tuned for.
const BACKDROP_REFERENCE_HEIGHT: f32 = 720.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub grass: Rgba,
    pub road: Rgba,
    pub shoulder: Rgba,
    pub lane: Rgba,
}

pub const PALETTES: [Palette; 2] = [
    Palette {
        grass: Rgba::hex(0x58b368),
        road: Rgba::hex(0x545d73),
        shoulder: Rgba::hex(0xf59f3e),
        lane: Rgba::hex(0xf8fafc),
    },
    Palette {
        grass: Rgba::hex(0x4ca65b),
        road: Rgba::hex(0x4f586c),
        shoulder: Rgba::hex(0xe9822a),
        lane: Rgba::hex(0xe2e8f0),
    },
];

const SKY: [(f32, Rgba); 3] = [
    (0.0, Rgba::hex(0x8ec5ff)),
    (0.4, Rgba::hex(0xcde9ff)),
    (1.0, Rgba::hex(0xf5fcff)),
];
const CLOUD: Rgba = Rgba::new(255, 255, 255, 191);

const PINE: Rgba = Rgba::hex(0x2f855a);
const TRUNK: Rgba = Rgba::hex(0x8b5a2b);
const CANOPY: Rgba = Rgba::hex(0x3ca36c);
const ROCK: Rgba = Rgba::hex(0x94a3b8);
const BUSH: Rgba = Rgba::hex(0x4caf50);

const CAR_BODY: Rgba = Rgba::hex(0xf97316);
const CAR_CABIN: Rgba = Rgba::hex(0x1f2937);
const CAR_GLASS: Rgba = Rgba::new(96, 165, 250, 204);
const CAR_WHEEL: Rgba = Rgba::hex(0x111827);

#[inline]
pub fn palette_for(index: usize, rumble_length: usize) -> &'static Palette {
    &PALETTES[(index / rumble_length.max(1)) % PALETTES.len()]
}

/// A segment that survived culling, with both boundaries on screen.
#[derive(Debug, Clone, Copy)]
pub struct VisibleSegment<'a> {
    pub segment: &'a Segment,
    pub near: ScreenPoint,
    pub far: ScreenPoint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub visible_segments: usize,
    pub sprites_drawn: usize,
    pub vehicle_drawn: bool,
}

/// Render one frame of `sim`: backdrop, road, scenery, then the car.
pub fn render<P: Painter>(painter: &mut P, sim: &Simulation) -> FrameStats {
    let track = sim.track();
    let vehicle = sim.vehicle();
    let render_cfg = &sim.config().render;

    draw_background(painter, sim.backdrop(), vehicle.position);

    let base_index = track.segment_index_at(vehicle.position);
    let base_percent = (vehicle.position % track.segment_length()) / track.segment_length();
    let pass = RoadPass {
        track,
        projector: sim.projector(),
        camera: sim.camera(),
        look_back: track.segment_length() * sim.config().camera.distance,
        draw_distance: render_cfg.draw_distance,
        rumble_length: render_cfg.rumble_length,
    };
    let visible = pass.draw(painter, base_index, base_percent);

    let mut stats = FrameStats {
        visible_segments: visible.len(),
        ..FrameStats::default()
    };
    if visible.is_empty() {
        return stats;
    }
    stats.sprites_drawn = draw_scenery(painter, &visible);
    stats.vehicle_drawn = draw_vehicle(painter, &visible, vehicle);
    stats
}

pub fn draw_background<P: Painter>(painter: &mut P, backdrop: &Backdrop, position: f32) {
    let (width, height) = (painter.width(), painter.height());
    let k = height / BACKDROP_REFERENCE_HEIGHT;

    painter.fill_vertical_gradient(&SKY);

    let wrap = width + 400.0 * k;
    for cloud in &backdrop.clouds {
        let x = (cloud.x * k - position * 0.2).rem_euclid(wrap) - 200.0 * k;
        let (y, s) = (cloud.y * k, cloud.scale * k);
        painter.fill_ellipse([x, y], [60.0 * s, 24.0 * s], 0.0, CLOUD);
        painter.fill_ellipse([x + 40.0 * k, y + 10.0 * k], [50.0 * s, 20.0 * s], 0.0, CLOUD);
        painter.fill_ellipse([x + 80.0 * k, y], [70.0 * s, 28.0 * s], 0.0, CLOUD);
    }

    let mut ridge: Vec<[f32; 2]> = Vec::new();
    for layer in &backdrop.layers {
        ridge.clear();
        ridge.push([0.0, height]);
        let base_y = height * layer.base_factor;
        let mut x = -80.0;
        while x <= width + 160.0 {
            let wx = position * layer.parallax + x;
            ridge.push([x, base_y - layer.ridge(wx) * k]);
            x += 40.0;
        }
        ridge.push([width + 160.0, height]);
        painter.fill_polygon(&ridge, layer.color);
    }
}

/// One front-to-back walk over the road ahead of the camera.
pub struct RoadPass<'a> {
    pub track: &'a Track,
    pub projector: &'a Projector,
    pub camera: Camera,
    /// How far the camera trails the car, in world units.
    pub look_back: f32,
    pub draw_distance: usize,
    pub rumble_length: usize,
}

impl<'a> RoadPass<'a> {
    /// Paint the road and return the segments that were drawn, nearest first.
    pub fn draw<P: Painter>(
        &self,
        painter: &mut P,
        base_index: usize,
        base_percent: f32,
    ) -> Vec<VisibleSegment<'a>> {
        let track = self.track;
        let count = track.segment_count();
        let track_length = track.length();
        let base_index = base_index % count;
        let vp = self.projector.viewport;

        // near the start of a lap the wrapped look-back puts the camera at
        // the end of the loop; only then is it moved back one lap
        let mut camera = self.camera;
        let gap = track.segment(base_index).world.start_z + track_length - camera.pos.z;
        if gap > 0.0 && gap <= self.look_back + track.segment_length() {
            camera.pos.z -= track_length;
        }

        let mut visible = Vec::with_capacity(self.draw_distance);
        let mut max_y = vp.height;
        let mut x = 0.0;
        let mut dx = -track.segment(base_index).curve * base_percent;

        for n in 0..self.draw_distance {
            let index = base_index + n;
            let segment = track.segment(index);
            let loop_offset = if index >= count {
                (index / count) as f32 * track_length
            } else {
                0.0
            };

            let p1 = self.projector.project(
                Point3 {
                    x,
                    y: segment.world.start_y,
                    z: segment.world.start_z + loop_offset,
                },
                &camera,
            );

            x += dx;
            dx += segment.curve;

            let p2 = self.projector.project(
                Point3 {
                    x,
                    y: segment.world.end_y,
                    z: segment.world.end_z + loop_offset,
                },
                &camera,
            );

            let (Some(near), Some(far)) = (p1.screen, p2.screen) else {
                continue;
            };
            if near.y <= far.y || far.y >= max_y {
                continue;
            }

            let palette = palette_for(segment.index, self.rumble_length);

            let grass_top = far.y.max(0.0);
            painter.fill_rect(0.0, grass_top, vp.width, (max_y - grass_top).max(0.0), palette.grass);
            painter.fill_polygon(&trapezoid(&near, &far, SHOULDER_FACTOR), palette.shoulder);
            painter.fill_polygon(&trapezoid(&near, &far, 1.0), palette.road);
            painter.fill_polygon(&trapezoid(&near, &far, LANE_FACTOR), palette.lane);

            max_y = far.y;
            visible.push(VisibleSegment {
                segment,
                near,
                far,
            });
        }

        visible
    }
}

fn trapezoid(near: &ScreenPoint, far: &ScreenPoint, factor: f32) -> [[f32; 2]; 4] {
    let (w1, w2) = (near.w * factor, far.w * factor);
    [
        [near.x - w1, near.y],
        [far.x - w2, far.y],
        [far.x + w2, far.y],
        [near.x + w1, near.y],
    ]
}

/// Draw sprites farthest first so nearer ones overlap them. Returns how many
/// were drawn.
pub fn draw_scenery<P: Painter>(painter: &mut P, visible: &[VisibleSegment<'_>]) -> usize {
    let mut drawn = 0;
    for v in visible.iter().rev() {
        if v.segment.sprites.is_empty() {
            continue;
        }
        let road_half = (v.near.w + v.far.w) / 2.0;
        let base_x = (v.near.x + v.far.x) / 2.0;
        let base_y = v.far.y;

        for sprite in &v.segment.sprites {
            let width = road_half * sprite.size;
            let height = width * sprite.aspect;
            draw_sprite(
                painter,
                sprite.kind,
                base_x + sprite.offset * road_half,
                base_y,
                width,
                height,
            );
            drawn += 1;
        }
    }
    drawn
}

/// Silhouette for each sprite kind, standing on `(x, y)`.
pub fn draw_sprite<P: Painter>(painter: &mut P, kind: SpriteKind, x: f32, y: f32, width: f32, height: f32) {
    match kind {
        SpriteKind::Tree => {
            let trunk_w = width * 0.18;
            let trunk_h = height * 0.32;
            painter.fill_rect(x - trunk_w / 2.0, y - trunk_h, trunk_w, trunk_h, TRUNK);
            painter.fill_ellipse(
                [x, y - trunk_h - height * 0.4],
                [width * 0.55, height * 0.45],
                0.0,
                CANOPY,
            );
        }
        SpriteKind::Pine => {
            painter.fill_polygon(
                &[[x, y - height], [x + width * 0.55, y], [x - width * 0.55, y]],
                PINE,
            );
        }
        SpriteKind::Rock => {
            painter.fill_polygon(
                &[[x - width * 0.5, y], [x, y - height * 0.8], [x + width * 0.5, y]],
                ROCK,
            );
        }
        SpriteKind::Bush => {
            painter.fill_ellipse(
                [x - width * 0.2, y - height * 0.4],
                [width * 0.4, height * 0.5],
                0.0,
                BUSH,
            );
            painter.fill_ellipse(
                [x + width * 0.2, y - height * 0.3],
                [width * 0.45, height * 0.45],
                0.0,
                BUSH,
            );
        }
    }
}

/// Draw the car on the nearest visible segment. Returns false when there is
/// nothing to anchor it to.
pub fn draw_vehicle<P: Painter>(painter: &mut P, visible: &[VisibleSegment<'_>], vehicle: &VehicleState) -> bool {
    let Some(nearest) = visible.first() else {
        return false;
    };
    let road_half = nearest.near.w;
    let car_w = road_half * 0.65;
    let car_h = car_w * 0.48;
    let origin = [
        nearest.near.x + vehicle.lateral_offset * road_half,
        (painter.height() * 0.9).min(nearest.near.y + car_h * 0.3),
    ];
    let angle = vehicle.body_lean * LEAN_DAMPING;
    let (s, c) = angle.sin_cos();
    let place = |lx: f32, ly: f32| [origin[0] + lx * c - ly * s, origin[1] + lx * s + ly * c];
    let rect = |x: f32, y: f32, w: f32, h: f32| {
        [place(x, y), place(x + w, y), place(x + w, y + h), place(x, y + h)]
    };

    let body = [
        place(-car_w * 0.55, car_h * 0.3),
        place(car_w * 0.55, car_h * 0.3),
        place(car_w * 0.68, -car_h * 0.1),
        place(car_w * 0.4, -car_h * 0.9),
        place(-car_w * 0.35, -car_h * 0.95),
        place(-car_w * 0.68, -car_h * 0.2),
    ];
    painter.fill_polygon(&body, CAR_BODY);
    painter.fill_polygon(
        &rect(-car_w * 0.42, -car_h * 0.82, car_w * 0.58, car_h * 0.32),
        CAR_CABIN,
    );
    painter.fill_polygon(
        &rect(-car_w * 0.32, -car_h * 0.78, car_w * 0.46, car_h * 0.24),
        CAR_GLASS,
    );

    let wheel_r = car_h * 0.36;
    for side in [-1.0, 1.0] {
        painter.fill_ellipse(
            place(side * car_w * 0.4, car_h * 0.32),
            [wheel_r * 0.9, wheel_r],
            angle,
            CAR_WHEEL,
        );
    }
    true
}
