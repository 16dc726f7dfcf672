use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::transform::{world_to_screen, TopDownView, Viewport, PIXELS_PER_WORLD};
use crate::app::{ColliderKind, Entity, RenderableKind, SceneWorld, Vec3};

const CLEAR_COLOR: [u8; 4] = [24, 26, 32, 255];
const GRID_COLOR: [u8; 4] = [40, 44, 52, 255];
const TRIGGER_OUTLINE_COLOR: [u8; 4] = [250, 220, 90, 255];
const FACING_COLOR: [u8; 4] = [255, 255, 255, 255];
const DEFAULT_HALF_SIZE_WORLD: f32 = 0.25;
const FACING_TICK_WORLD: f32 = 0.6;

/// Top-down debug view centred on the live camera.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let view = TopDownView {
            center: world
                .cameras()
                .active()
                .map(|camera| camera.pose.position)
                .unwrap_or(Vec3::ZERO),
            pixels_per_world: PIXELS_PER_WORLD,
        };
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }
        draw_world_grid(frame, viewport, &view);

        let mut draw_order: Vec<&Entity> = world
            .entities()
            .iter()
            .filter(|entity| entity.renderable != RenderableKind::Hidden)
            .collect();
        draw_order.sort_by(|a, b| {
            a.transform
                .position
                .y
                .total_cmp(&b.transform.position.y)
        });
        for entity in draw_order {
            draw_entity(frame, viewport, &view, entity);
        }

        self.pixels.render()
    }
}

fn draw_entity(frame: &mut [u8], viewport: Viewport, view: &TopDownView, entity: &Entity) {
    let RenderableKind::Block { rgba } = entity.renderable else {
        return;
    };
    let half = entity
        .collider
        .map(|collider| collider.half_extents)
        .unwrap_or(Vec3::new(
            DEFAULT_HALF_SIZE_WORLD,
            DEFAULT_HALF_SIZE_WORLD,
            DEFAULT_HALF_SIZE_WORLD,
        ));
    let position = entity.transform.position;
    let (x0, y0) = world_to_screen(
        Vec3::new(position.x - half.x, 0.0, position.z + half.z),
        view,
        viewport,
    );
    let (x1, y1) = world_to_screen(
        Vec3::new(position.x + half.x, 0.0, position.z - half.z),
        view,
        viewport,
    );

    let is_trigger = entity
        .collider
        .is_some_and(|collider| collider.kind == ColliderKind::Trigger);
    if is_trigger {
        draw_rect_outline(frame, viewport, (x0, y0), (x1, y1), TRIGGER_OUTLINE_COLOR);
    } else {
        fill_rect(frame, viewport, (x0, y0), (x1, y1), rgba);
    }

    let facing = entity.transform.rotation.rotate(Vec3::FORWARD);
    let tip = position + facing.flatten() * FACING_TICK_WORLD;
    let from = world_to_screen(position, view, viewport);
    let to = world_to_screen(tip, view, viewport);
    draw_line(frame, viewport, from, to, FACING_COLOR);
}

fn draw_world_grid(frame: &mut [u8], viewport: Viewport, view: &TopDownView) {
    let half_w = viewport.width as f32 * 0.5 / view.pixels_per_world;
    let half_h = viewport.height as f32 * 0.5 / view.pixels_per_world;
    let min_x = (view.center.x - half_w).floor() as i32;
    let max_x = (view.center.x + half_w).ceil() as i32;
    let min_z = (view.center.z - half_h).floor() as i32;
    let max_z = (view.center.z + half_h).ceil() as i32;

    for gx in min_x..=max_x {
        let (sx, _) = world_to_screen(Vec3::new(gx as f32, 0.0, 0.0), view, viewport);
        for sy in 0..viewport.height as i32 {
            put_pixel(frame, viewport, sx, sy, GRID_COLOR);
        }
    }
    for gz in min_z..=max_z {
        let (_, sy) = world_to_screen(Vec3::new(0.0, 0.0, gz as f32), view, viewport);
        for sx in 0..viewport.width as i32 {
            put_pixel(frame, viewport, sx, sy, GRID_COLOR);
        }
    }
}

fn fill_rect(
    frame: &mut [u8],
    viewport: Viewport,
    top_left: (i32, i32),
    bottom_right: (i32, i32),
    rgba: [u8; 4],
) {
    for y in top_left.1..=bottom_right.1 {
        for x in top_left.0..=bottom_right.0 {
            put_pixel(frame, viewport, x, y, rgba);
        }
    }
}

fn draw_rect_outline(
    frame: &mut [u8],
    viewport: Viewport,
    top_left: (i32, i32),
    bottom_right: (i32, i32),
    rgba: [u8; 4],
) {
    for x in top_left.0..=bottom_right.0 {
        put_pixel(frame, viewport, x, top_left.1, rgba);
        put_pixel(frame, viewport, x, bottom_right.1, rgba);
    }
    for y in top_left.1..=bottom_right.1 {
        put_pixel(frame, viewport, top_left.0, y, rgba);
        put_pixel(frame, viewport, bottom_right.0, y, rgba);
    }
}

fn draw_line(frame: &mut [u8], viewport: Viewport, from: (i32, i32), to: (i32, i32), rgba: [u8; 4]) {
    let dx = (to.0 - from.0).abs();
    let dy = -(to.1 - from.1).abs();
    let step_x = if from.0 < to.0 { 1 } else { -1 };
    let step_y = if from.1 < to.1 { 1 } else { -1 };
    let (mut x, mut y) = from;
    let mut err = dx + dy;
    loop {
        put_pixel(frame, viewport, x, y, rgba);
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += step_x;
        }
        if doubled <= dx {
            err += dx;
            y += step_y;
        }
    }
}

fn put_pixel(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, rgba: [u8; 4]) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let idx = (y as usize * viewport.width as usize + x as usize) * 4;
    if let Some(pixel) = frame.get_mut(idx..idx + 4) {
        pixel.copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 4,
        height: 3,
    };

    #[test]
    fn put_pixel_ignores_out_of_bounds() {
        let mut frame = vec![0u8; 4 * 3 * 4];
        put_pixel(&mut frame, VIEWPORT, -1, 0, [9, 9, 9, 9]);
        put_pixel(&mut frame, VIEWPORT, 4, 0, [9, 9, 9, 9]);
        put_pixel(&mut frame, VIEWPORT, 0, 3, [9, 9, 9, 9]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn fill_rect_writes_inclusive_corners() {
        let mut frame = vec![0u8; 4 * 3 * 4];
        let color: [u8; 4] = [1, 2, 3, 4];
        fill_rect(&mut frame, VIEWPORT, (1, 1), (2, 2), color);
        let painted = frame
            .chunks_exact(4)
            .filter(|px| **px == color[..])
            .count();
        assert_eq!(painted, 4);
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = vec![0u8; 4 * 3 * 4];
        draw_line(&mut frame, VIEWPORT, (0, 0), (3, 2), [7, 7, 7, 7]);
        assert_eq!(&frame[0..4], &[7, 7, 7, 7]);
        let last = (2 * 4 + 3) * 4;
        assert_eq!(&frame[last..last + 4], &[7, 7, 7, 7]);
    }
}
