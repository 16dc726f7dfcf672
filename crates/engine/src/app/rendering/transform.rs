use crate::app::Vec3;

pub const PIXELS_PER_WORLD: f32 = 40.0;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Orthographic view looking straight down -Y. World +X maps to screen
/// right and world +Z to screen up.
#[derive(Debug, Clone, Copy)]
pub struct TopDownView {
    pub center: Vec3,
    pub pixels_per_world: f32,
}

pub fn world_to_screen(world: Vec3, view: &TopDownView, viewport: Viewport) -> (i32, i32) {
    let x = (world.x - view.center.x) * view.pixels_per_world + viewport.width as f32 * 0.5;
    let y = viewport.height as f32 * 0.5 - (world.z - view.center.z) * view.pixels_per_world;
    (x.round() as i32, y.round() as i32)
}
