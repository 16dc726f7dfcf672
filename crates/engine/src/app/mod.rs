mod camera;
mod events;
mod input;
mod loop_runner;
mod math;
mod metrics;
mod physics;
mod rendering;
mod scene;

pub use camera::{CameraId, CameraPose, CameraRig, VirtualCamera};
pub use events::{EventChannel, ListenerId};
pub use input::{ActionMap, InputAction, InputSnapshot, InputStream};
pub use loop_runner::{
    run_app, run_headless, AppError, HeadlessReport, HeadlessStop, InputScript, LoopConfig,
    SLOW_FRAME_ENV_VAR,
};
pub use math::{Aabb, Quat, Vec2, Vec3};
pub use metrics::LoopMetricsSnapshot;
pub use physics::{KinematicMotion, MotionHost, TriggerEnter, TriggerTracker};
pub use rendering::{world_to_screen, Renderer, TopDownView, Viewport, PIXELS_PER_WORLD};
pub use scene::{
    Collider, ColliderKind, Entity, EntityId, EntityIdAllocator, EntityTag, RenderableKind, Scene,
    SceneCommand, SceneLoadError, SceneWorld, SpawnDesc, Transform,
};
