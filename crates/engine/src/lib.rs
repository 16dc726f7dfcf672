//! Host primitives for small fixed-step 3D gameplay scenes: input streams,
//! a tagged entity world, kinematic motion with triggers, a priority camera
//! rig, observer channels, and a loop runner (windowed or headless).

pub mod app;

pub use app::{
    run_app, run_headless, world_to_screen, Aabb, ActionMap, AppError, CameraId, CameraPose,
    CameraRig, Collider, ColliderKind, Entity, EntityId, EntityIdAllocator, EntityTag,
    EventChannel, HeadlessReport, HeadlessStop, InputAction, InputScript, InputSnapshot,
    InputStream, KinematicMotion, ListenerId, LoopConfig, LoopMetricsSnapshot, MotionHost, Quat,
    RenderableKind, Renderer, Scene, SceneCommand, SceneLoadError, SceneWorld, SpawnDesc,
    TopDownView, Transform, TriggerEnter, TriggerTracker, Vec2, Vec3, Viewport, VirtualCamera,
    PIXELS_PER_WORLD, SLOW_FRAME_ENV_VAR,
};
