use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::scene::{SceneLoadError, SceneRuntime};
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneCommand, SceneWorld};

pub const SLOW_FRAME_ENV_VAR: &str = "PUZZLE_ROOM_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_headless_ticks: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Puzzle Room".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_headless_ticks: 60 * 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    SceneLoad(#[from] SceneLoadError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Supplies input for headless runs. Returning `None` ends the run.
pub trait InputScript {
    fn next_input(&mut self, tick: u64, world: &SceneWorld) -> Option<InputSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessStop {
    ScriptFinished,
    SceneQuit,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessReport {
    pub ticks_run: u64,
    pub stopped_by: HeadlessStop,
}

/// Runs `scene` at a fixed step without a window, driven by `script`.
/// `inspect` sees the world after every tick and once more after the
/// run ends, before the scene is unloaded.
pub fn run_headless(
    config: &LoopConfig,
    scene: Box<dyn Scene>,
    script: &mut dyn InputScript,
    mut inspect: impl FnMut(u64, &SceneWorld),
) -> Result<HeadlessReport, AppError> {
    let mut runtime = SceneRuntime::new(scene);
    runtime.load()?;
    info!(
        entity_count = runtime.world().entity_count(),
        "scene_loaded"
    );

    let fixed_dt_seconds = 1.0 / config.target_tps.max(1) as f32;
    let mut ticks_run = 0u64;
    let stopped_by = loop {
        if ticks_run >= config.max_headless_ticks {
            break HeadlessStop::TickLimit;
        }
        let Some(input) = script.next_input(ticks_run, runtime.world()) else {
            break HeadlessStop::ScriptFinished;
        };
        let command = runtime.update(fixed_dt_seconds, &input);
        ticks_run += 1;
        inspect(ticks_run, runtime.world());
        if command == SceneCommand::Quit || input.quit_requested() {
            break HeadlessStop::SceneQuit;
        }
    };

    inspect(ticks_run, runtime.world());
    info!(ticks_run, stopped_by = ?stopped_by, "headless_finished");
    runtime.shutdown();
    Ok(HeadlessReport {
        ticks_run,
        stopped_by,
    })
}

/// Opens a window and runs `scene` with keyboard input and the top-down view.
pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let mut runtime = SceneRuntime::new(scene);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let mut input_collector = InputCollector::default();

    runtime.load()?;
    info!(
        entity_count = runtime.world().entity_count(),
        "scene_loaded"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_physical_key(event.physical_key, event.state);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if slow_frame_delay > Duration::ZERO {
                        // Explicit debug perturbation only.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator =
                        accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        let command = runtime.update(fixed_dt_seconds, &input_snapshot);
                        metrics_accumulator.record_tick();
                        if command == SceneCommand::Quit {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    runtime.render();
                    if let Err(error) = renderer.render_world(runtime.world()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    let next_title = runtime.debug_title();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            entity_count = runtime.world().entity_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    jump_is_down: bool,
    jump_pressed_edge: bool,
    interact_is_down: bool,
    interact_pressed_edge: bool,
    reset_is_down: bool,
    reset_pressed_edge: bool,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        let Some(action) = action_for_key(key) else {
            return;
        };
        self.action_states.set(action, is_pressed);
        match action {
            InputAction::Jump => {
                update_edge(&mut self.jump_is_down, &mut self.jump_pressed_edge, is_pressed)
            }
            InputAction::Interact => update_edge(
                &mut self.interact_is_down,
                &mut self.interact_pressed_edge,
                is_pressed,
            ),
            InputAction::Reset => update_edge(
                &mut self.reset_is_down,
                &mut self.reset_pressed_edge,
                is_pressed,
            ),
            InputAction::Quit if is_pressed => self.mark_quit_requested(),
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::from_collector(
            self.quit_requested,
            &self.action_states,
            self.jump_pressed_edge,
            self.interact_pressed_edge,
            self.reset_pressed_edge,
        );
        self.jump_pressed_edge = false;
        self.interact_pressed_edge = false;
        self.reset_pressed_edge = false;
        snapshot
    }
}

fn update_edge(is_down: &mut bool, pressed_edge: &mut bool, is_pressed: bool) {
    if is_pressed && !*is_down {
        *pressed_edge = true;
    }
    *is_down = is_pressed;
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveForward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveBack),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyJ => Some(InputAction::LookLeft),
        KeyCode::KeyL => Some(InputAction::LookRight),
        KeyCode::Space => Some(InputAction::Jump),
        KeyCode::KeyE => Some(InputAction::Interact),
        KeyCode::KeyR => Some(InputAction::Reset),
        KeyCode::Escape => Some(InputAction::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::replace(&mut accumulator, Duration::ZERO)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{SpawnDesc, Vec2, Vec3};

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let result = plan_sim_steps(Duration::from_millis(48), Duration::from_millis(16), 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let result = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn jump_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Space), ElementState::Pressed);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.jump_pressed());
        assert!(!second.jump_pressed());
    }

    #[test]
    fn held_interact_does_not_repeat_pressed_edge() {
        let mut input = InputCollector::default();

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Pressed);
        assert!(input.snapshot_for_tick().interact_pressed());
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Pressed);
        assert!(!input.snapshot_for_tick().interact_pressed());
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Released);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Pressed);
        assert!(input.snapshot_for_tick().interact_pressed());
    }

    #[test]
    fn wasd_and_arrow_keys_build_the_move_axis() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyD), ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().move_axis(), Vec2::new(1.0, 0.0));

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyD), ElementState::Released);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::ArrowUp), ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().move_axis(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn look_keys_map_to_look_axis() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyJ), ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().look_axis(), -1.0);
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed);
        assert!(input.quit_requested);
        assert!(input.snapshot_for_tick().quit_requested());
    }

    struct DriftScene {
        body: Option<crate::app::EntityId>,
    }

    impl Scene for DriftScene {
        fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError> {
            self.body = Some(world.spawn(SpawnDesc::new("body", Vec3::ZERO)));
            Ok(())
        }

        fn update(
            &mut self,
            fixed_dt_seconds: f32,
            input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            if let Some(entity) = self.body.and_then(|id| world.find_entity_mut(id)) {
                entity.transform.position.x += input.move_axis().x * fixed_dt_seconds;
            }
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    struct FixedTicks(u64);

    impl InputScript for FixedTicks {
        fn next_input(&mut self, tick: u64, _world: &SceneWorld) -> Option<InputSnapshot> {
            (tick < self.0).then(|| InputSnapshot::empty().with_move_axis(Vec2::new(1.0, 0.0)))
        }
    }

    #[test]
    fn headless_run_stops_when_script_finishes() {
        let config = LoopConfig::default();
        let mut last_x = 0.0;
        let report = run_headless(
            &config,
            Box::new(DriftScene { body: None }),
            &mut FixedTicks(60),
            |_, world| last_x = world.entities()[0].transform.position.x,
        )
        .expect("headless run");

        assert_eq!(report.ticks_run, 60);
        assert_eq!(report.stopped_by, HeadlessStop::ScriptFinished);
        assert!((last_x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn headless_run_respects_tick_limit() {
        let config = LoopConfig {
            max_headless_ticks: 10,
            ..LoopConfig::default()
        };
        let report = run_headless(
            &config,
            Box::new(DriftScene { body: None }),
            &mut FixedTicks(u64::MAX),
            |_, _| {},
        )
        .expect("headless run");

        assert_eq!(report.ticks_run, 10);
        assert_eq!(report.stopped_by, HeadlessStop::TickLimit);
    }
}
