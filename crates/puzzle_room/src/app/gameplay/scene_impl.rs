use std::cell::Cell;
use std::rc::Rc;

use engine::{
    CameraPose, Collider, EntityId, InputSnapshot, InputStream, KinematicMotion, RenderableKind,
    Scene, SceneCommand, SceneLoadError, SceneWorld, SpawnDesc, TriggerTracker, Vec3,
};
use tracing::{debug, info, trace, warn};

use super::camera_follow::FollowCamera;
use super::goal::GoalGate;
use super::interaction::{Interactable, InteractionContext, Interactor, PuzzleButton};
use super::locomotion::LocomotionController;
use super::maze::TiltMaze;
use super::puzzle::PuzzleCoordinator;
use super::{
    GameplayError, BUTTON_NAME, DOOR_NAME, GOAL_NAME, INTERACTABLE_TAG, KEY_NAME, KEY_OBJECT_TAG,
    MAIN_CAMERA_NAME, MAZE_NAME, PLAYER_NAME, PLAYER_TAG, PUZZLE_CAMERA_NAME,
};
use crate::app::settings::RoomSettings;

const SCENE_NAME: &str = "puzzle_room";

pub(crate) const PLAYER_SPAWN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const PLAYER_HALF_EXTENTS: Vec3 = Vec3::new(0.4, 1.0, 0.4);
pub(crate) const BUTTON_POSITION: Vec3 = Vec3::new(3.0, 0.5, 0.0);
const BUTTON_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.5, 0.3);
const MAZE_POSITION: Vec3 = Vec3::new(6.0, 0.5, 0.0);
const MAZE_HALF_EXTENTS: Vec3 = Vec3::new(1.5, 0.5, 1.5);
pub(crate) const KEY_SPAWN: Vec3 = Vec3::new(4.8, 1.15, -1.2);
const KEY_HALF_EXTENTS: Vec3 = Vec3::new(0.15, 0.15, 0.15);
pub(crate) const GOAL_POSITION: Vec3 = Vec3::new(7.1, 1.15, 1.1);
const GOAL_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.3, 0.3);
pub(crate) const DOOR_POSITION: Vec3 = Vec3::new(2.0, 2.0, 6.0);
const DOOR_HALF_EXTENTS: Vec3 = Vec3::new(1.5, 2.0, 0.2);
const PUZZLE_CAMERA_POSE: CameraPose = CameraPose {
    position: Vec3::new(6.0, 8.0, 0.0),
    yaw_degrees: 0.0,
    pitch_degrees: 90.0,
};

const PLAYER_COLOR: [u8; 4] = [70, 140, 240, 255];
const BUTTON_COLOR: [u8; 4] = [220, 70, 60, 255];
const MAZE_COLOR: [u8; 4] = [120, 100, 80, 255];
const KEY_COLOR: [u8; 4] = [250, 210, 60, 255];
const DOOR_COLOR: [u8; 4] = [90, 90, 100, 255];

/// Systems wired against the spawned room. Present only while loaded.
struct RoomSystems {
    follow: FollowCamera,
    interactor: Interactor,
    interactables: Vec<Box<dyn Interactable>>,
    locomotion: LocomotionController,
    motion: KinematicMotion,
    puzzle: PuzzleCoordinator,
    triggers: TriggerTracker,
    goal: GoalGate,
    door_open: Rc<Cell<bool>>,
}

pub(crate) struct PuzzleRoomScene {
    settings: RoomSettings,
    room: Option<RoomSystems>,
}

impl PuzzleRoomScene {
    pub(crate) fn new(settings: RoomSettings) -> Self {
        Self {
            settings,
            room: None,
        }
    }

    fn wire(&self, world: &mut SceneWorld) -> Result<RoomSystems, GameplayError> {
        let player = require_entity(world, PLAYER_NAME)?;
        let button = require_entity(world, BUTTON_NAME)?;
        let goal_volume = require_entity(world, GOAL_NAME)?;

        for stream in [InputStream::Interact, InputStream::MazeTilt, InputStream::Look] {
            world.input_map_mut().enable(stream);
        }

        let follow = FollowCamera::attach(self.settings.camera.clone(), player, world)?;
        let locomotion =
            LocomotionController::activate(self.settings.locomotion.clone(), player, world)?;
        let maze = TiltMaze::attach(self.settings.maze.clone(), world)?;
        let puzzle =
            PuzzleCoordinator::activate(self.settings.puzzle.clone(), Box::new(maze), world)?;

        let door_open = Rc::new(Cell::new(false));
        let mut goal = GoalGate::new(goal_volume);
        let flag = Rc::clone(&door_open);
        goal.subscribe(move |_| flag.set(true));

        Ok(RoomSystems {
            follow,
            interactor: Interactor::new(player, self.settings.puzzle.interaction_radius),
            interactables: vec![Box::new(PuzzleButton::new(
                button,
                self.settings.puzzle.prompt.clone(),
            ))],
            locomotion,
            motion: KinematicMotion::default(),
            puzzle,
            triggers: TriggerTracker::default(),
            goal,
            door_open,
        })
    }
}

#[cfg(test)]
impl PuzzleRoomScene {
    pub(crate) fn puzzle_state(&self) -> Option<super::puzzle::PuzzleState> {
        self.room.as_ref().map(|room| room.puzzle.state())
    }

    pub(crate) fn maze_enabled(&self) -> bool {
        self.room
            .as_ref()
            .is_some_and(|room| room.puzzle.maze().is_enabled())
    }

    pub(crate) fn unlock_count(&self) -> u64 {
        self.room.as_ref().map_or(0, |room| room.goal.unlock_count())
    }

    pub(crate) fn prompt(&self) -> Option<&str> {
        let room = self.room.as_ref()?;
        room.interactor.prompt(&room.interactables)
    }

    pub(crate) fn player_vertical_velocity(&self) -> Option<f32> {
        self.room
            .as_ref()
            .map(|room| room.locomotion.vertical_velocity())
    }
}

impl Scene for PuzzleRoomScene {
    fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError> {
        spawn_room(world, &self.settings);
        world.apply_pending();

        let room = self.wire(world).map_err(|err| SceneLoadError {
            scene: SCENE_NAME,
            message: err.to_string(),
        })?;
        self.room = Some(room);
        info!(
            entity_count = world.entity_count(),
            camera_count = world.cameras().cameras().len(),
            "room_ready"
        );
        Ok(())
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        let Some(room) = self.room.as_mut() else {
            warn!("room_update_before_load");
            return SceneCommand::None;
        };

        if input.reset_pressed() {
            room.puzzle.reset(world);
        }

        room.follow.step(fixed_dt_seconds, input, world);

        let mut context = InteractionContext {
            world: &mut *world,
            puzzle: &mut room.puzzle,
        };
        room.interactor
            .step(input, &mut room.interactables, &mut context);

        let step = room
            .locomotion
            .step(fixed_dt_seconds, input, world, &mut room.motion);
        if step.jumped {
            debug!(rise = step.vertical.y, "player_jumped");
        }
        trace!(
            dx = step.horizontal.x,
            dy = step.vertical.y,
            dz = step.horizontal.z,
            "player_moved"
        );
        room.puzzle.step_maze(fixed_dt_seconds, input, world);

        for enter in room.triggers.collect_enter_events(world) {
            room.goal.on_trigger_enter(enter, world, &mut room.puzzle);
        }

        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        let Some(room) = self.room.take() else {
            return;
        };
        info!(
            final_state = ?room.puzzle.state(),
            unlocks = room.goal.unlock_count(),
            "room_unloaded"
        );
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let room = self.room.as_ref()?;
        let state = room.puzzle.state();
        let controls = if state.is_free_roam() { "walk" } else { "tilt" };
        let door = if room.door_open.get() { "open" } else { "locked" };
        let mut title = format!("Puzzle Room | {state:?} ({controls}) | door {door}");
        if let Some(prompt) = room.interactor.prompt(&room.interactables) {
            title.push_str(" | ");
            title.push_str(prompt);
        }
        Some(title)
    }
}

fn require_entity(world: &SceneWorld, name: &'static str) -> Result<EntityId, GameplayError> {
    world
        .find_by_name(name)
        .ok_or(GameplayError::MissingEntity { name })
}

fn spawn_room(world: &mut SceneWorld, settings: &RoomSettings) {
    world.spawn(
        SpawnDesc::new(PLAYER_NAME, PLAYER_SPAWN)
            .with_renderable(RenderableKind::Block { rgba: PLAYER_COLOR })
            .with_collider(Collider::solid(PLAYER_HALF_EXTENTS))
            .with_tag(PLAYER_TAG),
    );
    world.spawn(
        SpawnDesc::new(BUTTON_NAME, BUTTON_POSITION)
            .with_renderable(RenderableKind::Block { rgba: BUTTON_COLOR })
            .with_collider(Collider::solid(BUTTON_HALF_EXTENTS))
            .with_tag(INTERACTABLE_TAG),
    );
    world.spawn(
        SpawnDesc::new(MAZE_NAME, MAZE_POSITION)
            .with_renderable(RenderableKind::Block { rgba: MAZE_COLOR })
            .with_collider(Collider::solid(MAZE_HALF_EXTENTS)),
    );
    world.spawn(
        SpawnDesc::new(KEY_NAME, KEY_SPAWN)
            .with_renderable(RenderableKind::Block { rgba: KEY_COLOR })
            .with_collider(Collider::solid(KEY_HALF_EXTENTS))
            .with_tag(KEY_OBJECT_TAG),
    );
    world.spawn(
        SpawnDesc::new(GOAL_NAME, GOAL_POSITION)
            .with_renderable(RenderableKind::Block {
                rgba: [250, 220, 90, 255],
            })
            .with_collider(Collider::trigger(GOAL_HALF_EXTENTS)),
    );
    world.spawn(
        SpawnDesc::new(DOOR_NAME, DOOR_POSITION)
            .with_renderable(RenderableKind::Block { rgba: DOOR_COLOR })
            .with_collider(Collider::solid(DOOR_HALF_EXTENTS)),
    );

    let cameras = world.cameras_mut();
    cameras.register(
        MAIN_CAMERA_NAME,
        settings.puzzle.main_camera_priority,
        CameraPose::default(),
    );
    cameras.register(
        PUZZLE_CAMERA_NAME,
        settings.puzzle.dormant_camera_priority,
        PUZZLE_CAMERA_POSE,
    );
}
