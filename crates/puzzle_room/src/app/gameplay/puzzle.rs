use engine::{CameraId, EntityId, InputSnapshot, InputStream, SceneWorld};
use tracing::{info, warn};

use super::maze::MazeBehavior;
use super::{GameplayError, DOOR_NAME, PUZZLE_CAMERA_NAME};
use crate::app::settings::PuzzleSettings;

/// Input streams owned by the locomotion controller.
pub(crate) const LOCOMOTION_STREAMS: [InputStream; 2] = [InputStream::Movement, InputStream::Jump];

/// Streams parked while the maze has control. Look is included so the main
/// camera basis is unchanged when locomotion resumes.
const SUSPENDED_STREAMS: [InputStream; 3] =
    [InputStream::Movement, InputStream::Jump, InputStream::Look];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PuzzleState {
    /// Player roams; the puzzle has not been started.
    Free,
    /// Player input suspended; the maze is live under the puzzle camera.
    Active,
    /// Key delivered and door opened. Player roams again.
    Resolved,
}

impl PuzzleState {
    pub(crate) fn is_free_roam(self) -> bool {
        matches!(self, PuzzleState::Free | PuzzleState::Resolved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PuzzleRequest {
    Begin,
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Applied { from: PuzzleState, to: PuzzleState },
    /// Already in the requested state. Nothing was re-applied.
    Unchanged(PuzzleState),
    /// Not valid from the current state. Nothing was applied.
    Rejected {
        state: PuzzleState,
        request: PuzzleRequest,
    },
}

impl Transition {
    pub(crate) fn is_applied(self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Owns the puzzle state and fans every transition out to the input map,
/// the maze, the puzzle camera and the door.
pub(crate) struct PuzzleCoordinator {
    settings: PuzzleSettings,
    state: PuzzleState,
    maze: Box<dyn MazeBehavior>,
    puzzle_camera: CameraId,
    door: EntityId,
}

impl PuzzleCoordinator {
    /// Resolves collaborators once and forces the dormant setup: maze off,
    /// puzzle camera at the dormant priority.
    pub(crate) fn activate(
        settings: PuzzleSettings,
        mut maze: Box<dyn MazeBehavior>,
        world: &mut SceneWorld,
    ) -> Result<Self, GameplayError> {
        let puzzle_camera = world
            .cameras()
            .find_by_name(PUZZLE_CAMERA_NAME)
            .ok_or(GameplayError::MissingCamera {
                name: PUZZLE_CAMERA_NAME,
            })?;
        let door = world
            .find_by_name(DOOR_NAME)
            .ok_or(GameplayError::MissingEntity { name: DOOR_NAME })?;

        maze.set_enabled(false, world);
        world
            .cameras_mut()
            .set_priority(puzzle_camera, settings.dormant_camera_priority);

        Ok(Self {
            settings,
            state: PuzzleState::Free,
            maze,
            puzzle_camera,
            door,
        })
    }

    pub(crate) fn state(&self) -> PuzzleState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn maze(&self) -> &dyn MazeBehavior {
        self.maze.as_ref()
    }

    pub(crate) fn step_maze(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) {
        self.maze.step(fixed_dt_seconds, input, world);
    }

    pub(crate) fn request(&mut self, request: PuzzleRequest, world: &mut SceneWorld) -> Transition {
        let from = self.state;
        let to = match (from, request) {
            (PuzzleState::Free, PuzzleRequest::Begin) => PuzzleState::Active,
            (PuzzleState::Active, PuzzleRequest::Resolve) => PuzzleState::Resolved,
            (PuzzleState::Active, PuzzleRequest::Begin)
            | (PuzzleState::Resolved, PuzzleRequest::Resolve) => {
                return Transition::Unchanged(from);
            }
            (state, request) => {
                warn!(state = ?state, request = ?request, "puzzle_request_ignored");
                return Transition::Rejected { state, request };
            }
        };

        match to {
            PuzzleState::Active => self.enter_active(world),
            PuzzleState::Resolved => self.enter_resolved(world),
            PuzzleState::Free => {}
        }
        self.state = to;
        Transition::Applied { from, to }
    }

    /// Returns a finished or running puzzle to `Free`. The door keeps its
    /// current position.
    pub(crate) fn reset(&mut self, world: &mut SceneWorld) -> Transition {
        let from = self.state;
        if from == PuzzleState::Free {
            return Transition::Unchanged(from);
        }
        self.enter_free_roam(world);
        self.state = PuzzleState::Free;
        info!(from = ?from, "puzzle_reset");
        Transition::Applied {
            from,
            to: PuzzleState::Free,
        }
    }

    fn enter_active(&mut self, world: &mut SceneWorld) {
        let input_map = world.input_map_mut();
        for stream in SUSPENDED_STREAMS {
            input_map.disable(stream);
        }
        self.maze.set_enabled(true, world);
        world
            .cameras_mut()
            .set_priority(self.puzzle_camera, self.settings.active_camera_priority);
        info!(
            camera_priority = self.settings.active_camera_priority,
            "puzzle_activated"
        );
    }

    fn enter_resolved(&mut self, world: &mut SceneWorld) {
        self.enter_free_roam(world);
        let offset = self.settings.door_offset;
        if let Some(door) = world.find_entity_mut(self.door) {
            door.transform.position += offset;
            info!(
                door = door.id.0,
                x = door.transform.position.x,
                y = door.transform.position.y,
                z = door.transform.position.z,
                "puzzle_resolved"
            );
        } else {
            warn!(door = self.door.0, "puzzle_door_missing");
        }
    }

    fn enter_free_roam(&mut self, world: &mut SceneWorld) {
        world
            .cameras_mut()
            .set_priority(self.puzzle_camera, self.settings.dormant_camera_priority);
        let input_map = world.input_map_mut();
        for stream in SUSPENDED_STREAMS {
            input_map.enable(stream);
        }
        self.maze.set_enabled(false, world);
    }
}
