use engine::{InputScript, InputSnapshot, SceneWorld, Vec2};
use tracing::{info, warn};

use super::scene_impl::DOOR_POSITION;
use super::{DOOR_NAME, PLAYER_NAME, PUZZLE_CAMERA_NAME};

const WALK_TO_BUTTON_TICKS: u64 = 60;
const TILT_BUDGET_TICKS: u64 = 900;
const WALK_THROUGH_DOOR_TICKS: u64 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemoPhase {
    WalkToButton { remaining: u64 },
    PressButton,
    SteerKey { remaining: u64, puzzle_seen: bool },
    WalkThroughDoor { remaining: u64, jumped: bool },
    Finished,
}

impl DemoPhase {
    fn label(self) -> &'static str {
        match self {
            DemoPhase::WalkToButton { .. } => "walk_to_button",
            DemoPhase::PressButton => "press_button",
            DemoPhase::SteerKey { .. } => "steer_key",
            DemoPhase::WalkThroughDoor { .. } => "walk_through_door",
            DemoPhase::Finished => "finished",
        }
    }
}

/// Scripted playthrough for headless runs: walk to the button, press it,
/// steer the key ball into the goal, then jump and walk through the door.
#[derive(Debug, Clone)]
pub(crate) struct DemoScript {
    phase: DemoPhase,
}

impl Default for DemoScript {
    fn default() -> Self {
        Self {
            phase: DemoPhase::WalkToButton {
                remaining: WALK_TO_BUTTON_TICKS,
            },
        }
    }
}

impl InputScript for DemoScript {
    fn next_input(&mut self, tick: u64, world: &SceneWorld) -> Option<InputSnapshot> {
        let puzzle_camera_live = world
            .cameras()
            .active()
            .is_some_and(|camera| camera.name == PUZZLE_CAMERA_NAME);

        let (input, next) = match self.phase {
            DemoPhase::WalkToButton { remaining } => (
                Some(InputSnapshot::empty().with_move_axis(Vec2::new(1.0, 0.0))),
                if remaining <= 1 {
                    DemoPhase::PressButton
                } else {
                    DemoPhase::WalkToButton {
                        remaining: remaining - 1,
                    }
                },
            ),
            DemoPhase::PressButton => (
                Some(InputSnapshot::empty().with_interact_pressed(true)),
                DemoPhase::SteerKey {
                    remaining: TILT_BUDGET_TICKS,
                    puzzle_seen: false,
                },
            ),
            DemoPhase::SteerKey { remaining: 0, .. } => {
                warn!(tick, "demo_key_never_reached_goal");
                (None, DemoPhase::Finished)
            }
            DemoPhase::SteerKey {
                puzzle_seen: true, ..
            } if !puzzle_camera_live => (
                Some(InputSnapshot::empty()),
                DemoPhase::WalkThroughDoor {
                    remaining: WALK_THROUGH_DOOR_TICKS,
                    jumped: false,
                },
            ),
            DemoPhase::SteerKey {
                remaining,
                puzzle_seen,
            } => (
                Some(InputSnapshot::empty().with_move_axis(Vec2::new(1.0, 1.0))),
                DemoPhase::SteerKey {
                    remaining: remaining - 1,
                    puzzle_seen: puzzle_seen || puzzle_camera_live,
                },
            ),
            DemoPhase::WalkThroughDoor { remaining, jumped } => (
                Some(
                    InputSnapshot::empty()
                        .with_move_axis(Vec2::new(0.0, 1.0))
                        .with_jump_pressed(!jumped),
                ),
                if remaining <= 1 {
                    DemoPhase::Finished
                } else {
                    DemoPhase::WalkThroughDoor {
                        remaining: remaining - 1,
                        jumped: true,
                    }
                },
            ),
            DemoPhase::Finished => (None, DemoPhase::Finished),
        };

        if next.label() != self.phase.label() {
            info!(tick, phase = next.label(), "demo_phase");
        }
        self.phase = next;
        input
    }
}

/// What a headless run achieved, folded from per-tick world observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DemoProgress {
    pub(crate) door_open: bool,
    pub(crate) player_past_door: bool,
}

impl DemoProgress {
    pub(crate) fn observe(&mut self, world: &SceneWorld) {
        let position_of = |name: &str| {
            world
                .find_by_name(name)
                .and_then(|id| world.find_entity(id))
                .map(|entity| entity.transform.position)
        };
        let Some(door) = position_of(DOOR_NAME) else {
            return;
        };
        self.door_open |= door.y > DOOR_POSITION.y;
        if let Some(player) = position_of(PLAYER_NAME) {
            self.player_past_door |= player.z > door.z;
        }
    }
}
