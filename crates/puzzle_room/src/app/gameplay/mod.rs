use engine::{EntityTag, Scene};
use thiserror::Error;

use super::settings::RoomSettings;

mod camera_follow;
mod demo;
mod goal;
mod interaction;
mod locomotion;
mod maze;
mod puzzle;
mod scene_impl;

pub(crate) use demo::{DemoProgress, DemoScript};
use scene_impl::PuzzleRoomScene;

pub(crate) const PLAYER_NAME: &str = "Player";
pub(crate) const BUTTON_NAME: &str = "PuzzleButton";
pub(crate) const MAZE_NAME: &str = "Maze";
pub(crate) const KEY_NAME: &str = "KeyBall";
pub(crate) const GOAL_NAME: &str = "Goal";
pub(crate) const DOOR_NAME: &str = "Door";
pub(crate) const MAIN_CAMERA_NAME: &str = "MainCamera";
pub(crate) const PUZZLE_CAMERA_NAME: &str = "PuzzleCamera";

pub(crate) const PLAYER_TAG: EntityTag = EntityTag("player");
pub(crate) const KEY_OBJECT_TAG: EntityTag = EntityTag("key_object");
pub(crate) const INTERACTABLE_TAG: EntityTag = EntityTag("interactable");

/// Scene wiring faults. All of them are fatal at load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum GameplayError {
    #[error("camera `{name}` is not registered")]
    MissingCamera { name: &'static str },
    #[error("entity `{name}` was not spawned")]
    MissingEntity { name: &'static str },
    #[error("no entity carries tag `{}`", tag.0)]
    MissingTaggedEntity { tag: EntityTag },
}

pub(crate) fn build_scene(settings: RoomSettings) -> Box<dyn Scene> {
    Box::new(PuzzleRoomScene::new(settings))
}
