use engine::{EntityId, InputSnapshot, InputStream, Quat, SceneWorld, Vec2, Vec3};
use tracing::{debug, warn};

use super::{GameplayError, KEY_OBJECT_TAG, MAZE_NAME};
use crate::app::settings::MazeSettings;

/// Maze simulation toggled by the puzzle coordinator.
pub(crate) trait MazeBehavior {
    /// Returns `true` only when the flag actually changed.
    fn set_enabled(&mut self, enabled: bool, world: &mut SceneWorld) -> bool;
    fn is_enabled(&self) -> bool;
    fn step(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld);
}

/// Tilting board that rolls the key ball. Idle while disabled.
#[derive(Debug, Clone)]
pub(crate) struct TiltMaze {
    settings: MazeSettings,
    board: EntityId,
    ball: EntityId,
    enabled: bool,
    tilt_degrees: Vec2,
    ball_velocity: Vec3,
    enable_transitions: u32,
}

impl TiltMaze {
    pub(crate) fn attach(settings: MazeSettings, world: &SceneWorld) -> Result<Self, GameplayError> {
        let board = world
            .find_by_name(MAZE_NAME)
            .ok_or(GameplayError::MissingEntity { name: MAZE_NAME })?;
        let ball = world
            .entities_with_tag(KEY_OBJECT_TAG)
            .map(|entity| entity.id)
            .next()
            .ok_or(GameplayError::MissingTaggedEntity {
                tag: KEY_OBJECT_TAG,
            })?;
        Ok(Self {
            settings,
            board,
            ball,
            enabled: false,
            tilt_degrees: Vec2::ZERO,
            ball_velocity: Vec3::ZERO,
            enable_transitions: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn tilt_degrees(&self) -> Vec2 {
        self.tilt_degrees
    }

    /// Number of disabled-to-enabled transitions so far.
    #[cfg(test)]
    pub(crate) fn enable_transitions(&self) -> u32 {
        self.enable_transitions
    }

    fn update_tilt(&mut self, target: Vec2, fixed_dt_seconds: f32) {
        let max_delta = self.settings.tilt_speed_degrees_per_second * fixed_dt_seconds;
        self.tilt_degrees = Vec2::new(
            approach(self.tilt_degrees.x, target.x, max_delta),
            approach(self.tilt_degrees.y, target.y, max_delta),
        );
    }

    fn ball_limits(&self, world: &SceneWorld) -> Option<(Vec3, Vec3)> {
        let board = world.find_entity(self.board)?.bounds()?;
        let ball_half = world
            .find_entity(self.ball)?
            .collider
            .map(|collider| collider.half_extents)
            .unwrap_or(Vec3::ZERO);
        let min = board.min() + Vec3::new(ball_half.x, 0.0, ball_half.z);
        let max = board.max() - Vec3::new(ball_half.x, 0.0, ball_half.z);
        Some((min, max))
    }
}

impl MazeBehavior for TiltMaze {
    fn set_enabled(&mut self, enabled: bool, world: &mut SceneWorld) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        if enabled {
            self.enable_transitions += 1;
        } else {
            self.ball_velocity = Vec3::ZERO;
            self.tilt_degrees = Vec2::ZERO;
            if let Some(board) = world.find_entity_mut(self.board) {
                board.transform.rotation = Quat::IDENTITY;
            }
        }
        debug!(
            enabled,
            enable_transitions = self.enable_transitions,
            "maze_toggled"
        );
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn step(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld) {
        if !self.enabled || fixed_dt_seconds <= 0.0 {
            return;
        }

        let steer = world
            .input_map()
            .read_vector(InputStream::MazeTilt, input)
            .clamp_length_one();
        let max_tilt = self.settings.max_tilt_degrees;
        self.update_tilt(
            Vec2::new(steer.x * max_tilt, steer.y * max_tilt),
            fixed_dt_seconds,
        );

        let Some((min, max)) = self.ball_limits(world) else {
            warn!(
                board = self.board.0,
                ball = self.ball.0,
                "maze_entities_missing"
            );
            return;
        };

        let gravity = self.settings.gravity_magnitude;
        let acceleration = Vec3::new(
            gravity * self.tilt_degrees.x.to_radians().sin(),
            0.0,
            gravity * self.tilt_degrees.y.to_radians().sin(),
        );
        self.ball_velocity += acceleration * fixed_dt_seconds;
        let damping = (1.0 - self.settings.rolling_damping * fixed_dt_seconds).max(0.0);
        self.ball_velocity = self.ball_velocity * damping;

        if let Some(ball) = world.find_entity_mut(self.ball) {
            let mut next = ball.transform.position + self.ball_velocity * fixed_dt_seconds;
            if next.x < min.x || next.x > max.x {
                next.x = next.x.clamp(min.x, max.x);
                self.ball_velocity.x = 0.0;
            }
            if next.z < min.z || next.z > max.z {
                next.z = next.z.clamp(min.z, max.z);
                self.ball_velocity.z = 0.0;
            }
            ball.transform.position = next;
        }

        // +X edge dips for positive x tilt, +Z edge dips for positive y tilt.
        let axis = Vec3::new(self.tilt_degrees.y, 0.0, -self.tilt_degrees.x);
        if let Some(board) = world.find_entity_mut(self.board) {
            board.transform.rotation = Quat::from_axis_angle(axis, axis.length().to_radians());
        }
    }
}

fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

#[cfg(test)]
mod tests {
    use engine::{Collider, SpawnDesc};

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn maze_world() -> (SceneWorld, EntityId) {
        let mut world = SceneWorld::default();
        world.spawn(
            SpawnDesc::new(MAZE_NAME, Vec3::new(0.0, 0.5, 0.0))
                .with_collider(Collider::solid(Vec3::new(1.0, 0.5, 1.0))),
        );
        let ball = world.spawn(
            SpawnDesc::new("ball", Vec3::new(0.0, 1.1, 0.0))
                .with_collider(Collider::solid(Vec3::new(0.1, 0.1, 0.1)))
                .with_tag(KEY_OBJECT_TAG),
        );
        world.apply_pending();
        world.input_map_mut().enable(InputStream::MazeTilt);
        (world, ball)
    }

    fn ball_position(world: &SceneWorld, ball: EntityId) -> Vec3 {
        world.find_entity(ball).expect("ball").transform.position
    }

    fn tilt_right() -> InputSnapshot {
        InputSnapshot::empty().with_move_axis(Vec2::new(1.0, 0.0))
    }

    #[test]
    fn attach_requires_board_and_key_ball() {
        let world = SceneWorld::default();
        assert_eq!(
            TiltMaze::attach(MazeSettings::default(), &world).expect_err("no board"),
            GameplayError::MissingEntity { name: MAZE_NAME }
        );
    }

    #[test]
    fn disabled_maze_does_not_move_the_ball() {
        let (mut world, ball) = maze_world();
        let mut maze = TiltMaze::attach(MazeSettings::default(), &world).expect("attach");
        for _ in 0..30 {
            maze.step(DT, &tilt_right(), &mut world);
        }
        assert_eq!(ball_position(&world, ball), Vec3::new(0.0, 1.1, 0.0));
        assert_eq!(maze.tilt_degrees(), Vec2::ZERO);
    }

    #[test]
    fn tilt_ramps_at_configured_speed_and_caps_at_max() {
        let (mut world, _) = maze_world();
        let mut maze = TiltMaze::attach(MazeSettings::default(), &world).expect("attach");
        maze.set_enabled(true, &mut world);

        maze.step(DT, &tilt_right(), &mut world);
        assert!((maze.tilt_degrees().x - 1.0).abs() < 1e-4);

        for _ in 0..60 {
            maze.step(DT, &tilt_right(), &mut world);
        }
        assert!((maze.tilt_degrees().x - 15.0).abs() < 1e-4);
        assert_eq!(maze.tilt_degrees().y, 0.0);
    }

    #[test]
    fn ball_rolls_downhill_and_stops_at_the_rim() {
        let (mut world, ball) = maze_world();
        let mut maze = TiltMaze::attach(MazeSettings::default(), &world).expect("attach");
        maze.set_enabled(true, &mut world);

        maze.step(DT, &tilt_right(), &mut world);
        maze.step(DT, &tilt_right(), &mut world);
        assert!(ball_position(&world, ball).x > 0.0);

        for _ in 0..600 {
            maze.step(DT, &tilt_right(), &mut world);
        }
        let position = ball_position(&world, ball);
        assert!((position.x - 0.9).abs() < 1e-5);
        assert_eq!(position.z, 0.0);
        assert_eq!(position.y, 1.1);
    }

    #[test]
    fn disabling_levels_the_board() {
        let (mut world, ball) = maze_world();
        let board = world.find_by_name(MAZE_NAME).expect("board");
        let mut maze = TiltMaze::attach(MazeSettings::default(), &world).expect("attach");
        maze.set_enabled(true, &mut world);
        for _ in 0..30 {
            maze.step(DT, &tilt_right(), &mut world);
        }
        assert_ne!(maze.tilt_degrees(), Vec2::ZERO);
        let resting = ball_position(&world, ball);

        maze.set_enabled(false, &mut world);

        assert_eq!(maze.tilt_degrees(), Vec2::ZERO);
        assert_eq!(
            world.find_entity(board).expect("board").transform.rotation,
            Quat::IDENTITY
        );
        assert_eq!(ball_position(&world, ball), resting);

        maze.set_enabled(true, &mut world);
        maze.step(DT, &InputSnapshot::empty(), &mut world);
        assert_eq!(ball_position(&world, ball), resting);
    }

    #[test]
    fn tilt_stream_disabled_reads_as_level() {
        let (mut world, ball) = maze_world();
        world.input_map_mut().disable(InputStream::MazeTilt);
        let mut maze = TiltMaze::attach(MazeSettings::default(), &world).expect("attach");
        maze.set_enabled(true, &mut world);
        for _ in 0..30 {
            maze.step(DT, &tilt_right(), &mut world);
        }
        assert_eq!(ball_position(&world, ball).x, 0.0);
    }

    #[test]
    fn enabling_twice_counts_one_transition() {
        let (mut world, _) = maze_world();
        let mut maze = TiltMaze::attach(MazeSettings::default(), &world).expect("attach");
        assert!(maze.set_enabled(true, &mut world));
        assert!(!maze.set_enabled(true, &mut world));
        assert_eq!(maze.enable_transitions(), 1);
        assert!(maze.set_enabled(false, &mut world));
        assert!(!maze.set_enabled(false, &mut world));
        assert!(maze.set_enabled(true, &mut world));
        assert_eq!(maze.enable_transitions(), 2);
    }

    #[test]
    fn approach_never_overshoots() {
        assert_eq!(approach(0.0, 10.0, 3.0), 3.0);
        assert_eq!(approach(9.0, 10.0, 3.0), 10.0);
        assert_eq!(approach(0.0, -10.0, 3.0), -3.0);
    }
}
