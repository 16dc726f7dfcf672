use engine::{
    CameraId, CameraPose, EntityId, InputSnapshot, InputStream, MotionHost, Quat, SceneWorld, Vec2,
    Vec3,
};
use tracing::warn;

use super::puzzle::LOCOMOTION_STREAMS;
use super::{GameplayError, MAIN_CAMERA_NAME, PLAYER_NAME};
use crate::app::settings::LocomotionSettings;

/// What a single locomotion step actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LocomotionStep {
    pub(crate) horizontal: Vec3,
    pub(crate) vertical: Vec3,
    pub(crate) jumped: bool,
}

/// Camera-relative walking, jumping and facing for the player body.
#[derive(Debug, Clone)]
pub(crate) struct LocomotionController {
    settings: LocomotionSettings,
    body: EntityId,
    camera: CameraId,
    vertical_velocity: f32,
    grounded: bool,
    enabled: bool,
}

impl LocomotionController {
    /// Resolves the main camera once and starts enabled.
    pub(crate) fn activate(
        settings: LocomotionSettings,
        body: EntityId,
        world: &mut SceneWorld,
    ) -> Result<Self, GameplayError> {
        let camera = world
            .cameras()
            .find_by_name(MAIN_CAMERA_NAME)
            .ok_or(GameplayError::MissingCamera {
                name: MAIN_CAMERA_NAME,
            })?;
        if world.find_entity(body).is_none() {
            return Err(GameplayError::MissingEntity { name: PLAYER_NAME });
        }

        let mut controller = Self {
            settings,
            body,
            camera,
            vertical_velocity: 0.0,
            grounded: false,
            enabled: false,
        };
        controller.set_enabled(true, world);
        Ok(controller)
    }

    /// Movement and jump streams follow the controller's own enabled flag.
    pub(crate) fn set_enabled(&mut self, enabled: bool, world: &mut SceneWorld) {
        self.enabled = enabled;
        let input_map = world.input_map_mut();
        for stream in LOCOMOTION_STREAMS {
            if enabled {
                input_map.enable(stream);
            } else {
                input_map.disable(stream);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub(crate) fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    #[cfg(test)]
    pub(crate) fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub(crate) fn step(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
        motion: &mut dyn MotionHost,
    ) -> LocomotionStep {
        if !self.enabled {
            return LocomotionStep::default();
        }

        self.grounded = motion.is_grounded(self.body);
        if self.grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = 0.0;
        }

        let camera_pose = match world.cameras().camera(self.camera) {
            Some(camera) => camera.pose,
            None => {
                warn!(camera = self.camera.0, "locomotion_camera_missing");
                CameraPose::default()
            }
        };
        let move_input = world
            .input_map()
            .read_vector(InputStream::Movement, input)
            .clamp_length_one();
        let planar = camera_relative_move(move_input, &camera_pose);
        let horizontal = motion.move_and_collide(
            world,
            self.body,
            planar * (fixed_dt_seconds * self.settings.player_speed),
        );

        let jumped = self.grounded && world.input_map().triggered(InputStream::Jump, input);
        if jumped {
            self.vertical_velocity += jump_impulse(self.settings.jump_height, self.settings.gravity);
        }
        self.vertical_velocity += self.settings.gravity * fixed_dt_seconds;
        let vertical = motion.move_and_collide(
            world,
            self.body,
            Vec3::new(0.0, self.vertical_velocity * fixed_dt_seconds, 0.0),
        );

        if !move_input.is_zero() {
            let target = Quat::from_yaw_degrees(target_yaw_degrees(
                move_input,
                camera_pose.yaw_degrees,
            ));
            let turn = fixed_dt_seconds * self.settings.rotation_speed;
            if let Some(body) = world.find_entity_mut(self.body) {
                body.transform.rotation = body.transform.rotation.slerp(target, turn);
            }
        }

        LocomotionStep {
            horizontal,
            vertical,
            jumped,
        }
    }
}

/// Launch speed that peaks at `jump_height` under `gravity` (negative).
pub(crate) fn jump_impulse(jump_height: f32, gravity: f32) -> f32 {
    (jump_height * -3.0 * gravity).sqrt()
}

/// Maps a 2-axis input onto the camera's ground plane.
pub(crate) fn camera_relative_move(input: Vec2, camera: &CameraPose) -> Vec3 {
    let forward = camera.forward().flatten();
    let right = camera.right().flatten();
    (forward * input.y + right * input.x).with_y(0.0)
}

pub(crate) fn target_yaw_degrees(input: Vec2, camera_yaw_degrees: f32) -> f32 {
    input.x.atan2(input.y).to_degrees() + camera_yaw_degrees
}
