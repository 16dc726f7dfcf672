use engine::{CameraId, CameraPose, EntityId, InputSnapshot, InputStream, SceneWorld, Vec3};

use super::{GameplayError, MAIN_CAMERA_NAME};
use crate::app::settings::CameraSettings;

/// Drives the main camera: orbits on Look input, trails the player.
#[derive(Debug, Clone)]
pub(crate) struct FollowCamera {
    settings: CameraSettings,
    camera: CameraId,
    target: EntityId,
    yaw_degrees: f32,
}

impl FollowCamera {
    pub(crate) fn attach(
        settings: CameraSettings,
        target: EntityId,
        world: &mut SceneWorld,
    ) -> Result<Self, GameplayError> {
        let camera = world
            .cameras()
            .find_by_name(MAIN_CAMERA_NAME)
            .ok_or(GameplayError::MissingCamera {
                name: MAIN_CAMERA_NAME,
            })?;
        let yaw_degrees = world
            .cameras()
            .camera(camera)
            .map(|camera| camera.pose.yaw_degrees)
            .unwrap_or(0.0);
        let follow = Self {
            settings,
            camera,
            target,
            yaw_degrees,
        };
        follow.snap(world);
        Ok(follow)
    }

    pub(crate) fn step(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld) {
        let orbit = world.input_map().read_vector(InputStream::Look, input).x;
        self.yaw_degrees = wrap_degrees(
            self.yaw_degrees
                + orbit * self.settings.orbit_speed_degrees_per_second * fixed_dt_seconds,
        );
        self.snap(world);
    }

    fn snap(&self, world: &mut SceneWorld) {
        let Some(target) = world
            .find_entity(self.target)
            .map(|entity| entity.transform.position)
        else {
            return;
        };
        let pose = self.pose_for(target);
        if let Some(camera) = world.cameras_mut().camera_mut(self.camera) {
            camera.pose = pose;
        }
    }

    pub(crate) fn pose_for(&self, target: Vec3) -> CameraPose {
        let (sin_yaw, cos_yaw) = self.yaw_degrees.to_radians().sin_cos();
        let behind = Vec3::new(-sin_yaw, 0.0, -cos_yaw) * self.settings.follow_distance;
        CameraPose {
            position: target + behind + Vec3::UP * self.settings.follow_height,
            yaw_degrees: self.yaw_degrees,
            pitch_degrees: self.settings.pitch_degrees,
        }
    }
}

fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
