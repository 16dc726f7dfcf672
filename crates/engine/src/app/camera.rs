use super::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
}

impl CameraPose {
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw_degrees.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch_degrees.to_radians().sin_cos();
        Vec3::new(sin_yaw * cos_pitch, -sin_pitch, cos_yaw * cos_pitch)
    }

    pub fn right(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw_degrees.to_radians().sin_cos();
        Vec3::new(cos_yaw, 0.0, -sin_yaw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualCamera {
    pub id: CameraId,
    pub name: &'static str,
    pub priority: i32,
    pub pose: CameraPose,
}

/// Priority-driven camera selection: the highest priority camera is live.
/// Ties go to the camera registered first.
#[derive(Debug, Clone, Default)]
pub struct CameraRig {
    cameras: Vec<VirtualCamera>,
}

impl CameraRig {
    pub fn register(&mut self, name: &'static str, priority: i32, pose: CameraPose) -> CameraId {
        let id = CameraId(self.cameras.len() as u32);
        self.cameras.push(VirtualCamera {
            id,
            name,
            priority,
            pose,
        });
        id
    }

    pub fn clear(&mut self) {
        self.cameras.clear();
    }

    pub fn find_by_name(&self, name: &str) -> Option<CameraId> {
        self.cameras
            .iter()
            .find(|camera| camera.name == name)
            .map(|camera| camera.id)
    }

    pub fn camera(&self, id: CameraId) -> Option<&VirtualCamera> {
        self.cameras.get(id.0 as usize)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut VirtualCamera> {
        self.cameras.get_mut(id.0 as usize)
    }

    pub fn priority(&self, id: CameraId) -> Option<i32> {
        self.camera(id).map(|camera| camera.priority)
    }

    /// Returns the previous priority, or `None` for an unknown id.
    pub fn set_priority(&mut self, id: CameraId, priority: i32) -> Option<i32> {
        let camera = self.camera_mut(id)?;
        let previous = camera.priority;
        camera.priority = priority;
        Some(previous)
    }

    pub fn active(&self) -> Option<&VirtualCamera> {
        let mut best: Option<&VirtualCamera> = None;
        for camera in &self.cameras {
            match best {
                Some(current) if camera.priority <= current.priority => {}
                _ => best = Some(camera),
            }
        }
        best
    }

    pub fn cameras(&self) -> &[VirtualCamera] {
        &self.cameras
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).length() < 1e-5,
            "{actual:?} vs {expected:?}"
        );
    }

    #[test]
    fn highest_priority_camera_is_active() {
        let mut rig = CameraRig::default();
        let main = rig.register("main", 10, CameraPose::default());
        let puzzle = rig.register("puzzle", 0, CameraPose::default());
        assert_eq!(rig.active().map(|c| c.id), Some(main));

        assert_eq!(rig.set_priority(puzzle, 100), Some(0));
        assert_eq!(rig.active().map(|c| c.id), Some(puzzle));
    }

    #[test]
    fn ties_prefer_first_registered() {
        let mut rig = CameraRig::default();
        let first = rig.register("first", 5, CameraPose::default());
        rig.register("second", 5, CameraPose::default());
        assert_eq!(rig.active().map(|c| c.id), Some(first));
    }

    #[test]
    fn unknown_camera_priority_is_none() {
        let mut rig = CameraRig::default();
        assert_eq!(rig.set_priority(CameraId(3), 1), None);
        assert!(rig.active().is_none());
        assert_eq!(rig.find_by_name("missing"), None);
    }

    #[test]
    fn basis_for_zero_yaw_faces_positive_z() {
        let pose = CameraPose {
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
        };
        assert_vec3_close(pose.forward(), Vec3::FORWARD);
        assert_vec3_close(pose.right(), Vec3::RIGHT);
    }

    #[test]
    fn pitched_camera_forward_points_down() {
        let pose = CameraPose {
            position: Vec3::ZERO,
            yaw_degrees: 90.0,
            pitch_degrees: 30.0,
        };
        let forward = pose.forward();
        assert!(forward.y < 0.0);
        assert!((forward.length() - 1.0).abs() < 1e-5);
        assert_vec3_close(pose.right(), Vec3::new(0.0, 0.0, -1.0));
    }
}
