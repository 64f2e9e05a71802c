use glam::{Mat4, Vec3};
use synthwave_kernel::CameraRig;

/// Orbit controls: the eye circles `target` at `distance`.
///
/// Camera motion is view state only; it never feeds back into the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub distance: f32,
    /// Angle around the vertical axis, 0 = eye on the +Z side of the target.
    pub yaw: f32,
    /// Elevation above the target's horizontal plane.
    pub pitch: f32,
    pub sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitControls {
    /// Start orbiting from an existing eye position.
    pub fn from_eye(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(0.1);
        Self {
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            sensitivity: 0.005,
            min_distance: 1.0,
            max_distance: 200.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(
                cos_pitch * sin_yaw,
                sin_pitch,
                cos_pitch * cos_yaw,
            ) * self.distance
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self.pitch.clamp(
            -89.0_f32.to_radians(),
            89.0_f32.to_radians(),
        );
    }

    /// Positive `steps` move the eye closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance =
            (self.distance * 0.9_f32.powf(steps)).clamp(self.min_distance, self.max_distance);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }
}

/// Camera used for drawing: the scene's fixed rig, or orbit controls when enabled.
#[derive(Debug, Clone, Default)]
pub struct SceneCamera {
    pub orbit: Option<OrbitControls>,
}

impl SceneCamera {
    pub fn fixed() -> Self {
        Self { orbit: None }
    }

    pub fn orbiting(rig: &CameraRig, target: Vec3) -> Self {
        Self {
            orbit: Some(OrbitControls::from_eye(rig.position(), target)),
        }
    }

    pub fn eye(&self, rig: &CameraRig) -> Vec3 {
        match &self.orbit {
            Some(orbit) => orbit.eye(),
            None => rig.position(),
        }
    }

    pub fn view_matrix(&self, rig: &CameraRig) -> Mat4 {
        match &self.orbit {
            Some(orbit) => orbit.view_matrix(),
            None => rig_view(rig),
        }
    }

    pub fn view_projection(&self, rig: &CameraRig) -> Mat4 {
        projection(rig) * self.view_matrix(rig)
    }
}

/// Forward direction of the rig: down -Z, tilted up by `pitch` radians.
pub fn rig_forward(rig: &CameraRig) -> Vec3 {
    let (sin, cos) = rig.pitch.sin_cos();
    Vec3::new(0.0, sin, -cos)
}

pub fn rig_view(rig: &CameraRig) -> Mat4 {
    Mat4::look_to_rh(rig.position(), rig_forward(rig), Vec3::Y)
}

pub fn projection(rig: &CameraRig) -> Mat4 {
    Mat4::perspective_rh(
        rig.fov_degrees.to_radians(),
        rig.aspect,
        rig.near,
        rig.far,
    )
}
