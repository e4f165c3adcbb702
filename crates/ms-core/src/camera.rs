use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// Camera projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraType {
    #[default]
    Perspective,
    Isometric,
    Flat,
}

/// Camera pose as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Tilt in radians
    pub tilt: f32,
    /// Rotation in radians
    pub rotation: f32,
    pub zoom: f32,
    pub position: LngLat,
    pub camera_type: CameraType,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            tilt: 0.0,
            rotation: 0.0,
            zoom: 0.0,
            position: LngLat::default(),
            camera_type: CameraType::default(),
        }
    }
}
