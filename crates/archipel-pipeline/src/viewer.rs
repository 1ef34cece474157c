use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

/// Shared viewer position, written by the owner and read by job priorities.
///
/// Components are stored independently, so a reader racing a writer may see
/// a mix of old and new coordinates. Priorities tolerate that.
#[derive(Debug, Default)]
pub struct Viewer {
    x: AtomicU32,
    y: AtomicU32,
    z: AtomicU32,
}

impl Viewer {
    pub fn new(position: Vec3) -> Self {
        let viewer = Self::default();
        viewer.set_position(position);
        viewer
    }

    pub fn set_position(&self, position: Vec3) {
        self.x.store(position.x.to_bits(), Ordering::Relaxed);
        self.y.store(position.y.to_bits(), Ordering::Relaxed);
        self.z.store(position.z.to_bits(), Ordering::Relaxed);
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(
            f32::from_bits(self.x.load(Ordering::Relaxed)),
            f32::from_bits(self.y.load(Ordering::Relaxed)),
            f32::from_bits(self.z.load(Ordering::Relaxed)),
        )
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position().distance(point)
    }
}
