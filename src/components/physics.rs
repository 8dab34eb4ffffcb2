use glam::Vec3;

/// Ground-plane placement of an actor. `position.y` stays at 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Yaw in radians; 0 faces +Z.
    pub facing: f32,
    /// Yaw the facing eases towards each tick.
    pub target_facing: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position: Vec3::new(position.x, 0.0, position.z),
            facing: 0.0,
            target_facing: 0.0,
        }
    }

    /// Unit vector the actor is looking along.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.facing.sin(), 0.0, self.facing.cos())
    }
}

/// Linear velocity in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec3);

/// Circle used for push-apart resolution on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f32,
}

/// Distance between two points ignoring height.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// `b - a` flattened onto the ground plane.
pub fn planar_delta(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(b.x - a.x, 0.0, b.z - a.z)
}
