//! Static circle obstacles (tree trunks) and the queries run against them.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::components::{planar_delta, planar_distance};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
}

/// One overlapping obstacle. `push_direction` points from the obstacle centre
/// towards the queried position; moving by `push_direction * overlap` clears it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleContact {
    pub push_direction: Vec3,
    pub overlap: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ObstacleRegistry {
    obstacles: Vec<Obstacle>,
}

const FREE_RING_RADII: [f32; 4] = [2.0, 4.0, 6.0, 8.0];
const FREE_RING_SAMPLES: usize = 16;

/// Uniform random unit vector on the ground plane.
pub fn random_planar_direction(rng: &mut impl Rng) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Vec3, radius: f32) {
        self.obstacles.push(Obstacle {
            position: Vec3::new(position.x, 0.0, position.z),
            radius,
        });
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    /// Every obstacle overlapping a circle of `radius` at `position`.
    /// A position exactly on an obstacle centre is pushed in a random direction.
    pub fn query(&self, position: Vec3, radius: f32, rng: &mut impl Rng) -> Vec<ObstacleContact> {
        let mut contacts = Vec::new();
        for obstacle in &self.obstacles {
            let min_distance = radius + obstacle.radius;
            let distance = planar_distance(position, obstacle.position);
            if distance >= min_distance {
                continue;
            }
            let push_direction = if distance > 1e-6 {
                planar_delta(obstacle.position, position) / distance
            } else {
                random_planar_direction(rng)
            };
            contacts.push(ObstacleContact {
                push_direction,
                overlap: min_distance - distance,
            });
        }
        contacts
    }

    pub fn has_obstacle_near(&self, position: Vec3, clearance: f32) -> bool {
        self.obstacles
            .iter()
            .any(|o| planar_distance(position, o.position) < o.radius + clearance)
    }

    /// Closest spot around `start` where a circle of `radius` fits, searching
    /// rings of growing radius. Returns `start` when no ring has room.
    pub fn find_nearest_free_position(&self, start: Vec3, radius: f32) -> Vec3 {
        if !self.has_obstacle_near(start, radius) {
            return start;
        }
        for ring in FREE_RING_RADII {
            for i in 0..FREE_RING_SAMPLES {
                let angle = i as f32 / FREE_RING_SAMPLES as f32 * TAU;
                let candidate = start + Vec3::new(angle.cos() * ring, 0.0, angle.sin() * ring);
                if !self.has_obstacle_near(candidate, radius) {
                    return candidate;
                }
            }
        }
        start
    }
}

/// Combined correction for a set of simultaneous contacts: the sum of each
/// `push_direction * overlap`, averaged when more than one obstacle overlaps.
pub fn resolve_push(contacts: &[ObstacleContact]) -> Vec3 {
    let total: Vec3 = contacts.iter().map(|c| c.push_direction * c.overlap).sum();
    if contacts.len() > 1 {
        total / contacts.len() as f32
    } else {
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn empty_registry_reports_no_contacts() {
        let registry = ObstacleRegistry::new();
        assert!(registry.query(Vec3::ZERO, 1.0, &mut rng()).is_empty());
        assert_eq!(resolve_push(&[]), Vec3::ZERO);
    }

    #[test]
    fn contact_pushes_away_from_centre() {
        let mut registry = ObstacleRegistry::new();
        registry.add(Vec3::new(2.0, 0.0, 0.0), 1.5);
        let contacts = registry.query(Vec3::ZERO, 1.0, &mut rng());
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].push_direction.x, -1.0);
        assert_relative_eq!(contacts[0].overlap, 0.5);
    }

    #[test]
    fn touching_is_not_overlapping() {
        let mut registry = ObstacleRegistry::new();
        registry.add(Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert!(registry.query(Vec3::ZERO, 1.0, &mut rng()).is_empty());
    }

    #[test]
    fn coincident_centre_gets_unit_push() {
        let mut registry = ObstacleRegistry::new();
        registry.add(Vec3::ZERO, 1.0);
        let contacts = registry.query(Vec3::ZERO, 1.0, &mut rng());
        assert_relative_eq!(contacts[0].push_direction.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(contacts[0].overlap, 2.0);
    }

    #[test]
    fn multiple_contacts_are_averaged() {
        let contacts = [
            ObstacleContact { push_direction: Vec3::X, overlap: 1.0 },
            ObstacleContact { push_direction: Vec3::Z, overlap: 0.5 },
        ];
        assert_eq!(resolve_push(&contacts), Vec3::new(0.5, 0.0, 0.25));
    }

    #[test]
    fn free_position_search_leaves_obstacle() {
        let mut registry = ObstacleRegistry::new();
        registry.add(Vec3::ZERO, 1.5);
        let spot = registry.find_nearest_free_position(Vec3::ZERO, 1.0);
        assert!(!registry.has_obstacle_near(spot, 1.0));
        assert_relative_eq!(spot.length(), 4.0, epsilon = 1e-5);
    }
}
