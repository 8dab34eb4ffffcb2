use glam::Vec3;
use rand::Rng;

use crate::components::planar_distance;
use crate::config::{ForestConfig, TreeSpecies, WorldConfig};
use crate::obstacles::ObstacleRegistry;

fn pick_species<'a>(species: &'a [TreeSpecies], rng: &mut impl Rng) -> Option<&'a TreeSpecies> {
    let total: u32 = species.iter().map(|s| s.weight).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total);
    for s in species {
        if roll < s.weight {
            return Some(s);
        }
        roll -= s.weight;
    }
    None
}

fn random_spot(rng: &mut impl Rng, half_extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half_extent..=half_extent),
        0.0,
        rng.gen_range(-half_extent..=half_extent),
    )
}

/// Plant trees as circle obstacles around the clearing at the origin.
///
/// Each tree gets `forest.attempts` tries to find a spot that keeps its
/// distance from the centre, the world edge and every tree already planted;
/// trees that find no spot are skipped. Returns how many were planted.
pub fn scatter_trees(
    obstacles: &mut ObstacleRegistry,
    forest: &ForestConfig,
    world: &WorldConfig,
    rng: &mut impl Rng,
) -> usize {
    let half_extent = world.size / 2.0 - forest.min_from_edge;
    if half_extent <= 0.0 {
        return 0;
    }

    let mut planted: Vec<Vec3> = Vec::with_capacity(forest.trees);
    for _ in 0..forest.trees {
        let Some(species) = pick_species(&forest.species, rng) else {
            break;
        };
        let scale = rng.gen_range(species.scale.min..=species.scale.max);

        let spot = (0..forest.attempts).map(|_| random_spot(rng, half_extent)).find(|&p| {
            p.length() >= forest.min_from_center
                && planted.iter().all(|&other| planar_distance(p, other) >= forest.min_between)
        });

        if let Some(position) = spot {
            obstacles.add(position, species.collision_radius * scale);
            planted.push(position);
        }
    }
    planted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn trees_respect_spacing_rules() {
        let config = GameConfig::default();
        let mut obstacles = ObstacleRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let planted = scatter_trees(&mut obstacles, &config.forest, &config.world, &mut rng);

        assert_eq!(planted, obstacles.len());
        assert!(planted > 0 && planted <= config.forest.trees);

        let trees: Vec<_> = obstacles.iter().copied().collect();
        for (i, tree) in trees.iter().enumerate() {
            assert!(tree.position.length() >= 20.0);
            assert!(tree.position.x.abs() <= 95.0 && tree.position.z.abs() <= 95.0);
            assert!(tree.radius >= 0.8 * 0.7 - 1e-6 && tree.radius <= 2.0 * 1.1 + 1e-6);
            for other in &trees[i + 1..] {
                assert!(planar_distance(tree.position, other.position) >= 4.0);
            }
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let config = GameConfig::default();
        let plant = |seed| {
            let mut obstacles = ObstacleRegistry::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            scatter_trees(&mut obstacles, &config.forest, &config.world, &mut rng);
            obstacles.iter().map(|o| o.position).collect::<Vec<_>>()
        };
        assert_eq!(plant(9), plant(9));
    }
}
