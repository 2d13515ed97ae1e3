use std::f32::consts::PI;

use engine::{EntityIdAllocator, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::profile::{ConfigurationError, DifficultyProfile};
use super::types::{
    Collectible, CollectibleKind, Enemy, Entity, Platform, PlatformKind, WorldState,
};
use super::{
    COLLECTIBLE_CHANCE, COLLECTIBLE_HEIGHT_OFFSET, ENEMY_CHANCE, ENEMY_HEALTH_PER_TIER,
    ENEMY_HEIGHT_OFFSET, ENEMY_MIN_PLATFORM_INDEX, MAX_ENEMY_TIER, MOVING_PLATFORM_INTERVAL,
    NORMAL_COLLECTIBLE_VALUE, ORIGIN_PLATFORM_SIZE, PLATFORM_COUNT,
    PLATFORM_HORIZONTAL_SIZE_RANGE, PLATFORM_VERTICAL_SIZE_RANGE, SPECIAL_COLLECTIBLE_CHANCE,
    SPECIAL_COLLECTIBLE_VALUE,
};

/// Builds the run's world from `seed` with the standard platform count.
pub fn generate(seed: u64, profile: &DifficultyProfile) -> Result<WorldState, ConfigurationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_with(&mut rng, seed, profile, PLATFORM_COUNT)
}

/// Spiral layout: platform `i` sits at angle `(i/N)·8π` on a radius that
/// breathes with `sin(0.1·i)`, climbing 2 units per step. Every random draw
/// comes from `rng` in a fixed order, so equal inputs give equal worlds.
pub fn generate_with<R: Rng>(
    rng: &mut R,
    seed: u64,
    profile: &DifficultyProfile,
    platform_count: usize,
) -> Result<WorldState, ConfigurationError> {
    if platform_count == 0 {
        return Err(ConfigurationError::NonPositivePlatformCount);
    }
    profile.validate()?;

    let mut ids = EntityIdAllocator::default();
    let mut entities = Vec::with_capacity(platform_count * 2);
    entities.push(Entity::Platform(Platform {
        id: ids.allocate(),
        position: Vec3::ZERO,
        size: ORIGIN_PLATFORM_SIZE,
        kind: PlatformKind::Solid,
    }));

    for i in 1..platform_count {
        let step = i as f32;
        let angle = step / platform_count as f32 * 8.0 * PI;
        let radius = 15.0 + 10.0 * (0.1 * step).sin();
        let height = 2.0 * step;
        let position = Vec3::new(
            radius * angle.cos(),
            height,
            radius * angle.sin() + 4.0 * step,
        );
        let (h_min, h_max) = PLATFORM_HORIZONTAL_SIZE_RANGE;
        let (v_min, v_max) = PLATFORM_VERTICAL_SIZE_RANGE;
        let size = Vec3::new(
            rng.gen_range(h_min..=h_max),
            rng.gen_range(v_min..=v_max),
            rng.gen_range(h_min..=h_max),
        );
        let kind = if i % MOVING_PLATFORM_INTERVAL == 0 {
            PlatformKind::Moving
        } else {
            PlatformKind::Solid
        };
        entities.push(Entity::Platform(Platform {
            id: ids.allocate(),
            position,
            size,
            kind,
        }));

        if rng.gen_bool(COLLECTIBLE_CHANCE) {
            let (kind, value) = if rng.gen_bool(SPECIAL_COLLECTIBLE_CHANCE) {
                (CollectibleKind::Special, SPECIAL_COLLECTIBLE_VALUE)
            } else {
                (CollectibleKind::Normal, NORMAL_COLLECTIBLE_VALUE)
            };
            entities.push(Entity::Collectible(Collectible {
                id: ids.allocate(),
                position: position.with_y(height + COLLECTIBLE_HEIGHT_OFFSET),
                value,
                kind,
                collected: false,
            }));
        }

        if i >= ENEMY_MIN_PLATFORM_INDEX && rng.gen_bool(ENEMY_CHANCE) {
            let tier = enemy_tier_for(i);
            let health = ENEMY_HEALTH_PER_TIER * tier;
            entities.push(Entity::Enemy(Enemy {
                id: ids.allocate(),
                position: position.with_y(height + ENEMY_HEIGHT_OFFSET),
                difficulty_tier: tier,
                health,
                max_health: health,
                alive: true,
            }));
        }
    }

    let world = WorldState::from_entities(
        seed,
        profile.enemy_speed_factor,
        profile.platform_speed_factor,
        entities,
    );
    debug!(
        seed,
        profile = %profile.name,
        platforms = world.platform_count(),
        collectibles = world.collectible_count(),
        enemies = world.enemy_count(),
        "world_generated"
    );
    Ok(world)
}

pub(crate) fn enemy_tier_for(platform_index: usize) -> u32 {
    let tier = u32::try_from(platform_index / 10).unwrap_or(u32::MAX).saturating_add(1);
    tier.min(MAX_ENEMY_TIER)
}
