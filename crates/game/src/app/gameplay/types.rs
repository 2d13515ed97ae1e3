use engine::{EntityId, Fingerprint, Vec3};
use serde::{Deserialize, Serialize};

use super::{INITIAL_EXPERIENCE_TO_NEXT, PLAYER_MAX_HEALTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlatformKind {
    Solid,
    Moving,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub id: EntityId,
    pub position: Vec3,
    pub size: Vec3,
    pub kind: PlatformKind,
}

impl Platform {
    pub fn top_y(&self) -> f32 {
        self.position.y + self.size.y * 0.5
    }

    /// Whether `point` lies over the platform footprint.
    pub fn covers_xz(&self, point: Vec3) -> bool {
        let half_w = self.size.x * 0.5;
        let half_d = self.size.z * 0.5;
        (point.x - self.position.x).abs() <= half_w && (point.z - self.position.z).abs() <= half_d
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectibleKind {
    Normal,
    Special,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub id: EntityId,
    pub position: Vec3,
    pub value: u32,
    pub kind: CollectibleKind,
    pub collected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub position: Vec3,
    pub difficulty_tier: u32,
    pub health: u32,
    pub max_health: u32,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Platform(Platform),
    Collectible(Collectible),
    Enemy(Enemy),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Platform(platform) => platform.id,
            Self::Collectible(collectible) => collectible.id,
            Self::Enemy(enemy) => enemy.id,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Self::Platform(platform) => platform.position,
            Self::Collectible(collectible) => collectible.position,
            Self::Enemy(enemy) => enemy.position,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Platform(_) => "platform",
            Self::Collectible(_) => "collectible",
            Self::Enemy(_) => "enemy",
        }
    }
}

/// Arena of generated entities. Ids equal arena indices and stay stable for
/// the run; only `collected`, `alive` and enemy health ever change.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    pub seed: u64,
    pub enemy_speed_factor: f32,
    pub platform_speed_factor: f32,
    entities: Vec<Entity>,
}

impl WorldState {
    pub(crate) fn from_entities(
        seed: u64,
        enemy_speed_factor: f32,
        platform_speed_factor: f32,
        entities: Vec<Entity>,
    ) -> Self {
        Self {
            seed,
            enemy_speed_factor,
            platform_speed_factor,
            entities,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.entities.get(index))
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.entities.get_mut(index))
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.entities.iter().filter_map(|entity| match entity {
            Entity::Platform(platform) => Some(platform),
            _ => None,
        })
    }

    pub fn collectibles(&self) -> impl Iterator<Item = &Collectible> {
        self.entities.iter().filter_map(|entity| match entity {
            Entity::Collectible(collectible) => Some(collectible),
            _ => None,
        })
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.entities.iter().filter_map(|entity| match entity {
            Entity::Enemy(enemy) => Some(enemy),
            _ => None,
        })
    }

    pub fn collectible(&self, id: EntityId) -> Option<&Collectible> {
        match self.entity(id) {
            Some(Entity::Collectible(collectible)) => Some(collectible),
            _ => None,
        }
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        match self.entity(id) {
            Some(Entity::Enemy(enemy)) => Some(enemy),
            _ => None,
        }
    }

    pub fn platform_count(&self) -> usize {
        self.platforms().count()
    }

    pub fn collectible_count(&self) -> usize {
        self.collectibles().count()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies().count()
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.collectibles().filter(|c| !c.collected).count()
    }

    pub fn alive_enemies(&self) -> usize {
        self.enemies().filter(|e| e.alive).count()
    }

    /// SHA-256 over the generated layout. Mutable flags are included so two
    /// worlds only match when they are in the same state.
    pub fn fingerprint(&self) -> String {
        let mut fingerprint = Fingerprint::new();
        fingerprint.update_u64(self.seed);
        fingerprint.update_u64(self.entities.len() as u64);
        for entity in &self.entities {
            fingerprint.update_u64(entity.id().0);
            fingerprint.update_str(entity.kind_name());
            let position = entity.position();
            fingerprint.update_f32(position.x);
            fingerprint.update_f32(position.y);
            fingerprint.update_f32(position.z);
            match entity {
                Entity::Platform(platform) => {
                    fingerprint.update_f32(platform.size.x);
                    fingerprint.update_f32(platform.size.y);
                    fingerprint.update_f32(platform.size.z);
                    fingerprint.update_str(match platform.kind {
                        PlatformKind::Solid => "solid",
                        PlatformKind::Moving => "moving",
                    });
                }
                Entity::Collectible(collectible) => {
                    fingerprint.update_u32(collectible.value);
                    fingerprint.update_u32(u32::from(collectible.collected));
                }
                Entity::Enemy(enemy) => {
                    fingerprint.update_u32(enemy.difficulty_tier);
                    fingerprint.update_u32(enemy.health);
                    fingerprint.update_u32(u32::from(enemy.alive));
                }
            }
        }
        fingerprint.finish_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub health: u32,
    pub max_health: u32,
    pub lives: u32,
}

impl PlayerState {
    pub fn spawned(spawn_point: Vec3, lives: u32) -> Self {
        Self {
            position: spawn_point,
            velocity: Vec3::ZERO,
            grounded: true,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            lives,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameStats {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub score: u32,
    pub gems_collected: u32,
    pub enemies_killed: u32,
    pub enemies_target: u32,
    pub jumps: u32,
    pub play_time_seconds: f64,
    pub high_score: u32,
}

impl GameStats {
    pub fn for_run(enemies_target: u32, high_score: u32) -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next: INITIAL_EXPERIENCE_TO_NEXT,
            score: 0,
            gems_collected: 0,
            enemies_killed: 0,
            enemies_target,
            jumps: 0,
            play_time_seconds: 0.0,
            high_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Playing,
    Victory,
    GameOver,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub music_volume: f32,
    pub effects_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 0.6,
            effects_volume: 0.8,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicsQuality {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub quality: GraphicsQuality,
    pub shadows: bool,
    pub field_of_view_degrees: f32,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            quality: GraphicsQuality::Medium,
            shadows: true,
            field_of_view_degrees: 75.0,
        }
    }
}

/// Global preferences. Survive `ResetRun`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub graphics: GraphicsSettings,
}
