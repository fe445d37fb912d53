//! Game state and core simulation types
//!
//! `EntityStore` exclusively owns every live entity; `GameState` adds the
//! wave bookkeeping and the per-tick event log.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::cell_origin;
use crate::tuning::Tuning;

/// Current phase of the wave state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Initial mushroom forest and first millipede not yet placed
    Building,
    /// Normal play
    Active,
    /// Every millipede destroyed; next chain spawns on the following tick
    Cleared,
    /// Player was killed
    GameOver,
}

/// Level, score and phase of the running game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    pub level: u32,
    pub score: u64,
    pub phase: GamePhase,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            level: 1,
            score: 0,
            phase: GamePhase::Building,
        }
    }
}

impl WaveState {
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// True while entities are being simulated
    pub fn is_active(&self) -> bool {
        matches!(self.phase, GamePhase::Active | GamePhase::Cleared)
    }

    pub fn award(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }
}

/// The player's blaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub alive: bool,
    /// Tick of the last shot, for rate limiting
    pub last_fire_tick: Option<u64>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            alive: true,
            last_fire_tick: None,
        }
    }

    /// Move back to `pos` without recreating the player
    pub fn reposition(&mut self, pos: Vec2) {
        self.pos = pos;
        self.alive = true;
        self.last_fire_tick = None;
    }
}

/// A player shot travelling straight up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
}

/// A destructible mushroom occupying one grid cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mushroom {
    pub id: u32,
    pub cell: IVec2,
    pub hp: u8,
    /// Millipede heads dive straight down after bumping into one
    pub poisoned: bool,
}

/// One link of a millipede
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub pos: Vec2,
    /// Horizontal heading, +1 or -1
    pub dir: i8,
    pub diving: bool,
}

/// An ordered chain of segments; index 0 is the head
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Millipede {
    pub id: u32,
    pub segments: Vec<Segment>,
}

impl Millipede {
    pub fn head(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Roaming enemy confined to the player's zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spider {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Area weapon that releases a gas cloud when shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdtBomb {
    pub id: u32,
    pub cell: IVec2,
    pub active: bool,
}

impl DdtBomb {
    /// Center of the bomb's cell
    pub fn center(&self) -> Vec2 {
        cell_origin(self.cell) + Vec2::splat(0.5)
    }
}

/// A short-lived effect; gas particles kill millipede segments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining lifetime in ticks
    pub life: u32,
    pub gas: bool,
}

/// Things that happened during a tick, for audio/UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BulletFired { pos: Vec2 },
    MushroomHit { cell: IVec2, destroyed: bool },
    SegmentDestroyed { pos: Vec2, head: bool },
    ChainSplit { parts: usize },
    DdtTriggered { cell: IVec2 },
    GasKill { pos: Vec2 },
    SpiderKilled { pos: Vec2 },
    SpiderSpawned,
    WaveCleared { level: u32 },
    WaveStarted { level: u32, length: u32 },
    PlayerKilled { pos: Vec2 },
}

/// Owner of every live entity collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    pub player: Player,
    pub bullets: Vec<Bullet>,
    pub mushrooms: Vec<Mushroom>,
    pub millipedes: Vec<Millipede>,
    pub spiders: Vec<Spider>,
    pub ddt_bombs: Vec<DdtBomb>,
    /// Visual and gas particles
    pub particles: Vec<Particle>,
    next_id: u32,
}

impl EntityStore {
    pub fn new(player_start: Vec2) -> Self {
        Self {
            player: Player::new(player_start),
            bullets: Vec::new(),
            mushrooms: Vec::new(),
            millipedes: Vec::new(),
            spiders: Vec::new(),
            ddt_bombs: Vec::new(),
            particles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drop every entity except the player
    pub fn clear(&mut self) {
        self.bullets.clear();
        self.mushrooms.clear();
        self.millipedes.clear();
        self.spiders.clear();
        self.ddt_bombs.clear();
        self.particles.clear();
    }

    pub fn mushroom_at(&self, cell: IVec2) -> Option<&Mushroom> {
        self.mushrooms.iter().find(|m| m.cell == cell)
    }

    /// Place a mushroom unless the cell is already taken. Returns whether one was added.
    pub fn spawn_mushroom(&mut self, cell: IVec2, hp: u8, poisoned: bool) -> bool {
        if self.mushroom_at(cell).is_some() {
            return false;
        }
        let id = self.next_entity_id();
        self.mushrooms.push(Mushroom {
            id,
            cell,
            hp,
            poisoned,
        });
        true
    }

    /// Spawn a chain laid out leftward from `start_col` on row 0, heading right
    pub fn spawn_millipede(&mut self, length: u32, start_col: i32) -> u32 {
        let segments = (0..length as i32)
            .map(|i| Segment {
                pos: Vec2::new((start_col - i) as f32, 0.0),
                dir: 1,
                diving: false,
            })
            .collect();
        let id = self.next_entity_id();
        self.millipedes.push(Millipede { id, segments });
        id
    }

    pub fn segment_count(&self) -> usize {
        self.millipedes.iter().map(Millipede::len).sum()
    }

    /// Remove segment `segment` of chain `chain`, splitting the chain around it.
    ///
    /// The segments before the hit become one chain and the segments after it
    /// another, both under fresh IDs with their order preserved. Empty halves
    /// are not kept. Returns the removed segment.
    pub fn destroy_segment(&mut self, chain: usize, segment: usize) -> Option<Segment> {
        if self.millipedes.get(chain)?.segments.len() <= segment {
            return None;
        }
        let mut millipede = self.millipedes.remove(chain);
        let tail = millipede.segments.split_off(segment + 1);
        let hit = millipede.segments.pop()?;
        for part in [millipede.segments, tail] {
            if !part.is_empty() {
                let id = self.next_entity_id();
                self.millipedes.push(Millipede { id, segments: part });
            }
        }
        Some(hit)
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.bullets.sort_by_key(|b| b.id);
        self.mushrooms.sort_by_key(|m| m.id);
        self.millipedes.retain(|m| !m.is_empty());
        self.millipedes.sort_by_key(|m| m.id);
        self.spiders.sort_by_key(|s| s.id);
        self.ddt_bombs.sort_by_key(|d| d.id);
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub wave: WaveState,
    pub entities: EntityStore,
    /// Ticks until a killed spider is replaced
    pub spider_respawn_ticks: u32,
    /// Events recorded during the most recent tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a game waiting to build its first wave
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let start = Vec2::new(tuning.player_start.0, tuning.player_start.1);
        Self {
            seed,
            time_ticks: 0,
            wave: WaveState::default(),
            entities: EntityStore::new(start),
            spider_respawn_ticks: 0,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.wave.phase
    }

    /// Read-only view handed to the renderer
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            tick: self.time_ticks,
            wave: &self.wave,
            player: &self.entities.player,
            bullets: &self.entities.bullets,
            mushrooms: &self.entities.mushrooms,
            millipedes: &self.entities.millipedes,
            spiders: &self.entities.spiders,
            ddt_bombs: &self.entities.ddt_bombs,
            particles: &self.entities.particles,
            events: &self.events,
        }
    }
}

/// Immutable snapshot of one simulated tick
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tick: u64,
    pub wave: &'a WaveState,
    pub player: &'a Player,
    pub bullets: &'a [Bullet],
    pub mushrooms: &'a [Mushroom],
    pub millipedes: &'a [Millipede],
    pub spiders: &'a [Spider],
    pub ddt_bombs: &'a [DdtBomb],
    pub particles: &'a [Particle],
    pub events: &'a [GameEvent],
}
