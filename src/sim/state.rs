//! Run state: phase machine, player, and the aggregate `GameState`
//!
//! All randomness flows through the owned PCG stream, so a seed fully
//! determines a run. Presentation-facing events accumulate in a frame
//! buffer the adapter drains; they never feed back into the simulation.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use glam::Vec2;

use super::collision::Aabb;
use super::progression::{EffectModifiers, Progression, UpgradeChoice, UpgradeId};
use super::store::EntityStore;
use super::weapons::{Battery, WeaponKind};
use crate::consts::*;

/// Top-level mode of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Title,
    Running,
    /// Simulation frozen while the player picks an upgrade
    LevelUp,
    Paused,
    GameOver,
}

/// Sound cues for the audio adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Jump,
    Hurt,
    Coin,
    Gem,
    Heart,
    Charge,
    Fire,
    EnemyDown,
    LevelUp,
    GameOver,
}

/// One presentation-facing occurrence. Drained by the adapter each frame;
/// purely an output channel.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundCue),
    EnemyKilled { id: u32, xp: u32 },
    LevelReached(u32),
    CoinBonus(u32),
    UpgradeApplied(UpgradeId),
    RunEnded { score: u64 },
}

/// The auto-running character. Horizontal position is fixed; the world
/// scrolls instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub vy: f32,
    pub grounded: bool,
    pub health: f32,
    /// Frames of post-hit invulnerability remaining
    pub invuln_ticks: u32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, GROUND_Y - PLAYER_HEIGHT),
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            vy: 0.0,
            grounded: true,
            health: PLAYER_MAX_HEALTH,
            invuln_ticks: 0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn alive(&self) -> bool {
        self.health > 0.0
    }

    /// Start a jump if grounded. Returns whether a jump launched.
    pub fn jump(&mut self, jump_power: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.grounded = false;
        self.vy = JUMP_VELOCITY * jump_power;
        true
    }

    /// Early release: trim remaining upward velocity for a shorter arc
    pub fn cut_jump(&mut self) {
        if self.vy < 0.0 {
            self.vy *= JUMP_CUTOFF;
        }
    }

    /// Gravity integration and ground clamp, one frame
    pub fn advance(&mut self) {
        self.invuln_ticks = self.invuln_ticks.saturating_sub(1);
        if self.grounded {
            return;
        }
        self.vy += GRAVITY;
        self.pos.y += self.vy;
        let floor = GROUND_Y - self.size.y;
        if self.pos.y >= floor {
            self.pos.y = floor;
            self.vy = 0.0;
            self.grounded = true;
        }
    }

    /// Apply contact damage. Returns false while invulnerability frames
    /// swallow the hit.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.invuln_ticks > 0 || !self.alive() {
            return false;
        }
        self.health -= amount;
        self.invuln_ticks = HURT_INVULN_TICKS;
        true
    }

    pub fn heal(&mut self, amount: f32, max_health: f32) {
        if self.alive() {
            self.health = (self.health + amount).min(max_health);
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete simulation state for one session. Serializable except for the
/// per-frame event buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Frames elapsed in the current run
    pub time_ticks: u64,
    pub score: u64,
    /// Fractional score carry between frames
    score_frac: f32,
    pub game_speed: f32,
    pub player: Player,
    pub store: EntityStore,
    pub battery: Battery,
    pub progression: Progression,
    /// Cached modifier snapshot, recomputed when the build changes
    pub modifiers: EffectModifiers,
    /// Choices on offer while in the LevelUp phase
    pub pending_choices: Vec<UpgradeChoice>,
    pub spawn_timer: u32,
    pub obstacle_timer: u32,
    pub pickup_timer: u32,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Title,
            time_ticks: 0,
            score: 0,
            score_frac: 0.0,
            game_speed: BASE_GAME_SPEED,
            player: Player::new(),
            store: EntityStore::new(),
            battery: Battery::starting_loadout(),
            progression: Progression::new(),
            modifiers: EffectModifiers::default(),
            pending_choices: Vec::new(),
            spawn_timer: 0,
            obstacle_timer: 0,
            pickup_timer: 0,
            events: Vec::new(),
        }
    }

    /// Reset per-run state and enter Running. The RNG stream continues
    /// rather than reseeding, so successive runs in one session differ.
    pub fn begin_run(&mut self) {
        self.phase = GamePhase::Running;
        self.time_ticks = 0;
        self.score = 0;
        self.score_frac = 0.0;
        self.game_speed = BASE_GAME_SPEED;
        self.player = Player::new();
        self.store.clear();
        self.battery = Battery::starting_loadout();
        self.progression = Progression::new();
        self.modifiers = EffectModifiers::default();
        self.pending_choices.clear();
        self.spawn_timer = 0;
        self.obstacle_timer = 0;
        self.pickup_timer = 0;
        self.events.clear();
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn push_sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Drain the frame's events for the presentation adapter
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn health_frac(&self) -> f32 {
        (self.player.health / self.modifiers.max_health).clamp(0.0, 1.0)
    }

    /// Accumulate distance-based score, carrying the fraction
    pub fn accrue_score(&mut self, amount: f32) {
        self.score_frac += amount;
        while self.score_frac >= 1.0 {
            self.score_frac -= 1.0;
            self.score += 1;
        }
    }

    /// Recompute the modifier snapshot from the progression build. Max
    /// health growth is granted to current health; shrink never happens.
    pub fn refresh_modifiers(&mut self) {
        let old_max = self.modifiers.max_health;
        self.modifiers = self.progression.modifiers();
        if self.modifiers.max_health > old_max {
            self.player.health += self.modifiers.max_health - old_max;
        }
    }

    /// Apply one chosen upgrade. Returns false (state unchanged) when the
    /// upgrade is no longer legal.
    pub fn apply_upgrade(&mut self, id: UpgradeId) -> bool {
        let applied = match id {
            UpgradeId::Passive(passive) => self.progression.raise_passive(passive),
            UpgradeId::UnlockWeapon(kind) => self.battery.unlock(kind),
            UpgradeId::WeaponLevel(kind) => self.battery.level_up(kind),
            UpgradeId::Ultimate(ultimate) => self.progression.take_ultimate(ultimate),
        };
        if applied {
            self.refresh_modifiers();
            self.push_event(GameEvent::UpgradeApplied(id));
        }
        applied
    }

    /// Level of a carried weapon, for HUD display
    pub fn weapon_level(&self, kind: WeaponKind) -> Option<u32> {
        self.battery.level_of(kind)
    }
}
