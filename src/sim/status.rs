//! Status effects and their per-tick tracker
//!
//! Each enemy carries one optional slot per effect kind, so an effect can be
//! active at most once. Re-application refreshes the expiry.
//!
//! Freeze and stun both zero the enemy's speed. The speed seen when the first
//! of them is applied is captured once per immobilization episode and restored
//! when the last of them expires.

use serde::{Deserialize, Serialize};

use super::entity::{Enemy, EntityId};

/// A freeze or stun
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Immobilized {
    pub expires_at: u64,
}

/// Damage over time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Burn {
    pub expires_at: u64,
    pub damage_per_tick: i32,
    pub next_tick_at: u64,
}

/// Enemy fights for the player until expiry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charm {
    pub expires_at: u64,
}

/// Request to apply an effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusApplication {
    Freeze { duration_ms: u64 },
    Stun { duration_ms: u64 },
    Burn { damage_per_tick: i32, duration_ms: u64 },
    Charm { duration_ms: u64 },
}

/// Active effects on one enemy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub frozen: Option<Immobilized>,
    pub stunned: Option<Immobilized>,
    pub burning: Option<Burn>,
    pub charmed: Option<Charm>,
    /// Speed captured at the start of the current freeze/stun episode
    pub restore_speed: Option<f32>,
}

impl StatusEffects {
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned.is_some()
    }

    pub fn is_immobilized(&self) -> bool {
        self.frozen.is_some() || self.stunned.is_some()
    }

    pub fn is_burning(&self) -> bool {
        self.burning.is_some()
    }

    pub fn is_charmed(&self) -> bool {
        self.charmed.is_some()
    }

    /// Apply or refresh an effect. `speed` is the owner's live speed.
    pub fn apply(
        &mut self,
        application: StatusApplication,
        now: u64,
        speed: &mut f32,
        burn_interval_ms: u64,
    ) {
        match application {
            StatusApplication::Freeze { duration_ms } => {
                self.immobilize(now + duration_ms, speed, true);
            }
            StatusApplication::Stun { duration_ms } => {
                self.immobilize(now + duration_ms, speed, false);
            }
            StatusApplication::Burn {
                damage_per_tick,
                duration_ms,
            } => {
                let expires_at = now + duration_ms;
                self.burning = Some(match self.burning {
                    Some(burn) => Burn {
                        expires_at: burn.expires_at.max(expires_at),
                        damage_per_tick: burn.damage_per_tick.max(damage_per_tick),
                        next_tick_at: burn.next_tick_at,
                    },
                    None => Burn {
                        expires_at,
                        damage_per_tick,
                        next_tick_at: now.saturating_add(burn_interval_ms),
                    },
                });
            }
            StatusApplication::Charm { duration_ms } => {
                let expires_at = now + duration_ms;
                self.charmed = Some(Charm {
                    expires_at: self
                        .charmed
                        .map_or(expires_at, |c| c.expires_at.max(expires_at)),
                });
            }
        }
    }

    fn immobilize(&mut self, expires_at: u64, speed: &mut f32, freeze: bool) {
        if !self.is_immobilized() {
            self.restore_speed = Some(*speed);
        }
        *speed = 0.0;

        let slot = if freeze {
            &mut self.frozen
        } else {
            &mut self.stunned
        };
        *slot = Some(Immobilized {
            expires_at: slot.map_or(expires_at, |s| s.expires_at.max(expires_at)),
        });
    }

    fn release(&mut self, speed: &mut f32) {
        if !self.is_immobilized()
            && let Some(restored) = self.restore_speed.take()
        {
            *speed = restored;
        }
    }
}

/// Advance effects on every live enemy.
///
/// Burn damage is applied on its sub-interval before expiry is checked.
/// Returns the ids of enemies killed by burn; the caller runs the kill path.
pub fn update_statuses(enemies: &mut [Enemy], now: u64, burn_interval_ms: u64) -> Vec<EntityId> {
    let mut killed = Vec::new();

    for enemy in enemies.iter_mut().filter(|e| e.alive) {
        if let Some(mut burn) = enemy.status.burning {
            while burn.next_tick_at <= now && burn.next_tick_at <= burn.expires_at {
                burn.next_tick_at += burn_interval_ms.max(1);
                if enemy.take_damage(burn.damage_per_tick) {
                    killed.push(enemy.id);
                    break;
                }
            }
            enemy.status.burning = (now < burn.expires_at).then_some(burn);
        }

        let status = &mut enemy.status;
        if status.frozen.is_some_and(|f| now >= f.expires_at) {
            status.frozen = None;
        }
        if status.stunned.is_some_and(|s| now >= s.expires_at) {
            status.stunned = None;
        }
        status.release(&mut enemy.speed);

        if status.charmed.is_some_and(|c| now >= c.expires_at) {
            status.charmed = None;
        }
    }

    killed
}
