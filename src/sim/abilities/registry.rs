//! Owned abilities, acquisition and leveling
//!
//! Abilities are kept in acquisition order, which is also the order passive
//! attack modifiers are layered in.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityContext, AbilityId, PassiveAbility};
use super::catalog;
use super::modifiers::AttackModifiers;
use crate::consts::UPGRADE_CHOICES;
use crate::sim::effects::EffectCommand;
use crate::sim::entity::Player;

/// A level-up choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub ability: AbilityId,
    /// 1 = acquire, otherwise the level after upgrading
    pub next_level: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    abilities: Vec<Ability>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owns(&self, id: AbilityId) -> bool {
        self.abilities.iter().any(|a| a.id == id)
    }

    pub fn get(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.iter()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Add an ability at level 1. Passives take effect immediately.
    pub fn acquire(&mut self, id: AbilityId, player: &mut Player) -> bool {
        if self.owns(id) {
            return false;
        }
        let ability = catalog::create(id);
        if let Some(passive) = ability.passive() {
            apply_passive(player, None, passive);
        }
        log::info!("Acquired {}", id.name());
        self.abilities.push(ability);
        true
    }

    /// Raise an owned ability by one level
    pub fn upgrade(&mut self, id: AbilityId, player: &mut Player) -> bool {
        let Some(ability) = self.abilities.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        let before = ability.passive().cloned();
        if !ability.upgrade() {
            return false;
        }
        if let Some(after) = ability.passive() {
            apply_passive(player, before.as_ref(), after);
        }
        log::info!("Upgraded {} to level {}", id.name(), ability.level);
        true
    }

    /// Acquire or upgrade, whichever `id` needs
    pub fn apply_choice(&mut self, id: AbilityId, player: &mut Player) -> bool {
        if self.owns(id) {
            self.upgrade(id, player)
        } else {
            self.acquire(id, player)
        }
    }

    /// Every ability that can currently be acquired or upgraded
    pub fn upgrade_candidates(&self) -> Vec<UpgradeOption> {
        AbilityId::ALL
            .iter()
            .filter_map(|&id| match self.get(id) {
                None => Some(UpgradeOption {
                    ability: id,
                    next_level: 1,
                }),
                Some(owned) if owned.can_upgrade() => Some(UpgradeOption {
                    ability: id,
                    next_level: owned.level + 1,
                }),
                Some(_) => None,
            })
            .collect()
    }

    /// Uniform random sample of up to `UPGRADE_CHOICES` candidates
    pub fn upgrade_options(&self, rng: &mut impl Rng) -> Vec<UpgradeOption> {
        let candidates = self.upgrade_candidates();
        let amount = UPGRADE_CHOICES.min(candidates.len());
        rand::seq::index::sample(rng, candidates.len(), amount)
            .into_iter()
            .map(|i| candidates[i])
            .collect()
    }

    /// Try to use an owned ability
    pub fn activate(
        &mut self,
        id: AbilityId,
        ctx: &AbilityContext,
        rng: &mut impl Rng,
    ) -> Option<Vec<EffectCommand>> {
        let ability = self.abilities.iter_mut().find(|a| a.id == id)?;
        let commands = ability.activate(ctx, rng)?;
        log::debug!("{} activated at {}ms", id.name(), ctx.now);
        Some(commands)
    }

    /// Cancel an active buff
    pub fn deactivate(&mut self, id: AbilityId) -> Vec<EffectCommand> {
        self.abilities
            .iter_mut()
            .find(|a| a.id == id)
            .map(Ability::deactivate)
            .unwrap_or_default()
    }

    /// Expire finished buffs
    pub fn update(&mut self, now: u64) -> Vec<EffectCommand> {
        self.abilities
            .iter_mut()
            .flat_map(|a| a.expire(now))
            .collect()
    }

    /// Abilities the engine should fire this tick
    pub fn auto_triggers(&self, ctx: &AbilityContext) -> Vec<AbilityId> {
        self.abilities
            .iter()
            .filter(|a| a.should_auto_trigger(ctx))
            .map(|a| a.id)
            .collect()
    }

    /// Merged modifiers of every owned passive
    pub fn attack_modifiers(&self) -> AttackModifiers {
        AttackModifiers::merge(
            self.abilities
                .iter()
                .filter_map(|a| a.passive())
                .map(|p| &p.modifiers),
        )
    }
}

/// Apply the difference between two passive levels to the player
fn apply_passive(player: &mut Player, before: Option<&PassiveAbility>, after: &PassiveAbility) {
    player.projectile_damage += after.damage_bonus - before.map_or(0, |b| b.damage_bonus);
    player.speed += after.speed_bonus - before.map_or(0.0, |b| b.speed_bonus);
    if let Some(reduction) = after.fire_cooldown_reduction {
        player.fire_cooldown_reduction = player.fire_cooldown_reduction.max(reduction);
    }
}
