//! Damage matchups and hit application
//!
//! Weakness/counter interactions are plain data: a level lists
//! `(attack tag, target kind) -> multiplier, stun` rows and every hit goes
//! through the same lookup. Without a matching row a hit does its base
//! damage and base stun.

use serde::{Deserialize, Serialize};

use super::effects::EffectKind;
use super::entity::{DamageOutcome, Entity, Role, normalize_tag};

/// Target name that matches every kind
const ANY_TARGET: &str = "*";

fn default_multiplier() -> f32 {
    1.0
}

/// One row of a damage table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    /// Damage tag of the attack ("fire", "rock", ...)
    pub attack: String,
    /// Kind tag of the target, or "*" for any
    pub target: String,
    #[serde(default = "default_multiplier")]
    pub multiplier: f32,
    /// Stun applied on hit, in seconds
    #[serde(default)]
    pub stun: f32,
}

/// Multiplier and extra stun for one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifier {
    pub multiplier: f32,
    pub stun: f32,
}

impl Default for Modifier {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            stun: 0.0,
        }
    }
}

/// Level-defined weakness table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageTable {
    entries: Vec<Matchup>,
}

impl DamageTable {
    pub fn new(entries: Vec<Matchup>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|m| m.multiplier.is_finite() && m.multiplier >= 0.0)
            .map(|m| Matchup {
                attack: normalize_tag(&m.attack),
                target: normalize_tag(&m.target),
                stun: if m.stun.is_finite() { m.stun.max(0.0) } else { 0.0 },
                ..m
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn row(&self, attack: &str, target: &str) -> Option<&Matchup> {
        self.entries
            .iter()
            .find(|m| m.attack == attack && m.target == target)
    }

    /// Modifier for an attack tag against a target kind.
    ///
    /// An exact target row wins over a "*" row; untagged attacks never match.
    pub fn lookup(&self, attack: Option<&str>, target: &str) -> Modifier {
        let Some(attack) = attack.map(normalize_tag) else {
            return Modifier::default();
        };
        let target = normalize_tag(target);

        self.row(&attack, &target)
            .or_else(|| self.row(&attack, ANY_TARGET))
            .map(|m| Modifier {
                multiplier: m.multiplier,
                stun: m.stun,
            })
            .unwrap_or_default()
    }
}

/// A single hit about to land
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a> {
    pub damage: f32,
    pub stun_secs: f32,
    pub tag: Option<&'a str>,
}

/// What a hit did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub outcome: DamageOutcome,
    /// Seconds of stun applied, 0 if none
    pub stunned: f32,
}

/// Kind tag a damage table row is matched against
pub fn target_tag(entity: &Entity) -> &str {
    match &entity.role {
        Role::Player(_) => "player",
        Role::Enemy(e) => e.kind.tag(),
        Role::Pickup(kind) => kind.tag(),
        Role::Obstacle(kind) => kind.tag(),
        Role::Projectile(_) => "projectile",
        Role::AreaEffect(_) => "area_effect",
    }
}

/// Apply a hit through the damage table.
///
/// Stun only sticks when the hit actually did damage and the target survived.
pub fn apply_hit(target: &mut Entity, hit: &Hit<'_>, table: &DamageTable) -> HitResult {
    let modifier = table.lookup(hit.tag, target_tag(target));
    let outcome = target.take_damage(hit.damage * modifier.multiplier);

    let stun = hit.stun_secs.max(modifier.stun);
    let stunned = match outcome {
        DamageOutcome::Damaged { .. } if stun > 0.0 => {
            target.effects.apply(EffectKind::Stun, stun, 1.0);
            stun
        }
        _ => 0.0,
    };

    HitResult { outcome, stunned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::aabb::Aabb;
    use crate::sim::entity::{EnemyKind, EnemyState, Team};

    fn enemy(kind: EnemyKind) -> Entity {
        Entity::new(
            7,
            Aabb::new(0.0, 0.0, 25.0, 25.0),
            Team::Enemy,
            Role::Enemy(EnemyState {
                kind,
                behavior: None,
                contact_damage: 10.0,
                score_value: 100,
            }),
            100.0,
        )
    }

    fn elemental_table() -> DamageTable {
        DamageTable::new(vec![
            Matchup {
                attack: "Fire".into(),
                target: "ice_golem".into(),
                multiplier: 2.0,
                stun: 1.5,
            },
            Matchup {
                attack: "fire".into(),
                target: "*".into(),
                multiplier: 0.5,
                stun: 0.0,
            },
        ])
    }

    #[test]
    fn test_exact_row_beats_wildcard() {
        let table = elemental_table();
        assert_eq!(
            table.lookup(Some("fire"), "Ice Golem"),
            Modifier {
                multiplier: 2.0,
                stun: 1.5
            }
        );
        assert_eq!(table.lookup(Some("fire"), "basic").multiplier, 0.5);
        assert_eq!(table.lookup(Some("water"), "basic"), Modifier::default());
        assert_eq!(table.lookup(None, "ice_golem"), Modifier::default());
    }

    #[test]
    fn test_weakness_hit_doubles_damage_and_stuns() {
        let table = elemental_table();
        let mut target = enemy(EnemyKind::from_tag("ice_golem"));
        let hit = Hit {
            damage: 15.0,
            stun_secs: 0.0,
            tag: Some("fire"),
        };
        let res = apply_hit(&mut target, &hit, &table);
        assert_eq!(res.outcome, DamageOutcome::Damaged { dealt: 30.0 });
        assert_eq!(res.stunned, 1.5);
        assert!(target.is_stunned());
    }

    #[test]
    fn test_killing_blow_does_not_stun() {
        let mut target = enemy(EnemyKind::Basic);
        let hit = Hit {
            damage: 500.0,
            stun_secs: 2.0,
            tag: None,
        };
        let res = apply_hit(&mut target, &hit, &DamageTable::default());
        assert_eq!(res.outcome, DamageOutcome::Killed { dealt: 100.0 });
        assert_eq!(res.stunned, 0.0);
        assert!(!target.is_stunned());
    }

    #[test]
    fn test_bad_rows_dropped() {
        let table = DamageTable::new(vec![Matchup {
            attack: "x".into(),
            target: "*".into(),
            multiplier: f32::NAN,
            stun: 0.0,
        }]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_matchup_multiplier_defaults_to_one() {
        let m: Matchup = serde_json::from_str(r#"{"attack":"rock","target":"scissors","stun":1.0}"#).unwrap();
        assert_eq!(m.multiplier, 1.0);
    }
}
