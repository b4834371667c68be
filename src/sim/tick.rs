//! Fixed timestep simulation tick
//!
//! While Playing, one tick runs the subsystems in a fixed order:
//!   1. timers (ability cooldowns, status effects, lifetimes)
//!   2. player input and ability activation
//!   3. enemy behaviors
//!   4. integration
//!   5. collision resolution
//!   6. interactions (damage, pickups, stun, hazards)
//!   7. objectives and the level clock
//!   8. terminal check (GameOver before Victory)
//!
//! followed by an invariant sweep that drops dead and corrupt entities.
//! Every step reports what it did as `GameEvent`s.

use glam::Vec2;

use super::ability::{AbilityKind, ActivationError};
use super::behavior::Sight;
use super::collision::{first_overlap, integrate, resolve};
use super::combat::{Hit, apply_hit};
use super::effects::EffectKind;
use super::entity::{DamageOutcome, Entity, ObstacleKind, PickupKind, Role, Team};
use super::objective::{ObjectiveKind, Progress};
use super::spawn::{self, Burst, Launch};
use super::state::{GameEvent, GamePhase, GameState};
use crate::{direction_to, sanitize_dt};

/// Input intents for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired movement direction; lengths above 1 are clamped
    pub movement: Vec2,
    /// Jump (platformer levels only)
    pub jump: bool,
    /// Ability slots pressed this tick (edge-triggered)
    pub activate: Vec<usize>,
    /// World point to throw toward; falls back to facing
    pub aim: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
    /// Leave the menu
    pub start: bool,
    /// Restart after GameOver/Victory
    pub restart: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let dt = sanitize_dt(dt);

    // Game-flow transitions take effect at the tick boundary
    match state.phase {
        GamePhase::Menu => {
            if input.start {
                set_phase(state, GamePhase::Playing, &mut events);
            }
            return events;
        }
        GamePhase::Paused => {
            if input.pause {
                set_phase(state, GamePhase::Playing, &mut events);
            }
            return events;
        }
        GamePhase::GameOver | GamePhase::Victory => {
            if input.restart {
                let from = state.phase;
                state.restart();
                log::info!("Restarting level");
                events.push(GameEvent::PhaseChanged {
                    from,
                    to: GamePhase::Menu,
                });
            }
            return events;
        }
        GamePhase::Playing => {
            if input.pause {
                set_phase(state, GamePhase::Paused, &mut events);
                return events;
            }
        }
    }

    state.time_ticks += 1;

    advance_timers(state, dt, &mut events);
    apply_player_input(state, input, &mut events);
    step_behaviors(state, dt, &mut events);
    move_entities(state, dt, &mut events);
    apply_interactions(state, dt, &mut events);
    update_objectives(state, dt, &mut events);
    check_terminal(state, &mut events);
    sweep(state, &mut events);

    events
}

fn set_phase(state: &mut GameState, to: GamePhase, events: &mut Vec<GameEvent>) {
    let from = state.phase;
    if from == to {
        return;
    }
    state.phase = to;
    log::info!("Phase {from:?} -> {to:?}");
    events.push(GameEvent::PhaseChanged { from, to });
}

/// Step 1: every cooldown, effect and lifetime
fn advance_timers(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    for e in &mut state.entities {
        if !e.alive {
            continue;
        }
        for kind in e.effects.tick(dt) {
            events.push(GameEvent::EffectExpired { entity: e.id, kind });
        }
        if let Some(player) = e.player_state_mut() {
            player.abilities.tick(dt);
            player.contact_grace = (player.contact_grace - dt).max(0.0);
        }
        if e.tick_lifetime(dt) {
            e.alive = false;
            events.push(GameEvent::Expired { entity: e.id });
        }
    }
}

/// Step 2: movement intent and ability presses
fn apply_player_input(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    let platformer = state.gravity.is_some();
    let jump_speed = state.tuning.player.jump_speed;

    if let Some(player) = state.player_mut().filter(|p| p.alive) {
        let movement = if input.movement.is_finite() {
            input.movement.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
        let speed = player.effective_speed();
        let stunned = player.is_stunned();

        if platformer {
            player.vel.x = movement.x * speed;
        } else {
            player.vel = movement * speed;
        }

        let mut jumped = false;
        if let Some(p) = player.player_state_mut() {
            if movement != Vec2::ZERO {
                p.facing = movement.normalize();
            }
            if platformer && input.jump && p.grounded && !stunned {
                p.grounded = false;
                jumped = true;
            }
        }
        if jumped {
            player.vel.y = -jump_speed;
        }
    }

    for &slot in &input.activate {
        if let Err(reason) = activate_ability(state, slot, input.aim, events) {
            log::debug!("Ability slot {slot} rejected: {reason}");
            events.push(GameEvent::AbilityRejected { slot, reason });
        }
    }
}

/// Try to fire one of the player's abilities and apply what it does.
///
/// Rejections change nothing; the caller decides whether to try again.
pub fn activate_ability(
    state: &mut GameState,
    slot: usize,
    aim: Option<Vec2>,
    events: &mut Vec<GameEvent>,
) -> Result<(), ActivationError> {
    if state.phase != GamePhase::Playing {
        return Err(ActivationError::NotPlaying);
    }
    let player = state
        .player_mut()
        .filter(|p| p.alive)
        .ok_or(ActivationError::NotPlaying)?;
    let owner = player.id;
    let center = player.center();

    let Some(ps) = player.player_state_mut() else {
        return Err(ActivationError::NotPlaying);
    };
    let facing = ps.facing;
    let spec = ps.abilities.try_activate(slot)?.clone();

    match spec.kind {
        AbilityKind::Dash { speed_multiplier } => {
            player
                .effects
                .apply(EffectKind::SpeedMultiplier, spec.duration, speed_multiplier);
        }
        AbilityKind::Shield => player.effects.apply(EffectKind::Invulnerable, spec.duration, 1.0),
        AbilityKind::Cloak => player.effects.apply(EffectKind::Cloak, spec.duration, 1.0),
        AbilityKind::AreaAttack {
            radius,
            damage,
            stun_secs,
        } => {
            let id = state.next_entity_id();
            let burst = Burst {
                owner,
                center,
                radius,
                damage,
                stun_secs,
                lifetime: spec.duration,
                tag: spec.tag.clone(),
            };
            state.spawn(spawn::area_effect(id, burst));
        }
        AbilityKind::Throw {
            speed,
            damage,
            lifetime,
            size,
        } => {
            let direction = aim
                .map(|target| direction_to(center, target))
                .filter(|d| *d != Vec2::ZERO)
                .unwrap_or(facing);
            let id = state.next_entity_id();
            let launch = Launch {
                owner,
                team: Team::Player,
                origin: center,
                direction,
                speed,
                damage,
                size,
                lifetime,
                tag: spec.tag.clone(),
            };
            state.spawn(spawn::projectile(id, launch));
            events.push(GameEvent::ProjectileFired {
                owner,
                projectile: id,
            });
        }
    }

    log::debug!("Activated {} (slot {slot})", spec.name);
    events.push(GameEvent::AbilityActivated {
        slot,
        name: spec.name,
    });
    Ok(())
}

/// Step 3: enemy AI intent
fn step_behaviors(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let sight = state.player().map(|p| Sight {
        center: p.center(),
        detectable: p.is_detectable(),
    });

    let mut shots = Vec::new();
    for e in &mut state.entities {
        if !e.alive {
            continue;
        }
        let stunned = e.is_stunned();
        let speed = e.effective_speed();
        let body = e.aabb;
        let Role::Enemy(enemy) = &mut e.role else {
            continue;
        };
        let Some(ctl) = enemy.behavior.as_mut() else {
            e.vel = Vec2::ZERO;
            continue;
        };

        let (intent, transition) = ctl.step(&body, speed, stunned, sight, dt);
        if let Some(t) = transition {
            log::debug!("Enemy {} {:?} -> {:?}", e.id, t.from, t.to);
            events.push(GameEvent::BehaviorChanged {
                entity: e.id,
                from: t.from,
                to: t.to,
            });
        }
        if let (Some(direction), Some(ranged)) = (intent.fire, ctl.profile.ranged) {
            shots.push(Launch {
                owner: e.id,
                team: Team::Enemy,
                origin: body.center(),
                direction,
                speed: ranged.projectile_speed,
                damage: ranged.damage,
                size: ranged.projectile_size,
                lifetime: ranged.projectile_lifetime,
                tag: None,
            });
        }
        e.vel = intent.velocity;
    }

    for launch in shots {
        let owner = launch.owner;
        let id = state.next_entity_id();
        state.spawn(spawn::projectile(id, launch));
        events.push(GameEvent::ProjectileFired {
            owner,
            projectile: id,
        });
    }
}

/// Steps 4 and 5: integrate every mover, then push it out of solids
fn move_entities(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let world = state.world;
    let gravity = state.gravity;
    let max_fall = state.tuning.player.max_fall_speed;
    let solids: Vec<_> = state
        .entities
        .iter()
        .filter(|e| e.alive && e.is_solid())
        .map(|e| e.aabb)
        .collect();

    for e in &mut state.entities {
        if !e.alive {
            continue;
        }
        match e.role {
            Role::Player(_) | Role::Enemy(_) => {
                let previous = e.aabb.pos;
                if let (Some(g), true) = (gravity, e.is_player()) {
                    e.vel.y = (e.vel.y + g * dt).min(max_fall);
                }
                let hits = integrate(e, dt, world);
                let res = resolve(e, previous, &solids, world);
                if let Some(p) = e.player_state_mut() {
                    p.grounded = !res.reverted && (res.landed || hits.bottom);
                }
            }
            Role::Projectile(_) => {
                let hits = integrate(e, dt, world);
                if hits.any() || first_overlap(&e.aabb, &solids).is_some() {
                    e.alive = false;
                    events.push(GameEvent::Expired { entity: e.id });
                }
            }
            _ => {}
        }
    }
}

/// Route a hit through the damage table and report the result
fn deliver_hit(
    state: &mut GameState,
    target: usize,
    hit: &Hit<'_>,
    source: Option<u32>,
    events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    let result = apply_hit(&mut state.entities[target], hit, &state.damage_table);
    let entity = state.entities[target].id;

    match result.outcome {
        DamageOutcome::Ignored => {}
        DamageOutcome::Damaged { dealt } => {
            events.push(GameEvent::Damaged {
                entity,
                amount: dealt,
                source,
            });
        }
        DamageOutcome::Killed { dealt } => {
            events.push(GameEvent::Damaged {
                entity,
                amount: dealt,
                source,
            });
            record_death(state, target, events);
        }
    }
    result.outcome
}

fn record_death(state: &mut GameState, index: usize, events: &mut Vec<GameEvent>) {
    let e = &state.entities[index];
    events.push(GameEvent::EntityDied { entity: e.id });
    if e.team != Team::Enemy {
        log::debug!("Entity {} died", e.id);
        return;
    }
    if let Some(enemy) = e.enemy_state() {
        log::debug!("Enemy {} ({}) defeated", e.id, enemy.kind.tag());
        events.push(GameEvent::EnemyDefeated {
            entity: e.id,
            kind: enemy.kind.tag().to_string(),
        });
        state.score += enemy.score_value;
    }
}

/// Step 6: contact damage, projectiles, area attacks, pickups and hazards
fn apply_interactions(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let Some(pi) = state.index_of(state.player_id) else {
        return;
    };

    enemy_contact(state, pi, events);
    projectile_hits(state, events);
    area_hits(state, events);
    collect_pickups(state, pi, events);
    terrain_hazards(state, dt, events);
}

fn enemy_contact(state: &mut GameState, pi: usize, events: &mut Vec<GameEvent>) {
    let player = &state.entities[pi];
    let ready = player.alive && player.player_state().is_some_and(|p| p.contact_grace <= 0.0);
    if !ready {
        return;
    }

    let player_box = player.aabb;
    let attacker = state.entities.iter().find_map(|e| match &e.role {
        Role::Enemy(enemy)
            if e.alive
                && e.team == Team::Enemy
                && enemy.contact_damage > 0.0
                && e.aabb.overlaps(&player_box) =>
        {
            Some((e.id, enemy.contact_damage))
        }
        _ => None,
    });

    if let Some((source, damage)) = attacker {
        let hit = Hit {
            damage,
            stun_secs: 0.0,
            tag: None,
        };
        if deliver_hit(state, pi, &hit, Some(source), events) != DamageOutcome::Ignored {
            let grace = state.tuning.player.contact_grace;
            if let Some(p) = state.entities[pi].player_state_mut() {
                p.contact_grace = grace;
            }
        }
    }
}

/// Only players and enemies take hits; markers, shots and pickups pass through
fn is_combatant(e: &Entity) -> bool {
    e.alive && matches!(e.role, Role::Player(_) | Role::Enemy(_))
}

fn projectile_hits(state: &mut GameState, events: &mut Vec<GameEvent>) {
    for i in 0..state.entities.len() {
        let shot = &state.entities[i];
        let Role::Projectile(p) = &shot.role else {
            continue;
        };
        if !shot.alive {
            continue;
        }
        let (team, owner, damage, tag, body) = (shot.team, p.owner, p.damage, p.tag.clone(), shot.aabb);

        let target = state.entities.iter().position(|t| {
            is_combatant(t)
                && t.id != owner
                && matches!(
                    (team, t.team),
                    (Team::Player, Team::Enemy) | (Team::Enemy, Team::Player)
                )
                && t.aabb.overlaps(&body)
        });
        let Some(target) = target else {
            continue;
        };

        let hit = Hit {
            damage,
            stun_secs: 0.0,
            tag: tag.as_deref(),
        };
        deliver_hit(state, target, &hit, Some(owner), events);
        state.entities[i].alive = false;
    }
}

fn area_hits(state: &mut GameState, events: &mut Vec<GameEvent>) {
    for i in 0..state.entities.len() {
        let area = &state.entities[i];
        let Role::AreaEffect(a) = &area.role else {
            continue;
        };
        if !area.alive {
            continue;
        }
        let (owner, damage, stun_secs, tag, body) =
            (a.owner, a.damage, a.stun_secs, a.tag.clone(), area.aabb);

        let targets: Vec<usize> = state
            .entities
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                is_combatant(t)
                    && t.team == Team::Enemy
                    && t.aabb.overlaps(&body)
                    && !a.hits.contains(&t.id)
            })
            .map(|(j, _)| j)
            .collect();

        for j in targets {
            let target_id = state.entities[j].id;
            let hit = Hit {
                damage,
                stun_secs,
                tag: tag.as_deref(),
            };
            deliver_hit(state, j, &hit, Some(owner), events);
            if let Role::AreaEffect(a) = &mut state.entities[i].role {
                a.hits.push(target_id);
            }
        }
    }
}

fn collect_pickups(state: &mut GameState, pi: usize, events: &mut Vec<GameEvent>) {
    if !state.entities[pi].alive {
        return;
    }
    let player_box = state.entities[pi].aabb;

    let touched: Vec<(usize, PickupKind)> = state
        .entities
        .iter()
        .enumerate()
        .filter_map(|(i, e)| match &e.role {
            Role::Pickup(kind) if e.alive && e.aabb.overlaps(&player_box) => Some((i, kind.clone())),
            _ => None,
        })
        .collect();

    let t = state.tuning.pickups.clone();
    for (i, kind) in touched {
        state.entities[i].alive = false;
        let player = &mut state.entities[pi];
        let points = match &kind {
            PickupKind::Health => {
                player.heal(t.health);
                0
            }
            PickupKind::Speed => {
                player
                    .effects
                    .apply(EffectKind::SpeedMultiplier, t.speed_secs, t.speed_multiplier);
                0
            }
            PickupKind::Shield => {
                player.effects.apply(EffectKind::Invulnerable, t.shield_secs, 1.0);
                0
            }
            PickupKind::Energy => {
                if let Some(p) = player.player_state_mut() {
                    p.abilities.pool.restore(t.energy);
                }
                0
            }
            PickupKind::Score => t.score,
            PickupKind::Coin => t.coin,
            PickupKind::Gem => t.gem,
            PickupKind::Key => t.key,
            PickupKind::Star => t.star,
            PickupKind::Unknown(_) => 0,
        };
        state.score += points;

        let entity = state.entities[i].id;
        log::debug!("Collected {} (+{points})", kind.tag());
        events.push(GameEvent::PickupCollected {
            entity,
            kind: kind.tag().to_string(),
        });
    }
}

fn terrain_hazards(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let hazards: Vec<_> = state
        .entities
        .iter()
        .filter_map(|e| match &e.role {
            Role::Obstacle(kind) if matches!(kind, ObstacleKind::Water | ObstacleKind::Lava) => {
                Some((kind.clone(), e.aabb))
            }
            _ => None,
        })
        .collect();
    if hazards.is_empty() {
        return;
    }

    let h = state.tuning.hazards.clone();
    for i in 0..state.entities.len() {
        let e = &state.entities[i];
        if !is_combatant(e) || e.team == Team::Neutral {
            continue;
        }
        let body = e.aabb;
        for (kind, area) in &hazards {
            if !area.overlaps(&body) {
                continue;
            }
            match kind {
                ObstacleKind::Water => {
                    state.entities[i]
                        .effects
                        .apply(EffectKind::Slow, h.water_linger, h.water_slow);
                }
                ObstacleKind::Lava => {
                    let hit = Hit {
                        damage: h.lava_dps * dt,
                        stun_secs: 0.0,
                        tag: Some("lava"),
                    };
                    deliver_hit(state, i, &hit, None, events);
                }
                _ => {}
            }
        }
    }
}

/// Step 7: feed this tick's events to the objectives and run the clock
fn update_objectives(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    state.elapsed += dt;
    state.time_remaining = (state.time_remaining - dt).max(0.0);

    let mut completed = Vec::new();
    for event in events.iter() {
        match event {
            GameEvent::PickupCollected { kind, .. } => {
                completed.extend(state.objectives.record(Progress::Collected(kind)));
            }
            GameEvent::EnemyDefeated { kind, .. } => {
                completed.extend(state.objectives.record(Progress::Defeated(kind)));
            }
            _ => {}
        }
    }

    if let Some(player) = state.player().filter(|p| p.alive) {
        let body = player.aabb;
        completed.extend(state.objectives.record(Progress::PlayerAt(&body)));
        completed.extend(state.objectives.record(Progress::Survived(state.elapsed)));
    }

    for objective in completed {
        let obj = &state.objectives.objectives()[objective];
        if matches!(obj.kind, ObjectiveKind::Reach { .. }) {
            events.push(GameEvent::RegionEntered { objective });
        }
        log::info!("Objective complete: {}", obj.describe());
        events.push(GameEvent::ObjectiveCompleted { objective });
    }
}

/// Step 8: losing is checked before winning
fn check_terminal(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let player_alive = state.player().is_some_and(|p| p.alive);
    if !player_alive {
        log::info!("Game over: player died (score {})", state.score);
        set_phase(state, GamePhase::GameOver, events);
    } else if state.time_remaining <= 0.0 {
        log::info!("Game over: time ran out (score {})", state.score);
        set_phase(state, GamePhase::GameOver, events);
    } else if state.objectives.all_satisfied() {
        log::info!("Victory (score {})", state.score);
        set_phase(state, GamePhase::Victory, events);
    }
}

/// Repair or drop corrupt entities, remove the dead (never the player)
fn sweep(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let spawn = state.level().player_spawn();
    let player_id = state.player_id;

    for e in &mut state.entities {
        if e.enforce_invariants() {
            continue;
        }
        if e.id == player_id {
            log::warn!("Player {} had a non-finite position; moved back to spawn", e.id);
            e.aabb.pos = spawn;
            e.vel = Vec2::ZERO;
            events.push(GameEvent::InvariantRepaired {
                entity: e.id,
                removed: false,
            });
        } else {
            log::warn!("Entity {} had a non-finite position; removed", e.id);
            e.alive = false;
            events.push(GameEvent::InvariantRepaired {
                entity: e.id,
                removed: true,
            });
        }
    }

    state.entities.retain(|e| e.alive || e.id == player_id);
    state.normalize_order();
}
