/// The step function: advances the world by one frame.
///
/// Processing order (Level1 only; other states just tick the cooldown):
///   1. Wall resolution (character, then wanderers)
///   2. Detection (spotters first, first hit wins)
///   3. Trophy
///   4. Character and map timers
///   5. Enemies, on the speed-scaled clock
///   6. Spawning
///   7. Flash expiry
///   8. Dash cancelled by a wall
///   9. Respawn after death
///
/// A spawn failure returns early; the frame's later phases are skipped and
/// no enemy is added.

use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use tracing::{debug, info};

use crate::backend::SpriteLoader;
use crate::domain::enemy::{EnemyKind, PatrolBounds, Spotter, Wanderer};
use crate::domain::entity::Body;
use crate::error::SpawnError;
use super::event::GameEvent;
use super::world::{spotter_anchor, GameState, World, MAX_SPOTTERS, MAX_WANDERERS};

pub const FLASH_DURATION: Duration = Duration::from_secs(2);
pub const RESPAWN_DELAY: Duration = Duration::from_secs(2);
/// Distance of the wanderer patrol rectangle from the screen edges.
pub const PATROL_MARGIN: f32 = 150.0;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(
    world: &mut World,
    elapsed_ms: f32,
    sprites: &mut dyn SpriteLoader,
) -> Result<Vec<GameEvent>, SpawnError> {
    let mut events = vec![];
    world.color_cooldown = world.color_cooldown.saturating_sub(1);
    if world.state != GameState::Level1 {
        return Ok(events);
    }

    let enemy_ms = elapsed_ms * world.speed;

    resolve_walls(world);
    resolve_detection(world, &mut events);
    resolve_trophy(world, &mut events);
    world.character.update(elapsed_ms);
    world.map.update(elapsed_ms);
    advance_enemies(world, enemy_ms);
    spawn_enemies(world, enemy_ms, sprites, &mut events)?;
    resolve_flash(world, &mut events);
    resolve_dash_impact(world, &mut events);
    resolve_respawn(world, &mut events);

    Ok(events)
}

// ══════════════════════════════════════════════════════════════
// Phases
// ══════════════════════════════════════════════════════════════

fn resolve_walls(world: &mut World) {
    world.map.resolve_wall_collision(&mut world.character);
    for wanderer in &mut world.wanderers {
        world.map.resolve_wall_collision(wanderer);
    }
}

fn resolve_detection(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.character.is_alive() || !world.character_detectable() {
        return;
    }
    let character = &world.character;
    let by = if world.spotters.iter().any(|s| s.collides_with(character)) {
        Some(EnemyKind::Spotter)
    } else if world.wanderers.iter().any(|w| w.collides_with(character)) {
        Some(EnemyKind::Wanderer)
    } else {
        None
    };
    if let Some(by) = by {
        info!("character detected by {by:?} at {:?}", world.character.position);
        world.map.mark_character_dead();
        world.character.kill();
        events.push(GameEvent::CharacterDetected { by });
    }
}

fn resolve_trophy(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.trophy.collides_with(&world.character) {
        return;
    }
    if world.character.is_alive() {
        info!("trophy reached");
        events.push(GameEvent::TrophyReached);
        world.map.mark_character_dead();
        world.transition(GameState::WinScreen, events);
    }
    world.character.kill();
}

fn advance_enemies(world: &mut World, enemy_ms: f32) {
    let bounds = PatrolBounds::for_screen(world.screen, PATROL_MARGIN);
    for spotter in &mut world.spotters {
        spotter.update(enemy_ms);
    }
    for wanderer in &mut world.wanderers {
        wanderer.steer(&bounds);
        wanderer.update(enemy_ms);
    }
}

/// One spotter per frame until all posts are manned; wanderers enter on
/// the right leg of the patrol whenever the spawn timer runs out.
fn spawn_enemies(
    world: &mut World,
    enemy_ms: f32,
    sprites: &mut dyn SpriteLoader,
    events: &mut Vec<GameEvent>,
) -> Result<(), SpawnError> {
    if world.spotters.len() < MAX_SPOTTERS {
        let anchor = spotter_anchor(world.screen, world.spotters.len());
        let spotter = Spotter::init(anchor, sprites)
            .map_err(|source| SpawnError { kind: EnemyKind::Spotter, source })?;
        world.spotters.push(spotter);
        debug!("spotter {} posted at {anchor:?}", world.spotters.len());
        events.push(GameEvent::SpotterSpawned);
    }

    if world.wanderers.len() < MAX_WANDERERS {
        world.next_wanderer_spawn_ms -= enemy_ms;
        if world.next_wanderer_spawn_ms <= 0.0 {
            let bounds = PatrolBounds::for_screen(world.screen, PATROL_MARGIN);
            let y = world.rng.gen_range(bounds.min.y..=bounds.max.y);
            let at = Vec2::new(bounds.max.x, y);
            let wanderer = Wanderer::init(at, world.gameplay.wanderer_speed, sprites)
                .map_err(|source| SpawnError { kind: EnemyKind::Wanderer, source })?;
            world.wanderers.push(wanderer);

            let delay = world.gameplay.spawn_delay_ms;
            world.next_wanderer_spawn_ms = delay / 2.0 + world.rng.gen::<f32>() * delay / 2.0;
            debug!(
                "wanderer {} spawned at {at:?}, next in {:.0}ms",
                world.wanderers.len(),
                world.next_wanderer_spawn_ms
            );
            events.push(GameEvent::WandererSpawned);
        }
    }
    Ok(())
}

fn resolve_flash(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.map.flash_active() && world.map.flash_elapsed() > FLASH_DURATION {
        world.map.set_flash(false);
        world.map.reset_flash_timer();
        events.push(GameEvent::FlashEnded);
    }
}

fn resolve_dash_impact(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.character.is_dashing() && world.character.wall_contact() {
        world.character.stop_dash();
        world.color_cooldown = world.gameplay.color_cooldown_frames;
        events.push(GameEvent::DashCancelled);
    }
}

fn resolve_respawn(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.character.is_alive()
        && world.map.character_dead()
        && world.map.character_dead_elapsed() > RESPAWN_DELAY
    {
        world.reset_level();
        events.push(GameEvent::LevelReset);
    }
}
