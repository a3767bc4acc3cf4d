//! Session-scoped owner of all bot movement state.
//!
//! A [`BotSession`] is built when a raid starts and dropped (or [`end`]ed)
//! when it finishes. It owns the registry, one [`BotMover`] per bot, the
//! tuning config, and simulation time. Nothing here is global.
//!
//! [`end`]: BotSession::end

use std::collections::HashMap;

use crate::config::MovementConfig;
use crate::mover::{BotMover, CharacterController, MoveCommand, NavMeshQuery};
use crate::registry::EntityRegistry;
use crate::sprint::Urgency;
use crate::state::PathStatus;
use crate::vector::Vec3;

#[derive(Debug)]
pub struct BotSession {
    config: MovementConfig,
    registry: EntityRegistry,
    /// Keyed by registry ID; removed together with the record.
    movers: HashMap<usize, BotMover>,
    sim_time: f32,
}

impl BotSession {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            movers: HashMap::new(),
            sim_time: 0.0,
        }
    }

    /// Register a bot and attach an idle mover to it.
    pub fn spawn_bot(&mut self, engine_id: Option<usize>, profile_id: Option<String>) -> usize {
        let id = self.registry.add_bot(engine_id, profile_id);
        self.registry[id].movement.current_pose = self.config.default_pose;
        self.movers.insert(id, BotMover::new(&self.config));
        log::debug!("session: spawned bot {id}");
        id
    }

    /// Remove a bot and its mover. Its ID becomes free for reuse.
    pub fn despawn_bot(&mut self, id: usize) -> bool {
        self.movers.remove(&id);
        let removed = self.registry.remove(id);
        if removed {
            log::debug!("session: despawned bot {id}");
        }
        removed
    }

    /// Send bot `id` toward `target`. `None` if the bot does not exist.
    pub fn command_move(
        &mut self,
        id: usize,
        target: Vec3,
        urgency: Urgency,
        ctrl: &dyn CharacterController,
        nav: &dyn NavMeshQuery,
    ) -> Option<PathStatus> {
        let entity = self.registry.try_get_mut(id)?;
        let mover = self.movers.get_mut(&id)?;

        let position = ctrl.position();
        let status = mover.go_to(target, urgency, nav, position);
        entity.position = position;
        entity.is_active = mover.is_active();
        mover.sync_state(&mut entity.movement, self.sim_time);
        Some(status)
    }

    /// Stop bot `id` and return it to `Idle`.
    pub fn stop_bot(&mut self, id: usize, ctrl: &mut dyn CharacterController) -> bool {
        let (Some(entity), Some(mover)) = (self.registry.try_get_mut(id), self.movers.get_mut(&id))
        else {
            return false;
        };
        mover.deactivate(ctrl, &mut entity.movement);
        entity.is_active = false;
        true
    }

    /// Advance one bot by one tick.
    pub fn update_bot(
        &mut self,
        id: usize,
        ctrl: &mut dyn CharacterController,
        nav: &dyn NavMeshQuery,
    ) -> Option<MoveCommand> {
        let entity = self.registry.try_get_mut(id)?;
        let mover = self.movers.get_mut(&id)?;

        let command = mover.update(ctrl, nav, &mut entity.movement, self.sim_time);
        entity.position = ctrl.position();
        entity.is_active = mover.is_active();
        Some(command)
    }

    pub fn advance_time(&mut self, dt: f32) {
        self.sim_time += dt;
    }

    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn mover(&self, id: usize) -> Option<&BotMover> {
        self.movers.get(&id)
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Drop every bot and reset time. The session can be reused afterwards.
    pub fn end(&mut self) {
        log::info!(
            "session: ending with {} bots at t={:.1}s",
            self.registry.len(),
            self.sim_time
        );
        self.movers.clear();
        self.registry.clear();
        self.sim_time = 0.0;
    }
}
