//! Entity registry: the hecs world plus an index from card id to entity.

use std::collections::HashMap;

use hecs::{Entity, World};

use cardflight_core::components::*;
use cardflight_core::enums::LifecycleState;
use cardflight_core::types::{CardId, ContainerFrame, VisualHandle};
use cardflight_layout::LayoutResult;

/// Where a grabbed card lives in the hand.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub layout: &'a LayoutResult,
    /// Slot index of the card in `layout`.
    pub slot: usize,
    pub container: ContainerFrame,
}

/// Components for a freshly grabbed card.
pub struct CardBundle {
    pub tag: CardTag,
    pub kinematics: Kinematics,
    pub grip: Grip,
    pub lifecycle: Lifecycle,
    pub anchors: Anchors,
}

#[derive(Default)]
pub struct Registry {
    world: World,
    index: HashMap<CardId, Entity>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn entity(&self, id: &CardId) -> Option<Entity> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Tracked ids in sorted order.
    pub fn ids(&self) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self.index.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn lifecycle(&self, id: &CardId) -> Option<LifecycleState> {
        let entity = self.entity(id)?;
        self.world
            .get::<&Lifecycle>(entity)
            .ok()
            .map(|life| life.state)
    }

    /// Id of the card currently owning `visual`.
    pub fn visual_owner(&self, visual: VisualHandle) -> Option<CardId> {
        self.world
            .query::<&CardTag>()
            .iter()
            .find(|(_, tag)| tag.visual == visual)
            .map(|(_, tag)| tag.id.clone())
    }

    pub fn spawn(&mut self, bundle: CardBundle) -> Entity {
        let id = bundle.tag.id.clone();
        let entity = self.world.spawn((
            bundle.tag,
            bundle.kinematics,
            bundle.grip,
            bundle.lifecycle,
            bundle.anchors,
        ));
        self.index.insert(id, entity);
        entity
    }

    /// Remove a card by id, returning its tag.
    pub fn despawn(&mut self, id: &CardId) -> Option<CardTag> {
        let entity = self.index.remove(id)?;
        let tag = self.world.get::<&CardTag>(entity).ok().map(|t| (*t).clone());
        let _ = self.world.despawn(entity);
        tag
    }

    /// Drop the index entry of an entity a system already despawned.
    pub fn forget(&mut self, id: &CardId) {
        self.index.remove(id);
    }
}
