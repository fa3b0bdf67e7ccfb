//! Saving and restoring the action state of a scene.
//!
//! A save slot holds the runner of every actor, with its queue and its
//! pending action, and the texts on screen. Pending actions keep their
//! resume state, so a `say` suspended while the actor talks restores the
//! right animation after a load.

use bevy::{prelude::*, utils::HashMap};
use serde::{Deserialize, Serialize};
use serde_ron::ser::{to_string_pretty, PrettyConfig};

use crate::prelude::{ActionRunner, ActorId, SaveError, SceneActor, TextManager};

/// A runner written to the save slot.
#[derive(Serialize)]
struct SavedRunner<'a> {
    /// The id of the actor owning the runner.
    actor: &'a str,
    /// The runner.
    runner: &'a ActionRunner,
}

/// The save slot, as written.
#[derive(Serialize)]
struct SavedSlot<'a> {
    /// The runners, one per actor.
    runners: Vec<SavedRunner<'a>>,
    /// The texts on screen.
    texts: &'a TextManager,
}

/// A runner read from the save slot.
#[derive(Deserialize)]
struct LoadedRunner {
    /// The id of the actor owning the runner.
    actor: ActorId,
    /// The runner.
    runner: ActionRunner,
}

/// The action state of a scene, read from RON.
#[derive(Deserialize)]
pub struct SaveSlot {
    /// The runners, one per actor.
    #[serde(default)]
    runners: Vec<LoadedRunner>,
    /// The texts on screen.
    #[serde(default)]
    texts: TextManager,
}

impl SaveSlot {
    /// Writes the action state of every actor, and the texts, as RON.
    pub fn capture(world: &mut World) -> Result<String, SaveError> {
        let mut actors = world.query::<(&SceneActor, &ActionRunner)>();
        let no_texts = TextManager::default();

        let slot = SavedSlot {
            runners: actors
                .iter(world)
                .map(|(actor, runner)| SavedRunner {
                    actor: &actor.id,
                    runner,
                })
                .collect(),
            texts: world.get_resource::<TextManager>().unwrap_or(&no_texts),
        };

        let ron = to_string_pretty(&slot, PrettyConfig::default())?;
        info!("Captured the actions of {} actors", slot.runners.len());
        Ok(ron)
    }

    /// Parses a save slot.
    pub fn from_ron(ron: &str) -> Result<Self, SaveError> {
        Ok(serde_ron::from_str(ron)?)
    }

    /// Restores the action state written by [`SaveSlot::capture`].
    ///
    /// The actors must already be in the scene. Their runners are replaced,
    /// runners of actors missing from the slot are emptied. Pending actions
    /// are linked back to their signals on the next update.
    pub fn restore(world: &mut World, ron: &str) -> Result<(), SaveError> {
        Self::from_ron(ron)?.apply(world)
    }

    /// Replaces the action state of the world with this slot.
    ///
    /// Nothing changes if the slot names an actor that is not in the scene.
    pub fn apply(self, world: &mut World) -> Result<(), SaveError> {
        let mut query = world.query::<(Entity, &SceneActor)>();
        let actors: HashMap<ActorId, Entity> = query
            .iter(world)
            .map(|(e, actor)| (actor.id.clone(), e))
            .collect();

        if let Some(unknown) = self
            .runners
            .iter()
            .find(|r| !actors.contains_key(&r.actor))
        {
            return Err(SaveError::UnknownActor(unknown.actor.clone()));
        }

        let mut with_runner = world.query_filtered::<Entity, With<ActionRunner>>();
        let stale: Vec<Entity> = with_runner.iter(world).collect();
        for e in stale {
            world.entity_mut(e).insert(ActionRunner::default());
        }

        let restored = self.runners.len();
        for LoadedRunner { actor, runner } in self.runners {
            if let Some(&e) = actors.get(&actor) {
                world.entity_mut(e).insert(runner);
            }
        }
        world.insert_resource(self.texts);

        info!("Restored the actions of {restored} actors");
        Ok(())
    }
}
