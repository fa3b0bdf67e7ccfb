//! Events the plugin receives and emits.

use bevy::prelude::{Entity, Event};

use crate::prelude::{ActorId, SoundId};

/// Event to dismiss the text on screen.
///
/// This event is typically wired to an input from the player, e.g. a mouse
/// click to skip the current line. A `say` action waiting for the text
/// resumes right after.
#[derive(Event, Debug, Default, Clone)]
pub struct SkipTextRequest;

/// Event to drop the pending and queued actions of an actor without
/// resuming them. Late completions for the dropped action are ignored.
#[derive(Event, Debug, Clone)]
pub struct AbandonActionsRequest {
    /// The actor entity with the `ActionRunner` component.
    pub actor: Entity,
}

impl AbandonActionsRequest {
    /// Creates a new `AbandonActionsRequest`.
    pub fn new(actor: Entity) -> Self {
        Self { actor }
    }
}

/// Emitted when an action fails to run or resume.
/// The failed turn is dropped together with the actions queued after it.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ActionFailed {
    /// The actor whose turn failed.
    pub actor: ActorId,
    /// What went wrong.
    pub error: String,
}

/// Emitted when an action plays a sound.
/// The audio backend of the game is expected to listen for it.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct PlaySoundRequest {
    /// The actor owning the sound.
    pub actor: ActorId,
    /// The sound to play.
    pub sound: SoundId,
}
