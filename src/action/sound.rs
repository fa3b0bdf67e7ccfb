//! The `sound` action.

use serde::{Deserialize, Serialize};

use crate::prelude::{
    Action, ActionContext, ActionError, ActionParams, ActionStatus, ActorId, CompletionSignal,
    PlaySoundRequest, SoundId,
};

use super::find_actor;

/// Plays a sound of an actor. Completes right away.
#[derive(ActionParams, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[action(name = "sound", description = "Play a sound")]
pub struct SoundAction {
    /// The actor owning the sound.
    #[param(kind = Actor, description = "The target actor", required)]
    pub actor: ActorId,
    /// The sound to play.
    #[param(kind = Sound, description = "The sound to play", required)]
    pub sound: SoundId,
}

impl SoundAction {
    /// Creates a new `SoundAction`.
    pub fn new(actor: impl Into<ActorId>, sound: impl Into<SoundId>) -> Self {
        Self {
            actor: actor.into(),
            sound: sound.into(),
        }
    }
}

impl Action for SoundAction {
    fn run(
        &mut self,
        ctx: &mut ActionContext,
        _signal: CompletionSignal,
    ) -> Result<ActionStatus, ActionError> {
        find_actor(&mut ctx.actors, &self.actor)?;
        ctx.sounds.send(PlaySoundRequest {
            actor: self.actor.clone(),
            sound: self.sound.clone(),
        });
        Ok(ActionStatus::Done)
    }
}
