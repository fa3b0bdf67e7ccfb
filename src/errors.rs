//! Errors that can happen when using `bevy_verbs`.

use thiserror::Error;

use crate::prelude::{ActorId, AnimationId};

/// Errors when running or resuming an action.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ActionError {
    /// The action points to an actor that is not in the scene.
    /// It means the script is broken.
    #[error("actor {0} not found in the scene")]
    ActorNotFound(ActorId),
    /// A talk text was requested on an actor without the `Character` component.
    #[error("actor {0} is not a character and cannot talk")]
    NotACharacter(ActorId),
    /// The actor has no `ActorAnimation` driver.
    #[error("actor {0} has no animation driver")]
    NotAnimated(ActorId),
    /// A new action was run on an actor that is still blocked by a pending one.
    #[error("actor {0} is blocked by a pending action")]
    ActorBusy(ActorId),
    /// A pending action restored from a save slot has nothing left that
    /// would complete it, e.g. its text is missing from the slot.
    #[error("pending action of {0} has nothing left to wait for")]
    NothingToAwait(ActorId),
    /// The animation driver refused an animation request.
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// Errors from the actor animation driver.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnimationError {
    /// The requested animation is not one of the actor clips.
    #[error("animation {0} not found")]
    MissingClip(AnimationId),
}

/// Errors when writing or reading the save slot.
#[derive(Error, Debug)]
pub enum SaveError {
    /// The action state could not be written as RON.
    #[error("could not write the save slot: {0}")]
    Serialize(#[from] serde_ron::Error),
    /// The save slot is not valid RON.
    #[error("could not parse the save slot: {0}")]
    Parse(#[from] serde_ron::error::SpannedError),
    /// The save slot names an actor that is not in the scene.
    #[error("the save slot references the unknown actor {0}")]
    UnknownActor(ActorId),
}
