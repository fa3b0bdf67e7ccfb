//! The action execution contract and the built-in actions.
//!
//! An action runs once. When it returns [`ActionStatus::Pending`] it keeps
//! the [`CompletionSignal`] it was given (or hands it to a collaborator) and
//! the runner stores it until the signal fires, then calls
//! [`Action::resume`] once.

use bevy::{ecs::system::SystemParam, prelude::*};
use serde::{Deserialize, Serialize};

use crate::prelude::{
    ActionDescriptor, ActionError, ActionParams, ActorAnimation, Character, CompletionSignal,
    PlaySoundRequest, SceneActor, TextManager,
};

pub mod animation;
pub mod say;
pub mod sound;

use self::{animation::AnimationAction, say::SayAction, sound::SoundAction};

/// What `run` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// The action completed.
    Done,
    /// The action deferred some work and waits for its signal.
    Pending,
}

/// The components of an actor that actions can read and drive.
pub type ActorQuery = (
    &'static SceneActor,
    &'static Transform,
    Option<&'static mut ActorAnimation>,
    Option<&'static Character>,
);

/// A resolved actor, as returned by [`find_actor`].
pub type ActorItem<'a> = (
    &'a SceneActor,
    &'a Transform,
    Option<Mut<'a, ActorAnimation>>,
    Option<&'a Character>,
);

/// The collaborators an action can use while running.
#[derive(SystemParam)]
pub struct ActionContext<'w, 's> {
    /// The actors of the scene.
    pub actors: Query<'w, 's, ActorQuery>,
    /// The text display coordinator.
    pub texts: ResMut<'w, TextManager>,
    /// The audio backend.
    pub sounds: EventWriter<'w, PlaySoundRequest>,
}

/// Resolves an actor of the scene by id.
pub fn find_actor<'a>(
    actors: &'a mut Query<'_, '_, ActorQuery>,
    id: &str,
) -> Result<ActorItem<'a>, ActionError> {
    actors
        .iter_mut()
        .find(|(actor, ..)| actor.id == id)
        .ok_or_else(|| ActionError::ActorNotFound(id.to_string()))
}

/// The action execution contract.
pub trait Action {
    /// Runs the action.
    ///
    /// Returns [`ActionStatus::Pending`] only if `signal` will fire later,
    /// fired by the action collaborators. It never fires during `run`.
    fn run(
        &mut self,
        ctx: &mut ActionContext,
        signal: CompletionSignal,
    ) -> Result<ActionStatus, ActionError>;

    /// Finishes a pending action after its signal fired.
    ///
    /// Called at most once per pending `run`. Calling it again is a no-op.
    fn resume(&mut self, _ctx: &mut ActionContext) -> Result<(), ActionError> {
        Ok(())
    }

    /// Links a pending action restored from a save slot to the signal the
    /// runner holds for it, so the collaborator doing the deferred work fires
    /// that one. An error drops the pending action.
    fn reattach(
        &self,
        _ctx: &mut ActionContext,
        _signal: &CompletionSignal,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

/// The actions a script can contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptAction {
    /// Says a text.
    Say(SayAction),
    /// Plays a sound.
    Sound(SoundAction),
    /// Plays an animation.
    Animation(AnimationAction),
}

impl ScriptAction {
    /// The descriptors of every action, in variant order.
    pub fn catalog() -> Vec<ActionDescriptor> {
        vec![
            SayAction::descriptor(),
            SoundAction::descriptor(),
            AnimationAction::descriptor(),
        ]
    }

    /// The inner action.
    fn inner(&self) -> &dyn Action {
        match self {
            ScriptAction::Say(a) => a,
            ScriptAction::Sound(a) => a,
            ScriptAction::Animation(a) => a,
        }
    }

    /// The inner action, mutably.
    fn inner_mut(&mut self) -> &mut dyn Action {
        match self {
            ScriptAction::Say(a) => a,
            ScriptAction::Sound(a) => a,
            ScriptAction::Animation(a) => a,
        }
    }
}

impl Action for ScriptAction {
    fn run(
        &mut self,
        ctx: &mut ActionContext,
        signal: CompletionSignal,
    ) -> Result<ActionStatus, ActionError> {
        self.inner_mut().run(ctx, signal)
    }

    fn resume(&mut self, ctx: &mut ActionContext) -> Result<(), ActionError> {
        self.inner_mut().resume(ctx)
    }

    fn reattach(
        &self,
        ctx: &mut ActionContext,
        signal: &CompletionSignal,
    ) -> Result<(), ActionError> {
        self.inner().reattach(ctx, signal)
    }
}

impl From<SayAction> for ScriptAction {
    fn from(action: SayAction) -> Self {
        ScriptAction::Say(action)
    }
}

impl From<SoundAction> for ScriptAction {
    fn from(action: SoundAction) -> Self {
        ScriptAction::Sound(action)
    }
}

impl From<AnimationAction> for ScriptAction {
    fn from(action: AnimationAction) -> Self {
        ScriptAction::Animation(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_action() {
        let names: Vec<_> = ScriptAction::catalog().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["say", "sound", "animation"]);
    }

    #[test]
    fn script_action_ron() {
        let action: ScriptAction = serde_ron::from_str(
            r#"Say((actor: "frank", text: Some("Hello"), kind: Talk))"#,
        )
        .unwrap();

        let ScriptAction::Say(say) = action else {
            panic!("expected a say action");
        };
        assert_eq!(say.actor, "frank");
        assert_eq!(say.text.as_deref(), Some("Hello"));
        assert!(say.wait);
        assert!(!say.queue);
        assert!(say.previous_anim().is_none());
    }
}
