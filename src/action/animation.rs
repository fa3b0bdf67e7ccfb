//! The `animation` action.

use serde::{Deserialize, Serialize};

use crate::prelude::{
    Action, ActionContext, ActionError, ActionParams, ActionStatus, ActorId, AnimationId,
    CompletionSignal, RepeatMode,
};

use super::find_actor;

/// Plays an animation on an actor, optionally waiting for it to end.
#[derive(ActionParams, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[action(name = "animation", description = "Sets the animation for an actor")]
pub struct AnimationAction {
    /// The actor to animate.
    #[param(kind = Actor, description = "The target actor", required)]
    pub actor: ActorId,
    /// The animation to play.
    #[param(kind = Animation, description = "The animation to set", required)]
    pub animation: AnimationId,
    /// How the animation repeats.
    #[param(
        kind = Enum,
        description = "The repeat mode",
        required,
        default = "SpriteDefined"
    )]
    #[serde(default)]
    pub mode: RepeatMode,
    /// Cycles of a looping animation before it counts as ended.
    #[param(
        kind = Integer,
        description = "The times to repeat",
        default = "0"
    )]
    #[serde(default)]
    pub count: u32,
    /// Block the script until the animation ends.
    #[param(
        kind = Boolean,
        description = "Block the script until the animation ends.",
        default = "true"
    )]
    #[serde(default = "wait_by_default")]
    pub wait: bool,
}

/// Actions wait for their animation unless told otherwise.
fn wait_by_default() -> bool {
    true
}

impl AnimationAction {
    /// Creates an action playing `animation` once on `actor` and waiting for it.
    pub fn new(actor: impl Into<ActorId>, animation: impl Into<AnimationId>) -> Self {
        Self {
            actor: actor.into(),
            animation: animation.into(),
            mode: RepeatMode::SpriteDefined,
            count: 0,
            wait: true,
        }
    }

    /// Sets whether the script waits for the animation.
    pub fn waiting(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }
}

impl Action for AnimationAction {
    fn run(
        &mut self,
        ctx: &mut ActionContext,
        signal: CompletionSignal,
    ) -> Result<ActionStatus, ActionError> {
        let (_, _, animation, _) = find_actor(&mut ctx.actors, &self.actor)?;
        let mut animation = animation.ok_or_else(|| ActionError::NotAnimated(self.actor.clone()))?;

        animation.start_animation(
            &self.animation,
            self.mode,
            self.count,
            self.wait.then_some(signal),
        )?;

        if self.wait {
            Ok(ActionStatus::Pending)
        } else {
            Ok(ActionStatus::Done)
        }
    }

    fn reattach(
        &self,
        ctx: &mut ActionContext,
        signal: &CompletionSignal,
    ) -> Result<(), ActionError> {
        let (_, _, animation, _) = find_actor(&mut ctx.actors, &self.actor)?;
        let mut animation = animation.ok_or_else(|| ActionError::NotAnimated(self.actor.clone()))?;
        // the scene may come back on another clip, restart ours in that case
        if animation.current_animation_id() == self.animation {
            animation.watch(signal.clone());
        } else {
            animation.start_animation(
                &self.animation,
                self.mode,
                self.count,
                Some(signal.clone()),
            )?;
        }
        Ok(())
    }
}
