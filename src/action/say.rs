//! The `say` action.

use bevy::log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::prelude::{
    Action, ActionContext, ActionError, ActionParams, ActionStatus, ActorId, AnimationId,
    CompletionSignal, PlaySoundRequest, RepeatMode, SoundId, TextKind, POS_SUBTITLE,
};

use super::find_actor;

/// Says a text.
///
/// With [`TextKind::Talk`] the text is shown above the actor, in its color,
/// and the actor plays its talk animation until the text goes away. The
/// animation shown before talking is kept in the action so it can be
/// restored on resume, even after a save/load cycle.
#[derive(ActionParams, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[action(name = "say", description = "Says a text")]
pub struct SayAction {
    /// The animation to restore when the text goes away.
    #[param(skip)]
    #[serde(default)]
    previous_anim: Option<AnimationId>,
    /// The target actor.
    #[param(kind = Actor, description = "The target actor", required)]
    pub actor: ActorId,
    /// The text to show.
    #[param(kind = SmallText, description = "The 'text' to show")]
    #[serde(default)]
    pub text: Option<String>,
    /// The sound to play.
    #[param(kind = Sound, description = "The 'soundId' to play if selected")]
    #[serde(default)]
    pub sound: Option<SoundId>,
    /// How the text is presented.
    #[param(
        kind = Enum,
        description = "The type of the text.",
        required,
        default = "Rectangle"
    )]
    #[serde(default)]
    pub kind: TextKind,
    /// Queue the text behind the ones on screen instead of replacing them.
    #[param(
        kind = Boolean,
        description = "Queue the text if other text is showing, or show it immediately.",
        default = "false"
    )]
    #[serde(default)]
    pub queue: bool,
    /// Block the script until the text goes away.
    #[param(
        kind = Boolean,
        description = "Block the script until the text is dismissed.",
        default = "true"
    )]
    #[serde(default = "wait_by_default")]
    pub wait: bool,
}

/// Actions wait for their text unless told otherwise.
fn wait_by_default() -> bool {
    true
}

impl SayAction {
    /// Creates an action where `actor` says `text` in a rectangle,
    /// waiting for it to go away.
    pub fn new(actor: impl Into<ActorId>, text: impl Into<String>) -> Self {
        Self {
            previous_anim: None,
            actor: actor.into(),
            text: Some(text.into()),
            sound: None,
            kind: TextKind::default(),
            queue: false,
            wait: true,
        }
    }

    /// Creates an action that only plays a sound.
    pub fn sound_only(actor: impl Into<ActorId>, sound: impl Into<SoundId>) -> Self {
        Self {
            text: None,
            sound: Some(sound.into()),
            ..Self::new(actor, "")
        }
    }

    /// Sets how the text is presented.
    pub fn with_kind(mut self, kind: TextKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the sound to play.
    pub fn with_sound(mut self, sound: impl Into<SoundId>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Sets whether the text is queued.
    pub fn queued(mut self, queue: bool) -> Self {
        self.queue = queue;
        self
    }

    /// Sets whether the script waits for the text.
    pub fn waiting(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// The animation that will be restored on resume, if any.
    pub fn previous_anim(&self) -> Option<&str> {
        self.previous_anim.as_deref()
    }
}

impl Action for SayAction {
    fn run(
        &mut self,
        ctx: &mut ActionContext,
        signal: CompletionSignal,
    ) -> Result<ActionStatus, ActionError> {
        let (actor, transform, animation, character) = find_actor(&mut ctx.actors, &self.actor)?;

        // talking needs a character with an animation driver, checked before any side effect
        let talker = match (self.kind, &self.text) {
            (TextKind::Talk, Some(_)) => match (character, animation) {
                (None, _) => return Err(ActionError::NotACharacter(self.actor.clone())),
                (Some(_), None) => return Err(ActionError::NotAnimated(self.actor.clone())),
                (Some(character), Some(animation)) => Some((character, animation)),
            },
            _ => None,
        };

        if let Some(sound) = &self.sound {
            ctx.sounds.send(PlaySoundRequest {
                actor: self.actor.clone(),
                sound: sound.clone(),
            });
        }

        let Some(text) = &self.text else {
            return Ok(ActionStatus::Done);
        };

        let (x, y, color) = match talker {
            Some((character, mut animation)) => {
                // if the actor was already talking, go back to stand first
                if character.is_talking(animation.current_animation_id()) {
                    character.stand(&mut animation)?;
                }
                self.previous_anim = Some(animation.current_animation_id().to_string());
                character.talk(&mut animation)?;

                (
                    transform.translation.x,
                    transform.translation.y + actor.bbox_height,
                    Some(character.text_color),
                )
            }
            None => (POS_SUBTITLE, POS_SUBTITLE, None),
        };

        debug!("{} says: {}", self.actor, text);
        ctx.texts.add_text(
            text.clone(),
            x,
            y,
            self.queue,
            self.kind,
            color,
            self.wait.then_some(signal),
        );

        if self.wait {
            Ok(ActionStatus::Pending)
        } else {
            Ok(ActionStatus::Done)
        }
    }

    fn resume(&mut self, ctx: &mut ActionContext) -> Result<(), ActionError> {
        if self.kind == TextKind::Talk {
            if let Some(previous) = self.previous_anim.as_deref() {
                let (_, _, animation, _) = find_actor(&mut ctx.actors, &self.actor)?;
                let mut animation =
                    animation.ok_or_else(|| ActionError::NotAnimated(self.actor.clone()))?;
                animation.start_animation(previous, RepeatMode::SpriteDefined, 0, None)?;
            }
        }
        self.previous_anim = None;
        Ok(())
    }

    fn reattach(
        &self,
        ctx: &mut ActionContext,
        signal: &CompletionSignal,
    ) -> Result<(), ActionError> {
        // a waiting say always left a text behind, a slot without it is broken
        if !ctx.texts.relink(signal) {
            warn!("No text waits for the say action of {}", self.actor);
            return Err(ActionError::NothingToAwait(self.actor.clone()));
        }
        Ok(())
    }
}
