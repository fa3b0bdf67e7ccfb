//! Actor components: the scene actor itself, the character capability
//! and the animation driver.

use bevy::prelude::{Component, EventWriter, Query, Res, Time};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::prelude::{ActionCompleted, AnimationError, CompletionSignal};

/// A unique identifier for an actor in a scene.
///
/// Actions reference their target actor with this id so they stay plain
/// serializable data.
pub type ActorId = String;

/// A unique identifier for an animation clip of an actor.
pub type AnimationId = String;

/// A unique identifier for a sound.
pub type SoundId = String;

/// The actor component for the actor entities in a scene.
///
/// The actor position is taken from the entity `Transform`.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SceneActor {
    /// The unique id scripts use to find the actor.
    pub id: ActorId,
    /// Height of the actor bounding box. Talk texts are shown above it.
    pub bbox_height: f32,
}

impl SceneActor {
    /// Creates a new actor with the given id and bounding box height.
    pub fn new(id: impl Into<ActorId>, bbox_height: f32) -> Self {
        Self {
            id: id.into(),
            bbox_height,
        }
    }
}

/// The color of the texts said by a character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColor {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl TextColor {
    /// Opaque white.
    pub const WHITE: TextColor = TextColor::rgb(1.0, 1.0, 1.0);

    /// Creates an opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Marks an actor that can talk: it has its own text color and
/// stand/talk animations.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Character {
    /// Prefix of the stand animations.
    pub stand_anim: String,
    /// Prefix of the talk animations.
    pub talk_anim: String,
    /// Direction suffix appended to the stand/talk prefixes, e.g. `left`.
    pub facing: Option<String>,
    /// The color of the texts said by this character.
    pub text_color: TextColor,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            stand_anim: "stand".to_string(),
            talk_anim: "talk".to_string(),
            facing: None,
            text_color: TextColor::WHITE,
        }
    }
}

impl Character {
    /// The stand animation for the current facing.
    pub fn stand_animation(&self) -> AnimationId {
        self.with_facing(&self.stand_anim)
    }

    /// The talk animation for the current facing.
    pub fn talk_animation(&self) -> AnimationId {
        self.with_facing(&self.talk_anim)
    }

    /// Whether the given animation is one of the talk animations.
    pub fn is_talking(&self, animation: &str) -> bool {
        animation.starts_with(&self.talk_anim)
    }

    /// Puts the character in its stand pose.
    pub fn stand(&self, animation: &mut ActorAnimation) -> Result<(), AnimationError> {
        animation.start_animation(&self.stand_animation(), RepeatMode::SpriteDefined, 0, None)
    }

    /// Starts the character talk animation.
    pub fn talk(&self, animation: &mut ActorAnimation) -> Result<(), AnimationError> {
        animation.start_animation(&self.talk_animation(), RepeatMode::SpriteDefined, 0, None)
    }

    /// Appends the facing suffix to an animation prefix.
    fn with_facing(&self, prefix: &str) -> AnimationId {
        match &self.facing {
            Some(facing) => format!("{prefix}.{facing}"),
            None => prefix.to_string(),
        }
    }
}

/// How an animation is played.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Use the clip own setting.
    #[default]
    SpriteDefined,
    /// Play once.
    NoRepeat,
    /// Loop.
    Repeat,
    /// Loop back and forth.
    Yoyo,
}

/// A clip an actor can play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteClip {
    /// Seconds of one cycle.
    pub duration: f32,
    /// Whether the clip loops when played with [`RepeatMode::SpriteDefined`].
    pub looping: bool,
}

impl SpriteClip {
    /// A clip that plays once.
    pub fn once(duration: f32) -> Self {
        Self {
            duration,
            looping: false,
        }
    }

    /// A clip that loops.
    pub fn looping(duration: f32) -> Self {
        Self {
            duration,
            looping: true,
        }
    }
}

/// The actor animation driver.
///
/// It knows the clips of the actor, which one is current and how far it
/// went. A completion signal can be attached to the current clip: it is
/// finished when the clip completes or when another animation replaces it.
#[derive(Component, Debug)]
pub struct ActorAnimation {
    /// The clips of the actor, by id.
    clips: IndexMap<AnimationId, SpriteClip>,
    /// The current animation.
    current: AnimationId,
    /// The playback mode of the current animation.
    mode: RepeatMode,
    /// How many cycles the current animation plays before completing.
    /// 0 means one cycle.
    count: u32,
    /// Seconds since the current animation started.
    elapsed: f32,
    /// Whether the current animation already completed.
    completed: bool,
    /// Signal finished when the current animation completes.
    signal: Option<CompletionSignal>,
    /// Signals finished since the last `advance`.
    finished: Vec<CompletionSignal>,
}

impl ActorAnimation {
    /// Creates a driver with the given clips, starting with `initial`.
    ///
    /// The initial animation does not need to be a clip: it is whatever the
    /// actor shows before the first request.
    pub fn new(
        initial: impl Into<AnimationId>,
        clips: impl IntoIterator<Item = (AnimationId, SpriteClip)>,
    ) -> Self {
        Self {
            clips: clips.into_iter().collect(),
            current: initial.into(),
            mode: RepeatMode::SpriteDefined,
            count: 0,
            elapsed: 0.,
            completed: false,
            signal: None,
            finished: vec![],
        }
    }

    /// Adds a clip.
    pub fn with_clip(mut self, id: impl Into<AnimationId>, clip: SpriteClip) -> Self {
        self.clips.insert(id.into(), clip);
        self
    }

    /// The id of the current animation.
    pub fn current_animation_id(&self) -> &str {
        &self.current
    }

    /// The playback mode of the current animation.
    pub fn playback_mode(&self) -> RepeatMode {
        self.mode
    }

    /// Starts an animation, replacing the current one.
    ///
    /// `count` is the number of cycles a looping animation plays before it
    /// completes (0 for one). If `signal` is given it is finished when the
    /// animation completes. A signal attached to the replaced animation is
    /// finished now.
    pub fn start_animation(
        &mut self,
        id: &str,
        mode: RepeatMode,
        count: u32,
        signal: Option<CompletionSignal>,
    ) -> Result<(), AnimationError> {
        if !self.clips.contains_key(id) {
            return Err(AnimationError::MissingClip(id.to_string()));
        }
        if let Some(replaced) = self.signal.take() {
            self.finished.push(replaced);
        }

        self.current = id.to_string();
        self.mode = mode;
        self.count = count;
        self.elapsed = 0.;
        self.completed = false;
        self.signal = signal;
        Ok(())
    }

    /// Attaches a signal to the current animation. If it already completed
    /// the signal is finished right away, on the next `advance`.
    pub fn watch(&mut self, signal: CompletionSignal) {
        if self.completed {
            self.finished.push(signal);
        } else if let Some(replaced) = self.signal.replace(signal) {
            self.finished.push(replaced);
        }
    }

    /// Advances the current animation by `dt` seconds.
    /// Returns the signals that must fire.
    pub fn advance(&mut self, dt: f32) -> Vec<CompletionSignal> {
        if !self.completed {
            if let Some(clip) = self.clips.get(&self.current) {
                self.elapsed += dt;
                let cycles = if self.loops(clip) {
                    self.count.max(1)
                } else {
                    1
                };
                if self.elapsed >= clip.duration * cycles as f32 {
                    self.completed = !self.loops(clip);
                    if let Some(signal) = self.signal.take() {
                        self.finished.push(signal);
                    }
                }
            }
        }
        std::mem::take(&mut self.finished)
    }

    /// Whether the current animation loops with the given clip.
    fn loops(&self, clip: &SpriteClip) -> bool {
        match self.mode {
            RepeatMode::SpriteDefined => clip.looping,
            RepeatMode::NoRepeat => false,
            RepeatMode::Repeat | RepeatMode::Yoyo => true,
        }
    }
}

/// Advances the animations of the actors and fires the signals of the ones
/// that ended or were replaced.
pub(crate) fn update_animations(
    time: Res<Time>,
    mut animations: Query<&mut ActorAnimation>,
    mut completed: EventWriter<ActionCompleted>,
) {
    let dt = time.delta_seconds();
    for mut animation in &mut animations {
        for signal in animation.advance(dt) {
            if let Some(ev) = signal.fire() {
                completed.send(ev);
            }
        }
    }
}
