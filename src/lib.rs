#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![forbid(unsafe_code)]
#![warn(clippy::doc_markdown)]
// Often exceeded by queries
#![allow(clippy::type_complexity)]
// Unhelpful for systems
#![allow(clippy::too_many_arguments)]

//! [`bevy_verbs`] is a Bevy plugin to script what the actors of a scene do:
//! say texts, play sounds and animations.
//!
//! Every actor has an [`ActionRunner`](runner::ActionRunner) running its
//! actions one after the other. An action that has to wait for something
//! (a text going away, an animation ending) blocks the runner until its
//! [`CompletionSignal`](signal::CompletionSignal) fires, then it is resumed.
//! The whole action state can be written to a [`SaveSlot`](save::SaveSlot)
//! and restored, pending actions included.

use bevy::{asset::AssetApp, prelude::*};

use prelude::{
    AbandonActionsRequest, ActionCompleted, ActionFailed, PlaySoundRequest, SkipTextRequest,
    TextManager, VerbScript, VerbScriptLoader, VerbsSettings,
};

// lets the derive macros use `bevy_verbs::` paths inside this crate too
extern crate self as bevy_verbs;

pub mod action;
pub mod actor;
pub mod errors;
pub mod events;
pub mod loader;
pub mod params;
pub mod prelude;
pub mod runner;
pub mod save;
pub mod settings;
pub mod signal;
pub mod text;

/// The plugin that runs the actions of the actors.
///
/// It needs the `AssetPlugin` for the verb scripts.
#[derive(Default)]
pub struct VerbsPlugin {
    /// The settings inserted as a resource.
    pub settings: VerbsSettings,
}

/// The systems of the plugin. They run in `Update`, in order: scripts are
/// queued, texts and animations advance, completions resume their actions
/// and the runners run what they can.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerbsSet;

impl Plugin for VerbsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .init_resource::<TextManager>()
            .init_asset::<VerbScript>()
            .init_asset_loader::<VerbScriptLoader>()
            .add_event::<ActionCompleted>()
            .add_event::<ActionFailed>()
            .add_event::<AbandonActionsRequest>()
            .add_event::<PlaySoundRequest>()
            .add_event::<SkipTextRequest>()
            .add_systems(
                Update,
                (
                    loader::attach_scripts,
                    runner::abandon_actions,
                    text::update_texts,
                    actor::update_animations,
                    runner::route_completions,
                    runner::advance_runners,
                )
                    .chain()
                    .in_set(VerbsSet),
            );
    }
}

#[cfg(test)]
mod tests {
    use bevy::{ecs::system::SystemState, prelude::*};

    use crate::prelude::*;

    /// A minimal Bevy app with the Verbs plugin.
    pub fn verbs_minimal_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), VerbsPlugin::default()));
        app
    }

    /// Spawns "frank": a character facing left, standing at (10, 5), with
    /// stand, talk and wave clips and an empty runner.
    pub fn spawn_character(app: &mut App, id: &str, initial_anim: &str) -> Entity {
        app.world
            .spawn((
                ActorBundle {
                    actor: SceneActor::new(id, 2.),
                    transform: Transform::from_xyz(10., 5., 0.),
                    ..default()
                },
                Character {
                    facing: Some("left".to_string()),
                    text_color: TextColor::rgb(1., 0.5, 0.),
                    ..default()
                },
                ActorAnimation::new(
                    initial_anim,
                    [
                        ("stand.left".to_string(), SpriteClip::looping(1.)),
                        ("talk.left".to_string(), SpriteClip::looping(0.5)),
                        ("wave".to_string(), SpriteClip::once(0.)),
                    ],
                ),
            ))
            .id()
    }

    /// Calls `f` with an action context borrowing the app world.
    pub fn with_context<R>(app: &mut App, f: impl FnOnce(&mut ActionContext) -> R) -> R {
        let mut state = SystemState::<ActionContext>::new(&mut app.world);
        let mut ctx = state.get_mut(&mut app.world);
        f(&mut ctx)
    }

    /// The current animation of an actor.
    fn animation_of(app: &App, e: Entity) -> (String, RepeatMode) {
        let animation = app.world.get::<ActorAnimation>(e).unwrap();
        (
            animation.current_animation_id().to_string(),
            animation.playback_mode(),
        )
    }

    #[test]
    fn frank_stops_talking_before_talking_again() {
        let mut app = verbs_minimal_app();
        let frank = spawn_character(&mut app, "frank", "talk.left");
        let mut say = SayAction::new("frank", "Hi").with_kind(TextKind::Talk);

        let status = with_context(&mut app, |ctx| {
            say.run(ctx, CompletionSignal::new("frank", 0))
        });

        assert_eq!(status, Ok(ActionStatus::Pending));
        assert_eq!(say.previous_anim(), Some("stand.left"));
        assert_eq!(animation_of(&app, frank).0, "talk.left");

        let texts = app.world.resource::<TextManager>();
        let text = texts.current().unwrap();
        assert_eq!(text.content, "Hi");
        assert_eq!((text.x, text.y), (10., 7.));
        assert_eq!(text.kind, TextKind::Talk);
        assert_eq!(text.color, Some(TextColor::rgb(1., 0.5, 0.)));
        assert!(text.is_awaited());

        with_context(&mut app, |ctx| say.resume(ctx)).unwrap();
        assert_eq!(
            animation_of(&app, frank),
            ("stand.left".to_string(), RepeatMode::SpriteDefined)
        );
    }

    #[test]
    fn second_resume_does_nothing() {
        let mut app = verbs_minimal_app();
        let frank = spawn_character(&mut app, "frank", "stand.left");
        let mut say = SayAction::new("frank", "Hi").with_kind(TextKind::Talk);

        with_context(&mut app, |ctx| {
            say.run(ctx, CompletionSignal::new("frank", 0))
        })
        .unwrap();
        with_context(&mut app, |ctx| say.resume(ctx)).unwrap();

        app.world
            .get_mut::<ActorAnimation>(frank)
            .unwrap()
            .start_animation("wave", RepeatMode::NoRepeat, 0, None)
            .unwrap();
        with_context(&mut app, |ctx| say.resume(ctx)).unwrap();

        assert_eq!(
            animation_of(&app, frank),
            ("wave".to_string(), RepeatMode::NoRepeat)
        );
    }

    #[test]
    fn talk_without_waiting_keeps_talking() {
        let mut app = verbs_minimal_app();
        let frank = spawn_character(&mut app, "frank", "stand.left");
        let mut say = SayAction::new("frank", "Hi")
            .with_kind(TextKind::Talk)
            .waiting(false);

        let status = with_context(&mut app, |ctx| {
            say.run(ctx, CompletionSignal::new("frank", 0))
        });

        assert_eq!(status, Ok(ActionStatus::Done));
        assert_eq!(animation_of(&app, frank).0, "talk.left");
        let texts = app.world.resource::<TextManager>();
        assert!(!texts.current().unwrap().is_awaited());
    }

    #[test]
    fn subtitle_ignores_the_actor_position() {
        let mut app = verbs_minimal_app();
        let frank = spawn_character(&mut app, "frank", "stand.left");
        let mut say = SayAction::new("frank", "Meanwhile").with_kind(TextKind::Subtitle);

        with_context(&mut app, |ctx| {
            say.run(ctx, CompletionSignal::new("frank", 0))
        })
        .unwrap();

        let text = app.world.resource::<TextManager>().current().unwrap().clone();
        assert_eq!((text.x, text.y), (POS_SUBTITLE, POS_SUBTITLE));
        assert_eq!(text.color, None);
        assert!(say.previous_anim().is_none());
        assert_eq!(animation_of(&app, frank).0, "stand.left");
    }

    #[test]
    fn say_plays_its_sound() {
        let mut app = verbs_minimal_app();
        spawn_character(&mut app, "frank", "stand.left");
        let mut say = SayAction::new("frank", "Hi").with_sound("hi.ogg");

        with_context(&mut app, |ctx| {
            say.run(ctx, CompletionSignal::new("frank", 0))
        })
        .unwrap();

        let evs = app.world.resource::<Events<PlaySoundRequest>>();
        let sounds: Vec<_> = evs.get_reader().read(evs).cloned().collect();
        assert_eq!(
            sounds,
            vec![PlaySoundRequest {
                actor: "frank".to_string(),
                sound: "hi.ogg".to_string()
            }]
        );
    }

    #[test]
    fn run_now_on_a_blocked_actor_is_refused() {
        let mut app = verbs_minimal_app();
        let frank = spawn_character(&mut app, "frank", "stand.left");
        app.world
            .get_mut::<ActionRunner>(frank)
            .unwrap()
            .enqueue(SayAction::new("frank", "Hi"));
        app.update();

        let mut runner = app
            .world
            .entity_mut(frank)
            .take::<ActionRunner>()
            .unwrap();
        let result = with_context(&mut app, |ctx| {
            runner.run_now("frank", SoundAction::new("frank", "hi.ogg"), ctx)
        });

        assert_eq!(result, Err(ActionError::ActorBusy("frank".to_string())));
        assert!(runner.is_blocked());
    }

    #[test]
    fn full_talk_through_the_plugin() {
        let mut app = verbs_minimal_app();
        let frank = spawn_character(&mut app, "frank", "stand.left");
        app.world
            .get_mut::<ActionRunner>(frank)
            .unwrap()
            .extend([
                SayAction::new("frank", "Hello").with_kind(TextKind::Talk).into(),
                AnimationAction::new("frank", "wave").into(),
            ]);

        app.update();
        assert_eq!(animation_of(&app, frank).0, "talk.left");
        assert_eq!(app.world.get::<ActionRunner>(frank).unwrap().queued(), 1);

        app.world.send_event(SkipTextRequest);
        app.update();

        // resumed back to stand, then the wave started right away
        assert_eq!(animation_of(&app, frank).0, "wave");
        assert!(app.world.get::<ActionRunner>(frank).unwrap().is_blocked());

        app.update();
        assert!(!app.world.get::<ActionRunner>(frank).unwrap().is_blocked());
    }
}
