//! Frank says hello and waves. The script is loaded from a file and the
//! texts are printed to the console.

use bevy::prelude::*;
use bevy_verbs::prelude::*;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, VerbsPlugin::default()))
        .add_systems(Startup, spawn_frank)
        .add_systems(
            Update,
            (
                interact,
                print_text,
                print_sounds,
                print_failures,
                bevy::window::close_on_esc,
            )
                .after(VerbsSet),
        )
        .run();
}

/// Spawn Frank with the script queued on its runner once loaded.
fn spawn_frank(mut commands: Commands, server: Res<AssetServer>) {
    let script: Handle<VerbScript> = server.load("scripts/frank.verbs.ron");
    commands.spawn((
        ActorBundle {
            actor: SceneActor::new("frank", 2.),
            transform: Transform::from_xyz(10., 5., 0.),
            ..default()
        },
        Character {
            facing: Some("left".to_string()),
            text_color: TextColor::rgb(1., 0.5, 0.),
            ..default()
        },
        ActorAnimation::new(
            "stand.left",
            [
                ("stand.left".to_string(), SpriteClip::looping(1.)),
                ("talk.left".to_string(), SpriteClip::looping(0.5)),
                ("wave".to_string(), SpriteClip::once(1.2)),
            ],
        ),
        ScriptToRun(script),
    ));

    println!("-----------------------------------");
    println!("Press space to skip the current text.");
    println!("-----------------------------------");
}

/// Skip the text when the space key is pressed.
fn interact(input: Res<Input<KeyCode>>, mut skips: EventWriter<SkipTextRequest>) {
    if input.just_pressed(KeyCode::Space) {
        skips.send(SkipTextRequest);
    }
}

fn print_text(
    texts: Res<TextManager>,
    frank: Query<&ActorAnimation>,
    mut shown: Local<Option<String>>,
) {
    let current = texts.current().map(|t| t.content.clone());
    if current == *shown {
        return;
    }
    if let Some(content) = &current {
        let animation = frank.single().current_animation_id();
        println!("[{animation}] frank: {content}");
    }
    *shown = current;
}

fn print_sounds(mut sounds: EventReader<PlaySoundRequest>) {
    for ev in sounds.read() {
        println!("--- {} plays {}", ev.actor, ev.sound);
    }
}

fn print_failures(mut failures: EventReader<ActionFailed>) {
    for ev in failures.read() {
        println!("!!! {}: {}", ev.actor, ev.error);
    }
}
