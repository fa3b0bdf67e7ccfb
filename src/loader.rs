//! Asset loader for verb scripts from "verbs.ron" files.

use bevy::{
    asset::{io::Reader, Asset, AssetLoader, AsyncReadExt, LoadContext},
    prelude::*,
    reflect::TypePath,
    utils::BoxedFuture,
};
use serde::Deserialize;
use serde_ron::de::from_bytes;
use thiserror::Error;

use crate::prelude::{ActionRunner, ScriptAction};

/// A list of actions to run on an actor.
///
/// ```ron
/// (
///     actions: [
///         Say((actor: "frank", text: Some("Hello"), kind: Talk)),
///         Animation((actor: "frank", animation: "wave")),
///     ],
/// )
/// ```
#[derive(Asset, TypePath, Debug, Default, Clone, PartialEq, Deserialize)]
pub struct VerbScript {
    /// The actions, in running order.
    pub actions: Vec<ScriptAction>,
}

impl VerbScript {
    /// Parses a script from RON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptLoaderError> {
        Ok(from_bytes::<VerbScript>(bytes)?)
    }
}

/// Load verb scripts from ron assets.
#[derive(Default)]
pub struct VerbScriptLoader;

/// Errors when loading a verb script.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScriptLoaderError {
    /// An [IO Error](std::io::Error)
    #[error("Could not read the file: {0}")]
    Io(#[from] std::io::Error),
    /// A [RON Error](serde_ron::error::SpannedError)
    #[error("Could not parse RON: {0}")]
    RonError(#[from] serde_ron::error::SpannedError),
}

impl AssetLoader for VerbScriptLoader {
    type Asset = VerbScript;
    type Settings = ();
    type Error = ScriptLoaderError;

    fn load<'a>(
        &'a self,
        reader: &'a mut Reader,
        _settings: &'a Self::Settings,
        load_context: &'a mut LoadContext,
    ) -> BoxedFuture<'a, Result<Self::Asset, Self::Error>> {
        Box::pin(async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let script = VerbScript::from_bytes(&bytes)?;
            info!(
                "Loaded verb script {} with {} actions.",
                load_context.path().display(),
                script.actions.len()
            );
            Ok(script)
        })
    }

    fn extensions(&self) -> &[&str] {
        &["verbs.ron"]
    }
}

/// Component to queue a verb script on an actor once it is loaded.
///
/// The entity needs an [`ActionRunner`]. The component is removed when the
/// actions are queued.
#[derive(Component, Debug, Clone)]
pub struct ScriptToRun(pub Handle<VerbScript>);

/// Queues the loaded scripts on their actors.
pub(crate) fn attach_scripts(
    mut cmd: Commands,
    scripts: Res<Assets<VerbScript>>,
    mut actors: Query<(Entity, &ScriptToRun, &mut ActionRunner)>,
) {
    for (e, to_run, mut runner) in &mut actors {
        if let Some(script) = scripts.get(&to_run.0) {
            runner.extend(script.actions.iter().cloned());
            cmd.entity(e).remove::<ScriptToRun>();
            info!("Queued {} scripted actions on {:?}", script.actions.len(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        prelude::*,
        tests::{spawn_character, verbs_minimal_app},
    };

    use super::*;

    #[test]
    fn parse_frank_script() {
        let script =
            VerbScript::from_bytes(include_bytes!("../assets/scripts/frank.verbs.ron")).unwrap();
        assert_eq!(script.actions.len(), 3);

        let ScriptAction::Say(say) = &script.actions[0] else {
            panic!("expected a say action");
        };
        assert_eq!(say.kind, TextKind::Talk);
        assert!(say.wait);
        assert!(matches!(script.actions[1], ScriptAction::Animation(_)));
    }

    #[test]
    fn parse_error() {
        let result = VerbScript::from_bytes(b"(actions: [Dance(())])");
        assert!(matches!(result, Err(ScriptLoaderError::RonError(_))));
    }

    #[test]
    fn loaded_script_is_queued() {
        let mut app = verbs_minimal_app();
        let script =
            VerbScript::from_bytes(include_bytes!("../assets/scripts/frank.verbs.ron")).unwrap();
        let handle = app
            .world
            .resource_mut::<Assets<VerbScript>>()
            .add(script);

        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world.entity_mut(e).insert(ScriptToRun(handle));
        app.update();

        assert!(app.world.get::<ScriptToRun>(e).is_none());
        let runner = app.world.get::<ActionRunner>(e).unwrap();
        // the first say blocks the other two actions
        assert!(runner.is_blocked());
        assert_eq!(runner.queued(), 2);
    }
}
