//! Prelude for the `bevy_verbs` crate.
pub use super::{VerbsPlugin, VerbsSet};
pub use super::{
    action::{animation::*, say::*, sound::*, *},
    actor::*,
    errors::*,
    events::*,
    loader::{ScriptLoaderError, ScriptToRun, VerbScript, VerbScriptLoader},
    params::{ActionDescriptor, ActionParams, ParamInfo, ParamKind},
    runner::{ActionRunner, ActorBundle, BlockedAction},
    save::SaveSlot,
    settings::*,
    signal::*,
    text::*,
};
pub use bevy_verbs_macros::ActionParams;
