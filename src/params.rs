//! Parameter metadata of the actions.
//!
//! Editing tools list these descriptors to build the UI of each action.
//! They are usually derived with `#[derive(ActionParams)]`:
//!
//! ```
//! use bevy_verbs::prelude::*;
//!
//! #[derive(ActionParams)]
//! #[action(name = "wave", description = "Waves a hand")]
//! struct WaveAction {
//!     #[param(kind = Actor, description = "The actor waving", required)]
//!     actor: String,
//!     #[param(kind = Boolean, default = "true")]
//!     wait: bool,
//! }
//!
//! let descriptor = WaveAction::descriptor();
//! assert_eq!(descriptor.name, "wave");
//! assert_eq!(descriptor.params[1].default, Some("true"));
//! ```

/// The semantic type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// An actor of the scene, by id.
    Actor,
    /// A one line text.
    SmallText,
    /// A multi line text.
    Text,
    /// A sound, by id.
    Sound,
    /// An animation of the target actor, by id.
    Animation,
    /// One value of an enumeration.
    Enum,
    /// A boolean flag.
    Boolean,
    /// An integer.
    Integer,
}

/// One parameter of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    /// The field name.
    pub name: &'static str,
    /// The semantic type.
    pub kind: ParamKind,
    /// What the parameter does.
    pub description: &'static str,
    /// Whether a value must be set.
    pub required: bool,
    /// The default value as written in scripts.
    pub default: Option<&'static str>,
}

/// The description of an action and its parameters, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// The action name.
    pub name: &'static str,
    /// What the action does.
    pub description: &'static str,
    /// The parameters, in declaration order.
    pub params: &'static [ParamInfo],
}

impl ActionDescriptor {
    /// Finds a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamInfo> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Trait for actions exposing their parameters.
pub trait ActionParams {
    /// Returns the action descriptor.
    fn descriptor() -> ActionDescriptor;
}
