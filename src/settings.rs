//! Plugin configuration.

use bevy::prelude::Resource;

/// Settings shared by the verb systems.
///
/// Inserted by [`VerbsPlugin`](crate::VerbsPlugin). The host app can
/// overwrite it at any time, new values apply to texts added afterwards.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct VerbsSettings {
    /// Seconds a text stays on screen per character.
    pub secs_per_char: f32,
    /// Minimum seconds a text stays on screen.
    pub min_text_secs: f32,
}

impl Default for VerbsSettings {
    fn default() -> Self {
        Self {
            secs_per_char: 0.07,
            min_text_secs: 1.5,
        }
    }
}

impl VerbsSettings {
    /// How long a text with the given content stays on screen.
    pub fn text_duration(&self, content: &str) -> f32 {
        (content.chars().count() as f32 * self.secs_per_char).max(self.min_text_secs)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", 1.5)]
    #[case("Hello", 1.5)]
    #[case("This line is long enough to pass the minimum", 3.08)]
    fn text_duration(#[case] content: &str, #[case] expected: f32) {
        let settings = VerbsSettings::default();
        assert!((settings.text_duration(content) - expected).abs() < 0.001);
    }
}
