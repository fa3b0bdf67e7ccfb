//! The text display coordinator.
//!
//! Texts are shown one at a time. A text can carry a completion signal that
//! is finished when the text goes away, either because its time ran out or
//! because it was dismissed. Signals are never fired from inside
//! [`TextManager::add_text`]: they are collected and fired by the
//! `update_texts` system.

use std::collections::VecDeque;

use bevy::prelude::{EventReader, EventWriter, Res, ResMut, Resource, Time};
use serde::{Deserialize, Serialize};

use crate::prelude::{
    ActionCompleted, CompletionSignal, SkipTextRequest, TextColor, VerbsSettings,
};

/// Position used for both coordinates of texts that are not anchored to an
/// actor. The UI places them in the subtitle area.
pub const POS_SUBTITLE: f32 = -1.0;

/// How a text is presented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextKind {
    /// A subtitle in the bottom of the screen.
    Subtitle,
    /// A text said by a character, shown above it.
    Talk,
    /// A text inside a rectangle.
    #[default]
    Rectangle,
}

/// A text waiting or being shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShownText {
    /// The content of the text.
    pub content: String,
    /// Horizontal position, or [`POS_SUBTITLE`].
    pub x: f32,
    /// Vertical position, or [`POS_SUBTITLE`].
    pub y: f32,
    /// How the text is presented.
    pub kind: TextKind,
    /// The text color, `None` for the UI default.
    pub color: Option<TextColor>,
    /// Seconds the text has been shown.
    pub elapsed: f32,
    /// Finished when the text goes away.
    signal: Option<CompletionSignal>,
}

impl ShownText {
    /// Whether someone waits for this text to go away.
    pub fn is_awaited(&self) -> bool {
        self.signal.is_some()
    }
}

/// The text display coordinator resource.
#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct TextManager {
    /// The text on screen.
    current: Option<ShownText>,
    /// Texts waiting for the current one to go away.
    queue: VecDeque<ShownText>,
    /// Signals of the texts that went away, not fired yet.
    #[serde(default)]
    finished: Vec<CompletionSignal>,
}

impl TextManager {
    /// Adds a text.
    ///
    /// With `queue` the text waits for the texts already added, otherwise
    /// every other text is dismissed and this one is shown right away.
    /// `signal` is finished once, when the text goes away.
    pub fn add_text(
        &mut self,
        content: impl Into<String>,
        x: f32,
        y: f32,
        queue: bool,
        kind: TextKind,
        color: Option<TextColor>,
        signal: Option<CompletionSignal>,
    ) {
        let text = ShownText {
            content: content.into(),
            x,
            y,
            kind,
            color,
            elapsed: 0.,
            signal,
        };

        if !queue {
            self.clear();
        }

        if self.current.is_none() {
            self.current = Some(text);
        } else {
            self.queue.push_back(text);
        }
    }

    /// The text on screen.
    pub fn current(&self) -> Option<&ShownText> {
        self.current.as_ref()
    }

    /// How many texts wait behind the current one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Dismisses the current text and shows the next one.
    pub fn skip(&mut self) {
        if let Some(text) = self.current.take() {
            self.finish(text);
        }
        self.current = self.queue.pop_front();
    }

    /// Dismisses every text.
    pub fn clear(&mut self) {
        if let Some(text) = self.current.take() {
            self.finish(text);
        }
        while let Some(text) = self.queue.pop_front() {
            self.finish(text);
        }
    }

    /// Advances the current text by `dt` seconds.
    /// Returns the signals of the texts that went away since the last update.
    pub fn update(&mut self, dt: f32, settings: &VerbsSettings) -> Vec<CompletionSignal> {
        if self.current.is_none() {
            self.current = self.queue.pop_front();
        }

        if let Some(text) = self.current.as_mut() {
            text.elapsed += dt;
            if text.elapsed >= settings.text_duration(&text.content) {
                self.skip();
            }
        }

        std::mem::take(&mut self.finished)
    }

    /// Replaces the signals routed to the same target as `signal` with it.
    ///
    /// Used after loading a save: the deserialized texts get their own
    /// signal copies, this links them back to the runner one.
    /// Returns whether a text was relinked.
    pub fn relink(&mut self, signal: &CompletionSignal) -> bool {
        let mut relinked = false;
        let texts = self.current.iter_mut().chain(self.queue.iter_mut());
        for text in texts {
            if let Some(held) = text.signal.as_mut() {
                if held.target() == signal.target() {
                    *held = signal.clone();
                    relinked = true;
                }
            }
        }
        for held in self.finished.iter_mut() {
            if held.target() == signal.target() {
                *held = signal.clone();
                relinked = true;
            }
        }
        relinked
    }

    /// Moves the text signal, if any, to the finished list.
    fn finish(&mut self, text: ShownText) {
        if let Some(signal) = text.signal {
            self.finished.push(signal);
        }
    }
}

/// Advances the texts, handles skip requests and fires the signals of the
/// texts that went away.
pub(crate) fn update_texts(
    time: Res<Time>,
    settings: Res<VerbsSettings>,
    mut texts: ResMut<TextManager>,
    mut skips: EventReader<SkipTextRequest>,
    mut completed: EventWriter<ActionCompleted>,
) {
    for _ in skips.read() {
        texts.skip();
    }

    for signal in texts.update(time.delta_seconds(), &settings) {
        if let Some(ev) = signal.fire() {
            completed.send(ev);
        }
    }
}
