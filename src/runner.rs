//! The action runner: the per-actor queue of actions and the slot of the
//! action blocking it.

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::{
    AbandonActionsRequest, Action, ActionCompleted, ActionContext, ActionError, ActionFailed,
    ActionStatus, CompletionSignal, SceneActor, ScriptAction, SignalTarget, VerbScript,
};

/// A pending action together with the signal it waits for.
///
/// Dropping it disposes the signal, so a late completion for an abandoned
/// action (or one whose actor was despawned) is dropped.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockedAction {
    /// The pending action, with its resume state.
    action: ScriptAction,
    /// The signal the action waits for.
    signal: CompletionSignal,
    /// Set on load: the action must be linked back to its signal.
    #[serde(skip, default = "detached_on_load")]
    detached: bool,
}

/// Blocked actions read from a save slot are detached from their signal.
fn detached_on_load() -> bool {
    true
}

impl BlockedAction {
    /// The pending action.
    pub fn action(&self) -> &ScriptAction {
        &self.action
    }

    /// The signal the action waits for.
    pub fn signal(&self) -> &CompletionSignal {
        &self.signal
    }
}

impl Drop for BlockedAction {
    fn drop(&mut self) {
        self.signal.dispose();
    }
}

/// Runs the actions of an actor, one after the other.
///
/// Actions run in order until one of them is pending. The runner then keeps
/// it in its slot and runs nothing else until the action signal fires and
/// the action is resumed.
#[derive(Component, Debug, Default, Serialize, Deserialize)]
pub struct ActionRunner {
    /// Actions waiting to run.
    #[serde(default)]
    queue: VecDeque<ScriptAction>,
    /// The action blocking the runner.
    #[serde(default)]
    blocked: Option<BlockedAction>,
    /// The ticket of the next signal.
    #[serde(default)]
    next_ticket: u64,
}

impl ActionRunner {
    /// Creates a runner with the given actions queued.
    pub fn new(actions: impl IntoIterator<Item = ScriptAction>) -> Self {
        Self {
            queue: actions.into_iter().collect(),
            ..default()
        }
    }

    /// Creates a runner with the actions of a script queued.
    pub fn from_script(script: &VerbScript) -> Self {
        Self::new(script.actions.iter().cloned())
    }

    /// Queues an action.
    pub fn enqueue(&mut self, action: impl Into<ScriptAction>) {
        self.queue.push_back(action.into());
    }

    /// Queues some actions.
    pub fn extend(&mut self, actions: impl IntoIterator<Item = ScriptAction>) {
        self.queue.extend(actions);
    }

    /// Whether a pending action blocks the runner.
    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    /// The pending action, if any.
    pub fn blocked(&self) -> Option<&BlockedAction> {
        self.blocked.as_ref()
    }

    /// How many actions wait to run.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether a restored pending action still needs to be linked to its signal.
    pub fn is_detached(&self) -> bool {
        self.blocked.as_ref().is_some_and(|b| b.detached)
    }

    /// Runs queued actions until one is pending or the queue is empty.
    /// Returns how many actions ran.
    ///
    /// If an action fails the remaining queue is dropped.
    pub fn advance(&mut self, owner: &str, ctx: &mut ActionContext) -> Result<usize, ActionError> {
        let mut ran = 0;
        while !self.is_blocked() {
            let Some(action) = self.queue.pop_front() else {
                break;
            };
            ran += 1;
            if let Err(err) = self.start(owner, action, ctx) {
                self.queue.clear();
                return Err(err);
            }
        }
        Ok(ran)
    }

    /// Runs an action right away, ahead of the queue.
    pub fn run_now(
        &mut self,
        owner: &str,
        action: impl Into<ScriptAction>,
        ctx: &mut ActionContext,
    ) -> Result<ActionStatus, ActionError> {
        if self.is_blocked() {
            return Err(ActionError::ActorBusy(owner.to_string()));
        }
        self.start(owner, action.into(), ctx)
    }

    /// Routes a completion to the pending action.
    ///
    /// Returns `Ok(true)` if the pending action was resumed, `Ok(false)` if
    /// the completion is for an action that is no longer pending or whose
    /// signal did not fire yet.
    pub fn complete(
        &mut self,
        target: &SignalTarget,
        ctx: &mut ActionContext,
    ) -> Result<bool, ActionError> {
        if !self
            .blocked
            .as_ref()
            .is_some_and(|b| b.signal.target() == target && b.signal.has_fired())
        {
            return Ok(false);
        }
        let Some(mut blocked) = self.blocked.take() else {
            return Ok(false);
        };

        if let Err(err) = blocked.action.resume(ctx) {
            self.queue.clear();
            return Err(err);
        }
        Ok(true)
    }

    /// Drops the pending action without resuming it, and the queue.
    /// Returns whether an action was pending.
    pub fn abandon(&mut self) -> bool {
        self.queue.clear();
        self.blocked.take().is_some()
    }

    /// Links a restored pending action back to its signal.
    ///
    /// If that fails the pending action is dropped without resuming it,
    /// together with the queue.
    pub fn reattach(&mut self, ctx: &mut ActionContext) -> Result<(), ActionError> {
        let Some(blocked) = self.blocked.as_mut() else {
            return Ok(());
        };
        if !blocked.detached {
            return Ok(());
        }
        blocked.detached = false;
        if let Err(err) = blocked.action.reattach(ctx, &blocked.signal) {
            self.blocked = None;
            self.queue.clear();
            return Err(err);
        }
        Ok(())
    }

    /// Runs one action and keeps it if it is pending.
    fn start(
        &mut self,
        owner: &str,
        mut action: ScriptAction,
        ctx: &mut ActionContext,
    ) -> Result<ActionStatus, ActionError> {
        let signal = CompletionSignal::new(owner, self.next_ticket);
        self.next_ticket += 1;

        let status = match action.run(ctx, signal.clone()) {
            Ok(status) => status,
            Err(err) => {
                signal.dispose();
                return Err(err);
            }
        };

        match status {
            ActionStatus::Pending => {
                debug!("{owner} is blocked by {action:?}");
                self.blocked = Some(BlockedAction {
                    action,
                    signal,
                    detached: false,
                });
            }
            ActionStatus::Done => signal.dispose(),
        }
        Ok(status)
    }
}

/// A bundle with the components needed to make an entity a scripted actor.
#[derive(Bundle, Default)]
pub struct ActorBundle {
    /// The actor.
    pub actor: SceneActor,
    /// Where the actor is.
    pub transform: Transform,
    /// The actor runner.
    pub runner: ActionRunner,
}

/// Logs a failed turn and reports it.
fn report(actor: &str, err: ActionError, failures: &mut EventWriter<ActionFailed>) {
    error!("Action of {actor} failed: {err}");
    failures.send(ActionFailed {
        actor: actor.to_string(),
        error: err.to_string(),
    });
}

/// Handles `AbandonActionsRequest` events.
pub(crate) fn abandon_actions(
    mut reqs: EventReader<AbandonActionsRequest>,
    mut runners: Query<&mut ActionRunner>,
) {
    for req in reqs.read() {
        match runners.get_mut(req.actor) {
            Ok(mut runner) => {
                if runner.abandon() {
                    info!("Pending action of {:?} abandoned", req.actor);
                }
            }
            Err(_) => warn!("Abandon requested on {:?} which has no runner", req.actor),
        }
    }
}

/// Resumes the pending actions whose signal fired.
pub(crate) fn route_completions(
    mut ctx: ActionContext,
    mut completions: EventReader<ActionCompleted>,
    mut runners: Query<(&SceneActor, &mut ActionRunner)>,
    mut failures: EventWriter<ActionFailed>,
) {
    for ActionCompleted(target) in completions.read() {
        let Some((actor, mut runner)) = runners
            .iter_mut()
            .find(|(actor, _)| actor.id == target.actor)
        else {
            debug!("Completion for missing actor {} dropped", target.actor);
            continue;
        };

        match runner.complete(target, &mut ctx) {
            Ok(true) => debug!("{} resumed", actor.id),
            Ok(false) => debug!("Stale completion {:?} dropped", target),
            Err(err) => report(&actor.id, err, &mut failures),
        }
    }
}

/// Runs the queued actions of every runner that is not blocked.
pub(crate) fn advance_runners(
    mut ctx: ActionContext,
    mut runners: Query<(&SceneActor, &mut ActionRunner)>,
    mut failures: EventWriter<ActionFailed>,
) {
    for (actor, mut runner) in &mut runners {
        if runner.is_detached() {
            if let Err(err) = runner.reattach(&mut ctx) {
                report(&actor.id, err, &mut failures);
            }
        }
        if runner.is_blocked() || runner.queued() == 0 {
            continue;
        }
        if let Err(err) = runner.advance(&actor.id, &mut ctx) {
            report(&actor.id, err, &mut failures);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        prelude::*,
        tests::{spawn_character, verbs_minimal_app, with_context},
    };

    use super::*;

    /// Spawns an actor without the character capability.
    fn spawn_prop(app: &mut App, id: &str, actions: Vec<ScriptAction>) -> Entity {
        app.world
            .spawn(ActorBundle {
                actor: SceneActor::new(id, 1.),
                runner: ActionRunner::new(actions),
                ..default()
            })
            .id()
    }

    #[test]
    fn immediate_actions_run_in_one_update() {
        let mut app = verbs_minimal_app();
        let e = spawn_prop(
            &mut app,
            "radio",
            vec![
                SoundAction::new("radio", "static.ogg").into(),
                SoundAction::new("radio", "music.ogg").into(),
            ],
        );
        app.update();

        let runner = app.world.get::<ActionRunner>(e).unwrap();
        assert_eq!(runner.queued(), 0);
        assert!(!runner.is_blocked());

        let evs = app.world.resource::<Events<PlaySoundRequest>>();
        let sounds: Vec<_> = evs.get_reader().read(evs).map(|s| s.sound.clone()).collect();
        assert_eq!(sounds, vec!["static.ogg", "music.ogg"]);
    }

    #[test]
    fn no_text_no_sound_is_done() {
        let mut app = verbs_minimal_app();
        let mut say = SayAction::sound_only("radio", "unused");
        say.sound = None;
        let e = spawn_prop(&mut app, "radio", vec![say.into()]);
        app.update();

        let runner = app.world.get::<ActionRunner>(e).unwrap();
        assert!(!runner.is_blocked());
        assert!(app.world.resource::<TextManager>().current().is_none());
        assert!(app.world.resource::<Events<PlaySoundRequest>>().is_empty());
    }

    #[test]
    fn blocking_subtitle_waits_for_skip() {
        let mut app = verbs_minimal_app();
        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world.get_mut::<ActionRunner>(e).unwrap().extend([
            SayAction::new("frank", "Hello")
                .with_kind(TextKind::Subtitle)
                .into(),
            SoundAction::new("frank", "after.ogg").into(),
        ]);
        app.update();

        let runner = app.world.get::<ActionRunner>(e).unwrap();
        assert!(runner.is_blocked());
        assert_eq!(runner.queued(), 1);
        let text = app.world.resource::<TextManager>().current().unwrap();
        assert_eq!((text.x, text.y), (POS_SUBTITLE, POS_SUBTITLE));
        assert!(text.color.is_none());

        app.world.send_event(SkipTextRequest);
        app.update();

        let runner = app.world.get::<ActionRunner>(e).unwrap();
        assert!(!runner.is_blocked());
        assert_eq!(runner.queued(), 0);
        // no animation restore for subtitles
        let animation = app.world.get::<ActorAnimation>(e).unwrap();
        assert_eq!(animation.current_animation_id(), "stand.left");
    }

    #[test]
    fn abandoned_action_is_not_resumed() {
        let mut app = verbs_minimal_app();
        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world
            .get_mut::<ActionRunner>(e)
            .unwrap()
            .enqueue(SayAction::new("frank", "Hello").with_kind(TextKind::Talk));
        app.update();
        assert_eq!(
            app.world
                .get::<ActorAnimation>(e)
                .unwrap()
                .current_animation_id(),
            "talk.left"
        );

        app.world.send_event(AbandonActionsRequest::new(e));
        app.update();
        assert!(!app.world.get::<ActionRunner>(e).unwrap().is_blocked());

        // the text goes away later, its completion must be dropped
        app.world.send_event(SkipTextRequest);
        app.update();
        assert_eq!(
            app.world
                .get::<ActorAnimation>(e)
                .unwrap()
                .current_animation_id(),
            "talk.left"
        );
        assert!(app.world.resource::<Events<ActionFailed>>().is_empty());
    }

    #[test]
    fn despawned_actor_drops_completion() {
        let mut app = verbs_minimal_app();
        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world
            .get_mut::<ActionRunner>(e)
            .unwrap()
            .enqueue(SayAction::new("frank", "Hello"));
        app.update();

        app.world.despawn(e);
        app.world.send_event(SkipTextRequest);
        app.update();

        assert!(app.world.resource::<Events<ActionCompleted>>().is_empty());
    }

    #[test]
    fn unknown_actor_fails_the_turn() {
        let mut app = verbs_minimal_app();
        let e = spawn_prop(
            &mut app,
            "radio",
            vec![
                SayAction::new("ghost", "Boo").into(),
                SoundAction::new("radio", "never.ogg").into(),
            ],
        );
        app.update();

        let evs = app.world.resource::<Events<ActionFailed>>();
        let failure = evs.get_reader().read(evs).next().unwrap().clone();
        assert_eq!(failure.actor, "radio");
        assert_eq!(
            failure.error,
            ActionError::ActorNotFound("ghost".to_string()).to_string()
        );
        assert_eq!(app.world.get::<ActionRunner>(e).unwrap().queued(), 0);
        assert!(app.world.resource::<Events<PlaySoundRequest>>().is_empty());
    }

    #[test]
    fn talk_on_prop_fails_fast() {
        let mut app = verbs_minimal_app();
        spawn_prop(
            &mut app,
            "radio",
            vec![SayAction::new("radio", "Hi")
                .with_kind(TextKind::Talk)
                .with_sound("beep.ogg")
                .into()],
        );
        app.update();

        let evs = app.world.resource::<Events<ActionFailed>>();
        assert_eq!(
            evs.get_reader().read(evs).next().unwrap().error,
            ActionError::NotACharacter("radio".to_string()).to_string()
        );
        // no side effect happened
        assert!(app.world.resource::<Events<PlaySoundRequest>>().is_empty());
        assert!(app.world.resource::<TextManager>().current().is_none());
    }

    #[test]
    fn waiting_animation_resumes_when_it_ends() {
        let mut app = verbs_minimal_app();
        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world.get_mut::<ActionRunner>(e).unwrap().extend([
            AnimationAction::new("frank", "wave").into(),
            SoundAction::new("frank", "after.ogg").into(),
        ]);

        // first update starts the animation
        app.update();
        let runner = app.world.get::<ActionRunner>(e).unwrap();
        assert!(runner.is_blocked());
        assert!(app.world.resource::<Events<PlaySoundRequest>>().is_empty());

        // the wave clip lasts 0 seconds, it ends on the next update
        app.update();
        assert!(!app.world.get::<ActionRunner>(e).unwrap().is_blocked());
        let evs = app.world.resource::<Events<PlaySoundRequest>>();
        assert_eq!(evs.get_reader().read(evs).count(), 1);
    }

    #[test]
    fn missing_clip_fails_the_turn() {
        let mut app = verbs_minimal_app();
        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world
            .get_mut::<ActionRunner>(e)
            .unwrap()
            .enqueue(AnimationAction::new("frank", "dance"));
        app.update();

        assert!(!app.world.get::<ActionRunner>(e).unwrap().is_blocked());
        let evs = app.world.resource::<Events<ActionFailed>>();
        assert_eq!(
            evs.get_reader().read(evs).next().unwrap().error,
            "animation dance not found"
        );
    }

    #[test]
    fn complete_waits_for_the_signal() {
        let mut app = verbs_minimal_app();
        let e = spawn_character(&mut app, "frank", "stand.left");
        app.world
            .get_mut::<ActionRunner>(e)
            .unwrap()
            .enqueue(SayAction::new("frank", "Hello"));
        app.update();

        let mut runner = app.world.entity_mut(e).take::<ActionRunner>().unwrap();
        let signal = runner.blocked().unwrap().signal().clone();
        let target = signal.target().clone();

        let resumed = with_context(&mut app, |ctx| runner.complete(&target, ctx));
        assert_eq!(resumed, Ok(false));
        assert!(runner.is_blocked());

        assert!(signal.fire().is_some());
        let resumed = with_context(&mut app, |ctx| runner.complete(&target, ctx));
        assert_eq!(resumed, Ok(true));
        assert!(!runner.is_blocked());
    }
}
