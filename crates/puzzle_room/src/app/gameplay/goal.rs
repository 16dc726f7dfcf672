use engine::{EntityId, EventChannel, ListenerId, SceneWorld, TriggerEnter};
use tracing::{debug, info};

use super::puzzle::{PuzzleCoordinator, PuzzleRequest, Transition};
use super::KEY_OBJECT_TAG;

/// Raised once when the key reaches the goal and the puzzle resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UnlockEvent {
    pub(crate) goal: EntityId,
    pub(crate) key: EntityId,
}

/// Watches one trigger volume for key objects.
#[derive(Debug)]
pub(crate) struct GoalGate {
    volume: EntityId,
    on_unlock: EventChannel<UnlockEvent>,
}

impl GoalGate {
    pub(crate) fn new(volume: EntityId) -> Self {
        Self {
            volume,
            on_unlock: EventChannel::default(),
        }
    }

    pub(crate) fn subscribe(&mut self, listener: impl FnMut(&UnlockEvent) + 'static) -> ListenerId {
        self.on_unlock.subscribe(listener)
    }

    pub(crate) fn unlock_count(&self) -> u64 {
        self.on_unlock.emitted_count()
    }

    /// Returns the transition requested for `enter`, or `None` when the
    /// event is not a key entering this gate's volume.
    pub(crate) fn on_trigger_enter(
        &mut self,
        enter: TriggerEnter,
        world: &mut SceneWorld,
        puzzle: &mut PuzzleCoordinator,
    ) -> Option<Transition> {
        if enter.trigger != self.volume {
            return None;
        }
        let is_key = world
            .find_entity(enter.other)
            .is_some_and(|entity| entity.has_tag(KEY_OBJECT_TAG));
        if !is_key {
            debug!(other = enter.other.0, "goal_entered_by_non_key");
            return None;
        }

        let transition = puzzle.request(PuzzleRequest::Resolve, world);
        if transition.is_applied() {
            let event = UnlockEvent {
                goal: enter.trigger,
                key: enter.other,
            };
            let notified = self.on_unlock.emit(&event);
            info!(
                goal = event.goal.0,
                key = event.key.0,
                listeners = notified,
                "door_unlocked"
            );
        }
        Some(transition)
    }
}
