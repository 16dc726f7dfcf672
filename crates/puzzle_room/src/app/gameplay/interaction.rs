use engine::{EntityId, InputSnapshot, InputStream, SceneWorld};
use tracing::{debug, info};

use super::puzzle::{PuzzleCoordinator, PuzzleRequest, Transition};

/// Mutable state an interaction is allowed to touch.
pub(crate) struct InteractionContext<'a> {
    pub(crate) world: &'a mut SceneWorld,
    pub(crate) puzzle: &'a mut PuzzleCoordinator,
}

pub(crate) trait Interactable {
    fn entity(&self) -> EntityId;
    fn prompt(&self) -> &str;
    /// Returns whether the interaction was accepted.
    fn interact(&mut self, interactor: EntityId, context: &mut InteractionContext<'_>) -> bool;
}

/// Button that starts the maze puzzle.
#[derive(Debug, Clone)]
pub(crate) struct PuzzleButton {
    entity: EntityId,
    prompt: String,
}

impl PuzzleButton {
    pub(crate) fn new(entity: EntityId, prompt: impl Into<String>) -> Self {
        Self {
            entity,
            prompt: prompt.into(),
        }
    }
}

impl Interactable for PuzzleButton {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn interact(&mut self, interactor: EntityId, context: &mut InteractionContext<'_>) -> bool {
        let transition = context
            .puzzle
            .request(PuzzleRequest::Begin, context.world);
        debug!(
            button = self.entity.0,
            interactor = interactor.0,
            transition = ?transition,
            "puzzle_button_pressed"
        );
        !matches!(transition, Transition::Rejected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InteractionOutcome {
    pub(crate) target: EntityId,
    pub(crate) accepted: bool,
}

/// Player-side finder: focuses the nearest interactable in reach and fires
/// it when the Interact stream triggers.
#[derive(Debug, Clone)]
pub(crate) struct Interactor {
    actor: EntityId,
    radius: f32,
    focus: Option<EntityId>,
}

impl Interactor {
    pub(crate) fn new(actor: EntityId, radius: f32) -> Self {
        Self {
            actor,
            radius,
            focus: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    pub(crate) fn prompt<'a>(&self, interactables: &'a [Box<dyn Interactable>]) -> Option<&'a str> {
        let focus = self.focus?;
        interactables
            .iter()
            .find(|interactable| interactable.entity() == focus)
            .map(|interactable| interactable.prompt())
    }

    pub(crate) fn step(
        &mut self,
        input: &InputSnapshot,
        interactables: &mut [Box<dyn Interactable>],
        context: &mut InteractionContext<'_>,
    ) -> Option<InteractionOutcome> {
        let focus_index = self.nearest_in_reach(interactables, context.world);
        let focus = focus_index.map(|index| interactables[index].entity());
        if focus != self.focus {
            match focus_index {
                Some(index) => info!(
                    target = interactables[index].entity().0,
                    prompt = interactables[index].prompt(),
                    "interaction_prompt_shown"
                ),
                None => info!("interaction_prompt_cleared"),
            }
            self.focus = focus;
        }

        let index = focus_index?;
        if !context
            .world
            .input_map()
            .triggered(InputStream::Interact, input)
        {
            return None;
        }

        let target = interactables[index].entity();
        let accepted = interactables[index].interact(self.actor, context);
        info!(target = target.0, accepted, "interaction_attempted");
        Some(InteractionOutcome { target, accepted })
    }

    fn nearest_in_reach(
        &self,
        interactables: &[Box<dyn Interactable>],
        world: &SceneWorld,
    ) -> Option<usize> {
        let origin = world.find_entity(self.actor)?.transform.position;
        interactables
            .iter()
            .enumerate()
            .filter_map(|(index, interactable)| {
                let position = world.find_entity(interactable.entity())?.transform.position;
                let distance = origin.distance(position);
                (distance <= self.radius).then_some((index, distance))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
    }
}
