use std::collections::HashSet;

use tracing::warn;

use super::math::{Aabb, Vec3};
use super::scene::{ColliderKind, EntityId, SceneWorld};

/// Host-side movement primitive used by gameplay controllers.
pub trait MotionHost {
    /// Moves `body` by up to `displacement`, stopping at solid colliders.
    /// Returns the displacement that was actually applied.
    fn move_and_collide(
        &mut self,
        world: &mut SceneWorld,
        body: EntityId,
        displacement: Vec3,
    ) -> Vec3;

    /// Whether the last vertical move of `body` ended on a supporting surface.
    fn is_grounded(&self, body: EntityId) -> bool;
}

/// Axis-separated box sweeps against solid colliders and an infinite floor
/// plane. Grounded status only changes on moves with a vertical component.
#[derive(Debug, Clone)]
pub struct KinematicMotion {
    floor_height: f32,
    grounded: HashSet<EntityId>,
}

impl Default for KinematicMotion {
    fn default() -> Self {
        Self::new(0.0)
    }
}

const AXIS_X: usize = 0;
const AXIS_Y: usize = 1;
const AXIS_Z: usize = 2;

impl KinematicMotion {
    pub fn new(floor_height: f32) -> Self {
        Self {
            floor_height,
            grounded: HashSet::new(),
        }
    }

    pub fn floor_height(&self) -> f32 {
        self.floor_height
    }
}

impl MotionHost for KinematicMotion {
    fn move_and_collide(
        &mut self,
        world: &mut SceneWorld,
        body: EntityId,
        displacement: Vec3,
    ) -> Vec3 {
        let Some(entity) = world.find_entity(body) else {
            warn!(entity = body.0, "move_and_collide_unknown_body");
            return Vec3::ZERO;
        };
        if !displacement.is_finite() {
            warn!(entity = body.0, "move_and_collide_non_finite_displacement");
            return Vec3::ZERO;
        }

        let half = entity
            .collider
            .map(|collider| collider.half_extents)
            .unwrap_or(Vec3::ZERO);
        let start = entity.transform.position;
        let blockers: Vec<Aabb> = world
            .entities()
            .iter()
            .filter(|other| other.id != body)
            .filter(|other| {
                other
                    .collider
                    .is_some_and(|collider| collider.kind == ColliderKind::Solid)
            })
            .filter_map(|other| other.bounds())
            .collect();

        let mut position = start;
        let mut blocked_below = false;
        for axis in [AXIS_X, AXIS_Z, AXIS_Y] {
            let delta = component(displacement, axis);
            if delta == 0.0 {
                continue;
            }
            let (next, blocked) = sweep_axis(position, half, axis, delta, &blockers);
            position = next;

            if axis == AXIS_Y {
                let mut blocked = blocked;
                let floor_contact = self.floor_height + half.y;
                if delta < 0.0 && position.y < floor_contact {
                    position.y = floor_contact;
                    blocked = true;
                }
                blocked_below = delta < 0.0 && blocked;
            }
        }

        if displacement.y != 0.0 {
            if blocked_below {
                self.grounded.insert(body);
            } else {
                self.grounded.remove(&body);
            }
        }

        if let Some(entity) = world.find_entity_mut(body) {
            entity.transform.position = position;
        }
        position - start
    }

    fn is_grounded(&self, body: EntityId) -> bool {
        self.grounded.contains(&body)
    }
}

fn sweep_axis(
    position: Vec3,
    half: Vec3,
    axis: usize,
    delta: f32,
    blockers: &[Aabb],
) -> (Vec3, bool) {
    let start_box = Aabb::new(position, half);
    let start = component(position, axis);
    let mut target = start + delta;
    let mut blocked = false;

    for blocker in blockers {
        // Already overlapping at the start: never push out, just ignore.
        if start_box.intersects(blocker) {
            continue;
        }
        if !swept_box(position, half, axis, target).intersects(blocker) {
            continue;
        }
        target = if delta > 0.0 {
            target.min(component(blocker.min(), axis) - component(half, axis))
        } else {
            target.max(component(blocker.max(), axis) + component(half, axis))
        };
        blocked = true;
    }

    (with_component(position, axis, target), blocked)
}

/// Box covering every position between `position` and `target` on `axis`.
fn swept_box(position: Vec3, half: Vec3, axis: usize, target: f32) -> Aabb {
    let start = component(position, axis);
    let center = with_component(position, axis, (start + target) * 0.5);
    let reach = component(half, axis) + (target - start).abs() * 0.5;
    Aabb::new(center, with_component(half, axis, reach))
}

fn component(v: Vec3, axis: usize) -> f32 {
    match axis {
        AXIS_X => v.x,
        AXIS_Y => v.y,
        _ => v.z,
    }
}

fn with_component(v: Vec3, axis: usize, value: f32) -> Vec3 {
    match axis {
        AXIS_X => Vec3 { x: value, ..v },
        AXIS_Y => Vec3 { y: value, ..v },
        _ => Vec3 { z: value, ..v },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEnter {
    pub trigger: EntityId,
    pub other: EntityId,
}

/// Reports a trigger-enter once per overlap. A pair can enter again only
/// after it has separated.
#[derive(Debug, Clone, Default)]
pub struct TriggerTracker {
    overlapping: HashSet<(EntityId, EntityId)>,
}

impl TriggerTracker {
    pub fn collect_enter_events(&mut self, world: &SceneWorld) -> Vec<TriggerEnter> {
        let mut current = HashSet::with_capacity(self.overlapping.len());
        let mut entered = Vec::new();

        for trigger in world.entities() {
            let Some(collider) = trigger.collider else {
                continue;
            };
            if collider.kind != ColliderKind::Trigger {
                continue;
            }
            let trigger_bounds = Aabb::new(trigger.transform.position, collider.half_extents);
            for other in world.entities() {
                if other.id == trigger.id {
                    continue;
                }
                let Some(other_collider) = other.collider else {
                    continue;
                };
                if other_collider.kind != ColliderKind::Solid {
                    continue;
                }
                let other_bounds = Aabb::new(other.transform.position, other_collider.half_extents);
                if !trigger_bounds.intersects(&other_bounds) {
                    continue;
                }
                let pair = (trigger.id, other.id);
                if !self.overlapping.contains(&pair) {
                    entered.push(TriggerEnter {
                        trigger: trigger.id,
                        other: other.id,
                    });
                }
                current.insert(pair);
            }
        }

        self.overlapping = current;
        entered
    }

    pub fn clear(&mut self) {
        self.overlapping.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::scene::{Collider, SpawnDesc};

    const BODY_HALF: Vec3 = Vec3::new(0.5, 1.0, 0.5);

    fn world_with_body(position: Vec3) -> (SceneWorld, EntityId) {
        let mut world = SceneWorld::default();
        let body =
            world.spawn(SpawnDesc::new("body", position).with_collider(Collider::solid(BODY_HALF)));
        world.apply_pending();
        (world, body)
    }

    fn position_of(world: &SceneWorld, id: EntityId) -> Vec3 {
        world.find_entity(id).expect("entity").transform.position
    }

    #[test]
    fn falling_body_lands_on_floor_and_is_grounded() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.2, 0.0));
        let mut motion = KinematicMotion::default();

        let applied = motion.move_and_collide(&mut world, body, Vec3::new(0.0, -1.0, 0.0));

        assert!((applied.y + 0.2).abs() < 1e-5);
        assert!((position_of(&world, body).y - 1.0).abs() < 1e-5);
        assert!(motion.is_grounded(body));
    }

    #[test]
    fn upward_move_clears_grounded() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.0, 0.0));
        let mut motion = KinematicMotion::default();
        motion.move_and_collide(&mut world, body, Vec3::new(0.0, -0.1, 0.0));
        assert!(motion.is_grounded(body));

        motion.move_and_collide(&mut world, body, Vec3::new(0.0, 0.5, 0.0));
        assert!(!motion.is_grounded(body));
    }

    #[test]
    fn horizontal_move_keeps_grounded_state() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.0, 0.0));
        let mut motion = KinematicMotion::default();
        motion.move_and_collide(&mut world, body, Vec3::new(0.0, -0.1, 0.0));
        motion.move_and_collide(&mut world, body, Vec3::new(1.0, 0.0, 0.0));
        assert!(motion.is_grounded(body));
    }

    #[test]
    fn solid_wall_stops_horizontal_move_at_contact() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.0, 0.0));
        world.spawn(
            SpawnDesc::new("wall", Vec3::new(3.0, 1.0, 0.0))
                .with_collider(Collider::solid(Vec3::new(0.5, 2.0, 2.0))),
        );
        world.apply_pending();
        let mut motion = KinematicMotion::default();

        motion.move_and_collide(&mut world, body, Vec3::new(5.0, 0.0, 0.0));

        assert!((position_of(&world, body).x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn thin_wall_blocks_a_fast_move() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.0, 0.0));
        world.spawn(
            SpawnDesc::new("pane", Vec3::new(2.0, 1.0, 0.0))
                .with_collider(Collider::solid(Vec3::new(0.05, 2.0, 2.0))),
        );
        world.apply_pending();
        let mut motion = KinematicMotion::default();

        let applied = motion.move_and_collide(&mut world, body, Vec3::new(20.0, 0.0, 0.0));

        assert!((applied.x - 1.45).abs() < 1e-5);
        assert!((position_of(&world, body).x - 1.45).abs() < 1e-5);
    }

    #[test]
    fn nearest_of_several_walls_wins() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.0, 0.0));
        for (name, x) in [("far", -6.0), ("near", -3.0)] {
            world.spawn(
                SpawnDesc::new(name, Vec3::new(x, 1.0, 0.0))
                    .with_collider(Collider::solid(Vec3::new(0.5, 2.0, 2.0))),
            );
        }
        world.apply_pending();
        let mut motion = KinematicMotion::default();

        motion.move_and_collide(&mut world, body, Vec3::new(-10.0, 0.0, 0.0));

        assert!((position_of(&world, body).x + 2.0).abs() < 1e-5);
    }

    #[test]
    fn resting_on_a_box_top_stays_grounded() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 2.0, 0.0));
        world.spawn(
            SpawnDesc::new("step", Vec3::new(0.0, 0.5, 0.0))
                .with_collider(Collider::solid(Vec3::new(2.0, 0.5, 2.0))),
        );
        world.apply_pending();
        let mut motion = KinematicMotion::default();

        let applied = motion.move_and_collide(&mut world, body, Vec3::new(0.0, -0.2, 0.0));

        assert_eq!(applied, Vec3::ZERO);
        assert!(motion.is_grounded(body));
    }

    #[test]
    fn trigger_colliders_do_not_block() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 1.0, 0.0));
        world.spawn(
            SpawnDesc::new("zone", Vec3::new(2.0, 1.0, 0.0))
                .with_collider(Collider::trigger(Vec3::new(0.5, 2.0, 2.0))),
        );
        world.apply_pending();
        let mut motion = KinematicMotion::default();

        motion.move_and_collide(&mut world, body, Vec3::new(4.0, 0.0, 0.0));

        assert!((position_of(&world, body).x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn landing_on_a_box_top_counts_as_grounded() {
        let (mut world, body) = world_with_body(Vec3::new(0.0, 3.5, 0.0));
        world.spawn(
            SpawnDesc::new("step", Vec3::new(0.0, 0.5, 0.0))
                .with_collider(Collider::solid(Vec3::new(2.0, 0.5, 2.0))),
        );
        world.apply_pending();
        let mut motion = KinematicMotion::default();

        motion.move_and_collide(&mut world, body, Vec3::new(0.0, -5.0, 0.0));

        assert!((position_of(&world, body).y - 2.0).abs() < 1e-5);
        assert!(motion.is_grounded(body));
    }

    #[test]
    fn unknown_body_does_not_move() {
        let mut world = SceneWorld::default();
        let mut motion = KinematicMotion::default();
        let applied = motion.move_and_collide(&mut world, EntityId(9), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(applied, Vec3::ZERO);
    }

    #[test]
    fn trigger_enter_fires_once_per_overlap() {
        let mut world = SceneWorld::default();
        let zone = world.spawn(
            SpawnDesc::new("zone", Vec3::ZERO).with_collider(Collider::trigger(Vec3::new(
                1.0, 1.0, 1.0,
            ))),
        );
        let ball = world.spawn(
            SpawnDesc::new("ball", Vec3::new(5.0, 0.0, 0.0))
                .with_collider(Collider::solid(Vec3::new(0.2, 0.2, 0.2))),
        );
        world.apply_pending();
        let mut tracker = TriggerTracker::default();

        assert!(tracker.collect_enter_events(&world).is_empty());

        world.find_entity_mut(ball).expect("ball").transform.position = Vec3::ZERO;
        assert_eq!(
            tracker.collect_enter_events(&world),
            vec![TriggerEnter {
                trigger: zone,
                other: ball
            }]
        );
        assert!(tracker.collect_enter_events(&world).is_empty());

        world.find_entity_mut(ball).expect("ball").transform.position = Vec3::new(5.0, 0.0, 0.0);
        assert!(tracker.collect_enter_events(&world).is_empty());
        world.find_entity_mut(ball).expect("ball").transform.position = Vec3::ZERO;
        assert_eq!(tracker.collect_enter_events(&world).len(), 1);
    }
}
