use thiserror::Error;

use super::camera::CameraRig;
use super::input::{ActionMap, InputSnapshot};
use super::math::{Aabb, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Error)]
#[error("scene `{scene}` failed to load: {message}")]
pub struct SceneLoadError {
    pub scene: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Capability marker carried by an entity. Gameplay checks tags instead of
/// comparing entity identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityTag(pub &'static str);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderKind {
    /// Blocks kinematic bodies.
    Solid,
    /// Reports overlaps, never blocks.
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub half_extents: Vec3,
    pub kind: ColliderKind,
}

impl Collider {
    pub fn solid(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            kind: ColliderKind::Solid,
        }
    }

    pub fn trigger(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            kind: ColliderKind::Trigger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableKind {
    Hidden,
    Block { rgba: [u8; 4] },
}

#[derive(Debug, Clone)]
pub struct SpawnDesc {
    pub name: &'static str,
    pub transform: Transform,
    pub renderable: RenderableKind,
    pub collider: Option<Collider>,
    pub tags: Vec<EntityTag>,
}

impl SpawnDesc {
    pub fn new(name: &'static str, position: Vec3) -> Self {
        Self {
            name,
            transform: Transform::at(position),
            renderable: RenderableKind::Hidden,
            collider: None,
            tags: Vec::new(),
        }
    }

    pub fn with_renderable(mut self, renderable: RenderableKind) -> Self {
        self.renderable = renderable;
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_tag(mut self, tag: EntityTag) -> Self {
        self.tags.push(tag);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: &'static str,
    pub transform: Transform,
    pub renderable: RenderableKind,
    pub collider: Option<Collider>,
    tags: Vec<EntityTag>,
}

impl Entity {
    pub fn has_tag(&self, tag: EntityTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn tags(&self) -> &[EntityTag] {
        &self.tags
    }

    /// World-space bounds of the collider, if any.
    pub fn bounds(&self) -> Option<Aabb> {
        self.collider
            .map(|collider| Aabb::new(self.transform.position, collider.half_extents))
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entities, cameras and input stream flags for one scene. Spawns and
/// despawns are deferred until `apply_pending`.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    cameras: CameraRig,
    input_map: ActionMap,
}

impl SceneWorld {
    pub fn spawn(&mut self, desc: SpawnDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            name: desc.name,
            transform: desc.transform,
            renderable: desc.renderable,
            collider: desc.collider,
            tags: desc.tags,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_spawns.is_empty() {
            self.entities.append(&mut self.pending_spawns);
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_despawns.clear();
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.cameras.clear();
        self.input_map = ActionMap::default();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|entity| entity.name == name)
            .map(|entity| entity.id)
    }

    pub fn entities_with_tag(&self, tag: EntityTag) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .iter()
            .filter(move |entity| entity.has_tag(tag))
    }

    pub fn cameras(&self) -> &CameraRig {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut CameraRig {
        &mut self.cameras
    }

    pub fn input_map(&self) -> &ActionMap {
        &self.input_map
    }

    pub fn input_map_mut(&mut self) -> &mut ActionMap {
        &mut self.input_map
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError>;
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, _world: &SceneWorld) {}
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) -> Result<(), SceneLoadError> {
        if self.is_loaded {
            return Ok(());
        }
        self.scene.load(&mut self.world)?;
        self.world.apply_pending();
        self.is_loaded = true;
        Ok(())
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        let command = self
            .scene
            .update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
        command
    }

    pub(crate) fn render(&mut self) {
        self.scene.render(&self.world);
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: EntityTag = EntityTag("marker");

    struct CountingScene {
        spawn_count: usize,
        updates: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError> {
            for _ in 0..self.spawn_count {
                world.spawn(SpawnDesc::new("test", Vec3::ZERO).with_tag(MARKER));
            }
            Ok(())
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            self.updates += 1;
            world.spawn(SpawnDesc::new("late", Vec3::ZERO));
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    struct FailingScene;

    impl Scene for FailingScene {
        fn load(&mut self, _world: &mut SceneWorld) -> Result<(), SceneLoadError> {
            Err(SceneLoadError {
                scene: "failing",
                message: "missing camera".to_string(),
            })
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    #[test]
    fn spawns_are_deferred_until_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(SpawnDesc::new("crate", Vec3::new(1.0, 0.0, 0.0)));
        assert!(world.find_entity(id).is_none());

        world.apply_pending();
        let entity = world.find_entity(id).expect("entity");
        assert_eq!(entity.transform.position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(world.find_by_name("crate"), Some(id));
    }

    #[test]
    fn despawn_unknown_entity_is_rejected() {
        let mut world = SceneWorld::default();
        assert!(!world.despawn(EntityId(42)));
    }

    #[test]
    fn despawn_of_pending_spawn_removes_it() {
        let mut world = SceneWorld::default();
        let id = world.spawn(SpawnDesc::new("temp", Vec3::ZERO));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn tags_are_queryable() {
        let mut world = SceneWorld::default();
        let tagged = world.spawn(SpawnDesc::new("a", Vec3::ZERO).with_tag(MARKER));
        world.spawn(SpawnDesc::new("b", Vec3::ZERO));
        world.apply_pending();

        let found: Vec<EntityId> = world.entities_with_tag(MARKER).map(|e| e.id).collect();
        assert_eq!(found, vec![tagged]);
    }

    #[test]
    fn runtime_loads_once_and_applies_pending_after_update() {
        let mut runtime = SceneRuntime::new(Box::new(CountingScene {
            spawn_count: 3,
            updates: 0,
        }));
        runtime.load().expect("load");
        runtime.load().expect("second load is a no-op");
        assert_eq!(runtime.world().entity_count(), 3);

        runtime.update(1.0 / 60.0, &InputSnapshot::empty());
        assert_eq!(runtime.world().entity_count(), 4);

        runtime.shutdown();
        assert_eq!(runtime.world().entity_count(), 0);
    }

    #[test]
    fn load_error_propagates() {
        let mut runtime = SceneRuntime::new(Box::new(FailingScene));
        let error = runtime.load().expect_err("load should fail");
        assert_eq!(
            error.to_string(),
            "scene `failing` failed to load: missing camera"
        );
    }
}
