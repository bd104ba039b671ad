use std::collections::{BTreeMap, HashMap};

use log::{debug, error, info, warn};

use lockstep_serde::{ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr};

use crate::{
    world::{
        component::{
            component_kinds::{ComponentKind, ComponentKinds},
            serializer::{ComponentBox, FnSerializer, SerdeSerializer},
            Component,
        },
        entity::EntityId,
        error::WorldError,
    },
    TypeTag,
};

/// Size of the `[nextID][entityCount]` header that starts every serialized world
pub const WORLD_HEADER_BYTES: usize = 8;

pub type TickCallback = Box<dyn FnMut(&mut WorldStore, f32) + Send>;

#[derive(Default)]
struct EntityRecord {
    components: HashMap<ComponentKind, ComponentBox>,
}

/// Owns entity identities and their component values.
///
/// Entities are kept ordered by id and components are written in ascending
/// type tag order, so two stores holding the same values always serialize to
/// the same bytes.
pub struct WorldStore {
    next_id: u32,
    entities: BTreeMap<EntityId, EntityRecord>,
    component_kinds: ComponentKinds,
    tick_callback: Option<TickCallback>,
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entities: BTreeMap::new(),
            component_kinds: ComponentKinds::new(),
            tick_callback: None,
        }
    }

    // Registration

    /// Registers `C` for serialization under `tag` using its `Serde` encoding
    pub fn register_component<C: Component + Serde>(&mut self, tag: TypeTag) {
        self.component_kinds
            .add_component::<C>(tag, Box::new(SerdeSerializer::<C>::new()));
    }

    /// Registers `C` for serialization under `tag` with an explicit function pair
    pub fn register_component_with<C: Component>(
        &mut self,
        tag: TypeTag,
        ser_fn: fn(&C) -> Vec<u8>,
        de_fn: fn(&[u8]) -> Option<C>,
    ) {
        self.component_kinds
            .add_component::<C>(tag, Box::new(FnSerializer::new(ser_fn, de_fn)));
    }

    pub fn component_kinds(&self) -> &ComponentKinds {
        &self.component_kinds
    }

    pub fn has_serializer<C: Component>(&self) -> bool {
        self.component_kinds.is_registered(&ComponentKind::of::<C>())
    }

    pub fn has_serializer_for_tag(&self, tag: TypeTag) -> bool {
        self.component_kinds.tag_to_kind(tag).is_some()
    }

    pub fn type_tag_of<C: Component>(&self) -> Option<TypeTag> {
        self.component_kinds.kind_to_tag(&ComponentKind::of::<C>())
    }

    // Entities

    /// Allocates a fresh entity.
    ///
    /// Once the id space is used up this logs an error and returns
    /// `EntityId::RESERVED`, which is never alive, so later component calls
    /// on it fail with `EntityNotFound`.
    pub fn create_entity(&mut self) -> EntityId {
        match self.try_create_entity() {
            Ok(entity) => entity,
            Err(err) => {
                error!("WorldStore: {}", err);
                EntityId::RESERVED
            }
        }
    }

    pub fn try_create_entity(&mut self) -> Result<EntityId, WorldError> {
        if self.next_id == EntityId::RESERVED.to_u32() {
            return Err(WorldError::IdSpaceExhausted {
                entity: EntityId::RESERVED,
            });
        }
        let entity = EntityId::from_u32(self.next_id);
        self.next_id += 1;
        self.entities.insert(entity, EntityRecord::default());
        Ok(entity)
    }

    /// Removes the entity and all of its components. Returns false if it did not exist.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        self.entities.remove(&entity).is_some()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in ascending id order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// The id the next `create_entity` call will return
    pub fn next_entity_id(&self) -> EntityId {
        EntityId::from_u32(self.next_id)
    }

    /// Destroys every entity. The id counter is kept so ids are never reused.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    // Components

    /// Adds `component` to the entity, replacing any previous value of the same kind
    pub fn add_component<C: Component>(
        &mut self,
        entity: EntityId,
        component: C,
    ) -> Result<(), WorldError> {
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound { entity })?;
        record
            .components
            .insert(ComponentKind::of::<C>(), Box::new(component));
        Ok(())
    }

    pub fn get_component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.entities
            .get(&entity)?
            .components
            .get(&ComponentKind::of::<C>())?
            .downcast_ref::<C>()
    }

    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        self.entities
            .get_mut(&entity)?
            .components
            .get_mut(&ComponentKind::of::<C>())?
            .downcast_mut::<C>()
    }

    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> Option<C> {
        let component = self
            .entities
            .get_mut(&entity)?
            .components
            .remove(&ComponentKind::of::<C>())?;
        component.downcast::<C>().ok().map(|boxed| *boxed)
    }

    pub fn has_component<C: Component>(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|record| record.components.contains_key(&ComponentKind::of::<C>()))
    }

    /// Type tags of the entity's serializable components, ascending
    pub fn component_tags(&self, entity: EntityId) -> Vec<TypeTag> {
        let Some(record) = self.entities.get(&entity) else {
            return Vec::new();
        };
        let mut tags: Vec<TypeTag> = record
            .components
            .keys()
            .filter_map(|kind| self.component_kinds.kind_to_tag(kind))
            .collect();
        tags.sort_unstable();
        tags
    }

    /// Live entities holding a serializable component with the given tag, ascending
    pub fn entities_with_tag(&self, tag: TypeTag) -> Vec<EntityId> {
        let Some(kind) = self.component_kinds.tag_to_kind(tag) else {
            return Vec::new();
        };
        self.entities
            .iter()
            .filter(|(_, record)| record.components.contains_key(&kind))
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// Encodes one component through its registered serializer
    pub fn serialize_component(&self, entity: EntityId, tag: TypeTag) -> Option<Vec<u8>> {
        let (kind, serializer) = self.component_kinds.serializer_for_tag(tag)?;
        let component = self.entities.get(&entity)?.components.get(&kind)?;
        serializer.serialize(component.as_ref())
    }

    /// Decodes `bytes` through the serializer for `tag` and stores the value on
    /// the entity, replacing any previous value
    pub fn deserialize_component(
        &mut self,
        entity: EntityId,
        tag: TypeTag,
        bytes: &[u8],
    ) -> Result<(), WorldError> {
        let (kind, serializer) = self
            .component_kinds
            .serializer_for_tag(tag)
            .ok_or(WorldError::UnregisteredTypeTag { tag })?;
        let component = serializer
            .deserialize(bytes)
            .map_err(|source| WorldError::ComponentDecode {
                entity,
                tag,
                source,
            })?;
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound { entity })?;
        record.components.insert(kind, component);
        Ok(())
    }

    // Whole-world serialization

    /// `[nextID][entityCount]` then per entity `[entityID][componentCount]` then
    /// per component `[typeTag][byteLength][bytes]`. Components without a
    /// registered serializer are left out.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.next_id.ser(&mut writer);
        (self.entities.len() as u32).ser(&mut writer);

        for (entity, record) in &self.entities {
            let mut components: Vec<(TypeTag, Vec<u8>)> = record
                .components
                .iter()
                .filter_map(|(kind, component)| {
                    let tag = self.component_kinds.kind_to_tag(kind)?;
                    let serializer = self.component_kinds.serializer(kind)?;
                    serializer
                        .serialize(component.as_ref())
                        .map(|bytes| (tag, bytes))
                })
                .collect();
            components.sort_unstable_by_key(|(tag, _)| *tag);

            entity.ser(&mut writer);
            (components.len() as u32).ser(&mut writer);
            for (tag, bytes) in components {
                tag.ser(&mut writer);
                (bytes.len() as u32).ser(&mut writer);
                writer.write_bytes(&bytes);
            }
        }

        writer.to_bytes()
    }

    /// Replaces every entity and component with the contents of `bytes`.
    ///
    /// The stream is parsed in full before anything is swapped in: on any
    /// error the store keeps its previous contents. Components whose tag has
    /// no registered serializer are skipped.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), WorldError> {
        if bytes.len() < WORLD_HEADER_BYTES {
            return Err(WorldError::TruncatedHeader {
                length: bytes.len(),
                minimum: WORLD_HEADER_BYTES,
            });
        }

        let mut reader = ByteReader::new(bytes);
        let next_id = read_u32(&mut reader)?;
        if next_id == EntityId::RESERVED.to_u32() {
            return Err(WorldError::IdSpaceExhausted {
                entity: EntityId::RESERVED,
            });
        }
        let entity_count = read_u32(&mut reader)?;

        let mut entities = BTreeMap::new();
        let mut highest_id: u32 = 0;

        for _ in 0..entity_count {
            let entity = EntityId::from_u32(read_u32(&mut reader)?);
            if entity == EntityId::RESERVED {
                return Err(WorldError::IdSpaceExhausted { entity });
            }
            let component_count = read_u32(&mut reader)?;
            let mut record = EntityRecord::default();

            for _ in 0..component_count {
                let tag = read_u32(&mut reader)?;
                let declared = read_u32(&mut reader)?;
                let remaining = reader.remaining();
                let data = reader.read_bytes(declared as usize).map_err(|_| {
                    WorldError::MalformedComponentLength {
                        entity,
                        tag,
                        declared,
                        remaining,
                    }
                })?;

                let Some((kind, serializer)) = self.component_kinds.serializer_for_tag(tag) else {
                    warn!(
                        "WorldStore: skipping component with unregistered type tag {} on {}",
                        tag, entity
                    );
                    continue;
                };
                let component = serializer
                    .deserialize(data)
                    .map_err(|source| WorldError::ComponentDecode {
                        entity,
                        tag,
                        source,
                    })?;
                record.components.insert(kind, component);
            }

            if entities.insert(entity, record).is_some() {
                return Err(WorldError::DuplicateEntity { entity });
            }
            highest_id = highest_id.max(entity.to_u32());
        }

        self.entities = entities;
        // Never fall behind an id that is already in use
        self.next_id = next_id.max(highest_id.saturating_add(1));

        debug!(
            "WorldStore: deserialized {} entities, next id {}",
            self.entities.len(),
            self.next_id
        );
        Ok(())
    }

    // Fixed-step advance

    /// Installs the system run by `update`
    pub fn set_tick_callback(&mut self, callback: impl FnMut(&mut WorldStore, f32) + Send + 'static) {
        info!("WorldStore: tick callback installed");
        self.tick_callback = Some(Box::new(callback));
    }

    pub fn clear_tick_callback(&mut self) {
        self.tick_callback = None;
    }

    /// Advances the world by one fixed step of `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        let Some(mut callback) = self.tick_callback.take() else {
            return;
        };
        callback(self, delta_time);
        // The callback may have installed a replacement; keep the newer one
        if self.tick_callback.is_none() {
            self.tick_callback = Some(callback);
        }
    }
}

fn read_u32(reader: &mut ByteReader) -> Result<u32, WorldError> {
    let offset = reader.position();
    u32::de(reader).map_err(|source: SerdeErr| WorldError::TruncatedStream { offset, source })
}
