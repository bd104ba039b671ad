use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, warn};

use lockstep_serde::{ByteReader, ByteWrite, ByteWriter, Serde, U32_BYTES};

use crate::{
    world::{entity::EntityId, error::WorldError, world_store::WorldStore},
    HostType, TypeTag,
};

use super::{
    error::ReplicationError,
    rule::{ReplicationFrequency, ReplicationRule},
};

/// Size of the `[tick][ruleCount]` header that starts every delta
pub const DELTA_HEADER_BYTES: usize = 2 * U32_BYTES;

pub type DeltaCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Rule-driven component replication with dirty tracking.
///
/// Delta layout: `[tick][ruleCount]` then per rule `[typeTag][entityCount]`
/// then per entity `[entityID][dataSize][data]`.
pub struct ReplicationManager {
    rules: Vec<ReplicationRule>,
    dirty: BTreeMap<TypeTag, BTreeSet<EntityId>>,
    manually_triggered: HashSet<TypeTag>,
    host_type: Option<HostType>,
    reliable_callback: Option<DeltaCallback>,
    unreliable_callback: Option<DeltaCallback>,
}

impl Default for ReplicationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationManager {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            dirty: BTreeMap::new(),
            manually_triggered: HashSet::new(),
            host_type: None,
            reliable_callback: None,
            unreliable_callback: None,
        }
    }

    /// A manager that only emits rules whose direction is sent by `host_type`
    pub fn with_host_type(host_type: HostType) -> Self {
        let mut manager = Self::new();
        manager.host_type = Some(host_type);
        manager
    }

    pub fn host_type(&self) -> Option<HostType> {
        self.host_type
    }

    // Rules

    /// Adds `rule`, replacing any existing rule for the same type tag
    pub fn add_rule(&mut self, rule: ReplicationRule) {
        if let Some(existing) = self
            .rules
            .iter_mut()
            .find(|existing| existing.type_tag == rule.type_tag)
        {
            *existing = rule;
            return;
        }
        self.rules.push(rule);
    }

    pub fn remove_rule(&mut self, type_tag: TypeTag) {
        self.rules.retain(|rule| rule.type_tag != type_tag);
        self.dirty.remove(&type_tag);
        self.manually_triggered.remove(&type_tag);
    }

    pub fn has_rule(&self, type_tag: TypeTag) -> bool {
        self.get_rule(type_tag).is_some()
    }

    pub fn get_rule(&self, type_tag: TypeTag) -> Option<&ReplicationRule> {
        self.rules.iter().find(|rule| rule.type_tag == type_tag)
    }

    pub fn rules(&self) -> &[ReplicationRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    // Dirty tracking

    pub fn mark_dirty(&mut self, type_tag: TypeTag, entity: EntityId) {
        self.dirty.entry(type_tag).or_default().insert(entity);
    }

    pub fn is_dirty(&self, type_tag: TypeTag, entity: EntityId) -> bool {
        self.dirty
            .get(&type_tag)
            .is_some_and(|entities| entities.contains(&entity))
    }

    /// Clears every dirty mark and every pending manual trigger
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
        self.manually_triggered.clear();
    }

    pub fn trigger_manual_replication(&mut self, type_tag: TypeTag) {
        self.manually_triggered.insert(type_tag);
    }

    pub fn set_reliable_callback(&mut self, callback: impl FnMut(&[u8]) + Send + 'static) {
        self.reliable_callback = Some(Box::new(callback));
    }

    pub fn set_unreliable_callback(&mut self, callback: impl FnMut(&[u8]) + Send + 'static) {
        self.unreliable_callback = Some(Box::new(callback));
    }

    // Collection

    /// Collects the delta for reliable rules and clears their dirty state
    pub fn collect_delta(&mut self, tick: u32, store: &WorldStore) -> Vec<u8> {
        self.collect_filtered(tick, store, true)
    }

    /// Collects the delta for unreliable rules and clears their dirty state
    pub fn collect_unreliable_delta(&mut self, tick: u32, store: &WorldStore) -> Vec<u8> {
        self.collect_filtered(tick, store, false)
    }

    /// Collects both streams and hands each to its callback, if one is set
    pub fn dispatch(&mut self, tick: u32, store: &WorldStore) {
        let reliable = self.collect_delta(tick, store);
        let unreliable = self.collect_unreliable_delta(tick, store);

        if let Some(callback) = self.reliable_callback.as_mut() {
            callback(&reliable);
        }
        if let Some(callback) = self.unreliable_callback.as_mut() {
            callback(&unreliable);
        }
    }

    fn collect_filtered(&mut self, tick: u32, store: &WorldStore, reliable: bool) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        tick.ser(&mut writer);
        let rule_count_position = writer.bytes_written();
        0u32.ser(&mut writer);

        let mut rule_count: u32 = 0;

        for rule in &self.rules {
            if rule.reliable != reliable {
                continue;
            }
            if let Some(host_type) = self.host_type {
                if !rule.direction.is_sent_by(host_type) {
                    continue;
                }
            }

            let candidates: Vec<EntityId> = match rule.frequency {
                ReplicationFrequency::EveryTick => store.entities_with_tag(rule.type_tag),
                ReplicationFrequency::OnChange => match self.dirty.get(&rule.type_tag) {
                    Some(entities) if !entities.is_empty() => entities.iter().copied().collect(),
                    _ => continue,
                },
                ReplicationFrequency::Manual => {
                    if !self.manually_triggered.contains(&rule.type_tag) {
                        continue;
                    }
                    store.entities_with_tag(rule.type_tag)
                }
            };

            rule.type_tag.ser(&mut writer);
            let entity_count_position = writer.bytes_written();
            0u32.ser(&mut writer);

            let mut entity_count: u32 = 0;
            for entity in candidates {
                if !store.is_alive(entity) {
                    continue;
                }
                let Some(data) = store.serialize_component(entity, rule.type_tag) else {
                    continue;
                };
                entity.ser(&mut writer);
                (data.len() as u32).ser(&mut writer);
                writer.write_bytes(&data);
                entity_count += 1;
            }

            writer.patch_u32(entity_count_position, entity_count);
            rule_count += 1;
        }

        writer.patch_u32(rule_count_position, rule_count);

        // Each stream only consumes the marks of its own rules. Marks for
        // tags without a rule are dropped by whichever stream runs.
        let rules = &self.rules;
        let owned_by_other_stream =
            |tag: &TypeTag| rules.iter().any(|rule| rule.type_tag == *tag && rule.reliable != reliable);
        self.dirty.retain(|tag, _| owned_by_other_stream(tag));
        self.manually_triggered.retain(|tag| owned_by_other_stream(tag));

        debug!(
            "ReplicationManager: collected {} {} rules for tick {} ({} bytes)",
            rule_count,
            if reliable { "reliable" } else { "unreliable" },
            tick,
            writer.bytes_written()
        );
        writer.to_bytes()
    }

    // Application

    /// Applies a delta to `store`, returning how many components were written.
    ///
    /// A truncated tail stops parsing early. Components for entities that are
    /// not alive, or for tags without a registered serializer, are skipped.
    pub fn apply_delta(&self, data: &[u8], store: &mut WorldStore) -> Result<usize, ReplicationError> {
        if data.len() < DELTA_HEADER_BYTES {
            return Err(ReplicationError::TruncatedHeader {
                length: data.len(),
                minimum: DELTA_HEADER_BYTES,
            });
        }

        let mut reader = ByteReader::new(data);
        let Ok(tick) = u32::de(&mut reader) else {
            return Ok(0);
        };
        let Ok(rule_count) = u32::de(&mut reader) else {
            return Ok(0);
        };

        let mut applied = 0;

        'rules: for _ in 0..rule_count {
            let (Ok(type_tag), Ok(entity_count)) = (u32::de(&mut reader), u32::de(&mut reader)) else {
                warn!("ReplicationManager: delta for tick {} truncated in rule header", tick);
                break;
            };

            for _ in 0..entity_count {
                let (Ok(entity), Ok(size)) = (EntityId::de(&mut reader), u32::de(&mut reader)) else {
                    warn!("ReplicationManager: delta for tick {} truncated in entity header", tick);
                    break 'rules;
                };
                let Ok(bytes) = reader.read_bytes(size as usize) else {
                    warn!(
                        "ReplicationManager: delta for tick {} truncated in {} component {}",
                        tick, entity, type_tag
                    );
                    break 'rules;
                };

                match store.deserialize_component(entity, type_tag, bytes) {
                    Ok(()) => applied += 1,
                    Err(WorldError::EntityNotFound { .. }) | Err(WorldError::UnregisteredTypeTag { .. }) => {
                        debug!(
                            "ReplicationManager: skipping component {} for {}",
                            type_tag, entity
                        );
                    }
                    Err(error) => {
                        warn!("ReplicationManager: {}", error);
                    }
                }
            }
        }

        Ok(applied)
    }
}
