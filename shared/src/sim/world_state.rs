use std::collections::{BTreeMap, VecDeque};

use log::{debug, info};

use crate::{sim::state_hasher::point_hash, Tick, TypeTag};

/// Classifies state by how the simulation may treat it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateCategory {
    /// Authoritative: hashed, saved, replicated
    Simulated,
    /// Recomputed from Simulated state; rebuilt after load or rollback
    Derived,
    /// Rendering only
    Presentation,
    /// Editor and debug overlays
    Debug,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateBlockInfo {
    pub name: String,
    pub category: StateCategory,
    pub type_tag: TypeTag,
    pub estimated_size: usize,
}

/// Serialized simulated state at one tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub state_hash: u64,
    pub ecs_data: Vec<u8>,
    pub aux_data: Vec<u8>,
}

impl WorldSnapshot {
    pub fn new(tick: Tick, ecs_data: Vec<u8>, aux_data: Vec<u8>) -> Self {
        Self {
            tick,
            state_hash: point_hash(&ecs_data, &aux_data),
            ecs_data,
            aux_data,
        }
    }
}

pub type DerivedRebuildCallback = Box<dyn FnMut(&WorldSnapshot) + Send>;

/// Registry of state blocks, the snapshot ring buffer, and advisory
/// component ownership.
pub struct WorldState {
    blocks: Vec<StateBlockInfo>,
    snapshots: VecDeque<WorldSnapshot>,
    max_snapshots: Option<usize>,
    component_owners: BTreeMap<String, String>,
    derived_rebuild_callback: Option<DerivedRebuildCallback>,
    tick_scope_enforced: bool,
    in_tick_scope: bool,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            snapshots: VecDeque::new(),
            max_snapshots: None,
            component_owners: BTreeMap::new(),
            derived_rebuild_callback: None,
            tick_scope_enforced: false,
            in_tick_scope: false,
        }
    }

    // Blocks

    /// Registers a named block. A second registration under the same name is ignored.
    pub fn register_block(
        &mut self,
        name: &str,
        category: StateCategory,
        type_tag: TypeTag,
        estimated_size: usize,
    ) {
        if self.find_block(name).is_some() {
            return;
        }
        self.blocks.push(StateBlockInfo {
            name: name.to_string(),
            category,
            type_tag,
            estimated_size,
        });
    }

    pub fn registered_blocks(&self) -> &[StateBlockInfo] {
        &self.blocks
    }

    pub fn find_block(&self, name: &str) -> Option<&StateBlockInfo> {
        self.blocks.iter().find(|block| block.name == name)
    }

    // Snapshots

    /// Builds a snapshot with its point hash. Nothing is stored.
    pub fn take_snapshot(&self, tick: Tick, ecs_data: &[u8], aux_data: &[u8]) -> WorldSnapshot {
        WorldSnapshot::new(tick, ecs_data.to_vec(), aux_data.to_vec())
    }

    /// Appends `snapshot`, evicting the oldest entries past the retention limit
    #[track_caller]
    pub fn push_snapshot(&mut self, snapshot: WorldSnapshot) {
        debug_assert!(
            !self.tick_scope_enforced || self.in_tick_scope,
            "WorldState: snapshot for tick {} pushed outside of a tick scope",
            snapshot.tick
        );

        self.snapshots.push_back(snapshot);
        if let Some(max) = self.max_snapshots {
            while self.snapshots.len() > max {
                self.snapshots.pop_front();
            }
        }
    }

    pub fn latest_snapshot(&self) -> Option<&WorldSnapshot> {
        self.snapshots.back()
    }

    pub fn snapshot_at_tick(&self, tick: Tick) -> Option<&WorldSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.tick == tick)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &WorldSnapshot> {
        self.snapshots.iter()
    }

    /// Caps retention. Values below 1 are raised to 1.
    pub fn set_max_snapshots(&mut self, max: usize) {
        let max = max.max(1);
        self.max_snapshots = Some(max);
        while self.snapshots.len() > max {
            self.snapshots.pop_front();
        }
    }

    /// `None` while retention is unbounded
    pub fn max_snapshots(&self) -> Option<usize> {
        self.max_snapshots
    }

    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
    }

    /// Drops every snapshot strictly older than `tick`
    pub fn prune_snapshots_before(&mut self, tick: Tick) {
        self.snapshots.retain(|snapshot| snapshot.tick >= tick);
    }

    // Derived state

    pub fn set_derived_rebuild_callback(
        &mut self,
        callback: impl FnMut(&WorldSnapshot) + Send + 'static,
    ) {
        self.derived_rebuild_callback = Some(Box::new(callback));
    }

    /// Hands the latest snapshot to the rebuild callback. Returns false if
    /// there is no callback or no snapshot.
    pub fn rebuild_derived(&mut self) -> bool {
        let (Some(callback), Some(snapshot)) =
            (self.derived_rebuild_callback.as_mut(), self.snapshots.back())
        else {
            return false;
        };
        debug!("WorldState: rebuilding derived state from tick {}", snapshot.tick);
        callback(snapshot);
        true
    }

    // Ownership

    /// Binds `component` to `system` unless another system already claimed it
    pub fn register_ownership(&mut self, system: &str, component: &str) {
        if let Some(owner) = self.component_owners.get(component) {
            if owner != system {
                debug!(
                    "WorldState: {} already owned by {}, ignoring claim by {}",
                    component, owner, system
                );
            }
            return;
        }
        info!("WorldState: {} owns {}", system, component);
        self.component_owners
            .insert(component.to_string(), system.to_string());
    }

    pub fn owns_component(&self, system: &str, component: &str) -> bool {
        self.owner_of(component) == Some(system)
    }

    /// Components owned by `system`, sorted by name
    pub fn owned_components(&self, system: &str) -> Vec<String> {
        self.component_owners
            .iter()
            .filter(|(_, owner)| owner.as_str() == system)
            .map(|(component, _)| component.clone())
            .collect()
    }

    pub fn owner_of(&self, component: &str) -> Option<&str> {
        self.component_owners.get(component).map(String::as_str)
    }

    /// True if `component` is unowned or owned by `system`
    pub fn can_mutate(&self, system: &str, component: &str) -> bool {
        match self.owner_of(component) {
            None => true,
            Some(owner) => owner == system,
        }
    }

    /// Debug-build check that `system` is allowed to mutate `component`
    #[track_caller]
    pub fn assert_can_mutate(&self, system: &str, component: &str) {
        debug_assert!(
            self.can_mutate(system, component),
            "WorldState: {} may not mutate {}, owned by {}",
            system,
            component,
            self.owner_of(component).unwrap_or_default()
        );
    }

    // Tick scope

    /// When enforced, `push_snapshot` outside `begin_tick`/`end_tick` trips a debug assertion
    pub fn set_tick_scope_enforced(&mut self, enforced: bool) {
        self.tick_scope_enforced = enforced;
    }

    pub fn tick_scope_enforced(&self) -> bool {
        self.tick_scope_enforced
    }

    pub fn begin_tick(&mut self) {
        self.in_tick_scope = true;
    }

    pub fn end_tick(&mut self) {
        self.in_tick_scope = false;
    }

    pub fn in_tick_scope(&self) -> bool {
        self.in_tick_scope
    }
}
