use std::{any::TypeId, collections::HashMap};

use log::{info, warn};

use crate::TypeTag;

use super::{serializer::ComponentSerializer, Component};

/// Runtime identity of a component type
#[derive(Eq, Hash, Copy, Clone, PartialEq, Debug)]
pub struct ComponentKind {
    type_id: TypeId,
}

impl From<TypeId> for ComponentKind {
    fn from(type_id: TypeId) -> Self {
        Self { type_id }
    }
}

impl ComponentKind {
    pub fn of<C: Component>() -> Self {
        Self::from(TypeId::of::<C>())
    }
}

struct ComponentRegistration {
    tag: TypeTag,
    name: &'static str,
    serializer: Box<dyn ComponentSerializer>,
}

/// Serializer registry mapping component kinds to their stable type tags
pub struct ComponentKinds {
    registrations: HashMap<ComponentKind, ComponentRegistration>,
    tag_map: HashMap<TypeTag, ComponentKind>,
}

impl Default for ComponentKinds {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentKinds {
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            tag_map: HashMap::new(),
        }
    }

    /// Installs `serializer` for `C` under `tag`, replacing any earlier
    /// registration of the same kind.
    pub fn add_component<C: Component>(
        &mut self,
        tag: TypeTag,
        serializer: Box<dyn ComponentSerializer>,
    ) {
        let kind = ComponentKind::of::<C>();
        let name = std::any::type_name::<C>();

        if let Some(previous) = self.registrations.get(&kind) {
            self.tag_map.remove(&previous.tag);
        }
        if let Some(other) = self.tag_map.get(&tag).copied() {
            if other != kind {
                warn!(
                    "ComponentKinds: type tag {} already used by {}, reassigning to {}",
                    tag,
                    self.kind_to_name(&other).unwrap_or("<unknown>"),
                    name
                );
                self.registrations.remove(&other);
            }
        }

        info!("ComponentKinds: Registering Component {} with type tag {}", name, tag);
        self.registrations.insert(
            kind,
            ComponentRegistration {
                tag,
                name,
                serializer,
            },
        );
        self.tag_map.insert(tag, kind);
    }

    pub fn kind_to_tag(&self, kind: &ComponentKind) -> Option<TypeTag> {
        self.registrations.get(kind).map(|registration| registration.tag)
    }

    pub fn tag_to_kind(&self, tag: TypeTag) -> Option<ComponentKind> {
        self.tag_map.get(&tag).copied()
    }

    pub fn kind_to_name(&self, kind: &ComponentKind) -> Option<&'static str> {
        self.registrations.get(kind).map(|registration| registration.name)
    }

    pub fn is_registered(&self, kind: &ComponentKind) -> bool {
        self.registrations.contains_key(kind)
    }

    pub fn serializer(&self, kind: &ComponentKind) -> Option<&dyn ComponentSerializer> {
        self.registrations
            .get(kind)
            .map(|registration| registration.serializer.as_ref())
    }

    pub fn serializer_for_tag(&self, tag: TypeTag) -> Option<(ComponentKind, &dyn ComponentSerializer)> {
        let kind = self.tag_to_kind(tag)?;
        self.serializer(&kind).map(|serializer| (kind, serializer))
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
