use std::{any::Any, marker::PhantomData};

use lockstep_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use super::Component;

pub type ComponentBox = Box<dyn Any + Send + Sync>;

/// The {serialize, deserialize} capability pair registered for one component kind
pub trait ComponentSerializer: Send + Sync {
    /// Returns `None` if `component` is not the kind this serializer handles
    fn serialize(&self, component: &dyn Any) -> Option<Vec<u8>>;
    fn deserialize(&self, bytes: &[u8]) -> Result<ComponentBox, SerdeErr>;
}

/// Serializer for any component implementing `Serde`
pub struct SerdeSerializer<C> {
    phantom: PhantomData<fn() -> C>,
}

impl<C> SerdeSerializer<C> {
    pub fn new() -> Self {
        Self {
            phantom: PhantomData,
        }
    }
}

impl<C> Default for SerdeSerializer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component + Serde> ComponentSerializer for SerdeSerializer<C> {
    fn serialize(&self, component: &dyn Any) -> Option<Vec<u8>> {
        let component = component.downcast_ref::<C>()?;
        let mut writer = ByteWriter::with_capacity(component.byte_length() as usize);
        component.ser(&mut writer);
        Some(writer.to_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<ComponentBox, SerdeErr> {
        let mut reader = ByteReader::new(bytes);
        let component = C::de(&mut reader)?;
        // A component's byte length is exact: leftovers mean the peer encoded a different layout
        if !reader.is_empty() {
            return Err(SerdeErr::InvalidValue {
                type_name: std::any::type_name::<C>(),
            });
        }
        Ok(Box::new(component))
    }
}

/// Serializer built from a plain function pair, for components that cannot implement `Serde`
pub struct FnSerializer<C> {
    ser_fn: fn(&C) -> Vec<u8>,
    de_fn: fn(&[u8]) -> Option<C>,
}

impl<C> FnSerializer<C> {
    pub fn new(ser_fn: fn(&C) -> Vec<u8>, de_fn: fn(&[u8]) -> Option<C>) -> Self {
        Self { ser_fn, de_fn }
    }
}

impl<C: Component> ComponentSerializer for FnSerializer<C> {
    fn serialize(&self, component: &dyn Any) -> Option<Vec<u8>> {
        component.downcast_ref::<C>().map(self.ser_fn)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<ComponentBox, SerdeErr> {
        let component = (self.de_fn)(bytes).ok_or(SerdeErr::InvalidValue {
            type_name: std::any::type_name::<C>(),
        })?;
        Ok(Box::new(component))
    }
}
