use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::{Field, Value};

/// Schema-shaped result of a projection: one slot per declared field, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedObject {
    slots: Vec<(String, Field<Value>)>,
}

impl ProjectedObject {
    pub fn new(slots: Vec<(String, Field<Value>)>) -> Self {
        Self { slots }
    }

    pub fn get(&self, name: &str) -> Option<&Field<Value>> {
        self.slots
            .iter()
            .find(|(slot_name, _)| slot_name == name)
            .map(|(_, slot)| slot)
    }

    pub fn slots(&self) -> &[(String, Field<Value>)] {
        &self.slots
    }

    /// Names of every non-absent slot, in declaration order
    pub fn present_fields(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_present())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Serialize for ProjectedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.slots.iter().filter(|(_, slot)| slot.is_present());
        let mut map = serializer.serialize_map(None)?;
        for (name, slot) in present {
            map.serialize_entry(name, slot)?;
        }
        map.end()
    }
}
