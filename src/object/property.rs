//! Property slots and attribute flags.

use std::collections::HashMap;
use std::rc::Rc;

use crate::admin::accessor::Accessor;
use crate::types::Value;

bitflags::bitflags! {
    /// Property attributes.
    ///
    /// Combine with bitwise OR: `PropertyFlags::ENUMERABLE | PropertyFlags::CONFIGURABLE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        const ENUMERABLE = 1 << 0;
        const CONFIGURABLE = 1 << 1;
        /// Only meaningful for data slots.
        const WRITABLE = 1 << 2;
    }
}

impl PropertyFlags {
    /// Flags of a property created by plain assignment.
    pub const DEFAULT: Self = Self::all();
    /// Flags of an installed observable accessor.
    pub const OBSERVABLE: Self = Self::ENUMERABLE.union(Self::CONFIGURABLE);
    /// Flags of an installed computed accessor. Not enumerable, so iterating
    /// an object never triggers a derivation.
    pub const COMPUTED: Self = Self::CONFIGURABLE;
}

impl Default for PropertyFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What a property slot holds.
#[derive(Clone)]
pub(crate) enum Slot {
    /// Plain stored value.
    Data(Value),
    /// Generic accessor resolved against the object's administration record.
    Accessor(Rc<Accessor>),
}

#[derive(Clone)]
pub(crate) struct Property {
    pub(crate) slot: Slot,
    pub(crate) flags: PropertyFlags,
}

impl Property {
    pub(crate) fn data(value: Value, flags: PropertyFlags) -> Self {
        Self {
            slot: Slot::Data(value),
            flags,
        }
    }

    pub(crate) fn accessor(accessor: Rc<Accessor>, flags: PropertyFlags) -> Self {
        Self {
            slot: Slot::Accessor(accessor),
            flags,
        }
    }

    pub(crate) fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor(_))
    }
}

/// Insertion-ordered property table.
#[derive(Default)]
pub(crate) struct PropertyTable {
    order: Vec<String>,
    by_name: HashMap<String, Property>,
}

impl PropertyTable {
    pub(crate) fn get(&self, name: &str) -> Option<&Property> {
        self.by_name.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.by_name.get_mut(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Insert or replace. Replacing keeps the original position.
    pub(crate) fn insert(&mut self, name: &str, property: Property) {
        if !self.by_name.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.by_name.insert(name.to_string(), property);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Property)> {
        self.order
            .iter()
            .filter_map(|name| self.by_name.get(name).map(|p| (name, p)))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.by_name.values_mut()
    }
}
