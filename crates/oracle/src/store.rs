//! Write-once storage for sealed values.

use std::collections::HashMap;

use veil_types::{OpaqueValue, Principal, SealedCiphertext, TypeTag};

/// A stored opaque value: immutable metadata plus its ciphertext.
#[derive(Debug, Clone)]
pub struct StoredValue {
    pub meta: OpaqueValue,
    pub ciphertext: SealedCiphertext,
}

/// Keyed store of opaque values. Entries are never updated or removed;
/// semantic updates allocate fresh ids.
#[derive(Debug, Default)]
pub struct ValueStore {
    next_id: u64,
    values: HashMap<u64, StoredValue>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Id the next inserted value will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Insert a new value and return its id.
    pub fn insert(
        &mut self,
        creator: Principal,
        tag: TypeTag,
        ciphertext: SealedCiphertext,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.values.insert(
            id,
            StoredValue {
                meta: OpaqueValue { id, tag, creator },
                ciphertext,
            },
        );
        id
    }

    pub fn get(&self, id: u64) -> Option<&StoredValue> {
        self.values.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.values.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
