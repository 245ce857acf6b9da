//! Capability bookkeeping for opaque values.
//!
//! Pure state: the registry answers "may this principal do this to this
//! value" and nothing else. Existence and creator checks belong to the
//! store; authorization of the *granter* belongs to the evaluator.

use std::collections::HashMap;

use veil_types::{CapabilityKind, CapabilityScope, Principal};

/// Tracks Use/Disclose grants per (value, principal) pair.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    grants: HashMap<(u64, Principal, CapabilityKind), CapabilityScope>,
    current_tx: u64,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current transaction counter.
    pub fn current_tx(&self) -> u64 {
        self.current_tx
    }

    /// A scope that expires when the current transaction ends.
    pub fn transaction_scope(&self) -> CapabilityScope {
        CapabilityScope::TransactionScoped {
            tx: self.current_tx,
        }
    }

    /// Record a grant. Idempotent; a persistent grant is never downgraded
    /// by a later transaction-scoped one.
    pub fn grant(
        &mut self,
        value_id: u64,
        principal: Principal,
        kind: CapabilityKind,
        scope: CapabilityScope,
    ) {
        let entry = self
            .grants
            .entry((value_id, principal, kind))
            .or_insert(scope);
        if *entry != CapabilityScope::Persistent {
            *entry = scope;
        }
    }

    /// Remove a grant. No retroactive effect on operations already applied.
    pub fn revoke(&mut self, value_id: u64, principal: Principal, kind: CapabilityKind) {
        self.grants.remove(&(value_id, principal, kind));
    }

    /// Pure query: does a live grant exist?
    pub fn check(&self, value_id: u64, principal: Principal, kind: CapabilityKind) -> bool {
        match self.grants.get(&(value_id, principal, kind)) {
            Some(CapabilityScope::Persistent) => true,
            Some(CapabilityScope::TransactionScoped { tx }) => *tx == self.current_tx,
            None => false,
        }
    }

    /// End the current operation: transaction-scoped grants die here.
    pub fn advance_transaction(&mut self) {
        self.current_tx += 1;
        self.grants
            .retain(|_, scope| matches!(scope, CapabilityScope::Persistent));
    }

    /// Number of live grants on a value, any kind, any principal.
    pub fn live_grant_count(&self, value_id: u64) -> usize {
        self.grants
            .iter()
            .filter(|((vid, _, _), scope)| {
                *vid == value_id
                    && match scope {
                        CapabilityScope::Persistent => true,
                        CapabilityScope::TransactionScoped { tx } => *tx == self.current_tx,
                    }
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Principal = [1u8; 32];
    const BOB: Principal = [2u8; 32];

    #[test]
    fn test_grant_and_check() {
        let mut reg = CapabilityRegistry::new();
        assert!(!reg.check(1, ALICE, CapabilityKind::Use));

        reg.grant(1, ALICE, CapabilityKind::Use, CapabilityScope::Persistent);
        assert!(reg.check(1, ALICE, CapabilityKind::Use));
        assert!(!reg.check(1, ALICE, CapabilityKind::Disclose));
        assert!(!reg.check(1, BOB, CapabilityKind::Use));
    }

    #[test]
    fn test_revoke() {
        let mut reg = CapabilityRegistry::new();
        reg.grant(1, ALICE, CapabilityKind::Use, CapabilityScope::Persistent);
        reg.revoke(1, ALICE, CapabilityKind::Use);
        assert!(!reg.check(1, ALICE, CapabilityKind::Use));
    }

    #[test]
    fn test_transaction_scoped_expiry() {
        let mut reg = CapabilityRegistry::new();
        let scope = reg.transaction_scope();
        reg.grant(1, ALICE, CapabilityKind::Disclose, scope);
        assert!(reg.check(1, ALICE, CapabilityKind::Disclose));

        reg.advance_transaction();
        assert!(!reg.check(1, ALICE, CapabilityKind::Disclose));
    }

    #[test]
    fn test_persistent_survives_transactions() {
        let mut reg = CapabilityRegistry::new();
        reg.grant(1, ALICE, CapabilityKind::Use, CapabilityScope::Persistent);
        reg.advance_transaction();
        reg.advance_transaction();
        assert!(reg.check(1, ALICE, CapabilityKind::Use));
    }

    #[test]
    fn test_persistent_not_downgraded() {
        let mut reg = CapabilityRegistry::new();
        reg.grant(1, ALICE, CapabilityKind::Use, CapabilityScope::Persistent);
        let scope = reg.transaction_scope();
        reg.grant(1, ALICE, CapabilityKind::Use, scope);

        reg.advance_transaction();
        assert!(reg.check(1, ALICE, CapabilityKind::Use));
    }

    #[test]
    fn test_live_grant_count() {
        let mut reg = CapabilityRegistry::new();
        assert_eq!(reg.live_grant_count(1), 0);

        reg.grant(1, ALICE, CapabilityKind::Use, CapabilityScope::Persistent);
        let scope = reg.transaction_scope();
        reg.grant(1, BOB, CapabilityKind::Disclose, scope);
        assert_eq!(reg.live_grant_count(1), 2);

        reg.advance_transaction();
        assert_eq!(reg.live_grant_count(1), 1);
    }
}
