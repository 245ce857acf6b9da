//! The evaluation context and its fixed operation set.
//!
//! [`Evaluator`] owns the seal key, the value store, and the capability
//! registry, and is the only way opaque values are created or combined.
//! The operation set is closed: arithmetic, comparison, boolean logic, and
//! oblivious selection. There is no operation that turns an opaque value
//! into a host-visible `bool` or integer, so plaintext branching on secret
//! data is unrepresentable outside this module.

use veil_seal::{seal, unseal, verify_binding, SealKey};
use veil_types::{
    CapabilityKind, CapabilityScope, ImportProof, Plaintext, Principal, SealedCiphertext, TypeTag,
};

use crate::error::OracleError;
use crate::registry::CapabilityRegistry;
use crate::store::ValueStore;

type Result<T> = std::result::Result<T, OracleError>;

/// Confidential evaluation context.
pub struct Evaluator {
    key: SealKey,
    store: ValueStore,
    registry: CapabilityRegistry,
}

impl Evaluator {
    pub fn new(key: SealKey) -> Self {
        Self {
            key,
            store: ValueStore::new(),
            registry: CapabilityRegistry::new(),
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// End the current operation; transaction-scoped grants expire.
    pub fn advance_transaction(&mut self) {
        self.registry.advance_transaction();
    }

    /// A scope expiring with the current transaction.
    pub fn transaction_scope(&self) -> CapabilityScope {
        self.registry.transaction_scope()
    }

    // =========================
    // VALUE CREATION
    // =========================

    /// Import an externally sealed value. Fails `InvalidProof` unless the
    /// binding proof certifies the ciphertext belongs to `caller` and the
    /// sealed payload decodes as the declared tag; a malformed value must
    /// never enter the store, where it would poison every later operation
    /// that loads it. On success the caller holds a persistent `Use` grant
    /// on the new value.
    pub fn import_external(
        &mut self,
        caller: Principal,
        ciphertext: SealedCiphertext,
        proof: &ImportProof,
        tag: TypeTag,
    ) -> Result<u64> {
        if !verify_binding(&caller, &ciphertext, proof) {
            return Err(OracleError::InvalidProof);
        }
        let bytes = unseal(&self.key, &ciphertext).map_err(|_| OracleError::InvalidProof)?;
        if Plaintext::from_bytes(tag, &bytes).is_none() {
            return Err(OracleError::InvalidProof);
        }

        let id = self.store.insert(caller, tag, ciphertext);
        self.registry
            .grant(id, caller, CapabilityKind::Use, CapabilityScope::Persistent);
        Ok(id)
    }

    /// Wrap a plaintext as an opaque value with the same envelope as an
    /// imported one. Used for engine-side constants (loop indices, zero).
    /// The creating principal holds a persistent `Use` grant.
    pub fn from_plaintext(&mut self, caller: Principal, value: Plaintext) -> Result<u64> {
        let id = self.insert_sealed(caller, value);
        self.registry
            .grant(id, caller, CapabilityKind::Use, CapabilityScope::Persistent);
        Ok(id)
    }

    // =========================
    // CAPABILITY PROPAGATION
    // =========================

    /// Grant `Use`. Caller-driven: only the creator or a principal that can
    /// already use the value may extend that ability.
    pub fn grant_use(
        &mut self,
        granter: Principal,
        value_id: u64,
        grantee: Principal,
        scope: CapabilityScope,
    ) -> Result<()> {
        self.authorize_granter(granter, value_id)?;
        self.registry
            .grant(value_id, grantee, CapabilityKind::Use, scope);
        Ok(())
    }

    /// Grant `Disclose`. Strictly additive; never implied by `Use`.
    pub fn grant_disclose(
        &mut self,
        granter: Principal,
        value_id: u64,
        grantee: Principal,
        scope: CapabilityScope,
    ) -> Result<()> {
        self.authorize_granter(granter, value_id)?;
        self.registry
            .grant(value_id, grantee, CapabilityKind::Disclose, scope);
        Ok(())
    }

    pub fn revoke(&mut self, value_id: u64, principal: Principal, kind: CapabilityKind) {
        self.registry.revoke(value_id, principal, kind);
    }

    pub fn check(&self, value_id: u64, principal: Principal, kind: CapabilityKind) -> bool {
        self.registry.check(value_id, principal, kind)
    }

    fn authorize_granter(&self, granter: Principal, value_id: u64) -> Result<()> {
        let stored = self
            .store
            .get(value_id)
            .ok_or(OracleError::UnknownValue(value_id))?;
        if stored.meta.creator != granter
            && !self.registry.check(value_id, granter, CapabilityKind::Use)
        {
            return Err(OracleError::NotAuthorized { value_id });
        }
        Ok(())
    }

    // =========================
    // DISCLOSURE EXPORT
    // =========================

    /// Export a value's ciphertext for the decryption service. Requires a
    /// live `Disclose` grant for `principal`; the plaintext never appears
    /// here.
    pub fn disclose_ciphertext(
        &self,
        principal: Principal,
        value_id: u64,
    ) -> Result<(TypeTag, SealedCiphertext)> {
        let stored = self
            .store
            .get(value_id)
            .ok_or(OracleError::UnknownValue(value_id))?;
        if !self
            .registry
            .check(value_id, principal, CapabilityKind::Disclose)
        {
            return Err(OracleError::NotAuthorized { value_id });
        }
        Ok((stored.meta.tag, stored.ciphertext.clone()))
    }

    // =========================
    // ARITHMETIC
    // =========================

    pub fn add(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.numeric_binary(caller, a, b, |x, y, w| wrap(w, x.wrapping_add(y)))
    }

    pub fn sub(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.numeric_binary(caller, a, b, |x, y, w| wrap(w, x.wrapping_sub(y)))
    }

    pub fn mul(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.numeric_binary(caller, a, b, |x, y, w| wrap(w, x.wrapping_mul(y)))
    }

    /// Division. A zero divisor cannot be rejected without branching on
    /// secret data, so the quotient is defined as all-ones at the operand
    /// width (RISC-V semantics). Engine code divides by imported constants
    /// only.
    pub fn div(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.numeric_binary(
            caller,
            a,
            b,
            |x, y, w| if y == 0 { wrap(w, u64::MAX) } else { x / y },
        )
    }

    /// Remainder; a zero divisor yields the dividend (RISC-V semantics).
    pub fn rem(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.numeric_binary(caller, a, b, |x, y, _| if y == 0 { x } else { x % y })
    }

    // =========================
    // COMPARISON
    // =========================

    pub fn eq(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.compare(caller, a, b, |x, y| x == y)
    }

    pub fn ne(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.compare(caller, a, b, |x, y| x != y)
    }

    pub fn lt(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.compare(caller, a, b, |x, y| x < y)
    }

    pub fn le(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.compare(caller, a, b, |x, y| x <= y)
    }

    pub fn gt(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.compare(caller, a, b, |x, y| x > y)
    }

    pub fn ge(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.compare(caller, a, b, |x, y| x >= y)
    }

    // =========================
    // BOOLEAN LOGIC
    // =========================

    pub fn and(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.boolean_binary(caller, a, b, |x, y| x & y)
    }

    pub fn or(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.boolean_binary(caller, a, b, |x, y| x | y)
    }

    pub fn xor(&mut self, caller: Principal, a: u64, b: u64) -> Result<u64> {
        self.boolean_binary(caller, a, b, |x, y| x ^ y)
    }

    pub fn not(&mut self, caller: Principal, a: u64) -> Result<u64> {
        let (tag, va) = self.load_operand(caller, a)?;
        require_tag(TypeTag::Bool, tag)?;
        Ok(self.insert_result(caller, Plaintext::Bool(va == 0)))
    }

    // =========================
    // OBLIVIOUS SELECTION
    // =========================

    /// Choose between two same-typed values by a sealed condition. Both
    /// branches are loaded and combined arithmetically; the selected branch
    /// is never observable from control flow or cost.
    pub fn select(
        &mut self,
        caller: Principal,
        cond: u64,
        if_true: u64,
        if_false: u64,
    ) -> Result<u64> {
        let (cond_tag, c) = self.load_operand(caller, cond)?;
        require_tag(TypeTag::Bool, cond_tag)?;

        let (t_tag, vt) = self.load_operand(caller, if_true)?;
        let (f_tag, vf) = self.load_operand(caller, if_false)?;
        require_tag(t_tag, f_tag)?;

        // c * vt + (1 - c) * vf, evaluated over both branches unconditionally
        let selected = wrap(
            t_tag,
            c.wrapping_mul(vt)
                .wrapping_add((1u64.wrapping_sub(c)).wrapping_mul(vf)),
        );

        Ok(self.insert_result(caller, decode(t_tag, selected)))
    }

    // =========================
    // INTERNALS
    // =========================

    /// Resolve an operand: existence, then `Use` capability, then unseal.
    /// The capability check happens before the ciphertext is touched.
    fn load_operand(&self, caller: Principal, id: u64) -> Result<(TypeTag, u64)> {
        let stored = self.store.get(id).ok_or(OracleError::UnknownValue(id))?;
        if !self.registry.check(id, caller, CapabilityKind::Use) {
            return Err(OracleError::NotAuthorized { value_id: id });
        }

        let bytes = unseal(&self.key, &stored.ciphertext)
            .map_err(|_| OracleError::CorruptValue(id))?;
        let plaintext = Plaintext::from_bytes(stored.meta.tag, &bytes)
            .ok_or(OracleError::CorruptValue(id))?;
        Ok((stored.meta.tag, plaintext.as_u64()))
    }

    /// Store a freshly computed value. The result carries zero capability
    /// grants; the caller is recorded as creator and may grant from there.
    fn insert_result(&mut self, caller: Principal, value: Plaintext) -> u64 {
        self.insert_sealed(caller, value)
    }

    fn insert_sealed(&mut self, creator: Principal, value: Plaintext) -> u64 {
        let nonce = self.derive_nonce(self.store.next_id());
        let ciphertext = seal(&self.key, nonce, &value.to_bytes());
        self.store.insert(creator, value.tag(), ciphertext)
    }

    /// Deterministic per-value nonce; value ids never repeat.
    fn derive_nonce(&self, value_id: u64) -> [u8; 16] {
        let mut material = Vec::with_capacity(32 + 8);
        material.extend_from_slice(self.key.as_bytes());
        material.extend_from_slice(&value_id.to_le_bytes());
        let digest = veil_types::sha256(&material);
        let mut nonce = [0u8; 16];
        nonce.copy_from_slice(&digest[..16]);
        nonce
    }

    fn numeric_binary(
        &mut self,
        caller: Principal,
        a: u64,
        b: u64,
        op: fn(u64, u64, TypeTag) -> u64,
    ) -> Result<u64> {
        let (tag, va, vb) = self.load_numeric_pair(caller, a, b)?;
        Ok(self.insert_result(caller, decode(tag, op(va, vb, tag))))
    }

    fn compare(
        &mut self,
        caller: Principal,
        a: u64,
        b: u64,
        op: fn(u64, u64) -> bool,
    ) -> Result<u64> {
        let (_, va, vb) = self.load_numeric_pair(caller, a, b)?;
        Ok(self.insert_result(caller, Plaintext::Bool(op(va, vb))))
    }

    fn boolean_binary(
        &mut self,
        caller: Principal,
        a: u64,
        b: u64,
        op: fn(u64, u64) -> u64,
    ) -> Result<u64> {
        let (a_tag, va) = self.load_operand(caller, a)?;
        require_tag(TypeTag::Bool, a_tag)?;
        let (b_tag, vb) = self.load_operand(caller, b)?;
        require_tag(TypeTag::Bool, b_tag)?;
        Ok(self.insert_result(caller, Plaintext::Bool(op(va, vb) & 1 == 1)))
    }

    fn load_numeric_pair(
        &self,
        caller: Principal,
        a: u64,
        b: u64,
    ) -> Result<(TypeTag, u64, u64)> {
        let (a_tag, va) = self.load_operand(caller, a)?;
        if !a_tag.is_numeric() {
            return Err(OracleError::TypeMismatch {
                expected: TypeTag::Uint32,
                got: a_tag,
            });
        }
        let (b_tag, vb) = self.load_operand(caller, b)?;
        require_tag(a_tag, b_tag)?;
        Ok((a_tag, va, vb))
    }
}

fn require_tag(expected: TypeTag, got: TypeTag) -> Result<()> {
    if expected != got {
        return Err(OracleError::TypeMismatch { expected, got });
    }
    Ok(())
}

/// Truncate to the tag's width.
fn wrap(tag: TypeTag, v: u64) -> u64 {
    match tag {
        TypeTag::Bool => v & 1,
        TypeTag::Uint32 => v & 0xFFFF_FFFF,
        TypeTag::Uint64 => v,
    }
}

fn decode(tag: TypeTag, v: u64) -> Plaintext {
    match tag {
        TypeTag::Bool => Plaintext::Bool(v & 1 == 1),
        TypeTag::Uint32 => Plaintext::Uint32(v as u32),
        TypeTag::Uint64 => Plaintext::Uint64(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_seal::prove_binding;

    const ENGINE: Principal = [0xEE; 32];
    const ALICE: Principal = [1u8; 32];
    const BOB: Principal = [2u8; 32];

    fn evaluator() -> Evaluator {
        Evaluator::new(SealKey::from_bytes([42u8; 32]))
    }

    /// Decrypt a value directly with the backend key; test-only shortcut
    /// around the disclosure protocol.
    fn peek(ev: &Evaluator, id: u64) -> Plaintext {
        let stored = ev.store().get(id).unwrap();
        let bytes = unseal(&SealKey::from_bytes([42u8; 32]), &stored.ciphertext).unwrap();
        Plaintext::from_bytes(stored.meta.tag, &bytes).unwrap()
    }

    fn num(ev: &mut Evaluator, owner: Principal, v: u32) -> u64 {
        ev.from_plaintext(owner, Plaintext::Uint32(v)).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 30);
        let b = num(&mut ev, ENGINE, 7);

        let sum = ev.add(ENGINE, a, b).unwrap();
        ev.grant_use(ENGINE, sum, ENGINE, CapabilityScope::Persistent)
            .unwrap();
        assert_eq!(peek(&ev, sum), Plaintext::Uint32(37));

        let quotient = ev.div(ENGINE, a, b).unwrap();
        assert_eq!(peek(&ev, quotient), Plaintext::Uint32(4));

        let remainder = ev.rem(ENGINE, a, b).unwrap();
        assert_eq!(peek(&ev, remainder), Plaintext::Uint32(2));
    }

    #[test]
    fn test_uint32_wrapping() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, u32::MAX);
        let b = num(&mut ev, ENGINE, 2);

        let sum = ev.add(ENGINE, a, b).unwrap();
        assert_eq!(peek(&ev, sum), Plaintext::Uint32(1));

        let diff = ev.sub(ENGINE, b, a).unwrap();
        assert_eq!(peek(&ev, diff), Plaintext::Uint32(3));
    }

    #[test]
    fn test_division_by_zero_semantics() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 123);
        let zero = num(&mut ev, ENGINE, 0);

        let quotient = ev.div(ENGINE, a, zero).unwrap();
        assert_eq!(peek(&ev, quotient), Plaintext::Uint32(u32::MAX));

        let remainder = ev.rem(ENGINE, a, zero).unwrap();
        assert_eq!(peek(&ev, remainder), Plaintext::Uint32(123));
    }

    #[test]
    fn test_comparisons_produce_sealed_bool() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 10);
        let b = num(&mut ev, ENGINE, 20);

        let lt = ev.lt(ENGINE, a, b).unwrap();
        assert_eq!(ev.store().get(lt).unwrap().meta.tag, TypeTag::Bool);
        assert_eq!(peek(&ev, lt), Plaintext::Bool(true));

        let gt = ev.gt(ENGINE, a, b).unwrap();
        assert_eq!(peek(&ev, gt), Plaintext::Bool(false));

        // strict gt: equal operands compare false
        let c = num(&mut ev, ENGINE, 10);
        let eq_gt = ev.gt(ENGINE, a, c).unwrap();
        assert_eq!(peek(&ev, eq_gt), Plaintext::Bool(false));
    }

    #[test]
    fn test_boolean_logic() {
        let mut ev = evaluator();
        let t = ev.from_plaintext(ENGINE, Plaintext::Bool(true)).unwrap();
        let f = ev.from_plaintext(ENGINE, Plaintext::Bool(false)).unwrap();

        let and = ev.and(ENGINE, t, f).unwrap();
        let or = ev.or(ENGINE, t, f).unwrap();
        let xor = ev.xor(ENGINE, t, t).unwrap();
        let not = ev.not(ENGINE, f).unwrap();

        assert_eq!(peek(&ev, and), Plaintext::Bool(false));
        assert_eq!(peek(&ev, or), Plaintext::Bool(true));
        assert_eq!(peek(&ev, xor), Plaintext::Bool(false));
        assert_eq!(peek(&ev, not), Plaintext::Bool(true));
    }

    #[test]
    fn test_select() {
        let mut ev = evaluator();
        let cond = ev.from_plaintext(ENGINE, Plaintext::Bool(true)).unwrap();
        let a = num(&mut ev, ENGINE, 111);
        let b = num(&mut ev, ENGINE, 222);

        let chosen = ev.select(ENGINE, cond, a, b).unwrap();
        assert_eq!(peek(&ev, chosen), Plaintext::Uint32(111));

        let neg = ev.not(ENGINE, cond).unwrap();
        ev.grant_use(ENGINE, neg, ENGINE, CapabilityScope::Persistent)
            .unwrap();
        let other = ev.select(ENGINE, neg, a, b).unwrap();
        assert_eq!(peek(&ev, other), Plaintext::Uint32(222));
    }

    #[test]
    fn test_select_requires_bool_condition() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 1);
        let b = num(&mut ev, ENGINE, 2);

        assert_eq!(
            ev.select(ENGINE, a, a, b),
            Err(OracleError::TypeMismatch {
                expected: TypeTag::Bool,
                got: TypeTag::Uint32,
            })
        );
    }

    #[test]
    fn test_type_mismatch_across_widths() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 1);
        let b = ev.from_plaintext(ENGINE, Plaintext::Uint64(2)).unwrap();

        assert_eq!(
            ev.add(ENGINE, a, b),
            Err(OracleError::TypeMismatch {
                expected: TypeTag::Uint32,
                got: TypeTag::Uint64,
            })
        );
    }

    #[test]
    fn test_operand_requires_use_capability() {
        let mut ev = evaluator();
        let a = num(&mut ev, ALICE, 100);
        let b = num(&mut ev, BOB, 50);

        // Bob holds no Use on Alice's value
        assert_eq!(
            ev.gt(BOB, a, b),
            Err(OracleError::NotAuthorized { value_id: a })
        );

        // After Alice grants him Use, the same call succeeds
        ev.grant_use(ALICE, a, BOB, CapabilityScope::Persistent)
            .unwrap();
        assert!(ev.gt(BOB, a, b).is_ok());
    }

    #[test]
    fn test_results_have_zero_capabilities() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 1);
        let b = num(&mut ev, ENGINE, 2);

        let sum = ev.add(ENGINE, a, b).unwrap();
        assert_eq!(ev.registry().live_grant_count(sum), 0);
        assert!(!ev.check(sum, ENGINE, CapabilityKind::Use));

        // even the creator must self-grant before reusing the result
        assert_eq!(
            ev.add(ENGINE, sum, a),
            Err(OracleError::NotAuthorized { value_id: sum })
        );
        ev.grant_use(ENGINE, sum, ENGINE, CapabilityScope::Persistent)
            .unwrap();
        assert!(ev.add(ENGINE, sum, a).is_ok());
    }

    #[test]
    fn test_grant_requires_authority() {
        let mut ev = evaluator();
        let a = num(&mut ev, ALICE, 5);

        // Bob can neither use nor grant Alice's value
        assert_eq!(
            ev.grant_use(BOB, a, BOB, CapabilityScope::Persistent),
            Err(OracleError::NotAuthorized { value_id: a })
        );
    }

    #[test]
    fn test_revocation_not_retroactive() {
        let mut ev = evaluator();
        let a = num(&mut ev, ALICE, 5);
        let b = num(&mut ev, ALICE, 6);

        let sum = ev.add(ALICE, a, b).unwrap();
        ev.revoke(a, ALICE, CapabilityKind::Use);

        // the already-produced result stands; new operations on `a` fail
        assert!(ev.store().contains(sum));
        assert_eq!(
            ev.add(ALICE, a, b),
            Err(OracleError::NotAuthorized { value_id: a })
        );
    }

    #[test]
    fn test_unknown_value() {
        let mut ev = evaluator();
        let a = num(&mut ev, ENGINE, 1);
        assert_eq!(ev.add(ENGINE, a, 999), Err(OracleError::UnknownValue(999)));
    }

    #[test]
    fn test_import_external_binding() {
        let mut ev = evaluator();
        let ct = seal(&SealKey::from_bytes([42u8; 32]), [3u8; 16], &Plaintext::Uint32(77).to_bytes());
        let proof = prove_binding(&ALICE, &ct);

        // proof bound to Alice rejects Bob
        assert_eq!(
            ev.import_external(BOB, ct.clone(), &proof, TypeTag::Uint32),
            Err(OracleError::InvalidProof)
        );

        let id = ev.import_external(ALICE, ct, &proof, TypeTag::Uint32).unwrap();
        assert!(ev.check(id, ALICE, CapabilityKind::Use));
        assert_eq!(peek(&ev, id), Plaintext::Uint32(77));
    }

    #[test]
    fn test_import_rejects_malformed_payload() {
        let mut ev = evaluator();
        let key = SealKey::from_bytes([42u8; 32]);

        // three bytes do not decode as any Uint32
        let ct = seal(&key, [4u8; 16], &[1, 2, 3]);
        let proof = prove_binding(&ALICE, &ct);
        assert_eq!(
            ev.import_external(ALICE, ct, &proof, TypeTag::Uint32),
            Err(OracleError::InvalidProof)
        );

        // a valid Bool encoding still fails when declared as Uint32
        let ct = seal(&key, [5u8; 16], &Plaintext::Bool(true).to_bytes());
        let proof = prove_binding(&ALICE, &ct);
        assert_eq!(
            ev.import_external(ALICE, ct, &proof, TypeTag::Uint32),
            Err(OracleError::InvalidProof)
        );

        assert!(ev.store().is_empty());
    }

    #[test]
    fn test_disclose_requires_disclose_capability() {
        let mut ev = evaluator();
        let a = num(&mut ev, ALICE, 9);

        // Use alone does not imply Disclose, even for the creator
        assert_eq!(
            ev.disclose_ciphertext(ALICE, a),
            Err(OracleError::NotAuthorized { value_id: a })
        );

        ev.grant_disclose(ALICE, a, BOB, CapabilityScope::Persistent)
            .unwrap();
        let (tag, _) = ev.disclose_ciphertext(BOB, a).unwrap();
        assert_eq!(tag, TypeTag::Uint32);
    }

    #[test]
    fn test_transaction_scoped_use_expires() {
        let mut ev = evaluator();
        let a = num(&mut ev, ALICE, 1);
        let b = num(&mut ev, ALICE, 2);
        let sum = ev.add(ALICE, a, b).unwrap();

        let scope = ev.transaction_scope();
        ev.grant_use(ALICE, sum, ALICE, scope).unwrap();
        assert!(ev.add(ALICE, sum, a).is_ok());

        ev.advance_transaction();
        assert_eq!(
            ev.add(ALICE, sum, a),
            Err(OracleError::NotAuthorized { value_id: sum })
        );
    }
}
