//! # Schema Registry
//!
//! Stores immutable schema tuples keyed by a deterministic id:
//!
//! ```text
//! SchemaId = SHA-256( JCS{ "definition", "resolver", "revocable" } )
//! ```
//!
//! where `resolver` is the bound resolver's address or `null`. The same
//! tuple always yields the same id, so a second registration of it is
//! rejected with [`RegistryError::AlreadyExists`] instead of creating a
//! second entry.
//!
//! Schemas are never mutated or deleted, and the resolver binding is fixed
//! for the schema's lifetime.

use std::collections::BTreeMap;
use std::sync::Arc;

use attest_core::{sha256_digest, Address, CanonicalBytes, CanonicalizationError, SchemaId};
use serde::Serialize;
use thiserror::Error;

use crate::resolver::{Resolver, ResolverHandle};

/// Errors from schema registration and lookup.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The exact (definition, resolver, revocable) tuple is already registered.
    #[error("schema {0} already exists")]
    AlreadyExists(SchemaId),

    /// No schema with this id.
    #[error("schema {0} not found")]
    NotFound(SchemaId),

    /// The definition is unusable.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Id derivation failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// A registered schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Deterministic identifier.
    pub id: SchemaId,
    /// Claim definition, e.g. `bytes32 eventId,uint8 ticketType`. Opaque to
    /// the registry.
    pub definition: String,
    /// Bound resolver, if any.
    pub resolver: Option<ResolverHandle>,
    /// Whether attestations under this schema may be revoked.
    pub revocable: bool,
}

#[derive(Serialize)]
struct SchemaPreimage<'a> {
    definition: &'a str,
    resolver: Option<Address>,
    revocable: bool,
}

/// In-memory schema table.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<SchemaId, Schema>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the id a tuple would be registered under.
    pub fn schema_id(
        definition: &str,
        resolver: Option<Address>,
        revocable: bool,
    ) -> Result<SchemaId, RegistryError> {
        let preimage = SchemaPreimage {
            definition,
            resolver,
            revocable,
        };
        let canonical = CanonicalBytes::new(&preimage)?;
        Ok(sha256_digest(&canonical).into())
    }

    /// Register a schema and return its id.
    ///
    /// # Errors
    ///
    /// - `InvalidSchema` if the definition is empty or whitespace.
    /// - `AlreadyExists` if the identical tuple is already registered.
    pub fn register(
        &mut self,
        definition: impl Into<String>,
        resolver: Option<Arc<dyn Resolver>>,
        revocable: bool,
    ) -> Result<SchemaId, RegistryError> {
        let definition = definition.into();
        if definition.trim().is_empty() {
            return Err(RegistryError::InvalidSchema(
                "definition must not be empty".to_string(),
            ));
        }

        let resolver = resolver.map(ResolverHandle::new);
        let id = Self::schema_id(
            &definition,
            resolver.as_ref().map(ResolverHandle::address),
            revocable,
        )?;
        if self.schemas.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }

        tracing::debug!(schema = %id, %definition, revocable, "registered schema");
        self.schemas.insert(
            id,
            Schema {
                id,
                definition,
                resolver,
                revocable,
            },
        );
        Ok(id)
    }

    /// Look up a schema.
    pub fn get(&self, id: &SchemaId) -> Result<&Schema, RegistryError> {
        self.schemas.get(id).ok_or(RegistryError::NotFound(*id))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &SchemaId) -> bool {
        self.schemas.contains_key(id)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schema is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Iterate schemas in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::{NoopResolver, RecipientResolver};

    const DEFINITION: &str = "bytes32 eventId,uint8 ticketType,uint32 ticketNum";

    #[test]
    fn register_then_get() {
        let mut reg = SchemaRegistry::new();
        let id = reg.register(DEFINITION, None, true).unwrap();
        let schema = reg.get(&id).unwrap();
        assert_eq!(schema.definition, DEFINITION);
        assert!(schema.revocable);
        assert!(schema.resolver.is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = SchemaRegistry::new();
        let id = reg.register(DEFINITION, None, true).unwrap();
        match reg.register(DEFINITION, None, true) {
            Err(RegistryError::AlreadyExists(dup)) => assert_eq!(dup, id),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn each_tuple_component_changes_the_id() {
        let resolver: Arc<dyn Resolver> = Arc::new(NoopResolver::new(Address([9; 20])));
        let mut reg = SchemaRegistry::new();
        let plain = reg.register(DEFINITION, None, true).unwrap();
        let irrevocable = reg.register(DEFINITION, None, false).unwrap();
        let resolved = reg.register(DEFINITION, Some(resolver), true).unwrap();
        let other = reg.register("bool flag", None, true).unwrap();
        let ids = [plain, irrevocable, resolved, other];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn id_is_deterministic_and_matches_registration() {
        let target = Address([5; 20]);
        let resolver: Arc<dyn Resolver> = Arc::new(RecipientResolver::new(Address([7; 20]), target));
        let expected = SchemaRegistry::schema_id(DEFINITION, Some(Address([7; 20])), true).unwrap();
        let mut reg = SchemaRegistry::new();
        let id = reg.register(DEFINITION, Some(resolver), true).unwrap();
        assert_eq!(id, expected);
    }

    #[test]
    fn same_resolver_address_counts_as_duplicate() {
        let mut reg = SchemaRegistry::new();
        let a: Arc<dyn Resolver> = Arc::new(NoopResolver::new(Address([3; 20])));
        let b: Arc<dyn Resolver> = Arc::new(NoopResolver::new(Address([3; 20])));
        reg.register(DEFINITION, Some(a), true).unwrap();
        assert!(matches!(
            reg.register(DEFINITION, Some(b), true),
            Err(RegistryError::AlreadyExists(_))
        ));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let reg = SchemaRegistry::new();
        assert!(matches!(
            reg.get(&SchemaId([0; 32])),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn blank_definition_is_invalid() {
        let mut reg = SchemaRegistry::new();
        assert!(matches!(
            reg.register("   ", None, true),
            Err(RegistryError::InvalidSchema(_))
        ));
        assert!(reg.is_empty());
    }
}
