//! # attest-schema: Schema Registry and Resolver Contract
//!
//! - **Registry** (`registry.rs`): immutable `(definition, resolver,
//!   revocable)` tuples keyed by a deterministic [`SchemaId`](attest_core::SchemaId).
//!   Pure storage and lookup; it never calls a resolver and never moves value.
//!
//! - **Resolver** (`resolver.rs`): the hook contract the engine invokes on
//!   every attestation and revocation under a schema. The engine only ever
//!   sees `dyn Resolver` through a [`ResolverHandle`].
//!
//! - **Resolvers** (`resolvers/`): stock policies. Recipient-, attester-,
//!   value- and data-gated resolvers, expiration and revocation policies,
//!   composites and no-ops.

pub mod registry;
pub mod resolver;
pub mod resolvers;

pub use registry::{RegistryError, Schema, SchemaRegistry};
pub use resolver::{Resolver, ResolverHandle};
