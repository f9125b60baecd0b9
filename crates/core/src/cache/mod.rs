mod error;
mod keys;
mod patterns;
mod serialization;
mod topology;
mod traits;

pub use error::{CacheError, Result, StoreError, StoreResult};
pub use keys::{
    collection_key, collection_pattern, compose_key, discriminated_entity_key, entity_key,
    lookup_key, resource_pattern, scoped_collection_pattern, KeyFragment, KeyOp, KEY_SEPARATOR,
};
pub use patterns::{is_pattern, pattern_matches};
pub use serialization::{deserialize_value, serialize_value, SerializationError};
pub use topology::{
    rule_for, CrossEdge, EntityRule, Invalidation, InvalidationPlan, InvalidationRequest,
    WriteOp, TOPOLOGY,
};
pub use traits::KeyValueStore;
