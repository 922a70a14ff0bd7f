// ABOUTME: Phantom-typed identifiers for compile-time type safety.
// ABOUTME: Keeps provider deployment ids and tracking-system ids apart.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
pub enum TrackingMarker {}
pub enum ProviderMarker {}
pub enum NodeMarker {}

/// An opaque identifier tagged with the system that issued it.
///
/// A `TrackingId` (assigned by the tracking system when a deployment record is
/// registered) can never be passed where a `ProviderDeploymentId` is expected.
#[must_use = "IDs reference remote records and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual impls so that T needs no bounds.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// Deployment record id assigned by the tracking system.
pub type TrackingId = Id<TrackingMarker>;
/// Deployment id assigned by the hosting provider.
pub type ProviderDeploymentId = Id<ProviderMarker>;
/// Repository or ref node id in the tracking system's graph.
pub type NodeId = Id<NodeMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        let a = TrackingId::new("MDEwOkRlcGxveW1lbnQx");
        let b = TrackingId::new("MDEwOkRlcGxveW1lbnQx".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "MDEwOkRlcGxveW1lbnQx");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ProviderDeploymentId::new("dpl_123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dpl_123\"");

        let back: ProviderDeploymentId = serde_json::from_str("\"dpl_123\"").unwrap();
        assert_eq!(back.into_inner(), "dpl_123");
    }
}
