//! Cache key construction.

use crate::models::VesselKind;

pub const BRIDGE: &str = "bridge";
pub const VESSELS: &str = "vessels";

/// `{kind}:{variant}` with the variant normalised.
pub fn resource_key(kind: &str, variant: &str) -> String {
    format!("{}:{}", kind, normalise(variant))
}

/// `{kind}:{variant}:location:{location}` with variant and location normalised.
pub fn location_key(kind: &str, variant: &str, location: &str) -> String {
    format!("{}:location:{}", resource_key(kind, variant), normalise(location))
}

pub fn bridge_lifts() -> String {
    resource_key(BRIDGE, "all")
}

pub fn vessels(kind: VesselKind) -> String {
    resource_key(VESSELS, kind.as_str())
}

pub fn vessels_at(kind: VesselKind, location: &str) -> String {
    location_key(VESSELS, kind.as_str(), location)
}

fn normalise(part: &str) -> String {
    part.trim().to_lowercase()
}
