#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives shared by the locator, the gap scanner, and the
//! desert layers.
//!
//! - [`distance`]: haversine distance and latitude-corrected offsets.
//! - [`placement`]: golden-angle spiral placement of facilities that
//!   share a nominal coordinate.
//! - [`index`]: an R-tree answering nearest-facility queries.
//! - [`grid`]: fixed-step lattices over a bounding box and the
//!   nearest-facility distance field evaluated over them.

pub mod distance;
pub mod grid;
pub mod index;
pub mod placement;

pub use distance::{EARTH_RADIUS_KM, KM_PER_DEGREE, distance_km, offset_by_degrees, offset_by_km};
pub use grid::{DistanceField, FieldCell, GridError, GridSpec};
pub use index::{Nearest, NearestIndex};
pub use placement::{GOLDEN_ANGLE, PlacementGroup, max_radius_deg, place_within_group};
