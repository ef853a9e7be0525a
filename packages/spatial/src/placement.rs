//! Golden-angle spiral placement.
//!
//! Many facilities resolve to the same nominal coordinate (every clinic
//! geocoded to "Accra" lands on the city centroid). Placement spreads the
//! members of such a group over a disk with a Fermat spiral: member `i` of
//! `n` sits at radius `max_radius(n) * sqrt(i / n)` and angle
//! `i * GOLDEN_ANGLE`. The result depends only on `(i, n, nominal)`, so
//! every query that places the same snapshot agrees on where each facility
//! is drawn.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use care_map_geography_models::LatLng;

use crate::distance::offset_by_degrees;

/// `pi * (3 - sqrt(5))`, about 137.508 degrees.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Spread radius in degrees for a group of `group_size` members.
///
/// Monotone in the group size and capped at 0.09 degrees (about 10 km).
#[must_use]
pub const fn max_radius_deg(group_size: usize) -> f64 {
    match group_size {
        0..=5 => 0.01,
        6..=20 => 0.025,
        21..=50 => 0.045,
        51..=100 => 0.065,
        _ => 0.09,
    }
}

/// Placed coordinate of member `index` in a group of `group_size`.
///
/// Groups of one (or zero) are left at the nominal coordinate. For larger
/// groups the radius grows strictly with `index`, so no two members of a
/// group share a coordinate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn place_within_group(index: usize, group_size: usize, nominal: LatLng) -> LatLng {
    if group_size <= 1 {
        return nominal;
    }
    let radius = max_radius_deg(group_size) * (index as f64 / group_size as f64).sqrt();
    let theta = index as f64 * GOLDEN_ANGLE;
    offset_by_degrees(nominal, radius, theta)
}

/// Items sharing one nominal coordinate, in placement order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementGroup {
    /// The shared pre-placement coordinate.
    pub nominal: LatLng,
    /// Indices into the caller's item slice, in placement order.
    pub members: Vec<usize>,
}

impl PlacementGroup {
    /// Spread radius budget for this group in degrees.
    #[must_use]
    pub const fn radius_budget_deg(&self) -> f64 {
        max_radius_deg(self.members.len())
    }

    /// Groups `nominals` by bit-exact coordinate.
    ///
    /// Members of each group are sorted with `order` (which receives
    /// indices into `nominals`); ties fall back to the index itself.
    /// Groups are returned in coordinate order.
    pub fn group<F>(nominals: &[LatLng], mut order: F) -> Vec<Self>
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        let mut groups: BTreeMap<(u64, u64), Vec<usize>> = BTreeMap::new();
        for (index, nominal) in nominals.iter().enumerate() {
            groups.entry(nominal.bits_key()).or_default().push(index);
        }

        let mut result: Vec<Self> = groups
            .into_values()
            .map(|mut members| {
                members.sort_by(|&a, &b| order(a, b).then_with(|| a.cmp(&b)));
                Self {
                    nominal: nominals[members[0]],
                    members,
                }
            })
            .collect();
        result.sort_by(|a, b| a.nominal.total_cmp(&b.nominal));
        result
    }

    /// Places every item of `nominals`, returning placed coordinates in
    /// the same order as the input.
    pub fn place_all<F>(nominals: &[LatLng], order: F) -> Vec<LatLng>
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        let mut placed = nominals.to_vec();
        for group in Self::group(nominals, order) {
            let size = group.members.len();
            for (position, &member) in group.members.iter().enumerate() {
                placed[member] = place_within_group(position, size, group.nominal);
            }
        }
        placed
    }
}
