//! Ring-based circle packing for the circle diagram.
//!
//! # Responsibility
//! - Size and place a parent's sub-circles and roles on concentric rings.
//!
//! # Invariants
//! - Adjacent items on one ring never touch: the ring radius is at least
//!   `(item_radius + RING_GAP / 2) / sin(PI / n)`.
//! - A ring holding a single item collapses to the parent center.
//! - Coordinates are relative to the parent center.

use crate::hierarchy::circle_tree::{CircleNode, RoleSummary};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use uuid::Uuid;

/// Minimum spacing between neighbours on one ring, in diagram units.
pub const RING_GAP: f64 = 6.0;

const START_ANGLE: f64 = -PI / 2.0;
const CIRCLE_RADIUS_SHARE: f64 = 0.22;
const CIRCLE_RING_SHARE: f64 = 0.58;
const ROLE_ONLY_RADIUS_SHARE: f64 = 0.15;
const ROLE_ONLY_RING_SHARE: f64 = 0.5;
const ROLE_SECONDARY_RADIUS_SHARE: f64 = 0.07;
const ROLE_SECONDARY_RADIUS_MAX: f64 = 18.0;
const ROLE_INNER_RING_SHARE: f64 = 0.22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Circle,
    Role,
}

/// One placed child of a parent circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub kind: LayoutKind,
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub label: String,
    pub color: String,
    pub icon: Option<String>,
}

impl LayoutItem {
    /// Copy shifted by the parent center, for absolute placement.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }
}

/// Lays out `sub_circles` and `roles` inside a container of
/// `container_radius`.
///
/// Circles without their own color inherit `parent_color`; roles always use
/// it. Returns circles first, then roles, each in input order.
pub fn pack_circles(
    container_radius: f64,
    sub_circles: &[CircleNode],
    roles: &[RoleSummary],
    parent_color: &str,
) -> Vec<LayoutItem> {
    let circle_count = sub_circles.len();
    let role_count = roles.len();
    if circle_count == 0 && role_count == 0 {
        return Vec::new();
    }

    let mut items = Vec::with_capacity(circle_count + role_count);

    if circle_count > 0 {
        let radius = sub_circle_radius(container_radius, circle_count);
        let points = place_on_ring(
            circle_count,
            radius,
            container_radius * CIRCLE_RING_SHARE,
            START_ANGLE,
        );
        for (circle, (x, y)) in sub_circles.iter().zip(points) {
            items.push(LayoutItem {
                kind: LayoutKind::Circle,
                id: circle.id,
                x,
                y,
                radius,
                label: circle.name.clone(),
                color: circle
                    .color
                    .clone()
                    .unwrap_or_else(|| parent_color.to_string()),
                icon: circle.icon.clone(),
            });
        }
    }

    if role_count > 0 {
        let radius = role_radius(container_radius, role_count, circle_count > 0);
        let (ring_radius, start_angle) = if circle_count > 0 {
            // Offset by half a circle slot so roles sit between circles.
            let slots = role_count.max(circle_count) as f64;
            (container_radius * ROLE_INNER_RING_SHARE, START_ANGLE + PI / slots)
        } else {
            (container_radius * ROLE_ONLY_RING_SHARE, START_ANGLE)
        };
        let points = place_on_ring(role_count, radius, ring_radius, start_angle);
        for (role, (x, y)) in roles.iter().zip(points) {
            items.push(LayoutItem {
                kind: LayoutKind::Role,
                id: role.id,
                x,
                y,
                radius,
                label: role.name.clone(),
                color: parent_color.to_string(),
                icon: None,
            });
        }
    }

    items
}

/// Evenly spaces `count` items of `item_radius` on a ring, starting at
/// `start_angle` (radians, clockwise in screen coordinates).
///
/// The ring grows beyond `preferred_ring_radius` when needed to keep
/// neighbours [`RING_GAP`] apart.
pub fn place_on_ring(
    count: usize,
    item_radius: f64,
    preferred_ring_radius: f64,
    start_angle: f64,
) -> Vec<(f64, f64)> {
    match count {
        0 => Vec::new(),
        1 => vec![(0.0, 0.0)],
        _ => {
            let ring_radius = preferred_ring_radius.max(min_ring_radius(count, item_radius));
            let step = 2.0 * PI / count as f64;
            (0..count)
                .map(|index| {
                    let angle = start_angle + step * index as f64;
                    (ring_radius * angle.cos(), ring_radius * angle.sin())
                })
                .collect()
        }
    }
}

/// Smallest ring radius keeping `count >= 2` neighbours apart.
pub fn min_ring_radius(count: usize, item_radius: f64) -> f64 {
    (item_radius + RING_GAP / 2.0) / (PI / count as f64).sin()
}

fn sub_circle_radius(container_radius: f64, count: usize) -> f64 {
    (container_radius * CIRCLE_RADIUS_SHARE).min(container_radius / (count as f64 * 0.55 + 1.0))
}

fn role_radius(container_radius: f64, count: usize, with_circles: bool) -> f64 {
    if with_circles {
        ROLE_SECONDARY_RADIUS_MAX.min(container_radius * ROLE_SECONDARY_RADIUS_SHARE)
    } else {
        (container_radius * ROLE_ONLY_RADIUS_SHARE).min(container_radius / (count as f64 * 0.5 + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::{min_ring_radius, place_on_ring, role_radius, sub_circle_radius, RING_GAP};

    fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    #[test]
    fn empty_ring_has_no_points() {
        assert!(place_on_ring(0, 10.0, 50.0, 0.0).is_empty());
    }

    #[test]
    fn single_item_sits_at_center() {
        assert_eq!(place_on_ring(1, 40.0, 120.0, 1.3), vec![(0.0, 0.0)]);
    }

    #[test]
    fn preferred_radius_is_kept_when_large_enough() {
        let points = place_on_ring(4, 5.0, 100.0, 0.0);
        assert!((points[0].0 - 100.0).abs() < 1e-9);
        assert!(points[0].1.abs() < 1e-9);
    }

    #[test]
    fn ring_grows_when_items_would_touch() {
        let count = 12;
        let radius = 20.0;
        let points = place_on_ring(count, radius, 10.0, 0.0);
        let ring = distance(points[0], (0.0, 0.0));
        assert!((ring - min_ring_radius(count, radius)).abs() < 1e-9);
        assert!(distance(points[0], points[1]) >= 2.0 * radius + RING_GAP - 1e-9);
    }

    #[test]
    fn sub_circle_radius_is_clamped_to_share_of_container() {
        assert!((sub_circle_radius(200.0, 1) - 44.0).abs() < 1e-9);
        assert!(sub_circle_radius(200.0, 10) < 44.0);
    }

    #[test]
    fn secondary_roles_are_small() {
        assert_eq!(role_radius(1000.0, 3, true), 18.0);
        assert!((role_radius(100.0, 3, true) - 7.0).abs() < 1e-9);
        assert!((role_radius(100.0, 1, false) - 15.0).abs() < 1e-9);
    }
}
