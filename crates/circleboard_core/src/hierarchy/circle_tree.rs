//! Circle tree builder.
//!
//! # Responsibility
//! - Turn flat circle rows (parent pointer) and role rows (circle pointer)
//!   into one rooted tree of [`CircleNode`]s.
//!
//! # Invariants
//! - Children are resolved by index lookup, never by following live
//!   references.
//! - Each circle appears at most once in the output, so malformed parent
//!   chains (cycles) terminate instead of recursing forever.
//! - Child and role order follows input order.

use crate::model::circle::{Circle, CircleId, Role, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Flat circle input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleRecord {
    pub id: CircleId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_circle_id: Option<CircleId>,
}

/// Nested circle reference as delivered by joined queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleRef {
    pub id: CircleId,
}

/// Flat role input row.
///
/// Callers deliver the owning circle either as a denormalized foreign key
/// (`circle_id`) or as a nested object (`circle`); both are honored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub circle_id: Option<CircleId>,
    #[serde(default)]
    pub circle: Option<CircleRef>,
}

impl RoleRecord {
    /// Circle ids this role claims, without duplicates.
    fn owner_ids(&self) -> impl Iterator<Item = CircleId> {
        let direct = self.circle_id;
        let nested = self.circle.map(|circle| circle.id).filter(|id| Some(*id) != direct);
        direct.into_iter().chain(nested)
    }
}

/// Role summary carried by a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: String,
}

/// One circle with its direct roles and sub-circles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleNode {
    pub id: CircleId,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub children: Vec<CircleNode>,
    pub roles: Vec<RoleSummary>,
}

impl CircleNode {
    /// Number of circles in this subtree, including `self`.
    pub fn circle_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CircleNode::circle_count)
            .sum::<usize>()
    }

    /// Depth-first search for one circle in this subtree.
    pub fn find(&self, id: CircleId) -> Option<&CircleNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Nodes from `self` down to the circle with `id`, both inclusive.
    ///
    /// Empty when `id` is not in this subtree. Used for drill-down
    /// breadcrumbs.
    pub fn path_to(&self, id: CircleId) -> Vec<&CircleNode> {
        if self.id == id {
            return vec![self];
        }
        for child in &self.children {
            let mut path = child.path_to(id);
            if !path.is_empty() {
                path.insert(0, self);
                return path;
            }
        }
        Vec::new()
    }
}

/// Builds the circle tree rooted at the first circle without a parent.
///
/// Returns `None` when no root exists; callers treat that as "nothing to
/// render". Circles unreachable from the root are left out.
pub fn build_circle_tree(circles: &[CircleRecord], roles: &[RoleRecord]) -> Option<CircleNode> {
    let root = circles
        .iter()
        .find(|circle| circle.parent_circle_id.is_none())?;

    let mut children_by_parent: HashMap<CircleId, Vec<&CircleRecord>> = HashMap::new();
    for circle in circles {
        if let Some(parent_id) = circle.parent_circle_id {
            children_by_parent.entry(parent_id).or_default().push(circle);
        }
    }

    let mut roles_by_circle: HashMap<CircleId, Vec<RoleSummary>> = HashMap::new();
    for role in roles {
        for circle_id in role.owner_ids() {
            roles_by_circle.entry(circle_id).or_default().push(RoleSummary {
                id: role.id,
                name: role.name.clone(),
            });
        }
    }

    let index = TreeIndex {
        children_by_parent,
        roles_by_circle,
    };
    let mut visited = HashSet::new();
    Some(index.build_node(root, &mut visited))
}

struct TreeIndex<'a> {
    children_by_parent: HashMap<CircleId, Vec<&'a CircleRecord>>,
    roles_by_circle: HashMap<CircleId, Vec<RoleSummary>>,
}

impl TreeIndex<'_> {
    fn build_node(&self, record: &CircleRecord, visited: &mut HashSet<CircleId>) -> CircleNode {
        visited.insert(record.id);

        let mut children = Vec::new();
        if let Some(child_records) = self.children_by_parent.get(&record.id) {
            for child in child_records {
                if visited.contains(&child.id) {
                    continue;
                }
                children.push(self.build_node(child, visited));
            }
        }

        CircleNode {
            id: record.id,
            name: record.name.clone(),
            color: record.color.clone(),
            icon: record.icon.clone(),
            children,
            roles: self
                .roles_by_circle
                .get(&record.id)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl From<&Circle> for CircleRecord {
    fn from(circle: &Circle) -> Self {
        Self {
            id: circle.uuid,
            name: circle.name.clone(),
            color: circle.color.clone(),
            icon: circle.icon.clone(),
            parent_circle_id: circle.parent_circle_uuid,
        }
    }
}

impl From<&Role> for RoleRecord {
    fn from(role: &Role) -> Self {
        Self {
            id: role.uuid,
            name: role.name.clone(),
            circle_id: Some(role.circle_uuid),
            circle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_circle_tree, CircleRecord, CircleRef, RoleRecord};
    use uuid::Uuid;

    fn circle(name: &str, parent: Option<Uuid>) -> CircleRecord {
        CircleRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: None,
            icon: None,
            parent_circle_id: parent,
        }
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(build_circle_tree(&[], &[]).is_none());
    }

    #[test]
    fn all_circles_with_parents_has_no_root() {
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let mut a = circle("A", Some(b_id));
        a.id = a_id;
        let mut b = circle("B", Some(a_id));
        b.id = b_id;
        assert!(build_circle_tree(&[a, b], &[]).is_none());
    }

    #[test]
    fn cycle_below_root_terminates() {
        let root = circle("Root", None);
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let mut a = circle("A", Some(root.id));
        a.id = a_id;
        let mut b = circle("B", Some(a_id));
        b.id = b_id;
        // A second row claims A as child of B, closing a loop A -> B -> A.
        let mut a_again = circle("A'", Some(b_id));
        a_again.id = a_id;

        let tree = build_circle_tree(&[root, a, b, a_again], &[]).expect("root exists");
        assert_eq!(tree.circle_count(), 3);
    }

    #[test]
    fn role_with_both_owner_forms_is_attached_once() {
        let root = circle("Root", None);
        let role = RoleRecord {
            id: Uuid::new_v4(),
            name: "Kasse".to_string(),
            circle_id: Some(root.id),
            circle: Some(CircleRef { id: root.id }),
        };
        let tree = build_circle_tree(&[root], &[role]).expect("root exists");
        assert_eq!(tree.roles.len(), 1);
    }
}
