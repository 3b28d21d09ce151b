//! Tree Assembly
//!
//! Builds the nested parent → children view of a flat snapshot, flattens it
//! into rows for rendering, and plans drag-and-drop re-parenting.
//!
//! Ordering everywhere: scheduled items by ascending date, unscheduled
//! items after them, ties by creation time and then id.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::domain::{ItemId, ScheduleItem};

/// Deepest level the assembler descends to
pub const MAX_TREE_DEPTH: usize = 32;
/// Upper bound on parent-chain walks, guards against cyclic data
const MAX_ANCESTOR_WALK: usize = 1000;

/// Sibling / list ordering rule
pub fn compare_schedule(a: &ScheduleItem, b: &ScheduleItem) -> Ordering {
    some_first(a.scheduled_date, b.scheduled_date)
        .then_with(|| some_first(a.created_at, b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn some_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_schedule(items: &mut [ScheduleItem]) {
    items.sort_by(compare_schedule);
}

/// A node of the derived hierarchy, borrowing from the snapshot
#[derive(Debug, Clone)]
pub struct TreeNode<'a> {
    pub item: &'a ScheduleItem,
    pub children: Vec<TreeNode<'a>>,
}

type ChildrenMap<'a> = HashMap<Option<ItemId>, Vec<&'a ScheduleItem>>;

/// Group a snapshot by parent and assemble the hierarchy under `root_parent`.
///
/// Assembling from the top (`None`) also shows items whose parent is not in
/// the snapshot as roots, and surfaces items caught in a parent cycle as
/// extra roots, so every item appears exactly once.
pub fn build_tree<'a>(items: &'a [ScheduleItem], root_parent: Option<&ItemId>) -> Vec<TreeNode<'a>> {
    let known: HashSet<&ItemId> = items.iter().map(|i| &i.id).collect();

    let mut children_map: ChildrenMap<'a> = HashMap::new();
    for item in items {
        let parent = item
            .parent_id
            .as_ref()
            .filter(|p| known.contains(p) && **p != item.id)
            .cloned();
        children_map.entry(parent).or_default().push(item);
    }
    for children in children_map.values_mut() {
        children.sort_by(|a, b| compare_schedule(a, b));
    }

    let mut visited = HashSet::new();
    let mut roots = assemble(root_parent, 0, &children_map, &mut visited);

    if root_parent.is_none() && visited.len() < items.len() {
        let mut stranded: Vec<&ScheduleItem> = items.iter().filter(|i| !visited.contains(&i.id)).collect();
        stranded.sort_by(|a, b| compare_schedule(a, b));
        for item in stranded {
            if !visited.insert(item.id.clone()) {
                continue;
            }
            let children = assemble(Some(&item.id), 1, &children_map, &mut visited);
            roots.push(TreeNode { item, children });
        }
        roots.sort_by(|a, b| compare_schedule(a.item, b.item));
    }

    roots
}

fn assemble<'a>(
    parent: Option<&ItemId>,
    depth: usize,
    children_map: &ChildrenMap<'a>,
    visited: &mut HashSet<ItemId>,
) -> Vec<TreeNode<'a>> {
    if depth >= MAX_TREE_DEPTH {
        return Vec::new();
    }
    let Some(children) = children_map.get(&parent.cloned()) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(children.len());
    for &item in children {
        if !visited.insert(item.id.clone()) {
            continue;
        }
        let grandchildren = assemble(Some(&item.id), depth + 1, children_map, visited);
        nodes.push(TreeNode { item, children: grandchildren });
    }
    nodes
}

/// A rendered row of the flattened tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub item: ScheduleItem,
    pub depth: usize,
    pub has_children: bool,
}

/// Identity of a rendered row across snapshots
pub type RowKey = (ItemId, Option<ItemId>);

impl TreeRow {
    /// Stays the same while the item is edited, completed or gains
    /// children; changes only when it is moved under another parent.
    pub fn key(&self) -> RowKey {
        (self.item.id.clone(), self.item.parent_id.clone())
    }
}

/// Depth-first rows in display order; collapsed nodes hide their subtree
pub fn flatten_tree(nodes: &[TreeNode<'_>], expansion: &ExpansionState) -> Vec<TreeRow> {
    fn collect(nodes: &[TreeNode<'_>], depth: usize, expansion: &ExpansionState, rows: &mut Vec<TreeRow>) {
        for node in nodes {
            rows.push(TreeRow {
                item: node.item.clone(),
                depth,
                has_children: !node.children.is_empty(),
            });
            if expansion.is_expanded(&node.item.id) {
                collect(&node.children, depth + 1, expansion, rows);
            }
        }
    }

    let mut rows = Vec::new();
    collect(nodes, 0, expansion, &mut rows);
    rows
}

/// Rows for the timeline view.
///
/// Hidden completed items drop out before assembly, so their active
/// children surface as roots instead of disappearing with them.
pub fn timeline_rows(items: &[ScheduleItem], show_completed: bool, expansion: &ExpansionState) -> Vec<TreeRow> {
    if show_completed {
        return flatten_tree(&build_tree(items, None), expansion);
    }
    let visible: Vec<ScheduleItem> = items.iter().filter(|i| !i.is_completed).cloned().collect();
    flatten_tree(&build_tree(&visible, None), expansion)
}

/// Transient expand/collapse state, default expanded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionState {
    collapsed: HashSet<ItemId>,
}

impl ExpansionState {
    pub fn is_expanded(&self, id: &ItemId) -> bool {
        !self.collapsed.contains(id)
    }

    pub fn toggle(&mut self, id: &ItemId) {
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.clone());
        }
    }

    /// Forget ids no longer in the snapshot
    pub fn retain_known(&mut self, items: &[ScheduleItem]) {
        let known: HashSet<&ItemId> = items.iter().map(|i| &i.id).collect();
        self.collapsed.retain(|id| known.contains(id));
    }
}

/// Where a dragged item was released relative to the target row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    Before,
    Child,
    After,
}

impl DropZone {
    /// Top third, middle third, bottom third of the target's height
    pub fn from_offset(offset_y: f64, height: f64) -> Self {
        if height <= 0.0 {
            return DropZone::Child;
        }
        if offset_y < height / 3.0 {
            DropZone::Before
        } else if offset_y < height * 2.0 / 3.0 {
            DropZone::Child
        } else {
            DropZone::After
        }
    }
}

pub fn find_item<'a>(items: &'a [ScheduleItem], id: &ItemId) -> Option<&'a ScheduleItem> {
    items.iter().find(|i| &i.id == id)
}

/// Direct children of `id`, in display order
pub fn children_of<'a>(items: &'a [ScheduleItem], id: &ItemId) -> Vec<&'a ScheduleItem> {
    let mut children: Vec<&ScheduleItem> = items.iter().filter(|i| i.parent_id.as_ref() == Some(id)).collect();
    children.sort_by(|a, b| compare_schedule(a, b));
    children
}

/// True if `candidate` sits somewhere below `ancestor`.
///
/// Walks the candidate's parent chain up to the root, stopping early on
/// a cycle.
pub fn is_descendant(items: &[ScheduleItem], ancestor: &ItemId, candidate: &ItemId) -> bool {
    let parents: HashMap<&ItemId, Option<&ItemId>> =
        items.iter().map(|i| (&i.id, i.parent_id.as_ref())).collect();

    let mut current = parents.get(candidate).copied().flatten();
    for _ in 0..MAX_ANCESTOR_WALK {
        match current {
            Some(id) if id == ancestor => return true,
            Some(id) if id == candidate => return false,
            Some(id) => current = parents.get(id).copied().flatten(),
            None => return false,
        }
    }
    false
}

/// Result of a valid drop
#[derive(Debug, Clone, PartialEq)]
pub struct ReparentPlan {
    pub item_id: ItemId,
    pub new_parent: Option<ItemId>,
    pub zone: DropZone,
}

/// Compute the new parent for a drop, or None if the drop must be ignored.
///
/// `Child` nests under the target; `Before`/`After` make the dragged item
/// a sibling of the target. Sibling order is date-derived, so the zone
/// only decides the parent.
pub fn plan_reparent(
    items: &[ScheduleItem],
    dragged: &ItemId,
    target: &ItemId,
    zone: DropZone,
) -> Option<ReparentPlan> {
    if dragged == target {
        return None;
    }
    let dragged_item = find_item(items, dragged)?;
    let target_item = find_item(items, target)?;
    if dragged_item.user_id != target_item.user_id {
        return None;
    }

    let new_parent = match zone {
        DropZone::Child => Some(target.clone()),
        DropZone::Before | DropZone::After => target_item.parent_id.clone(),
    };

    if let Some(parent) = &new_parent {
        if parent == dragged || is_descendant(items, dragged, parent) {
            return None;
        }
    }
    if new_parent == dragged_item.parent_id {
        return None;
    }

    Some(ReparentPlan {
        item_id: dragged.clone(),
        new_parent,
        zone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn make_item(id: &str, parent: Option<&str>, hours: Option<i64>) -> ScheduleItem {
        ScheduleItem {
            id: ItemId::from(id),
            user_id: UserId::from("u1"),
            title: format!("Item {}", id),
            scheduled_date: hours.map(|h| base() + Duration::hours(h)),
            estimated_duration: None,
            location: None,
            is_completed: false,
            is_from_image: false,
            parent_id: parent.map(ItemId::from),
            original_text: String::new(),
            created_at: Some(base()),
            updated_at: Some(base()),
        }
    }

    fn ids(rows: &[TreeRow]) -> Vec<(String, usize)> {
        rows.iter().map(|r| (r.item.id.to_string(), r.depth)).collect()
    }

    #[test]
    fn test_row_key_survives_edits_but_not_moves() {
        let items = vec![make_item("A", None, Some(1)), make_item("B", None, Some(2))];
        let before = timeline_rows(&items, true, &ExpansionState::default());

        let mut edited = items.clone();
        edited[1].title = "renamed".to_string();
        edited[1].is_completed = true;
        edited[1].updated_at = Some(base() + Duration::minutes(5));
        edited.push(make_item("C", Some("B"), Some(3)));
        let after = timeline_rows(&edited, true, &ExpansionState::default());
        assert_eq!(after[1].item.id, ItemId::from("B"));
        assert!(after[1].has_children);
        assert_eq!(after[1].key(), before[1].key());

        let mut moved = items;
        moved[1].parent_id = Some(ItemId::from("A"));
        let moved_rows = timeline_rows(&moved, true, &ExpansionState::default());
        assert_eq!(moved_rows[1].item.id, ItemId::from("B"));
        assert_ne!(moved_rows[1].key(), before[1].key());
    }

    #[test]
    fn test_chain_builds_single_branch() {
        let items = vec![
            make_item("A", None, Some(1)),
            make_item("B", Some("A"), Some(2)),
            make_item("C", Some("B"), Some(3)),
        ];
        let tree = build_tree(&items, None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].item.id, ItemId::from("A"));
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].item.id, ItemId::from("B"));
        assert_eq!(tree[0].children[0].children.len(), 1);
        assert_eq!(tree[0].children[0].children[0].item.id, ItemId::from("C"));
    }

    #[test]
    fn test_cycle_terminates_and_keeps_every_item_once() {
        let items = vec![make_item("A", Some("B"), Some(1)), make_item("B", Some("A"), Some(2))];
        let tree = build_tree(&items, None);
        let rows = flatten_tree(&tree, &ExpansionState::default());
        assert_eq!(ids(&rows), vec![("A".to_string(), 0), ("B".to_string(), 1)]);
    }

    #[test]
    fn test_self_parent_and_missing_parent_render_as_roots() {
        let items = vec![make_item("A", Some("A"), Some(2)), make_item("B", Some("gone"), Some(1))];
        let rows = flatten_tree(&build_tree(&items, None), &ExpansionState::default());
        assert_eq!(ids(&rows), vec![("B".to_string(), 0), ("A".to_string(), 0)]);
    }

    #[test]
    fn test_children_follow_date_order_with_unscheduled_last() {
        let mut late = make_item("late", Some("P"), None);
        late.created_at = Some(base() - Duration::days(1));
        let items = vec![
            make_item("P", None, Some(0)),
            late,
            make_item("c3", Some("P"), Some(30)),
            make_item("c1", Some("P"), Some(10)),
        ];
        let rows = flatten_tree(&build_tree(&items, None), &ExpansionState::default());
        assert_eq!(
            ids(&rows),
            vec![
                ("P".to_string(), 0),
                ("c1".to_string(), 1),
                ("c3".to_string(), 1),
                ("late".to_string(), 1),
            ]
        );
        assert!(rows[0].has_children);
    }

    #[test]
    fn test_subtree_from_given_parent() {
        let items = vec![
            make_item("A", None, Some(1)),
            make_item("B", Some("A"), Some(2)),
            make_item("C", None, Some(3)),
        ];
        let tree = build_tree(&items, Some(&ItemId::from("A")));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].item.id, ItemId::from("B"));
    }

    #[test]
    fn test_collapse_hides_descendants() {
        let items = vec![
            make_item("A", None, Some(1)),
            make_item("B", Some("A"), Some(2)),
            make_item("C", Some("B"), Some(3)),
        ];
        let mut expansion = ExpansionState::default();
        expansion.toggle(&ItemId::from("B"));
        let rows = flatten_tree(&build_tree(&items, None), &expansion);
        assert_eq!(ids(&rows), vec![("A".to_string(), 0), ("B".to_string(), 1)]);
        assert!(rows[1].has_children);

        expansion.toggle(&ItemId::from("B"));
        assert!(expansion.is_expanded(&ItemId::from("B")));
    }

    #[test]
    fn test_expansion_forgets_deleted_items() {
        let mut expansion = ExpansionState::default();
        expansion.toggle(&ItemId::from("gone"));
        expansion.retain_known(&[make_item("A", None, None)]);
        assert_eq!(expansion, ExpansionState::default());
    }

    #[test]
    fn test_drop_zone_thirds() {
        assert_eq!(DropZone::from_offset(0.0, 60.0), DropZone::Before);
        assert_eq!(DropZone::from_offset(19.9, 60.0), DropZone::Before);
        assert_eq!(DropZone::from_offset(20.0, 60.0), DropZone::Child);
        assert_eq!(DropZone::from_offset(39.9, 60.0), DropZone::Child);
        assert_eq!(DropZone::from_offset(40.0, 60.0), DropZone::After);
        assert_eq!(DropZone::from_offset(59.0, 60.0), DropZone::After);
    }

    #[test]
    fn test_reparent_onto_self_is_rejected() {
        let items = vec![make_item("X", None, Some(1))];
        let x = ItemId::from("X");
        assert_eq!(plan_reparent(&items, &x, &x, DropZone::Child), None);
    }

    #[test]
    fn test_reparent_onto_descendant_is_rejected() {
        let items = vec![
            make_item("X", None, Some(1)),
            make_item("Y", Some("X"), Some(2)),
            make_item("Z", Some("Y"), Some(3)),
        ];
        let x = ItemId::from("X");
        assert_eq!(plan_reparent(&items, &x, &ItemId::from("Y"), DropZone::Child), None);
        assert_eq!(plan_reparent(&items, &x, &ItemId::from("Z"), DropZone::Child), None);
        // Sibling of Z means child of Y, still inside X's subtree
        assert_eq!(plan_reparent(&items, &x, &ItemId::from("Z"), DropZone::Before), None);
    }

    #[test]
    fn test_reparent_onto_unrelated_item() {
        let items = vec![
            make_item("X", None, Some(1)),
            make_item("U", None, Some(2)),
            make_item("V", Some("U"), Some(3)),
        ];
        let x = ItemId::from("X");
        assert_eq!(
            plan_reparent(&items, &x, &ItemId::from("U"), DropZone::Child),
            Some(ReparentPlan { item_id: x.clone(), new_parent: Some(ItemId::from("U")), zone: DropZone::Child })
        );
        assert_eq!(
            plan_reparent(&items, &x, &ItemId::from("V"), DropZone::After),
            Some(ReparentPlan { item_id: x.clone(), new_parent: Some(ItemId::from("U")), zone: DropZone::After })
        );
        // Already a root sibling of U
        assert_eq!(plan_reparent(&items, &x, &ItemId::from("U"), DropZone::Before), None);
    }

    #[test]
    fn test_reparent_with_unknown_ids_or_other_owner_is_rejected() {
        let mut other = make_item("O", None, Some(2));
        other.user_id = UserId::from("u2");
        let items = vec![make_item("X", None, Some(1)), other];
        let x = ItemId::from("X");
        assert_eq!(plan_reparent(&items, &x, &ItemId::from("missing"), DropZone::Child), None);
        assert_eq!(plan_reparent(&items, &ItemId::from("missing"), &x, DropZone::Child), None);
        assert_eq!(plan_reparent(&items, &x, &ItemId::from("O"), DropZone::Child), None);
    }

    #[test]
    fn test_is_descendant_survives_cycles() {
        let items = vec![make_item("A", Some("B"), None), make_item("B", Some("A"), None), make_item("C", None, None)];
        assert!(is_descendant(&items, &ItemId::from("A"), &ItemId::from("B")));
        assert!(!is_descendant(&items, &ItemId::from("C"), &ItemId::from("A")));
    }

    #[test]
    fn test_children_of() {
        let items = vec![
            make_item("P", None, None),
            make_item("b", Some("P"), Some(2)),
            make_item("a", Some("P"), Some(1)),
        ];
        let children: Vec<&str> = children_of(&items, &ItemId::from("P")).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(children, vec!["a", "b"]);
    }

    #[test]
    fn test_timeline_rows_hide_completed_and_promote_children() {
        let mut done = make_item("P", None, Some(1));
        done.is_completed = true;
        let items = vec![done, make_item("c", Some("P"), Some(2)), make_item("R", None, Some(3))];

        let hidden = timeline_rows(&items, false, &ExpansionState::default());
        assert_eq!(ids(&hidden), vec![("c".to_string(), 0), ("R".to_string(), 0)]);

        let shown = timeline_rows(&items, true, &ExpansionState::default());
        assert_eq!(
            ids(&shown),
            vec![("P".to_string(), 0), ("c".to_string(), 1), ("R".to_string(), 0)]
        );
    }
}
