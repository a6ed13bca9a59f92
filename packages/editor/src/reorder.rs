//! Chapter drag/drop reorder math.
//!
//! Kept as a pure function so the index arithmetic can be tested
//! exhaustively, independent of pointer-event plumbing. Persisting the new
//! order is the caller's concern; this never touches I/O.

use folio_model::ChapterId;
use serde::{Deserialize, Serialize};

/// Where the dragged chapter lands relative to the drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPosition {
    #[serde(rename = "before")]
    Before,
    #[serde(rename = "after")]
    After,
}

/// Compute the new chapter order for a drag of `dragged` onto `target`.
///
/// Total for any input: dragging a chapter onto itself, or referencing an
/// id not in the order, returns the input unchanged (drag/drop can race
/// with list changes, so these are no-ops rather than errors). The result
/// always has the same membership as the input with no duplicates.
pub fn reorder(
    order: &[ChapterId],
    dragged: ChapterId,
    target: ChapterId,
    position: DropPosition,
) -> Vec<ChapterId> {
    if dragged == target || !order.contains(&dragged) || !order.contains(&target) {
        return order.to_vec();
    }

    let mut result: Vec<ChapterId> = order.iter().copied().filter(|&id| id != dragged).collect();

    // Looking the target up in the already-reduced sequence absorbs the
    // index shift when the dragged item originally preceded the target.
    let target_index = result
        .iter()
        .position(|&id| id == target)
        .expect("target verified present");
    let insert_at = match position {
        DropPosition::Before => target_index,
        DropPosition::After => target_index + 1,
    };
    result.insert(insert_at, dragged);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_before_places_dragged_immediately_before_target() {
        assert_eq!(reorder(&[1, 2, 3, 4], 4, 2, DropPosition::Before), vec![1, 4, 2, 3]);
        assert_eq!(reorder(&[1, 2, 3, 4], 1, 3, DropPosition::Before), vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_drop_after_places_dragged_immediately_after_target() {
        assert_eq!(reorder(&[1, 2, 3, 4], 1, 3, DropPosition::After), vec![2, 3, 1, 4]);
        assert_eq!(reorder(&[1, 2, 3, 4], 4, 1, DropPosition::After), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_self_drop_and_unknown_ids_are_noops() {
        assert_eq!(reorder(&[1, 2, 3], 2, 2, DropPosition::Before), vec![1, 2, 3]);
        assert_eq!(reorder(&[1, 2, 3], 9, 2, DropPosition::After), vec![1, 2, 3]);
        assert_eq!(reorder(&[1, 2, 3], 1, 9, DropPosition::Before), vec![1, 2, 3]);
    }

    #[test]
    fn test_every_pair_preserves_membership_and_adjacency() {
        let order = [10, 20, 30, 40, 50];
        for &dragged in &order {
            for &target in &order {
                if dragged == target {
                    continue;
                }
                let result = reorder(&order, dragged, target, DropPosition::Before);

                let mut sorted = result.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, [10, 20, 30, 40, 50], "membership for {dragged}->{target}");

                let di = result.iter().position(|&id| id == dragged).unwrap();
                let ti = result.iter().position(|&id| id == target).unwrap();
                assert_eq!(di + 1, ti, "{dragged} must immediately precede {target}");
            }
        }
    }

    #[test]
    fn test_every_pair_after_adjacency() {
        let order = [10, 20, 30, 40, 50];
        for &dragged in &order {
            for &target in &order {
                if dragged == target {
                    continue;
                }
                let result = reorder(&order, dragged, target, DropPosition::After);
                let di = result.iter().position(|&id| id == dragged).unwrap();
                let ti = result.iter().position(|&id| id == target).unwrap();
                assert_eq!(ti + 1, di, "{dragged} must immediately follow {target}");
            }
        }
    }
}
