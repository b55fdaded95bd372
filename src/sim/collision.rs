//! Collision detection and pairwise dispatch
//!
//! Every unordered pair `(i, j)` with `i < j` is tested exactly once per tick.
//! On overlap both sides react, `i` first. O(N²), fine for tens of entities.

use glam::Vec2;

use super::entity::GameEvent;

/// Something that can take part in pairwise collision
pub trait Collider {
    /// Overlap test from this side
    fn collides(&self, other: &Self) -> bool;

    /// React to a confirmed overlap; may mutate either side
    fn collide(&mut self, other: &mut Self, events: &mut Vec<GameEvent>);

    /// Inactive colliders (e.g. broken blocks) are skipped
    fn is_active(&self) -> bool {
        true
    }
}

/// Half-extent bounding box test. Touching edges do not overlap.
#[inline]
pub fn aabb_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    let d = (a_pos - b_pos).abs();
    let range = (a_size + b_size) / 2.0;
    d.x < range.x && d.y < range.y
}

/// Two distinct mutable elements, in index order
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert!(i < j, "pair_mut needs i < j (got {} and {})", i, j);
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Resolve every pair `(i, j)` with `j > i`.
///
/// Returns the number of overlap tests performed.
pub fn resolve_pairs_from<T: Collider>(
    items: &mut [T],
    i: usize,
    events: &mut Vec<GameEvent>,
) -> usize {
    let mut tests = 0;
    for j in (i + 1)..items.len() {
        let (a, b) = pair_mut(items, i, j);
        if !a.is_active() {
            break;
        }
        if !b.is_active() {
            continue;
        }
        tests += 1;
        if a.collides(b) {
            a.collide(b, events);
            b.collide(a, events);
        }
    }
    tests
}

/// Resolve all unordered pairs in slice order
pub fn resolve_all<T: Collider>(items: &mut [T], events: &mut Vec<GameEvent>) -> usize {
    (0..items.len())
        .map(|i| resolve_pairs_from(items, i, events))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<(&'static str, usize, usize)>>>;

    /// Records every test and reaction into a shared log
    struct Probe {
        id: usize,
        overlaps: Vec<usize>,
        active: bool,
        log: CallLog,
    }

    impl Collider for Probe {
        fn collides(&self, other: &Self) -> bool {
            self.log.borrow_mut().push(("test", self.id, other.id));
            self.overlaps.contains(&other.id)
        }

        fn collide(&mut self, other: &mut Self, _events: &mut Vec<GameEvent>) {
            self.log.borrow_mut().push(("collide", self.id, other.id));
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn probes(n: usize, overlapping: &[(usize, usize)]) -> (Vec<Probe>, CallLog) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let items = (0..n)
            .map(|id| Probe {
                id,
                overlaps: overlapping
                    .iter()
                    .filter_map(|&(a, b)| {
                        if a == id {
                            Some(b)
                        } else if b == id {
                            Some(a)
                        } else {
                            None
                        }
                    })
                    .collect(),
                active: true,
                log: Rc::clone(&log),
            })
            .collect();
        (items, log)
    }

    #[test]
    fn test_aabb_boundary_is_exclusive() {
        let size = Vec2::new(10.0, 10.0);
        // Exactly touching on x: sum of half extents == distance
        assert!(!aabb_overlap(Vec2::ZERO, size, Vec2::new(10.0, 0.0), size));
        // Exactly touching on y
        assert!(!aabb_overlap(Vec2::ZERO, size, Vec2::new(0.0, 10.0), size));
        // Clear overlap
        assert!(aabb_overlap(Vec2::ZERO, size, Vec2::new(9.0, 3.0), size));
        // Clear miss on one axis only
        assert!(!aabb_overlap(Vec2::ZERO, size, Vec2::new(2.0, 30.0), size));
    }

    #[test]
    fn test_aabb_mixed_sizes() {
        let a = Vec2::new(96.0, 16.0);
        let b = Vec2::new(14.0, 14.0);
        assert!(aabb_overlap(Vec2::new(400.0, 550.0), a, Vec2::new(454.0, 540.0), b));
        assert!(!aabb_overlap(Vec2::new(400.0, 550.0), a, Vec2::new(455.0, 540.0), b));
    }

    #[test]
    fn test_collide_both_directions_in_order() {
        let (mut items, log) = probes(3, &[(0, 2)]);
        let mut events = Vec::new();
        resolve_all(&mut items, &mut events);

        let collides: Vec<_> = log
            .borrow()
            .iter()
            .filter(|(what, _, _)| *what == "collide")
            .map(|&(_, a, b)| (a, b))
            .collect();
        assert_eq!(collides, vec![(0, 2), (2, 0)]);
    }

    #[test]
    fn test_reaction_follows_its_test() {
        let (mut items, log) = probes(3, &[(0, 1)]);
        resolve_all(&mut items, &mut Vec::new());
        let log = log.borrow();
        assert_eq!(log[0], ("test", 0, 1));
        assert_eq!(log[1], ("collide", 0, 1));
        assert_eq!(log[2], ("collide", 1, 0));
        assert_eq!(log[3], ("test", 0, 2));
    }

    #[test]
    fn test_inactive_are_skipped() {
        let (mut items, log) = probes(3, &[(0, 1), (1, 2)]);
        items[1].active = false;
        let tests = resolve_all(&mut items, &mut Vec::new());
        // Only (0, 2) remains
        assert_eq!(tests, 1);
        assert!(log.borrow().iter().all(|&(what, _, _)| what == "test"));
    }

    #[test]
    fn test_pair_mut_returns_distinct_elements() {
        let mut v = vec![1, 2, 3, 4];
        let (a, b) = pair_mut(&mut v, 1, 3);
        std::mem::swap(a, b);
        assert_eq!(v, vec![1, 4, 3, 2]);
    }

    #[test]
    #[should_panic(expected = "pair_mut needs i < j")]
    fn test_pair_mut_rejects_self_pair() {
        let mut v = vec![1, 2];
        let _ = pair_mut(&mut v, 1, 1);
    }

    proptest! {
        #[test]
        fn prop_each_unordered_pair_tested_once(n in 0usize..24) {
            let (mut items, log) = probes(n, &[]);
            let tests = resolve_all(&mut items, &mut Vec::new());
            prop_assert_eq!(tests, n * n.saturating_sub(1) / 2);

            let mut seen: Vec<(usize, usize)> = log
                .borrow()
                .iter()
                .map(|&(_, a, b)| (a, b))
                .collect();
            prop_assert!(seen.iter().all(|&(a, b)| a < b));
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }

        #[test]
        fn prop_overlap_is_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
            w1 in 0.0f32..100.0, h1 in 0.0f32..100.0,
            w2 in 0.0f32..100.0, h2 in 0.0f32..100.0,
        ) {
            let a = (Vec2::new(ax, ay), Vec2::new(w1, h1));
            let b = (Vec2::new(bx, by), Vec2::new(w2, h2));
            prop_assert_eq!(aabb_overlap(a.0, a.1, b.0, b.1), aabb_overlap(b.0, b.1, a.0, a.1));
        }
    }
}
