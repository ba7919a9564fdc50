//! Section Prerequisite Validation
//!
//! Course sections can declare other sections as unlock prerequisites.
//! A cycle in that graph would make a section permanently unreachable, so
//! edits to prerequisites are rejected when they would close a loop.
//!
//! The graph is modeled as adjacency lists indexed by dense integer ids and
//! walked with an iterative three-color depth-first search. Traversal state
//! lives in an explicit stack, so pathological inputs (a prerequisite chain
//! thousands of sections long) cannot exhaust the call stack.

/// Node visit state for the three-color DFS.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet
    White,
    /// On the current traversal path
    Gray,
    /// Fully explored
    Black,
}

/// Returns true if the prerequisite graph contains a cycle.
///
/// `node_count` is the number of sections; `edges` is a list of
/// `(section, prerequisite)` pairs with both ids in `0..node_count`.
/// Edges referencing out-of-range ids are ignored.
pub fn has_cycle(node_count: usize, edges: &[(usize, usize)]) -> bool {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(from, to) in edges {
        if from < node_count && to < node_count {
            adjacency[from].push(to);
        }
    }

    let mut color = vec![Color::White; node_count];

    for start in 0..node_count {
        if color[start] != Color::White {
            continue;
        }

        // Each stack entry is (node, index of the next neighbor to visit).
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        color[start] = Color::Gray;

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            if next < adjacency[node].len() {
                frame.1 = next + 1;
                let neighbor = adjacency[node][next];
                match color[neighbor] {
                    Color::Gray => return true,
                    Color::White => {
                        color[neighbor] = Color::Gray;
                        stack.push((neighbor, 0));
                    }
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_has_no_cycle() {
        assert!(!has_cycle(0, &[]));
        assert!(!has_cycle(5, &[]));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        assert!(has_cycle(3, &[(1, 1)]));
    }

    #[test]
    fn chain_has_no_cycle() {
        assert!(!has_cycle(4, &[(0, 1), (1, 2), (2, 3)]));
    }

    #[test]
    fn diamond_has_no_cycle() {
        // Two paths reaching the same prerequisite is not a cycle.
        assert!(!has_cycle(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]));
    }

    #[test]
    fn back_edge_is_a_cycle() {
        assert!(has_cycle(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]));
    }

    #[test]
    fn disconnected_components_are_all_checked() {
        assert!(has_cycle(6, &[(0, 1), (3, 4), (4, 5), (5, 3)]));
    }

    #[test]
    fn out_of_range_edges_are_ignored() {
        assert!(!has_cycle(2, &[(0, 1), (1, 9)]));
    }

    #[test]
    fn long_chain_does_not_overflow_the_stack() {
        let n = 200_000;
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        assert!(!has_cycle(n, &edges));

        let mut cyclic = edges;
        cyclic.push((n - 1, 0));
        assert!(has_cycle(n, &cyclic));
    }
}
