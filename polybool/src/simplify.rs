//! Decomposition of a self-intersecting ring into simple loops that don't cross each
//! other, labelled with winding numbers.

use crate::{
    geom::{self, Point},
    graph::{Graph, Locations, Node, NodeIdx},
    num::Float,
    ring::Ring,
};

/// Which side of the path through `x` the chain starting at `from` leaves on.
///
/// Points of the chain that lie along the path are skipped, so that a chain running
/// along the path for a while is classified by where it eventually goes.
fn side_of_chain<F: Float>(
    graph: &Graph<F>,
    x: NodeIdx,
    from: NodeIdx,
    step: impl Fn(&Node<F>) -> NodeIdx,
) -> i8 {
    let a = graph[graph[x].prev].site;
    let b = graph[graph[x].next].site;
    let center = graph[x].site;

    let mut cur = from;
    for _ in 0..graph.len() {
        let p = graph[cur].site;
        if !geom::coincident(&p, &center) {
            let side = geom::side_of_path(&a, &center, &b, &p);
            if side != 0 {
                return side;
            }
        }
        cur = step(&graph[cur]);
        if cur == from {
            break;
        }
    }
    0
}

/// Returns true if the ring's path through `j` crosses its path through `i`, as opposed to
/// touching it.
pub fn edge_crosses<F: Float>(graph: &Graph<F>, i: NodeIdx, j: NodeIdx) -> bool {
    let before = side_of_chain(graph, i, graph[j].prev, |n| n.prev);
    let after = side_of_chain(graph, i, graph[j].next, |n| n.next);
    before * after < 0
}

/// Finds two paths through the same location that cross there.
fn crossing_at<F: Float>(graph: &Graph<F>, at: &[NodeIdx]) -> Option<(NodeIdx, NodeIdx)> {
    at.iter().enumerate().find_map(|(k, &i)| {
        at[k + 1..]
            .iter()
            .find(|&&j| graph[i].prev != j && graph[j].prev != i && edge_crosses(graph, i, j))
            .map(|&j| (i, j))
    })
}

/// Exchanges the incoming edges of two nodes at the same location.
///
/// If the nodes are on the same loop this splits it in two, and otherwise it joins their
/// two loops into one.
fn swap_prev<F: Float>(graph: &mut Graph<F>, i: NodeIdx, j: NodeIdx) {
    let pi = graph[i].prev;
    let pj = graph[j].prev;
    graph[pi].next = j;
    graph[j].prev = pi;
    graph[pj].next = i;
    graph[i].prev = pj;
}

fn same_loop<F: Float>(graph: &Graph<F>, i: NodeIdx, j: NodeIdx) -> bool {
    let mut cur = graph[i].next;
    for _ in 0..graph.len() {
        if cur == j {
            return true;
        }
        if cur == i {
            return false;
        }
        cur = graph[cur].next;
    }
    false
}

/// Reconnects the paths at every location until none of them cross.
pub fn uncross<F: Float>(graph: &mut Graph<F>, locations: &Locations) -> usize {
    let mut count = 0;
    for at in locations.iter() {
        let mut rounds = 0;
        while let Some((i, j)) = crossing_at(graph, at) {
            swap_prev(graph, i, j);
            count += 1;
            tracing::trace!("uncrossed {i:?}/{j:?}");
            rounds += 1;
            if rounds > at.len() * at.len() {
                tracing::debug!("paths through {:?} keep crossing", at[0]);
                break;
            }
        }
    }
    count
}

/// Splits loops that touch themselves, so that every loop passes through each location at
/// most once.
///
/// A split is skipped if it would make two paths cross.
pub fn separate<F: Float>(graph: &mut Graph<F>, locations: &Locations) -> usize {
    let mut count = 0;
    for at in locations.iter() {
        // Every split adds a loop, so there can't be more of them than passes.
        'split: for _ in 0..at.len() {
            for (k, &i) in at.iter().enumerate() {
                for &j in &at[k + 1..] {
                    if graph[i].prev == j || graph[j].prev == i || !same_loop(graph, i, j) {
                        continue;
                    }
                    swap_prev(graph, i, j);
                    if crossing_at(graph, at).is_none() {
                        count += 1;
                        tracing::trace!("separated {i:?}/{j:?}");
                        continue 'split;
                    }
                    swap_prev(graph, i, j);
                }
            }
            break;
        }
    }
    count
}

#[derive(Clone, Debug)]
struct Loop<F: Float> {
    points: Vec<Point<F>>,
    area: F,
    orientation: i32,
}

impl<F: Float> Loop<F> {
    /// Vertices first, then edge midpoints.
    fn samples(&self) -> impl Iterator<Item = Point<F>> + '_ {
        let n = self.points.len();
        self.points.iter().copied().chain(
            (0..n).map(move |i| self.points[i].midpoint(&self.points[(i + 1) % n])),
        )
    }

    /// Returns true if this loop encloses `other`. Neither loop may cross the other.
    ///
    /// Loops that trace the same curve enclose each other, so `tie` decides between them.
    fn encloses(&self, other: &Loop<F>, tie: bool) -> bool {
        if self.area.abs() < other.area.abs() {
            return false;
        }
        for p in other.samples() {
            if !geom::on_boundary(&self.points, &p) {
                return geom::contains(&self.points, &p);
            }
        }
        tie
    }
}

/// Finds the cycles of a split graph.
fn loops<F: Float>(graph: &Graph<F>) -> Vec<Loop<F>> {
    let mut seen = vec![false; graph.len()];
    let mut loops = Vec::new();
    let starts: Vec<NodeIdx> = graph.events().chain(graph.live_nodes()).collect();
    for start in starts {
        if seen[start.0] || !graph.is_live(start) {
            continue;
        }
        let mut points = Vec::new();
        let mut cur = start;
        loop {
            seen[cur.0] = true;
            points.push(graph[cur].site);
            cur = graph[cur].next;
            if cur == start || seen[cur.0] || points.len() > graph.len() {
                break;
            }
        }
        let area = geom::signed_area(&points);
        loops.push(Loop {
            points,
            area,
            orientation: i32::from(area.sign()),
        });
    }
    loops
}

/// The winding number of the region just inside each loop.
///
/// Since the loops are simple and don't cross, the input winds around a point once for
/// every loop enclosing it, in that loop's direction.
fn windings<F: Float>(loops: &[Loop<F>]) -> Vec<i32> {
    (0..loops.len())
        .map(|l| {
            let outer: i32 = loops
                .iter()
                .enumerate()
                .filter(|&(m, lp)| m != l && lp.encloses(&loops[l], m < l))
                .map(|(_, lp)| lp.orientation)
                .sum();
            outer + loops[l].orientation
        })
        .collect()
}

/// Splits the ring into simple loops that don't cross and labels each with its winding
/// number.
///
/// Loops with zero area are dropped. The rings are returned in the direction they were
/// traced, so their orientation agrees with the sign of their winding number whenever the
/// input winds consistently.
pub fn traverse<F: Float>(graph: &mut Graph<F>) -> Vec<Ring<F>> {
    let locations = graph.locations();
    let crossings = uncross(graph, &locations);
    let touches = separate(graph, &locations);
    tracing::debug!(crossings, touches, "split self-intersections");

    let loops: Vec<Loop<F>> = loops(graph)
        .into_iter()
        .filter(|lp| lp.orientation != 0)
        .collect();
    let rings: Vec<Ring<F>> = windings(&loops)
        .into_iter()
        .zip(loops)
        .map(|(winding, lp)| Ring::new(lp.points, winding))
        .collect();
    tracing::debug!(rings = rings.len(), "simplified ring");
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphKind;

    fn build(points: &[(f64, f64)]) -> Graph<f64> {
        let mut g = Graph::new(GraphKind::Simplify, points.len(), 0);
        g.push_p(points.iter().map(|&c| Point::from(c)));
        g.build();
        g
    }

    fn windings(rings: &[Ring<f64>]) -> Vec<i32> {
        let mut ret: Vec<i32> = rings.iter().map(|r| r.winding).collect();
        ret.sort();
        ret
    }

    /// Compares the label of the innermost ring around each point of a grid with the
    /// winding number of the input there, and checks that every ring is simple.
    fn check_labels(input: &[(f64, f64)], rings: &[Ring<f64>]) {
        let input: Vec<Point<f64>> = input.iter().map(|&c| Point::from(c)).collect();
        for i in 0..48_i32 {
            for j in 0..48_i32 {
                let x = -6.0 + 0.25 * f64::from(i) + 0.0137;
                let y = -6.0 + 0.25 * f64::from(j) + 0.0291;
                let p = Point::new(x, y);
                let innermost = rings
                    .iter()
                    .filter(|r| geom::contains(&r.points, &p))
                    .min_by(|a, b| a.area.total_cmp(&b.area));
                let label = innermost.map_or(0, |r| r.winding);
                assert_eq!(label, geom::winding_number(&input, &p), "at {p:?}");
            }
        }
        for r in rings {
            assert!(crate::is_simple(&r.points).unwrap(), "{:?}", r.points);
        }
    }

    #[test]
    fn simple_ring() {
        let mut g = build(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let rings = traverse(&mut g);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].winding, 1);
        assert_eq!(rings[0].area, 4.0);

        let mut g = build(&[(0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (0.0, 0.0)]);
        let rings = traverse(&mut g);
        assert_eq!(rings[0].winding, -1);
    }

    #[test]
    fn bow_tie() {
        let mut g = build(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
        let i = g.live_nodes().find(|&n| g[n].is_intersection()).unwrap();
        let j = g[i].neighbors[0];
        assert!(edge_crosses(&g, i, j));
        assert!(edge_crosses(&g, j, i));

        let rings = traverse(&mut g);
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.area == 25.0));
        assert_eq!(windings(&rings), vec![-1, 1]);
    }

    #[test]
    fn touching_is_not_crossing() {
        // A ring that comes back to touch its own bottom edge from inside.
        let input = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 0.0), (0.0, 4.0)];
        let mut g = build(&input);
        let i = g.live_nodes().find(|&n| g[n].is_intersection()).unwrap();
        let j = g[i].neighbors[0];
        assert!(!edge_crosses(&g, i, j));

        // The two triangles on either side of the touching point come apart.
        let rings = traverse(&mut g);
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.area == 4.0 && r.winding == 1));
        check_labels(&input, &rings);
    }

    #[test]
    fn pentagram() {
        // Every second vertex of a convex pentagon, so the middle is covered twice.
        let star = [(0.0, 2.0), (8.0, 2.0), (2.0, 7.0), (4.0, 0.0), (6.0, 7.0)];
        let mut g = build(&star);
        let rings = traverse(&mut g);
        assert_eq!(windings(&rings), vec![1, 2]);

        let input: Vec<Point<f64>> = star.iter().map(|&c| Point::from(c)).collect();
        let total: f64 = rings.iter().map(|r| r.signed_area()).sum();
        assert!((total - geom::signed_area(&input)).abs() < 1e-9);
    }

    #[test]
    fn petals_of_both_orientations() {
        // Three petals meeting at the origin; the top one winds clockwise.
        let flower = [
            (0.0, 0.0),
            (2.0, -1.0),
            (2.0, 1.0),
            (0.0, 0.0),
            (-1.0, 2.0),
            (1.0, 2.0),
            (0.0, 0.0),
            (-2.0, -1.0),
            (-1.0, -2.0),
        ];
        let mut g = build(&flower);
        let rings = traverse(&mut g);
        assert_eq!(windings(&rings), vec![-1, 1, 1]);
        check_labels(&flower, &rings);
    }

    #[test]
    fn nested_loop_sharing_edges() {
        // A square, then a smaller square in its corner that runs back along both of the
        // edges meeting there.
        let input = [
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
        ];
        let mut g = build(&input);
        let mut rings = traverse(&mut g);
        rings.sort_by(|a, b| a.area.total_cmp(&b.area));
        assert_eq!(rings.len(), 2);
        assert_eq!((rings[0].area, rings[0].winding), (4.0, 2));
        assert_eq!((rings[1].area, rings[1].winding), (16.0, 1));
        check_labels(&input, &rings);
    }

    #[test]
    fn eight_pointed_star() {
        // Every third vertex of a convex octagon, covering the middle three times.
        let octagon = [
            (3.0, 1.2),
            (1.1, 3.0),
            (-0.9, 3.1),
            (-3.0, 0.8),
            (-3.1, -1.0),
            (-1.2, -3.0),
            (0.8, -2.9),
            (3.0, -1.1),
        ];
        let star: Vec<(f64, f64)> = (0..8).map(|k| octagon[(3 * k) % 8]).collect();
        let mut g = build(&star);
        let rings = traverse(&mut g);
        assert_eq!(windings(&rings).last(), Some(&3));
        check_labels(&star, &rings);
    }
}
