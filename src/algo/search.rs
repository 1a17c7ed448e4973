//! Generic graph search over element ids.
//!
//! Every search here works on any node type implementing [`ElementId`] and
//! takes a `neighbors` closure instead of a structure, so the same code walks
//! the vertices of a graph, the faces of a mesh, or the primary half-edges
//! standing in for edges.
//!
//! Visited state lives in the [`Tags`] array of the node's collection: a
//! search takes a fresh epoch and marks nodes by writing it, so nothing has
//! to be allocated or cleared between runs. The flip side is that two
//! searches over one collection must not interleave.
//!
//! # Example
//!
//! ```
//! use tessel::algo::search::breadth_first;
//! use tessel::mesh::{build_graph, HeGraph, Topology, VertexId};
//! use nalgebra::Point3;
//!
//! let graph: HeGraph = build_graph(4, &[[0, 1], [1, 2], [2, 3]], |i| {
//!     Point3::new(i as f64, 0.0, 0.0)
//! })
//! .unwrap();
//!
//! let order: Vec<_> = breadth_first(
//!     graph.vertex_store().tags(),
//!     [VertexId::new(1)],
//!     [],
//!     |v| graph.connected_vertices(v),
//! )
//! .map(|v| v.index())
//! .collect();
//!
//! assert_eq!(order[0], 1);
//! assert_eq!(order.len(), 4);
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::marker::PhantomData;

use crate::mesh::{ElementId, Tags};

/// Pending work of a search.
///
/// The container decides the visiting order: a queue gives breadth-first
/// search and a stack depth-first.
pub trait Frontier<T> {
    /// Add an item.
    fn push_item(&mut self, item: T);
    /// Take the next item to visit.
    fn pop_item(&mut self) -> Option<T>;
}

impl<T> Frontier<T> for VecDeque<T> {
    #[inline]
    fn push_item(&mut self, item: T) {
        self.push_back(item);
    }

    #[inline]
    fn pop_item(&mut self) -> Option<T> {
        self.pop_front()
    }
}

impl<T> Frontier<T> for Vec<T> {
    #[inline]
    fn push_item(&mut self, item: T) {
        self.push(item);
    }

    #[inline]
    fn pop_item(&mut self) -> Option<T> {
        self.pop()
    }
}

/// Start a search epoch: mark the excluded nodes, then queue each source
/// once. Excluded sources are dropped.
fn seed<N, T, Q>(
    tags: &Tags,
    sources: impl IntoIterator<Item = N>,
    exclude: impl IntoIterator<Item = N>,
    frontier: &mut Q,
    wrap: impl Fn(N) -> T,
) -> u64
where
    N: ElementId,
    Q: Frontier<T>,
{
    let tag = tags.next_tag();
    for n in exclude {
        tags.set(n.index(), tag);
    }
    for n in sources {
        if tags.mark(n.index(), tag) {
            frontier.push_item(wrap(n));
        }
    }
    tag
}

/// A visit-once search yielding nodes.
///
/// Nodes are marked when they enter the frontier, so each one is yielded at
/// most once however many paths reach it.
pub struct Search<'a, N, Q, F> {
    tags: &'a Tags,
    tag: u64,
    frontier: Q,
    neighbors: F,
    _marker: PhantomData<fn() -> N>,
}

impl<'a, N, Q, F, I> Search<'a, N, Q, F>
where
    N: ElementId,
    Q: Frontier<N>,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    /// Start a search from `sources` using the given frontier container.
    ///
    /// Nodes in `exclude` are never yielded nor expanded.
    pub fn new(
        tags: &'a Tags,
        mut frontier: Q,
        sources: impl IntoIterator<Item = N>,
        exclude: impl IntoIterator<Item = N>,
        neighbors: F,
    ) -> Self {
        let tag = seed(tags, sources, exclude, &mut frontier, |n| n);
        Self {
            tags,
            tag,
            frontier,
            neighbors,
            _marker: PhantomData,
        }
    }

    /// The epoch this search marks nodes with.
    pub fn tag(&self) -> u64 {
        self.tag
    }
}

impl<N, Q, F, I> Iterator for Search<'_, N, Q, F>
where
    N: ElementId,
    Q: Frontier<N>,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.frontier.pop_item()?;
        for m in (self.neighbors)(node) {
            if self.tags.mark(m.index(), self.tag) {
                self.frontier.push_item(m);
            }
        }
        Some(node)
    }
}

/// A visit-once search yielding each node with the edge it was reached by.
///
/// Sources come out with `None`.
pub struct EdgeSearch<'a, N, E, Q, F> {
    tags: &'a Tags,
    tag: u64,
    frontier: Q,
    neighbors: F,
    _marker: PhantomData<fn() -> (N, E)>,
}

impl<'a, N, E, Q, F, I> EdgeSearch<'a, N, E, Q, F>
where
    N: ElementId,
    Q: Frontier<(Option<E>, N)>,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = (E, N)>,
{
    /// Start a search from `sources`. `neighbors` yields `(edge, node)`
    /// pairs.
    pub fn new(
        tags: &'a Tags,
        mut frontier: Q,
        sources: impl IntoIterator<Item = N>,
        exclude: impl IntoIterator<Item = N>,
        neighbors: F,
    ) -> Self {
        let tag = seed(tags, sources, exclude, &mut frontier, |n| (None, n));
        Self {
            tags,
            tag,
            frontier,
            neighbors,
            _marker: PhantomData,
        }
    }
}

impl<N, E, Q, F, I> Iterator for EdgeSearch<'_, N, E, Q, F>
where
    N: ElementId,
    Q: Frontier<(Option<E>, N)>,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = (E, N)>,
{
    type Item = (Option<E>, N);

    fn next(&mut self) -> Option<Self::Item> {
        let (edge, node) = self.frontier.pop_item()?;
        for (e, m) in (self.neighbors)(node) {
            if self.tags.mark(m.index(), self.tag) {
                self.frontier.push_item((Some(e), m));
            }
        }
        Some((edge, node))
    }
}

/// Breadth-first search. Nodes come out in non-decreasing hop distance from
/// the nearest source.
pub fn breadth_first<'a, N, F, I>(
    tags: &'a Tags,
    sources: impl IntoIterator<Item = N>,
    exclude: impl IntoIterator<Item = N>,
    neighbors: F,
) -> Search<'a, N, VecDeque<N>, F>
where
    N: ElementId,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    Search::new(tags, VecDeque::new(), sources, exclude, neighbors)
}

/// Depth-first search.
pub fn depth_first<'a, N, F, I>(
    tags: &'a Tags,
    sources: impl IntoIterator<Item = N>,
    exclude: impl IntoIterator<Item = N>,
    neighbors: F,
) -> Search<'a, N, Vec<N>, F>
where
    N: ElementId,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    Search::new(tags, Vec::new(), sources, exclude, neighbors)
}

/// Breadth-first search reporting the connecting edge of each node.
pub fn breadth_first_edges<'a, N, E, F, I>(
    tags: &'a Tags,
    sources: impl IntoIterator<Item = N>,
    exclude: impl IntoIterator<Item = N>,
    neighbors: F,
) -> EdgeSearch<'a, N, E, VecDeque<(Option<E>, N)>, F>
where
    N: ElementId,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = (E, N)>,
{
    EdgeSearch::new(tags, VecDeque::new(), sources, exclude, neighbors)
}

/// Depth-first search reporting the connecting edge of each node.
pub fn depth_first_edges<'a, N, E, F, I>(
    tags: &'a Tags,
    sources: impl IntoIterator<Item = N>,
    exclude: impl IntoIterator<Item = N>,
    neighbors: F,
) -> EdgeSearch<'a, N, E, Vec<(Option<E>, N)>, F>
where
    N: ElementId,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = (E, N)>,
{
    EdgeSearch::new(tags, Vec::new(), sources, exclude, neighbors)
}

/// Priority queue entry. Ordered so the smallest key pops first.
#[derive(Debug, Clone)]
struct Entry<N, K> {
    key: K,
    node: N,
}

impl<N, K: PartialOrd> PartialEq for Entry<N, K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N, K: PartialOrd> Eq for Entry<N, K> {}

impl<N, K: PartialOrd> PartialOrd for Entry<N, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N, K: PartialOrd> Ord for Entry<N, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .key
            .partial_cmp(&self.key)
            .unwrap_or(Ordering::Equal)
    }
}

/// Best-first search: always expands the queued node with the smallest key.
///
/// A node may sit in the queue several times; it is marked when first popped
/// and later copies are skipped.
pub struct BestFirst<'a, N, K, F, G> {
    tags: &'a Tags,
    tag: u64,
    heap: BinaryHeap<Entry<N, K>>,
    neighbors: F,
    key: G,
}

impl<N, K, F, G, I> Iterator for BestFirst<'_, N, K, F, G>
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        loop {
            let Entry { node, .. } = self.heap.pop()?;
            if !self.tags.mark(node.index(), self.tag) {
                continue;
            }
            for m in (self.neighbors)(node) {
                if !self.tags.is_marked(m.index(), self.tag) {
                    let key = (self.key)(m);
                    self.heap.push(Entry { key, node: m });
                }
            }
            return Some(node);
        }
    }
}

/// Best-first search ordered by `key`, smallest first.
pub fn best_first<'a, N, K, F, G, I>(
    tags: &'a Tags,
    sources: impl IntoIterator<Item = N>,
    exclude: impl IntoIterator<Item = N>,
    neighbors: F,
    mut key: G,
) -> BestFirst<'a, N, K, F, G>
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    let tag = tags.next_tag();
    for n in exclude {
        tags.set(n.index(), tag);
    }
    let heap = sources
        .into_iter()
        .filter(|n| !tags.is_marked(n.index(), tag))
        .map(|node| Entry {
            key: key(node),
            node,
        })
        .collect();
    BestFirst {
        tags,
        tag,
        heap,
        neighbors,
        key,
    }
}

/// Greedy descent or ascent over a key.
///
/// Yields the start node, then repeatedly moves to the best neighbor as long
/// as it strictly improves on the current key. Strict improvement means a
/// node never repeats, so the walk ends on any finite structure.
pub struct Walk<N, K, F, G> {
    current: Option<(N, K)>,
    started: bool,
    prefer: Ordering,
    neighbors: F,
    key: G,
}

impl<N, K, F, G, I> Iterator for Walk<N, K, F, G>
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let (node, node_key) = self.current.take()?;
        if !self.started {
            self.started = true;
            self.current = Some((node, node_key));
            return Some(node);
        }

        let mut best: Option<(N, K)> = None;
        for m in (self.neighbors)(node) {
            let k = (self.key)(m);
            let reference = best.as_ref().map_or(&node_key, |(_, bk)| bk);
            if k.partial_cmp(reference) == Some(self.prefer) {
                best = Some((m, k));
            }
        }

        let (m, k) = best?;
        self.current = Some((m, k));
        Some(m)
    }
}

fn walk<N, K, F, G>(start: N, neighbors: F, mut key: G, prefer: Ordering) -> Walk<N, K, F, G>
where
    G: FnMut(N) -> K,
    N: Copy,
{
    Walk {
        current: Some((start, key(start))),
        started: false,
        prefer,
        neighbors,
        key,
    }
}

/// Lazily walk downhill from `start` along strictly decreasing keys.
pub fn walk_to_min<N, K, F, G, I>(start: N, neighbors: F, key: G) -> Walk<N, K, F, G>
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    walk(start, neighbors, key, Ordering::Less)
}

/// Lazily walk uphill from `start` along strictly increasing keys.
pub fn walk_to_max<N, K, F, G, I>(start: N, neighbors: F, key: G) -> Walk<N, K, F, G>
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    walk(start, neighbors, key, Ordering::Greater)
}

/// The local minimum reached by walking downhill from `start`.
pub fn nearest_min<N, K, F, G, I>(start: N, neighbors: F, key: G) -> N
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    walk_to_min(start, neighbors, key).fold(start, |_, n| n)
}

/// The local maximum reached by walking uphill from `start`.
pub fn nearest_max<N, K, F, G, I>(start: N, neighbors: F, key: G) -> N
where
    N: ElementId,
    K: PartialOrd,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
    G: FnMut(N) -> K,
{
    walk_to_max(start, neighbors, key).fold(start, |_, n| n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{HeGraph, Topology, VertexId};
    use nalgebra::Point3;

    /// An n×n grid of vertices with unit spacing.
    fn grid_graph(n: usize) -> (HeGraph, Vec<VertexId>) {
        let mut g = HeGraph::new();
        let vs: Vec<_> = (0..n * n)
            .map(|i| g.add_vertex(Point3::new((i % n) as f64, (i / n) as f64, 0.0)))
            .collect();
        for j in 0..n {
            for i in 0..n {
                let v = j * n + i;
                if i + 1 < n {
                    g.add_edge(vs[v], vs[v + 1]).unwrap();
                }
                if j + 1 < n {
                    g.add_edge(vs[v], vs[v + n]).unwrap();
                }
            }
        }
        (g, vs)
    }

    fn manhattan(g: &HeGraph, a: VertexId, b: VertexId) -> f64 {
        let (p, q) = (g.vertex_data(a), g.vertex_data(b));
        (p.x - q.x).abs() + (p.y - q.y).abs()
    }

    #[test]
    fn test_breadth_first_visits_each_once_in_depth_order() {
        let (g, vs) = grid_graph(4);
        let order: Vec<_> = breadth_first(g.vertex_store().tags(), [vs[0]], [], |v| {
            g.connected_vertices(v)
        })
        .collect();

        assert_eq!(order.len(), 16);
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 16);

        let depths: Vec<f64> = order.iter().map(|&v| manhattan(&g, vs[0], v)).collect();
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_depth_first_visits_each_once() {
        let (g, vs) = grid_graph(4);
        let order: Vec<_> = depth_first(g.vertex_store().tags(), [vs[5]], [], |v| {
            g.connected_vertices(v)
        })
        .collect();
        assert_eq!(order[0], vs[5]);
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 16);
    }

    #[test]
    fn test_exclude_blocks_expansion() {
        let mut g: HeGraph = HeGraph::new();
        let p: Vec<_> = (0..4)
            .map(|i| g.add_vertex(Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        for w in p.windows(2) {
            g.add_edge(w[0], w[1]).unwrap();
        }

        // Excluding 2 cuts 3 off the path.
        let reached: Vec<_> = breadth_first(g.vertex_store().tags(), [p[0]], [p[2]], |v| {
            g.connected_vertices(v)
        })
        .collect();
        assert_eq!(reached, vec![p[0], p[1]]);
    }

    #[test]
    fn test_multi_source_and_duplicate_sources() {
        let (g, vs) = grid_graph(4);
        let reached: Vec<_> = breadth_first(
            g.vertex_store().tags(),
            [vs[0], vs[15], vs[0]],
            [],
            |v| g.connected_vertices(v),
        )
        .collect();
        assert_eq!(&reached[..2], &[vs[0], vs[15]]);
        assert_eq!(reached.len(), 16);
    }

    #[test]
    fn test_repeated_searches_reuse_tags() {
        let (g, vs) = grid_graph(3);
        for _ in 0..3 {
            let n = breadth_first(g.vertex_store().tags(), [vs[4]], [], |v| {
                g.connected_vertices(v)
            })
            .count();
            assert_eq!(n, 9);
        }
    }

    #[test]
    fn test_edge_search_reports_connecting_halfedge() {
        let (g, vs) = grid_graph(3);
        let mut sources = 0;
        for (he, v) in breadth_first_edges(g.vertex_store().tags(), [vs[0]], [], |v| {
            g.outgoing(v).map(|he| (he, g.end(he)))
        }) {
            match he {
                None => {
                    sources += 1;
                    assert_eq!(v, vs[0]);
                }
                Some(he) => {
                    assert_eq!(g.end(he), v);
                    assert_eq!(
                        manhattan(&g, vs[0], g.start(he)) + 1.0,
                        manhattan(&g, vs[0], v)
                    );
                }
            }
        }
        assert_eq!(sources, 1);
    }

    #[test]
    fn test_best_first_order_by_key() {
        let (g, vs) = grid_graph(4);
        // Key on distance from the far corner: expansion is greedy towards it.
        let target = *g.vertex_data(vs[15]);
        let order: Vec<_> = best_first(
            g.vertex_store().tags(),
            [vs[0]],
            [],
            |v| g.connected_vertices(v),
            |v| (g.vertex_data(v) - target).norm(),
        )
        .collect();

        assert_eq!(order.len(), 16);
        let pos = order.iter().position(|&v| v == vs[15]).unwrap();
        // The greedy front reaches the target after walking one staircase.
        assert_eq!(pos, 6);
    }

    #[test]
    fn test_best_first_skips_stale_duplicates() {
        let (g, vs) = grid_graph(4);
        let order: Vec<_> = best_first(
            g.vertex_store().tags(),
            [vs[0], vs[0]],
            [vs[1]],
            |v| g.connected_vertices(v),
            |v| g.vertex_data(v).x,
        )
        .collect();
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), order.len());
        assert!(!order.contains(&vs[1]));
        assert_eq!(order.len(), 15);
    }

    #[test]
    fn test_walk_to_min() {
        let (g, vs) = grid_graph(4);
        let key = |v: VertexId| {
            let p = g.vertex_data(v);
            p.x + p.y
        };
        let path: Vec<_> = walk_to_min(vs[15], |v| g.connected_vertices(v), key).collect();
        assert_eq!(path[0], vs[15]);
        assert_eq!(*path.last().unwrap(), vs[0]);
        // Each step lowers x + y by one.
        assert_eq!(path.len(), 7);
        assert!(path.windows(2).all(|w| key(w[1]) < key(w[0])));

        assert_eq!(nearest_min(vs[15], |v| g.connected_vertices(v), key), vs[0]);
        assert_eq!(nearest_max(vs[0], |v| g.connected_vertices(v), key), vs[15]);
    }

    #[test]
    fn test_walk_stops_on_plateau() {
        let (g, vs) = grid_graph(4);
        let flat = |_: VertexId| 1.0;
        let path: Vec<_> = walk_to_max(vs[5], |v| g.connected_vertices(v), flat).collect();
        assert_eq!(path, vec![vs[5]]);
        assert_eq!(nearest_min(vs[5], |v| g.connected_vertices(v), flat), vs[5]);
    }
}
