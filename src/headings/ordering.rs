//! Narrative ordering of categories.
//!
//! Categories become nodes of a dense graph weighted by the cosine similarity
//! of their embeddings. A maximum spanning tree keeps the strongest links, and
//! a breadth-first walk from the best-connected node lays the categories out
//! so related topics end up next to each other.

use log::{debug, info};
use std::collections::VecDeque;

use crate::error::Result;
use crate::headings::cosine_similarity;
use crate::provider::{embed_all, EmbeddingProvider};

/// Undirected, complete graph with a symmetric weight matrix.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    weights: Vec<Vec<f32>>,
}

impl SimilarityGraph {
    /// Weight every pair of nodes by the cosine similarity of their embeddings.
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Self {
        let n = embeddings.len();
        let mut weights = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let similarity = cosine_similarity(&embeddings[i], &embeddings[j]);
                weights[i][j] = similarity;
                weights[j][i] = similarity;
            }
        }
        Self { weights }
    }

    /// Build from a precomputed matrix. Only the upper triangle is read.
    pub fn from_matrix(matrix: Vec<Vec<f32>>) -> Self {
        let n = matrix.len();
        let mut weights = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let w = matrix[i].get(j).copied().unwrap_or(0.0);
                weights[i][j] = w;
                weights[j][i] = w;
            }
        }
        Self { weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.weights[i][j]
    }

    /// Prim's algorithm over the dense matrix, keeping the heaviest edges.
    ///
    /// Grows from node 0; when candidate edges tie, the lower node index wins.
    pub fn maximum_spanning_tree(&self) -> SpanningTree {
        let n = self.len();
        let mut tree = SpanningTree::with_nodes(n);
        if n == 0 {
            return tree;
        }

        let mut in_tree = vec![false; n];
        let mut best = vec![f32::NEG_INFINITY; n];
        let mut parent = vec![0usize; n];

        in_tree[0] = true;
        for j in 1..n {
            best[j] = self.weights[0][j];
        }

        for _ in 1..n {
            let next = (0..n).filter(|&j| !in_tree[j]).fold(None, |acc: Option<usize>, j| match acc {
                Some(b) if !(best[j] > best[b]) => Some(b),
                _ => Some(j),
            });
            let Some(next) = next else { break };

            in_tree[next] = true;
            tree.add_edge(parent[next], next, best[next]);

            for k in 0..n {
                if !in_tree[k] && self.weights[next][k] > best[k] {
                    best[k] = self.weights[next][k];
                    parent[k] = next;
                }
            }
        }

        tree.sort_neighbours();
        tree
    }
}

/// Tree produced by [`SimilarityGraph::maximum_spanning_tree`].
#[derive(Debug, Clone, Default)]
pub struct SpanningTree {
    adjacency: Vec<Vec<usize>>,
    edges: Vec<(usize, usize, f32)>,
}

impl SpanningTree {
    fn with_nodes(n: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); n],
            edges: Vec::new(),
        }
    }

    fn add_edge(&mut self, a: usize, b: usize, weight: f32) {
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.edges.push((a, b, weight));
    }

    fn sort_neighbours(&mut self) {
        for neighbours in &mut self.adjacency {
            neighbours.sort_unstable();
        }
    }

    pub fn edges(&self) -> &[(usize, usize, f32)] {
        &self.edges
    }

    pub fn total_weight(&self) -> f32 {
        self.edges.iter().map(|(_, _, w)| w).sum()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Highest-degree node; the first one in node order on ties.
    pub fn root(&self) -> Option<usize> {
        (0..self.adjacency.len()).fold(None, |acc, node| match acc {
            Some(best) if self.degree(node) <= self.degree(best) => Some(best),
            _ => Some(node),
        })
    }

    /// Breadth-first order from `root`, neighbours taken in node order.
    pub fn bfs(&self, root: usize) -> Vec<usize> {
        let mut visited = vec![false; self.adjacency.len()];
        let mut order = Vec::with_capacity(self.adjacency.len());
        let mut queue = VecDeque::new();

        visited[root] = true;
        queue.push_back(root);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &neighbour in &self.adjacency[node] {
                if !visited[neighbour] {
                    visited[neighbour] = true;
                    queue.push_back(neighbour);
                }
            }
        }
        order
    }
}

/// Node order for a graph: BFS over its maximum spanning tree from the
/// highest-degree node, then any node the walk missed, in node order.
pub fn traversal_order(graph: &SimilarityGraph) -> Vec<usize> {
    let tree = graph.maximum_spanning_tree();
    let mut order = tree.root().map(|root| tree.bfs(root)).unwrap_or_default();

    let mut seen = vec![false; graph.len()];
    for &node in &order {
        seen[node] = true;
    }
    for node in 0..graph.len() {
        if !seen[node] {
            order.push(node);
        }
    }
    order
}

/// Order `categories` for a linear document, given their embeddings.
pub fn order_by_similarity(categories: &[String], embeddings: &[Vec<f32>]) -> Vec<String> {
    let graph = SimilarityGraph::from_embeddings(embeddings);
    traversal_order(&graph)
        .into_iter()
        .map(|i| categories[i].clone())
        .collect()
}

/// Like [`order_by_similarity`], but moves each embedding along with its
/// category so later stages can reuse it.
pub fn order_with_embeddings(
    categories: Vec<String>,
    embeddings: Vec<Vec<f32>>,
) -> (Vec<String>, Vec<Vec<f32>>) {
    let order = traversal_order(&SimilarityGraph::from_embeddings(&embeddings));

    let mut slots: Vec<Option<(String, Vec<f32>)>> =
        categories.into_iter().zip(embeddings).map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .unzip()
}

/// Embed each category and return them in narrative order.
///
/// The output is always a permutation of the input; duplicate labels are kept
/// as separate entries.
pub fn order_categories<E>(embedder: &E, categories: &[String]) -> Result<Vec<String>>
where
    E: EmbeddingProvider + ?Sized,
{
    if categories.len() < 2 {
        return Ok(categories.to_vec());
    }

    let embeddings = embed_all(embedder, categories)?;
    let (ordered, _) = order_with_embeddings(categories.to_vec(), embeddings);

    info!("Ordered {} categories", ordered.len());
    debug!("Category order: {:?}", ordered);
    Ok(ordered)
}
