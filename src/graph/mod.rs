//! Site graph of discovered links
//!
//! Nodes are normalized URL strings stored in an index table; edges live in
//! per-node adjacency lists keyed by [`NodeId`]. Back-edges and cycles are
//! plain index pairs, so a page linking to one of its ancestors needs no
//! special handling.

use std::collections::HashMap;

/// Index of a node in a [`SiteGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Directed graph of pages, rooted at the first URL ever added
#[derive(Debug, Clone, Default)]
pub struct SiteGraph {
    urls: Vec<String>,
    index: HashMap<String, NodeId>,
    adjacency: Vec<Vec<NodeId>>,
    edge_count: usize,
}

impl SiteGraph {
    /// Creates an empty graph; the first URL added becomes the root
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph whose root is `root`
    pub fn with_root(root: &str) -> Self {
        let mut graph = Self::new();
        graph.add_node(root);
        graph
    }

    /// Returns the id of `url`, creating the node if it does not exist yet
    pub fn add_node(&mut self, url: &str) -> NodeId {
        if let Some(&id) = self.index.get(url) {
            return id;
        }

        let id = NodeId(self.urls.len());
        self.urls.push(url.to_string());
        self.adjacency.push(Vec::new());
        self.index.insert(url.to_string(), id);
        id
    }

    /// Records that page `from` links to page `to`
    ///
    /// Missing nodes are created (`from` first, so on an empty graph `from`
    /// becomes the root). Returns false if the edge already existed.
    ///
    /// # Example
    ///
    /// ```
    /// use sitemap_crawler::graph::SiteGraph;
    ///
    /// let mut graph = SiteGraph::new();
    /// assert!(graph.add_edge("http://a.com/", "http://a.com/b"));
    /// assert!(graph.add_edge("http://a.com/b", "http://a.com/"));
    /// assert!(!graph.add_edge("http://a.com/", "http://a.com/b"));
    /// assert_eq!(graph.root(), Some("http://a.com/"));
    /// assert_eq!(graph.edge_count(), 2);
    /// ```
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let from = self.add_node(from);
        let to = self.add_node(to);

        let neighbors = &mut self.adjacency[from.0];
        if neighbors.contains(&to) {
            return false;
        }
        neighbors.push(to);
        self.edge_count += 1;
        true
    }

    /// The root node's URL, if any node has been added
    pub fn root(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    pub fn root_id(&self) -> Option<NodeId> {
        if self.urls.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn node_id(&self, url: &str) -> Option<NodeId> {
        self.index.get(url).copied()
    }

    pub fn url(&self, id: NodeId) -> Option<&str> {
        self.urls.get(id.0).map(String::as_str)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.node_id(from), self.node_id(to)) {
            (Some(from), Some(to)) => self.adjacency[from.0].contains(&to),
            _ => false,
        }
    }

    /// Outgoing links of `url`, in insertion order
    ///
    /// Unknown URLs have no neighbors.
    pub fn neighbors<'a>(&'a self, url: &str) -> impl Iterator<Item = &'a str> + 'a {
        let ids: &'a [NodeId] = match self.node_id(url) {
            Some(id) => &self.adjacency[id.0],
            None => &[],
        };
        ids.iter().map(move |id| self.urls[id.0].as_str())
    }

    /// Outgoing links of a node by id
    pub fn neighbor_ids(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All node URLs in insertion order (root first)
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// All edges as `(from, to)` URL pairs
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency.iter().enumerate().flat_map(move |(from, targets)| {
            targets
                .iter()
                .map(move |to| (self.urls[from].as_str(), self.urls[to.0].as_str()))
        })
    }

    pub fn node_count(&self) -> usize {
        self.urls.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
