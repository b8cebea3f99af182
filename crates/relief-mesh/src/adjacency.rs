//! Edge adjacency for closure and winding checks.

use hashbrown::HashMap;

/// Edge-to-face relationships of a face list.
///
/// Undirected edges are keyed as (min_idx, max_idx); directed edges keep the
/// order in which a face traverses them.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    /// Maps edge (min_idx, max_idx) → faces that share this edge.
    pub edge_to_faces: HashMap<(u32, u32), Vec<u32>>,

    /// Maps directed edge (from, to) → number of faces traversing it that way.
    pub directed_edges: HashMap<(u32, u32), u32>,
}

impl MeshAdjacency {
    /// Build adjacency structures from a face list.
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        let mut directed_edges: HashMap<(u32, u32), u32> = HashMap::new();

        for (face_idx, &[v0, v1, v2]) in faces.iter().enumerate() {
            let face_idx = face_idx as u32;
            for &(a, b) in &[(v0, v1), (v1, v2), (v2, v0)] {
                let edge_key = if a < b { (a, b) } else { (b, a) };
                edge_to_faces.entry(edge_key).or_default().push(face_idx);
                *directed_edges.entry((a, b)).or_default() += 1;
            }
        }

        Self {
            edge_to_faces,
            directed_edges,
        }
    }

    /// Count boundary edges (edges with exactly 1 adjacent face).
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Count non-manifold edges (edges with more than 2 adjacent faces).
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Count directed edges traversed in the same direction by several faces.
    ///
    /// Two consistently wound neighbors always walk their shared edge in
    /// opposite directions.
    pub fn inconsistent_edge_count(&self) -> usize {
        self.directed_edges.values().filter(|&&n| n > 1).count()
    }

    /// Check if every edge has exactly two faces.
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() == 2)
    }

    /// Check if every edge has at most two faces.
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Get faces adjacent to an edge.
    /// The edge is automatically canonicalized (min, max).
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[u32]> {
        let edge_key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
        self.edge_to_faces.get(&edge_key).map(|v| v.as_slice())
    }
}
