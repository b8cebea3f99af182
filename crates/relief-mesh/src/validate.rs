//! Mesh validation and reporting.
//!
//! Generated solids duplicate vertices along seams (walls carry their own
//! normals), so topology is checked on a copy welded by exact position.

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::adjacency::MeshAdjacency;
use crate::Mesh;

/// Area below which a face counts as degenerate, in mm².
const DEGENERATE_AREA: f64 = 1e-12;

/// Validation report for a mesh.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// Total vertex count.
    pub vertex_count: usize,

    /// Total face count.
    pub face_count: usize,

    /// Number of distinct vertex positions.
    pub welded_vertex_count: usize,

    /// Number of boundary edges after welding.
    pub boundary_edge_count: usize,

    /// Number of edges shared by more than two faces after welding.
    pub non_manifold_edge_count: usize,

    /// Number of directed edges walked the same way by several faces.
    pub inconsistent_edge_count: usize,

    /// Number of zero-area faces.
    pub degenerate_face_count: usize,

    /// Bounding box as (min_corner, max_corner).
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,

    /// Dimensions (x, y, z).
    pub dimensions: Option<(f64, f64, f64)>,
}

impl MeshReport {
    /// Whether the welded mesh has no boundary edges.
    pub fn is_watertight(&self) -> bool {
        self.boundary_edge_count == 0
    }

    /// Whether all welded edges have at most 2 adjacent faces.
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Whether neighboring faces agree on orientation.
    pub fn is_consistently_wound(&self) -> bool {
        self.inconsistent_edge_count == 0
    }

    /// Check if mesh is suitable for 3D printing.
    pub fn is_printable(&self) -> bool {
        self.face_count > 0
            && self.is_watertight()
            && self.is_manifold()
            && self.is_consistently_wound()
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(
            f,
            "  Vertices: {} ({} distinct positions)",
            self.vertex_count, self.welded_vertex_count
        )?;
        writeln!(f, "  Faces: {}", self.face_count)?;

        if let Some((dx, dy, dz)) = &self.dimensions {
            writeln!(f, "  Dimensions: {:.1} x {:.1} x {:.1} mm", dx, dy, dz)?;
        }

        writeln!(
            f,
            "  Watertight: {} (boundary edges: {})",
            if self.is_watertight() { "yes" } else { "NO" },
            self.boundary_edge_count
        )?;
        writeln!(
            f,
            "  Manifold: {} (non-manifold edges: {})",
            if self.is_manifold() { "yes" } else { "NO" },
            self.non_manifold_edge_count
        )?;
        writeln!(
            f,
            "  Winding: {} (inconsistent edges: {})",
            if self.is_consistently_wound() { "consistent" } else { "MIXED" },
            self.inconsistent_edge_count
        )?;
        writeln!(
            f,
            "  Printable: {}",
            if self.is_printable() { "yes" } else { "NO" }
        )?;

        Ok(())
    }
}

/// Remap faces onto one index per distinct position.
///
/// Returns the welded faces and the number of distinct positions.
pub fn weld_faces(mesh: &Mesh) -> (Vec<[u32; 3]>, usize) {
    let mut canonical: HashMap<[u64; 3], u32> = HashMap::new();
    let remap: Vec<u32> = mesh
        .vertices
        .iter()
        .map(|v| {
            let p = v.position;
            // Normalize -0.0 so it welds with 0.0.
            let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
            let next = canonical.len() as u32;
            *canonical.entry(key).or_insert(next)
        })
        .collect();

    let faces = mesh
        .faces
        .iter()
        .filter_map(|&[a, b, c]| {
            Some([
                *remap.get(a as usize)?,
                *remap.get(b as usize)?,
                *remap.get(c as usize)?,
            ])
        })
        .collect();

    (faces, canonical.len())
}

/// Validate a mesh and return a report.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let (welded, welded_vertex_count) = weld_faces(mesh);
    let adjacency = MeshAdjacency::build(&welded);

    let degenerate_face_count = (0..mesh.face_count())
        .filter_map(|i| mesh.triangle(i))
        .filter(|tri| tri.is_degenerate(DEGENERATE_AREA))
        .count();

    let bounds = mesh.bounds();
    let dimensions = bounds.map(|(min, max)| (max.x - min.x, max.y - min.y, max.z - min.z));

    let report = MeshReport {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        welded_vertex_count,
        boundary_edge_count: adjacency.boundary_edge_count(),
        non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        inconsistent_edge_count: adjacency.inconsistent_edge_count(),
        degenerate_face_count,
        bounds,
        dimensions,
    };

    debug!("{}", report);

    report
}

/// Log a summary of mesh validation.
pub fn log_validation(report: &MeshReport) {
    info!(
        "Mesh: {} verts, {} faces, {}x{}x{} mm",
        report.vertex_count,
        report.face_count,
        report.dimensions.map(|d| format!("{:.1}", d.0)).unwrap_or_default(),
        report.dimensions.map(|d| format!("{:.1}", d.1)).unwrap_or_default(),
        report.dimensions.map(|d| format!("{:.1}", d.2)).unwrap_or_default(),
    );

    if report.is_printable() {
        info!("Mesh is watertight, manifold and consistently wound (printable)");
    } else {
        if !report.is_watertight() {
            warn!("Not watertight: {} boundary edges", report.boundary_edge_count);
        }
        if !report.is_manifold() {
            warn!("Not manifold: {} non-manifold edges", report.non_manifold_edge_count);
        }
        if !report.is_consistently_wound() {
            warn!("Mixed winding: {} inconsistent edges", report.inconsistent_edge_count);
        }
    }

    if report.degenerate_face_count > 0 {
        warn!("{} zero-area faces", report.degenerate_face_count);
    }
}
