// GFA to directed-graph conversion pipeline
//
// One preprocessing pass over the file (record-kind counts and the segment
// id range, run as two concurrent sub-scans) sizes the graph. Three
// ingestion passes then populate it in fixed order: segments as nodes,
// links as edges, and finally paths as per-node position annotations. A
// last pass classifies start and stop nodes. External segment ids are
// arbitrary unsigned integers; subtracting the minimum id maps them onto
// the dense zero-based id space the graph uses.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::digraph::{DiGraph, GraphError, NodeId, Orientation};
use crate::gfa::{self, GfaReader, GfaRecord};
use crate::utils;

#[path = "convert_test.rs"]
mod convert_test;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("couldn't open GFA file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error reading GFA file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("segment id {0:?} is not an unsigned integer")]
    InvalidSegmentId(String),
    #[error("segment id {id} is below the minimum id {min_id} found in preprocessing")]
    IdBelowRange { id: u64, min_id: u64 },
    #[error("GFA file {} contains no segment records", .0.display())]
    NoSegments(PathBuf),
    #[error("{segment_count} segment records counted but none found by the id-range scan")]
    EmptyIdRange { segment_count: u64 },
    #[error("graph has {built} nodes but the file has {expected} segment records")]
    NodeCountMismatch { built: usize, expected: u64 },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn io_error(path: &Path, source: io::Error) -> ConvertError {
    match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ConvertError::Open {
            path: path.to_path_buf(),
            source,
        },
        _ => ConvertError::Read {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Minimum and maximum external segment id in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub min_id: u64,
    pub max_id: u64,
}

impl IdRange {
    /// Number of vertex slots needed to host every id in the range.
    pub fn node_slots(&self) -> usize {
        (self.max_id - self.min_id + 1) as usize
    }
}

/// Pure translation from external segment ids to dense internal ids,
/// `internal = external - min_id`.
#[derive(Debug, Clone, Copy)]
pub struct IdMapper {
    offset: u64,
}

impl IdMapper {
    pub fn new(range: IdRange) -> Self {
        IdMapper {
            offset: range.min_id,
        }
    }

    pub fn map(&self, name: &str) -> Result<NodeId, ConvertError> {
        let id: u64 = name
            .parse()
            .map_err(|_| ConvertError::InvalidSegmentId(name.to_string()))?;
        let internal = id.checked_sub(self.offset).ok_or(ConvertError::IdBelowRange {
            id,
            min_id: self.offset,
        })?;
        Ok(internal as NodeId)
    }
}

/// Scan all segment records and fold their ids into an [`IdRange`].
///
/// Returns `None` when the file has no segment records.
fn scan_id_range(path: &Path) -> Result<Option<IdRange>, ConvertError> {
    let mut reader = GfaReader::from_path(path).map_err(|e| io_error(path, e))?;
    let mut range: Option<IdRange> = None;
    while let Some(rec) = reader.read_record().map_err(|e| io_error(path, e))? {
        if let GfaRecord::Segment(s) = rec {
            let id: u64 = s
                .name
                .parse()
                .map_err(|_| ConvertError::InvalidSegmentId(s.name.clone()))?;
            range = Some(match range {
                None => IdRange {
                    min_id: id,
                    max_id: id,
                },
                Some(r) => IdRange {
                    min_id: r.min_id.min(id),
                    max_id: r.max_id.max(id),
                },
            });
        }
    }
    Ok(range)
}

/// Run the two preprocessing sub-scans concurrently and merge their results.
///
/// The sub-scans are independent reads over the same file; each returns its
/// own result and the merge happens here, after both have completed.
fn preprocess(path: &Path) -> Result<(HashMap<u8, u64>, Option<IdRange>), ConvertError> {
    let (counts, range) = rayon::join(|| gfa::gfa_line_counts(path), || scan_id_range(path));
    Ok((counts.map_err(|e| io_error(path, e))?, range?))
}

/// Ingestion stages, in required order. Links and paths dereference nodes
/// by internal id, so segments must land first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildStage {
    Empty,
    NodesLoaded,
    EdgesLoaded,
    PathsLoaded,
    Finalized,
}

/// GFA orientation flags and internal handle orientations are logical
/// opposites: a forward (`+`) column becomes a reverse handle endpoint and
/// vice versa.
fn handle_orientation(orientation_forward: bool) -> Orientation {
    if orientation_forward {
        Orientation::Reverse
    } else {
        Orientation::Forward
    }
}

struct GraphBuilder<'a> {
    source: &'a Path,
    graph: DiGraph,
    mapper: IdMapper,
    stage: BuildStage,
    skipped_links: u64,
    rejected_positions: u64,
}

impl<'a> GraphBuilder<'a> {
    fn new(source: &'a Path, graph: DiGraph, mapper: IdMapper) -> Self {
        GraphBuilder {
            source,
            graph,
            mapper,
            stage: BuildStage::Empty,
            skipped_links: 0,
            rejected_positions: 0,
        }
    }

    fn records(&self) -> Result<GfaReader, ConvertError> {
        GfaReader::from_path(self.source).map_err(|e| io_error(self.source, e))
    }

    fn ingest_segments(&mut self, expected: u64) -> Result<(), ConvertError> {
        assert_eq!(
            self.stage,
            BuildStage::Empty,
            "segments must be ingested into an empty graph"
        );
        let mut reader = self.records()?;
        while let Some(rec) = reader.read_record().map_err(|e| io_error(self.source, e))? {
            if let GfaRecord::Segment(s) = rec {
                let id = self.mapper.map(&s.name)?;
                self.graph.create_handle(&s.sequence, id)?;
            }
        }
        if self.graph.node_count() as u64 != expected {
            return Err(ConvertError::NodeCountMismatch {
                built: self.graph.node_count(),
                expected,
            });
        }
        self.stage = BuildStage::NodesLoaded;
        log::debug!("nodes added, graph size: {}", self.graph.node_count());
        Ok(())
    }

    fn ingest_links(&mut self) -> Result<(), ConvertError> {
        assert_eq!(
            self.stage,
            BuildStage::NodesLoaded,
            "links require nodes to be loaded"
        );
        let mut reader = self.records()?;
        while let Some(rec) = reader.read_record().map_err(|e| io_error(self.source, e))? {
            if let GfaRecord::Link(l) = rec {
                if l.source_name.is_empty() {
                    // the format allows link records that carry no edge
                    self.skipped_links += 1;
                    continue;
                }
                let from = self.graph.get_handle(
                    self.mapper.map(&l.source_name)?,
                    handle_orientation(l.source_orientation_forward),
                )?;
                let to = self.graph.get_handle(
                    self.mapper.map(&l.sink_name)?,
                    handle_orientation(l.sink_orientation_forward),
                )?;
                self.graph.create_edge(from, to)?;
            }
        }
        self.stage = BuildStage::EdgesLoaded;
        log::debug!("edges added, edge count: {}", self.graph.edge_count());
        Ok(())
    }

    fn ingest_paths(&mut self, path_count: u64) -> Result<(), ConvertError> {
        assert_eq!(
            self.stage,
            BuildStage::EdgesLoaded,
            "paths require edges to be loaded"
        );
        if path_count > 0 {
            let mut reader = self.records()?;
            while let Some(rec) = reader.read_record().map_err(|e| io_error(self.source, e))? {
                if let GfaRecord::Path(p) = rec {
                    self.ingest_path(&p)?;
                }
            }
        }
        self.stage = BuildStage::PathsLoaded;
        log::debug!("paths added, path count: {}", self.graph.path_count());
        Ok(())
    }

    /// Sequential left-to-right fold over one path's steps: each step's
    /// recorded offset is the sum of the sequence lengths of all prior
    /// steps, so steps cannot be reordered or parallelized.
    fn ingest_path(&mut self, p: &gfa::PathRecord) -> Result<(), ConvertError> {
        let handle = self.graph.create_path_handle(&p.name);
        let mut cursor = 0usize;
        for step in &p.steps {
            let id = self.mapper.map(&step.segment_name)?;
            let vertex = self
                .graph
                .get_vertex_mut(id)
                .ok_or(GraphError::UnknownNode(id))?;
            if let Err(e) = vertex.add_path_position(handle, cursor) {
                log::warn!("path {}: {}", p.name, e);
                self.rejected_positions += 1;
            }
            cursor += vertex.sequence().len();
        }
        Ok(())
    }

    fn finalize(mut self) -> DiGraph {
        assert_eq!(
            self.stage,
            BuildStage::PathsLoaded,
            "finalization requires all ingestion passes to have run"
        );
        self.graph.compute_start_nodes();
        self.graph.compute_stop_nodes();
        self.stage = BuildStage::Finalized;
        self.graph
    }
}

/// Read a GFA file into a [`DiGraph`].
///
/// Preprocesses the file to size the graph, runs the three ingestion passes
/// in order, and classifies start/stop nodes. Any fatal condition aborts
/// the conversion; no partial graph is returned.
pub fn gfa_to_digraph(path: &Path) -> Result<DiGraph, ConvertError> {
    let t_real = utils::realtime();
    let t_cpu = utils::cputime();
    log::info!("Converting {} to a directed graph", path.display());

    let (line_counts, id_range) = preprocess(path)?;

    let segment_count = line_counts.get(&b'S').copied().unwrap_or(0);
    let link_count = line_counts.get(&b'L').copied().unwrap_or(0);
    let path_count = line_counts.get(&b'P').copied().unwrap_or(0);

    if segment_count == 0 {
        return Err(ConvertError::NoSegments(path.to_path_buf()));
    }
    let id_range = id_range.ok_or(ConvertError::EmptyIdRange { segment_count })?;

    log::debug!(
        "{} segments, {} links, {} paths; id range [{}, {}]",
        segment_count,
        link_count,
        path_count,
        id_range.min_id,
        id_range.max_id
    );

    let graph = DiGraph::with_capacity(id_range.node_slots(), path_count as usize);
    let mut builder = GraphBuilder::new(path, graph, IdMapper::new(id_range));
    builder.ingest_segments(segment_count)?;
    builder.ingest_links()?;
    builder.ingest_paths(path_count)?;

    if builder.skipped_links > 0 {
        log::debug!("skipped {} link(s) with no source segment", builder.skipped_links);
    }
    if builder.rejected_positions > 0 {
        log::warn!(
            "{} path position(s) rejected by the graph",
            builder.rejected_positions
        );
    }

    let graph = builder.finalize();
    log::info!(
        "Built graph with {} nodes, {} edges, {} paths ({} start, {} stop); {:.3}s real, {:.3}s CPU",
        graph.node_count(),
        graph.edge_count(),
        graph.path_count(),
        graph.start_nodes().len(),
        graph.stop_nodes().len(),
        utils::realtime() - t_real,
        utils::cputime() - t_cpu
    );
    Ok(graph)
}
