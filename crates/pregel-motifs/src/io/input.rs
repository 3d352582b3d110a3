//! Edge-list ingestion
//!
//! The job format is a GraphLite-style text file:
//!
//! ```text
//! 4        # total vertex count
//! 4        # total edge count
//! 1 2      # source target [weight], sorted by source
//! 2 3
//! 3 4
//! 4 1
//! ```
//!
//! Blank lines and `#` comments are skipped. All edges of a source must form
//! one contiguous run; the run becomes that vertex's out-edge list.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::InputError;
use crate::pregel::{Edge, PregelRuntime, VertexId, VertexProgram};

/// One vertex and its outgoing edges, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    pub id: VertexId,
    pub edges: Vec<Edge>,
}

/// A fully parsed graph ready to load into a runtime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeList {
    /// Vertex count from the header, if the file had one
    pub declared_vertices: Option<u64>,
    /// Sources first (file order), then sink-only targets (ascending id)
    pub vertices: Vec<VertexRecord>,
    edge_count: usize,
}

impl EdgeList {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Add every vertex with its out-edges to `runtime`
    pub fn load_into<P: VertexProgram>(self, runtime: &mut PregelRuntime<P>) {
        for record in self.vertices {
            runtime.add_vertex(record.id, record.edges);
        }
    }
}

/// Reads edge lists from files or any buffered reader
#[derive(Debug, Clone, Copy)]
pub struct EdgeListReader {
    header: bool,
}

impl Default for EdgeListReader {
    fn default() -> Self {
        Self { header: true }
    }
}

impl EdgeListReader {
    /// Reader for files with the vertex-count and edge-count header lines
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader for plain `source target` lines with no header
    pub fn without_header() -> Self {
        Self { header: false }
    }

    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<EdgeList, InputError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "Reading edge list");
        self.read(BufReader::new(file))
    }

    pub fn parse_str(&self, text: &str) -> Result<EdgeList, InputError> {
        self.read(text.as_bytes())
    }

    pub fn read<R: BufRead>(&self, reader: R) -> Result<EdgeList, InputError> {
        let mut declared_vertices = None;
        let mut declared_edges = None;
        let mut builder = Builder::default();

        for (n, line) in reader.lines().enumerate() {
            let line_no = n + 1;
            let line = line?;
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            if self.header && declared_vertices.is_none() {
                declared_vertices = Some(parse_count(content, line_no, "vertex count")?);
                continue;
            }
            if self.header && declared_edges.is_none() {
                declared_edges = Some(parse_count(content, line_no, "edge count")?);
                continue;
            }

            let (source, edge) = parse_edge(content, line_no)?;
            builder.push(source, edge, line_no)?;
        }

        if self.header && declared_edges.is_none() {
            return Err(InputError::parse(0, "missing vertex count and edge count header"));
        }
        if let Some(expected) = declared_edges {
            let found = builder.edge_count as u64;
            if expected != found {
                return Err(InputError::EdgeCountMismatch { expected, found });
            }
        }

        let list = builder.finish(declared_vertices);
        if let Some(declared) = declared_vertices {
            if declared != list.vertex_count() as u64 {
                tracing::warn!(
                    declared,
                    found = list.vertex_count(),
                    "Header vertex count differs from vertices referenced by edges"
                );
            }
        }
        Ok(list)
    }
}

/// Groups contiguous runs of the same source into vertex records
#[derive(Default)]
struct Builder {
    vertices: Vec<VertexRecord>,
    current: Option<VertexRecord>,
    finished: HashSet<VertexId>,
    targets: BTreeSet<VertexId>,
    edge_count: usize,
}

impl Builder {
    fn push(&mut self, source: VertexId, edge: Edge, line: usize) -> Result<(), InputError> {
        let same_run = self.current.as_ref().is_some_and(|r| r.id == source);
        if !same_run {
            if self.finished.contains(&source) {
                return Err(InputError::UnsortedEdges {
                    line,
                    vertex: source,
                });
            }
            self.flush();
            self.current = Some(VertexRecord {
                id: source,
                edges: Vec::new(),
            });
        }
        if let Some(record) = &mut self.current {
            record.edges.push(edge);
        }
        self.targets.insert(edge.target);
        self.edge_count += 1;
        Ok(())
    }

    fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            self.finished.insert(record.id);
            self.vertices.push(record);
        }
    }

    fn finish(mut self, declared_vertices: Option<u64>) -> EdgeList {
        self.flush();
        // Targets that never appear as a source still need a vertex to receive messages
        for target in &self.targets {
            if !self.finished.contains(target) {
                self.vertices.push(VertexRecord {
                    id: *target,
                    edges: Vec::new(),
                });
            }
        }
        EdgeList {
            declared_vertices,
            vertices: self.vertices,
            edge_count: self.edge_count,
        }
    }
}

fn parse_count(content: &str, line: usize, what: &str) -> Result<u64, InputError> {
    content
        .parse()
        .map_err(|_| InputError::parse(line, format!("invalid {what} '{content}'")))
}

fn parse_id(token: Option<&str>, line: usize, what: &str) -> Result<VertexId, InputError> {
    let token = token.ok_or_else(|| InputError::parse(line, format!("missing {what} vertex")))?;
    token
        .parse::<u64>()
        .map(VertexId::new)
        .map_err(|_| InputError::parse(line, format!("invalid {what} vertex '{token}'")))
}

fn parse_edge(content: &str, line: usize) -> Result<(VertexId, Edge), InputError> {
    let mut fields = content.split_whitespace();
    let source = parse_id(fields.next(), line, "source")?;
    let target = parse_id(fields.next(), line, "target")?;
    let weight = match fields.next() {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| InputError::parse(line, format!("invalid weight '{raw}'")))?,
        None => 0.0,
    };
    if let Some(extra) = fields.next() {
        return Err(InputError::parse(line, format!("unexpected field '{extra}'")));
    }
    Ok((source, Edge::with_weight(target, weight)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ids(list: &EdgeList) -> Vec<u64> {
        list.vertices.iter().map(|v| v.id.get()).collect()
    }

    #[test]
    fn test_read_with_header() {
        let list = EdgeListReader::new()
            .parse_str("4\n4\n1 2\n2 3\n3 4\n4 1\n")
            .unwrap();

        assert_eq!(list.declared_vertices, Some(4));
        assert_eq!(list.vertex_count(), 4);
        assert_eq!(list.edge_count(), 4);
        assert_eq!(ids(&list), vec![1, 2, 3, 4]);
        assert_eq!(list.vertices[3].edges, vec![Edge::new(1u64)]);
    }

    #[test]
    fn test_contiguous_runs_become_one_vertex() {
        let list = EdgeListReader::without_header()
            .parse_str("1 2\n1 3\n1 4 2.5\n2 1\n")
            .unwrap();

        assert_eq!(list.vertices[0].edges.len(), 3);
        assert_eq!(list.vertices[0].edges[2], Edge::with_weight(4u64, 2.5));
        assert_eq!(list.vertices[1].id, VertexId::new(2));
    }

    #[test]
    fn test_sink_targets_are_materialized() {
        let list = EdgeListReader::without_header()
            .parse_str("5 9\n5 7\n6 7\n")
            .unwrap();

        assert_eq!(ids(&list), vec![5, 6, 7, 9]);
        assert!(list.vertices[2].edges.is_empty());
        assert_eq!(list.edge_count(), 3);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "# tiny graph\n2\n\n2 # edges\n1 2\n# mutual\n2 1\n";
        let list = EdgeListReader::new().parse_str(text).unwrap();
        assert_eq!(list.edge_count(), 2);
        assert_eq!(ids(&list), vec![1, 2]);
    }

    #[test]
    fn test_unsorted_source_rejected() {
        let err = EdgeListReader::without_header()
            .parse_str("1 2\n2 3\n1 3\n")
            .unwrap_err();
        assert!(matches!(
            err,
            InputError::UnsortedEdges { line: 3, vertex } if vertex == VertexId::new(1)
        ));
    }

    #[test]
    fn test_edge_count_mismatch() {
        let err = EdgeListReader::new().parse_str("2\n3\n1 2\n2 1\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::EdgeCountMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = EdgeListReader::without_header()
            .parse_str("1 2\n1 x\n")
            .unwrap_err();
        assert!(matches!(err, InputError::Parse { line: 2, .. }));

        let err = EdgeListReader::without_header().parse_str("7\n").unwrap_err();
        assert!(err.to_string().contains("missing target"));

        let err = EdgeListReader::new().parse_str("many\n1\n").unwrap_err();
        assert!(matches!(err, InputError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_missing_header() {
        let err = EdgeListReader::new().parse_str("3\n").unwrap_err();
        assert!(matches!(err, InputError::Parse { .. }));
    }

    #[test]
    fn test_empty_graph() {
        let list = EdgeListReader::new().parse_str("0\n0\n").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2\n2\n1 2\n2 1").unwrap();

        let list = EdgeListReader::new().read_path(file.path()).unwrap();
        assert_eq!(list.vertex_count(), 2);

        let missing = EdgeListReader::new().read_path("/nonexistent/graph.txt");
        assert!(matches!(missing, Err(InputError::Io(_))));
    }
}
