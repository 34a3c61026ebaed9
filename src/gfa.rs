// GFA v1 record scanner
//
// Streaming, line-oriented reader for the three record kinds the converter
// consumes: segments (S), links (L), and paths (P). Records are yielded one
// at a time; the file is never materialized into an intermediate form.
// Header (H), comment, and any other lines are skipped by the record
// iterator but still visible to the line counter.

use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::utils::xzopen;

#[path = "gfa_test.rs"]
mod gfa_test;

/// An S line: named segment carrying a sequence.
///
/// A missing sequence (`*` in the file) is represented as an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRecord {
    pub name: String,
    pub sequence: String,
}

/// An L line: directed adjacency between two oriented segments.
///
/// The source name may be empty; the GFA dialect we accept allows such
/// records and the converter skips them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub source_name: String,
    pub source_orientation_forward: bool,
    pub sink_name: String,
    pub sink_orientation_forward: bool,
}

/// One step of a path: a segment name plus its orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub segment_name: String,
    pub orientation_forward: bool,
}

/// A P line: named ordered traversal of oriented segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    pub name: String,
    pub steps: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfaRecord {
    Segment(SegmentRecord),
    Link(LinkRecord),
    Path(PathRecord),
}

/// Streaming GFA reader over any byte source.
pub struct GfaReader {
    reader: BufReader<Box<dyn Read>>,
    line: String,
}

impl GfaReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        GfaReader {
            reader: BufReader::new(reader),
            line: String::new(),
        }
    }

    /// Open a GFA file (auto-detects gzip by .gz extension).
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Ok(GfaReader::new(xzopen(path, "r")?))
    }

    /// Read the next S, L, or P record, skipping every other line kind.
    ///
    /// # Returns
    /// * `Ok(Some(record))` for the next record
    /// * `Ok(None)` at end of input
    /// * `Err(io::Error)` with kind `InvalidData` for a malformed record
    pub fn read_record(&mut self) -> io::Result<Option<GfaRecord>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None); // EOF
            }
            let line = self.line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            match line.as_bytes()[0] {
                b'S' => return Ok(Some(GfaRecord::Segment(parse_segment_line(line)?))),
                b'L' => return Ok(Some(GfaRecord::Link(parse_link_line(line)?))),
                b'P' => return Ok(Some(GfaRecord::Path(parse_path_line(line)?))),
                _ => continue,
            }
        }
    }
}

fn malformed(kind: &str, line: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("malformed {} line: {:?}", kind, line),
    )
}

fn parse_orientation(field: &str, line: &str) -> io::Result<bool> {
    match field {
        "+" => Ok(true),
        "-" => Ok(false),
        _ => Err(malformed("link", line)),
    }
}

fn parse_segment_line(line: &str) -> io::Result<SegmentRecord> {
    let mut fields = line.split('\t');
    fields.next(); // marker
    let name = match fields.next() {
        Some(f) if !f.is_empty() => f,
        _ => return Err(malformed("segment", line)),
    };
    let sequence = fields.next().ok_or_else(|| malformed("segment", line))?;
    Ok(SegmentRecord {
        name: name.to_string(),
        sequence: if sequence == "*" {
            String::new()
        } else {
            sequence.to_string()
        },
    })
}

fn parse_link_line(line: &str) -> io::Result<LinkRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 5 {
        return Err(malformed("link", line));
    }
    Ok(LinkRecord {
        source_name: fields[1].to_string(),
        source_orientation_forward: parse_orientation(fields[2], line)?,
        sink_name: fields[3].to_string(),
        sink_orientation_forward: parse_orientation(fields[4], line)?,
    })
}

fn parse_path_line(line: &str) -> io::Result<PathRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 || fields[1].is_empty() {
        return Err(malformed("path", line));
    }
    let mut steps = Vec::new();
    if fields[2] != "*" {
        for step in fields[2].split(',') {
            if step.len() < 2 {
                return Err(malformed("path", line));
            }
            let (name, orient) = step.split_at(step.len() - 1);
            let orientation_forward = match orient {
                "+" => true,
                "-" => false,
                _ => return Err(malformed("path", line)),
            };
            steps.push(PathStep {
                segment_name: name.to_string(),
                orientation_forward,
            });
        }
    }
    Ok(PathRecord {
        name: fields[1].to_string(),
        steps,
    })
}

/// Count the number of lines of each kind in a GFA file.
///
/// Every line contributes one count under its first byte, so the result maps
/// `b'S'`/`b'L'`/`b'P'` (and any other leading byte) to the number of lines
/// of that kind. Plain files are scanned through a memory map; gzipped files
/// fall back to a streaming scan over the decoded bytes.
pub fn gfa_line_counts(path: &Path) -> io::Result<HashMap<u8, u64>> {
    let mut counts = HashMap::new();
    let mut at_line_start = true;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let mut reader = xzopen(path, "r")?;
        let mut buf = [0u8; 16384];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            count_line_markers(&mut counts, &buf[..n], &mut at_line_start);
        }
    } else {
        let file = File::open(path)?;
        // zero-length files cannot be mapped
        if file.metadata()?.len() > 0 {
            let mmap = unsafe { Mmap::map(&file)? };
            count_line_markers(&mut counts, &mmap, &mut at_line_start);
        }
    }

    Ok(counts)
}

fn count_line_markers(counts: &mut HashMap<u8, u64>, chunk: &[u8], at_line_start: &mut bool) {
    for &b in chunk {
        if *at_line_start {
            *counts.entry(b).or_insert(0) += 1;
        }
        *at_line_start = b == b'\n';
    }
}
