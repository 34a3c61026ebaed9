// gfa2digraph/src/convert_test.rs

#[cfg(test)]
mod tests {
    use crate::convert::*;
    use crate::digraph::{GraphError, Orientation};
    use std::fs;
    use std::io;
    use std::path::PathBuf;

    fn write_gfa(dir: &tempfile::TempDir, name: &str, content: &str) -> io::Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, content.as_bytes())?;
        Ok(path)
    }

    #[test]
    fn test_id_mapper_subtracts_min_id() {
        let mapper = IdMapper::new(IdRange {
            min_id: 10,
            max_id: 12,
        });
        assert_eq!(mapper.map("10").unwrap(), 0);
        assert_eq!(mapper.map("11").unwrap(), 1);
        assert_eq!(mapper.map("12").unwrap(), 2);
    }

    #[test]
    fn test_id_mapper_rejects_non_numeric() {
        let mapper = IdMapper::new(IdRange {
            min_id: 1,
            max_id: 5,
        });
        for bad in ["abc", "-3", "1.5", ""] {
            match mapper.map(bad) {
                Err(ConvertError::InvalidSegmentId(s)) => assert_eq!(s, bad),
                other => panic!("expected InvalidSegmentId for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_id_mapper_rejects_id_below_range() {
        let mapper = IdMapper::new(IdRange {
            min_id: 10,
            max_id: 12,
        });
        match mapper.map("9") {
            Err(ConvertError::IdBelowRange { id: 9, min_id: 10 }) => {}
            other => panic!("expected IdBelowRange, got {:?}", other),
        }
    }

    #[test]
    fn test_id_range_node_slots() {
        let range = IdRange {
            min_id: 10,
            max_id: 12,
        };
        assert_eq!(range.node_slots(), 3);
        let single = IdRange {
            min_id: 7,
            max_id: 7,
        };
        assert_eq!(single.node_slots(), 1);
    }

    #[test]
    fn test_end_to_end_scenario() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(
            &dir,
            "scenario.gfa",
            "S\t10\tAC\nS\t11\tG\nS\t12\tTT\nL\t10\t+\t11\t+\t0M\nP\tP1\t10+,11+,12+\t*\n",
        )?;

        let graph = gfa_to_digraph(&gfa).unwrap();

        // ids 10..12 map onto 0..2
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.sequence(0), Some("AC"));
        assert_eq!(graph.sequence(1), Some("G"));
        assert_eq!(graph.sequence(2), Some("TT"));

        // one edge 0 -> 1, both endpoints inverted to reverse
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges()[0];
        assert_eq!(edge.from.node, 0);
        assert_eq!(edge.to.node, 1);
        assert_eq!(edge.from.orientation, Orientation::Reverse);
        assert_eq!(edge.to.orientation, Orientation::Reverse);

        // P1 positions accumulate sequence lengths: 0, |AC|, |AC|+|G|
        assert_eq!(graph.path_count(), 1);
        let p1 = graph.path_handles().next().unwrap();
        assert_eq!(graph.path_name(p1), Some("P1"));
        let pos = |id| {
            graph
                .path_positions(id, p1)
                .unwrap()
                .iter()
                .copied()
                .collect::<Vec<usize>>()
        };
        assert_eq!(pos(0), vec![0]);
        assert_eq!(pos(1), vec![2]);
        assert_eq!(pos(2), vec![3]);

        // 0 has no incoming edge, 2 has no edges at all
        assert!(graph.is_start_node(0));
        assert!(!graph.is_start_node(1));
        assert!(graph.is_stop_node(2));
        assert!(graph.is_start_node(2));
        assert!(!graph.is_stop_node(0));
        Ok(())
    }

    #[test]
    fn test_orientation_flags_are_inverted() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(
            &dir,
            "orient.gfa",
            "S\t1\tA\nS\t2\tC\nL\t1\t-\t2\t+\t0M\n",
        )?;

        let graph = gfa_to_digraph(&gfa).unwrap();
        let edge = graph.edges()[0];
        assert_eq!(edge.from.orientation, Orientation::Forward);
        assert_eq!(edge.to.orientation, Orientation::Reverse);
        Ok(())
    }

    #[test]
    fn test_link_with_empty_source_is_skipped() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(
            &dir,
            "skip.gfa",
            "S\t1\tA\nS\t2\tC\nL\t\t+\t2\t+\t0M\nL\t1\t+\t2\t+\t0M\n",
        )?;

        let graph = gfa_to_digraph(&gfa).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].from.node, 0);
        Ok(())
    }

    #[test]
    fn test_sparse_id_space_leaves_gaps() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(&dir, "sparse.gfa", "S\t100\tAAA\nS\t102\tCC\n")?;

        let graph = gfa_to_digraph(&gfa).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert!(graph.has_node(0));
        assert!(!graph.has_node(1));
        assert!(graph.has_node(2));
        assert_eq!(graph.sequence(2), Some("CC"));
        Ok(())
    }

    #[test]
    fn test_no_segments_is_fatal() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(&dir, "nosegs.gfa", "H\tVN:Z:1.0\nL\t1\t+\t2\t+\t0M\n")?;

        match gfa_to_digraph(&gfa) {
            Err(ConvertError::NoSegments(_)) => {}
            other => panic!("expected NoSegments, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let missing = PathBuf::from("does_not_exist.gfa");
        match gfa_to_digraph(&missing) {
            Err(ConvertError::Open { .. }) => {}
            other => panic!("expected Open error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_numeric_segment_id_is_fatal() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(&dir, "badid.gfa", "S\tchr1\tACGT\n")?;

        match gfa_to_digraph(&gfa) {
            Err(ConvertError::InvalidSegmentId(s)) => assert_eq!(s, "chr1"),
            other => panic!("expected InvalidSegmentId, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }

    #[test]
    fn test_link_to_undeclared_segment_is_fatal() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        // ids 1 and 3 exist, the link names the id 2 gap between them
        let gfa = write_gfa(
            &dir,
            "dangling.gfa",
            "S\t1\tA\nS\t3\tC\nL\t1\t+\t2\t+\t0M\n",
        )?;

        match gfa_to_digraph(&gfa) {
            Err(ConvertError::Graph(GraphError::UnknownNode(1))) => {}
            other => panic!("expected UnknownNode, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }

    #[test]
    fn test_duplicate_path_position_is_non_fatal() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        // an empty sequence makes two visits land on the same offset
        let gfa = write_gfa(&dir, "dup.gfa", "S\t5\t*\nP\tp\t5+,5+\t*\n")?;

        let graph = gfa_to_digraph(&gfa).unwrap();
        let p = graph.path_handles().next().unwrap();
        let positions: Vec<usize> = graph.path_positions(0, p).unwrap().iter().copied().collect();
        assert_eq!(positions, vec![0]);
        Ok(())
    }

    #[test]
    fn test_node_appearing_twice_on_path_records_both_offsets() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(
            &dir,
            "revisit.gfa",
            "S\t1\tACGT\nS\t2\tGG\nP\tp\t1+,2+,1-\t*\n",
        )?;

        let graph = gfa_to_digraph(&gfa).unwrap();
        let p = graph.path_handles().next().unwrap();
        let positions: Vec<usize> = graph.path_positions(0, p).unwrap().iter().copied().collect();
        assert_eq!(positions, vec![0, 6]); // 0, then |ACGT| + |GG|
        Ok(())
    }

    #[test]
    fn test_conversion_is_idempotent() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let gfa = write_gfa(
            &dir,
            "twice.gfa",
            "S\t10\tAC\nS\t11\tG\nS\t12\tTT\nL\t10\t+\t11\t+\t0M\nP\tP1\t10+,11+,12+\t*\n",
        )?;

        let first = gfa_to_digraph(&gfa).unwrap();
        let second = gfa_to_digraph(&gfa).unwrap();

        assert_eq!(first.node_count(), second.node_count());
        assert_eq!(first.edges(), second.edges());
        assert_eq!(first.path_count(), second.path_count());
        assert_eq!(first.start_nodes(), second.start_nodes());
        assert_eq!(first.stop_nodes(), second.stop_nodes());
        for id in first.node_ids() {
            assert_eq!(first.sequence(id), second.sequence(id));
        }
        Ok(())
    }
}
