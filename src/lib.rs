pub mod convert; // GFA -> DiGraph conversion pipeline
pub mod digraph; // Directed graph container (vertices, edges, paths, start/stop sets)
pub mod gfa; // GFA v1 record scanner and line counter
pub mod utils;
