//! File output.
//!
//! Two bit-exact formats, both 1-based on disk: the ASCII edge list
//! (`e <u> <v>` lines, optional `p <n> <m>` header) and the binary edge list
//! (pairs of 64-bit little-endian ids, optional `n m` header). Degree
//! histograms are reduced to the root and written one count per line.
//!
//! In single-file mode the root creates the file and writes the header, then
//! every participant appends its edges in rank order, with a barrier closing
//! each turn. In per-rank mode each participant writes `<path>_<rank>` with
//! its local edge count in the header.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;

use crate::comm::{Communicator, ROOT};
use crate::config::{GeneratorConfig, OutputConfig, OutputFormat};
use crate::generator::Generated;
use crate::sink::{EdgeSink, SinkMode};
use crate::{Edge, Error};

/// Writes the result of a completed run per the configuration. Collective in
/// degrees and single-file modes.
pub fn write<C: Communicator>(
    config: &GeneratorConfig,
    comm: &C,
    generated: &Generated,
) -> Result<(), Error> {
    match config.sink_mode {
        SinkMode::Edges => write_edges(config, comm, &generated.edges),
        SinkMode::Degrees => write_distribution(config, comm, &generated.degrees),
    }
}

pub(crate) fn write_sink<C: Communicator>(
    config: &GeneratorConfig,
    comm: &C,
    sink: &EdgeSink,
) -> Result<(), Error> {
    match sink.mode() {
        SinkMode::Edges => write_edges(config, comm, sink.edges()),
        SinkMode::Degrees => write_distribution(config, comm, sink.degrees()),
    }
}

fn output_config(config: &GeneratorConfig) -> Result<&OutputConfig, Error> {
    config.output.as_ref().ok_or(Error::NoOutput)
}

fn write_edges<C: Communicator>(
    config: &GeneratorConfig,
    comm: &C,
    edges: &[Edge],
) -> Result<(), Error> {
    let out = output_config(config)?;
    let start = Instant::now();

    if out.single_file {
        // The header needs the global edge count; every rank takes part in
        // the reduction before the root touches the file.
        let total_edges = comm.allreduce_sum(edges.len() as u64);

        if comm.rank() == ROOT {
            let mut file = BufWriter::new(File::create(&out.file)?);
            if out.header {
                write_header(&mut file, out.format, config.effective_n(), total_edges)?;
            }
            file.flush()?;
        }

        for pe in 0..comm.size() {
            if pe == comm.rank() {
                let file = OpenOptions::new().append(true).open(&out.file)?;
                let mut file = BufWriter::new(file);
                append_edges(&mut file, out.format, edges)?;
                file.flush()?;
            }
            comm.barrier();
        }
    } else {
        let path = rank_file(&out.file, comm.rank());
        let mut file = BufWriter::new(File::create(&path)?);
        if out.header {
            write_header(&mut file, out.format, config.effective_n(), edges.len() as u64)?;
        }
        append_edges(&mut file, out.format, edges)?;
        file.flush()?;
    }

    let elapsed = start.elapsed().as_millis() as f64 / 1000.0;
    info!(
        "rank {}: wrote {} edges to {} in {:.2}s",
        comm.rank(),
        edges.len(),
        out.file.display(),
        elapsed
    );
    Ok(())
}

fn write_distribution<C: Communicator>(
    config: &GeneratorConfig,
    comm: &C,
    degrees: &[u64],
) -> Result<(), Error> {
    let out = output_config(config)?;

    if let Some(total) = comm.reduce_sum(degrees) {
        let mut file = BufWriter::new(File::create(&out.file)?);
        for count in total {
            writeln!(file, "{count}")?;
        }
        file.flush()?;
        info!(
            "rank {}: wrote {} degree counts to {}",
            comm.rank(),
            degrees.len(),
            out.file.display()
        );
    }
    Ok(())
}

/// `<path>_<rank>`, the per-participant file name.
pub fn rank_file(path: &Path, rank: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!("_{rank}"));
    PathBuf::from(name)
}

fn write_header<W: Write>(
    out: &mut W,
    format: OutputFormat,
    n: u64,
    m: u64,
) -> Result<(), Error> {
    match format {
        OutputFormat::EdgeList => writeln!(out, "p {n} {m}")?,
        OutputFormat::BinaryEdgeList => {
            out.write_all(&n.to_le_bytes())?;
            out.write_all(&m.to_le_bytes())?;
        }
    }
    Ok(())
}

fn append_edges<W: Write>(out: &mut W, format: OutputFormat, edges: &[Edge]) -> Result<(), Error> {
    match format {
        OutputFormat::EdgeList => {
            for &(u, v) in edges {
                writeln!(out, "e {} {}", u + 1, v + 1)?;
            }
        }
        OutputFormat::BinaryEdgeList => {
            for &(u, v) in edges {
                out.write_all(&(u + 1).to_le_bytes())?;
                out.write_all(&(v + 1).to_le_bytes())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleProcess;
    use crate::config::Model;

    fn generated(edges: Vec<Edge>) -> Generated {
        Generated {
            num_edges: edges.len() as u64,
            edges,
            degrees: Vec::new(),
            vertex_range: (0, 3),
        }
    }

    fn config_with(out: OutputConfig) -> GeneratorConfig {
        GeneratorConfig::new(Model::GnpDirected)
            .nodes(4)
            .probability(0.5)
            .output(out)
    }

    #[test]
    fn text_edge_list_is_one_based_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph");
        let config = config_with(OutputConfig::new(&path).single_file(true));

        write(&config, &SingleProcess, &generated(vec![(0, 1), (2, 3)])).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "p 4 2\ne 1 2\ne 3 4\n");
    }

    #[test]
    fn text_edge_list_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph");
        let config = config_with(OutputConfig::new(&path).single_file(true).header(false));

        write(&config, &SingleProcess, &generated(vec![(0, 1)])).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "e 1 2\n");
    }

    #[test]
    fn binary_edge_list_is_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph");
        let config = config_with(
            OutputConfig::new(&path)
                .format(OutputFormat::BinaryEdgeList)
                .single_file(true),
        );

        write(&config, &SingleProcess, &generated(vec![(0, 1)])).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..8], &4u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1u64.to_le_bytes());
        assert_eq!(&bytes[16..24], &1u64.to_le_bytes());
        assert_eq!(&bytes[24..32], &2u64.to_le_bytes());
    }

    #[test]
    fn per_rank_mode_suffixes_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph");
        let config = config_with(OutputConfig::new(&path));

        write(&config, &SingleProcess, &generated(vec![(1, 2)])).unwrap();

        let content = std::fs::read_to_string(rank_file(&path, 0)).unwrap();
        assert_eq!(content, "p 4 1\ne 2 3\n");
    }

    #[test]
    fn missing_output_config_is_an_error() {
        let config = GeneratorConfig::new(Model::GnpDirected).nodes(4).probability(0.5);
        let result = write(&config, &SingleProcess, &generated(vec![]));
        assert!(matches!(result, Err(Error::NoOutput)));
    }
}
