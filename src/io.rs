//! Reading inputs and writing results as plain-text files.
//!
//! Every path ending in `.gz` is read or written gzip-compressed.
//!
//! Inputs:
//! - labelled distance matrix as TSV: a header row `\tname1\tname2...`, then
//!   one row `name\td1\td2...` per taxon (the layout [`write_distances_tsv`]
//!   produces);
//! - FASTA alignment: `>name` lines, each followed by its sequence, possibly
//!   wrapped over several lines.
//!
//! Outputs: split systems as TSV, trees as Newick and graphs as edge lists.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use itertools::Itertools;

use crate::characters::CharacterMatrix;
use crate::distances::DistanceMatrix;
use crate::error::{Result, SplitsError};
use crate::graph::PhyloGraph;
use crate::splits::SplitSystem;
use crate::taxa::Taxa;

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

/// Buffered reader over `path`, decompressing `.gz` files.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    let file = File::open(p)?;
    Ok(if is_gz(p) {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

/// Buffered writer to `path`, compressing when it ends in `.gz`.
/// `-` (stdout) is not supported.
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<Box<dyn Write>> {
    let p = path.as_ref();
    if p.as_os_str() == "-" {
        return Err(SplitsError::InvalidInput(
            "writing to stdout is not supported".to_string(),
        ));
    }

    let out: Box<dyn Write> = if is_gz(p) {
        let f = File::create(p)?;
        let enc = GzEncoder::new(f, Compression::default());
        Box::new(BufWriter::new(enc))
    } else {
        Box::new(BufWriter::new(File::create(p)?))
    };
    Ok(out)
}

/// Reads a labelled TSV distance matrix from `path`.
///
/// # Errors
/// `Io` if the file cannot be read, `InvalidInput` if it is malformed.
pub fn read_distances_tsv<P: AsRef<Path>>(path: P) -> Result<(Taxa, DistanceMatrix)> {
    parse_distances_tsv(open_input(path)?)
}

/// Parses a labelled TSV distance matrix. Blank lines are ignored; row names
/// must repeat the header names in the same order.
pub fn parse_distances_tsv<R: BufRead>(reader: R) -> Result<(Taxa, DistanceMatrix)> {
    let mut lines = reader.lines().filter(|line| {
        line.as_ref().map_or(true, |l| !l.trim().is_empty())
    });

    let header = lines
        .next()
        .ok_or_else(|| SplitsError::InvalidInput("empty distance matrix".to_string()))??;
    let names: Vec<String> = header
        .trim_end_matches('\r')
        .split('\t')
        .skip(1)
        .map(|name| name.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(names.len());
    for line in lines {
        let line = line?;
        let mut fields = line.trim_end_matches('\r').split('\t');
        let row_name = fields.next().unwrap_or_default().trim();
        let expected = names.get(rows.len()).ok_or_else(|| {
            SplitsError::InvalidInput(format!("more rows than the {} header names", names.len()))
        })?;
        if row_name != expected {
            return Err(SplitsError::InvalidInput(format!(
                "row {} is '{row_name}', expected '{expected}'",
                rows.len() + 1
            )));
        }
        let row = fields
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| {
                    SplitsError::InvalidInput(format!("row '{row_name}': '{field}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    if rows.len() != names.len() {
        return Err(SplitsError::InvalidInput(format!(
            "{} rows for {} header names",
            rows.len(),
            names.len()
        )));
    }

    let taxa = Taxa::new(names)?;
    let distances = DistanceMatrix::from_rows(&rows)?;
    Ok((taxa, distances))
}

/// Reads a FASTA alignment from `path`.
///
/// # Errors
/// `Io` if the file cannot be read, `InvalidInput` if it is malformed or the
/// sequences differ in length.
pub fn read_fasta<P: AsRef<Path>>(path: P, nucleotides: bool) -> Result<(Taxa, CharacterMatrix)> {
    parse_fasta(open_input(path)?, nucleotides)
}

/// Parses a FASTA alignment. The taxon name is the first word of the `>`
/// line; whitespace inside sequences is dropped.
pub fn parse_fasta<R: BufRead>(reader: R, nucleotides: bool) -> Result<(Taxa, CharacterMatrix)> {
    let mut names: Vec<String> = Vec::new();
    let mut sequences: Vec<String> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let name = header.split_whitespace().next().unwrap_or_default();
            names.push(name.to_string());
            sequences.push(String::new());
        } else {
            let sequence = sequences.last_mut().ok_or_else(|| {
                SplitsError::InvalidInput("sequence data before the first '>' line".to_string())
            })?;
            sequence.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    if names.is_empty() {
        return Err(SplitsError::InvalidInput("no sequences".to_string()));
    }

    let taxa = Taxa::new(names)?;
    let chars = CharacterMatrix::from_sequences(&sequences, nucleotides)?;
    Ok((taxa, chars))
}

/// Writes a split system as TSV.
///
/// Three `#` comment lines give the number of taxa, the compatibility class
/// and the cycle; then one row per split with its weight, confidence (empty
/// when unknown) and both sides as comma-separated labels, the side without
/// taxon 1 first.
pub fn write_splits_tsv<P: AsRef<Path>>(path: P, splits: &SplitSystem, taxa: &Taxa) -> Result<()> {
    taxa.check_ntax(splits.ntax())?;
    let mut out = create_output(path)?;
    write_splits(&mut out, splits, taxa)?;
    out.flush()?;
    Ok(())
}

fn write_splits<W: Write + ?Sized>(out: &mut W, splits: &SplitSystem, taxa: &Taxa) -> Result<()> {
    let labels = |side: &crate::bitset::TaxonSet| side.iter().map(|t| taxa.label(t)).join(",");

    writeln!(out, "# ntax\t{}", splits.ntax())?;
    writeln!(out, "# compatibility\t{}", splits.compatibility())?;
    let cycle = splits.cycle().map(|c| c.iter().join(" ")).unwrap_or_default();
    writeln!(out, "# cycle\t{cycle}")?;
    writeln!(out, "id\tweight\tconfidence\tside\tother")?;
    for (k, split) in splits.iter().enumerate() {
        let confidence = split.confidence().map(|c| c.to_string()).unwrap_or_default();
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            k + 1,
            split.weight(),
            confidence,
            labels(split.part_not_containing(1)),
            labels(split.part_containing(1))
        )?;
    }
    Ok(())
}

/// Writes a tree-shaped graph as one Newick line.
///
/// # Errors
/// `InvalidInput` if the graph is not a tree.
pub fn write_newick<P: AsRef<Path>>(path: P, graph: &PhyloGraph) -> Result<()> {
    let newick = graph.to_newick()?;
    let mut out = create_output(path)?;
    writeln!(out, "{newick}")?;
    out.flush()?;
    Ok(())
}

/// Writes the edges of a graph as TSV: `source\ttarget\tweight`, with
/// leaves named by their label and internal nodes by `#index`.
pub fn write_edges_tsv<P: AsRef<Path>>(path: P, graph: &PhyloGraph) -> Result<()> {
    let mut out = create_output(path)?;
    let name = |id: usize| match &graph.node(id).label {
        Some(label) => label.clone(),
        None => format!("#{id}"),
    };

    writeln!(out, "source\ttarget\tweight")?;
    for edge in graph.edges() {
        writeln!(out, "{}\t{}\t{}", name(edge.source), name(edge.target), edge.weight)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a labelled distance matrix as TSV, readable by [`read_distances_tsv`].
pub fn write_distances_tsv<P: AsRef<Path>>(path: P, taxa: &Taxa, distances: &DistanceMatrix) -> Result<()> {
    taxa.check_ntax(distances.ntax())?;
    let mut out = create_output(path)?;

    // Header row
    writeln!(out, "\t{}", taxa.labels().iter().join("\t"))?;

    // Rows
    for (i, row) in distances.to_rows().iter().enumerate() {
        write!(out, "{}", taxa.label(i + 1))?;
        for val in row {
            write!(out, "\t{val}")?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::TaxonSet;
    use crate::split::Split;
    use std::io::{Cursor, Read};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("splitsnet-{}-{name}", std::process::id()))
    }

    fn read_text(path: &Path) -> String {
        let mut text = String::new();
        open_input(path).unwrap().read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_parse_distances() {
        let text = "\tA\tB\tC\nA\t0\t2\t3\nB\t2\t0\t3.5\n\nC\t3\t3.5\t0\n";
        let (taxa, d) = parse_distances_tsv(Cursor::new(text)).unwrap();
        assert_eq!(taxa.labels(), ["A", "B", "C"]);
        assert_eq!(d.get(2, 3), 3.5);
        assert_eq!(d.get(1, 2), 2.0);
    }

    #[test]
    fn test_parse_distances_errors() {
        for text in [
            "",
            "\tA\tB\nA\t0\t1\n",
            "\tA\tB\nA\t0\t1\nC\t1\t0\n",
            "\tA\tB\nA\t0\tx\nB\t1\t0\n",
            "\tA\tB\nA\t0\t1\t2\nB\t1\t0\n",
            "\tA\tB\nA\t0\t-1\nB\t-1\t0\n",
        ] {
            assert!(
                matches!(parse_distances_tsv(Cursor::new(text)), Err(SplitsError::InvalidInput(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_distances_gz_round_trip() {
        let taxa = Taxa::new(["x", "y", "z"]).unwrap();
        let d = DistanceMatrix::from_rows(&[
            vec![0.0, 1.25, 2.0],
            vec![1.25, 0.0, 3.0],
            vec![2.0, 3.0, 0.0],
        ])
        .unwrap();
        let path = temp_path("distances.tsv.gz");
        write_distances_tsv(&path, &taxa, &d).unwrap();
        let (read_taxa, read_d) = read_distances_tsv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(read_taxa, taxa);
        assert_eq!(read_d, d);
    }

    #[test]
    fn test_parse_fasta() {
        let text = "; comment\n>seq1 first sample\nACGT\nAC\n>seq2\nAC GT\nTT\n";
        let (taxa, chars) = parse_fasta(Cursor::new(text), true).unwrap();
        assert_eq!(taxa.labels(), ["seq1", "seq2"]);
        assert_eq!(chars.nchar(), 6);
        assert_eq!(chars.row(1), b"ACGTAC");
        assert_eq!(chars.row(2), b"ACGTTT");
        assert!(chars.is_nucleotides());
    }

    #[test]
    fn test_parse_fasta_errors() {
        for text in ["", "ACGT\n>a\nACGT\n", ">a\nACGT\n>b\nAC\n", ">a\nAC\n>a\nAC\n"] {
            assert!(
                matches!(parse_fasta(Cursor::new(text), true), Err(SplitsError::InvalidInput(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_write_splits() {
        let taxa = Taxa::new(["A", "B", "C", "D"]).unwrap();
        let mut splits = SplitSystem::new(4);
        let mut split = Split::new(TaxonSet::from_taxa(4, [1, 2]), 4, 1.5).unwrap();
        split.set_confidence(0.9);
        splits.add_split(split);
        splits.add_split(Split::new(TaxonSet::singleton(4, 4), 4, 2.0).unwrap());
        splits.finalize();

        let path = temp_path("splits.tsv");
        write_splits_tsv(&path, &splits, &taxa).unwrap();
        let text = read_text(&path);
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# ntax\t4");
        assert_eq!(lines[1], "# compatibility\tcompatible");
        assert!(lines[2].starts_with("# cycle\t1 "));
        assert_eq!(lines[4], "1\t1.5\t0.9\tC,D\tA,B");
        assert_eq!(lines[5], "2\t2\t\tD\tA,B,C");
        assert_eq!(lines.len(), 6);

        assert!(write_splits_tsv(temp_path("unused.tsv"), &splits, &Taxa::numbered(3)).is_err());
    }

    #[test]
    fn test_write_graphs() {
        let mut graph = PhyloGraph::new();
        for (t, label) in ["A", "B", "C"].iter().enumerate() {
            graph.add_taxon_node(t + 1, *label);
        }
        let center = graph.add_internal_node();
        for (leaf, w) in [(0, 0.5), (1, 1.5), (2, 2.5)] {
            graph.add_edge(center, leaf, w);
        }

        let edges = temp_path("edges.tsv.gz");
        write_edges_tsv(&edges, &graph).unwrap();
        let text = read_text(&edges);
        std::fs::remove_file(&edges).ok();
        assert_eq!(text, "source\ttarget\tweight\n#3\tA\t0.5\n#3\tB\t1.5\n#3\tC\t2.5\n");

        let newick = temp_path("tree.nwk");
        write_newick(&newick, &graph).unwrap();
        let text = read_text(&newick);
        std::fs::remove_file(&newick).ok();
        assert!(text.trim_end().ends_with(';'));
        assert!(text.contains("B:1.5"));

        graph.add_edge(0, 1, 1.0);
        assert!(write_newick(temp_path("cyclic.nwk"), &graph).is_err());
    }

    #[test]
    fn test_stdout_is_rejected() {
        assert!(matches!(create_output("-"), Err(SplitsError::InvalidInput(_))));
    }
}
