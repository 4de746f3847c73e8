//! GAL neighbor files.
//!
//! The plain-text contiguity format written by GeoDa and spdep's
//! `write.nb.gal`:
//!
//! ```text
//! 0 5 polygons ID
//! 1 2
//! 2 4
//! 2 4
//! 1 3 4 5
//! ```
//!
//! A header holding the unit count (either `n` alone or `0 n <layer> <id>`),
//! then per unit a `id k` line followed by a line of `k` neighbor ids. Ids are
//! 1-based.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::NeighborGraph;

pub fn read_gal<R: BufRead>(reader: R) -> Result<NeighborGraph> {
    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push((index + 1, line));
        }
    }
    let mut lines = lines.into_iter();

    let (header_line, header) = lines.next().ok_or_else(|| Error::Parse {
        line: 1,
        message: "missing header".to_string(),
    })?;
    let header_tokens: Vec<&str> = header.split_whitespace().collect();
    // 空行は読み飛ばすので、ヘッダーには必ずトークンがある
    let count_token = if header_tokens.len() == 1 {
        header_tokens[0]
    } else {
        header_tokens[1]
    };
    let n = parse_number(count_token, header_line)?;

    // ヘッダーの件数は信用せず、実際に読んだレコード分だけ確保する
    let mut records: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for _ in 0..n {
        let (record_line, record) = lines.next().ok_or_else(|| Error::Parse {
            line: header_line,
            message: format!("expected {} unit records, found {}", n, records.len()),
        })?;
        let tokens: Vec<&str> = record.split_whitespace().collect();
        let [id, count] = tokens.as_slice() else {
            return Err(Error::Parse {
                line: record_line,
                message: format!("expected \"id count\", found {:?}", record.trim()),
            });
        };
        let unit = to_index(parse_number(id, record_line)?, n)?;
        let count: usize = parse_number(count, record_line)?;

        let mut neighbors = Vec::new();
        if count > 0 {
            let (list_line, list) = lines.next().ok_or_else(|| Error::Parse {
                line: record_line,
                message: format!("missing neighbor list for unit {}", id),
            })?;
            for token in list.split_whitespace() {
                neighbors.push(to_index(parse_number(token, list_line)?, n)?);
            }
            if neighbors.len() != count {
                return Err(Error::Parse {
                    line: list_line,
                    message: format!("expected {} neighbors, found {}", count, neighbors.len()),
                });
            }
        }

        if records.insert(unit, neighbors).is_some() {
            return Err(Error::Parse {
                line: record_line,
                message: format!("duplicate record for unit {}", id),
            });
        }
    }

    if let Some((line, _)) = lines.next() {
        return Err(Error::Parse {
            line,
            message: "unexpected content after the last unit record".to_string(),
        });
    }

    // n件の異なるidを読んだので、キーはちょうど 0..n
    let lists = records.into_values().collect();
    let graph = NeighborGraph::from_lists(lists)?;
    debug!("Read GAL neighbors: {} units, {} links", graph.n(), graph.link_count());
    Ok(graph)
}

pub fn read_gal_file(path: &Path) -> Result<NeighborGraph> {
    let file = File::open(path)?;
    read_gal(BufReader::new(file))
}

pub fn write_gal<W: Write>(graph: &NeighborGraph, mut writer: W) -> Result<()> {
    writeln!(writer, "0 {} units ID", graph.n())?;
    for (i, list) in graph.lists().iter().enumerate() {
        writeln!(writer, "{} {}", i + 1, list.len())?;
        let ids: Vec<String> = list.iter().map(|j| (j + 1).to_string()).collect();
        writeln!(writer, "{}", ids.join(" "))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_gal_file(graph: &NeighborGraph, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_gal(graph, BufWriter::new(file))
}

fn parse_number(token: &str, line: usize) -> Result<usize> {
    token.parse().map_err(|_| Error::Parse {
        line,
        message: format!("{:?} is not a non-negative integer", token),
    })
}

fn to_index(id: usize, n: usize) -> Result<usize> {
    if id == 0 || id > n {
        return Err(Error::InvalidIndex { index: id, n });
    }
    Ok(id - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WORKED_EXAMPLE: &str = "0 5 polygons ID\n1 2\n2 4\n2 4\n1 3 4 5\n3 2\n2 4\n4 4\n1 2 3 5\n5 2\n2 4\n";

    #[test]
    fn test_read_worked_example() {
        let graph = read_gal(WORKED_EXAMPLE.as_bytes()).unwrap();
        assert_eq!(graph.n(), 5);
        assert_eq!(graph.neighbors_of(0).unwrap(), &[1, 3]);
        assert_eq!(graph.neighbors_of(1).unwrap(), &[0, 2, 3, 4]);
        assert_eq!(graph.link_count(), 14);
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_bare_count_header_and_isolated_unit() {
        let graph = read_gal("3\n1 1\n2\n2 1\n1\n3 0\n\n".as_bytes()).unwrap();
        assert_eq!(graph.neighbors_of(0).unwrap(), &[1]);
        assert!(graph.neighbors_of(2).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = read_gal("2\n1 1\n3\n2 1\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex { index: 3, n: 2 }));

        let err = read_gal("2\n1 1\n1\n2 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::SelfLoop { index: 0 }));

        let err = read_gal("2\n1 2\n2\n2 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));

        let err = read_gal("2\n1 x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = read_gal("2\n1 0\n1 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_huge_neighbor_count_is_a_parse_error() {
        let err = read_gal("2\n1 18446744073709551615\n2\n2 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_header_claiming_more_units_than_records() {
        let err = read_gal("0 2305843009213693952 x ID\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        let err = read_gal("0 3 x ID\n1 1\n2\n2 1\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("worked_example.gal");

        let graph = read_gal(WORKED_EXAMPLE.as_bytes()).unwrap();
        write_gal_file(&graph, &path).unwrap();
        assert!(path.exists());

        let reread = read_gal_file(&path).unwrap();
        assert_eq!(reread, graph);
    }
}
