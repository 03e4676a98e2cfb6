use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// One FASTA record: the id (header up to the first whitespace) and its sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub seq: String,
}

/// Minimal FASTA reader that also supports .gz
pub fn read_fasta_records<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    parse_fasta(reader)
}

/// Parse FASTA from any buffered reader. Sequence lines are concatenated
/// with whitespace removed; text before the first header is ignored.
pub fn parse_fasta<R: BufRead>(reader: R) -> std::io::Result<Vec<FastaRecord>> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            if let Some(done) = current.take() {
                records.push(done);
            }
            current = Some(FastaRecord {
                id: header.split_whitespace().next().unwrap_or_default().to_string(),
                seq: String::new(),
            });
        } else if let Some(record) = current.as_mut() {
            record.seq.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    if let Some(done) = current {
        records.push(done);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_parse_fasta_multiline() {
        let text = "ignored\n>read1:fwd:offset_0 some description\nMAEVQ\nLVES\n\n>read2\nMQPMT\n";
        let records = parse_fasta(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "read1:fwd:offset_0");
        assert_eq!(records[0].seq, "MAEVQLVES");
        assert_eq!(records[1].seq, "MQPMT");
    }

    #[test]
    fn test_read_gzipped_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fa.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b">r1\nACGT\n>r2\nTTGA\n").unwrap();
        encoder.finish().unwrap();

        let records = read_fasta_records(&path).unwrap();
        assert_eq!(
            records,
            vec![
                FastaRecord { id: "r1".into(), seq: "ACGT".into() },
                FastaRecord { id: "r2".into(), seq: "TTGA".into() },
            ]
        );
    }
}
