//! Tagged, length-prefixed record streams for the five protocol artifacts.
//!
//! ```text
//! [8-byte tag][u64 LE len][bincode payload][u64 LE len][bincode payload]...
//! ```

use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    marker::PhantomData,
    path::Path,
};

use serde::{Serialize, de::DeserializeOwned};
use zeroize::Zeroizing;

pub const TAG_SIZE: usize = 8;

/// Upper bound on a single record's payload.
pub const MAX_RECORD_LEN: u64 = 1 << 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Commitments,
    ProverSecret,
    VerifierResponse,
    Request,
    Reveal,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Commitments,
        ArtifactKind::ProverSecret,
        ArtifactKind::VerifierResponse,
        ArtifactKind::Request,
        ArtifactKind::Reveal,
    ];

    pub fn tag(&self) -> &'static [u8; TAG_SIZE] {
        match self {
            ArtifactKind::Commitments => b"GZKP-CMT",
            ArtifactKind::ProverSecret => b"GZKP-SEC",
            ArtifactKind::VerifierResponse => b"GZKP-RSP",
            ArtifactKind::Request => b"GZKP-REQ",
            ArtifactKind::Reveal => b"GZKP-RVL",
        }
    }

    pub fn from_tag(tag: &[u8; TAG_SIZE]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Commitments => "commitments",
            ArtifactKind::ProverSecret => "prover-secret",
            ArtifactKind::VerifierResponse => "verifier-response",
            ArtifactKind::Request => "request",
            ArtifactKind::Reveal => "reveal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Expected a {expected} stream, found tag {found:?}")]
    UnexpectedTag {
        expected: ArtifactKind,
        found: [u8; TAG_SIZE],
    },
    #[error("Stream ended inside a {0}")]
    Truncated(&'static str),
    #[error("Malformed record: {0}")]
    Codec(#[from] bincode::Error),
    #[error("{0} stream holds no record")]
    MissingRecord(ArtifactKind),
    #[error("Record of {0} bytes exceeds the {MAX_RECORD_LEN}-byte limit")]
    RecordTooLarge(u64),
}

/// Reads until `buf` is full or the stream ends; returns the bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub struct FramedWriter<W: Write> {
    writer: W,
    kind: ArtifactKind,
    records: usize,
}

impl<W: Write> FramedWriter<W> {
    /// Writes the stream tag immediately.
    pub fn new(mut writer: W, kind: ArtifactKind) -> Result<Self, FramingError> {
        writer.write_all(kind.tag())?;
        Ok(Self {
            writer,
            kind,
            records: 0,
        })
    }

    /// Payload bytes are wiped once written; records may carry round secrets.
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<(), FramingError> {
        let payload = Zeroizing::new(bincode::serialize(record)?);
        self.writer.write_all(&(payload.len() as u64).to_le_bytes())?;
        self.writer.write_all(payload.as_slice())?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, FramingError> {
        self.writer.flush()?;
        log::debug!("framing: wrote {} records={}", self.kind, self.records);
        Ok(self.writer)
    }
}

pub struct FramedReader<R: Read> {
    reader: R,
    kind: ArtifactKind,
}

impl<R: Read> FramedReader<R> {
    /// Reads and checks the stream tag.
    pub fn new(mut reader: R, kind: ArtifactKind) -> Result<Self, FramingError> {
        let mut tag = [0u8; TAG_SIZE];
        if read_up_to(&mut reader, &mut tag)? != TAG_SIZE {
            return Err(FramingError::Truncated("stream tag"));
        }
        if &tag != kind.tag() {
            return Err(FramingError::UnexpectedTag {
                expected: kind,
                found: tag,
            });
        }
        Ok(Self { reader, kind })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// `Ok(None)` at a clean end of stream. The payload buffer is sized once
    /// and wiped after decoding.
    pub fn read_record<T: DeserializeOwned>(&mut self) -> Result<Option<T>, FramingError> {
        let mut len = [0u8; 8];
        match read_up_to(&mut self.reader, &mut len)? {
            0 => return Ok(None),
            8 => {}
            _ => return Err(FramingError::Truncated("length prefix")),
        }
        let len = u64::from_le_bytes(len);

        if len > MAX_RECORD_LEN {
            return Err(FramingError::RecordTooLarge(len));
        }

        let mut payload = Zeroizing::new(vec![0u8; len as usize]);
        if read_up_to(&mut self.reader, payload.as_mut_slice())? as u64 != len {
            return Err(FramingError::Truncated("record"));
        }
        Ok(Some(bincode::deserialize(payload.as_slice())?))
    }

    pub fn records<T: DeserializeOwned>(self) -> Records<R, T> {
        Records {
            reader: self,
            done: false,
            _marker: PhantomData,
        }
    }

    pub fn read_all<T: DeserializeOwned>(self) -> Result<Vec<T>, FramingError> {
        self.records().collect()
    }

    /// Reads the single record a stream of this kind is expected to hold.
    pub fn read_one<T: DeserializeOwned>(mut self) -> Result<T, FramingError> {
        let kind = self.kind;
        self.read_record()?
            .ok_or(FramingError::MissingRecord(kind))
    }
}

/// Iterator over the records of a stream. Stops after the first error.
pub struct Records<R: Read, T> {
    reader: FramedReader<R>,
    done: bool,
    _marker: PhantomData<T>,
}

impl<R: Read, T: DeserializeOwned> Iterator for Records<R, T> {
    type Item = Result<T, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.reader.read_record().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

pub fn create_file(
    path: impl AsRef<Path>,
    kind: ArtifactKind,
) -> Result<FramedWriter<BufWriter<File>>, FramingError> {
    FramedWriter::new(BufWriter::new(File::create(path)?), kind)
}

pub fn open_file(
    path: impl AsRef<Path>,
    kind: ArtifactKind,
) -> Result<FramedReader<BufReader<File>>, FramingError> {
    FramedReader::new(BufReader::new(File::open(path)?), kind)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn stream(kind: ArtifactKind, records: &[Vec<u32>]) -> Vec<u8> {
        let mut writer = FramedWriter::new(Vec::new(), kind).unwrap();
        for r in records {
            writer.write_record(r).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_tags_are_distinct() {
        for kind in ArtifactKind::ALL {
            assert_eq!(ArtifactKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ArtifactKind::from_tag(b"GZKP-XXX"), None);
    }

    #[test]
    fn test_layout() {
        let bytes = stream(ArtifactKind::Request, &[vec![7]]);
        assert_eq!(&bytes[..8], b"GZKP-REQ");
        let payload = bincode::serialize(&vec![7u32]).unwrap();
        assert_eq!(&bytes[8..16], &(payload.len() as u64).to_le_bytes());
        assert_eq!(&bytes[16..], payload.as_slice());
    }

    #[test]
    fn test_records_until_clean_eof() {
        let bytes = stream(ArtifactKind::Reveal, &[vec![1, 2], vec![], vec![3]]);
        let reader = FramedReader::new(Cursor::new(bytes), ArtifactKind::Reveal).unwrap();
        let records: Vec<Vec<u32>> = reader.read_all().unwrap();
        assert_eq!(records, vec![vec![1, 2], vec![], vec![3]]);

        let empty = stream(ArtifactKind::Reveal, &[]);
        let reader = FramedReader::new(Cursor::new(empty), ArtifactKind::Reveal).unwrap();
        assert!(reader.read_all::<Vec<u32>>().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_tag_is_fatal() {
        let bytes = stream(ArtifactKind::Commitments, &[vec![1]]);
        assert!(matches!(
            FramedReader::new(Cursor::new(bytes), ArtifactKind::ProverSecret),
            Err(FramingError::UnexpectedTag {
                expected: ArtifactKind::ProverSecret,
                found,
            }) if &found == b"GZKP-CMT"
        ));
        assert!(matches!(
            FramedReader::new(Cursor::new(b"GZKP".to_vec()), ArtifactKind::Commitments),
            Err(FramingError::Truncated("stream tag"))
        ));
    }

    #[test]
    fn test_truncation_inside_record() {
        let bytes = stream(ArtifactKind::Commitments, &[vec![1, 2, 3], vec![4]]);

        let mut cut = bytes.clone();
        cut.truncate(bytes.len() - 1);
        let reader = FramedReader::new(Cursor::new(cut), ArtifactKind::Commitments).unwrap();
        let mut records = reader.records::<Vec<u32>>();
        assert_eq!(records.next().unwrap().unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            records.next(),
            Some(Err(FramingError::Truncated("record")))
        ));
        assert!(records.next().is_none());

        let mut cut = stream(ArtifactKind::Commitments, &[vec![1]]);
        cut.extend_from_slice(&[5, 0, 0]);
        let reader = FramedReader::new(Cursor::new(cut), ArtifactKind::Commitments).unwrap();
        assert!(matches!(
            reader.read_all::<Vec<u32>>(),
            Err(FramingError::Truncated("length prefix"))
        ));
    }

    #[test]
    fn test_oversized_length_prefix_is_rejected() {
        let mut bytes = stream(ArtifactKind::ProverSecret, &[vec![9]]);
        bytes.extend_from_slice(&(MAX_RECORD_LEN + 1).to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);

        let reader = FramedReader::new(Cursor::new(bytes), ArtifactKind::ProverSecret).unwrap();
        let mut records = reader.records::<Vec<u32>>();
        assert_eq!(records.next().unwrap().unwrap(), vec![9]);
        assert!(matches!(
            records.next(),
            Some(Err(FramingError::RecordTooLarge(len))) if len == MAX_RECORD_LEN + 1
        ));
    }

    #[test]
    fn test_read_one_requires_a_record() {
        let empty = stream(ArtifactKind::Request, &[]);
        let reader = FramedReader::new(Cursor::new(empty), ArtifactKind::Request).unwrap();
        assert!(matches!(
            reader.read_one::<Vec<u32>>(),
            Err(FramingError::MissingRecord(ArtifactKind::Request))
        ));
    }
}
