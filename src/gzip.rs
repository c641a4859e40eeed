//! Stream wrapping (spec.md §6.2): gzip-sniffing on input, gzip-wrapping
//! on output by filename convention. An external collaborator kept
//! outside the core -- the two-pass driver only ever sees a plain
//! `Read`/`Write`.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::Result;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Opens `path`, peeking its first two bytes for the gzip magic and
/// transparently wrapping it in a decoder when present. The peeked
/// bytes are never lost -- they're spliced back in front of the
/// remaining stream either way.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut head = [0u8; 2];
    let n = read_fully_or_short(&mut reader, &mut head)?;
    let prefixed = io::Cursor::new(head[..n].to_vec()).chain(reader);

    if n == 2 && head == GZIP_MAGIC {
        Ok(Box::new(GzDecoder::new(prefixed)))
    } else {
        Ok(Box::new(prefixed))
    }
}

fn read_fully_or_short<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = r.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// Where pass 2's output goes.
pub enum OutputTarget {
    Path(PathBuf),
    Stdout,
}

/// Opens `target`, wrapping a path ending in `.gz` (case-insensitive) in
/// a gzip encoder. Standard output is never gzip-wrapped regardless of
/// the transformer or input -- only the output *path*'s name decides.
pub fn open_output(target: &OutputTarget) -> Result<Box<dyn Write>> {
    match target {
        OutputTarget::Stdout => Ok(Box::new(io::BufWriter::new(io::stdout()))),
        OutputTarget::Path(path) => {
            let file = File::create(path)?;
            if crate::pipeline::looks_gzip_named(path) {
                Ok(Box::new(GzEncoder::new(file, Compression::default())))
            } else {
                Ok(Box::new(io::BufWriter::new(file)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn plain_file_is_read_back_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.hprof");
        std::fs::write(&path, b"JAVA PROFILE 1.0.2\0").unwrap();

        let mut reader = open_input(&path).unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"JAVA PROFILE 1.0.2\0");
    }

    #[test]
    fn gzip_file_is_transparently_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapped.hprof.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"JAVA PROFILE 1.0.2\0").unwrap();
        encoder.finish().unwrap();

        let mut reader = open_input(&path).unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"JAVA PROFILE 1.0.2\0");
    }

    #[test]
    fn output_path_ending_in_gz_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.HPROF.GZ");
        {
            let mut writer = open_output(&OutputTarget::Path(path.clone())).unwrap();
            writer.write_all(b"payload").unwrap();
        }
        let decoded = {
            let mut decoder = GzDecoder::new(File::open(&path).unwrap());
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).unwrap();
            out
        };
        assert_eq!(decoded, b"payload");
    }
}
