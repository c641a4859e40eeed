//! The two-pass pipeline driver (spec.md §2, §4.6, §9): pass 1 scans the
//! whole input to populate [ClassMetadataStore] and [NameKindTable];
//! pass 2 re-opens the input and performs the transforming copy. The
//! transformer is consulted only in pass 2.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::byteio::copy_verbatim;
use crate::error::{HprofRedactError, Result};
use crate::gzip;
use crate::heap_dump;
use crate::id::{Id, IdSize};
use crate::metadata::ClassMetadataStore;
use crate::mutf8;
use crate::namekind::{NameKind, NameKindTable};
use crate::record::{read_record_header, write_record_header, RecordTag};
use crate::transform::{dispatch_string, Transformer};
use crate::verbose::{ChangeEvent, VerboseSink};

const MAGIC: &[u8] = b"JAVA PROFILE 1.0.2\0";

/// The header preamble: raw magic bytes (opaque beyond being
/// null-terminated), the stream-wide identifier width, and the
/// milliseconds timestamp -- all immutable once parsed.
pub struct Header {
    pub magic: Vec<u8>,
    pub id_size: IdSize,
    pub timestamp_millis: u64,
}

fn read_header<R: Read>(r: &mut R) -> Result<Header> {
    let mut magic = Vec::with_capacity(MAGIC.len());
    loop {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        magic.push(byte[0]);
        if byte[0] == 0 {
            break;
        }
    }
    let id_size = IdSize::from_header_value(r.read_u32::<BigEndian>()?)?;
    let timestamp_millis = r.read_u64::<BigEndian>()?;
    Ok(Header {
        magic,
        id_size,
        timestamp_millis,
    })
}

fn write_header<W: Write>(w: &mut W, header: &Header) -> Result<()> {
    w.write_all(&header.magic)?;
    let id_size_value = match header.id_size {
        IdSize::U32 => 4u32,
        IdSize::U64 => 8u32,
    };
    w.write_u32::<BigEndian>(id_size_value)?;
    w.write_u64::<BigEndian>(header.timestamp_millis)?;
    Ok(())
}

/// A byte source the driver can open twice -- once per pass. A
/// non-seekable one-shot pipe cannot implement this meaningfully, which
/// is why the CLI front end rejects stdin with [HprofRedactError::NotReopenable]
/// rather than attempting to adapt it.
pub trait ReopenableSource {
    fn open(&self) -> Result<Box<dyn Read>>;
}

/// The ordinary case: a filesystem path, transparently gzip-sniffed on
/// every open.
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PathSource { path: path.into() }
    }
}

impl ReopenableSource for PathSource {
    fn open(&self) -> Result<Box<dyn Read>> {
        gzip::open_input(&self.path)
    }
}

/// Instance-based entry point mirroring the source's `HprofFilter`
/// (spec.md §9 open question (c) treats this and [filter] as the same
/// operation); this variant additionally threads a [VerboseSink].
pub struct HprofFilter<'a> {
    transformer: &'a dyn Transformer,
    verbose: Option<&'a mut dyn VerboseSink>,
}

impl<'a> HprofFilter<'a> {
    pub fn new(transformer: &'a dyn Transformer) -> Self {
        HprofFilter {
            transformer,
            verbose: None,
        }
    }

    pub fn with_verbose_sink(mut self, sink: &'a mut dyn VerboseSink) -> Self {
        self.verbose = Some(sink);
        self
    }

    pub fn filter(&mut self, source: &dyn ReopenableSource, output: &mut dyn Write) -> Result<()> {
        run(source, output, self.transformer, self.verbose.as_deref_mut())
    }
}

/// Free-function entry point: filter `source` through `transformer`
/// into `output`, with no verbose reporting.
pub fn filter(
    source: &dyn ReopenableSource,
    output: &mut dyn Write,
    transformer: &dyn Transformer,
) -> Result<()> {
    run(source, output, transformer, None)
}

fn run(
    source: &dyn ReopenableSource,
    output: &mut dyn Write,
    transformer: &dyn Transformer,
    verbose: Option<&mut dyn VerboseSink>,
) -> Result<()> {
    let mut metadata = ClassMetadataStore::new();
    let mut namekind = NameKindTable::new();

    let mut pass1 = source.open()?;
    let pass1_header = read_header(&mut pass1)?;
    log::debug!(
        "pass 1: scanning with id size {:?}",
        pass1_header.id_size
    );
    scan_records(&mut pass1, pass1_header.id_size, &mut metadata, &mut namekind)?;

    let mut pass2 = source.open()?;
    let pass2_header = read_header(&mut pass2)?;
    write_header(output, &pass2_header)?;
    log::debug!(
        "pass 2: rewriting with id size {:?}",
        pass2_header.id_size
    );
    rewrite_records(
        &mut pass2,
        output,
        pass2_header.id_size,
        &mut metadata,
        &namekind,
        transformer,
        verbose,
    )?;
    output.flush()?;
    Ok(())
}

fn skip_bytes<R: Read>(r: &mut R, len: u64) -> Result<()> {
    let mut remaining = len;
    let mut scratch = [0u8; 64 * 1024];
    while remaining > 0 {
        let chunk = remaining.min(scratch.len() as u64) as usize;
        r.read_exact(&mut scratch[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

fn validate_length(record: &'static str, expected: u32, actual: u32) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HprofRedactError::RecordLengthMismatch {
            record,
            expected,
            actual,
        })
    }
}

fn load_class_length(id_size: IdSize) -> u32 {
    let id = id_size.size_in_bytes() as u32;
    4 + id + 4 + id
}

fn frame_length(id_size: IdSize) -> u32 {
    4 * id_size.size_in_bytes() as u32 + 8
}

fn start_thread_length(id_size: IdSize) -> u32 {
    4 + 4 * id_size.size_in_bytes() as u32
}

fn scan_load_class<R: Read>(
    r: &mut R,
    id_size: IdSize,
    length: u32,
    namekind: &mut NameKindTable,
) -> Result<()> {
    validate_length("LOAD_CLASS", load_class_length(id_size), length)?;
    let _class_serial = r.read_u32::<BigEndian>()?;
    let _class_object_id = Id::read(r, id_size)?;
    let _stack_trace_serial = r.read_u32::<BigEndian>()?;
    let class_name_id = Id::read(r, id_size)?;
    namekind.classify(class_name_id, NameKind::ClassName);
    Ok(())
}

fn scan_frame<R: Read>(
    r: &mut R,
    id_size: IdSize,
    length: u32,
    namekind: &mut NameKindTable,
) -> Result<()> {
    validate_length("FRAME", frame_length(id_size), length)?;
    let _stack_frame_id = Id::read(r, id_size)?;
    let method_name_id = Id::read(r, id_size)?;
    let method_signature_id = Id::read(r, id_size)?;
    let source_file_name_id = Id::read(r, id_size)?;
    let _class_serial = r.read_u32::<BigEndian>()?;
    let _line_number = r.read_u32::<BigEndian>()?;
    namekind.classify(method_name_id, NameKind::MethodNameOrSignature);
    namekind.classify(method_signature_id, NameKind::MethodNameOrSignature);
    namekind.classify(source_file_name_id, NameKind::SourceFileName);
    Ok(())
}

fn scan_start_thread<R: Read>(
    r: &mut R,
    id_size: IdSize,
    length: u32,
    namekind: &mut NameKindTable,
) -> Result<()> {
    validate_length("START_THREAD", start_thread_length(id_size), length)?;
    let _thread_serial = r.read_u32::<BigEndian>()?;
    let _thread_object_id = Id::read(r, id_size)?;
    let thread_name_id = Id::read(r, id_size)?;
    let thread_group_name_id = Id::read(r, id_size)?;
    let thread_group_parent_name_id = Id::read(r, id_size)?;
    namekind.classify(thread_name_id, NameKind::ThreadName);
    namekind.classify(thread_group_name_id, NameKind::ThreadGroupName);
    namekind.classify(
        thread_group_parent_name_id,
        NameKind::ThreadGroupParentName,
    );
    Ok(())
}

/// Pass 1: scans every top-level record, dispatching only far enough to
/// populate `metadata` and `namekind`. Never writes anything.
pub fn scan_records<R: Read>(
    r: &mut R,
    id_size: IdSize,
    metadata: &mut ClassMetadataStore,
    namekind: &mut NameKindTable,
) -> Result<()> {
    while let Some(header) = read_record_header(r)? {
        match header.tag {
            RecordTag::LoadClass => scan_load_class(r, id_size, header.length, namekind)?,
            RecordTag::StackFrame => scan_frame(r, id_size, header.length, namekind)?,
            RecordTag::StartThread => scan_start_thread(r, id_size, header.length, namekind)?,
            RecordTag::HeapDump | RecordTag::HeapDumpSegment => heap_dump::scan_segment(
                r,
                header.length as u64,
                id_size,
                metadata,
                namekind,
            )?,
            _ => skip_bytes(r, header.length as u64)?,
        }
    }
    Ok(())
}

/// Decodes one UTF8 record's body, transforms it through the
/// classified hook, and reports what to write: the symbol id, the raw
/// bytes to emit (the re-encoded replacement, or the original bytes
/// verbatim when nothing changed), and -- only on an actual change --
/// the detail needed for a verbose log line.
fn rewrite_utf8_body<R: Read>(
    r: &mut R,
    id_size: IdSize,
    length: u32,
    namekind: &NameKindTable,
    transformer: &dyn Transformer,
) -> Result<(Id, Vec<u8>, Option<(Option<NameKind>, String, String)>)> {
    let id_bytes = id_size.size_in_bytes() as u32;
    if length < id_bytes {
        return Err(HprofRedactError::RecordLengthMismatch {
            record: "UTF8",
            expected: id_bytes,
            actual: length,
        });
    }
    let symbol_id = Id::read(r, id_size)?;
    let mut raw = vec![0u8; (length - id_bytes) as usize];
    r.read_exact(&mut raw)?;

    match mutf8::decode(&raw) {
        Ok(original) => {
            let kind = namekind.kind_of(symbol_id);
            match dispatch_string(transformer, kind, &original) {
                Some(replacement) if replacement != original => {
                    let encoded = mutf8::encode(&replacement);
                    Ok((symbol_id, encoded, Some((kind, original, replacement))))
                }
                _ => Ok((symbol_id, raw, None)),
            }
        }
        // A decode failure is non-fatal for the record: emit the
        // original bytes verbatim and leave the symbol untransformed.
        Err(_) => Ok((symbol_id, raw, None)),
    }
}

/// Pass 2: rewrites every top-level record, consulting `transformer`
/// only where the dispatch table calls for it; everything else is
/// emitted with its header unchanged and its body copied verbatim.
pub fn rewrite_records<R: Read, W: Write>(
    r: &mut R,
    w: &mut W,
    id_size: IdSize,
    metadata: &mut ClassMetadataStore,
    namekind: &NameKindTable,
    transformer: &dyn Transformer,
    mut verbose: Option<&mut dyn VerboseSink>,
) -> Result<()> {
    while let Some(header) = read_record_header(r)? {
        match header.tag {
            RecordTag::Utf8 => {
                let (symbol_id, body, change) =
                    rewrite_utf8_body(r, id_size, header.length, namekind, transformer)?;
                if let Some((kind, original, replacement)) = &change {
                    if let Some(sink) = verbose.as_deref_mut() {
                        sink.record_change(ChangeEvent {
                            symbol_id,
                            kind: *kind,
                            original,
                            replacement,
                        });
                    }
                }
                let id_bytes = id_size.size_in_bytes() as u64;
                let new_length = id_bytes + body.len() as u64;
                if new_length > u32::MAX as u64 {
                    return Err(HprofRedactError::Utf8LengthOverflow);
                }
                write_record_header(w, RecordTag::Utf8, header.micros_since_header_ts, new_length as u32)?;
                symbol_id.write(w, id_size)?;
                w.write_all(&body)?;
            }
            RecordTag::LoadClass => {
                validate_length("LOAD_CLASS", load_class_length(id_size), header.length)?;
                write_record_header(w, header.tag, header.micros_since_header_ts, header.length)?;
                copy_verbatim(r, w, header.length as u64)?;
            }
            RecordTag::StackFrame => {
                validate_length("FRAME", frame_length(id_size), header.length)?;
                write_record_header(w, header.tag, header.micros_since_header_ts, header.length)?;
                copy_verbatim(r, w, header.length as u64)?;
            }
            RecordTag::StartThread => {
                validate_length("START_THREAD", start_thread_length(id_size), header.length)?;
                write_record_header(w, header.tag, header.micros_since_header_ts, header.length)?;
                copy_verbatim(r, w, header.length as u64)?;
            }
            RecordTag::HeapDump | RecordTag::HeapDumpSegment => {
                write_record_header(w, header.tag, header.micros_since_header_ts, header.length)?;
                heap_dump::rewrite_segment(
                    r,
                    header.length as u64,
                    w,
                    id_size,
                    metadata,
                    transformer,
                )?;
            }
            _ => {
                write_record_header(w, header.tag, header.micros_since_header_ts, header.length)?;
                copy_verbatim(r, w, header.length as u64)?;
            }
        }
    }
    Ok(())
}

/// Returns `true` when `path`'s extension is `.gz`, case-insensitively
/// -- used by the front end to decide whether an output path should be
/// gzip-wrapped.
pub fn looks_gzip_named(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
