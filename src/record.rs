//! The top-level record tags and the tag/time/length header every
//! top-level hprof record starts with.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use strum_macros::EnumIter;

use crate::error::{HprofRedactError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter)]
pub enum RecordTag {
    Utf8,
    LoadClass,
    UnloadClass,
    StackFrame,
    StackTrace,
    AllocSites,
    HeapSummary,
    StartThread,
    EndThread,
    HeapDump,
    CpuSamples,
    ControlSettings,
    HeapDumpSegment,
    HeapDumpEnd,
}

impl RecordTag {
    pub fn from_byte(b: u8) -> Result<RecordTag> {
        match b {
            0x01 => Ok(RecordTag::Utf8),
            0x02 => Ok(RecordTag::LoadClass),
            0x03 => Ok(RecordTag::UnloadClass),
            0x04 => Ok(RecordTag::StackFrame),
            0x05 => Ok(RecordTag::StackTrace),
            0x06 => Ok(RecordTag::AllocSites),
            0x07 => Ok(RecordTag::HeapSummary),
            0x0A => Ok(RecordTag::StartThread),
            0x0B => Ok(RecordTag::EndThread),
            0x0C => Ok(RecordTag::HeapDump),
            0x0D => Ok(RecordTag::CpuSamples),
            0x0E => Ok(RecordTag::ControlSettings),
            0x1C => Ok(RecordTag::HeapDumpSegment),
            0x2C => Ok(RecordTag::HeapDumpEnd),
            other => Err(HprofRedactError::UnsupportedRecordTag(other)),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            RecordTag::Utf8 => 0x01,
            RecordTag::LoadClass => 0x02,
            RecordTag::UnloadClass => 0x03,
            RecordTag::StackFrame => 0x04,
            RecordTag::StackTrace => 0x05,
            RecordTag::AllocSites => 0x06,
            RecordTag::HeapSummary => 0x07,
            RecordTag::StartThread => 0x0A,
            RecordTag::EndThread => 0x0B,
            RecordTag::HeapDump => 0x0C,
            RecordTag::CpuSamples => 0x0D,
            RecordTag::ControlSettings => 0x0E,
            RecordTag::HeapDumpSegment => 0x1C,
            RecordTag::HeapDumpEnd => 0x2C,
        }
    }
}

/// `tag`, `micros_since_header_ts`, `length` as read off the wire, plus
/// the already-classified [RecordTag] for convenience.
pub struct RecordHeader {
    pub tag: RecordTag,
    pub micros_since_header_ts: u32,
    pub length: u32,
}

/// Reads the next record header, or `None` on a clean end of stream (no
/// bytes at all where a tag byte was expected -- this is how the
/// top-level record loop terminates, as opposed to a premature EOF
/// partway through a header or body, which is fatal).
pub fn read_record_header<R: Read>(r: &mut R) -> Result<Option<RecordHeader>> {
    let mut tag_byte = [0u8; 1];
    let n = r.read(&mut tag_byte)?;
    if n == 0 {
        return Ok(None);
    }

    let tag = RecordTag::from_byte(tag_byte[0])?;
    let micros_since_header_ts = r.read_u32::<BigEndian>()?;
    let length = r.read_u32::<BigEndian>()?;

    Ok(Some(RecordHeader {
        tag,
        micros_since_header_ts,
        length,
    }))
}

pub fn write_record_header<W: Write>(w: &mut W, tag: RecordTag, micros: u32, len: u32) -> Result<()> {
    w.write_u8(tag.to_byte())?;
    w.write_u32::<BigEndian>(micros)?;
    w.write_u32::<BigEndian>(len)?;
    Ok(())
}
