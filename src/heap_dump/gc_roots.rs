//! The GC-root sub-records: each just names an object id alongside a
//! little fixed metadata, none of which is a symbol or a scalar value,
//! so every one of them is copy-through.

use std::io::{Read, Write};

use crate::error::Result;
use crate::id::IdSize;

use super::SubRecordTag;

/// Byte length of the payload that follows the tag byte, for the GC-root
/// family of sub-records. `ThreadBlock`/`NativeStack` carry a thread
/// serial only; `JniLocal`/`JavaFrame`/`ThreadObj` carry an id plus a
/// thread serial and a frame/line number; `JniGlobal` carries two ids;
/// everything else is a bare id.
fn payload_len(tag: SubRecordTag, id_size: IdSize) -> usize {
    let id = id_size.size_in_bytes();
    match tag {
        SubRecordTag::RootUnknown
        | SubRecordTag::RootStickyClass
        | SubRecordTag::RootMonitorUsed => id,
        SubRecordTag::RootJniGlobal => id + id,
        SubRecordTag::RootJniLocal | SubRecordTag::RootJavaFrame | SubRecordTag::RootThreadObj => {
            id + 4 + 4
        }
        SubRecordTag::RootNativeStack | SubRecordTag::RootThreadBlock => id + 4,
        other => unreachable!("{other:?} is not a GC root sub-record"),
    }
}

pub fn scan<R: Read>(r: &mut R, id_size: IdSize, tag: SubRecordTag) -> Result<()> {
    let mut buf = [0u8; 16];
    r.read_exact(&mut buf[..payload_len(tag, id_size)])?;
    Ok(())
}

pub fn rewrite<R: Read, W: Write>(
    r: &mut R,
    w: &mut W,
    id_size: IdSize,
    tag: SubRecordTag,
) -> Result<()> {
    let len = payload_len(tag, id_size);
    let mut buf = [0u8; 16];
    r.read_exact(&mut buf[..len])?;
    w.write_all(&buf[..len])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn root_unknown_copies_one_id() {
        let data = vec![0xAAu8; 8];
        let mut cursor = Cursor::new(data.clone());
        let mut out = Vec::new();
        rewrite(&mut cursor, &mut out, IdSize::U64, SubRecordTag::RootUnknown).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn jni_local_copies_id_plus_thread_and_frame_number() {
        let data = vec![0u8; 4 + 4 + 4];
        let mut cursor = Cursor::new(data.clone());
        let mut out = Vec::new();
        rewrite(&mut cursor, &mut out, IdSize::U32, SubRecordTag::RootJniLocal).unwrap();
        assert_eq!(out.len(), data.len());
    }
}
