//! The heap-dump sub-record walker (spec.md §4.7): `HEAP_DUMP` and
//! `HEAP_DUMP_SEGMENT` bodies are themselves a sequence of tagged
//! sub-records with no length prefix of their own, so the only framing
//! authority is the outer record's declared length -- hence every
//! caller drives this module through a [BoundedReader] built from that
//! length.
//!
//! Pass 1 ([scan_segment]) and pass 2 ([rewrite_segment]) share the
//! same sub-record shapes; each sub-record kind gets its own module
//! with a `scan` and a `rewrite` entry point, mirroring the split
//! between [crate::metadata] population (pass 1 only) and value
//! transformation (pass 2 only).

pub mod class_dump;
pub mod gc_roots;
pub mod instance_dump;
pub mod object_array;
pub mod primitive_array;

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::byteio::BoundedReader;
use crate::error::{HprofRedactError, Result};
use crate::id::IdSize;
use crate::metadata::ClassMetadataStore;
use crate::namekind::NameKindTable;
use crate::primitive::PrimitiveType;
use crate::transform::Transformer;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubRecordTag {
    RootUnknown,
    RootJniGlobal,
    RootJniLocal,
    RootJavaFrame,
    RootNativeStack,
    RootStickyClass,
    RootThreadBlock,
    RootMonitorUsed,
    RootThreadObj,
    ClassDump,
    InstanceDump,
    ObjectArrayDump,
    PrimitiveArrayDump,
}

impl SubRecordTag {
    fn from_byte(b: u8) -> Result<SubRecordTag> {
        match b {
            0xFF => Ok(SubRecordTag::RootUnknown),
            0x01 => Ok(SubRecordTag::RootJniGlobal),
            0x02 => Ok(SubRecordTag::RootJniLocal),
            0x03 => Ok(SubRecordTag::RootJavaFrame),
            0x04 => Ok(SubRecordTag::RootNativeStack),
            0x05 => Ok(SubRecordTag::RootStickyClass),
            0x06 => Ok(SubRecordTag::RootThreadBlock),
            0x07 => Ok(SubRecordTag::RootMonitorUsed),
            0x08 => Ok(SubRecordTag::RootThreadObj),
            0x20 => Ok(SubRecordTag::ClassDump),
            0x21 => Ok(SubRecordTag::InstanceDump),
            0x22 => Ok(SubRecordTag::ObjectArrayDump),
            0x23 => Ok(SubRecordTag::PrimitiveArrayDump),
            other => Err(HprofRedactError::UnsupportedSubRecordTag(other)),
        }
    }
}

/// Pass 1: walks one heap-dump segment purely to populate `metadata`
/// and `namekind`. Never writes anything.
pub fn scan_segment<R: Read>(
    segment: &mut R,
    len: u64,
    id_size: IdSize,
    metadata: &mut ClassMetadataStore,
    namekind: &mut NameKindTable,
) -> Result<()> {
    let mut bounded = BoundedReader::new(segment, len);
    while !bounded.is_exhausted() {
        let tag = SubRecordTag::from_byte(bounded.read_u8()?)?;
        match tag {
            SubRecordTag::ClassDump => {
                class_dump::scan(&mut bounded, id_size, metadata, namekind)?
            }
            SubRecordTag::InstanceDump => instance_dump::scan(&mut bounded, id_size)?,
            SubRecordTag::ObjectArrayDump => object_array::scan(&mut bounded, id_size)?,
            SubRecordTag::PrimitiveArrayDump => primitive_array::scan(&mut bounded, id_size)?,
            root => gc_roots::scan(&mut bounded, id_size, root)?,
        }
    }
    bounded.finish()
}

/// Pass 2: walks one heap-dump segment, transforming values through
/// `transformer` and copying every object identity unchanged.
pub fn rewrite_segment<R: Read, W: Write>(
    segment: &mut R,
    len: u64,
    writer: &mut W,
    id_size: IdSize,
    metadata: &mut ClassMetadataStore,
    transformer: &dyn Transformer,
) -> Result<()> {
    let mut bounded = BoundedReader::new(segment, len);
    while !bounded.is_exhausted() {
        let tag_byte = bounded.read_u8()?;
        let tag = SubRecordTag::from_byte(tag_byte)?;
        writer.write_u8(tag_byte)?;
        match tag {
            SubRecordTag::ClassDump => {
                class_dump::rewrite(&mut bounded, writer, id_size, metadata, transformer)?
            }
            SubRecordTag::InstanceDump => {
                instance_dump::rewrite(&mut bounded, writer, id_size, metadata, transformer)?
            }
            SubRecordTag::ObjectArrayDump => {
                object_array::rewrite(&mut bounded, writer, id_size)?
            }
            SubRecordTag::PrimitiveArrayDump => {
                primitive_array::rewrite(&mut bounded, writer, id_size, transformer)?
            }
            root => gc_roots::rewrite(&mut bounded, writer, id_size, root)?,
        }
    }
    bounded.finish()
}

/// Reads one value of `ty` and discards it, advancing the reader by
/// exactly its wire width. Used by pass 1, which cares about the
/// symbol ids a class dump names but not the scalar values it carries.
pub(crate) fn skip_value<R: Read>(r: &mut R, id_size: IdSize, ty: PrimitiveType) -> Result<()> {
    let mut scratch = [0u8; 8];
    let width = ty.wire_size(id_size);
    r.read_exact(&mut scratch[..width])?;
    Ok(())
}

/// Reads one value of `ty`, passes it through the matching scalar hook
/// on `transformer`, and writes the result back at the same width.
/// Object and array-object values are identifiers, never transformed,
/// and are copied through unchanged.
pub(crate) fn transform_value<R: Read, W: Write>(
    r: &mut R,
    w: &mut W,
    id_size: IdSize,
    ty: PrimitiveType,
    transformer: &dyn Transformer,
) -> Result<()> {
    match ty {
        PrimitiveType::Object | PrimitiveType::ArrayObject => {
            let raw = crate::id::Id::read(r, id_size)?;
            raw.write(w, id_size)?;
        }
        PrimitiveType::Boolean => {
            let raw = r.read_u8()?;
            let observed = raw != 0;
            let transformed = transformer.transform_boolean(observed);
            if transformed == observed {
                w.write_u8(raw)?;
            } else {
                w.write_u8(if transformed { 1 } else { 0 })?;
            }
        }
        PrimitiveType::Byte => {
            let v = r.read_i8()?;
            w.write_i8(transformer.transform_byte(v))?;
        }
        PrimitiveType::Char => {
            let v = r.read_u16::<BigEndian>()?;
            w.write_u16::<BigEndian>(transformer.transform_char(v))?;
        }
        PrimitiveType::Short => {
            let v = r.read_i16::<BigEndian>()?;
            w.write_i16::<BigEndian>(transformer.transform_short(v))?;
        }
        PrimitiveType::Int => {
            let v = r.read_i32::<BigEndian>()?;
            w.write_i32::<BigEndian>(transformer.transform_int(v))?;
        }
        PrimitiveType::Long => {
            let v = r.read_i64::<BigEndian>()?;
            w.write_i64::<BigEndian>(transformer.transform_long(v))?;
        }
        PrimitiveType::Float => {
            let v = r.read_f32::<BigEndian>()?;
            w.write_f32::<BigEndian>(transformer.transform_float(v))?;
        }
        PrimitiveType::Double => {
            let v = r.read_f64::<BigEndian>()?;
            w.write_f64::<BigEndian>(transformer.transform_double(v))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::id::{Id, Serial};
    use crate::transform::NoopTransformer;

    fn encode_root_unknown(id_size: IdSize) -> Vec<u8> {
        let mut buf = vec![0xFFu8];
        Id::from(7).write(&mut buf, id_size).unwrap();
        buf
    }

    fn encode_instance_dump_with_unresolved_class(id_size: IdSize) -> Vec<u8> {
        let mut buf = vec![0x21u8];
        Id::from(1).write(&mut buf, id_size).unwrap();
        Serial::from(0).write(&mut buf).unwrap();
        Id::from(2).write(&mut buf, id_size).unwrap(); // never dumped
        buf.write_u32::<BigEndian>(0).unwrap();
        buf
    }

    #[test]
    fn scan_segment_accounts_for_exact_declared_length() {
        let encoded = encode_root_unknown(IdSize::U32);
        let len = encoded.len() as u64;
        let mut cursor = Cursor::new(encoded);
        let mut metadata = ClassMetadataStore::new();
        let mut namekind = NameKindTable::new();
        scan_segment(&mut cursor, len, IdSize::U32, &mut metadata, &mut namekind).unwrap();
    }

    #[test]
    fn rewrite_segment_with_noop_transformer_is_byte_identical() {
        let mut encoded = encode_root_unknown(IdSize::U64);
        encoded.extend(encode_instance_dump_with_unresolved_class(IdSize::U64));
        let len = encoded.len() as u64;
        let mut cursor = Cursor::new(encoded.clone());
        let mut metadata = ClassMetadataStore::new();
        let mut out = Vec::new();
        rewrite_segment(
            &mut cursor,
            len,
            &mut out,
            IdSize::U64,
            &mut metadata,
            &NoopTransformer,
        )
        .unwrap();
        assert_eq!(out, encoded);
    }

    #[test]
    fn undersized_declared_length_is_a_segment_mismatch() {
        let encoded = encode_root_unknown(IdSize::U32);
        let mut cursor = Cursor::new(encoded.clone());
        let mut metadata = ClassMetadataStore::new();
        let mut namekind = NameKindTable::new();
        // Declaring more bytes than the segment actually has makes the
        // root-unknown read run past end of stream -- fatal, not a
        // clean short segment.
        let result = scan_segment(
            &mut cursor,
            encoded.len() as u64 + 4,
            IdSize::U32,
            &mut metadata,
            &mut namekind,
        );
        assert!(result.is_err());
    }
}
