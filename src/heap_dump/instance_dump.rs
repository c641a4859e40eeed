//! `GC_INSTANCE_DUMP` (spec.md §4.7.2): a flat byte blob whose field
//! layout is not self-describing -- it has to be recovered from the
//! class's flattened, inherited-first field list built while walking
//! `GC_CLASS_DUMP` records.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::byteio::copy_verbatim;
use crate::error::{HprofRedactError, Result};
use crate::id::{Id, IdSize, Serial};
use crate::metadata::ClassMetadataStore;
use crate::transform::Transformer;

use super::transform_value;

pub fn scan<R: Read>(r: &mut R, id_size: IdSize) -> Result<()> {
    let _obj_id = Id::read(r, id_size)?;
    let _stack_trace_serial = Serial::read(r)?;
    let _class_id = Id::read(r, id_size)?;
    let data_length = r.read_u32::<BigEndian>()?;
    let mut remaining = data_length as u64;
    let mut scratch = [0u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(scratch.len() as u64) as usize;
        r.read_exact(&mut scratch[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

/// Rewrites one instance dump. When the class's layout is known, each
/// field is decoded and transformed in place; when any ancestor is
/// unresolved, the whole blob is copied through untouched rather than
/// guessing at a layout (spec.md's "unresolved" sentinel semantics).
pub fn rewrite<R: Read, W: Write>(
    r: &mut R,
    w: &mut W,
    id_size: IdSize,
    metadata: &ClassMetadataStore,
    transformer: &dyn Transformer,
) -> Result<()> {
    let obj_id = Id::read(r, id_size)?;
    obj_id.write(w, id_size)?;
    let stack_trace_serial = Serial::read(r)?;
    stack_trace_serial.write(w)?;
    let class_id = Id::read(r, id_size)?;
    class_id.write(w, id_size)?;
    let data_length = r.read_u32::<BigEndian>()?;
    w.write_u32::<BigEndian>(data_length)?;

    match metadata.flatten(class_id) {
        Some(field_types) => {
            let computed: u32 = field_types
                .iter()
                .map(|t| t.wire_size(id_size) as u32)
                .sum();
            if computed != data_length {
                return Err(HprofRedactError::InstanceLayoutMismatch {
                    class_id: class_id.id(),
                    declared: data_length,
                    computed,
                });
            }
            for field_type in field_types {
                transform_value(r, w, id_size, field_type, transformer)?;
            }
        }
        None => copy_verbatim(r, w, data_length as u64)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::metadata::{ClassInfo, FieldDef};
    use crate::primitive::PrimitiveType;
    use crate::transform::NoopTransformer;

    #[test]
    fn unresolved_class_copies_body_verbatim() {
        let mut buf = Vec::new();
        Id::from(1).write(&mut buf, IdSize::U32).unwrap();
        Serial::from(0).write(&mut buf).unwrap();
        Id::from(99).write(&mut buf, IdSize::U32).unwrap();
        buf.write_u32::<BigEndian>(4).unwrap();
        buf.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut cursor = Cursor::new(buf.clone());
        let metadata = ClassMetadataStore::new();
        let mut out = Vec::new();
        rewrite(&mut cursor, &mut out, IdSize::U32, &metadata, &NoopTransformer).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn layout_mismatch_is_an_error() {
        let mut buf = Vec::new();
        Id::from(1).write(&mut buf, IdSize::U32).unwrap();
        Serial::from(0).write(&mut buf).unwrap();
        Id::from(5).write(&mut buf, IdSize::U32).unwrap();
        buf.write_u32::<BigEndian>(999).unwrap();
        buf.extend_from_slice(&[0u8; 4]);

        let mut cursor = Cursor::new(buf);
        let mut metadata = ClassMetadataStore::new();
        metadata.update_class(
            Id::from(5),
            ClassInfo {
                super_class_id: None,
                instance_fields: vec![FieldDef {
                    name_id: Id::from(1),
                    field_type: PrimitiveType::Int,
                }],
            },
        );
        let mut out = Vec::new();
        assert!(rewrite(&mut cursor, &mut out, IdSize::U32, &metadata, &NoopTransformer).is_err());
    }
}
