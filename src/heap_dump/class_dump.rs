//! `GC_CLASS_DUMP` (spec.md §4.7.1): the sub-record that teaches the
//! metadata store and the name-kind table what a class looks like --
//! its superclass, its instance field layout, and the symbol ids its
//! constant pool and static fields reference.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;
use crate::id::{Id, IdSize, Serial};
use crate::metadata::{ClassInfo, ClassMetadataStore, FieldDef};
use crate::namekind::{NameKind, NameKindTable};
use crate::primitive::PrimitiveType;
use crate::transform::Transformer;

use super::{skip_value, transform_value};

/// Ids that follow the (class id, stack trace serial, super class id)
/// triple and precede the fixed `u4` instance size: class loader,
/// signers, protection domain, and two reserved slots. None of these
/// are ever symbols or transformable scalars.
const TRAILING_FIXED_IDS: usize = 5;

pub fn scan<R: Read>(
    r: &mut R,
    id_size: IdSize,
    metadata: &mut ClassMetadataStore,
    namekind: &mut NameKindTable,
) -> Result<()> {
    let class_id = Id::read(r, id_size)?;
    let _stack_trace_serial = Serial::read(r)?;
    let super_class_id_raw = Id::read(r, id_size)?;
    for _ in 0..TRAILING_FIXED_IDS {
        Id::read(r, id_size)?;
    }
    let _instance_size = r.read_u32::<BigEndian>()?;

    let cp_count = r.read_u16::<BigEndian>()?;
    for _ in 0..cp_count {
        let _index = r.read_u16::<BigEndian>()?;
        let ty = PrimitiveType::from_tag(r.read_u8()?)?;
        skip_value(r, id_size, ty)?;
    }

    let static_count = r.read_u16::<BigEndian>()?;
    for _ in 0..static_count {
        let name_id = Id::read(r, id_size)?;
        namekind.classify(name_id, NameKind::FieldName);
        let ty = PrimitiveType::from_tag(r.read_u8()?)?;
        skip_value(r, id_size, ty)?;
    }

    let instance_count = r.read_u16::<BigEndian>()?;
    let mut instance_fields = Vec::with_capacity(instance_count as usize);
    for _ in 0..instance_count {
        let name_id = Id::read(r, id_size)?;
        namekind.classify(name_id, NameKind::FieldName);
        let field_type = PrimitiveType::from_tag(r.read_u8()?)?;
        instance_fields.push(FieldDef {
            name_id,
            field_type,
        });
    }

    let super_class_id = if super_class_id_raw.id() == 0 {
        None
    } else {
        Some(super_class_id_raw)
    };
    metadata.update_class(
        class_id,
        ClassInfo {
            super_class_id,
            instance_fields,
        },
    );
    Ok(())
}

pub fn rewrite<R: Read, W: Write>(
    r: &mut R,
    w: &mut W,
    id_size: IdSize,
    metadata: &mut ClassMetadataStore,
    transformer: &dyn Transformer,
) -> Result<()> {
    let class_id = Id::read(r, id_size)?;
    class_id.write(w, id_size)?;
    let stack_trace_serial = Serial::read(r)?;
    stack_trace_serial.write(w)?;
    let super_class_id_raw = Id::read(r, id_size)?;
    super_class_id_raw.write(w, id_size)?;
    for _ in 0..TRAILING_FIXED_IDS {
        let id = Id::read(r, id_size)?;
        id.write(w, id_size)?;
    }
    let instance_size = r.read_u32::<BigEndian>()?;
    w.write_u32::<BigEndian>(instance_size)?;

    let cp_count = r.read_u16::<BigEndian>()?;
    w.write_u16::<BigEndian>(cp_count)?;
    for _ in 0..cp_count {
        let index = r.read_u16::<BigEndian>()?;
        w.write_u16::<BigEndian>(index)?;
        let ty_byte = r.read_u8()?;
        w.write_u8(ty_byte)?;
        let ty = PrimitiveType::from_tag(ty_byte)?;
        transform_value(r, w, id_size, ty, transformer)?;
    }

    let static_count = r.read_u16::<BigEndian>()?;
    w.write_u16::<BigEndian>(static_count)?;
    for _ in 0..static_count {
        let name_id = Id::read(r, id_size)?;
        name_id.write(w, id_size)?;
        let ty_byte = r.read_u8()?;
        w.write_u8(ty_byte)?;
        let ty = PrimitiveType::from_tag(ty_byte)?;
        transform_value(r, w, id_size, ty, transformer)?;
    }

    let instance_count = r.read_u16::<BigEndian>()?;
    w.write_u16::<BigEndian>(instance_count)?;
    let mut instance_fields = Vec::with_capacity(instance_count as usize);
    for _ in 0..instance_count {
        let name_id = Id::read(r, id_size)?;
        name_id.write(w, id_size)?;
        let ty_byte = r.read_u8()?;
        w.write_u8(ty_byte)?;
        let field_type = PrimitiveType::from_tag(ty_byte)?;
        instance_fields.push(FieldDef {
            name_id,
            field_type,
        });
    }

    let super_class_id = if super_class_id_raw.id() == 0 {
        None
    } else {
        Some(super_class_id_raw)
    };
    metadata.update_class(
        class_id,
        ClassInfo {
            super_class_id,
            instance_fields,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::transform::NoopTransformer;

    fn encode_class_dump(id_size: IdSize, super_id: u64, instance_fields: &[(u64, u8)]) -> Vec<u8> {
        let mut buf = Vec::new();
        Id::from(1).write(&mut buf, id_size).unwrap();
        Serial::from(0).write(&mut buf).unwrap();
        Id::from(super_id).write(&mut buf, id_size).unwrap();
        for _ in 0..TRAILING_FIXED_IDS {
            Id::from(0).write(&mut buf, id_size).unwrap();
        }
        buf.write_u32::<BigEndian>(0).unwrap(); // instance size
        buf.write_u16::<BigEndian>(0).unwrap(); // constant pool count
        buf.write_u16::<BigEndian>(0).unwrap(); // static field count
        buf.write_u16::<BigEndian>(instance_fields.len() as u16)
            .unwrap();
        for (name_id, ty) in instance_fields {
            Id::from(*name_id).write(&mut buf, id_size).unwrap();
            buf.write_u8(*ty).unwrap();
        }
        buf
    }

    #[test]
    fn scan_records_instance_field_layout_and_classifies_field_names() {
        let encoded = encode_class_dump(IdSize::U32, 0, &[(42, PrimitiveType::Int.tag())]);
        let mut cursor = Cursor::new(encoded);
        let mut metadata = ClassMetadataStore::new();
        let mut namekind = NameKindTable::new();
        scan(&mut cursor, IdSize::U32, &mut metadata, &mut namekind).unwrap();

        assert_eq!(
            metadata.flatten(Id::from(1)).unwrap(),
            vec![PrimitiveType::Int]
        );
        assert_eq!(
            namekind.kind_of(Id::from(42)),
            Some(NameKind::FieldName)
        );
    }

    #[test]
    fn rewrite_with_noop_transformer_is_byte_identical() {
        let encoded = encode_class_dump(IdSize::U64, 0, &[(7, PrimitiveType::Long.tag())]);
        let mut cursor = Cursor::new(encoded.clone());
        let mut metadata = ClassMetadataStore::new();
        let mut out = Vec::new();
        rewrite(&mut cursor, &mut out, IdSize::U64, &mut metadata, &NoopTransformer).unwrap();
        assert_eq!(out, encoded);
    }
}
