//! `GC_PRIM_ARRAY_DUMP` (spec.md §4.7.3): a homogeneous array of one of
//! the eight primitive value types, decoded into a scratch `Vec`,
//! handed to the transformer's bulk hook, and re-encoded at the same
//! element width.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{HprofRedactError, Result};
use crate::id::{Id, IdSize, Serial};
use crate::primitive::PrimitiveType;
use crate::transform::Transformer;

pub fn scan<R: Read>(r: &mut R, id_size: IdSize) -> Result<()> {
    let _obj_id = Id::read(r, id_size)?;
    let _stack_trace_serial = Serial::read(r)?;
    let num_elements = r.read_u32::<BigEndian>()?;
    let element_type = PrimitiveType::from_tag(r.read_u8()?)?;
    let mut remaining = num_elements as u64 * element_type.wire_size(id_size) as u64;
    let mut scratch = [0u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(scratch.len() as u64) as usize;
        r.read_exact(&mut scratch[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

pub fn rewrite<R: Read, W: Write>(
    r: &mut R,
    w: &mut W,
    id_size: IdSize,
    transformer: &dyn Transformer,
) -> Result<()> {
    let obj_id = Id::read(r, id_size)?;
    obj_id.write(w, id_size)?;
    let stack_trace_serial = Serial::read(r)?;
    stack_trace_serial.write(w)?;
    let num_elements = r.read_u32::<BigEndian>()?;
    w.write_u32::<BigEndian>(num_elements)?;
    let ty_byte = r.read_u8()?;
    w.write_u8(ty_byte)?;
    let element_type = PrimitiveType::from_tag(ty_byte)?;
    let num_elements = num_elements as usize;

    match element_type {
        PrimitiveType::Boolean => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_u8()? != 0);
            }
            transformer.transform_boolean_array(&mut values);
            for v in values {
                w.write_u8(if v { 1 } else { 0 })?;
            }
        }
        PrimitiveType::Byte => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_i8()?);
            }
            transformer.transform_byte_array(&mut values);
            for v in values {
                w.write_i8(v)?;
            }
        }
        PrimitiveType::Char => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_u16::<BigEndian>()?);
            }
            transformer.transform_char_array(&mut values);
            for v in values {
                w.write_u16::<BigEndian>(v)?;
            }
        }
        PrimitiveType::Short => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_i16::<BigEndian>()?);
            }
            transformer.transform_short_array(&mut values);
            for v in values {
                w.write_i16::<BigEndian>(v)?;
            }
        }
        PrimitiveType::Int => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_i32::<BigEndian>()?);
            }
            transformer.transform_int_array(&mut values);
            for v in values {
                w.write_i32::<BigEndian>(v)?;
            }
        }
        PrimitiveType::Long => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_i64::<BigEndian>()?);
            }
            transformer.transform_long_array(&mut values);
            for v in values {
                w.write_i64::<BigEndian>(v)?;
            }
        }
        PrimitiveType::Float => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_f32::<BigEndian>()?);
            }
            transformer.transform_float_array(&mut values);
            for v in values {
                w.write_f32::<BigEndian>(v)?;
            }
        }
        PrimitiveType::Double => {
            let mut values = Vec::with_capacity(num_elements);
            for _ in 0..num_elements {
                values.push(r.read_f64::<BigEndian>()?);
            }
            transformer.transform_double_array(&mut values);
            for v in values {
                w.write_f64::<BigEndian>(v)?;
            }
        }
        PrimitiveType::Object | PrimitiveType::ArrayObject => {
            return Err(HprofRedactError::UnsupportedPrimitiveType(ty_byte));
        }
    }
    Ok(())
}
