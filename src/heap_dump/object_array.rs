//! `GC_OBJ_ARRAY_DUMP`: an array of object identifiers. Identifiers are
//! never transformed, so this sub-record is structural copy-through
//! once its element count is known.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;
use crate::id::{Id, IdSize, Serial};

pub fn scan<R: Read>(r: &mut R, id_size: IdSize) -> Result<()> {
    let _obj_id = Id::read(r, id_size)?;
    let _stack_trace_serial = Serial::read(r)?;
    let num_elements = r.read_u32::<BigEndian>()?;
    let _array_class_id = Id::read(r, id_size)?;
    for _ in 0..num_elements {
        Id::read(r, id_size)?;
    }
    Ok(())
}

pub fn rewrite<R: Read, W: Write>(r: &mut R, w: &mut W, id_size: IdSize) -> Result<()> {
    let obj_id = Id::read(r, id_size)?;
    obj_id.write(w, id_size)?;
    let stack_trace_serial = Serial::read(r)?;
    stack_trace_serial.write(w)?;
    let num_elements = r.read_u32::<BigEndian>()?;
    w.write_u32::<BigEndian>(num_elements)?;
    let array_class_id = Id::read(r, id_size)?;
    array_class_id.write(w, id_size)?;
    for _ in 0..num_elements {
        let element = Id::read(r, id_size)?;
        element.write(w, id_size)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rewrite_copies_every_element_id_unchanged() {
        let mut buf = Vec::new();
        Id::from(1).write(&mut buf, IdSize::U64).unwrap();
        Serial::from(0).write(&mut buf).unwrap();
        buf.write_u32::<BigEndian>(2).unwrap();
        Id::from(10).write(&mut buf, IdSize::U64).unwrap();
        Id::from(11).write(&mut buf, IdSize::U64).unwrap();
        Id::from(12).write(&mut buf, IdSize::U64).unwrap();

        let mut cursor = Cursor::new(buf.clone());
        let mut out = Vec::new();
        rewrite(&mut cursor, &mut out, IdSize::U64).unwrap();
        assert_eq!(out, buf);
    }
}
