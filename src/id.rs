//! Identifiers and serials: the two ways hprof refers to things.
//!
//! Adapted from the teacher's `Id`/`Serial`/`IdSize` types, now backed by
//! streaming reads/writes instead of slice parsing.

use std::fmt;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use getset::CopyGetters;

use crate::error::{HprofRedactError, Result};

/// Ids identify objects, classes, utf8 blobs, etc. Always widened to 64
/// bits in memory regardless of the on-wire [IdSize] — if the heap fits
/// in a 32-bit address space, widening costs nothing worth worrying about.
#[derive(CopyGetters, Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Id {
    #[get_copy = "pub"]
    id: u64,
}

impl From<u64> for Id {
    fn from(id: u64) -> Id {
        Id { id }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::UpperHex for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.id, f)
    }
}

/// An alternate means of identification used in parallel with [Id], e.g.
/// `LoadClass` has both a `class_obj_id` and a `class_serial`.
#[derive(CopyGetters, Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Serial {
    #[get_copy = "pub"]
    num: u32,
}

impl From<u32> for Serial {
    fn from(num: u32) -> Self {
        Serial { num }
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)
    }
}

impl Serial {
    pub fn read<R: Read>(r: &mut R) -> Result<Serial> {
        Ok(Serial::from(r.read_u32::<BigEndian>()?))
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        Ok(w.write_u32::<BigEndian>(self.num)?)
    }
}

/// Hprof ids can be 32 or 64 bit, depending on the system and JVM that
/// produced the dump. Fixed once the header is parsed; never changes
/// mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSize {
    U32,
    U64,
}

impl IdSize {
    pub fn from_header_value(value: u32) -> Result<IdSize> {
        match value {
            4 => Ok(IdSize::U32),
            8 => Ok(IdSize::U64),
            other => Err(HprofRedactError::UnsupportedIdSize(other)),
        }
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            IdSize::U32 => 4,
            IdSize::U64 => 8,
        }
    }
}

impl Id {
    pub fn read<R: Read>(r: &mut R, id_size: IdSize) -> Result<Id> {
        let raw = match id_size {
            IdSize::U32 => r.read_u32::<BigEndian>()? as u64,
            IdSize::U64 => r.read_u64::<BigEndian>()?,
        };
        Ok(Id::from(raw))
    }

    pub fn write<W: Write>(&self, w: &mut W, id_size: IdSize) -> Result<()> {
        match id_size {
            IdSize::U32 => w.write_u32::<BigEndian>(self.id as u32)?,
            IdSize::U64 => w.write_u64::<BigEndian>(self.id)?,
        }
        Ok(())
    }
}
