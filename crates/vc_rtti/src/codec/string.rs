use alloc::string::String;

use crate::RttiError;
use crate::codec::{PlainCodec, read_versioned, versioned_size, write_versioned};
use crate::stream::{BinaryReader, BinaryWriter};

/// `[length][version = 1][utf-8 bytes]`, the byte count is implied by the block.
impl PlainCodec for String {
    const DYNAMIC: bool = true;
    const VERSION: u32 = 1;

    fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError> {
        write_versioned(writer, Self::VERSION, |w| {
            w.write_bytes(self.as_bytes())?;
            Ok(())
        })
    }

    fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
        read_versioned(reader, "String", Self::VERSION, |r, _| {
            let offset = r.offset();
            String::from_utf8(r.read_to_end().to_vec()).map_err(|err| RttiError::InvalidData {
                offset: offset + err.utf8_error().valid_up_to(),
                reason: "string is not valid utf-8".into(),
            })
        })
    }

    #[inline]
    fn dynamic_size(&self) -> u32 {
        versioned_size(self.len())
    }
}
