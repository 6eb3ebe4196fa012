use crate::error::ControlError;
use byteorder::{ByteOrder, LittleEndian};

/// Result of decoding a control payload.
///
/// A payload holding exactly one field decodes to `Scalar`; anything else
/// decodes to `Fields` in buffer order. Callers match on the variant, so the
/// scalar/list split is part of the public contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedValue {
    Scalar(i64),
    Fields(Vec<i64>),
}

impl DecodedValue {
    /// The decoded fields regardless of variant, in buffer order.
    pub fn fields(&self) -> Vec<i64> {
        match self {
            DecodedValue::Scalar(value) => vec![*value],
            DecodedValue::Fields(values) => values.clone(),
        }
    }
}

/// Split a control payload into consecutive signed little-endian integers of
/// `field_size` bytes each.
pub fn read_ints(buffer: &[u8], field_size: usize) -> Result<DecodedValue, ControlError> {
    if field_size == 0 || field_size > 8 || buffer.len() % field_size != 0 {
        return Err(ControlError::MisalignedFields {
            length: buffer.len(),
            field_size,
        });
    }

    let mut fields: Vec<i64> = buffer
        .chunks_exact(field_size)
        .map(|chunk| LittleEndian::read_int(chunk, field_size))
        .collect();

    if fields.len() == 1 {
        Ok(DecodedValue::Scalar(fields.remove(0)))
    } else {
        Ok(DecodedValue::Fields(fields))
    }
}

/// Write a single signed little-endian integer of `length` bytes into the
/// front of `buffer`.
pub fn write_int(buffer: &mut [u8], value: i64, length: usize) -> Result<(), ControlError> {
    if length == 0 || length > 8 || buffer.len() < length || !fits(value, length) {
        return Err(ControlError::ValueOutOfRange { value, length });
    }
    LittleEndian::write_int(&mut buffer[..length], value, length);
    Ok(())
}

fn fits(value: i64, length: usize) -> bool {
    if length >= 8 {
        return true;
    }
    let bits = (length * 8) as u32;
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    (min..=max).contains(&value)
}
