// src/voxel/codec.rs
use crate::error::{Result, SegError};
use crate::types::{Endian, VoxelType};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

/// Decode one block of voxels into label values.
///
/// Negative values and values above `u32::MAX` are rejected; labels are
/// non-negative by construction.
pub fn decode_block(bytes: &[u8], voxel_type: VoxelType, endian: Endian) -> Result<Vec<u32>> {
    let size = voxel_type.fixed_size();
    if bytes.len() % size != 0 {
        return Err(SegError::InvalidVoxelData(format!(
            "{} bytes is not a whole number of {} voxels",
            bytes.len(),
            voxel_type.nrrd_name()
        )));
    }
    trace!("Decoding {} {} voxels", bytes.len() / size, voxel_type.nrrd_name());

    match endian {
        Endian::Little => decode_with::<LittleEndian>(bytes, voxel_type),
        Endian::Big => decode_with::<BigEndian>(bytes, voxel_type),
    }
}

fn decode_with<E: ByteOrder>(bytes: &[u8], voxel_type: VoxelType) -> Result<Vec<u32>> {
    let count = bytes.len() / voxel_type.fixed_size();
    match voxel_type {
        VoxelType::U8 => Ok(bytes.iter().map(|&v| u32::from(v)).collect()),
        VoxelType::I8 => bytes.iter().map(|&v| from_signed(i64::from(v as i8))).collect(),
        VoxelType::U16 => {
            let mut values = vec![0u16; count];
            E::read_u16_into(bytes, &mut values);
            Ok(values.into_iter().map(u32::from).collect())
        }
        VoxelType::I16 => {
            let mut values = vec![0i16; count];
            E::read_i16_into(bytes, &mut values);
            values.into_iter().map(|v| from_signed(i64::from(v))).collect()
        }
        VoxelType::U32 => {
            let mut values = vec![0u32; count];
            E::read_u32_into(bytes, &mut values);
            Ok(values)
        }
        VoxelType::I32 => {
            let mut values = vec![0i32; count];
            E::read_i32_into(bytes, &mut values);
            values.into_iter().map(|v| from_signed(i64::from(v))).collect()
        }
        VoxelType::U64 => {
            let mut values = vec![0u64; count];
            E::read_u64_into(bytes, &mut values);
            values
                .into_iter()
                .map(|v| {
                    u32::try_from(v).map_err(|_| SegError::InvalidVoxelData(format!("label value {v} too large")))
                })
                .collect()
        }
        VoxelType::I64 => {
            let mut values = vec![0i64; count];
            E::read_i64_into(bytes, &mut values);
            values.into_iter().map(from_signed).collect()
        }
    }
}

fn from_signed(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        if value < 0 {
            SegError::InvalidVoxelData(format!("negative label value {value}"))
        } else {
            SegError::InvalidVoxelData(format!("label value {value} too large"))
        }
    })
}

/// Encode label values as one block of `voxel_type` voxels
pub fn encode_block(values: &[u32], voxel_type: VoxelType, endian: Endian) -> Result<Bytes> {
    if let Some(&too_large) = values.iter().find(|&&v| u64::from(v) > voxel_type.max_label()) {
        return Err(SegError::InvalidVoxelData(format!(
            "label value {too_large} does not fit in {}",
            voxel_type.nrrd_name()
        )));
    }

    let mut buffer = BytesMut::with_capacity(values.len() * voxel_type.fixed_size());
    let little = endian == Endian::Little;
    for &v in values {
        match voxel_type {
            VoxelType::U8 => buffer.put_u8(v as u8),
            VoxelType::I8 => buffer.put_i8(v as i8),
            VoxelType::U16 if little => buffer.put_u16_le(v as u16),
            VoxelType::U16 => buffer.put_u16(v as u16),
            VoxelType::I16 if little => buffer.put_i16_le(v as i16),
            VoxelType::I16 => buffer.put_i16(v as i16),
            VoxelType::U32 if little => buffer.put_u32_le(v),
            VoxelType::U32 => buffer.put_u32(v),
            VoxelType::I32 if little => buffer.put_i32_le(v as i32),
            VoxelType::I32 => buffer.put_i32(v as i32),
            VoxelType::U64 if little => buffer.put_u64_le(u64::from(v)),
            VoxelType::U64 => buffer.put_u64(u64::from(v)),
            VoxelType::I64 if little => buffer.put_i64_le(i64::from(v)),
            VoxelType::I64 => buffer.put_i64(i64::from(v)),
        }
    }
    Ok(buffer.freeze())
}
