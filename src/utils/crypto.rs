// src/utils/crypto.rs
//! Checksum helpers for the iden3 identifier layout.

use crc::{Crc, CRC_16_XMODEM};

/// CRC-16/XMODEM: polynomial `0x1021`, initial value `0`, no reflection,
/// no final xor.
const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Computes the CRC-16/XMODEM checksum of `data`.
///
/// Used as the trailing checksum of an iden3 identifier.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    XMODEM.checksum(data)
}
