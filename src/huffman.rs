/*
 * rawspeed - huffman.rs
 *
 * Copyright (C) 2024 The rawspeed-rs authors
 *
 * This library is free software: you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public License
 * as published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library.  If not, see
 * <http://www.gnu.org/licenses/>.
 */

//! Canonical Huffman (prefix-code) table with two-tier decoding.
//!
//! Construction follows JPEG Annex C (`bits`/`huffval`), as in the
//! teacher's `decompress/ljpeg.rs::HuffmanTable::fix`. The fast lookup is
//! generalized from the teacher's 8-bit table to `L = 11` bits per the
//! specification, with the long-code fallback (`maxcode`/`codeOffset`)
//! modeled on RawSpeed's `HuffDecodeNikon`/`HuffDecodePentax` `bigTable`
//! pattern.

use crate::{Error, Result};

/// Width of the fast direct-lookup table.
pub const FAST_BITS: u32 = 11;
const FAST_SIZE: usize = 1 << FAST_BITS;

/// A single entry of the fast lookup table.
#[derive(Clone, Copy, Debug)]
enum FastEntry {
    /// Code (plus, in full-decode mode, its difference bits) fit
    /// entirely within `FAST_BITS`: `(bits consumed, decoded value)`.
    Complete(u32, i32),
    /// Code is longer than `FAST_BITS`, or its difference bits don't
    /// fit: fall back to the long-code path after skipping `FAST_BITS`.
    Partial,
    /// No code of this length is a prefix of this index - undefined
    /// unless the table construction is buggy.
    Invalid,
}

/// Whether `decode()` returns the fully-reconstructed difference value,
/// or the raw decoded symbol (used by codecs that interleave multiple
/// length tokens before reading the associated difference bits).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeMode {
    FullDecode,
    LengthOnly,
}

/// A canonical Huffman table built from JPEG-DHT-style length counts and
/// an alphabet of code values.
pub struct HuffmanTable {
    fast: Vec<FastEntry>,
    max_code: [i32; 18],
    code_offset: [i32; 18],
    huffval: Vec<u8>,
    mode: DecodeMode,
    /// DNG 1.0 bug-compat: skip 16 extra bits after a length-16 symbol.
    dng_bug_compat: bool,
}

impl HuffmanTable {
    /// Build from `n_codes_per_length[1..=16]` (count of codes at each
    /// bit length) and `code_values` (alphabet symbol for each code, in
    /// canonical order).
    pub fn new(
        n_codes_per_length: &[u8; 16],
        code_values: &[u8],
        mode: DecodeMode,
    ) -> Result<Self> {
        let total: usize = n_codes_per_length.iter().map(|&n| n as usize).sum();
        if total == 0 {
            return Err(Error::ParseError("empty Huffman table".into()));
        }
        if total > 162 {
            return Err(Error::ParseError("too many Huffman codes".into()));
        }
        if code_values.len() < total {
            return Err(Error::ParseError("code value list too short".into()));
        }

        // Canonical code assignment (JPEG Annex C.2: generate_size_table
        // + generate_code_table), validating feasibility as we go.
        let mut huffsize = Vec::with_capacity(total);
        for (len_idx, &count) in n_codes_per_length.iter().enumerate() {
            for _ in 0..count {
                huffsize.push((len_idx + 1) as u32);
            }
        }
        let mut huffcode = Vec::with_capacity(total);
        let mut code: u32 = 0;
        let mut si = huffsize.first().copied().unwrap_or(0);
        let mut k = 0;
        while k < huffsize.len() {
            while k < huffsize.len() && huffsize[k] == si {
                huffcode.push(code);
                code += 1;
                k += 1;
            }
            // Feasibility: running code must still fit in `si` bits
            // before doubling for the next length.
            if code > (1u32 << si) {
                return Err(Error::ParseError("infeasible Huffman code lengths".into()));
            }
            code <<= 1;
            si += 1;
            if si > 16 {
                break;
            }
        }

        let mut max_code = [-1i32; 18];
        let mut code_offset = [0i32; 18];
        let mut min_code_for_len = [0i32; 18];
        {
            let mut p = 0usize;
            for l in 1..=16usize {
                let count = n_codes_per_length[l - 1] as usize;
                if count == 0 {
                    max_code[l] = -1;
                    continue;
                }
                min_code_for_len[l] = huffcode[p] as i32;
                max_code[l] = huffcode[p + count - 1] as i32;
                code_offset[l] = p as i32 - min_code_for_len[l];
                p += count;
            }
        }

        let mut fast = vec![FastEntry::Invalid; FAST_SIZE];
        for i in 0..total {
            let len = huffsize[i];
            let code = huffcode[i];
            if len > FAST_BITS {
                let prefix = (code >> (len - FAST_BITS)) as usize;
                fast[prefix] = FastEntry::Partial;
                continue;
            }
            let sym = code_values[i];
            let shift = FAST_BITS - len;
            let base = (code as usize) << shift;
            #[allow(clippy::needless_range_loop)]
            for idx in base..base + (1usize << shift) {
                match mode {
                    DecodeMode::LengthOnly => {
                        fast[idx] = FastEntry::Complete(len, sym as i32);
                    }
                    DecodeMode::FullDecode => {
                        let diff_bits = sym as u32;
                        if diff_bits == 0 {
                            fast[idx] = FastEntry::Complete(len, 0);
                        } else if len + diff_bits > FAST_BITS {
                            fast[idx] = FastEntry::Partial;
                        } else {
                            let extra = idx & ((1usize << shift) - 1);
                            let diff_field = (extra >> (shift - diff_bits)) as u32;
                            let value = extend(diff_field as i32, diff_bits);
                            fast[idx] = FastEntry::Complete(len + diff_bits, value);
                        }
                    }
                }
            }
        }
        Ok(HuffmanTable {
            fast,
            max_code,
            code_offset,
            huffval: code_values[..total].to_vec(),
            mode,
            dng_bug_compat: false,
        })
    }

    /// Build directly from a JPEG DHT segment's 16 length-count bytes
    /// plus its value bytes (the classic `bits[1..=16]` + `huffval`
    /// shape used by SOF3/DHT markers).
    pub fn from_dht(bits: &[u8; 16], huffval: &[u8]) -> Result<Self> {
        Self::new(bits, huffval, DecodeMode::FullDecode)
    }

    pub fn set_dng_bug_compat(&mut self, enabled: bool) {
        self.dng_bug_compat = enabled;
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Decode one symbol (length-only mode) or one fully-reconstructed
    /// difference (full-decode mode) from `pump`.
    pub fn decode<P: crate::bitpump::BitPump>(&self, pump: &mut P) -> Result<i32> {
        pump.fill(32);
        let peek = pump.peek_bits_no_fill(FAST_BITS);
        match self.fast[peek as usize] {
            FastEntry::Complete(consumed, value) => {
                pump.skip_bits_no_fill(consumed);
                Ok(value)
            }
            FastEntry::Partial => self.decode_long(pump, peek as i32),
            FastEntry::Invalid => Err(Error::DecodeError(format!(
                "corrupt Huffman code (prefix {peek:#x})"
            ))),
        }
    }

    /// Long-code fallback: `peeked` is the `FAST_BITS`-wide prefix
    /// already inspected (but not yet consumed) by `decode`.
    fn decode_long<P: crate::bitpump::BitPump>(&self, pump: &mut P, peeked: i32) -> Result<i32> {
        pump.skip_bits_no_fill(FAST_BITS);
        let mut code = peeked;
        let mut l = FAST_BITS as usize + 1;
        while l <= 16 && code > self.max_code[l] {
            code = (code << 1) | pump.get_bits(1) as i32;
            l += 1;
        }
        if l > 16 {
            return Err(Error::DecodeError("Huffman code longer than 16 bits".into()));
        }
        let idx = (self.code_offset[l] + code) as usize;
        let sym = *self
            .huffval
            .get(idx)
            .ok_or_else(|| Error::DecodeError("Huffman symbol index out of range".into()))?;

        match self.mode {
            DecodeMode::LengthOnly => Ok(sym as i32),
            DecodeMode::FullDecode => {
                if sym == 0 {
                    return Ok(0);
                }
                if sym == 16 {
                    // DNG 1.0 bug workaround (spec 9's Open Question):
                    // disabled unless the DNG tile decoder opts in.
                    if self.dng_bug_compat {
                        pump.skip_bits(16);
                    }
                    return Ok(-32768);
                }
                let bits = pump.get_bits(sym as u32) as i32;
                Ok(extend(bits, sym as u32))
            }
        }
    }
}

/// Sign-extension per spec 4.C: `extend(diff, len) = diff if top bit set,
/// else diff - ((1<<len) - 1)`.
pub fn extend(diff: i32, len: u32) -> i32 {
    if len == 0 {
        return 0;
    }
    if diff & (1 << (len - 1)) != 0 {
        diff
    } else {
        diff - ((1 << len) - 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bitpump::BitPumpMsb;
    use crate::buffer::{ByteBufferView, Endian};

    #[test]
    fn test_length_only_round_trip_scenario() {
        // spec 8, scenario 1: nCodesPerLength = [0,1,1] (one code of
        // length 2, one of length 3), codeValues = [0x04, 0x03].
        // Bit-stream "00" then "010" -> 0x04, then 0x03.
        let mut lens = [0u8; 16];
        lens[1] = 1;
        lens[2] = 1;
        let table = HuffmanTable::new(&lens, &[0x04, 0x03], DecodeMode::LengthOnly).unwrap();

        // "00010" as a single byte stream, MSB first.
        let data = [0b0001_0000];
        let view = ByteBufferView::new(&data, Endian::Big);
        let mut pump = BitPumpMsb::new(&view);
        assert_eq!(table.decode(&mut pump).unwrap(), 0x04);
        assert_eq!(table.decode(&mut pump).unwrap(), 0x03);
    }

    #[test]
    fn test_full_decode_zero_diff() {
        // Single code of length 1, symbol 0 (zero difference bits) ->
        // decode() returns 0 immediately, matching LJPEG scenario 4's
        // "diff bits: 0" case.
        let mut lens = [0u8; 16];
        lens[0] = 1;
        let table = HuffmanTable::new(&lens, &[0x00], DecodeMode::FullDecode).unwrap();
        let data = [0u8; 4];
        let view = ByteBufferView::new(&data, Endian::Big);
        let mut pump = BitPumpMsb::new(&view);
        assert_eq!(table.decode(&mut pump).unwrap(), 0);
    }

    #[test]
    fn test_rejects_empty_table() {
        let lens = [0u8; 16];
        assert!(HuffmanTable::new(&lens, &[], DecodeMode::FullDecode).is_err());
    }

    #[test]
    fn test_extend_known_values() {
        assert_eq!(extend(0, 0), 0);
        assert_eq!(extend(8, 4), 8);
        assert_eq!(extend(15, 4), 15);
        assert_eq!(extend(7, 4), -8);
        assert_eq!(extend(0, 4), -15);
    }

    #[test]
    fn test_extend_monotonic_in_input() {
        for len in 1u32..=12 {
            let mut prev = extend(0, len);
            for v in 1i32..(1 << len) {
                let cur = extend(v, len);
                assert!(cur > prev);
                prev = cur;
            }
        }
    }
}
