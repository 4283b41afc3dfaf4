// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Interleaved 8-bit signed IQ byte stream to complex samples (§3, C2).

use num_complex::Complex64;

/// Decodes `buf` (length `2n`, interleaved signed I/Q bytes) into `n` complex samples.
/// Any trailing odd byte is ignored.
pub fn decode_iq(buf: &[u8]) -> Vec<Complex64> {
    let n = buf.len() / 2;
    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let i = buf[2 * k] as i8 as f64;
        let q = buf[2 * k + 1] as i8 as f64;
        out.push(Complex64::new(i, q));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_signed_bytes() {
        // -1 as i8 is 0xFF; 127 stays 127.
        let buf = [0xFFu8, 127u8, 0u8, 0x80u8];
        let samples = decode_iq(&buf);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], Complex64::new(-1.0, 127.0));
        assert_eq!(samples[1], Complex64::new(0.0, -128.0));
    }

    #[test]
    fn odd_trailing_byte_is_ignored() {
        let buf = [1u8, 2u8, 3u8];
        assert_eq!(decode_iq(&buf).len(), 1);
    }

    #[test]
    fn empty_input_decodes_to_empty() {
        assert!(decode_iq(&[]).is_empty());
    }
}
