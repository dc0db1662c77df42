use crate::helpers::ensure;
use crate::types::{Poly, Z};
use crate::Q;

/// Algorithm 2 `BitsToBytes(b)` on page 17 and Algorithm 3 `BytesToBits(B)` on page 18 are not
/// exposed as standalone functions here — `byte_encode`/`byte_decode` below fuse the bit-packing
/// loop directly into the d-bit field extraction for performance, the way the teacher crate does.

/// Algorithm 4 `ByteEncode<d>(F)` on page 19.
/// Encodes an array of d-bit integers into a byte array, for 1 <= d <= 12.
///
/// Input: integer array `F ∈ Z^256_m`, where `m = 2^d` if `d < 12` and `m = q` if `d = 12` <br>
/// Output: byte array `B ∈ B^{32d}`
pub(crate) fn byte_encode(d: u32, integers_f: &Poly, bytes_b: &mut [u8]) -> Result<(), &'static str> {
    ensure!((1..=12).contains(&d), "Alg4: d out of range");
    ensure!(bytes_b.len() == 32 * d as usize, "Alg4: byte length not 32 * d");
    let m = if d < 12 { 2u64.pow(d) } else { Q as u64 };

    let mut temp = 0u64;
    let mut bit_index = 0usize;
    let mut byte_index = 0usize;
    for coeff in integers_f {
        let coeff = u64::from(coeff.get_u16());
        ensure!(coeff < m, "Alg4: coefficient out of range");
        temp |= (coeff & (2u64.pow(d) - 1)) << bit_index;
        bit_index += d as usize;
        while bit_index >= 8 {
            bytes_b[byte_index] = temp as u8;
            temp >>= 8;
            byte_index += 1;
            bit_index -= 8;
        }
    }
    Ok(())
}


/// Algorithm 5 `ByteDecode<d>(B)` on page 19.
/// Decodes a byte array into an array of d-bit integers, for 1 <= d <= 12.
///
/// Input: byte array `B ∈ B^{32d}` <br>
/// Output: integer array `F ∈ Z^256_m`, where `m = 2^d` if `d < 12` and `m = q` if `d = 12`.
/// For `d = 12`, every decoded value is additionally required to be `< q` (FIPS 203 Algorithm 6's
/// modulus check, invoked on public-key ingestion).
pub(crate) fn byte_decode(d: u32, bytes_b: &[u8]) -> Result<Poly, &'static str> {
    ensure!((1..=12).contains(&d), "Alg5: d out of range");
    ensure!(bytes_b.len() == 32 * d as usize, "Alg5: byte length not 32 * d");

    let mut integers_f = [Z::default(); 256];
    let mut temp = 0u64;
    let mut int_index = 0usize;
    let mut bit_index = 0usize;
    for byte in bytes_b {
        temp |= u64::from(*byte) << bit_index;
        bit_index += 8;
        while bit_index >= d as usize {
            let mask = temp & (2u64.pow(d) - 1);
            integers_f[int_index].set_u16(mask as u16);
            bit_index -= d as usize;
            temp >>= d;
            int_index += 1;
        }
    }
    let max = if d < 12 { 2u16.pow(d) } else { Q as u16 };
    ensure!(integers_f.iter().all(|e| e.get_u16() < max), "Alg5: integers out of range");
    Ok(integers_f)
}


#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;
    use alloc::vec::Vec;

    use rand::{Rng, SeedableRng};

    use crate::byte_fns::{byte_decode, byte_encode};

    #[test]
    fn test_decode_and_encode_round_trip() {
        // ByteDecode_d(ByteEncode_d(F)) = F, and for random well-formed byte strings,
        // ByteEncode_d(ByteDecode_d(B)) = B.
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(123);
        for d in [1u32, 4, 5, 10, 11] {
            for _ in 0..50 {
                let bytes1: Vec<u8> = (0..32 * d as usize).map(|_| rng.gen()).collect();
                let decoded = byte_decode(d, &bytes1).unwrap();
                let mut bytes2 = vec![0u8; 32 * d as usize];
                byte_encode(d, &decoded, &mut bytes2).unwrap();
                assert_eq!(bytes1, bytes2);
            }
        }
    }

    #[test]
    fn test_decode_and_encode_d12() {
        // d = 12 draws from m = q rather than a power of two, and additionally rejects
        // fields that decode to >= q.
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let bytes1: Vec<u8> = (0..32 * 12).map(|_| rng.gen()).collect();
            match byte_decode(12, &bytes1) {
                Ok(decoded) => {
                    let mut bytes2 = vec![0u8; 32 * 12];
                    byte_encode(12, &decoded, &mut bytes2).unwrap();
                    assert_eq!(bytes1, bytes2);
                }
                Err(_) => {} // random bytes occasionally decode a field >= q; that's the point
            }
        }
    }

    #[test]
    fn test_byte_decode_rejects_bad_length() {
        let bytes = vec![0u8; 10];
        assert!(byte_decode(12, &bytes).is_err());
    }

    #[test]
    fn test_byte_encode_rejects_out_of_range_coefficient() {
        use crate::types::Z;
        let mut integers_f = [Z::default(); 256];
        integers_f[0].set_u16(2); // a value of 2 is out of range for d = 1 (m = 2)
        let mut bytes = vec![0u8; 32];
        assert!(byte_encode(1, &integers_f, &mut bytes).is_err());
    }
}
