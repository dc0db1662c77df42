use crate::ntt::multiply_ntts;
use crate::types::{Poly, PolyVec, Z};
use crate::Q;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_256, Sha3_512, Shake128, Shake256};


/// If the condition is not met, return an error message. Borrowed from the `anyhow` crate.
macro_rules! ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return Err($msg);
        }
    };
}

pub(crate) use ensure; // make available throughout crate


/// Vector addition: `z_hat` = `u_hat` + `v_hat`, element-wise in `Z_q`.
#[must_use]
pub(crate) fn add_vecs<const K: usize>(vec_a: &PolyVec<K>, vec_b: &PolyVec<K>) -> PolyVec<K> {
    core::array::from_fn(|k| core::array::from_fn(|n| vec_a[k][n].add(vec_b[k][n])))
}


/// Matrix by vector multiplication: `w_hat` = `A_hat` mul `u_hat`.
#[must_use]
pub(crate) fn mul_mat_vec<const K: usize>(
    a_hat: &[PolyVec<K>; K], u_hat: &PolyVec<K>,
) -> PolyVec<K> {
    let mut w_hat = [[Z::default(); 256]; K];
    for i in 0..K {
        #[allow(clippy::needless_range_loop)] // alternative is harder to understand
        for j in 0..K {
            let tmp = multiply_ntts(&a_hat[i][j], &u_hat[j]);
            w_hat[i] = add_vecs(&[w_hat[i]], &[tmp])[0];
        }
    }
    w_hat
}


/// Matrix transpose by vector multiplication: `y_hat` = `A_hat^T` mul `u_hat`.
#[must_use]
pub(crate) fn mul_mat_t_vec<const K: usize>(
    a_hat: &[PolyVec<K>; K], u_hat: &PolyVec<K>,
) -> PolyVec<K> {
    let mut y_hat = [[Z::default(); 256]; K];
    #[allow(clippy::needless_range_loop)] // alternative is harder to understand
    for i in 0..K {
        #[allow(clippy::needless_range_loop)] // alternative is harder to understand
        for j in 0..K {
            let tmp = multiply_ntts(&a_hat[j][i], &u_hat[j]); // i,j swapped vs above fn
            y_hat[i] = add_vecs(&[y_hat[i]], &[tmp])[0];
        }
    }
    y_hat
}


/// Vector dot product: `z_hat` = `u_hat^T` mul `v_hat`.
#[must_use]
pub(crate) fn dot_t_prod<const K: usize>(u_hat: &PolyVec<K>, v_hat: &PolyVec<K>) -> Poly {
    let mut result = [Z::default(); 256];
    for j in 0..K {
        let tmp = multiply_ntts(&u_hat[j], &v_hat[j]);
        result = add_vecs(&[result], &[tmp])[0];
    }
    result
}


/// Function PRF_eta on page 18 (4.3): `PRF_eta(s, b) = SHAKE256(s || b, 64*eta)`.
#[must_use]
pub(crate) fn prf<const ETA_64: usize>(s: &[u8; 32], b: u8) -> [u8; ETA_64] {
    let mut hasher = Shake256::default();
    hasher.update(s);
    hasher.update(&[b]);
    let mut reader = hasher.finalize_xof();
    let mut result = [0u8; ETA_64];
    reader.read(&mut result);
    result
}


/// Function XOF on page 19 (4.6), an incremental SHAKE128 object absorbing `rho || i || j`.
/// Returned as `impl XofReader` so callers squeeze bytes lazily during rejection sampling,
/// rather than materializing the entire output up front.
#[must_use]
pub(crate) fn xof(rho: &[u8; 32], i: u8, j: u8) -> impl XofReader {
    let mut hasher = Shake128::default();
    hasher.update(rho);
    hasher.update(&[i]);
    hasher.update(&[j]);
    hasher.finalize_xof()
}


/// Function G on page 19 (4.5): `G(s) = SHA3-512(s)`, split into two 32-byte halves.
pub(crate) fn g(bytes: &[&[u8]]) -> ([u8; 32], [u8; 32]) {
    let mut hasher = Sha3_512::new();
    bytes.iter().for_each(|b| Digest::update(&mut hasher, b));
    let digest = hasher.finalize();
    let a = digest[0..32].try_into().expect("g_a fail");
    let b = digest[32..64].try_into().expect("g_b fail");
    (a, b)
}


/// Function H on page 18 (4.4): `H(s) = SHA3-256(s)`.
#[must_use]
pub(crate) fn h(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    Digest::update(&mut hasher, bytes);
    let digest = hasher.finalize();
    digest.into()
}


/// Function J on page 18 (4.4): `J(s) = SHAKE256(s, 32)`. Used only for implicit rejection.
#[must_use]
pub(crate) fn j(z: &[u8; 32], ct: &[u8]) -> [u8; 32] {
    let mut hasher = Shake256::default();
    hasher.update(z);
    hasher.update(ct);
    let mut reader = hasher.finalize_xof();
    let mut result = [0u8; 32];
    reader.read(&mut result);
    result
}


/// Compress_d from page 21 (4.7): `x -> round(2^d/q * x) mod 2^d`, computed with integer-only
/// arithmetic via a precomputed multiplier `M` so no division or floating point is needed.
/// Works for all odd `q` from 17 to 6307; `x` must be in `[0, q)`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn compress_vector(d: u32, inout: &mut [Z]) {
    const M: u32 = (((1u64 << 36) + Q as u64 - 1) / Q as u64) as u32;
    for x_ref in &mut *inout {
        let y = (x_ref.get_u32() << d) + (u32::from(Q) >> 1);
        let result = (u64::from(y) * u64::from(M)) >> 36;
        x_ref.set_u16(result as u16);
    }
}


/// Decompress_d from page 21 (4.8): `y -> round(q/2^d * y)`, computed as the exact integer
/// expression `(y*q + 2^(d-1)) >> d` to avoid platform-dependent floating-point rounding.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn decompress_vector(d: u32, inout: &mut [Z]) {
    for y_ref in &mut *inout {
        let qy = u32::from(Q) * y_ref.get_u32() + (1 << (d - 1));
        y_ref.set_u16((qy >> d) as u16);
    }
}


#[cfg(test)]
mod tests {
    use super::{compress_vector, decompress_vector};
    use crate::types::Z;
    use crate::Q;

    #[test]
    fn test_compression_bound() {
        // |Decompress_d(Compress_d(x)) - x| <= ceil(q / 2^(d+1)) for every x in [0, q), taken
        // as the shorter of the two distances around the q-cycle.
        for d in [1u32, 4, 5, 10, 11] {
            let bound = (u32::from(Q) + (1 << (d + 1)) - 1) >> (d + 1);
            for x in 0..u32::from(Q) {
                let mut z = [Z::default()];
                z[0].set_u16(x as u16);
                compress_vector(d, &mut z);
                decompress_vector(d, &mut z);
                let y = u32::from(z[0].get_u16());
                let diff = if y > x { y - x } else { x - y };
                let wrapped = u32::from(Q) - diff;
                assert!(diff.min(wrapped) <= bound, "d={d} x={x} y={y} bound={bound}");
            }
        }
    }

    #[test]
    fn test_compress_decompress_endpoints() {
        // Zero compresses/decompresses to zero at every d.
        for d in [1u32, 4, 10, 11] {
            let mut z = [Z::default()];
            compress_vector(d, &mut z);
            assert_eq!(z[0].get_u16(), 0);
            decompress_vector(d, &mut z);
            assert_eq!(z[0].get_u16(), 0);
        }
    }
}
