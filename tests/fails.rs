// Negative-path coverage: malformed byte arrays, tampered ciphertexts, and bit-flipped
// keys must be rejected (or, for ciphertexts, silently produce a rejected shared secret
// rather than leaking which branch was taken).

use ml_kem_203::traits::{Decaps, Encaps, KeyGen, SerDes};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

#[test]
#[cfg(feature = "ml-kem-512")]
fn test_encaps_key_with_bad_modulus_is_rejected() {
    use ml_kem_203::ml_kem_512::EncapsKey;

    // All-0xFF bytes decode each 12-bit field to 4095, which is >= q (3329), so the
    // modulus check required when ingesting an external encapsulation key must fail.
    let bad_ek = [0xFFu8; ml_kem_203::ml_kem_512::EK_LEN];
    assert!(EncapsKey::try_from_bytes(bad_ek).is_err());
}

#[test]
#[cfg(feature = "ml-kem-768")]
fn test_tampered_ciphertext_implicitly_rejects() {
    use ml_kem_203::ml_kem_768::{CipherText, KG};

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (ek, dk) = KG::try_keygen_with_rng(&mut rng).unwrap();
    let (ssk_honest, ct) = ek.try_encaps_with_rng(&mut rng).unwrap();

    let mut ct_bytes = ct.into_bytes();
    ct_bytes[0] ^= 0x01;
    let tampered_ct = CipherText::try_from_bytes(ct_bytes).unwrap();

    // Decapsulation of a tampered ciphertext must still return Ok with a deterministic,
    // but different, shared secret -- never an error, and never the honest secret.
    let ssk_rejected = dk.try_decaps(&tampered_ct).unwrap();
    assert_ne!(ssk_rejected, ssk_honest);
}

#[test]
#[cfg(feature = "ml-kem-1024")]
fn test_wrong_party_cannot_recover_shared_secret() {
    use ml_kem_203::ml_kem_1024::{CipherText, EncapsKey, KG};

    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let (ek_alice, _dk_alice) = KG::try_keygen_with_rng(&mut rng).unwrap();
    let (_ek_mallory, dk_mallory) = KG::try_keygen_with_rng(&mut rng).unwrap();

    let ek_alice = EncapsKey::try_from_bytes(ek_alice.into_bytes()).unwrap();
    let (ssk_bob, ct) = ek_alice.try_encaps_with_rng(&mut rng).unwrap();
    let ct = CipherText::try_from_bytes(ct.into_bytes()).unwrap();

    // Decapsulating with the wrong decapsulation key must not error, but must not
    // recover Bob's actual shared secret either (implicit rejection, not a panic).
    let ssk_mallory = dk_mallory.try_decaps(&ct).unwrap();
    assert_ne!(ssk_mallory, ssk_bob);
}

#[test]
#[cfg(feature = "ml-kem-512")]
fn test_ciphertext_wrong_length_is_rejected_at_type_level() {
    // CipherText::try_from_bytes takes a fixed-size array, so a short/long byte string
    // simply fails to typecheck as input; the length invariant is enforced by the type
    // system rather than a runtime check. This test documents that by using the correct
    // fixed-size array and confirming decode succeeds only for a syntactically valid one.
    use ml_kem_203::ml_kem_512::CipherText;

    let ct_bytes = [0u8; ml_kem_203::ml_kem_512::CT_LEN];
    assert!(CipherText::try_from_bytes(ct_bytes).is_ok());
}

#[test]
#[cfg(all(feature = "ml-kem-512", feature = "default-rng"))]
fn test_validate_keypair_rejects_mismatched_keys() {
    use ml_kem_203::ml_kem_512::KG;

    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let (ek1, _dk1) = KG::try_keygen_with_rng(&mut rng).unwrap();
    let (_ek2, dk2) = KG::try_keygen_with_rng(&mut rng).unwrap();

    assert!(!KG::validate_keypair_with_rng_vartime(
        &mut rng,
        &ek1.into_bytes(),
        &dk2.into_bytes(),
    ));
}
