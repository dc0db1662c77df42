// Alice/Bob round-trip flows across all three parameter sets, exercised through the
// public SerDes boundary the way two separate processes would actually use this crate.

use ml_kem_203::traits::{Decaps, Encaps, KeyGen, SerDes};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

macro_rules! round_trip_test {
    ($name:ident, $mod_:ident) => {
        #[test]
        #[cfg(feature = "ml-kem-512")]
        fn $name() {
            use ml_kem_203::$mod_::{CipherText, DecapsKey, EncapsKey, KG};

            let mut rng = ChaCha8Rng::seed_from_u64(0x4141_4141);

            // Alice generates a keypair and sends the (serialized) encapsulation key to Bob.
            let (ek_alice, dk_alice) = KG::try_keygen_with_rng(&mut rng).unwrap();
            let ek_wire = ek_alice.into_bytes();

            // Bob deserializes, encapsulates, and sends the (serialized) ciphertext back.
            let ek_bob = EncapsKey::try_from_bytes(ek_wire).unwrap();
            let (ssk_bob, ct_bob) = ek_bob.try_encaps_with_rng(&mut rng).unwrap();
            let ct_wire = ct_bob.into_bytes();

            // Alice deserializes the ciphertext and decapsulates to recover the same secret.
            let ct_alice = CipherText::try_from_bytes(ct_wire).unwrap();
            let ssk_alice = dk_alice.try_decaps(&ct_alice).unwrap();

            assert_eq!(ssk_alice, ssk_bob);

            // Re-serializing the decapsulation key round-trips too.
            let dk_wire = dk_alice.into_bytes();
            let dk_restored = DecapsKey::try_from_bytes(dk_wire).unwrap();
            let ssk_alice_2 = dk_restored.try_decaps(&ct_alice).unwrap();
            assert_eq!(ssk_alice_2, ssk_bob);
        }
    };
}

round_trip_test!(test_round_trip_ml_kem_512, ml_kem_512);

#[test]
#[cfg(feature = "ml-kem-768")]
fn test_round_trip_ml_kem_768() {
    use ml_kem_203::ml_kem_768::{CipherText, EncapsKey, KG};

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let (ek, dk) = KG::try_keygen_with_rng(&mut rng).unwrap();
    let ek2 = EncapsKey::try_from_bytes(ek.into_bytes()).unwrap();
    let (ssk_bob, ct) = ek2.try_encaps_with_rng(&mut rng).unwrap();
    let ct2 = CipherText::try_from_bytes(ct.into_bytes()).unwrap();
    let ssk_alice = dk.try_decaps(&ct2).unwrap();
    assert_eq!(ssk_alice, ssk_bob);
}

#[test]
#[cfg(feature = "ml-kem-1024")]
fn test_round_trip_ml_kem_1024() {
    use ml_kem_203::ml_kem_1024::{CipherText, EncapsKey, KG};

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let (ek, dk) = KG::try_keygen_with_rng(&mut rng).unwrap();
    let ek2 = EncapsKey::try_from_bytes(ek.into_bytes()).unwrap();
    let (ssk_bob, ct) = ek2.try_encaps_with_rng(&mut rng).unwrap();
    let ct2 = CipherText::try_from_bytes(ct.into_bytes()).unwrap();
    let ssk_alice = dk.try_decaps(&ct2).unwrap();
    assert_eq!(ssk_alice, ssk_bob);
}

#[test]
#[cfg(all(feature = "ml-kem-512", feature = "ml-kem-768"))]
fn test_parameter_sets_are_isolated() {
    // An ML-KEM-512 encapsulation key is the wrong length to deserialize as a
    // ML-KEM-768 key; the two parameter sets must not be cross-compatible.
    use ml_kem_203::ml_kem_512;
    use ml_kem_203::ml_kem_768;

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let (ek512, _dk512) = ml_kem_512::KG::try_keygen_with_rng(&mut rng).unwrap();
    assert_ne!(ek512.into_bytes().len(), ml_kem_768::EK_LEN);
}

#[test]
#[cfg(feature = "ml-kem-768")]
fn test_keygen_from_seed_matches_dk_ek_binding() {
    // keygen_from_seed is deterministic, and the resulting keypair must validate
    // against itself.
    use ml_kem_203::ml_kem_768::KG;

    let d = [0x11u8; 32];
    let z = [0x22u8; 32];
    let (ek1, dk1) = KG::keygen_from_seed(d, z);
    let (ek2, dk2) = KG::keygen_from_seed(d, z);
    assert_eq!(ek1.into_bytes(), ek2.into_bytes());
    assert_eq!(dk1.into_bytes(), dk2.into_bytes());
}

#[test]
#[cfg(feature = "ml-kem-512")]
fn test_encaps_from_seed_is_deterministic() {
    use ml_kem_203::ml_kem_512::{EncapsKey, KG};

    let mut rng = ChaCha8Rng::seed_from_u64(55);
    let (ek, _dk) = KG::try_keygen_with_rng(&mut rng).unwrap();
    let ek: EncapsKey = ek;
    let seed = [0x7eu8; 32];
    let (ssk1, ct1) = ek.clone().encaps_from_seed(&seed);
    let (ssk2, ct2) = ek.encaps_from_seed(&seed);
    assert_eq!(ssk1, ssk2);
    assert_eq!(ct1.into_bytes(), ct2.into_bytes());
}
