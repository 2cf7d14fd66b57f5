//! End-to-end custody and envelope tests across module boundaries.

use ciphercore_crypto::{
    content_hash, open, protect, seal, unlock, AccountKeyRecord, CryptoError, CryptoPolicy,
    Keypair, MessageEnvelope, GENERIC_INTEGRITY_MESSAGE,
};

fn policy() -> CryptoPolicy {
    CryptoPolicy::minimum()
}

fn account(password: &str) -> (Keypair, AccountKeyRecord) {
    let keypair = Keypair::generate(&policy()).unwrap();
    let record = protect(&keypair, password, &policy()).unwrap();
    (keypair, record)
}

#[test]
fn test_scenario_protect_then_unlock() {
    let (keypair, record) = account("Secret123!");

    let unlocked = unlock(&record, "Secret123!").unwrap();
    assert_eq!(*unlocked.to_pem().unwrap(), *keypair.private.to_pem().unwrap());

    let result = unlock(&record, "wrong");
    assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
}

#[test]
fn test_wrapped_private_key_bit_flips_rejected() {
    let (_, record) = account("Secret123!");
    let len = record.wrapped_private_key.len();

    // head, middle, last ciphertext byte, and inside the tag
    for (byte, bit) in [(0, 0), (len / 2, 3), (len - 17, 7), (len - 1, 1)] {
        let mut tampered = record.clone();
        tampered.wrapped_private_key[byte] ^= 1 << bit;
        assert!(
            matches!(
                unlock(&tampered, "Secret123!"),
                Err(CryptoError::AuthenticationFailure)
            ),
            "flip at byte {} bit {} was not detected",
            byte,
            bit
        );
    }

    for byte in [0, 6, 11] {
        let mut tampered = record.clone();
        tampered.nonce[byte] ^= 0x01;
        assert!(matches!(
            unlock(&tampered, "Secret123!"),
            Err(CryptoError::AuthenticationFailure)
        ));
    }
}

#[test]
fn test_wrong_password_and_tampering_are_indistinguishable() {
    let (_, record) = account("Secret123!");

    let wrong_password = unlock(&record, "Secret123?").unwrap_err();

    let mut tampered = record.clone();
    tampered.salt[0] ^= 0xFF;
    let tampered_salt = unlock(&tampered, "Secret123!").unwrap_err();

    assert_eq!(
        std::mem::discriminant(&wrong_password),
        std::mem::discriminant(&tampered_salt)
    );
    assert_eq!(wrong_password.to_string(), tampered_salt.to_string());
    assert_eq!(wrong_password.public_message(), GENERIC_INTEGRITY_MESSAGE);
}

#[test]
fn test_scenario_hello_between_two_accounts() {
    let (_, sender_record) = account("sender-pass");
    let (_, receiver_record) = account("receiver-pass");

    let sender_private = unlock(&sender_record, "sender-pass").unwrap();
    let envelope = seal(
        b"hello",
        &sender_private,
        &receiver_record.public_key().unwrap(),
    )
    .unwrap();

    // the envelope survives storage as JSON
    let stored = serde_json::to_string(&envelope).unwrap();
    let loaded: MessageEnvelope = serde_json::from_str(&stored).unwrap();

    let receiver_private = unlock(&receiver_record, "receiver-pass").unwrap();
    let opened = open(
        &loaded,
        &receiver_private,
        &sender_record.public_key().unwrap(),
    )
    .unwrap();

    assert_eq!(opened.plaintext, b"hello");
    assert!(opened.hash_valid);
    assert!(opened.signature_valid);
    assert_eq!(loaded.content_hash, content_hash(b"hello"));
}

#[test]
fn test_signature_rejected_for_other_sender() {
    let (alice, _) = account("alice-pass");
    let (bob, _) = account("bob-pass");
    let (carol, _) = account("carol-pass");

    let envelope = seal(b"from alice", &alice.private, &bob.public).unwrap();
    let opened = open(&envelope, &bob.private, &carol.public).unwrap();

    assert_eq!(opened.plaintext, b"from alice");
    assert!(opened.hash_valid);
    assert!(!opened.signature_valid);
}

#[test]
fn test_many_messages_roundtrip() {
    let (alice, _) = account("alice-pass");
    let (bob, _) = account("bob-pass");

    let messages: [&[u8]; 5] = [
        b"",
        b"a",
        "unicode: \u{1F512} caf\u{e9}".as_bytes(),
        &[0u8; 4096],
        b"the quick brown fox jumps over the lazy dog",
    ];

    for message in messages {
        let envelope = seal(message, &alice.private, &bob.public).unwrap();
        let opened = open(&envelope, &bob.private, &alice.public).unwrap();
        assert_eq!(opened.plaintext, message);
        assert!(opened.is_verified());
    }
}

#[test]
fn test_record_json_roundtrip_still_unlocks() {
    let (keypair, record) = account("Secret123!");

    let json = serde_json::to_string(&record).unwrap();
    let loaded: AccountKeyRecord = serde_json::from_str(&json).unwrap();

    let unlocked = unlock(&loaded, "Secret123!").unwrap();
    assert_eq!(unlocked.public_key(), keypair.public);
}
