//! Credential verifier unit tests
//!
//! Hash/verify truth table, including the malformed-hash contract:
//! a mismatch is always `false`, never a panic or an error

mod common;

use citizen_registry::auth::password::PasswordHasher;

fn hasher() -> PasswordHasher {
    PasswordHasher::from_config(&common::create_test_config()).expect("hasher from test config")
}

#[test]
fn test_hash_and_verify_round_trip() {
    let hasher = hasher();
    let password = "TestPassword123!";

    let hash = hasher.hash(password).expect("Hashing should succeed");

    assert!(hash.contains("$argon2"));
    assert!(hasher.verify(password, &hash));
}

#[test]
fn test_wrong_password_is_a_non_match() {
    let hasher = hasher();
    let hash = hasher.hash("TestPassword123!").unwrap();

    assert!(!hasher.verify("WrongPassword123!", &hash));
}

#[test]
fn test_hash_differs_per_call_but_both_verify() {
    let hasher = hasher();
    let password = "TestPassword123!";

    let hash1 = hasher.hash(password).unwrap();
    let hash2 = hasher.hash(password).unwrap();

    // Random salt: different encodings, same acceptance
    assert_ne!(hash1, hash2);
    assert!(hasher.verify(password, &hash1));
    assert!(hasher.verify(password, &hash2));
}

#[test]
fn test_malformed_stored_hash_is_a_non_match() {
    let hasher = hasher();

    assert!(!hasher.verify("TestPassword123!", "not-a-hash-at-all"));
    assert!(!hasher.verify("TestPassword123!", "$argon2id$v=19$truncated"));
    assert!(!hasher.verify("TestPassword123!", "$2b$10$bcrypt-style-hash-here"));
    assert!(!hasher.verify("TestPassword123!", ""));
}

#[test]
fn test_mutated_hash_never_verifies() {
    let hasher = hasher();
    let password = "TestPassword123!";
    let hash = hasher.hash(password).unwrap();

    // Mutate one character at a few positions spread over the encoded
    // string; every mutation must be a clean non-match
    let bytes = hash.as_bytes();
    for position in [hash.len() - 1, hash.len() - 5, hash.len() / 2] {
        let mut mutated = hash.clone().into_bytes();
        mutated[position] = if bytes[position] == b'A' { b'B' } else { b'A' };
        let mutated = String::from_utf8(mutated).unwrap();

        assert!(
            !hasher.verify(password, &mutated),
            "mutation at {} should not verify",
            position
        );
    }
}

#[test]
fn test_empty_inputs_are_non_matches() {
    let hasher = hasher();
    let hash = hasher.hash("TestPassword123!").unwrap();

    assert!(!hasher.verify("", &hash));
    assert!(!hasher.verify("", ""));
}

#[test]
fn test_unicode_passwords() {
    let hasher = hasher();
    let password = "πολίτης-Test123!🔒";

    let hash = hasher.hash(password).unwrap();

    assert!(hasher.verify(password, &hash));
    assert!(!hasher.verify("πολίτης-Test123!", &hash));
}

#[test]
fn test_default_parameters_also_round_trip() {
    // The OWASP-default hasher is slower; one round trip is enough
    let hasher = PasswordHasher::new();
    let hash = hasher.hash("TestPassword123!").unwrap();

    assert!(hasher.verify("TestPassword123!", &hash));
}
