// ==========================
// tests/unit/password_tests.rs
// ==========================
//! Unit tests for credential hashing
use warden_lib::auth::CredentialHasher;
use warden_lib::config::HashSettings;
use warden_lib::store::CredentialHash;

fn hasher(memory_kib: u32) -> CredentialHasher {
    CredentialHasher::new(&HashSettings {
        memory_kib,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[test]
fn test_same_password_hashes_differently() {
    let hasher = hasher(256);
    let a = hasher.hash("correct horse").unwrap();
    let b = hasher.hash("correct horse").unwrap();

    // Fresh salt per hash
    assert_ne!(a.as_str(), b.as_str());
    assert!(hasher.verify(&a, "correct horse"));
    assert!(hasher.verify(&b, "correct horse"));
}

#[test]
fn test_hash_survives_cost_change() {
    let old = hasher(256).hash("pw").unwrap();
    // Verification reads cost from the stored hash
    assert!(hasher(512).verify(&old, "pw"));
}

#[test]
fn test_garbage_hash_never_verifies() {
    let hasher = hasher(256);
    assert!(!hasher.verify(&CredentialHash::new("not-a-phc-string"), "pw"));
    assert!(!hasher.verify(&CredentialHash::new(""), ""));
}

#[test]
fn test_unicode_and_long_passwords() {
    let hasher = hasher(256);
    let long = "p".repeat(1024);
    for password in ["pässwörd🔑", long.as_str()] {
        let hash = hasher.hash(password).unwrap();
        assert!(hasher.verify(&hash, password));
    }
}
