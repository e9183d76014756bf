use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

// =============================================================
// Generation
// =============================================================

#[test]
fn generated_id_has_requested_length() {
    let mut rng = StdRng::seed_from_u64(7);
    assert_eq!(ImageId::generate(&mut rng, 6).as_str().len(), 6);
    assert_eq!(ImageId::generate(&mut rng, 12).as_str().len(), 12);
}

#[test]
fn generated_id_uses_base36_alphabet() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let id = ImageId::generate(&mut rng, 6);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()), "{id}");
    }
}

#[test]
fn generated_ids_vary() {
    let mut rng = StdRng::seed_from_u64(1);
    let a = ImageId::generate(&mut rng, 6);
    let b = ImageId::generate(&mut rng, 6);
    assert_ne!(a, b);
}

#[test]
fn generated_id_parses_back() {
    let mut rng = StdRng::seed_from_u64(3);
    let id = ImageId::generate(&mut rng, 6);
    assert_eq!(ImageId::parse(id.as_str()), Ok(id));
}

// =============================================================
// Parsing
// =============================================================

#[test]
fn parse_accepts_short_legacy_ids() {
    assert_eq!(ImageId::parse("k3").map(|id| id.to_string()), Ok("k3".to_owned()));
}

#[test]
fn parse_rejects_empty() {
    assert_eq!(ImageId::parse(""), Err(IdError::Empty));
}

#[test]
fn parse_rejects_foreign_characters() {
    assert!(matches!(ImageId::parse("ABC123"), Err(IdError::InvalidChar(_))));
    assert!(matches!(ImageId::parse("abc-12"), Err(IdError::InvalidChar(_))));
    assert!(matches!(ImageId::parse("abc 12"), Err(IdError::InvalidChar(_))));
}

#[test]
fn from_prefixed_strips_prefix() {
    let id = ImageId::from_prefixed("rhein-img-key-", "rhein-img-key-abc123");
    assert_eq!(id.map(|id| id.to_string()), Some("abc123".to_owned()));
}

#[test]
fn from_prefixed_rejects_other_keys() {
    assert_eq!(ImageId::from_prefixed("rhein-img-key-", "rhein-img-position-abc123"), None);
    assert_eq!(ImageId::from_prefixed("rhein-img-key-", "rhein-img-key-"), None);
    assert_eq!(ImageId::from_prefixed("pasted-image-", "pasted-image-a.b"), None);
}
