//! Stable lead identity derived from record content.
//!
//! Two records with identical company+title+location collide by design;
//! this is coarse-grained identity for dedup, not a uniqueness proof.

use sha2::{Digest, Sha256};

/// Trim and case-fold a field for identity purposes.
pub fn normalize_field(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 128-bit content-addressed identifier over normalized
/// company + title + location, hex encoded.
pub fn lead_id(company: &str, title: &str, location: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_field(company).as_bytes());
    hasher.update(b"\x1f");
    hasher.update(normalize_field(title).as_bytes());
    hasher.update(b"\x1f");
    hasher.update(normalize_field(location).as_bytes());
    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}
