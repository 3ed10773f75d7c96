//! Deterministic pseudo store paths.
//!
//! Without a real store daemon behind us, recipe and output paths are
//! derived from a content fingerprint: the first 20 bytes of a SHA-256
//! digest, rendered in the store's base32 variant. Paths are stable
//! across runs for identical inputs, which is what GC-root
//! registration and constituent matching need.

use sha2::{Digest, Sha256};

/// The store's digits: lowercase alphanumerics without e, o, u and t.
const ALPHABET: &[u8; 32] = b"0123456789abcdfghijklmnpqrsvwxyz";

const STORE_DIR: &str = "/nix/store";
const DIGEST_LEN: usize = 20;

/// Encodes bytes in the store's base32 variant: bits are consumed from
/// the end of the input, and there is no padding.
fn nixbase32(input: &[u8]) -> String {
    let output_len = (input.len() * 8 + 4) / 5;
    let mut output = String::with_capacity(output_len);

    for n in (0..output_len).rev() {
        let b = n * 5;
        let i = b / 8;
        let j = b % 8;

        let mut c = input[i] >> j;
        if i + 1 < input.len() {
            c |= input[i + 1].checked_shl(8 - j as u32).unwrap_or(0);
        }
        output.push(ALPHABET[(c & 0x1f) as usize] as char);
    }

    output
}

fn hash_part(fingerprint: &str) -> String {
    let digest = Sha256::digest(fingerprint.as_bytes());
    nixbase32(&digest[..DIGEST_LEN])
}

/// The recipe path for a derivation with the given fingerprint.
pub fn drv_path(name: &str, fingerprint: &str) -> String {
    format!("{STORE_DIR}/{}-{name}.drv", hash_part(fingerprint))
}

/// The store path of one output. The default output keeps the bare
/// name; the others are suffixed with the output name.
pub fn output_path(name: &str, output: &str, fingerprint: &str) -> String {
    let hash = hash_part(&format!("{fingerprint}!{output}"));
    if output == "out" {
        format!("{STORE_DIR}/{hash}-{name}")
    } else {
        format!("{STORE_DIR}/{hash}-{name}-{output}")
    }
}
