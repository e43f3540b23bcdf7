use crate::*;
use sha2::{Digest, Sha256};

/// Default bcrypt work factor for stored credential hashes.
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

// bcrypt only considers the first 72 input bytes, so the 128-byte credential
// is first folded through SHA-256; the hex digest keeps every credential bit
// significant and stays safely under the limit.
fn fingerprint(credential: &Credential) -> String {
    hex::encode(Sha256::digest(credential.as_bytes()))
}

/// Hash a credential for persistence. The salted bcrypt hash is all that is
/// ever stored; the plaintext credential is not retained after this returns.
pub fn register_credential(credential: &Credential, cost: u32) -> Result<String, Error> {
    let hashed = bcrypt::hash(fingerprint(credential), cost)?;
    Ok(hashed)
}

/// Match a reconstructed credential against the stored hashes.
///
/// Every stored hash is verified (bcrypt's comparison is constant-time per
/// hash, and the scan does not stop at the first hit), then the first match
/// is returned. No match is the expected negative outcome
/// `AuthenticationFailed`, not an infrastructure error.
pub fn authenticate<'a, S: AsRef<str>>(
    credential: &Credential,
    stored_hashes: &'a [S],
) -> Result<&'a str, Error> {
    let candidate = fingerprint(credential);

    let mut matched: Option<&'a str> = None;
    for stored in stored_hashes {
        let verified = bcrypt::verify(&candidate, stored.as_ref()).unwrap_or(false);
        if verified && matched.is_none() {
            matched = Some(stored.as_ref());
        }
    }

    matched.ok_or(Error::AuthenticationFailed)
}

#[cfg(test)]
pub(crate) const TEST_HASH_COST: u32 = 4;
