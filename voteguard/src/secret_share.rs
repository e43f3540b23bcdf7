use crate::*;
use rand::RngCore;
use sharks::{Share, Sharks};
use std::collections::HashSet;
use std::convert::TryFrom;

/// Default credential length in bytes.
pub const CREDENTIAL_BYTES: usize = 128;

/// Shares per credential: one for the voter, one for the polling station.
pub const SHARE_COUNT: u8 = 2;
/// Both shares are required; a single share reveals nothing.
pub const SHARE_THRESHOLD: u8 = 2;

/// A voter's anonymous access credential.
///
/// Generated once at registration, reconstructed transiently at login, and
/// never persisted in plaintext anywhere; only its one-way hash is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Vec<u8>);

impl Credential {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Credential {
    fn from(bytes: Vec<u8>) -> Self {
        Credential(bytes)
    }
}

// Debug deliberately does not print the credential bytes.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Credential({} bytes)", self.0.len())
    }
}

/// One share of a split credential. Opaque bytes; the first byte is the
/// share's x-coordinate in the underlying Shamir scheme.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretShare(#[serde(with = "hex_serde")] Vec<u8>);

impl SecretShare {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        SecretShare(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|_| Error::Reconstruction("share is not valid hex"))?;
        Ok(SecretShare(bytes))
    }
}

/// Generate a cryptographically secure random credential.
pub fn generate_credential(byte_length: usize) -> Credential {
    let mut bytes = vec![0u8; byte_length];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Credential(bytes)
}

/// Split a credential into `total` Shamir shares, any `threshold` of which
/// reconstruct it exactly while fewer reveal nothing.
pub fn split_credential(
    credential: &Credential,
    total: u8,
    threshold: u8,
) -> Result<Vec<SecretShare>, Error> {
    if threshold < 1 || total < 1 || threshold > total {
        return Err(Error::InvalidParameters { threshold, total });
    }

    let sharks = Sharks(threshold);
    let dealer = sharks.dealer(credential.as_bytes());

    Ok(dealer
        .take(total as usize)
        .map(|share| SecretShare(Vec::from(&share)))
        .collect())
}

/// Reconstruct a credential from at least `threshold` distinct shares.
///
/// The same share presented twice must not satisfy the threshold: shares are
/// deduplicated by x-coordinate before interpolation, so a lone share can
/// never pass itself off as a quorum.
pub fn combine_shares(threshold: u8, shares: &[SecretShare]) -> Result<Credential, Error> {
    if shares.len() < threshold as usize {
        return Err(Error::Reconstruction("not enough shares"));
    }

    let mut x_coordinates = HashSet::new();
    let mut share_length = None;
    for share in shares {
        if share.0.len() < 2 {
            return Err(Error::Reconstruction("share is truncated"));
        }
        if *share_length.get_or_insert(share.0.len()) != share.0.len() {
            return Err(Error::Reconstruction("shares have mismatched lengths"));
        }
        if !x_coordinates.insert(share.0[0]) {
            return Err(Error::Reconstruction("the same share was presented twice"));
        }
    }
    if x_coordinates.len() < threshold as usize {
        return Err(Error::Reconstruction("not enough distinct shares"));
    }

    let parsed: Vec<Share> = shares
        .iter()
        .map(|share| Share::try_from(share.0.as_slice()))
        .collect::<Result<_, _>>()
        .map_err(|_| Error::Reconstruction("share is corrupted"))?;

    let secret = Sharks(threshold)
        .recover(&parsed)
        .map_err(|_| Error::Reconstruction("shares are mutually inconsistent"))?;

    Ok(Credential(secret))
}
