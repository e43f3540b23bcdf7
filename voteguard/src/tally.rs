use crate::*;
use indexmap::IndexMap;
use num_traits::ToPrimitive;

/// Candidate identifier, unique per election.
pub type CandidateId = u32;

/// Per-candidate encrypted vote totals.
///
/// Every entry holds a running Paillier ciphertext; individual ballots are
/// never stored or decrypted, only the aggregate. Decryption is a read
/// operation for reporting and leaves the encrypted state untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedTally {
    counts: IndexMap<CandidateId, Ciphertext>,
}

impl EncryptedTally {
    pub fn new() -> Self {
        EncryptedTally::default()
    }

    /// Fresh tally with every listed candidate bootstrapped to encrypt(0).
    pub fn bootstrap(public: &PublicKey, candidates: &[CandidateId]) -> Self {
        let mut counts = IndexMap::with_capacity(candidates.len());
        for candidate in candidates {
            counts.insert(*candidate, encrypt_zero(public));
        }
        EncryptedTally { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn candidates(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.counts.keys().copied()
    }

    pub fn get(&self, candidate: CandidateId) -> Option<&Ciphertext> {
        self.counts.get(&candidate)
    }

    /// Homomorphically add exactly one vote to exactly one candidate.
    ///
    /// An absent candidate entry is bootstrapped with encrypt(0) first; all
    /// other entries pass through untouched. A malformed pre-existing entry
    /// is fatal: treating it as zero could mask tampering or a lost vote.
    pub fn cast_vote(&mut self, public: &PublicKey, candidate: CandidateId) -> Result<(), Error> {
        let current = match self.counts.get(&candidate) {
            Some(existing) => {
                if !existing.is_canonical(public) {
                    return Err(Error::InvalidTallyState(format!(
                        "stored ciphertext for candidate {} is not in canonical form",
                        candidate
                    )));
                }
                existing.clone()
            }
            None => encrypt_zero(public),
        };

        let updated = add(public, &current, &encrypt_one(public))?;
        self.counts.insert(candidate, updated);
        Ok(())
    }

    /// Decrypt every candidate's total independently.
    pub fn decrypt(&self, private: &PrivateKey) -> Result<IndexMap<CandidateId, u64>, Error> {
        let mut results = IndexMap::with_capacity(self.counts.len());
        for (candidate, ciphertext) in &self.counts {
            let plaintext = decrypt(private, ciphertext)?;
            let count = plaintext.to_u64().ok_or_else(|| {
                Error::InvalidTallyState(format!(
                    "decrypted count for candidate {} exceeds u64",
                    candidate
                ))
            })?;
            results.insert(*candidate, count);
        }
        Ok(results)
    }
}

/// Sum of all decrypted per-candidate counts.
pub fn total_votes(results: &IndexMap<CandidateId, u64>) -> u64 {
    results.values().sum()
}
