use crate::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub type ElectionId = u32;
pub type PartyId = u32;

// Ledger key layout. The access-key registry is a single append-only key;
// tallies and vote records are latest-value keys.
const ACCESS_KEY_REGISTRY: &str = "voter-access-keys";

fn tally_key(election: ElectionId) -> String {
    format!("encrypted-tally-{}", election)
}

fn vote_record_key(credential_hash: &str) -> String {
    format!("vote-record-{}", credential_hash)
}

/// The two shares handed out at registration. Each goes to a different
/// physical custodian; the plaintext credential is dropped before this
/// struct is returned.
#[derive(Debug, Clone)]
pub struct VoterRegistration {
    pub voter_share: SecretShare,
    pub station_share: SecretShare,
}

/// Proof of a successful login. Holds only the matched credential hash;
/// the reconstructed credential itself is discarded.
#[derive(Debug, Clone)]
pub struct AuthenticatedVoter {
    credential_hash: String,
}

impl AuthenticatedVoter {
    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }
}

/// A voter's selection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Ballot {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    pub party_id: PartyId,
}

/// Record of a cast vote, keyed on the ledger by the credential hash.
/// Existence of the record is the double-vote check; it carries no voter PII.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VoteRecord {
    pub voter_credential_hash: String,
    pub candidate_id: CandidateId,
    pub election_id: ElectionId,
    pub party_id: PartyId,
    pub voted_at: DateTime<Utc>,
    pub has_voted: bool,
}

/// Runs the registration, login, vote-cast and tally protocol against a
/// ledger.
///
/// The keypair is read-only after construction and shared freely. The
/// encrypted tally is the only mutable shared resource: its read-modify-write
/// is serialized per election, so votes for different elections proceed in
/// parallel. The double-vote check-then-act is serialized by the registry
/// lock.
pub struct PollingStation<L: Ledger> {
    keystore: KeyStore,
    ledger: L,
    hash_cost: u32,
    election_locks: Mutex<HashMap<ElectionId, Arc<Mutex<()>>>>,
    registry_lock: Mutex<()>,
}

impl<L: Ledger> PollingStation<L> {
    pub fn new(keystore: KeyStore, ledger: L) -> Self {
        PollingStation {
            keystore,
            ledger,
            hash_cost: DEFAULT_HASH_COST,
            election_locks: Mutex::new(HashMap::new()),
            registry_lock: Mutex::new(()),
        }
    }

    /// Override the bcrypt work factor (mainly for tests).
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Register a new voter: generate a credential, persist only its hash,
    /// and split the credential 2-of-2 into a voter share and a
    /// polling-station share.
    pub fn register_voter(&self) -> Result<VoterRegistration, Error> {
        let _registry = self.registry_lock.lock().unwrap();

        let stored_hashes = self.ledger.fetch(ACCESS_KEY_REGISTRY, true)?;

        // Re-draw on a credential that already authenticates against the
        // registry. With 128 random bytes this never loops in practice.
        let credential = loop {
            let candidate = generate_credential(CREDENTIAL_BYTES);
            if authenticate(&candidate, &stored_hashes).is_err() {
                break candidate;
            }
        };

        let credential_hash = register_credential(&credential, self.hash_cost)?;
        self.ledger
            .put(ACCESS_KEY_REGISTRY, credential_hash.clone())?;

        let mut shares = split_credential(&credential, SHARE_COUNT, SHARE_THRESHOLD)?;
        let station_share = shares.pop().expect("dealer produced two shares");
        let voter_share = shares.pop().expect("dealer produced two shares");

        log::info!("registered voter; registry now holds {} credentials", stored_hashes.len() + 1);

        Ok(VoterRegistration {
            voter_share,
            station_share,
        })
    }

    /// Reconstruct the credential from both shares and authenticate it
    /// against the hashed registry. The credential only exists in memory for
    /// the duration of this call.
    pub fn login(
        &self,
        voter_share: &SecretShare,
        station_share: &SecretShare,
    ) -> Result<AuthenticatedVoter, Error> {
        let shares = [voter_share.clone(), station_share.clone()];
        let credential = combine_shares(SHARE_THRESHOLD, &shares)?;

        let stored_hashes = self.ledger.fetch(ACCESS_KEY_REGISTRY, true)?;
        let matched = authenticate(&credential, &stored_hashes)?;

        Ok(AuthenticatedVoter {
            credential_hash: matched.to_string(),
        })
    }

    /// Has this credential already been used to vote?
    pub fn has_voted(&self, credential_hash: &str) -> Result<bool, Error> {
        let records = self
            .ledger
            .fetch(&vote_record_key(credential_hash), false)?;
        Ok(!records.is_empty())
    }

    /// Cast one vote: check the voter has not voted, homomorphically add one
    /// unit to the chosen candidate's encrypted total, and commit the updated
    /// tally together with the vote record in a single store call.
    pub fn cast_vote(&self, voter: &AuthenticatedVoter, ballot: Ballot) -> Result<(), Error> {
        let election_lock = self.election_lock(ballot.election_id);
        let _election = election_lock.lock().unwrap();
        let _registry = self.registry_lock.lock().unwrap();

        if self.has_voted(&voter.credential_hash)? {
            return Err(Error::DuplicateVote);
        }

        let mut tally = self
            .fetch_tally(ballot.election_id)?
            .unwrap_or_else(EncryptedTally::new);
        tally.cast_vote(self.keystore.public_key(), ballot.candidate_id)?;

        let record = VoteRecord {
            voter_credential_hash: voter.credential_hash.clone(),
            candidate_id: ballot.candidate_id,
            election_id: ballot.election_id,
            party_id: ballot.party_id,
            voted_at: Utc::now(),
            has_voted: true,
        };

        self.ledger.put_many(vec![
            (tally_key(ballot.election_id), serde_json::to_string(&tally)?),
            (
                vote_record_key(&voter.credential_hash),
                serde_json::to_string(&record)?,
            ),
        ])?;

        log::debug!(
            "vote recorded for election {} candidate {}",
            ballot.election_id,
            ballot.candidate_id
        );
        Ok(())
    }

    /// Decrypt the stored per-candidate totals for reporting. Read-only: the
    /// encrypted tally on the ledger is left untouched.
    pub fn decrypt_results(
        &self,
        election_id: ElectionId,
    ) -> Result<IndexMap<CandidateId, u64>, Error> {
        let tally = self.fetch_tally(election_id)?.ok_or_else(|| {
            Error::InvalidTallyState(format!(
                "no encrypted tally recorded for election {}",
                election_id
            ))
        })?;

        tally.decrypt(self.keystore.private_key())
    }

    fn fetch_tally(&self, election_id: ElectionId) -> Result<Option<EncryptedTally>, Error> {
        let records = self.ledger.fetch(&tally_key(election_id), false)?;
        let latest = match records.into_iter().last() {
            Some(record) => record,
            None => return Ok(None),
        };

        let tally = serde_json::from_str(&latest).map_err(|e| {
            Error::InvalidTallyState(format!("stored encrypted tally is malformed: {}", e))
        })?;
        Ok(Some(tally))
    }

    fn election_lock(&self, election_id: ElectionId) -> Arc<Mutex<()>> {
        let mut locks = self.election_locks.lock().unwrap();
        locks.entry(election_id).or_default().clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::authn::TEST_HASH_COST;
    use std::thread;

    fn test_station() -> PollingStation<MemLedger> {
        let keystore = KeyStore::generate(256).unwrap();
        PollingStation::new(keystore, MemLedger::new()).with_hash_cost(TEST_HASH_COST)
    }

    fn ballot(candidate_id: CandidateId) -> Ballot {
        Ballot {
            election_id: 1,
            candidate_id,
            party_id: 10,
        }
    }

    #[test]
    fn register_login_cast() {
        let station = test_station();

        let registration = station.register_voter().unwrap();
        let voter = station
            .login(&registration.voter_share, &registration.station_share)
            .unwrap();

        station.cast_vote(&voter, ballot(3)).unwrap();

        let results = station.decrypt_results(1).unwrap();
        assert_eq!(results[&3], 1);
        assert_eq!(total_votes(&results), 1);
    }

    #[test]
    fn double_vote_is_rejected_and_tally_unchanged() {
        let station = test_station();

        let registration = station.register_voter().unwrap();
        let voter = station
            .login(&registration.voter_share, &registration.station_share)
            .unwrap();

        station.cast_vote(&voter, ballot(3)).unwrap();

        // A fresh login with the same shares still maps to the same
        // credential hash, so the second cast must be rejected before any
        // homomorphic update.
        let again = station
            .login(&registration.voter_share, &registration.station_share)
            .unwrap();
        assert!(matches!(
            station.cast_vote(&again, ballot(5)),
            Err(Error::DuplicateVote)
        ));

        let results = station.decrypt_results(1).unwrap();
        assert_eq!(results[&3], 1);
        assert_eq!(results.get(&5), None);
        assert_eq!(total_votes(&results), 1);
    }

    #[test]
    fn login_requires_two_distinct_shares() {
        let station = test_station();
        let registration = station.register_voter().unwrap();

        assert!(matches!(
            station.login(&registration.voter_share, &registration.voter_share),
            Err(Error::Reconstruction(_))
        ));
    }

    #[test]
    fn login_with_foreign_shares_fails_authentication() {
        let station = test_station();
        let registration = station.register_voter().unwrap();
        let other = station.register_voter().unwrap();

        // Mixing custodians' shares reconstructs garbage, which then fails
        // the hash match.
        let result = station.login(&registration.voter_share, &other.station_share);
        assert!(matches!(
            result,
            Err(Error::AuthenticationFailed) | Err(Error::Reconstruction(_))
        ));
    }

    #[test]
    fn results_require_a_recorded_tally() {
        let station = test_station();
        assert!(matches!(
            station.decrypt_results(99),
            Err(Error::InvalidTallyState(_))
        ));
    }

    #[test]
    fn tampered_ledger_tally_is_detected() {
        let station = test_station();
        let registration = station.register_voter().unwrap();
        let voter = station
            .login(&registration.voter_share, &registration.station_share)
            .unwrap();
        station.cast_vote(&voter, ballot(1)).unwrap();

        station
            .ledger()
            .put(&tally_key(1), "not a tally".to_string())
            .unwrap();
        assert!(matches!(
            station.decrypt_results(1),
            Err(Error::InvalidTallyState(_))
        ));
    }

    #[test]
    fn concurrent_votes_are_not_lost() {
        let station = Arc::new(test_station());

        let mut voters = Vec::new();
        for i in 0..4u32 {
            let registration = station.register_voter().unwrap();
            let voter = station
                .login(&registration.voter_share, &registration.station_share)
                .unwrap();
            voters.push((voter, (i % 2) + 1));
        }

        let mut handles = Vec::new();
        for (voter, candidate) in voters {
            let station = Arc::clone(&station);
            handles.push(thread::spawn(move || {
                station.cast_vote(&voter, ballot(candidate)).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let results = station.decrypt_results(1).unwrap();
        assert_eq!(results[&1], 2);
        assert_eq!(results[&2], 2);
        assert_eq!(total_votes(&results), 4);
    }

    #[test]
    fn elections_are_tallied_independently() {
        let station = test_station();

        let first = station.register_voter().unwrap();
        let voter = station
            .login(&first.voter_share, &first.station_share)
            .unwrap();
        station
            .cast_vote(
                &voter,
                Ballot {
                    election_id: 1,
                    candidate_id: 7,
                    party_id: 10,
                },
            )
            .unwrap();

        // Same credential, different election: still a duplicate. The vote
        // record is keyed by credential hash across the whole system.
        assert!(matches!(
            station.cast_vote(
                &voter,
                Ballot {
                    election_id: 2,
                    candidate_id: 8,
                    party_id: 10,
                },
            ),
            Err(Error::DuplicateVote)
        ));

        let second = station.register_voter().unwrap();
        let other_voter = station
            .login(&second.voter_share, &second.station_share)
            .unwrap();
        station
            .cast_vote(
                &other_voter,
                Ballot {
                    election_id: 2,
                    candidate_id: 8,
                    party_id: 10,
                },
            )
            .unwrap();

        let results_one = station.decrypt_results(1).unwrap();
        let results_two = station.decrypt_results(2).unwrap();
        assert_eq!(results_one[&7], 1);
        assert_eq!(results_one.get(&8), None);
        assert_eq!(results_two[&8], 1);
    }
}
