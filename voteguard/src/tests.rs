use super::*;
use crate::authn::TEST_HASH_COST;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

#[test]
fn end_to_end_election() {
    // The tallying authority generates a keypair and exports it into
    // configuration form, then the polling station loads it back - the same
    // path a deployment takes through the environment.
    let authority = KeyStore::generate(512).unwrap();
    let (encoded_public, encoded_private) = authority.export();
    let keystore = KeyStore::load(&encoded_public, &encoded_private).unwrap();

    let station = PollingStation::new(keystore, MemLedger::new()).with_hash_cost(TEST_HASH_COST);

    // Three candidates, five voters, distribution 2/2/1.
    let election_id = 42;
    let votes: &[CandidateId] = &[1, 1, 2, 2, 3];

    for candidate_id in votes {
        // Registration hands out the two shares; each custodian presents
        // theirs at login and the credential only ever exists in memory.
        let registration = station.register_voter().unwrap();
        let voter = station
            .login(&registration.voter_share, &registration.station_share)
            .unwrap();

        station
            .cast_vote(
                &voter,
                Ballot {
                    election_id,
                    candidate_id: *candidate_id,
                    party_id: 100 + candidate_id,
                },
            )
            .unwrap();
    }

    let results = station.decrypt_results(election_id).unwrap();
    assert_eq!(results[&1], 2);
    assert_eq!(results[&2], 2);
    assert_eq!(results[&3], 1);
    assert_eq!(total_votes(&results), 5);

    // Decryption is a read: the encrypted tally is still on the ledger and
    // decrypts to the same counts again.
    let again = station.decrypt_results(election_id).unwrap();
    assert_eq!(again, results);
}

#[test]
fn homomorphic_sum_matches_vote_count() {
    let keypair = generate_keypair(256).unwrap();

    // encrypt(0) folded with n applications of encrypt(1) decrypts to
    // exactly n, for every n up to 50.
    let mut accumulated = encrypt_zero(&keypair.public);
    for n in 0u64..=50 {
        let decrypted = decrypt(&keypair.private, &accumulated).unwrap();
        assert_eq!(decrypted, BigUint::from(n));

        accumulated = add(&keypair.public, &accumulated, &encrypt_one(&keypair.public)).unwrap();
    }

    let final_count = decrypt(&keypair.private, &accumulated).unwrap();
    assert_eq!(final_count.to_u64(), Some(51));
}
