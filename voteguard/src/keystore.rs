use crate::*;
use base64ct::{Base64, Encoding};
use num_bigint::BigUint;

/// Environment variable carrying the encoded public key.
pub const PUBLIC_KEY_ENV: &str = "PAILLIER_PUBLIC_KEY";
/// Environment variable carrying the encoded private key.
pub const PRIVATE_KEY_ENV: &str = "PAILLIER_PRIVATE_KEY";

/// Owns the tallying authority's homomorphic keypair.
///
/// Key material enters the process exactly once, through this type; the
/// private key is only reachable through the `private_key` accessor used at
/// decryption time. Keys are transported as base64 over JSON records whose
/// big-integer fields are decimal strings.
pub struct KeyStore {
    keypair: Keypair,
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRecord {
    n: String,
    g: String,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyRecord {
    lambda: String,
    mu: String,
    public_key: PublicKeyRecord,
}

impl KeyStore {
    /// Generate a fresh keypair of the given modulus strength.
    pub fn generate(bit_length: u64) -> Result<Self, Error> {
        let keypair = generate_keypair(bit_length)?;
        Ok(KeyStore { keypair })
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        KeyStore { keypair }
    }

    /// Decode a previously exported keypair.
    pub fn load(encoded_public: &str, encoded_private: &str) -> Result<Self, Error> {
        let public_record: PublicKeyRecord = decode_record(encoded_public)?;
        let private_record: PrivateKeyRecord = decode_record(encoded_private)?;

        let n = parse_decimal(&public_record.n, "n")?;
        let g = parse_decimal(&public_record.g, "g")?;
        let lambda = parse_decimal(&private_record.lambda, "lambda")?;
        let mu = parse_decimal(&private_record.mu, "mu")?;
        let private_n = parse_decimal(&private_record.public_key.n, "private n")?;

        if private_n != n {
            return Err(Error::KeyLoad(
                "private key modulus does not match public key".to_string(),
            ));
        }

        let public = PublicKey { n: n.clone(), g };
        let private = PrivateKey { lambda, mu, n };

        Ok(KeyStore {
            keypair: Keypair { public, private },
        })
    }

    /// Load the keypair from the two well-known environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let encoded_public = std::env::var(PUBLIC_KEY_ENV)
            .map_err(|_| Error::MissingKeyConfiguration(PUBLIC_KEY_ENV))?;
        let encoded_private = std::env::var(PRIVATE_KEY_ENV)
            .map_err(|_| Error::MissingKeyConfiguration(PRIVATE_KEY_ENV))?;

        KeyStore::load(&encoded_public, &encoded_private)
    }

    /// Serialize the keypair into two transport-safe ASCII strings,
    /// suitable for environment configuration. Round-trips exactly through
    /// `load`.
    pub fn export(&self) -> (String, String) {
        let public_record = PublicKeyRecord {
            n: self.keypair.public.n.to_str_radix(10),
            g: self.keypair.public.g.to_str_radix(10),
        };
        let private_record = PrivateKeyRecord {
            lambda: self.keypair.private.lambda.to_str_radix(10),
            mu: self.keypair.private.mu.to_str_radix(10),
            public_key: PublicKeyRecord {
                n: self.keypair.public.n.to_str_radix(10),
                g: self.keypair.public.g.to_str_radix(10),
            },
        };

        // Serializing our own records cannot fail.
        let public_json = serde_json::to_vec(&public_record).expect("serialize public key record");
        let private_json =
            serde_json::to_vec(&private_record).expect("serialize private key record");

        (
            Base64::encode_string(&public_json),
            Base64::encode_string(&private_json),
        )
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.keypair.private
    }
}

fn decode_record<T: serde::de::DeserializeOwned>(encoded: &str) -> Result<T, Error> {
    let bytes = Base64::decode_vec(encoded.trim())
        .map_err(|e| Error::KeyLoad(format!("invalid base64: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::KeyLoad(format!("invalid key record: {}", e)))
}

fn parse_decimal(s: &str, field: &str) -> Result<BigUint, Error> {
    s.parse::<BigUint>()
        .map_err(|_| Error::KeyLoad(format!("field {} is not a decimal integer", field)))
}
