use crate::*;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_prime::nt_funcs::is_prime;
use num_traits::{One, Zero};

/// Production modulus strength in bits.
pub const DEFAULT_KEY_BITS: u64 = 2048;

// Candidate limit for a single prime search. Well above the expected
// number of odd candidates for any supported bit length.
const MAX_PRIME_ATTEMPTS: usize = 16384;

/// Paillier public key: the modulus `n` and generator `g = n + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub g: BigUint,
}

/// Paillier private key. `lambda = lcm(p-1, q-1)`, `mu = L(g^lambda mod n^2)^-1 mod n`.
///
/// Carries its own copy of the modulus so a loaded private key can be checked
/// against the public key it claims to pair with.
#[derive(Debug, Clone)]
pub struct PrivateKey {
    pub(crate) lambda: BigUint,
    pub(crate) mu: BigUint,
    pub(crate) n: BigUint,
}

#[derive(Debug, Clone)]
pub struct Keypair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

/// An encrypted value, always kept reduced mod n².
///
/// The only operation supported on ciphertexts is homomorphic addition;
/// everything else happens on decrypted plaintexts. Serializes as a decimal
/// string so it can cross the ledger boundary unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(#[serde(with = "crate::serde_decimal")] pub(crate) BigUint);

impl Ciphertext {
    /// A ciphertext is canonical when it is nonzero and reduced mod n².
    /// Anything else indicates tampering or a mismatched key and is never
    /// silently treated as an encryption of zero.
    pub fn is_canonical(&self, public: &PublicKey) -> bool {
        !self.0.is_zero() && self.0 < public.n_squared()
    }

    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }
}

impl PublicKey {
    pub(crate) fn n_squared(&self) -> BigUint {
        &self.n * &self.n
    }
}

impl PrivateKey {
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }
}

/// Generate a fresh Paillier keypair with a modulus of `bit_length` bits.
pub fn generate_keypair(bit_length: u64) -> Result<Keypair, Error> {
    let prime_bits = bit_length / 2;
    let p = generate_prime(prime_bits)?;

    // The two primes must differ or lambda degenerates.
    let mut q = generate_prime(prime_bits)?;
    let mut retries = 0;
    while q == p {
        if retries >= 8 {
            return Err(Error::KeyGeneration("could not find two distinct primes"));
        }
        q = generate_prime(prime_bits)?;
        retries += 1;
    }

    let one = BigUint::one();
    let n = &p * &q;
    let n_squared = &n * &n;
    let g = &n + &one;

    let lambda = (&p - &one).lcm(&(&q - &one));

    // mu = L(g^lambda mod n^2)^-1 mod n, with L(u) = (u - 1) / n
    let u = g.modpow(&lambda, &n_squared);
    let l = (&u - &one) / &n;
    let mu = l
        .modinv(&n)
        .ok_or(Error::KeyGeneration("lambda is not invertible mod n"))?;

    let public = PublicKey { n: n.clone(), g };
    let private = PrivateKey { lambda, mu, n };

    Ok(Keypair { public, private })
}

/// Generate a random prime of exactly `bits` length, with a bounded number
/// of candidates before giving up.
fn generate_prime(bits: u64) -> Result<BigUint, Error> {
    if bits < 8 {
        return Err(Error::KeyGeneration("key length too short"));
    }
    let mut rng = rand::rngs::OsRng;
    let one = BigUint::one();

    for _ in 0..MAX_PRIME_ATTEMPTS {
        let mut candidate = rng.gen_biguint(bits);
        // Force the top bit (exact length) and the low bit (odd).
        candidate |= &one << (bits - 1);
        candidate |= &one;
        if is_prime(&candidate, None).probably() {
            return Ok(candidate);
        }
    }

    Err(Error::KeyGeneration("prime search exhausted its attempts"))
}

/// Encrypt an arbitrary non-negative plaintext.
pub fn encrypt(public: &PublicKey, plaintext: &BigUint) -> Ciphertext {
    let n_squared = public.n_squared();
    let r = random_group_element(&public.n);

    let c = (public.g.modpow(plaintext, &n_squared) * r.modpow(&public.n, &n_squared)) % &n_squared;
    Ciphertext(c)
}

/// Encrypt the plaintext 0. Bootstraps a candidate's entry in a fresh tally.
pub fn encrypt_zero(public: &PublicKey) -> Ciphertext {
    encrypt(public, &BigUint::zero())
}

/// Encrypt the plaintext 1. Represents a single vote.
pub fn encrypt_one(public: &PublicKey) -> Ciphertext {
    encrypt(public, &BigUint::one())
}

/// Homomorphically add two ciphertexts: the product mod n² decrypts to the
/// sum of the plaintexts. Associative and commutative.
pub fn add(public: &PublicKey, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, Error> {
    if !a.is_canonical(public) || !b.is_canonical(public) {
        return Err(Error::InvalidTallyState(
            "ciphertext operand is not in canonical form".to_string(),
        ));
    }
    Ok(Ciphertext((&a.0 * &b.0) % public.n_squared()))
}

/// Decrypt a ciphertext: m = L(c^lambda mod n²) * mu mod n.
pub fn decrypt(private: &PrivateKey, ciphertext: &Ciphertext) -> Result<BigUint, Error> {
    let one = BigUint::one();
    let n_squared = &private.n * &private.n;

    if ciphertext.0.is_zero() || ciphertext.0 >= n_squared {
        return Err(Error::Decryption);
    }

    let u = ciphertext.0.modpow(&private.lambda, &n_squared);
    // L(u) is only defined when u = 1 mod n; anything else means the
    // ciphertext was not produced under this keypair.
    if u.is_zero() || !((&u - &one) % &private.n).is_zero() {
        return Err(Error::Decryption);
    }
    let l = (&u - &one) / &private.n;

    Ok((l * &private.mu) % &private.n)
}

/// Draw a random element of Z*_n (coprime with the modulus).
fn random_group_element(modulus: &BigUint) -> BigUint {
    let mut rng = rand::rngs::OsRng;
    let one = BigUint::one();
    loop {
        let x = rng.gen_biguint_range(&one, modulus);
        if x.gcd(modulus) == one {
            return x;
        }
    }
}
