//! Serialize big integers as base-10 strings.
//!
//! Ciphertexts and key components cross serialization boundaries as decimal
//! strings, never as native binary bigint encodings, so that any store or
//! transport that can carry text can carry them unchanged.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<BigUint>()
        .map_err(|_| de::Error::custom(format!("invalid decimal big integer: {:.32}", s)))
}
