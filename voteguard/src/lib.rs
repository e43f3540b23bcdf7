#[macro_use]
extern crate serde;

mod authn;
mod error;
mod keystore;
mod ledger;
mod paillier;
mod secret_share;
mod serde_decimal;
mod tally;
mod voting;

pub use authn::*;
pub use error::*;
pub use keystore::*;
pub use ledger::*;
pub use paillier::*;
pub use secret_share::*;
pub use tally::*;
pub use voting::*;

#[cfg(test)]
mod tests;
