use std::{fmt::Display, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The alphabet omits lookalike characters (0/O, 1/I/l) so tokens survive being read over the phone or out of a log
/// line.
const TOKEN_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const TOKEN_LEN: usize = 22;

/// A per-record unguessable token embedded in callback URLs to authenticate browser-return and notification requests
/// as genuinely tied to that record.
///
/// Generated once at record creation from the thread-local CSPRNG. 22 characters over a 57-symbol alphabet gives a
/// little over 128 bits of entropy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let token = (0..TOKEN_LEN).map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char).collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a token supplied by an inbound request.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl Display for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SecretToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}
