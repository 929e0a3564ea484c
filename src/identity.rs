//! Stream identifier derivation.
//!
//! A stream ID is the stream name followed by the hex HMAC-MD5 of that name,
//! keyed with a shared secret. Case is preserved and there is no separator.
//! Because the ID is a pure function of `(name, key)`, it can be recomputed
//! from the CSV or range definition on every run without storing a mapping.

use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use md5::Md5;

pub const DEFAULT_SECRET_KEY: &str = "ams";

type HmacMd5 = Hmac<Md5>;

/// Derives stream identifiers with a fixed secret key.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    secret_key: String,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_KEY)
    }
}

impl IdGenerator {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
        }
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Returns `name ++ hex(hmac_md5(secret_key, name))`.
    ///
    /// Empty names are rejected; every other input succeeds.
    pub fn derive(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(Error::invalid("stream name must not be empty"));
        }
        Ok(format!("{}{}", name, self.digest(name)))
    }

    fn digest(&self, name: &str) -> String {
        // HMAC accepts keys of any length, including empty.
        let mut mac = HmacMd5::new_from_slice(self.secret_key.as_bytes())
            .unwrap_or_else(|_| unreachable!("hmac key length is unrestricted"));
        mac.update(name.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Shorthand for [`IdGenerator::derive`] with the default key.
pub fn derive_stream_id(name: &str) -> Result<String> {
    IdGenerator::default().derive(name)
}
