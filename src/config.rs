use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::env;

use crate::error::{Result, VisitorError};

pub const DEFAULT_TABLE: &str = "newVisitors";
pub const DEFAULT_BUCKET: &str = "images";
/// Folder inside the storage bucket that visitor photos land in.
pub const OBJECT_PREFIX: &str = "newVisitors";

const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;
const SALT_LEN: usize = 16;

/// Salted PBKDF2-HMAC-SHA256 digest of a shared secret. Deployments can
/// supply the precomputed JSON form instead of a plaintext password.
#[derive(Clone, Serialize, Deserialize)]
pub struct SecretHash {
    pub salt: String,
    pub hash: String,
    pub iterations: u32,
}

impl SecretHash {
    pub fn derive(password: &str) -> Result<SecretHash> {
        let mut salt = [0_u8; SALT_LEN];
        getrandom::getrandom(&mut salt)
            .map_err(|err| VisitorError::Config(err.to_string()))?;
        let key = derive_key(password, &salt, DEFAULT_PBKDF2_ITERATIONS);
        Ok(SecretHash {
            salt: B64.encode(salt),
            hash: B64.encode(key),
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        })
    }

    pub fn verify(&self, password: &str) -> bool {
        let salt = match B64.decode(self.salt.as_str()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let expected = match B64.decode(self.hash.as_str()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let key = derive_key(password, salt.as_slice(), self.iterations);
        // Length never varies, so a simple accumulator keeps the compare
        // independent of where the first mismatch sits.
        if expected.len() != key.len() {
            return false;
        }
        let mut diff = 0_u8;
        for (a, b) in expected.iter().zip(key.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0_u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

#[derive(Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub table: String,
    pub bucket: String,
    pub admin_secret: SecretHash,
    pub access_secret: SecretHash,
}

impl AppConfig {
    pub fn new(
        supabase_url: &str,
        supabase_anon_key: &str,
        admin_secret: SecretHash,
        access_secret: SecretHash,
    ) -> AppConfig {
        AppConfig {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: supabase_anon_key.to_string(),
            table: DEFAULT_TABLE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            admin_secret,
            access_secret,
        }
    }

    /// Reads the same settings the web frontend kept in its `VITE_*`
    /// variables. `*_PASSWORD_HASH` takes the serialized [`SecretHash`]
    /// form and wins over the plaintext variable when both are set.
    pub fn from_env() -> Result<AppConfig> {
        let supabase_url = required_env("SUPABASE_URL")?;
        let supabase_anon_key = required_env("SUPABASE_ANON_KEY")?;
        let admin_secret = secret_from_env("ADMIN_PASSWORD")?;
        let access_secret = secret_from_env("ACCESS_PASSWORD")?;
        Ok(AppConfig::new(
            supabase_url.as_str(),
            supabase_anon_key.as_str(),
            admin_secret,
            access_secret,
        ))
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VisitorError::Config(format!("{name} is not set"))),
    }
}

fn secret_from_env(name: &str) -> Result<SecretHash> {
    let hash_name = format!("{name}_HASH");
    if let Ok(raw) = env::var(hash_name.as_str()) {
        return serde_json::from_str(raw.as_str())
            .map_err(|err| VisitorError::Config(format!("{hash_name}: {err}")));
    }
    SecretHash::derive(required_env(name)?.as_str())
}
