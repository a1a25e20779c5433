//! TC3-HMAC-SHA256 request signing

use crate::config::Credential;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

type HmacSha256 = Hmac<Sha256>;

/// Fields of a POST request that enter the signature
pub struct SignInput<'a> {
    pub service: &'a str,
    pub host: &'a str,
    /// Request path, `/` unless the endpoint carries a prefix
    pub path: &'a str,
    pub payload: &'a [u8],
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct Tc3Signer {
    credential: Credential,
}

impl Tc3Signer {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Value of the `Authorization` header for `input`
    pub fn authorization(&self, input: &SignInput<'_>) -> Result<String, String> {
        let date = DateTime::<Utc>::from_timestamp(input.timestamp, 0)
            .ok_or_else(|| format!("timestamp out of range: {}", input.timestamp))?
            .format("%Y-%m-%d")
            .to_string();

        let canonical_request = format!(
            "POST\n{}\n\ncontent-type:{}\nhost:{}\n\n{}\n{}",
            input.path,
            CONTENT_TYPE,
            input.host,
            SIGNED_HEADERS,
            sha256_hex(input.payload)
        );

        let scope = format!("{}/{}/tc3_request", date, input.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            input.timestamp,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let secret = format!("TC3{}", self.credential.secret_key);
        let secret_date = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
        let secret_service = hmac_sha256(&secret_date, input.service.as_bytes())?;
        let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
        let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credential.secret_id, scope, SIGNED_HEADERS, signature
        ))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, String> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| e.to_string())?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
