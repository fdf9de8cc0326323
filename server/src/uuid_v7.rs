use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use types::{Error, Result, err};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Signed, URL-safe tokens for record ids, plus access to the v7 timestamp.
pub trait UuidV7Ext: Sized {
    fn from_token(token: &str, secret: &SecretString) -> Result<Self>;
    fn as_token(&self, secret: &SecretString) -> Result<String>;

    fn jiff_timestamp(&self) -> Result<Timestamp>;
}

fn mac(secret: &SecretString) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| err!("bad signing key: {e}"))
}

impl UuidV7Ext for Uuid {
    fn from_token(token: &str, secret: &SecretString) -> Result<Self> {
        let (uuid_simple, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| Error::unauthorized("invalid token format"))?;

        let mut mac = mac(secret)?;
        mac.update(uuid_simple.as_bytes());
        let signature = BASE64_URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| Error::unauthorized("invalid token signature"))?;
        mac.verify_slice(&signature)
            .map_err(|_| Error::unauthorized("invalid token signature"))?;

        Ok(Uuid::parse_str(uuid_simple)?)
    }

    fn as_token(&self, secret: &SecretString) -> Result<String> {
        let id_str = self.simple().to_string();
        let mut mac = mac(secret)?;
        mac.update(id_str.as_bytes());
        let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{id_str}.{signature}"))
    }

    fn jiff_timestamp(&self) -> Result<Timestamp> {
        let ts = self
            .get_timestamp()
            .ok_or_else(|| err!("uuid {} carries no timestamp", self))?;

        let (seconds, nanos) = ts.to_unix();
        Ok(Timestamp::new(seconds as i64, nanos as i32)?)
    }
}
