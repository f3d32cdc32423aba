use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::foundation::error::{TapestryError, TapestryResult};

type HmacSha256 = Hmac<Sha256>;

/// Signs data that round-trips through the client (form action streams, client-persisted
/// fields) so that tampering is detected on the way back.
///
/// Encoded form: `base64(hmac):base64(payload)`, URL-safe alphabet without padding.
#[derive(Clone)]
pub struct ClientDataEncoder {
    key: Vec<u8>,
}

impl ClientDataEncoder {
    pub fn new(passphrase: Option<&str>) -> Self {
        let passphrase = match passphrase {
            Some(p) if !p.is_empty() => p,
            _ => {
                tracing::warn!(
                    "no HMAC passphrase configured; client data is signed with a fixed key \
                     and is not protected against tampering"
                );
                "tapestry-unconfigured-passphrase"
            }
        };
        Self {
            key: passphrase.as_bytes().to_vec(),
        }
    }

    /// HMAC-SHA256 keyed with the passphrase and fed with `data`.
    fn mac(&self, data: &[u8]) -> TapestryResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TapestryError::config(format!("client data key: {e}")))?;
        mac.update(data);
        Ok(mac)
    }

    pub fn encode(&self, payload: &[u8]) -> TapestryResult<String> {
        let data = URL_SAFE_NO_PAD.encode(payload);
        let mac = self.mac(data.as_bytes())?.finalize().into_bytes();
        Ok(format!("{}:{data}", URL_SAFE_NO_PAD.encode(mac)))
    }

    pub fn decode(&self, encoded: &str) -> TapestryResult<Vec<u8>> {
        let (mac, data) = encoded.split_once(':').ok_or_else(|| {
            TapestryError::serde("client data is missing its signature")
        })?;
        let mac = URL_SAFE_NO_PAD
            .decode(mac)
            .map_err(|e| TapestryError::serde(format!("client data signature: {e}")))?;
        self.mac(data.as_bytes())?.verify_slice(&mac).map_err(|_| {
            TapestryError::serde(
                "client data signature does not match; the data may have been tampered with",
            )
        })?;
        URL_SAFE_NO_PAD
            .decode(data)
            .map_err(|e| TapestryError::serde(format!("client data payload: {e}")))
    }
}

impl std::fmt::Debug for ClientDataEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientDataEncoder")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/form/client_data.rs"]
mod tests;
