use async_trait::async_trait;
use aws_sdk_kms::primitives::Blob;
use base64::{engine::general_purpose::STANDARD, Engine};

/// The warehouse password, resolved exactly once at startup and threaded into
/// the warehouse adapter as an immutable value.
#[derive(Clone)]
pub struct WarehouseCredential {
    password: String,
}

impl WarehouseCredential {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn reveal(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for WarehouseCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WarehouseCredential(****)")
    }
}

/// Capability seam over the secret store.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Resolve the base64-encoded ciphertext into the warehouse credential.
    async fn resolve(&self, ciphertext: &str) -> Result<WarehouseCredential, String>;
}

/// `SecretResolver` backed by KMS.
#[derive(Debug, Clone)]
pub struct KmsSecretResolver {
    client: aws_sdk_kms::Client,
}

impl KmsSecretResolver {
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretResolver for KmsSecretResolver {
    async fn resolve(&self, ciphertext: &str) -> Result<WarehouseCredential, String> {
        let encrypted = STANDARD
            .decode(ciphertext.trim())
            .map_err(|error| format!("ciphertext is not valid base64: {error}"))?;

        let response = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(encrypted))
            .send()
            .await
            .map_err(|error| format!("failed to decrypt warehouse password: {error}"))?;

        let plaintext = response
            .plaintext
            .ok_or_else(|| "decrypt response carried no plaintext".to_string())?;
        let password = String::from_utf8(plaintext.into_inner())
            .map_err(|error| format!("decrypted password is not valid UTF-8: {error}"))?;

        Ok(WarehouseCredential::new(password))
    }
}
