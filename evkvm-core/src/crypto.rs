//! Per-destination asymmetric encryption: each subscriber has an RSA
//! keypair, the publisher encrypts to a subscriber's public key, and only
//! that subscriber's private key can recover the plaintext.
//!
//! Grounded on `crypto.py` in the kybonet prototype (`generate_keys`,
//! `import_public_key`, `encrypt_message`, `decrypt_message`), translated to
//! the `rsa` crate, accepting both PKCS8 and legacy PKCS1 PEM on import for
//! compatibility with hand-distributed keys.

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

/// RSA modulus size for newly generated keypairs.
pub const KEY_BITS: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("RSA key generation failed: {0}")]
    KeyGeneration(String),
    #[error("encryption failed: {0}")]
    Encrypt(String),
    #[error("invalid PEM-encoded key: {0}")]
    InvalidPem(String),
}

/// A ciphertext decrypted successfully but could not be reverted to a
/// structured event. Caller must not treat this as "not addressed to me";
/// [`decrypt`] is the only place that signals "wrong key".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptFailed;

pub fn generate_keypair() -> Result<(RsaPrivateKey, RsaPublicKey), CryptoError> {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, KEY_BITS)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);
    Ok((private_key, public_key))
}

pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, CryptoError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::InvalidPem(e.to_string()))
}

pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<String, CryptoError> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| CryptoError::InvalidPem(e.to_string()))
}

/// Accepts either SubjectPublicKeyInfo (PKCS8) or legacy PKCS1 "RSA PUBLIC
/// KEY" PEM, since both show up in the wild for hand-distributed keys.
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::InvalidPem(e.to_string()))
}

pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::InvalidPem(e.to_string()))
}

/// Encrypts `plaintext` so that only the holder of the matching private key
/// can recover it. RSA-OAEP bounds plaintext size well below the key size;
/// callers encrypt one small JSON event at a time, never a batch.
pub fn encrypt(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut rng = OsRng;
    let padding = Oaep::new::<Sha256>();
    public_key
        .encrypt(&mut rng, padding, plaintext)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))
}

/// Attempts to decrypt `ciphertext` with `private_key`. A subscriber
/// receives every publisher frame regardless of its addressee, so a
/// decryption failure here just means "not for me" — it is not an error
/// condition to log or propagate.
pub fn decrypt(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptFailed> {
    let padding = Oaep::new::<Sha256>();
    private_key
        .decrypt(padding, ciphertext)
        .map_err(|_| DecryptFailed)
}
