//! Client-side encryption of values exchanged with the MXE.
//!
//! Both sides derive the same x25519 shared secret and hash it into an
//! AES-256-GCM key. Each 32-byte field ciphertext holds the sealed
//! little-endian value and its tag, zero padded:
//! `[ciphertext (8) | tag (16) | 0 (8)]`. The GCM nonce of a field is taken
//! from SHA-256 over the group nonce and the field index.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use curve25519_dalek::montgomery::MontgomeryPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::ClientError;

pub const FIELD_LEN: usize = 32;

const VALUE_LEN: usize = 8;
const TAG_LEN: usize = 16;
const KEY_CONTEXT: &[u8] = b"ticketing-field-key";

#[derive(Clone)]
pub struct EncryptionKey {
    secret: [u8; 32],
}

impl EncryptionKey {
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self { secret }
    }

    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    pub fn from_hex(raw: &str) -> Result<Self, ClientError> {
        let bytes = hex::decode(raw.trim())
            .map_err(|e| ClientError::Config(format!("encryption key: {e}")))?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ClientError::Config("encryption key must be 32 bytes".into()))?;
        Ok(Self { secret })
    }

    pub fn public_key(&self) -> [u8; 32] {
        MontgomeryPoint::mul_base_clamped(self.secret).to_bytes()
    }

    pub fn shared_cipher(&self, peer_public: &[u8; 32]) -> SharedCipher {
        let shared = MontgomeryPoint(*peer_public).mul_clamped(self.secret);
        let key: [u8; 32] = Sha256::new()
            .chain_update(KEY_CONTEXT)
            .chain_update(shared.to_bytes())
            .finalize()
            .into();
        SharedCipher {
            aead: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        }
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("public", &hex::encode(self.public_key()))
            .finish()
    }
}

pub struct SharedCipher {
    aead: Aes256Gcm,
}

fn field_nonce(nonce: &[u8; 16], index: u32) -> [u8; 12] {
    let digest = Sha256::new()
        .chain_update(nonce)
        .chain_update(index.to_le_bytes())
        .finalize();
    let mut out = [0u8; 12];
    out.copy_from_slice(&digest[..12]);
    out
}

impl SharedCipher {
    /// Encrypts `values` as consecutive fields under one nonce.
    pub fn encrypt_fields(
        &self,
        values: &[u64],
        nonce: &[u8; 16],
    ) -> Result<Vec<[u8; FIELD_LEN]>, ClientError> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let gcm_nonce = field_nonce(nonce, index as u32);
                let sealed = self
                    .aead
                    .encrypt(Nonce::from_slice(&gcm_nonce), value.to_le_bytes().as_ref())
                    .map_err(|e| ClientError::Encrypt(e.to_string()))?;
                let mut block = [0u8; FIELD_LEN];
                block[..VALUE_LEN + TAG_LEN].copy_from_slice(&sealed);
                Ok(block)
            })
            .collect()
    }

    /// Opens field `index` of a ciphertext group. A wrong key, nonce or
    /// index fails the tag check.
    pub fn decrypt_field(
        &self,
        ciphertext: &[u8; FIELD_LEN],
        nonce: &[u8; 16],
        index: u32,
    ) -> Result<u64, ClientError> {
        let (sealed, padding) = ciphertext.split_at(VALUE_LEN + TAG_LEN);
        if padding.iter().any(|b| *b != 0) {
            return Err(ClientError::Decrypt);
        }
        let gcm_nonce = field_nonce(nonce, index);
        let plain = self
            .aead
            .decrypt(Nonce::from_slice(&gcm_nonce), sealed)
            .map_err(|_| ClientError::Decrypt)?;
        let value: [u8; VALUE_LEN] = plain
            .as_slice()
            .try_into()
            .map_err(|_| ClientError::Decrypt)?;
        Ok(u64::from_le_bytes(value))
    }
}

pub fn random_nonce() -> [u8; 16] {
    let mut nonce = [0u8; 16];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_secret_is_symmetric() {
        let user = EncryptionKey::generate();
        let mxe = EncryptionKey::generate();
        let nonce = random_nonce();

        let sealed = mxe
            .shared_cipher(&user.public_key())
            .encrypt_fields(&[50, 100], &nonce)
            .unwrap();
        let opener = user.shared_cipher(&mxe.public_key());

        assert_eq!(opener.decrypt_field(&sealed[0], &nonce, 0).unwrap(), 50);
        assert_eq!(opener.decrypt_field(&sealed[1], &nonce, 1).unwrap(), 100);
    }

    #[test]
    fn test_other_user_cannot_open_value() {
        let owner = EncryptionKey::generate();
        let stranger = EncryptionKey::generate();
        let mxe = EncryptionKey::generate();
        let nonce = random_nonce();

        let sealed = mxe
            .shared_cipher(&owner.public_key())
            .encrypt_fields(&[50], &nonce)
            .unwrap();
        let attempt = stranger
            .shared_cipher(&mxe.public_key())
            .decrypt_field(&sealed[0], &nonce, 0);

        assert!(matches!(attempt, Err(ClientError::Decrypt)));
    }

    #[test]
    fn test_nonce_and_index_change_the_ciphertext() {
        let cipher = EncryptionKey::generate().shared_cipher(&EncryptionKey::generate().public_key());
        let a = cipher.encrypt_fields(&[7, 7], &[1; 16]).unwrap();
        let b = cipher.encrypt_fields(&[7], &[2; 16]).unwrap();
        assert_ne!(a[0], a[1]);
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn test_tampered_or_misplaced_field_is_rejected() {
        let user = EncryptionKey::generate();
        let mxe = EncryptionKey::generate();
        let nonce = random_nonce();
        let sealed = mxe
            .shared_cipher(&user.public_key())
            .encrypt_fields(&[50, 100], &nonce)
            .unwrap();
        let opener = user.shared_cipher(&mxe.public_key());

        // field 0 opened as field 1
        assert!(matches!(
            opener.decrypt_field(&sealed[0], &nonce, 1),
            Err(ClientError::Decrypt)
        ));

        let mut flipped = sealed[0];
        flipped[0] ^= 1;
        assert!(matches!(
            opener.decrypt_field(&flipped, &nonce, 0),
            Err(ClientError::Decrypt)
        ));

        let mut padded = sealed[0];
        padded[FIELD_LEN - 1] = 1;
        assert!(matches!(
            opener.decrypt_field(&padded, &nonce, 0),
            Err(ClientError::Decrypt)
        ));
    }

    #[test]
    fn test_hex_key_round_trip() {
        let key = EncryptionKey::generate();
        let restored = EncryptionKey::from_hex(&hex::encode(key.secret)).unwrap();
        assert_eq!(restored.public_key(), key.public_key());
        assert!(EncryptionKey::from_hex("zz").is_err());
        assert!(EncryptionKey::from_hex("00ff").is_err());
    }
}
