//! AES-CFB value cipher.
//!
//! Ciphertext layout is `iv (16 bytes) || cfb(plaintext)`, the same layout Go's
//! `crypto/cipher` CFB stream produces when the IV is prepended by hand.

use aes::{Aes128, Aes192, Aes256};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::domain::errors::{VolumeError, VolumeResult};

/// Length of the random IV prepended to every ciphertext.
pub const IV_LEN: usize = 16;

/// Accepted AES key lengths in bytes.
pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// AES key whose length selects AES-128, AES-192 or AES-256.
pub struct ValueCipher {
    key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for ValueCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCipher")
            .field("bits", &(self.key.len() * 8))
            .finish_non_exhaustive()
    }
}

impl ValueCipher {
    pub fn new(key: impl Into<Vec<u8>>) -> VolumeResult<Self> {
        let key = Zeroizing::new(key.into());
        if !KEY_LENGTHS.contains(&key.len()) {
            return Err(VolumeError::CorruptCiphertext(format!(
                "invalid key length {} (expected 16, 24 or 32 bytes)",
                key.len()
            )));
        }
        Ok(Self { key })
    }

    /// Encrypt under a fresh random IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> VolumeResult<Vec<u8>> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut out = Vec::with_capacity(IV_LEN + plaintext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(plaintext);

        let buf = &mut out[IV_LEN..];
        match self.key.len() {
            16 => Encryptor::<Aes128>::new_from_slices(&self.key, &iv)
                .map_err(key_error)?
                .encrypt(buf),
            24 => Encryptor::<Aes192>::new_from_slices(&self.key, &iv)
                .map_err(key_error)?
                .encrypt(buf),
            32 => Encryptor::<Aes256>::new_from_slices(&self.key, &iv)
                .map_err(key_error)?
                .encrypt(buf),
            other => return Err(key_error(other)),
        }
        Ok(out)
    }

    /// Decrypt a value produced by [`ValueCipher::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> VolumeResult<Vec<u8>> {
        if ciphertext.len() < IV_LEN {
            return Err(VolumeError::CorruptCiphertext(format!(
                "ciphertext is {} bytes, shorter than the {IV_LEN}-byte IV",
                ciphertext.len()
            )));
        }

        let (iv, body) = ciphertext.split_at(IV_LEN);
        let mut out = body.to_vec();
        match self.key.len() {
            16 => Decryptor::<Aes128>::new_from_slices(&self.key, iv)
                .map_err(key_error)?
                .decrypt(&mut out),
            24 => Decryptor::<Aes192>::new_from_slices(&self.key, iv)
                .map_err(key_error)?
                .decrypt(&mut out),
            32 => Decryptor::<Aes256>::new_from_slices(&self.key, iv)
                .map_err(key_error)?
                .decrypt(&mut out),
            other => return Err(key_error(other)),
        }
        Ok(out)
    }
}

fn key_error(detail: impl std::fmt::Debug) -> VolumeError {
    VolumeError::CorruptCiphertext(format!("cipher setup failed: {detail:?}"))
}
