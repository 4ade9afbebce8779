use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid public key bytes")]
    InvalidPublicKey,
    #[error("invalid signature bytes")]
    InvalidSignature,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// An ed25519 keypair for an identity-registry entity.
///
/// The signing key is held in a `Zeroizing` buffer and wiped on drop.
pub struct KeyPair {
    signing_key: Zeroizing<[u8; 32]>,
    pub public_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a fresh ed25519 keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let public_key = signing_key.verifying_key();
        Self {
            signing_key: Zeroizing::new(signing_key.to_bytes()),
            public_key,
        }
    }

    pub fn from_signing_key_bytes(bytes: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&bytes);
        let public_key = signing_key.verifying_key();
        Self {
            signing_key: Zeroizing::new(bytes),
            public_key,
        }
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.signing_key)
    }

    /// Sign `message`, returning the hex-encoded signature as the kernel
    /// stores it on `Action::signature`.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        let sig: Signature = self.signing_key().sign(message);
        hex::encode(sig.to_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.to_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ public_key: {} }}", self.public_key_hex())
    }
}

/// Parse a hex-encoded ed25519 public key.
pub fn parse_public_key(hex_str: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(hex_str)?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    VerifyingKey::from_bytes(&arr).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Verify a hex-encoded signature over `message` under `public_key_hex`.
///
/// Non-hex or malformed inputs are treated as verification failures rather
/// than propagated parse errors, since the only caller-visible outcome
/// SignatureGuard needs is accept/reject.
pub fn verify_hex(message: &[u8], signature_hex: &str, public_key_hex: &str) -> bool {
    let Ok(public_key) = parse_public_key(public_key_hex) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(sig_arr) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_arr);
    public_key.verify(message, &signature).is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyHex(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = KeyPair::generate();
        let sig = kp.sign_hex(b"hello governance");
        assert!(verify_hex(b"hello governance", &sig, &kp.public_key_hex()));
    }

    #[test]
    fn tampered_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.sign_hex(b"hello governance");
        assert!(!verify_hex(b"hello governance!", &sig, &kp.public_key_hex()));
    }

    #[test]
    fn garbage_signature_fails() {
        let kp = KeyPair::generate();
        assert!(!verify_hex(b"hello", "garbage", &kp.public_key_hex()));
    }
}
