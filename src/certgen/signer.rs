// ABOUTME: RSA signer that lets rcgen self-sign with keys from the rsa crate.
// ABOUTME: Supports every key size the generator offers, including those under 2048 bits.

use rcgen::{RemoteKeyPair, SignatureAlgorithm};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;

/// PKCS#1 v1.5 / SHA-256 signer over an in-memory RSA key.
pub(crate) struct RsaSigner {
    signing_key: SigningKey<Sha256>,
    /// PKCS#1 `RSAPublicKey` DER, as carried in the SubjectPublicKeyInfo.
    public_der: Vec<u8>,
}

impl RsaSigner {
    pub(crate) fn new(key: &RsaPrivateKey) -> Result<Self, rsa::pkcs1::Error> {
        let public_der = key.to_public_key().to_pkcs1_der()?.as_bytes().to_vec();
        Ok(Self {
            signing_key: SigningKey::<Sha256>::new(key.clone()),
            public_der,
        })
    }
}

impl RemoteKeyPair for RsaSigner {
    fn public_key(&self) -> &[u8] {
        &self.public_der
    }

    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, rcgen::Error> {
        self.signing_key
            .try_sign(msg)
            .map(|sig| sig.to_vec())
            .map_err(|_| rcgen::Error::RemoteKeyError)
    }

    fn algorithm(&self) -> &'static SignatureAlgorithm {
        &rcgen::PKCS_RSA_SHA256
    }
}
