use ed25519_dalek::SigningKey;
use quorum_rs::types::{
    crypto_primitives::{CryptoHasher, Digest, Keypair},
    data_types::{Address, CryptoHash},
};
use rand_core::OsRng;

// Generate `n` fresh validator keypairs.
pub(crate) fn keypairs(n: usize) -> Vec<Keypair> {
    let mut csprng = OsRng {};
    (0..n)
        .map(|_| Keypair::new(SigningKey::generate(&mut csprng)))
        .collect()
}

pub(crate) fn addresses(keypairs: &[Keypair]) -> Vec<Address> {
    keypairs.iter().map(Keypair::address).collect()
}

// A stand-in for the hash of a block with the given contents.
pub(crate) fn block_hash(contents: &[u8]) -> CryptoHash {
    CryptoHash::new(CryptoHasher::digest(contents).into())
}
