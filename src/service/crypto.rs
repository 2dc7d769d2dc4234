use sha3::{Digest, Sha3_256};
use uuid::Uuid;

pub fn get_sha3_256_hash(data: &str) -> String {
   let mut hasher = Sha3_256::default();
   hasher.update(data);
   format!("{:X}", hasher.finalize())
}

/// Opaque random token, used for refresh tokens and OAuth states.
pub fn random_token() -> String {
   let seed = format!("{}{}", Uuid::new_v4(), Uuid::new_v4());
   get_sha3_256_hash(&seed)
}
