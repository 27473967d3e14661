//! Encrypted keystore files holding an attestor's private key.

use std::path::{Path, PathBuf};

use alloy_signer_local::{LocalSigner, PrivateKeySigner};
use rand::thread_rng;

use crate::KeyError;

/// Decrypt the keystore at `path` with `password`.
///
/// # Errors
/// Returns [`KeyError::Keystore`] if the file is missing or cannot be decrypted.
pub fn read_keystore<P: AsRef<Path>>(path: P, password: &str) -> Result<PrivateKeySigner, KeyError> {
    Ok(LocalSigner::decrypt_keystore(path, password)?)
}

/// Encrypt `signer` into `dir/name` and return the written path.
///
/// # Errors
/// Returns [`KeyError::Keystore`] if the keystore cannot be written.
pub fn write_keystore<P: AsRef<Path>>(
    dir: P,
    name: &str,
    password: &str,
    signer: &PrivateKeySigner,
) -> Result<PathBuf, KeyError> {
    let key = signer.credential().to_bytes();
    let mut rng = thread_rng();
    LocalSigner::encrypt_keystore(dir.as_ref(), &mut rng, key, password, Some(name))?;
    Ok(dir.as_ref().join(name))
}


#[cfg(test)]
mod read_keystore {
    use super::*;

    #[test]
    fn fails_on_missing_file() {
        let res = super::read_keystore("/nonexistent/attestor", "");
        assert!(matches!(res, Err(KeyError::Keystore(_))));
    }
}
