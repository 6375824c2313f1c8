use sha2::{Digest, Sha256};

use crate::utils::{UtilError, base64url_encode, gen_random_string};

/// Random bytes behind every token; encodes to 43 characters.
const TOKEN_BYTES: usize = 32;

pub(crate) const CODE_CHALLENGE_METHOD: &str = "S256";

/// Fresh single-use `state` / `nonce` value.
pub(crate) fn generate_anti_replay_token() -> Result<String, UtilError> {
    gen_random_string(TOKEN_BYTES)
}

/// PKCE verifier/challenge pair for one authorization attempt (RFC 7636).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkceChallenge {
    pub fn generate() -> Result<Self, UtilError> {
        let code_verifier = gen_random_string(TOKEN_BYTES)?;
        let code_challenge = derive_code_challenge(&code_verifier)?;
        Ok(Self {
            code_verifier,
            code_challenge,
        })
    }

    pub fn method(&self) -> &'static str {
        CODE_CHALLENGE_METHOD
    }
}

/// `BASE64URL(SHA256(verifier))`
pub(crate) fn derive_code_challenge(code_verifier: &str) -> Result<String, UtilError> {
    if !(43..=128).contains(&code_verifier.len()) {
        return Err(UtilError::Format(format!(
            "Code verifier must be 43-128 characters, got {}",
            code_verifier.len()
        )));
    }
    base64url_encode(Sha256::digest(code_verifier.as_bytes()).to_vec())
}
