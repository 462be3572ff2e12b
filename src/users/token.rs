use rand::{rngs::OsRng, RngCore};

/// 32 bytes of OS randomness, hex-encoded: 256 bits of entropy per token.
const VERIFICATION_TOKEN_BYTES: usize = 32;

pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn verification_link(base_url: &str, token: &str) -> String {
    format!(
        "{}/api/v1/users/verify/{}",
        base_url.trim_end_matches('/'),
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        assert_ne!(generate_verification_token(), generate_verification_token());
    }

    #[test]
    fn link_embeds_base_url_and_token() {
        let link = verification_link("http://localhost:8080/", "abc123");
        assert_eq!(link, "http://localhost:8080/api/v1/users/verify/abc123");
    }
}
