use sha2::{Digest, Sha384};

/// Token the radio expects as the first bytes on a new link: the lowercase
/// hex SHA-384 of the password, sent as plain ASCII without framing.
pub fn auth_token(password: &str) -> String {
    hex::encode(Sha384::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha384_hex_of_password() {
        assert_eq!(
            auth_token("abc"),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed\
             8086072ba1e7cc2358baeca134c825a7"
        );
        assert_eq!(auth_token("tester").len(), 96);
    }
}
