// Key Server Records
// JSON shapes exchanged with the key server and kept in local key files

use serde::{Deserialize, Serialize};

/// Public key record, one per registered address.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Key {
    pub email: String, // Owning address; blank until sendKey fills it in
    pub key: String,   // Base64 key blob, exponent then modulus
}

/// Private record kept on disk and never sent to the server. Lists every
/// address registered against the local key pair.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PrivateKey {
    pub email: Vec<String>,
    pub key: String, // Base64 key blob, exponent then modulus
}

/// One message in transit; content is base64 ciphertext.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub email: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let key = Key {
            email: "alice@example.com".to_string(),
            key: "AAAA".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            r#"{"email":"alice@example.com","key":"AAAA"}"#
        );

        let message = Message {
            email: "bob@example.com".to_string(),
            content: "BBBB".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"email":"bob@example.com","content":"BBBB"}"#
        );
    }

    #[test]
    fn test_private_record_round_trip() {
        let record = PrivateKey {
            email: vec!["alice@example.com".to_string(), "a@b.c".to_string()],
            key: "CCCC".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"email":["alice@example.com","a@b.c"],"key":"CCCC"}"#);

        let back: PrivateKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back.email, record.email);
        assert_eq!(back.key, record.key);
    }
}
