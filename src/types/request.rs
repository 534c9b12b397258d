//! Inbound webhook request context
//!
//! The POSTed fields of one webhook delivery together with the time it was
//! received. The context is built once and handed explicitly to the resolver,
//! the gateway adapters and the error reporter.

use super::Timestamp;

/// Ordered key/value body of a webhook delivery
///
/// Field order is kept for the forensic dump in error reports. When a key is
/// repeated the last value wins on lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Vec<(String, String)>,
}

impl Payload {
    /// Decode an `application/x-www-form-urlencoded` body
    pub fn from_form(body: &[u8]) -> Self {
        let fields = form_urlencoded::parse(body)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Payload { fields }
    }

    /// Build a payload from already decoded pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Payload {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Value of a field, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a field, treating an empty value as absent
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One webhook delivery
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    payload: Payload,
    received_at: Timestamp,
}

impl RequestContext {
    pub fn new(payload: Payload, received_at: Timestamp) -> Self {
        RequestContext {
            payload,
            received_at,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Time of receipt; "now" for every period calculation on this request
    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form_decodes_fields_in_order() {
        let payload = Payload::from_form(b"txn_type=web_accept&item_number=3%2B42&memo=hello+there");

        let fields: Vec<_> = payload.iter().collect();
        assert_eq!(
            fields,
            vec![
                ("txn_type", "web_accept"),
                ("item_number", "3+42"),
                ("memo", "hello there"),
            ]
        );
    }

    #[test]
    fn test_repeated_key_last_value_wins() {
        let payload = Payload::from_form(b"business=a%40x.com&business=b%40x.com");
        assert_eq!(payload.get("business"), Some("b@x.com"));
    }

    #[test]
    fn test_get_non_empty_ignores_blank_values() {
        let payload = Payload::from_pairs([("tax", " "), ("mc_gross", "10.00")]);
        assert_eq!(payload.get("tax"), Some(" "));
        assert_eq!(payload.get_non_empty("tax"), None);
        assert_eq!(payload.get_non_empty("mc_gross"), Some("10.00"));
    }

    #[test]
    fn test_empty_body_is_empty_payload() {
        assert!(Payload::from_form(b"").is_empty());
        assert!(!Payload::from_pairs([("a", "1")]).is_empty());
    }
}
