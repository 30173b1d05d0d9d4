//! Message module.
//!
//! This module turns a parsed template back into a raw message and
//! encodes it the way the Gmail API expects it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use log::trace;

use crate::template::{Headers, Template};

/// Serialize headers then body into a raw message.
///
/// Headers are written in their insertion order as `Key: Value`
/// lines, followed by one blank line and the body as is.
pub fn serialize(headers: &Headers, body: &str) -> String {
    let mut msg = String::new();

    for (key, val) in headers.iter() {
        msg.push_str(key);
        msg.push_str(": ");
        msg.push_str(val);
        msg.push('\n');
    }

    msg.push('\n');
    msg.push_str(body);
    msg
}

/// Serialize then encode the message as unpadded URL-safe base64.
pub fn encode(headers: &Headers, body: &str) -> String {
    let msg = serialize(headers, body);
    trace!("raw message: {msg:?}");
    URL_SAFE_NO_PAD.encode(msg.as_bytes())
}

impl Template {
    pub fn to_raw_message(&self) -> String {
        serialize(&self.headers, &self.body)
    }

    pub fn encode(&self) -> String {
        encode(&self.headers, &self.body)
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    use super::{encode, serialize};
    use crate::template::{Headers, Template};

    fn decode(payload: &str) -> String {
        String::from_utf8(URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_serialize_keeps_header_order() {
        let headers = Headers::from_iter([
            ("From", "a@x.com"),
            ("To", "b@x.com"),
            ("Subject", "Hi"),
            ("Content-Type", "text/plain"),
        ]);

        assert_eq!(
            serialize(&headers, "body"),
            "From: a@x.com\nTo: b@x.com\nSubject: Hi\nContent-Type: text/plain\n\nbody"
        );
    }

    #[test]
    fn test_encode_decodes_to_raw_message() {
        let raw = "From: a@x.com\nTo: b@x.com\nSubject: Hi\n\nHello there";
        let tpl = Template::parse(raw).unwrap();

        assert_eq!(decode(&tpl.encode()), raw);
    }

    #[test]
    fn test_encode_is_url_safe_and_unpadded() {
        // standard alphabet gives U3ViamVjdDogPj4+Pz8/Cgo/IQ==
        let headers = Headers::from_iter([("Subject", ">>>???")]);
        let payload = encode(&headers, "?!");

        assert_eq!(payload, "U3ViamVjdDogPj4-Pz8_Cgo_IQ");
        assert_eq!(decode(&payload), "Subject: >>>???\n\n?!");
    }

    #[test]
    fn test_encode_non_ascii_body() {
        let headers = Headers::from_iter([("From", "a@x.com"), ("To", "b@x.com"), ("Subject", "Ça va")]);
        let payload = encode(&headers, "Grüße, 世界\r\n");
        assert_eq!(
            decode(&payload),
            "From: a@x.com\nTo: b@x.com\nSubject: Ça va\n\nGrüße, 世界\r\n"
        );
    }
}
