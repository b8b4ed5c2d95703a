use serde::{Deserialize, Serialize};

/// The record scanned for sensitive data and handed to the processing task.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Payload {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Payload {
    pub fn new<N, E, P>(name: N, email: E, phone: P) -> Self
    where
        N: Into<String>,
        E: Into<String>,
        P: Into<String>,
    {
        Payload {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Compact JSON form. This is the text the scanner inspects and the
    /// report records.
    pub fn text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::new(
            "Anastasiia Plaskonis",
            "plaskonis.pn@ucu.edu.ua",
            "+3801234567",
        )
    }
}
