use serde::{Deserialize, Serialize};

/// One diary entry as the records API expects it on create.
///
/// Field order is the wire order; `sonic-rs` emits struct fields as declared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub date: String,
    /// ISO 8601 duration.
    #[serde(rename = "time-spent")]
    pub time_spent: String,
    #[serde(rename = "programming-language")]
    pub programming_language: String,
    pub rating: u8,
    pub description: String,
}

impl Record {
    /// The fixed entry the poster sends on every run.
    pub fn sample() -> Self {
        Self {
            date: "2019-02-28".to_string(),
            time_spent: "P".to_string(),
            programming_language: "Python".to_string(),
            rating: 5,
            description: "Very cool, ngl".to_string(),
        }
    }
}
