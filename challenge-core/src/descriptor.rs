use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, SubmitError};
use crate::state::StateValue;

/// Choice images: a plain list, or a map from image id to payload when the
/// challenge layout refers to images by id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceImages {
    List(Vec<String>),
    Keyed(BTreeMap<String, String>),
}

impl Default for ChoiceImages {
    fn default() -> Self {
        ChoiceImages::List(Vec::new())
    }
}

impl ChoiceImages {
    pub fn len(&self) -> usize {
        match self {
            ChoiceImages::List(v) => v.len(),
            ChoiceImages::Keyed(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Base64 payload by position (list) or by id (keyed). Empty payloads
    /// mark blank cells and are reported as missing.
    pub fn get(&self, key: usize) -> Option<&str> {
        let image = match self {
            ChoiceImages::List(v) => v.get(key),
            ChoiceImages::Keyed(m) => m.get(&key.to_string()),
        };
        image.map(String::as_str).filter(|s| !s.is_empty())
    }
}

/// Challenge as served by `challenge/{id}`. Immutable once fetched; fields a
/// variant does not use are simply absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDescriptor {
    pub subtype: Option<String>,
    pub instruction: Option<String>,
    #[serde(default, alias = "instruction_images")]
    pub instruction_image: Vec<String>,
    #[serde(default)]
    pub images: ChoiceImages,
    /// Image ids laid out row by row.
    pub grid: Option<Vec<Vec<u32>>>,
    pub swaps: Option<Vec<[usize; 2]>>,
    pub n_holes: Option<usize>,
    pub n_pieces: Option<usize>,
    /// Vertical offset of the sliding piece, in pixels.
    pub height: Option<f64>,
    pub expected_length: Option<usize>,
    #[serde(default)]
    pub labels: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ChallengeDescriptor {
    /// Expected answer length: explicit, or the length of the first label.
    pub fn expected_len(&self) -> Option<usize> {
        self.expected_length.or_else(|| {
            self.labels
                .first()
                .and_then(serde_json::Value::as_str)
                .map(|s| s.chars().count())
        })
    }

    /// Decode a challenge response. Non-success statuses carry the server's
    /// `message` when it sent one.
    pub fn from_response(status: u16, ok: bool, body: &str) -> Result<Self, FetchError> {
        if !ok {
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| body.trim().to_string());
            return Err(FetchError::Status { status, message });
        }
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Body posted to the submit endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmitRequest {
    pub id: String,
    pub state: StateValue,
    #[serde(rename = "challenge_type", skip_serializing_if = "Option::is_none")]
    pub variant_tag: Option<&'static str>,
}

/// Backend acknowledgement of a submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(skip)]
    pub ok: bool,
    pub solved: Option<bool>,
    pub message: Option<String>,
}

impl Ack {
    /// Decode a submit response. A non-success status is an error carrying the
    /// server's message.
    pub fn from_response(status: u16, ok: bool, body: &str) -> Result<Self, SubmitError> {
        let parsed = serde_json::from_str::<Ack>(body);
        if !ok {
            let message = parsed
                .ok()
                .and_then(|a| a.message)
                .unwrap_or_else(|| body.trim().to_string());
            return Err(SubmitError::Status { status, message });
        }
        let mut ack = parsed.map_err(|e| SubmitError::Decode(e.to_string()))?;
        ack.ok = true;
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pointer::NormalizedPoint;

    #[test]
    fn decodes_keyed_images_and_grid() {
        let body = r#"{"grid": [[0, 1], [1, 2]], "images": {"0": "AAA", "1": "", "2": "CCC"}}"#;
        let d = ChallengeDescriptor::from_response(200, true, body).unwrap();
        assert_eq!(d.grid, Some(vec![vec![0, 1], vec![1, 2]]));
        assert_eq!(d.images.get(0), Some("AAA"));
        assert_eq!(d.images.get(1), None);
        assert_eq!(d.images.len(), 3);
    }

    #[test]
    fn accepts_plural_instruction_images() {
        let body = r#"{"instruction_images": ["a", "b", "c"], "images": ["bg"]}"#;
        let d = ChallengeDescriptor::from_response(200, true, body).unwrap();
        assert_eq!(d.instruction_image.len(), 3);
        assert_eq!(d.images.get(0), Some("bg"));
    }

    #[test]
    fn expected_len_falls_back_to_label() {
        let d: ChallengeDescriptor = serde_json::from_value(json!({"labels": ["x7kq2p"]})).unwrap();
        assert_eq!(d.expected_len(), Some(6));
        let d: ChallengeDescriptor =
            serde_json::from_value(json!({"expected_length": 4, "labels": ["x7kq2p"]})).unwrap();
        assert_eq!(d.expected_len(), Some(4));
    }

    #[test]
    fn slide_descriptor_carries_piece_offset() {
        let body = r#"{"images": ["bg", "piece"], "height": 47}"#;
        let d = ChallengeDescriptor::from_response(200, true, body).unwrap();
        assert_eq!(d.height, Some(47.0));
        assert_eq!(d.images.get(1), Some("piece"));
    }

    #[test]
    fn failed_fetch_carries_server_message() {
        let err = ChallengeDescriptor::from_response(
            400,
            false,
            r#"{"message": "Challenge ID must be in range [1, 50]"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 400,
                message: "Challenge ID must be in range [1, 50]".into()
            }
        );
    }

    #[test]
    fn submit_request_includes_tag_only_when_set() {
        let p = NormalizedPoint::new(0.5, 0.5).unwrap();
        let req = SubmitRequest {
            id: "7".into(),
            state: StateValue::Point(Some(p)),
            variant_tag: Some("area"),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"id": "7", "state": [0.5, 0.5], "challenge_type": "area"})
        );
        let req = SubmitRequest {
            variant_tag: None,
            ..req
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"id": "7", "state": [0.5, 0.5]})
        );
    }

    #[test]
    fn ack_reads_solved_flag() {
        let ack = Ack::from_response(200, true, r#"{"solved": true, "id": 3}"#).unwrap();
        assert!(ack.ok);
        assert_eq!(ack.solved, Some(true));
        let err = Ack::from_response(500, false, r#"{"message": "boom"}"#).unwrap_err();
        assert_eq!(
            err,
            SubmitError::Status {
                status: 500,
                message: "boom".into()
            }
        );
    }
}
