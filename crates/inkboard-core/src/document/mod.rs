//! Forward-compatible persisted document.
//!
//! A document is a version number plus a list of envelopes. Each envelope
//! carries a type tag and an opaque payload (a JSON-encoded DTO, base64 in
//! the outer JSON). Readers that do not recognise a tag can skip the entry,
//! or keep its bytes and write them back untouched.

mod dto;

pub use dto::{PenStyleDto, PointDto, StampDto, StampStyleDto, StrokeDto};

use crate::elements::{Element, ElementId};
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Version written by [`Document::from_elements`].
pub const DOCUMENT_VERSION: u32 = 2;

pub const STROKE_TYPE: &str = "stroke";
pub const STAMP_TYPE: &str = "stamp";

/// A type-tagged opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "base64_payload")]
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Wrap an element in an envelope.
    pub fn from_element(element: &Element) -> Result<Self, DocumentError> {
        let (kind, payload) = match element {
            Element::Stroke(s) => (STROKE_TYPE, serde_json::to_vec(&StrokeDto::from(s))),
            Element::Stamp(s) => (STAMP_TYPE, serde_json::to_vec(&StampDto::from(s))),
        };
        let payload = payload.map_err(|source| DocumentError::Encoding { kind, source })?;
        Ok(Self::new(kind, payload))
    }

    /// Reconstruct the element carried by this envelope.
    pub fn to_element(&self) -> Result<Element, DroppedEntry> {
        match self.kind.as_str() {
            STROKE_TYPE => serde_json::from_slice::<StrokeDto>(&self.payload)
                .map(|dto| Element::Stroke(dto.into_model()))
                .map_err(DroppedEntry::Payload),
            STAMP_TYPE => serde_json::from_slice::<StampDto>(&self.payload)
                .map(|dto| Element::Stamp(dto.into_model()))
                .map_err(DroppedEntry::Payload),
            other => Err(DroppedEntry::UnknownType(other.to_string())),
        }
    }
}

/// Why an envelope could not be turned into an element.
///
/// These never abort an import. They are logged and counted.
#[derive(Debug, Error)]
pub enum DroppedEntry {
    #[error("unknown element type {0:?}")]
    UnknownType(String),
    #[error("undecodable payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// The persisted drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub elements: Vec<Envelope>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            elements: Vec::new(),
        }
    }
}

/// An envelope that could not be reconstructed, pinned to its z-order slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedEnvelope {
    /// Last decodable element before this envelope, or `None` if it came
    /// before every decodable element.
    pub after: Option<ElementId>,
    pub envelope: Envelope,
}

/// Result of decoding a document's envelopes.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    /// Reconstructed elements in document order.
    pub elements: Vec<Element>,
    /// Envelopes that could not be reconstructed, in document order.
    pub unresolved: Vec<RetainedEnvelope>,
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Elements now on the canvas.
    pub imported: usize,
    /// Undecodable envelopes kept for re-export.
    pub retained: usize,
    /// Undecodable envelopes discarded.
    pub dropped: usize,
}

impl Document {
    /// Build a document from live elements, interleaving retained envelopes.
    ///
    /// Each retained envelope is written right after the element it was
    /// anchored to. Envelopes whose anchor is no longer present go last.
    pub fn from_elements<'a>(
        elements: impl IntoIterator<Item = &'a Element>,
        retained: &[RetainedEnvelope],
    ) -> Result<Self, DocumentError> {
        let mut anchored: HashMap<Option<ElementId>, Vec<&Envelope>> = HashMap::new();
        for r in retained {
            anchored.entry(r.after).or_default().push(&r.envelope);
        }

        let mut envelopes: Vec<Envelope> = anchored
            .remove(&None)
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        for element in elements {
            envelopes.push(Envelope::from_element(element)?);
            if let Some(following) = anchored.remove(&Some(element.id())) {
                envelopes.extend(following.into_iter().cloned());
            }
        }
        // Orphans keep their relative order.
        envelopes.extend(
            retained
                .iter()
                .filter(|r| anchored.contains_key(&r.after))
                .map(|r| r.envelope.clone()),
        );

        Ok(Self {
            version: DOCUMENT_VERSION,
            elements: envelopes,
        })
    }

    /// Decode every envelope, isolating per-entry failures.
    ///
    /// An element whose id repeats an earlier one is given a fresh id so the
    /// canvas never holds duplicates.
    pub fn decode(&self) -> DecodedDocument {
        let mut decoded = DecodedDocument::default();
        let mut seen: HashSet<ElementId> = HashSet::new();
        let mut last_id = None;
        for envelope in &self.elements {
            match envelope.to_element() {
                Ok(mut element) => {
                    if !seen.insert(element.id()) {
                        log::warn!("Duplicate element id {}, assigning a new one", element.id());
                        reassign_id(&mut element);
                        seen.insert(element.id());
                    }
                    last_id = Some(element.id());
                    decoded.elements.push(element);
                }
                Err(reason) => {
                    log::warn!("Skipping {:?} envelope: {}", envelope.kind, reason);
                    decoded.unresolved.push(RetainedEnvelope {
                        after: last_id,
                        envelope: envelope.clone(),
                    });
                }
            }
        }
        decoded
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Parse the outer document. Fails only if the overall shape is wrong.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(DocumentError::Format)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        serde_json::from_slice(bytes).map_err(DocumentError::Format)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn reassign_id(element: &mut Element) {
    let id = uuid::Uuid::new_v4();
    match element {
        Element::Stroke(s) => s.id = id,
        Element::Stamp(s) => s.id = id,
    }
}

/// Serde adapter storing bytes as standard base64 with padding.
mod base64_payload {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{PenStyle, Rgba, Stamp, StampKind, StampStyle, Stroke};
    use kurbo::Point;

    fn sample() -> Vec<Element> {
        vec![
            Element::Stroke(Stroke::new(
                vec![Point::new(0.0, 0.0), Point::new(10.5, -3.25)],
                PenStyle::new(Rgba::new(0.1, 0.2, 0.3, 0.9), 6.0, 0.5),
            )),
            Element::Stamp(Stamp::new(
                StampKind::Cross,
                Point::new(40.0, 40.0),
                StampStyle::default(),
            )),
        ]
    }

    #[test]
    fn test_export_shape() {
        let doc = Document::from_elements(&sample(), &[]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 2);
        assert_eq!(json["elements"][0]["type"], "stroke");
        assert_eq!(json["elements"][1]["type"], "stamp");
        assert!(json["elements"][0]["payload"].is_string());
    }

    #[test]
    fn test_roundtrip_preserves_elements() {
        let elements = sample();
        let doc = Document::from_elements(&elements, &[]).unwrap();
        let parsed = Document::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        let decoded = parsed.decode();
        assert_eq!(decoded.elements, elements);
        assert!(decoded.unresolved.is_empty());
    }

    #[test]
    fn test_payload_is_base64_dto() {
        let elements = sample();
        let envelope = Envelope::from_element(&elements[1]).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        let encoded = json["payload"].as_str().unwrap();
        use base64::Engine;
        let raw = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        let dto: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(dto["kind"], "cross");
        assert_eq!(dto["center"]["x"], 40.0);
        assert_eq!(dto["style"]["size"], 36.0);
    }

    #[test]
    fn test_unknown_and_bad_entries_isolated() {
        let mut doc = Document::from_elements(&sample(), &[]).unwrap();
        doc.elements.push(Envelope::new("future-type", b"{\"anything\":1}".to_vec()));
        doc.elements.push(Envelope::new(STROKE_TYPE, b"not json".to_vec()));
        let decoded = doc.decode();
        assert_eq!(decoded.elements.len(), 2);
        assert_eq!(decoded.unresolved.len(), 2);
        assert_eq!(decoded.unresolved[0].envelope.kind, "future-type");
        assert_eq!(decoded.unresolved[0].after, Some(decoded.elements[1].id()));
    }

    #[test]
    fn test_duplicate_ids_reassigned() {
        let elements = sample();
        let doc = Document::from_elements([&elements[0], &elements[0]], &[]).unwrap();
        let decoded = doc.decode();
        assert_eq!(decoded.elements.len(), 2);
        assert_ne!(decoded.elements[0].id(), decoded.elements[1].id());
        assert_eq!(decoded.elements[0].id(), elements[0].id());
    }

    #[test]
    fn test_wrong_shape_is_format_error() {
        assert!(matches!(
            Document::from_json(r#"{"elements": "nope"}"#),
            Err(DocumentError::Format(_))
        ));
        assert!(matches!(
            Document::from_json(r#"{"version": 2, "elements": [{"type": "stroke", "payload": "%%%"}]}"#),
            Err(DocumentError::Format(_))
        ));
    }

    #[test]
    fn test_retained_keep_position() {
        let elements = sample();
        let unknown = |n: u8| Envelope::new("future-type", vec![n]);
        let retained = vec![
            RetainedEnvelope { after: None, envelope: unknown(0) },
            RetainedEnvelope { after: Some(elements[0].id()), envelope: unknown(1) },
            RetainedEnvelope { after: Some(elements[0].id()), envelope: unknown(2) },
        ];
        let doc = Document::from_elements(&elements, &retained).unwrap();
        let kinds: Vec<&str> = doc.elements.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, ["future-type", "stroke", "future-type", "future-type", "stamp"]);
        assert_eq!(doc.elements[2], unknown(1));
        assert_eq!(doc.elements[3], unknown(2));

        // Decoding the written document yields the same anchors.
        assert_eq!(doc.decode().unresolved, retained);
    }

    #[test]
    fn test_orphaned_retained_go_last() {
        let elements = sample();
        let gone = uuid::Uuid::new_v4();
        let retained = vec![
            RetainedEnvelope { after: Some(gone), envelope: Envelope::new("a", vec![1]) },
            RetainedEnvelope { after: Some(elements[0].id()), envelope: Envelope::new("b", vec![2]) },
            RetainedEnvelope { after: Some(gone), envelope: Envelope::new("c", vec![3]) },
        ];
        let doc = Document::from_elements(&elements, &retained).unwrap();
        let kinds: Vec<&str> = doc.elements.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, ["stroke", "b", "stamp", "a", "c"]);
    }
}
