//! Recursive PII detection over JSON values.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::{DEFAULT_MATCH_CONFIDENCE, PiiType, ProtectionError};

/// Path of the scanned value itself.
pub const ROOT_PATH: &str = "$";

/// Outcome of [`PiiScanner::detect_pii`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiDetectionResult {
    pub has_pii: bool,
    /// Distinct types in detection order of first appearance.
    pub pii_types: Vec<PiiType>,
    /// 0 when nothing matched, the scanner's match confidence otherwise.
    pub confidence: u8,
    /// Distinct dotted paths of the string leaves that matched.
    pub locations: Vec<String>,
}

impl PiiDetectionResult {
    pub fn contains(&self, pii_type: PiiType) -> bool {
        self.pii_types.contains(&pii_type)
    }
}

/// A matched byte range in a string leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub pii_type: PiiType,
    pub start: usize,
    pub end: usize,
}

/// Compiled PII pattern set.
///
/// Stateless after construction: `detect_pii` is pure.
#[derive(Debug, Clone)]
pub struct PiiScanner {
    patterns: Vec<(PiiType, Regex)>,
    confidence: u8,
}

impl PiiScanner {
    pub fn new() -> Result<Self, ProtectionError> {
        Self::with_confidence(DEFAULT_MATCH_CONFIDENCE)
    }

    /// Scanner reporting `confidence` (clamped to 1..=100) on a match.
    pub fn with_confidence(confidence: u8) -> Result<Self, ProtectionError> {
        let patterns = PiiType::DETECTION_ORDER
            .into_iter()
            .map(|t| Ok((t, Regex::new(t.pattern())?)))
            .collect::<Result<Vec<_>, ProtectionError>>()?;

        Ok(Self {
            patterns,
            confidence: confidence.clamp(1, 100),
        })
    }

    /// Scans every string leaf of `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use warden_compliance::pii::{PiiScanner, PiiType};
    ///
    /// let scanner = PiiScanner::new().unwrap();
    /// let result = scanner.detect_pii(&json!({
    ///     "contact": { "emails": ["jane.doe@example.com"] },
    ///     "note": "nothing here"
    /// }));
    ///
    /// assert!(result.has_pii);
    /// assert_eq!(result.pii_types, vec![PiiType::Email]);
    /// assert_eq!(result.locations, vec!["contact.emails.0"]);
    /// ```
    pub fn detect_pii(&self, value: &Value) -> PiiDetectionResult {
        let mut pii_types = Vec::new();
        let mut locations = Vec::new();
        self.visit(value, ROOT_PATH, &mut pii_types, &mut locations);

        let has_pii = !pii_types.is_empty();
        PiiDetectionResult {
            has_pii,
            pii_types,
            confidence: if has_pii { self.confidence } else { 0 },
            locations,
        }
    }

    /// Types found in a single string, in detection order.
    pub fn detect_in_text(&self, text: &str) -> Vec<PiiType> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(t, _)| *t)
            .collect()
    }

    fn visit(
        &self,
        value: &Value,
        path: &str,
        pii_types: &mut Vec<PiiType>,
        locations: &mut Vec<String>,
    ) {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
            Value::String(text) => {
                let found = self.detect_in_text(text);
                if found.is_empty() {
                    return;
                }
                for t in found {
                    if !pii_types.contains(&t) {
                        pii_types.push(t);
                    }
                }
                if !locations.iter().any(|l| l == path) {
                    locations.push(path.to_string());
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.visit(item, &child_path(path, &i.to_string()), pii_types, locations);
                }
            }
            Value::Object(fields) => {
                for (key, field) in fields {
                    self.visit(field, &child_path(path, key), pii_types, locations);
                }
            }
        }
    }

    /// Non-overlapping matches in `text`, sorted by position.
    ///
    /// Overlapping matches merge into one span covering their union, typed
    /// by whichever comes first in protection order, so no matched byte is
    /// left outside a span.
    pub(crate) fn spans(&self, text: &str) -> Vec<Span> {
        let mut found: Vec<(usize, Span)> = Vec::new();
        for (priority, pii_type) in PiiType::PROTECTION_ORDER.into_iter().enumerate() {
            let Some((_, re)) = self.patterns.iter().find(|(t, _)| *t == pii_type) else {
                continue;
            };
            found.extend(re.find_iter(text).map(|m| {
                (
                    priority,
                    Span {
                        pii_type,
                        start: m.start(),
                        end: m.end(),
                    },
                )
            }));
        }
        found.sort_by_key(|(priority, span)| (span.start, *priority));

        let mut merged: Vec<(usize, Span)> = Vec::with_capacity(found.len());
        for (priority, span) in found {
            match merged.last_mut() {
                Some((kept_priority, kept)) if span.start < kept.end => {
                    kept.end = kept.end.max(span.end);
                    if priority < *kept_priority {
                        *kept_priority = priority;
                        kept.pii_type = span.pii_type;
                    }
                }
                _ => merged.push((priority, span)),
            }
        }
        merged.into_iter().map(|(_, span)| span).collect()
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    if parent == ROOT_PATH {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}
