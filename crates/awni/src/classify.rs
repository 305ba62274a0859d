//! Priority classification for incoming request text.
//!
//! Classification is the one place where an external, possibly failing
//! capability is isolated behind a total function: [`classify_or_default`]
//! never fails, substituting a fixed `medium` classification when the
//! underlying classifier errors out. Request creation relies on that
//! boundary and never fails solely due to classifier unavailability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::request::PriorityLevel;

/// Reason string attached when classification falls back to the default.
pub const FALLBACK_REASON: &str = "could not auto-determine priority; defaulted";

/// Outcome of classifying a request description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The assigned urgency level.
    pub priority: PriorityLevel,
    /// Free-text rationale for the level.
    pub reason: String,
}

impl Classification {
    /// The fixed fallback classification used when the external capability
    /// fails, times out, or produces an unusable answer.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            priority: PriorityLevel::Medium,
            reason: FALLBACK_REASON.to_string(),
        }
    }
}

/// A text-classification capability producing a priority label.
///
/// Implementations may fail; callers on the request-creation path must go
/// through [`classify_or_default`] instead of propagating those failures.
#[async_trait]
pub trait PriorityClassifier: Send + Sync {
    /// Classify free-text request content into a priority level.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability is unavailable or the input is
    /// unusable.
    async fn classify(&self, request_text: &str) -> Result<Classification>;
}

/// Classify with the fixed fallback on any failure.
///
/// Total by construction: a classifier error is logged at WARN and replaced
/// with [`Classification::fallback`].
pub async fn classify_or_default(
    classifier: &dyn PriorityClassifier,
    request_text: &str,
) -> Classification {
    match classifier.classify(request_text).await {
        Ok(classification) => classification,
        Err(e) => {
            warn!("Priority classification failed, using default: {}", e);
            Classification::fallback()
        }
    }
}

/// Built-in keyword tables. Arabic terms first; the narratives this system
/// triages are predominantly Arabic.
fn builtin_critical_keywords() -> Vec<String> {
    [
        "نزيف", "اختناق", "حريق", "غرق", "إطلاق نار", "انهيار", "ولادة", "فاقد الوعي",
        "bleeding", "unconscious", "fire", "drowning", "gunfire", "trapped", "collapsed",
        "not breathing",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn builtin_high_keywords() -> Vec<String> {
    [
        "إصابة", "مريض", "دواء", "حمى", "كسر", "عالق", "إجلاء",
        "injury", "injured", "sick", "medicine", "fever", "fracture", "evacuate", "stranded",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn builtin_low_keywords() -> Vec<String> {
    [
        "ملابس", "بطانية", "معلومات", "استفسار",
        "clothes", "blanket", "blankets", "information", "question",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Deterministic keyword-based classifier.
///
/// Scans the request text for known emergency terms, most urgent table
/// first, and reports the matched keyword in the reason. Text matching no
/// table classifies as `medium`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    critical: Vec<String>,
    high: Vec<String>,
    low: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    /// Create a classifier with the built-in keyword tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            critical: builtin_critical_keywords(),
            high: builtin_high_keywords(),
            low: builtin_low_keywords(),
        }
    }

    /// Extend the critical and high tables with deployment-specific terms.
    #[must_use]
    pub fn with_extra_keywords(mut self, critical: &[String], high: &[String]) -> Self {
        self.critical.extend(critical.iter().cloned());
        self.high.extend(high.iter().cloned());
        self
    }

    fn find_keyword<'a>(text: &str, table: &'a [String]) -> Option<&'a str> {
        table
            .iter()
            .map(String::as_str)
            .find(|keyword| text.contains(&keyword.to_lowercase()))
    }
}

#[async_trait]
impl PriorityClassifier for KeywordClassifier {
    async fn classify(&self, request_text: &str) -> Result<Classification> {
        let text = request_text.trim().to_lowercase();
        if text.is_empty() {
            return Err(Error::classifier("request text is empty"));
        }

        let tables = [
            (PriorityLevel::Critical, &self.critical),
            (PriorityLevel::High, &self.high),
            (PriorityLevel::Low, &self.low),
        ];
        for (priority, table) in tables {
            if let Some(keyword) = Self::find_keyword(&text, table) {
                return Ok(Classification {
                    priority,
                    reason: format!("matched urgency keyword \"{keyword}\""),
                });
            }
        }

        Ok(Classification {
            priority: PriorityLevel::Medium,
            reason: "no urgency keywords matched".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A classifier that always fails, for exercising the fallback boundary.
    #[derive(Debug)]
    pub struct FailingClassifier;

    #[async_trait]
    impl PriorityClassifier for FailingClassifier {
        async fn classify(&self, _request_text: &str) -> Result<Classification> {
            Err(Error::classifier("upstream unavailable"))
        }
    }

    #[tokio::test]
    async fn test_critical_keyword_wins() {
        let classifier = KeywordClassifier::new();
        let result = classifier
            .classify("heavy bleeding after the building collapsed")
            .await
            .unwrap();
        assert_eq!(result.priority, PriorityLevel::Critical);
        assert!(result.reason.contains("bleeding") || result.reason.contains("collapsed"));
    }

    #[tokio::test]
    async fn test_arabic_keywords() {
        let classifier = KeywordClassifier::new();
        let result = classifier.classify("يوجد حريق في المنزل المجاور").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::Critical);

        let result = classifier.classify("نحتاج دواء للأطفال").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::High);
    }

    #[tokio::test]
    async fn test_high_and_low_tables() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("my brother is injured").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::High);

        let result = classifier.classify("we could use blankets").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::Low);
    }

    #[tokio::test]
    async fn test_no_keyword_is_medium() {
        let classifier = KeywordClassifier::new();
        let result = classifier
            .classify("please check on my neighbours")
            .await
            .unwrap();
        assert_eq!(result.priority, PriorityLevel::Medium);
        assert_eq!(result.reason, "no urgency keywords matched");
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let classifier = KeywordClassifier::new();
        let result = classifier.classify("FIRE spreading fast").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::Critical);
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let classifier = KeywordClassifier::new();
        assert!(classifier.classify("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_extra_keywords() {
        let classifier = KeywordClassifier::new()
            .with_extra_keywords(&["landslide".to_string()], &["roadblock".to_string()]);

        let result = classifier.classify("landslide near the village").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::Critical);

        let result = classifier.classify("roadblock on the way out").await.unwrap();
        assert_eq!(result.priority, PriorityLevel::High);
    }

    #[tokio::test]
    async fn test_classify_or_default_passes_success_through() {
        let classifier = KeywordClassifier::new();
        let result = classify_or_default(&classifier, "fire in the market").await;
        assert_eq!(result.priority, PriorityLevel::Critical);
    }

    #[tokio::test]
    async fn test_classify_or_default_never_fails() {
        let result = classify_or_default(&FailingClassifier, "anything at all").await;
        assert_eq!(result.priority, PriorityLevel::Medium);
        assert_eq!(result.reason, FALLBACK_REASON);
    }

    #[test]
    fn test_fallback_classification() {
        let fallback = Classification::fallback();
        assert_eq!(fallback.priority, PriorityLevel::Medium);
        assert_eq!(fallback.reason, FALLBACK_REASON);
    }
}
