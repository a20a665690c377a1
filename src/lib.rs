pub mod inference;
pub mod keyphrases;
pub mod model;
pub mod results;
pub mod session;
pub mod validation;
#[cfg(feature = "web")]
pub mod web;

pub use inference::{Classifier, HttpClassifier, InferenceResult, classify_batch};
pub use keyphrases::{KeyphraseBatch, Mode, collate_keyphrases, parse_labels};
pub use model::Model;
pub use results::{BatchError, ResultTable, TableView};
pub use validation::{ClassificationRequest, InputError, Submission, validate};

use std::fmt;
use tracing::warn;

/// Why a submission produced no table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ClassificationError {
    Input(InputError),
    Batch(BatchError),
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationError::Input(err) => write!(f, "{err}"),
            ClassificationError::Batch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ClassificationError {}

impl From<InputError> for ClassificationError {
    fn from(value: InputError) -> Self {
        ClassificationError::Input(value)
    }
}

impl From<BatchError> for ClassificationError {
    fn from(value: BatchError) -> Self {
        ClassificationError::Batch(value)
    }
}

/// A classified batch plus the cap notice, if keyphrases were dropped.
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub table: ResultTable,
    pub notice: Option<String>,
}

/// Validates the submission, then classifies every keyphrase sequentially.
/// Input errors are returned before any request is made.
pub async fn run_classification(
    classifier: &dyn Classifier,
    submission: &Submission,
    demo_token: Option<&str>,
) -> Result<ClassificationOutcome, ClassificationError> {
    let request = validate(submission, demo_token).inspect_err(|err| {
        warn!(reason = %err, "submission rejected");
    })?;
    let notice = request.keyphrases.cap_notice();
    let results = classify_batch(classifier, &request).await;
    let table = ResultTable::from_results(results).inspect_err(|err| {
        warn!(detail = %err.detail(), "classification batch discarded");
    })?;
    Ok(ClassificationOutcome { table, notice })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::inference::{Classifier, ClassifyFuture, InferencePayload, InferenceResult};
    use crate::model::Model;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores the first label 0.8 and the rest evenly, counting calls.
    /// Inputs containing `fail` produce an error row.
    #[derive(Default)]
    pub struct FakeClassifier {
        pub calls: AtomicUsize,
    }

    impl FakeClassifier {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Classifier for FakeClassifier {
        fn classify<'a>(
            &'a self,
            _model: Model,
            _api_key: &'a str,
            payload: InferencePayload<'a>,
        ) -> ClassifyFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let labels = payload.parameters.candidate_labels.to_vec();
            let input = payload.inputs.to_string();
            Box::pin(async move {
                if input.contains("fail") {
                    return InferenceResult::failure("Model is currently loading");
                }
                let rest = if labels.len() > 1 {
                    0.2 / (labels.len() - 1) as f64
                } else {
                    0.0
                };
                let scores = (0..labels.len())
                    .map(|i| if i == 0 { 0.8 } else { rest })
                    .collect();
                InferenceResult::Success {
                    sequence: input,
                    labels,
                    scores,
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClassifier;

    fn submission(labels: &[&str], text: &str) -> Submission {
        Submission {
            mode: Mode::Demo,
            api_key: String::new(),
            model: Model::DistilBart,
            labels: labels.iter().map(|label| label.to_string()).collect(),
            keyphrase_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_keyphrases_issue_a_single_call() {
        let classifier = FakeClassifier::default();
        let outcome = run_classification(
            &classifier,
            &submission(&["Positive", "Negative"], "I love this\nI love this\n"),
            Some("hf_demo"),
        )
        .await
        .unwrap();
        assert_eq!(classifier.calls(), 1);
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(outcome.table.rows[0].keyphrase, "I love this");
        assert_eq!(outcome.table.rows[0].scores, vec!["80.00%", "20.00%"]);
        assert!(outcome.notice.is_none());
    }

    #[tokio::test]
    async fn input_errors_never_reach_the_classifier() {
        let classifier = FakeClassifier::default();
        for (labels, text) in [(vec!["Positive"], "a"), (vec![], "a"), (vec!["a", "b"], "")] {
            let err = run_classification(&classifier, &submission(&labels, text), Some("k"))
                .await
                .unwrap_err();
            assert!(matches!(err, ClassificationError::Input(_)));
        }
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn newline_only_text_is_an_empty_batch() {
        let classifier = FakeClassifier::default();
        let err = run_classification(&classifier, &submission(&["a", "b"], "\n\n"), Some("k"))
            .await
            .unwrap_err();
        assert_eq!(err, ClassificationError::Batch(BatchError::Empty));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn one_failed_row_discards_the_batch() {
        let classifier = FakeClassifier::default();
        let err = run_classification(
            &classifier,
            &submission(&["a", "b"], "fine\nthis will fail\nalso fine"),
            Some("k"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClassificationError::Batch(BatchError::UnusableRows { failed: 1, .. })));
        assert_eq!(classifier.calls(), 3);
    }

    #[tokio::test]
    async fn cap_notice_is_reported_with_results() {
        let classifier = FakeClassifier::default();
        let text = (0..7).map(|i| format!("p{i}")).collect::<Vec<_>>().join("\n");
        let outcome = run_classification(&classifier, &submission(&["a", "b", "c"], &text), Some("k"))
            .await
            .unwrap();
        assert_eq!(classifier.calls(), 5);
        assert_eq!(outcome.table.len(), 5);
        assert_eq!(outcome.table.rows[0].scores, vec!["80.00%", "10.00%", "10.00%"]);
        assert!(outcome.notice.unwrap().contains("Only the first 5"));
    }
}
