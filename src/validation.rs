use crate::keyphrases::{KeyphraseBatch, MIN_LABELS, Mode, collate_keyphrases};
use crate::model::Model;
use std::fmt;

/// Default value of the unlocked-mode key field; never a usable key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR-HF-API-KEY";

/// All form fields as submitted together.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub mode: Mode,
    pub api_key: String,
    pub model: Model,
    pub labels: Vec<String>,
    pub keyphrase_text: String,
}

/// A submission that passed every check and is ready for inference.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub model: Model,
    pub api_key: String,
    pub labels: Vec<String>,
    pub keyphrases: KeyphraseBatch,
}

/// Rejections raised before any network traffic.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputError {
    NoKeyphrases,
    NoLabels,
    SingleLabel,
    MissingApiKey,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NoKeyphrases => write!(f, "There are no keyphrases to classify"),
            InputError::NoLabels => write!(f, "You have not added any labels, please add some!"),
            InputError::SingleLabel => write!(
                f,
                "Please make sure to add at least two labels for classification"
            ),
            InputError::MissingApiKey => write!(
                f,
                "Please make sure to add your personal API key for the 'unlocked mode' or use 'demo mode'"
            ),
        }
    }
}

impl std::error::Error for InputError {}

/// Resolves the credential for the submission's mode. Blank values and the
/// field placeholder resolve to nothing.
pub fn resolve_api_key(mode: Mode, entered: &str, demo_token: Option<&str>) -> Option<String> {
    let candidate = match mode {
        Mode::Demo => demo_token?,
        Mode::Unlocked => entered,
    };
    let trimmed = candidate.trim();
    if trimmed.is_empty() || trimmed == API_KEY_PLACEHOLDER {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Runs the ordered checks; the first failing check is the only one reported.
pub fn validate(
    submission: &Submission,
    demo_token: Option<&str>,
) -> Result<ClassificationRequest, InputError> {
    if submission.keyphrase_text.is_empty() {
        return Err(InputError::NoKeyphrases);
    }
    match submission.labels.len() {
        0 => return Err(InputError::NoLabels),
        n if n < MIN_LABELS => return Err(InputError::SingleLabel),
        _ => {}
    }
    let api_key = resolve_api_key(submission.mode, &submission.api_key, demo_token)
        .ok_or(InputError::MissingApiKey)?;
    Ok(ClassificationRequest {
        model: submission.model,
        api_key,
        labels: submission.labels.clone(),
        keyphrases: collate_keyphrases(&submission.keyphrase_text, submission.mode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(labels: &[&str], text: &str) -> Submission {
        Submission {
            mode: Mode::Demo,
            api_key: String::new(),
            model: Model::DistilBart,
            labels: labels.iter().map(|label| label.to_string()).collect(),
            keyphrase_text: text.to_string(),
        }
    }

    #[test]
    fn empty_text_is_reported_before_labels() {
        let err = validate(&submission(&[], ""), Some("token")).unwrap_err();
        assert_eq!(err, InputError::NoKeyphrases);
    }

    #[test]
    fn label_count_checks_run_in_order() {
        let err = validate(&submission(&[], "a"), Some("token")).unwrap_err();
        assert_eq!(err, InputError::NoLabels);
        let err = validate(&submission(&["Positive"], "a"), None).unwrap_err();
        assert_eq!(err, InputError::SingleLabel);
    }

    #[test]
    fn demo_mode_without_secret_is_missing_key() {
        let err = validate(&submission(&["a", "b"], "x"), None).unwrap_err();
        assert_eq!(err, InputError::MissingApiKey);
    }

    #[test]
    fn unlocked_placeholder_and_blank_keys_are_rejected() {
        let mut sub = submission(&["a", "b"], "x");
        sub.mode = Mode::Unlocked;
        sub.api_key = API_KEY_PLACEHOLDER.to_string();
        assert_eq!(
            validate(&sub, Some("demo")).unwrap_err(),
            InputError::MissingApiKey
        );
        sub.api_key = "   ".to_string();
        assert_eq!(
            validate(&sub, Some("demo")).unwrap_err(),
            InputError::MissingApiKey
        );
        sub.api_key = "hf_user".to_string();
        assert_eq!(validate(&sub, Some("demo")).unwrap().api_key, "hf_user");
    }

    #[test]
    fn valid_demo_submission_collates_keyphrases() {
        let sub = submission(&["Positive", "Negative"], "I love this\nI love this\n");
        let request = validate(&sub, Some("hf_demo")).unwrap();
        assert_eq!(request.api_key, "hf_demo");
        assert_eq!(request.keyphrases.phrases, vec!["I love this"]);
        assert_eq!(request.labels, vec!["Positive", "Negative"]);
    }

    #[test]
    fn warnings_are_user_facing_sentences() {
        assert_eq!(
            InputError::SingleLabel.to_string(),
            "Please make sure to add at least two labels for classification"
        );
    }
}
