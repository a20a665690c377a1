use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hosted inference base used when no override is configured.
pub const DEFAULT_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

/// The remote zero-shot models offered by the model selector.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize, Serialize)]
pub enum Model {
    #[default]
    #[serde(rename = "distil-bart")]
    DistilBart,
    #[serde(rename = "bart-large")]
    BartLarge,
    #[serde(rename = "deberta-v3")]
    DebertaV3,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::DistilBart, Model::BartLarge, Model::DebertaV3];

    /// Identifier used in form values and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Model::DistilBart => "distil-bart",
            Model::BartLarge => "bart-large",
            Model::DebertaV3 => "deberta-v3",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Model::DistilBart => "distil-bart",
            Model::BartLarge => "bart-large",
            Model::DebertaV3 => "DeBERTa-v3",
        }
    }

    /// Repository path of the model on the hosting service.
    pub fn repo_path(&self) -> &'static str {
        match self {
            Model::DistilBart => "valhalla/distilbart-mnli-12-3",
            Model::BartLarge => "facebook/bart-large-mnli",
            Model::DebertaV3 => "MoritzLaurer/DeBERTa-v3-base-mnli-fever-anli",
        }
    }

    pub fn endpoint(&self) -> String {
        self.endpoint_with_base(DEFAULT_INFERENCE_BASE)
    }

    pub fn endpoint_with_base(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.repo_path())
    }

    pub fn model_card_url(&self) -> String {
        format!("https://huggingface.co/{}", self.repo_path())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown model {:?}; expected one of distil-bart, bart-large, deberta-v3",
            self.0
        )
    }
}

impl std::error::Error for UnknownModel {}

impl FromStr for Model {
    type Err = UnknownModel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Model::ALL
            .into_iter()
            .find(|model| {
                model.key().eq_ignore_ascii_case(needle)
                    || model.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownModel(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_maps_to_a_hosted_endpoint() {
        assert_eq!(
            Model::DistilBart.endpoint(),
            "https://api-inference.huggingface.co/models/valhalla/distilbart-mnli-12-3"
        );
        assert_eq!(
            Model::BartLarge.endpoint(),
            "https://api-inference.huggingface.co/models/facebook/bart-large-mnli"
        );
        assert_eq!(
            Model::DebertaV3.endpoint(),
            "https://api-inference.huggingface.co/models/MoritzLaurer/DeBERTa-v3-base-mnli-fever-anli"
        );
    }

    #[test]
    fn endpoint_base_trailing_slash_is_ignored() {
        assert_eq!(
            Model::BartLarge.endpoint_with_base("http://127.0.0.1:9000/models/"),
            "http://127.0.0.1:9000/models/facebook/bart-large-mnli"
        );
    }

    #[test]
    fn parses_keys_and_display_names() {
        assert_eq!("deberta-v3".parse::<Model>(), Ok(Model::DebertaV3));
        assert_eq!("DeBERTa-V3".parse::<Model>(), Ok(Model::DebertaV3));
        assert_eq!(" bart-large ".parse::<Model>(), Ok(Model::BartLarge));
        assert!("gpt".parse::<Model>().is_err());
    }
}
