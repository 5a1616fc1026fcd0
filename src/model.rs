use crate::document::{ParameterValue, Scalar, ScalarType};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum Model {
    // Claude 3.5 models (latest)
    #[strum(to_string = "claude-3-5-sonnet-latest")]
    Claude35SonnetLatest,
    #[strum(to_string = "claude-3-5-haiku-latest")]
    Claude35HaikuLatest,

    // Claude 3 models
    #[strum(to_string = "claude-3-opus-latest")]
    Claude3OpusLatest,
    #[strum(to_string = "claude-3-haiku-20240307")]
    Claude3Haiku20240307,

    // Legacy completion-era models
    #[strum(to_string = "claude-2.1")]
    Claude21,
    #[strum(to_string = "claude-v1")]
    ClaudeV1,
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.to_string()
    }
}

impl From<Model> for Scalar {
    fn from(model: Model) -> Self {
        Scalar::String(model.to_string())
    }
}

impl ParameterValue for Model {
    const TYPE: ScalarType = ScalarType::String;
}
