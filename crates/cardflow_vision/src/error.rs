use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("model {model} timed out after {timeout_secs}s")]
    Timeout { model: String, timeout_secs: u64 },
    #[error("model {model} returned unparseable output: {detail}")]
    Unparseable { model: String, detail: String },
    #[error("request to model {model} failed")]
    Transport {
        model: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("no model in the chain produced a parseable result")]
    ChainExhausted,
}
