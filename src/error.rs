use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "value formatter returned an empty string for {value}; use axis item placement, not empty labels, to control which values are labeled"
    )]
    EmptyFormattedLabel { value: f64 },

    #[error("layer dimensions are frozen for the current drawing pass")]
    DimensionsFrozen,

    #[error("`{operation}` is not allowed while the chart is {phase}")]
    InvalidRenderPhase {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("layer {layer_index} expects a model of type `{expected}`")]
    ModelMismatch {
        layer_index: usize,
        expected: &'static str,
    },

    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}
