//! Cartesian layers: the measurement, transition and drawing units a chart is
//! composed of.
//!
//! Every layer goes through the same pipeline for each model it is given:
//! contribute to the shared ranges, negotiate dimensions, optionally stage
//! and interpolate a transition, then draw and publish marker targets.

pub mod candlestick;
pub mod column;
pub mod context;
pub mod line;
pub mod point_connector;
pub mod staging;

use std::any::type_name;
use std::fmt;

use tracing::trace;

use crate::core::{
    CartesianLayerModel, ChartRanges, ExtraStore, MutableChartRanges, MutableLayerDimensions,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::MarkerTargets;

pub use candlestick::{
    CandleEntry, CandleGeometry, CandleStyle, CandlestickLayer, CandlestickLayerConfig,
    project_candles,
};
pub use column::{
    ColumnEntry, ColumnLayer, ColumnLayerConfig, ColumnStyle, DataLabelStyle, MergeMode,
};
pub use context::{CoordinateMapper, DrawingContext, MeasuringContext};
pub use line::{LineLayer, LineLayerConfig, LinePointEntry, LineStyle};
pub use point_connector::PointConnector;
pub use staging::{LayerTransition, TransitionStage};

/// A layer typed by the model it draws.
pub trait CartesianLayer: fmt::Debug + Send {
    type Model: CartesianLayerModel;

    /// Folds the model's extrema into the shared ranges. Only called for
    /// non-empty models.
    fn update_chart_ranges(
        &self,
        ranges: &mut MutableChartRanges,
        model: &Self::Model,
    ) -> ChartResult<()>;

    /// Raises the shared dimensions to what this layer needs.
    fn update_dimensions(
        &self,
        context: &MeasuringContext<'_>,
        dimensions: &mut MutableLayerDimensions,
        model: Option<&Self::Model>,
    ) -> ChartResult<()>;

    /// Stages a transition from the visible state to `model`.
    fn prepare_for_transformation(
        &self,
        model: Option<&Self::Model>,
        ranges: &ChartRanges,
        extra_store: &mut ExtraStore,
    );

    /// Stores the interpolated snapshot for `fraction`.
    fn transform(&self, extra_store: &mut ExtraStore, fraction: f64);

    fn draw(
        &mut self,
        context: &mut DrawingContext<'_>,
        model: Option<&Self::Model>,
    ) -> ChartResult<()>;

    /// Targets published by the last `draw`.
    fn marker_targets(&self) -> &MarkerTargets;
}

/// Object-safe view of a [`CartesianLayer`] that accepts any model and
/// reports a mismatch instead of drawing the wrong type.
pub trait AnyCartesianLayer: fmt::Debug + Send {
    fn update_chart_ranges(
        &self,
        ranges: &mut MutableChartRanges,
        model: Option<&dyn CartesianLayerModel>,
        layer_index: usize,
    ) -> ChartResult<()>;

    fn update_dimensions(
        &self,
        context: &MeasuringContext<'_>,
        dimensions: &mut MutableLayerDimensions,
        model: Option<&dyn CartesianLayerModel>,
        layer_index: usize,
    ) -> ChartResult<()>;

    fn prepare_for_transformation(
        &self,
        model: Option<&dyn CartesianLayerModel>,
        ranges: &ChartRanges,
        extra_store: &mut ExtraStore,
        layer_index: usize,
    ) -> ChartResult<()>;

    fn transform(&self, extra_store: &mut ExtraStore, fraction: f64);

    fn draw(
        &mut self,
        context: &mut DrawingContext<'_>,
        model: Option<&dyn CartesianLayerModel>,
        layer_index: usize,
    ) -> ChartResult<()>;

    fn marker_targets(&self) -> &MarkerTargets;
}

fn downcast_model<M: CartesianLayerModel>(
    model: Option<&dyn CartesianLayerModel>,
    layer_index: usize,
) -> ChartResult<Option<&M>> {
    match model {
        None => Ok(None),
        Some(model) => model
            .as_any()
            .downcast_ref::<M>()
            .map(Some)
            .ok_or(ChartError::ModelMismatch {
                layer_index,
                expected: type_name::<M>(),
            }),
    }
}

impl<L: CartesianLayer> AnyCartesianLayer for L {
    fn update_chart_ranges(
        &self,
        ranges: &mut MutableChartRanges,
        model: Option<&dyn CartesianLayerModel>,
        layer_index: usize,
    ) -> ChartResult<()> {
        match downcast_model::<L::Model>(model, layer_index)? {
            Some(model) if !model.is_empty() => {
                CartesianLayer::update_chart_ranges(self, ranges, model)
            }
            _ => {
                trace!(layer_index, "layer has no data; skipping range contribution");
                Ok(())
            }
        }
    }

    fn update_dimensions(
        &self,
        context: &MeasuringContext<'_>,
        dimensions: &mut MutableLayerDimensions,
        model: Option<&dyn CartesianLayerModel>,
        layer_index: usize,
    ) -> ChartResult<()> {
        let model = downcast_model::<L::Model>(model, layer_index)?;
        CartesianLayer::update_dimensions(self, context, dimensions, model)
    }

    fn prepare_for_transformation(
        &self,
        model: Option<&dyn CartesianLayerModel>,
        ranges: &ChartRanges,
        extra_store: &mut ExtraStore,
        layer_index: usize,
    ) -> ChartResult<()> {
        let model = downcast_model::<L::Model>(model, layer_index)?;
        CartesianLayer::prepare_for_transformation(self, model, ranges, extra_store);
        Ok(())
    }

    fn transform(&self, extra_store: &mut ExtraStore, fraction: f64) {
        CartesianLayer::transform(self, extra_store, fraction);
    }

    fn draw(
        &mut self,
        context: &mut DrawingContext<'_>,
        model: Option<&dyn CartesianLayerModel>,
        layer_index: usize,
    ) -> ChartResult<()> {
        let model = downcast_model::<L::Model>(model, layer_index)?;
        CartesianLayer::draw(self, context, model)
    }

    fn marker_targets(&self) -> &MarkerTargets {
        CartesianLayer::marker_targets(self)
    }
}
