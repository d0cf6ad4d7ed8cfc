pub mod cache_store;
pub mod dimensions;
pub mod drawing_model;
pub mod extra_store;
pub mod formatter;
pub mod interpolator;
pub mod model;
pub mod primitives;
pub mod ranges;
pub mod remember;
pub mod types;
pub mod units;

pub use cache_store::{CacheKey, CacheKeyPart, CacheStore, CacheStoreStats};
pub use dimensions::{LayerDimensions, MutableLayerDimensions};
pub use drawing_model::{DrawingModel, DrawingModelEntry, EntityKey};
pub use extra_store::{ExtraKey, ExtraStore};
pub use formatter::{
    DecimalFormatter, LabelLocale, PercentFormatter, UtcDateTimeFormatter, ValueFormatter,
    estimate_label_width_px, format_for_axis,
};
pub use interpolator::{
    DrawingModelInterpolator, InterpolatedDrawingModel, LinearDrawingModelInterpolator,
};
pub use model::{
    CandleKind, CandlestickLayerModel, CartesianLayerModel, ChartModel, ChartModelBuilder,
    ColumnLayerModel, LineLayerModel, OhlcEntry, SeriesSet,
};
pub use ranges::{
    ChartRanges, MutableChartRanges, RangeContribution, RangeProvider, VerticalAxisPosition,
    XRange, YRange,
};
pub use remember::Remembered;
pub use types::{DataPoint, Point, Rect, Viewport};
pub use units::{DisplayMetrics, UnitConverter};
