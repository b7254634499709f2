pub mod record;
pub mod comparison;
pub mod metrics;
pub mod indicators;
pub mod correlation;
pub mod overview;
pub mod import;
pub mod store;
pub mod sqlite_store;
pub mod settings;
pub mod layout;
pub mod comments;
pub mod server;

#[cfg(test)]
mod integration_tests;

pub use record::{DataPoint, Dataset, DatasetError, DateRange, FieldValue, Record, TimeRange};
pub use comparison::{
    format_comparison_label, get_comparison_data_point, ComparisonMode, ComparisonPoint,
};
pub use metrics::{
    calculate_percentage_change, calculate_point_change, FieldChange, FieldKind, FieldStatistics,
};
pub use indicators::{
    calculate_bollinger_bands, calculate_ema, calculate_rsi, calculate_sma,
    find_support_resistance_levels, BollingerBand, Indicator, IndicatorOutput, IndicatorParams,
    SupportResistance,
};
pub use correlation::{pearson_correlation, CorrelationMatrix};
pub use overview::{spread_heat_map, volatility_panel, HeatMapCell, VolatilityPanel};
pub use import::{import_csv, ImportError};
pub use store::{InMemoryStore, KeyValueStore, StoreError};
pub use sqlite_store::SqliteStore;
pub use settings::{SettingsPatch, UserSettings};
pub use layout::{LayoutConfig, SectionConfig, View};
pub use comments::{Comment, CommentThread};
pub use server::{run_server, ApiError, AppState, ServerConfig};
