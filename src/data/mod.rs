pub mod range;
pub mod reading;

pub use range::HistoryRange;
pub use reading::{
    Reading, ReadingError, SeriesKey, SOURCE_FINANCE, SOURCE_SENSOR, SOURCE_SYSTEM,
    SOURCE_WEATHER,
};
