pub mod use_cases;

pub use use_cases::county_lookup::CountyTable;
pub use use_cases::forecast::{ForecastOutcome, ForecastRejection, ForecastUseCase};
