pub mod breakpoints;
pub mod category;

pub use breakpoints::{Aqi, Breakpoint, BreakpointTable, AQI_MAX, MAX_DECIMALS};
pub use category::{Category, ClassificationScheme, SchemeKind};
