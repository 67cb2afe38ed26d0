mod params;
mod row;
mod validators;

pub use params::*;
pub use row::*;
pub use validators::*;
