mod reports;
mod weather;

pub use reports::*;
pub use weather::*;
