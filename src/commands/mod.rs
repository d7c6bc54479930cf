mod aggregate;
mod normalize;
mod parse;
mod response;
pub mod util;

pub use aggregate::{Improvements, Matrix, Nps, Rank, Reasons, Report};
pub use normalize::Normalize;
pub use parse::Parse;
pub use response::{ExtractJson, Interpret};
