pub mod controller;
pub mod forecast;

pub use controller::*;
pub use forecast::*;
