pub mod change;
pub mod quote;
