pub mod finance;
pub mod members;
pub mod payments;
pub mod root;
