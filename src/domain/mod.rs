pub mod member;
pub mod payment;
pub mod dues_plan;
pub mod inventory;
pub mod expense;
pub mod finance;
pub mod money;

pub use member::*;
pub use payment::*;
pub use dues_plan::*;
pub use inventory::*;
pub use expense::*;
pub use finance::*;
pub use money::*;
