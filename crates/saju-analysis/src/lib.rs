pub mod compat;
pub mod datepick;
pub mod fortune;
pub mod interest;
pub mod seed;
pub mod wealth;
