pub mod accounts;
pub mod directory;
pub mod payments;
