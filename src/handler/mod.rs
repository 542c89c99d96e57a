pub mod maintenance;
pub mod verification;
