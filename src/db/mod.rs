pub mod db;
pub mod verificationdb;

#[cfg(test)]
pub mod memory;

pub use db::DBClient;
