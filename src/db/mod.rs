pub mod cache;
pub mod chatdb;
pub mod db;
#[cfg(test)]
pub mod fixtures;
pub mod gigdb;
pub mod jobdb;
pub mod orderdb;
pub mod pendingdb;
pub mod userdb;
