pub mod access;
pub mod cohort;
pub mod halaqah;
pub mod pairing;
pub mod store;
