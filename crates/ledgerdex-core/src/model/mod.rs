pub mod asset;
pub mod index;
pub mod record;
