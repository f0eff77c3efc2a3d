//! Data model: raw change-log records and reconstructed item records.

pub mod item;
