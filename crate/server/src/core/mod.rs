mod warden;

pub use warden::{Identity, Warden};
