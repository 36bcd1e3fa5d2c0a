mod ids;
pub mod time;

pub use ids::{IdGenerator, random_id};
