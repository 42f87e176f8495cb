pub mod health;
pub mod statements;

pub use health::health_check;
pub use statements::{create_statement, get_statement};
