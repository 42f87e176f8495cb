pub mod statement;

pub use statement::{PaymentSource, SourceType, Statement, StatementType, Transaction};
