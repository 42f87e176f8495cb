pub mod statements;

pub use statements::{
    StatementParams, StatementRequest, StatementResponse, TransactionRequest, TransactionResponse,
};
