pub mod statements;

pub use statements::StatementService;
