pub mod export;
pub mod statement;
