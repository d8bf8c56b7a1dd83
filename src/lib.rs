pub mod error;
pub mod fetch;
pub mod fips;
pub mod growth;
pub mod output;
pub mod parser;
pub mod publish;
