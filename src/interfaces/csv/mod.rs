pub mod instruction_reader;
pub mod statement_writer;
