pub mod csv_parser;

pub use csv_parser::{decode_rows, read_file, RawRow, SchemaVariant};
