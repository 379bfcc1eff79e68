pub mod fasta;
pub mod full_table;
