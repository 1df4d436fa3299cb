pub mod attachment_table;
