pub mod booking_writer;
pub mod script_reader;
