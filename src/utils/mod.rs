pub mod coordinate;
