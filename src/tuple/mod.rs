mod row;

pub use row::*;
