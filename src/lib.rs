pub mod analyzers;
pub mod charts;
pub mod dataset;
pub mod output;
pub mod plans;
pub mod table;
