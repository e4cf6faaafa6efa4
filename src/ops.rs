//! Operator nodes, one module per operator.

pub mod collect;
pub mod combine_latest;
pub mod compact_map;
pub mod concat;
pub mod drop_first;
pub mod drop_until_output_from;
pub mod drop_while;
pub mod filter;
pub mod first;
pub mod flat_map;
pub mod ignore_output;
pub mod last;
pub mod map;
pub mod merge;
pub mod prefix;
pub mod remove_duplicates;
pub mod replace_empty;
pub mod replace_nil;
pub mod scan;
pub mod set_failure_type;
pub mod switch_to_latest;
pub mod zip;
