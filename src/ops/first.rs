//! `first` and `first_where`, expressed by composing existing nodes.

use crate::ops::filter::FilterOp;
use crate::ops::prefix::PrefixOp;

pub type FirstOp<S> = PrefixOp<S>;

pub type FirstWhereOp<S, F> = PrefixOp<FilterOp<S, F>>;
