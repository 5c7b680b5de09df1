//! Free-block bookkeeping: the segregated-by-size lists and the dedicated mini-block list.

pub mod mini;
pub mod segregated;

pub use mini::MiniList;
pub use segregated::SegList;
