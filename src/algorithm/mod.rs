mod snowflakeid;

pub use snowflakeid::*;
