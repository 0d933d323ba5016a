mod result_set;
mod row;
mod run_result;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
pub use run_result::RunResult;
