mod response;

pub use response::{exit_code_for_error, exit_code_for_run, print_json_result};
