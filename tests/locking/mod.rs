mod file_lock_contention;
mod optional_no_manager_warn;
