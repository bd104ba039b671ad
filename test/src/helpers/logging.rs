/// Routes `log` output through env_logger's test writer. Safe to call from
/// every test; only the first call installs the logger.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
