/// Emits a warning through the `log` facade unless the importer runs quiet.
#[macro_export]
macro_rules! quiet_warn {
    ($quiet:expr, $($arg:tt)+) => {
        if !$quiet {
            log::warn!($($arg)+);
        }
    };
}
