#[allow(dead_code)]
pub enum LogType {
    Print,
    Println,
    Info,
    Debug,
    Error,
    Trace,
}

/// Prints out the provided message through a logger controlled by the logtype param.
///
/// # Example
///
/// ```no run
/// # fn main {
///     show_message!("Extracted 12 entries", LogType::Info);
/// #}
#[macro_export]
macro_rules! show_message {
    ($msg: expr, $logtype: expr) => {
        match $logtype {
            $crate::macros::LogType::Print => print!("{}", $msg),
            $crate::macros::LogType::Println => println!("{}", $msg),
            $crate::macros::LogType::Info => log::info!("{}", $msg),
            $crate::macros::LogType::Debug => log::debug!("{}", $msg),
            $crate::macros::LogType::Error => log::error!("{}", $msg),
            $crate::macros::LogType::Trace => log::trace!("{}", $msg),
        }
    };
}

/// Measures the time duration of the provided function and prints out the message
/// through a logger controlled by the logtype param (`debug` when omitted).
/// The $msg param exists to specify an unique identifier text, so that it's easier
/// to track the results.
///
/// # Example
///
/// ```no run
/// # fn main {
///     measure_time!("scanning capsule/train", || index.len(Split::Train), LogType::Info);
/// #}
#[macro_export]
macro_rules! measure_time {
    ($msg: expr, $fn: expr) => {{
        let instant = std::time::Instant::now();
        let res = $fn();
        log::debug!(
            "Finished \"{}\" in {} ms",
            $msg,
            instant.elapsed().as_millis(),
        );
        res
    }};
    ($msg: expr, $fn: expr, $logtype: expr) => {{
        let instant = std::time::Instant::now();
        let res = $fn();
        $crate::show_message!(
            format!(
                "Finished \"{}\" in {} ms",
                $msg,
                instant.elapsed().as_millis(),
            ),
            $logtype
        );
        res
    }};
}
