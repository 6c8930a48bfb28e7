/// Declare a table of [PidCommand](super::PidCommand) constants
///
/// Each entry becomes a documented `pub const` and is also collected into `ALL`, in declaration
/// order.
macro_rules! pid_commands {
    {
        $(
            $(#[$attr:meta])*
            const $name:ident = ($service:expr, $pid:expr, $len:expr, $unit:literal, $decode:path);
        )*
    } => {
        $(
            $(#[$attr])*
            ///
            #[doc = concat!(
                "Details: service `", stringify!($service),
                "`, PID `", stringify!($pid),
                "`, ", stringify!($len), " data byte(s), unit: `", $unit, "`"
            )]
            pub const $name: PidCommand = PidCommand {
                name: stringify!($name),
                service: $service,
                pid: $pid,
                response_len: $len,
                unit: $unit,
                decode: $decode,
            };
        )*

        /// Every command declared in this table
        pub const ALL: &[PidCommand] = &[$($name),*];
    };
}
