use std::{error, fmt, result};

/// Short form to compose Error values.
///
/// Here are few possible ways:
///
/// ```ignore
/// err_at!(Fatal, msg: "missing sibling for {}", key)
/// ```
///
/// ```ignore
/// err_at!(IOError, fs::File::open(&path))
/// ```
///
/// ```ignore
/// err_at!(FailConvert, token.parse::<i32>(), "token {:?}", token)
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err($crate::Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

/// Error variants that can be returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the
/// `file:line-no` where the error was composed, and a message.
#[derive(Clone)]
pub enum Error {
    /// Broken invariant, there is no sane way to recover.
    Fatal(String, String),
    /// API used outside its precondition, like inserting a duplicate key.
    InvalidInput(String, String),
    /// Input text does not conform to the command protocol.
    InvalidFormat(String, String),
    /// Failure while converting between types.
    FailConvert(String, String),
    /// Error from std::io APIs.
    IOError(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, m) => write!(f, "{} Fatal: {}", p, m),
            InvalidInput(p, m) => write!(f, "{} InvalidInput: {}", p, m),
            InvalidFormat(p, m) => write!(f, "{} InvalidFormat: {}", p, m),
            FailConvert(p, m) => write!(f, "{} FailConvert: {}", p, m),
            IOError(p, m) => write!(f, "{} IOError: {}", p, m),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}
