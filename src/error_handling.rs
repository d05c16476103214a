use std::path::PathBuf;
use std::fmt::Display;

pub trait ErrorType: Display + PartialEq {
    // Warnings are reported but never fail a load
    fn is_fatal(&self) -> bool {
        true
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Location { file, line, column }
    }

    // The location of the whole file, used when no line applies
    pub fn file(file: PathBuf) -> Self {
        Location { file, line: 0, column: 0 }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = self.file.display().to_string();
        match (file.is_empty(), self.line) {
            (_, 0) => write!(f, "{}", file),
            (true, line) => write!(f, "{}:{}", line, self.column),
            (false, line) => write!(f, "{}:{}:{}", file, line, self.column),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T
}

impl<T: ErrorType> Error<T> {
    pub fn is_fatal(&self) -> bool {
        self.error.is_fatal()
    }
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Red for errors, yellow for warnings
        let colour = if self.is_fatal() { 31 } else { 33 };
        write!(f, "\x1b[{};49;1m[{}]\x1b[39;49;1m  {}\x1b[0m", colour, self.location, self.error)
    }
}

pub type Errors<T> = Vec<Error<T>>;
