pub const DEFAULT_INTERPRETER: &'static str = "bash";
pub const MAX_LINE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub interpreter: String,
	pub max_line: usize,
	pub verbose: bool,
	// exit with the last stage's status instead of 0
	pub propagate_status: bool,
}

impl Config {
	pub fn new() -> Config {
		Config {
			interpreter: DEFAULT_INTERPRETER.to_string(),
			max_line: MAX_LINE,
			verbose: false,
			propagate_status: false,
		}
	}

	pub fn with_interpreter<S: Into<String>>(mut self, interpreter: S) -> Config {
		self.interpreter = interpreter.into();
		self
	}

	pub fn log_level(&self) -> log::LevelFilter {
		if self.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn }
	}
}

impl Default for Config {
	fn default() -> Config {
		Config::new()
	}
}
