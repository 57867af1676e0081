// An empty stage stands for a segment with no words (`ls | | wc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
	argv: Vec<Vec<u8>>,
}

impl Stage {
	pub fn new(argv: Vec<Vec<u8>>) -> Stage {
		Stage { argv: argv }
	}

	pub fn program(&self) -> Option<&[u8]> {
		self.argv.first().map(|s| s.as_slice())
	}

	pub fn args(&self) -> &[Vec<u8>] {
		&self.argv
	}

	pub fn is_empty(&self) -> bool {
		self.argv.is_empty()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}

impl Pipeline {
	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}
}
