use crate::global::Config;
use crate::types::*;

const SCRIPT_SUFFIX: &'static [u8] = b".sh";

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\n' => true,
			_ => false,
		}
	}

	fn is_letter(c: u8) -> bool {
		c != b'|' && !Parser::is_whitespace(c)
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_word(&mut self) -> &'a [u8] {
		let orig = self.i;
		self.proceed_while(Parser::is_letter);
		&self.line[orig .. self.i]
	}

	fn parse_stage(&mut self, interpreter: &[u8]) -> Stage {
		let mut argv: Vec<Vec<u8>> = vec![];
		loop {
			self.skip_whitespaces();
			let word = self.read_word();
			if word.is_empty() {
				break;
			}
			if argv.is_empty() && is_script(word) {
				argv.push(interpreter.to_vec());
			}
			argv.push(word.to_vec());
		}
		Stage::new(argv)
	}

	fn parse_pipeline(&mut self, interpreter: &[u8]) -> Pipeline {
		let mut stages: Vec<Stage> = vec![];

		self.skip_whitespaces();
		if self.line.get(self.i).is_none() {
			return Pipeline { stages: stages };
		}

		loop {
			stages.push(self.parse_stage(interpreter));
			match self.line.get(self.i) {
				Some(&b'|') => { self.i += 1; },
				_ => { break; },
			}
		}
		Pipeline { stages: stages }
	}
}

pub fn is_script(word: &[u8]) -> bool {
	word.len() > SCRIPT_SUFFIX.len() && word.ends_with(SCRIPT_SUFFIX)
}

pub fn parse<L: AsRef<[u8]> + ?Sized>(line: &L, config: &Config) -> Pipeline {
	let line = line.as_ref();
	let mut parser = Parser { line: line, i: 0 };
	let pipeline = parser.parse_pipeline(config.interpreter.as_bytes());
	log::debug!("parsed {} stage(s) from {:?}", pipeline.len(), String::from_utf8_lossy(line));
	pipeline
}
