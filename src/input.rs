use std::ffi::OsString;
use std::io;
use std::io::{BufRead, Read};
use std::os::unix::ffi::OsStrExt;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
	#[error("cannot read input")]
	IoError(#[from] io::Error),
	#[error("line is longer than {limit} bytes")]
	TooLong { limit: usize },
}

/// Reads one line of at most `max_line` bytes, newline excluded. The bytes are
/// kept as they are; words reach `execvp` without any decoding.
pub fn read_line<R: BufRead>(reader: &mut R, max_line: usize) -> Result<Option<Vec<u8>>, InputError> {
	let mut line: Vec<u8> = vec![];
	let limit = max_line as u64 + 1;
	let n = reader.by_ref().take(limit).read_until(b'\n', &mut line)?;
	if n == 0 {
		return Ok(None);
	}

	if line.last() == Some(&b'\n') {
		line.pop();
		if line.last() == Some(&b'\r') {
			line.pop();
		}
	}
	if line.len() > max_line {
		return Err(InputError::TooLong { limit: max_line });
	}
	Ok(Some(line))
}

pub fn from_args(words: &[OsString]) -> Vec<u8> {
	let mut line: Vec<u8> = vec![];
	for (i, word) in words.iter().enumerate() {
		if i > 0 {
			line.push(b' ');
		}
		line.extend_from_slice(word.as_bytes());
	}
	line
}

/// The last `count` raw arguments. Flag parsing only sees lossy UTF-8 copies,
/// so the trailing positional words are taken back from the untouched list.
pub fn trailing_words(raw: &[OsString], count: usize) -> &[OsString] {
	&raw[raw.len().saturating_sub(count) ..]
}
