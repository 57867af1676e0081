use pipex::{global, input, parser};
use pipex::{Config, Executor};

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process;
use anyhow::Context;
use argh::{EarlyExit, FromArgs};
use log::debug;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

#[derive(FromArgs)]
/// run a `|`-separated command line as a process pipeline
struct Args {
	/// log pipe, spawn and reap events to stderr
	#[argh(switch, short = 'v')]
	verbose: bool,

	/// exit with the status of the last stage
	#[argh(switch, short = 's')]
	status: bool,

	/// program that runs `.sh` stages
	#[argh(option, short = 'i', default = "String::from(global::DEFAULT_INTERPRETER)")]
	interpreter: String,

	/// the command line; one line is read from stdin when omitted
	#[argh(positional, greedy)]
	line: Vec<String>,
}

impl Args {
	fn config(&self) -> Config {
		Config {
			verbose: self.verbose,
			propagate_status: self.status,
			..Config::new().with_interpreter(self.interpreter.as_str())
		}
	}
}

fn run(words: &[OsString], config: &Config) -> anyhow::Result<i32> {
	let line = if words.is_empty() {
		let stdin = io::stdin();
		let mut stdin_locked = stdin.lock();
		match input::read_line(&mut stdin_locked, config.max_line).context("reading command line")? {
			Some(line) => line,
			None => { return Ok(0); },
		}
	} else {
		input::from_args(words)
	};

	let pipeline = parser::parse(&line, config);
	if pipeline.is_empty() {
		return Ok(0);
	}

	let job = Executor::fork_exec().run(&pipeline).context("running pipeline")?;
	for (i, pr) in job.processes().iter().enumerate() {
		debug!("stage {} (pid {}): {:?}", i, pr.pid, pr.exit);
	}

	if config.propagate_status {
		Ok(job.last_exit().map_or(0, |exit| exit.code()))
	} else {
		Ok(0)
	}
}

// Like `argh::from_env`, but words that are not UTF-8 do not abort parsing.
fn parse_args(raw: &[OsString]) -> Args {
	let strings: Vec<String> = raw.iter().map(|a| a.to_string_lossy().into_owned()).collect();
	let cmd = strings.first()
		.and_then(|s| Path::new(s).file_name())
		.and_then(|s| s.to_str())
		.unwrap_or("pipex");
	let strs: Vec<&str> = strings.iter().skip(1).map(|s| s.as_str()).collect();
	Args::from_args(&[cmd], &strs).unwrap_or_else(|early_exit: EarlyExit| {
		process::exit(match early_exit.status {
			Ok(()) => {
				println!("{}", early_exit.output);
				0
			},
			Err(()) => {
				eprintln!("{}\nRun {} --help for more information.", early_exit.output, cmd);
				1
			},
		})
	})
}

fn main() {
	let raw: Vec<OsString> = env::args_os().collect();
	let args = parse_args(&raw);
	let words = input::trailing_words(&raw, args.line.len());
	let config = args.config();
	let _ = TermLogger::init(config.log_level(), simplelog::Config::default(),
	                         TerminalMode::Stderr, ColorChoice::Auto);

	let code = match run(words, &config) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("pipex: {:#}", e);
			1
		},
	};
	process::exit(code)
}
