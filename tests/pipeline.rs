use pipex::{parser, Config, ExecError, Executor, Job, StageExit};

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::fd::OwnedFd;
use std::os::unix::fs::PermissionsExt;
use std::sync::{Mutex, MutexGuard};
use nix::sys::signal::Signal;

// `wait(2)` reaps any child of the test process, so runs must not overlap.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
	SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn fd(file: &File) -> OwnedFd {
	OwnedFd::from(file.try_clone().unwrap())
}

fn contents(mut file: File) -> String {
	let mut out = String::new();
	file.seek(SeekFrom::Start(0)).unwrap();
	file.read_to_string(&mut out).unwrap();
	out
}

fn run_config(line: &str, config: &Config, input: Option<&str>) -> (Result<Job, ExecError>, String) {
	let _guard = serial();
	let pipeline = parser::parse(line, config);
	let source = input.map(|text| {
		let mut file = tempfile::tempfile().unwrap();
		file.write_all(text.as_bytes()).unwrap();
		file.seek(SeekFrom::Start(0)).unwrap();
		file
	});
	let sink = tempfile::tempfile().unwrap();
	let r = Executor::fork_exec().run_with(&pipeline, source.as_ref().map(fd), Some(fd(&sink)));
	(r, contents(sink))
}

fn run(line: &str) -> (Result<Job, ExecError>, String) {
	run_config(line, &Config::default(), None)
}

fn exits(job: &Job) -> Vec<StageExit> {
	job.processes().iter().map(|pr| pr.exit.unwrap()).collect()
}

#[test]
fn uppercase_through_tr() {
	let (r, out) = run("printf hello | tr a-z A-Z");
	let job = r.unwrap();
	assert_eq!(out, "HELLO");
	assert_eq!(exits(&job), vec![StageExit::Exited(0), StageExit::Exited(0)]);
}

#[test]
fn single_stage() {
	let (r, out) = run("echo one two");
	assert_eq!(r.unwrap().len(), 1);
	assert_eq!(out, "one two\n");
}

#[test]
fn three_stages() {
	let (r, out) = run("printf c\\nb\\na\\n | sort | head -n 2");
	assert_eq!(r.unwrap().len(), 3);
	assert_eq!(out, "a\nb\n");
}

#[test]
fn reads_source() {
	let (r, out) = run_config("tr a-z A-Z | sort", &Config::default(), Some("b\na\n"));
	r.unwrap();
	assert_eq!(out, "A\nB\n");
}

#[test]
fn data_larger_than_pipe_buffer() {
	let (r, out) = run("seq 1 200000 | cat | wc -l");
	r.unwrap();
	assert_eq!(out.trim(), "200000");
}

#[test]
fn statuses_in_stage_order() {
	let (r, _) = run("false | true");
	let job = r.unwrap();
	assert_eq!(exits(&job), vec![StageExit::Exited(1), StageExit::Exited(0)]);
	assert_eq!(job.last_exit(), Some(StageExit::Exited(0)));
}

#[test]
fn missing_program_only_fails_its_stage() {
	let (r, out) = run("pipex-no-such-program-here | echo still running");
	let job = r.unwrap();
	assert_eq!(out, "still running\n");
	assert_eq!(exits(&job)[0], StageExit::Exited(127));
	assert_eq!(exits(&job)[1], StageExit::Exited(0));
}

#[test]
fn upstream_sees_broken_pipe() {
	let (r, out) = run("yes | head -n 3");
	let job = r.unwrap();
	assert_eq!(out, "y\ny\ny\n");
	assert_eq!(exits(&job)[0], StageExit::Signaled(Signal::SIGPIPE));
}

#[test]
fn script_runs_under_interpreter() {
	let dir = tempfile::tempdir().unwrap();
	let script = dir.path().join("greet.sh");
	fs::write(&script, "echo from script\nkill -KILL $$\n").unwrap();
	// Not executable: it only runs because the interpreter is prepended.
	fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();

	let config = Config::default().with_interpreter("sh");
	let line = format!("{} | tr a-z A-Z", script.display());
	let (r, out) = run_config(&line, &config, None);
	let job = r.unwrap();
	assert_eq!(out, "FROM SCRIPT\n");
	assert_eq!(exits(&job)[0], StageExit::Signaled(Signal::SIGKILL));
	assert_eq!(exits(&job)[0].code(), 137);
}

#[test]
fn empty_stage_runs_nothing() {
	let (r, out) = run("echo a | | wc -c");
	match r {
		Err(ExecError::EmptyStage { index }) => assert_eq!(index, 1),
		other => panic!("unexpected {:?}", other.map(|job| job.len())),
	}
	assert_eq!(out, "");
}

#[test]
fn blank_line_runs_nothing() {
	let (r, out) = run(" \t ");
	assert!(r.unwrap().is_empty());
	assert_eq!(out, "");
}
